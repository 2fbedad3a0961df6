//! Uncommitted wizard state.
//!
//! A [`WizardDraft`] buffers validated observations for one resident, one
//! caregiver and one day. Drafts live in a [`DraftStore`] owned by the session
//! layer and never touch durable storage; they are discarded on commit or
//! abandonment.

use std::{
  collections::{BTreeMap, HashMap},
  sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Result,
  observation::{Category, MealWindow, Observation},
  schedule,
};

// ─── WizardDraft ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardDraft {
  day:     NaiveDate,
  entries: BTreeMap<MealWindow, BTreeMap<Category, Observation>>,
}

impl WizardDraft {
  pub fn new(day: NaiveDate) -> Self { Self { day, entries: BTreeMap::new() } }

  /// The day this draft records observations for.
  pub fn day(&self) -> NaiveDate { self.day }

  pub fn get(&self, meal: MealWindow, category: Category) -> Option<&Observation> {
    self.entries.get(&meal)?.get(&category)
  }

  /// Store `observation` under `(meal, observation.category())`, replacing
  /// whatever was there. Fails for keys outside the schedule (vitals are
  /// breakfast-only).
  pub fn set(&mut self, meal: MealWindow, observation: Observation) -> Result<()> {
    let category = observation.category();
    schedule::index_of(category, meal)?;
    self.entries.entry(meal).or_default().insert(category, observation);
    Ok(())
  }

  pub fn clear(&mut self) { self.entries.clear(); }

  pub fn is_empty(&self) -> bool { self.entries.values().all(BTreeMap::is_empty) }

  pub fn len(&self) -> usize { self.entries.values().map(BTreeMap::len).sum() }

  /// Entries in schedule order.
  pub fn iter(&self) -> impl Iterator<Item = (MealWindow, &Observation)> {
    schedule::STEPS
      .iter()
      .filter_map(|s| self.get(s.meal, s.category).map(|obs| (s.meal, obs)))
  }
}

// ─── DraftStore ──────────────────────────────────────────────────────────────

/// Drafts are per caregiver: two users on the same resident never share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DraftKey {
  pub resident_id: Uuid,
  pub user_id:     Uuid,
}

/// In-process keyed draft storage.
///
/// The lock is only held for map access, never across an `.await`; callers
/// check a draft out, mutate their copy, and put it back.
#[derive(Debug, Default)]
pub struct DraftStore {
  drafts: Mutex<HashMap<DraftKey, WizardDraft>>,
}

impl DraftStore {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> MutexGuard<'_, HashMap<DraftKey, WizardDraft>> {
    self.drafts.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// The draft for `key`, or a fresh one for `today`. A draft left over from
  /// an earlier day is dropped.
  pub fn checkout(&self, key: DraftKey, today: NaiveDate) -> WizardDraft {
    let mut drafts = self.lock();
    match drafts.get(&key) {
      Some(draft) if draft.day() == today => draft.clone(),
      Some(_) => {
        tracing::debug!(?key, "discarding stale draft");
        drafts.remove(&key);
        WizardDraft::new(today)
      }
      None => WizardDraft::new(today),
    }
  }

  /// Store `draft` under `key`. Drafts from days before `draft`'s day are
  /// swept out, whoever owns them.
  pub fn put(&self, key: DraftKey, draft: WizardDraft) {
    let mut drafts = self.lock();
    let before = drafts.len();
    drafts.retain(|_, d| d.day() >= draft.day());
    let swept = before - drafts.len();
    if swept > 0 {
      tracing::debug!(swept, "swept stale drafts");
    }
    drafts.insert(key, draft);
  }

  pub fn len(&self) -> usize { self.lock().len() }

  pub fn is_empty(&self) -> bool { self.lock().is_empty() }

  pub fn peek(&self, key: DraftKey) -> Option<WizardDraft> { self.lock().get(&key).cloned() }

  pub fn discard(&self, key: DraftKey) -> Option<WizardDraft> { self.lock().remove(&key) }
}
