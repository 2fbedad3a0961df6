//! The commit engine: turns drafts into durable rows.
//!
//! Both entry points, [`CommitEngine::commit`] for a wizard draft and
//! [`CommitEngine::commit_meal`] for a one-shot meal submission, reduce their
//! input to a [`ReplacePlan`] and hand it to the store as one atomic replace.
//! Re-committing the same input leaves the same rows behind.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use strum::IntoEnumIterator as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  draft::{DraftKey, WizardDraft},
  observation::{Category, MealWindow},
  schedule::{self, Step},
  store::{AuditSink, NewAuditEntry, ObservationStore, ReplacePlan, Replacement},
  validate::{self, ObservationFields},
};

/// Who is logging what for whom, and for which day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogContext {
  pub resident_id: Uuid,
  pub user_id:     Uuid,
  pub day:         NaiveDate,
}

impl LogContext {
  pub fn draft_key(&self) -> DraftKey {
    DraftKey { resident_id: self.resident_id, user_id: self.user_id }
  }
}

/// What a successful commit wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
  pub resident_id:   Uuid,
  pub date:          NaiveDate,
  /// Keys whose rows were replaced, in schedule order.
  pub replaced:      Vec<Step>,
  pub rows_deleted:  usize,
  pub rows_inserted: usize,
}

/// Build the replace plan for every entry `draft` holds.
pub fn plan(resident_id: Uuid, date: NaiveDate, draft: &WizardDraft) -> ReplacePlan {
  let replacements = draft
    .iter()
    .map(|(meal, obs)| {
      let category = obs.category();
      let rows = obs.rows();
      debug_assert!(rows.len() <= category.cardinality(), "{category} over cardinality");
      Replacement { meal, category, rows }
    })
    .collect();
  ReplacePlan { resident_id, date, replacements }
}

/// Validate a flattened one-meal submission into a single-meal draft.
///
/// Only categories with at least one supplied field are included. Vitals
/// fields on any meal but breakfast are an [`Error::InvalidPosition`].
pub fn meal_draft(
  day: NaiveDate,
  meal: MealWindow,
  fields: &ObservationFields,
) -> Result<WizardDraft> {
  let mut draft = WizardDraft::new(day);
  for category in Category::iter().filter(|&c| fields.mentions(c)) {
    schedule::index_of(category, meal)?;
    draft.set(meal, validate::parse(category, fields)?)?;
  }
  Ok(draft)
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct CommitEngine<S, A = S> {
  store: Arc<S>,
  audit: Arc<A>,
}

impl<S, A> CommitEngine<S, A>
where
  S: ObservationStore,
  A: AuditSink,
{
  pub fn new(store: Arc<S>, audit: Arc<A>) -> Self { Self { store, audit } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn audit(&self) -> &Arc<A> { &self.audit }

  /// Replace the persisted rows for every key `draft` holds.
  ///
  /// On failure nothing is written and `draft` is untouched; clearing it on
  /// success is the caller's job.
  pub async fn commit(&self, ctx: &LogContext, draft: &WizardDraft) -> Result<CommitSummary> {
    let action = format!("Completed daily log for resident {}", ctx.resident_id);
    self.apply(ctx, plan(ctx.resident_id, ctx.day, draft), action).await
  }

  /// One-shot entry point: validate and commit a whole meal in one call.
  ///
  /// Produces the same rows as walking the wizard through the same values.
  pub async fn commit_meal(
    &self,
    ctx: &LogContext,
    meal: MealWindow,
    fields: &ObservationFields,
  ) -> Result<CommitSummary> {
    let draft = meal_draft(ctx.day, meal, fields)?;
    let action = format!("Completed {meal} log for resident {}", ctx.resident_id);
    self.apply(ctx, plan(ctx.resident_id, ctx.day, &draft), action).await
  }

  async fn apply(&self, ctx: &LogContext, plan: ReplacePlan, action: String) -> Result<CommitSummary> {
    let replaced: Vec<Step> = plan
      .replacements
      .iter()
      .map(|r| Step { category: r.category, meal: r.meal })
      .collect();

    let mut summary = CommitSummary {
      resident_id: ctx.resident_id,
      date: ctx.day,
      replaced,
      rows_deleted: 0,
      rows_inserted: 0,
    };
    if plan.is_empty() {
      tracing::debug!(resident_id = %ctx.resident_id, "nothing to commit");
      return Ok(summary);
    }

    tracing::info!(
      resident_id = %ctx.resident_id,
      date = %ctx.day,
      keys = summary.replaced.len(),
      "committing daily log"
    );

    let counts = self.store.replace(plan).await.map_err(|e| {
      tracing::warn!(resident_id = %ctx.resident_id, error = %e, "commit rolled back");
      Error::CommitFailed(Box::new(e))
    })?;
    summary.rows_deleted = counts.deleted;
    summary.rows_inserted = counts.inserted;

    // The rows are durable at this point; a lost audit line must not undo them.
    if let Err(e) = self.audit.append(NewAuditEntry { user_id: ctx.user_id, action }).await {
      tracing::warn!(resident_id = %ctx.resident_id, error = %e, "audit append failed");
    }

    Ok(summary)
  }
}
