//! The storage and audit collaborator traits.
//!
//! Implemented by storage backends (e.g. `carelog-store-sqlite`). The commit
//! engine and the HTTP layer depend on these abstractions, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::observation::{Category, DayLog, MealWindow, ObservationRow};

// ─── Replace plan ────────────────────────────────────────────────────────────

/// The new row set for one (meal, category) key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
  pub meal:     MealWindow,
  pub category: Category,
  pub rows:     Vec<ObservationRow>,
}

/// Everything one commit writes for a resident and date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacePlan {
  pub resident_id:  Uuid,
  pub date:         NaiveDate,
  pub replacements: Vec<Replacement>,
}

impl ReplacePlan {
  pub fn is_empty(&self) -> bool { self.replacements.is_empty() }
}

/// Row counts reported by a successful replace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceCounts {
  pub deleted:  usize,
  pub inserted: usize,
}

// ─── Audit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
  pub user_id: Uuid,
  pub action:  String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
  pub entry_id:    Uuid,
  pub user_id:     Uuid,
  pub action:      String,
  pub recorded_at: DateTime<Utc>,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Durable per-category observation storage.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ObservationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Apply `plan` as one atomic unit.
  ///
  /// For each replacement, delete the rows stored under its key and insert
  /// its rows. The key is (resident, date, meal, category), except for vitals
  /// where it is (resident, date): vitals are one row per day. If any
  /// statement fails nothing is applied.
  fn replace(
    &self,
    plan: ReplacePlan,
  ) -> impl Future<Output = Result<ReplaceCounts, Self::Error>> + Send + '_;

  /// Every row for `resident_id` on `date`, across all categories.
  fn day_log(
    &self,
    resident_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<DayLog, Self::Error>> + Send + '_;
}

/// Append-only audit trail.
pub trait AuditSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn append(
    &self,
    entry: NewAuditEntry,
  ) -> impl Future<Output = Result<AuditEntry, Self::Error>> + Send + '_;

  /// Most recent entries first.
  fn recent(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<AuditEntry>, Self::Error>> + Send + '_;
}
