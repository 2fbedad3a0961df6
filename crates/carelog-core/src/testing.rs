//! In-memory store used by the unit tests in this crate.

use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  commit::LogContext,
  observation::{
    Category, DayLog, FoodIntake, IntakeLevel, LiquidChoice, LiquidIntake, MealWindow,
    Observation, ObservationRow, Record,
  },
  store::{AuditEntry, AuditSink, NewAuditEntry, ObservationStore, ReplaceCounts, ReplacePlan},
};

#[derive(Debug, Error)]
#[error("simulated storage failure at {meal} {category}")]
pub struct Injected {
  meal:     MealWindow,
  category: Category,
}

/// Applies each plan to a scratch copy and swaps it in only on success, the
/// way a transaction would.
#[derive(Default)]
pub struct MemoryStore {
  rows:    Mutex<Vec<Record>>,
  audit:   Mutex<Vec<AuditEntry>>,
  fail_on: Mutex<Option<(MealWindow, Category)>>,
}

impl MemoryStore {
  /// Make every later replace that touches this key fail.
  pub fn fail_on(&self, meal: MealWindow, category: Category) {
    *self.fail_on.lock().unwrap() = Some((meal, category));
  }

  pub fn recover(&self) { *self.fail_on.lock().unwrap() = None; }

  pub fn rows_without_ids(&self) -> Vec<(Uuid, NaiveDate, MealWindow, ObservationRow)> {
    self
      .rows
      .lock()
      .unwrap()
      .iter()
      .map(|r| (r.resident_id, r.date, r.meal, r.row.clone()))
      .collect()
  }
}

impl ObservationStore for MemoryStore {
  type Error = Injected;

  async fn replace(&self, plan: ReplacePlan) -> Result<ReplaceCounts, Injected> {
    let fail_on = *self.fail_on.lock().unwrap();
    let mut rows = self.rows.lock().unwrap();
    let mut scratch = rows.clone();
    let mut counts = ReplaceCounts::default();

    for r in plan.replacements {
      let before = scratch.len();
      scratch.retain(|rec| {
        !(rec.resident_id == plan.resident_id
          && rec.date == plan.date
          && rec.row.category() == r.category
          && (r.category == Category::Vitals || rec.meal == r.meal))
      });
      counts.deleted += before - scratch.len();

      if fail_on == Some((r.meal, r.category)) {
        return Err(Injected { meal: r.meal, category: r.category });
      }
      for row in r.rows {
        scratch.push(Record {
          record_id: Uuid::new_v4(),
          resident_id: plan.resident_id,
          date: plan.date,
          meal: r.meal,
          row,
          recorded_at: Utc::now(),
        });
        counts.inserted += 1;
      }
    }

    *rows = scratch;
    Ok(counts)
  }

  async fn day_log(&self, resident_id: Uuid, date: NaiveDate) -> Result<DayLog, Injected> {
    let records = self
      .rows
      .lock()
      .unwrap()
      .iter()
      .filter(|r| r.resident_id == resident_id && r.date == date)
      .cloned()
      .collect();
    Ok(DayLog { resident_id, date, records })
  }
}

impl AuditSink for MemoryStore {
  type Error = Injected;

  async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, Injected> {
    let entry = AuditEntry {
      entry_id:    Uuid::new_v4(),
      user_id:     entry.user_id,
      action:      entry.action,
      recorded_at: Utc::now(),
    };
    self.audit.lock().unwrap().push(entry.clone());
    Ok(entry)
  }

  async fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>, Injected> {
    Ok(self.audit.lock().unwrap().iter().rev().take(limit).cloned().collect())
  }
}

pub fn context() -> LogContext {
  LogContext {
    resident_id: Uuid::new_v4(),
    user_id:     Uuid::new_v4(),
    day:         NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
  }
}

pub fn food(intake_level: IntakeLevel) -> Observation {
  Observation::Food(FoodIntake { intake_level, notes: None })
}

pub fn liquid(choice: LiquidChoice) -> Observation {
  Observation::Liquid(LiquidIntake::Choice(choice))
}
