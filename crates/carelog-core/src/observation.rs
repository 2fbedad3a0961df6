//! Observation types: what a caregiver records about a resident.
//!
//! Entered values travel as [`Observation`]s (one per meal/category step).
//! On commit each observation expands into one or more [`ObservationRow`]s,
//! which are what the store persists and reads back as [`Record`]s.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _, IntoStaticStr};
use uuid::Uuid;

// ─── Keys ────────────────────────────────────────────────────────────────────

/// The time-of-day bucket an observation belongs to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MealWindow {
  Breakfast,
  Lunch,
  Dinner,
}

/// An observation kind. Each category is persisted in its own table.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
  Vitals,
  Food,
  Liquid,
  Bowel,
  Urine,
}

impl Category {
  /// The most rows a single (resident, date, meal) key may hold.
  pub fn cardinality(self) -> usize {
    match self {
      Self::Liquid => crate::validate::MAX_LIQUID_SLOTS,
      _ => 1,
    }
  }
}

// ─── Enumerated values ───────────────────────────────────────────────────────
//
// Field values are matched exactly and case-sensitively against the strum
// serialisations below.

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
pub enum IntakeLevel {
  #[serde(rename = "25%")]
  #[strum(serialize = "25%")]
  Quarter,
  #[serde(rename = "50%")]
  #[strum(serialize = "50%")]
  Half,
  #[serde(rename = "75%")]
  #[strum(serialize = "75%")]
  ThreeQuarters,
  #[serde(rename = "100%")]
  #[strum(serialize = "100%")]
  Full,
  Ensure,
  Other,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
pub enum LiquidChoice {
  Yes,
  No,
  Partial,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
pub enum StoolSize {
  Small,
  Medium,
  Large,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
pub enum StoolConsistency {
  Soft,
  Medium,
  Hard,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
pub enum UrineChoice {
  Yes,
  No,
}

// ─── Payloads ────────────────────────────────────────────────────────────────

/// Blood pressure and pulse; recorded at breakfast only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalsReading {
  pub systolic:  i32,
  pub diastolic: i32,
  pub pulse:     i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodIntake {
  pub intake_level: IntakeLevel,
  /// Sanitised free text; only kept when `intake_level` is `Other`.
  pub notes:        Option<String>,
}

/// One non-empty free-text liquid slot. `slot` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidSlot {
  pub slot:  u8,
  pub value: String,
}

impl LiquidSlot {
  /// The persisted form, e.g. `"slot 2: Water"`.
  pub fn label(&self) -> String { format!("slot {}: {}", self.slot, self.value) }
}

/// Liquid intake comes either as a single structured choice or as up to three
/// free-text slots. Both forms commit to the same table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LiquidIntake {
  Choice(LiquidChoice),
  Slots(Vec<LiquidSlot>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowelMovement {
  pub size:        StoolSize,
  pub consistency: StoolConsistency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrineOutput {
  pub output: UrineChoice,
}

// ─── Observation ─────────────────────────────────────────────────────────────

/// A validated payload for one step. The variant determines the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Observation {
  Vitals(VitalsReading),
  Food(FoodIntake),
  Liquid(LiquidIntake),
  Bowel(BowelMovement),
  Urine(UrineOutput),
}

impl Observation {
  pub fn category(&self) -> Category {
    match self {
      Self::Vitals(_) => Category::Vitals,
      Self::Food(_) => Category::Food,
      Self::Liquid(_) => Category::Liquid,
      Self::Bowel(_) => Category::Bowel,
      Self::Urine(_) => Category::Urine,
    }
  }

  /// Expand into the rows that replace this key on commit.
  ///
  /// Everything but slot-style liquid intake yields exactly one row.
  pub fn rows(&self) -> Vec<ObservationRow> {
    match self {
      Self::Vitals(v) => vec![ObservationRow::Vitals(*v)],
      Self::Food(f) => vec![ObservationRow::Food(f.clone())],
      Self::Liquid(LiquidIntake::Choice(c)) => vec![ObservationRow::Liquid {
        intake: c.to_string(),
      }],
      Self::Liquid(LiquidIntake::Slots(slots)) => slots
        .iter()
        .map(|s| ObservationRow::Liquid { intake: s.label() })
        .collect(),
      Self::Bowel(b) => vec![ObservationRow::Bowel(*b)],
      Self::Urine(u) => vec![ObservationRow::Urine(*u)],
    }
  }
}

// ─── Persisted rows ──────────────────────────────────────────────────────────

/// The column payload of one persisted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ObservationRow {
  Vitals(VitalsReading),
  Food(FoodIntake),
  /// Either a [`LiquidChoice`] (`"Yes"`) or a slot label (`"slot 1: Juice"`).
  Liquid { intake: String },
  Bowel(BowelMovement),
  Urine(UrineOutput),
}

impl ObservationRow {
  pub fn category(&self) -> Category {
    match self {
      Self::Vitals(_) => Category::Vitals,
      Self::Food(_) => Category::Food,
      Self::Liquid { .. } => Category::Liquid,
      Self::Bowel(_) => Category::Bowel,
      Self::Urine(_) => Category::Urine,
    }
  }
}

/// A row as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
  pub record_id:   Uuid,
  pub resident_id: Uuid,
  pub date:        NaiveDate,
  pub meal:        MealWindow,
  pub row:         ObservationRow,
  /// Server-assigned; set when the row was inserted.
  pub recorded_at: DateTime<Utc>,
}

// ─── Day log ─────────────────────────────────────────────────────────────────

/// Every persisted row for one resident on one date. Never stored, always
/// derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayLog {
  pub resident_id: Uuid,
  pub date:        NaiveDate,
  pub records:     Vec<Record>,
}

impl DayLog {
  /// Rows of `category` across all meals.
  pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Record> {
    self.records.iter().filter(move |r| r.row.category() == category)
  }

  /// Rows for one (meal, category) key.
  pub fn at(&self, meal: MealWindow, category: Category) -> Vec<&Record> {
    self
      .by_category(category)
      .filter(|r| r.meal == meal)
      .collect()
  }

  pub fn count(&self, category: Category) -> usize { self.by_category(category).count() }

  /// Meal windows with no food-intake row yet.
  pub fn missing_meals(&self) -> Vec<MealWindow> {
    MealWindow::iter()
      .filter(|&meal| self.at(meal, Category::Food).is_empty())
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn enumerated_values_are_case_sensitive() {
    assert_eq!(IntakeLevel::from_str("100%").unwrap(), IntakeLevel::Full);
    assert_eq!(IntakeLevel::from_str("Ensure").unwrap(), IntakeLevel::Ensure);
    assert!(IntakeLevel::from_str("ensure").is_err());
    assert!(StoolSize::from_str("medium").is_err());
    assert!(UrineChoice::from_str("YES").is_err());
  }

  #[test]
  fn slot_liquid_expands_to_one_row_per_slot() {
    let obs = Observation::Liquid(LiquidIntake::Slots(vec![
      LiquidSlot { slot: 1, value: "Juice".into() },
      LiquidSlot { slot: 3, value: "Tea".into() },
    ]));
    assert_eq!(obs.rows(), vec![
      ObservationRow::Liquid { intake: "slot 1: Juice".into() },
      ObservationRow::Liquid { intake: "slot 3: Tea".into() },
    ]);
  }

  #[test]
  fn choice_liquid_is_a_single_row() {
    let obs = Observation::Liquid(LiquidIntake::Choice(LiquidChoice::Partial));
    assert_eq!(obs.rows(), vec![ObservationRow::Liquid {
      intake: "Partial".into(),
    }]);
  }

  #[test]
  fn missing_meals_tracks_food_rows() {
    let resident_id = Uuid::new_v4();
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let log = DayLog {
      resident_id,
      date,
      records: vec![Record {
        record_id: Uuid::new_v4(),
        resident_id,
        date,
        meal: MealWindow::Lunch,
        row: ObservationRow::Food(FoodIntake {
          intake_level: IntakeLevel::Half,
          notes:        None,
        }),
        recorded_at: Utc::now(),
      }],
    };
    assert_eq!(log.missing_meals(), vec![MealWindow::Breakfast, MealWindow::Dinner]);
    assert_eq!(log.count(Category::Food), 1);
    assert_eq!(log.count(Category::Urine), 0);
  }
}
