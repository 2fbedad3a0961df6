//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, dates are `YYYY-MM-DD`, UUIDs are
//! hyphenated lowercase strings. Enumerated values are stored as their
//! display form (`"100%"`, `"Medium"`, `"breakfast"`).

use std::str::FromStr;

use carelog_core::{
  observation::{
    BowelMovement, Category, FoodIntake, MealWindow, ObservationRow, Record, UrineOutput,
    VitalsReading,
  },
  store::AuditEntry,
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

/// The exact string form of an enumerated value.
pub fn encode_enum<T: Into<&'static str>>(value: T) -> &'static str { value.into() }

/// Decode an enumerated column through its exact string form.
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode { column, value: s.to_owned() })
}

// ─── Tables ──────────────────────────────────────────────────────────────────

pub fn table(category: Category) -> &'static str {
  match category {
    Category::Vitals => "vitals",
    Category::Food => "food_intake",
    Category::Liquid => "liquid_intake",
    Category::Bowel => "bowel_movements",
    Category::Urine => "urine_output",
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Category-specific columns, still as stored.
pub enum RawPayload {
  Vitals { systolic: i32, diastolic: i32, pulse: i32 },
  Food { intake_level: String, notes: Option<String> },
  Liquid { intake: String },
  Bowel { size: String, consistency: String },
  Urine { output: String },
}

/// Raw values read directly from any observation table.
pub struct RawRecord {
  pub record_id:   String,
  pub resident_id: String,
  pub date:        String,
  pub meal_window: String,
  pub recorded_at: String,
  pub payload:     RawPayload,
}

impl RawRecord {
  pub fn into_record(self) -> Result<Record> {
    let row = match self.payload {
      RawPayload::Vitals { systolic, diastolic, pulse } => {
        ObservationRow::Vitals(VitalsReading { systolic, diastolic, pulse })
      }
      RawPayload::Food { intake_level, notes } => ObservationRow::Food(FoodIntake {
        intake_level: decode_enum("intake_level", &intake_level)?,
        notes,
      }),
      RawPayload::Liquid { intake } => ObservationRow::Liquid { intake },
      RawPayload::Bowel { size, consistency } => ObservationRow::Bowel(BowelMovement {
        size:        decode_enum("size", &size)?,
        consistency: decode_enum("consistency", &consistency)?,
      }),
      RawPayload::Urine { output } => ObservationRow::Urine(UrineOutput {
        output: decode_enum("output", &output)?,
      }),
    };

    Ok(Record {
      record_id: decode_uuid(&self.record_id)?,
      resident_id: decode_uuid(&self.resident_id)?,
      date: decode_date(&self.date)?,
      meal: decode_enum::<MealWindow>("meal_window", &self.meal_window)?,
      row,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from an `audit_log` row.
pub struct RawAuditEntry {
  pub entry_id:    String,
  pub user_id:     String,
  pub action:      String,
  pub recorded_at: String,
}

impl RawAuditEntry {
  pub fn into_entry(self) -> Result<AuditEntry> {
    Ok(AuditEntry {
      entry_id:    decode_uuid(&self.entry_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      action:      self.action,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
