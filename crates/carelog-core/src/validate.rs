//! Field rules: raw step input in, validated [`Observation`] out.
//!
//! Both entry points (the guided wizard and the one-shot meal submission)
//! accept the same [`ObservationFields`] shape and run it through [`parse`].

use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
  ObservationError,
  observation::{
    BowelMovement, Category, FoodIntake, IntakeLevel, LiquidIntake, LiquidSlot,
    Observation, UrineOutput, VitalsReading,
  },
};

pub const MAX_LIQUID_SLOTS: usize = 3;

type Result<T> = std::result::Result<T, ObservationError>;

// ─── Raw fields ──────────────────────────────────────────────────────────────

/// Untyped step input, as posted by a form or a JSON client.
///
/// Every field is optional here; which ones are required depends on the
/// category being parsed. Vitals accept JSON integers or integer strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationFields {
  pub systolic:          Option<Value>,
  pub diastolic:         Option<Value>,
  pub pulse:             Option<Value>,

  pub intake_level:      Option<String>,
  pub notes:             Option<String>,

  /// Structured liquid choice: `Yes`, `No` or `Partial`.
  pub liquid_intake:     Option<String>,
  /// Free-text liquid slots as a list; takes precedence over the numbered
  /// `liquid_slot_N` fields when non-empty.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub liquid_slots:      Vec<String>,
  pub liquid_slot_1:     Option<String>,
  pub liquid_slot_2:     Option<String>,
  pub liquid_slot_3:     Option<String>,

  pub bowel_size:        Option<String>,
  pub bowel_consistency: Option<String>,

  pub urine_output:      Option<String>,
}

impl ObservationFields {
  /// Build fields from a raw JSON object. A field of the wrong JSON type is
  /// [`ObservationError::Malformed`].
  pub fn from_map(map: Map<String, Value>) -> Result<Self> {
    serde_json::from_value(Value::Object(map))
      .map_err(|e| ObservationError::Malformed { reason: e.to_string() })
  }

  /// Whether any field belonging to `category` was supplied. Nulls and blank
  /// strings count as not supplied.
  pub fn mentions(&self, category: Category) -> bool {
    match category {
      Category::Vitals => [&self.systolic, &self.diastolic, &self.pulse]
        .into_iter()
        .any(|v| v.as_ref().is_some_and(value_given)),
      Category::Food => text_given(&self.intake_level) || text_given(&self.notes),
      Category::Liquid => {
        text_given(&self.liquid_intake)
          || self.liquid_slots.iter().any(|s| !s.trim().is_empty())
          || self.numbered_slots().into_iter().flatten().any(|s| !s.trim().is_empty())
      }
      Category::Bowel => text_given(&self.bowel_size) || text_given(&self.bowel_consistency),
      Category::Urine => text_given(&self.urine_output),
    }
  }

  fn numbered_slots(&self) -> [Option<&str>; MAX_LIQUID_SLOTS] {
    [
      self.liquid_slot_1.as_deref(),
      self.liquid_slot_2.as_deref(),
      self.liquid_slot_3.as_deref(),
    ]
  }
}

fn text_given(text: &Option<String>) -> bool {
  text.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn value_given(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::String(s) => !s.trim().is_empty(),
    _ => true,
  }
}

// ─── Sanitiser ───────────────────────────────────────────────────────────────

static MARKUP: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"<[^>]+>").expect("markup pattern is valid"));

/// Strip markup tags and surrounding whitespace from free text.
pub fn sanitize(text: &str) -> String { MARKUP.replace_all(text, "").trim().to_owned() }

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Validate `fields` as an observation of `category`.
pub fn parse(category: Category, fields: &ObservationFields) -> Result<Observation> {
  match category {
    Category::Vitals => parse_vitals(fields).map(Observation::Vitals),
    Category::Food => parse_food(fields).map(Observation::Food),
    Category::Liquid => parse_liquid(fields).map(Observation::Liquid),
    Category::Bowel => Ok(Observation::Bowel(BowelMovement {
      size:        choice("bowel_size", fields.bowel_size.as_deref())?,
      consistency: choice("bowel_consistency", fields.bowel_consistency.as_deref())?,
    })),
    Category::Urine => Ok(Observation::Urine(UrineOutput {
      output: choice("urine_output", fields.urine_output.as_deref())?,
    })),
  }
}

fn parse_vitals(fields: &ObservationFields) -> Result<VitalsReading> {
  Ok(VitalsReading {
    systolic:  integer("systolic", fields.systolic.as_ref())?,
    diastolic: integer("diastolic", fields.diastolic.as_ref())?,
    pulse:     integer("pulse", fields.pulse.as_ref())?,
  })
}

fn parse_food(fields: &ObservationFields) -> Result<FoodIntake> {
  let intake_level: IntakeLevel = choice("intake_level", fields.intake_level.as_deref())?;
  if intake_level != IntakeLevel::Other {
    return Ok(FoodIntake { intake_level, notes: None });
  }

  let notes = fields.notes.as_deref().map(sanitize).unwrap_or_default();
  if notes.is_empty() {
    return Err(ObservationError::NotesRequired);
  }
  Ok(FoodIntake { intake_level, notes: Some(notes) })
}

/// A structured choice wins over slots when both are supplied.
fn parse_liquid(fields: &ObservationFields) -> Result<LiquidIntake> {
  if let Some(raw) = fields.liquid_intake.as_deref().filter(|s| !s.is_empty()) {
    return choice("liquid_intake", Some(raw)).map(LiquidIntake::Choice);
  }

  let given: Vec<Option<&str>> = if fields.liquid_slots.is_empty() {
    fields.numbered_slots().to_vec()
  } else {
    fields.liquid_slots.iter().map(|s| Some(s.as_str())).collect()
  };
  if given.len() > MAX_LIQUID_SLOTS {
    return Err(ObservationError::TooManySlots {
      max:   MAX_LIQUID_SLOTS,
      given: given.len(),
    });
  }

  let slots: Vec<LiquidSlot> = given
    .into_iter()
    .zip(1u8..)
    .filter_map(|(raw, slot)| {
      let value = sanitize(raw?);
      (!value.is_empty()).then_some(LiquidSlot { slot, value })
    })
    .collect();

  if slots.is_empty() {
    return Err(ObservationError::Missing { field: "liquid_intake" });
  }
  Ok(LiquidIntake::Slots(slots))
}

fn integer(field: &'static str, value: Option<&Value>) -> Result<i32> {
  let not_an_integer = ObservationError::NotAnInteger { field };
  match value {
    None | Some(Value::Null) => Err(ObservationError::Missing { field }),
    Some(Value::Number(n)) => n
      .as_i64()
      .and_then(|n| i32::try_from(n).ok())
      .ok_or(not_an_integer),
    Some(Value::String(s)) if s.trim().is_empty() => Err(ObservationError::Missing { field }),
    Some(Value::String(s)) => s.trim().parse().map_err(|_| not_an_integer),
    Some(_) => Err(not_an_integer),
  }
}

fn choice<T: FromStr>(field: &'static str, value: Option<&str>) -> Result<T> {
  match value {
    None | Some("") => Err(ObservationError::Missing { field }),
    Some(v) => v.parse().map_err(|_| ObservationError::InvalidChoice {
      field,
      value: v.to_owned(),
    }),
  }
}
