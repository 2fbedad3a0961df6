//! Error types for `carelog-core`.

use serde::Serialize;
use thiserror::Error;

use crate::observation::{Category, MealWindow};

#[derive(Debug, Error)]
pub enum Error {
  #[error("{step} is not recorded at {meal}")]
  InvalidPosition { step: Category, meal: MealWindow },

  #[error("invalid observation: {0}")]
  InvalidObservation(#[from] ObservationError),

  #[error("commit failed: {0}")]
  CommitFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Why a step's fields were rejected. Always names the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObservationError {
  #[error("{field} is required")]
  Missing { field: &'static str },

  #[error("{field} must be an integer")]
  NotAnInteger { field: &'static str },

  #[error("{value:?} is not a valid {field}")]
  InvalidChoice { field: &'static str, value: String },

  #[error("notes are required when intake_level is Other")]
  NotesRequired,

  #[error("at most {max} liquid slots may be given, got {given}")]
  TooManySlots { max: usize, given: usize },

  #[error("step fields are malformed: {reason}")]
  Malformed { reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
