//! The canonical walk order of the daily-log wizard.
//!
//! Vitals at breakfast first, then food, liquid, bowel and urine for each of
//! breakfast, lunch and dinner. The table is a `const`; nothing builds it per
//! request.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  observation::{Category, MealWindow},
};

/// One position's (category, meal) tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
  pub category: Category,
  pub meal:     MealWindow,
}

const fn step(category: Category, meal: MealWindow) -> Step { Step { category, meal } }

pub const STEPS: [Step; 13] = {
  use Category::*;
  use MealWindow::*;
  [
    step(Vitals, Breakfast),
    step(Food, Breakfast),
    step(Liquid, Breakfast),
    step(Bowel, Breakfast),
    step(Urine, Breakfast),
    step(Food, Lunch),
    step(Liquid, Lunch),
    step(Bowel, Lunch),
    step(Urine, Lunch),
    step(Food, Dinner),
    step(Liquid, Dinner),
    step(Bowel, Dinner),
    step(Urine, Dinner),
  ]
};

/// An index into [`STEPS`]. Always in range: constructors clamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Position(usize);

impl Position {
  pub const FIRST: Self = Self(0);
  pub const LAST: Self = Self(STEPS.len() - 1);

  /// Out-of-range indices are clamped to the last position.
  pub fn clamped(index: usize) -> Self { Self(index.min(Self::LAST.0)) }

  pub fn index(self) -> usize { self.0 }

  pub fn step(self) -> Step { STEPS[self.0] }

  pub fn is_terminal(self) -> bool { self == Self::LAST }
}

/// Locate the position recording `category` at `meal`.
pub fn index_of(category: Category, meal: MealWindow) -> Result<Position> {
  STEPS
    .iter()
    .position(|s| s.category == category && s.meal == meal)
    .map(Position)
    .ok_or(Error::InvalidPosition { step: category, meal })
}

/// The following position; stays put at the end.
pub fn next(position: Position) -> Position { Position::clamped(position.0.saturating_add(1)) }

/// The preceding position; stays put at the start.
pub fn prev(position: Position) -> Position { Position(position.0.saturating_sub(1)) }
