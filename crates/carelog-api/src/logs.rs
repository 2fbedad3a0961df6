//! Handlers for the persisted day log.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/residents/{id}/log` | `?date=YYYY-MM-DD`, defaults to today |

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{PathRejection, QueryRejection},
  },
};
use carelog_core::{
  observation::{Category, DayLog, MealWindow, Record},
  store::{AuditSink, ObservationStore},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;
use uuid::Uuid;

use crate::{AppState, auth::Actor, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct LogParams {
  pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct DayLogView {
  pub resident_id:   Uuid,
  pub date:          NaiveDate,
  pub previous_date: Option<NaiveDate>,
  pub next_date:     Option<NaiveDate>,
  /// Meal windows with no food-intake row yet.
  pub missing_meals: Vec<MealWindow>,
  pub categories:    BTreeMap<Category, Vec<Record>>,
}

impl From<DayLog> for DayLogView {
  fn from(log: DayLog) -> Self {
    let categories = Category::iter()
      .map(|c| (c, log.by_category(c).cloned().collect()))
      .collect();
    Self {
      resident_id: log.resident_id,
      date: log.date,
      previous_date: log.date.pred_opt(),
      next_date: log.date.succ_opt(),
      missing_meals: log.missing_meals(),
      categories,
    }
  }
}

/// `GET /residents/{id}/log[?date=YYYY-MM-DD]`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  path: Result<Path<Uuid>, PathRejection>,
  query: Result<Query<LogParams>, QueryRejection>,
) -> Result<Json<DayLogView>, ApiError>
where
  S: ObservationStore + AuditSink + 'static,
{
  let Path(resident_id) = path?;
  let Query(params) = query?;
  let date = params.date.unwrap_or_else(crate::today);

  tracing::debug!(%resident_id, %date, user_id = %actor.user_id, "reading day log");
  let log = state
    .engine
    .store()
    .day_log(resident_id, date)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(log.into()))
}
