//! The one-shot endpoint: a whole meal's observations in one request.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/residents/{id}/log/{meal}` | Body: flattened [`ObservationFields`] |

use std::str::FromStr as _;

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
};
use carelog_core::{
  commit::CommitSummary,
  observation::MealWindow,
  store::{AuditSink, ObservationStore},
  validate::ObservationFields,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, auth::Actor, error::ApiError};

#[derive(Debug, Serialize)]
pub struct MealResponse {
  pub success: bool,
  pub summary: CommitSummary,
}

/// `POST /residents/{id}/log/{meal}`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  path: Result<Path<(Uuid, String)>, PathRejection>,
  body: Result<Json<ObservationFields>, JsonRejection>,
) -> Result<Json<MealResponse>, ApiError>
where
  S: ObservationStore + AuditSink + 'static,
{
  let Path((resident_id, meal)) = path?;
  let meal = MealWindow::from_str(&meal)
    .map_err(|_| ApiError::BadRequest(format!("unknown meal window {meal:?}")))?;
  let Json(fields) = body?;

  let ctx = state.context(resident_id, &actor);
  let summary = state.engine.commit_meal(&ctx, meal, &fields).await?;
  Ok(Json(MealResponse { success: true, summary }))
}
