//! Handlers for the caller's in-progress wizard draft.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/residents/{id}/log/draft` | Current draft, empty if none |
//! | `DELETE` | `/residents/{id}/log/draft` | Abandon the draft; 204 |

use axum::{
  Json,
  extract::{Path, State, rejection::PathRejection},
  http::StatusCode,
};
use carelog_core::{
  draft::WizardDraft,
  store::{AuditSink, ObservationStore},
};
use uuid::Uuid;

use crate::{AppState, auth::Actor, error::ApiError};

/// `GET /residents/{id}/log/draft`
pub async fn show<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<WizardDraft>, ApiError>
where
  S: ObservationStore + AuditSink + 'static,
{
  let Path(resident_id) = path?;
  let ctx = state.context(resident_id, &actor);
  let draft = state
    .drafts
    .peek(ctx.draft_key())
    .filter(|d| d.day() == ctx.day)
    .unwrap_or_else(|| WizardDraft::new(ctx.day));
  Ok(Json(draft))
}

/// `DELETE /residents/{id}/log/draft`
pub async fn discard<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError>
where
  S: ObservationStore + AuditSink + 'static,
{
  let Path(resident_id) = path?;
  let ctx = state.context(resident_id, &actor);
  if let Some(draft) = state.drafts.discard(ctx.draft_key()) {
    tracing::info!(%resident_id, user_id = %actor.user_id, entries = draft.len(), "draft abandoned");
  }
  Ok(StatusCode::NO_CONTENT)
}
