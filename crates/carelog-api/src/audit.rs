//! Read access to the audit trail, for administrators only.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/audit` | `?limit=N` (default 50, at most 500); newest first |

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use carelog_core::store::{AuditEntry, AuditSink, ObservationStore};
use serde::Deserialize;

use crate::{
  AppState,
  auth::{Actor, Role},
  error::ApiError,
};

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct AuditParams {
  pub limit: Option<usize>,
}

/// `GET /audit[?limit=N]`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  query: Result<Query<AuditParams>, QueryRejection>,
) -> Result<Json<Vec<AuditEntry>>, ApiError>
where
  S: ObservationStore + AuditSink + 'static,
{
  if actor.role != Role::Admin {
    return Err(ApiError::Forbidden(actor.role.to_string()));
  }
  let Query(params) = query?;
  let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

  let entries = state
    .engine
    .audit()
    .recent(limit)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(entries))
}
