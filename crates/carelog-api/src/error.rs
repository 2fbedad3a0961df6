//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use carelog_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing or malformed caller identity")]
  Unauthenticated,

  #[error("role {0:?} is not permitted here")]
  Forbidden(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = self.to_string();
    let (status, body) = match &self {
      ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, json!({ "error": message })),
      ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, json!({ "error": message })),
      ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
      ApiError::Core(CoreError::InvalidPosition { step, meal }) => (
        StatusCode::BAD_REQUEST,
        json!({ "error": message, "step": step, "meal": meal }),
      ),
      ApiError::Core(CoreError::InvalidObservation(detail)) => (
        StatusCode::BAD_REQUEST,
        json!({ "error": message, "detail": detail }),
      ),
      ApiError::Core(CoreError::CommitFailed(_)) => {
        tracing::error!(error = %message, "commit failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({ "error": "the daily log could not be saved; nothing was changed" }),
        )
      }
      ApiError::Store(_) => {
        tracing::error!(error = %message, "store read failed");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "internal storage error" }))
      }
    };
    (status, Json(body)).into_response()
  }
}
