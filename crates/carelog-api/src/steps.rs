//! The guided endpoint: one wizard step per request.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/residents/{id}/log/step` | Body: [`StepRequest`] |
//!
//! The caller's draft lives in the server's [`DraftStore`](carelog_core::draft::DraftStore)
//! between requests and is dropped once the terminal step commits.

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
  response::{IntoResponse, Response},
};
use carelog_core::{
  ObservationError,
  commit::CommitSummary,
  controller::{StepAction, StepController, StepEffect},
  observation::{Category, MealWindow},
  schedule::{self, Position},
  store::{AuditSink, ObservationStore},
  validate::ObservationFields,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{AppState, auth::Actor, error::ApiError};

/// JSON body accepted by `POST /residents/{id}/log/step`.
#[derive(Debug, Deserialize)]
pub struct StepRequest {
  /// The category of the step being submitted.
  pub step:   Category,
  pub meal:   MealWindow,
  #[serde(default)]
  pub action: StepAction,
  /// Step fields, kept raw: `back` and `skip` never look at them.
  #[serde(flatten)]
  pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionView {
  pub index: usize,
  pub step:  Category,
  pub meal:  MealWindow,
}

impl From<Position> for PositionView {
  fn from(position: Position) -> Self {
    let step = position.step();
    Self { index: position.index(), step: step.category, meal: step.meal }
  }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResponse {
  InProgress {
    position: PositionView,
  },
  Rejected {
    position: PositionView,
    error:    String,
    detail:   ObservationError,
  },
  Completed {
    summary: CommitSummary,
  },
}

/// `POST /residents/{id}/log/step`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  actor: Actor,
  path: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<StepRequest>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: ObservationStore + AuditSink + 'static,
{
  let Path(resident_id) = path?;
  let Json(req) = body?;
  let position = schedule::index_of(req.step, req.meal)?;

  let fields = match req.action {
    StepAction::Back | StepAction::Skip => ObservationFields::default(),
    StepAction::Next | StepAction::Submit => match ObservationFields::from_map(req.fields) {
      Ok(fields) => fields,
      Err(detail) => return Ok(rejected(position, detail)),
    },
  };

  let ctx = state.context(resident_id, &actor);
  let key = ctx.draft_key();
  let mut draft = state.drafts.checkout(key, ctx.day);

  let outcome = match StepController::new(&state.engine)
    .handle(&ctx, &mut draft, position, req.action, &fields)
    .await
  {
    Ok(outcome) => outcome,
    Err(e) => {
      // Keep what was submitted so the caller can retry the commit.
      state.drafts.put(key, draft);
      return Err(e.into());
    }
  };

  let response = match outcome.effect {
    StepEffect::Completed(summary) => {
      state.drafts.discard(key);
      tracing::info!(
        %resident_id,
        user_id = %actor.user_id,
        role = %actor.role,
        rows = summary.rows_inserted,
        "daily log completed"
      );
      (StatusCode::OK, Json(StepResponse::Completed { summary }))
    }
    StepEffect::Rejected(detail) => return Ok(rejected(outcome.position, detail)),
    StepEffect::Advanced | StepEffect::Skipped | StepEffect::Retreated => {
      state.drafts.put(key, draft);
      (StatusCode::OK, Json(StepResponse::InProgress { position: outcome.position.into() }))
    }
  };
  Ok(response.into_response())
}

fn rejected(position: Position, detail: ObservationError) -> Response {
  let body = StepResponse::Rejected {
    position: position.into(),
    error: detail.to_string(),
    detail,
  };
  (StatusCode::BAD_REQUEST, Json(body)).into_response()
}
