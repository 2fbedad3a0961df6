//! The step controller: drives the wizard walk.
//!
//! One call to [`StepController::handle`] interprets one navigation action
//! against the current position and the caller's draft:
//!
//! | Action   | Validates | Stores | Moves                          |
//! |----------|-----------|--------|--------------------------------|
//! | `next`   | yes       | yes    | forward, on success only       |
//! | `submit` | yes       | yes    | forward; commits at the end    |
//! | `skip`   | no        | no     | forward                        |
//! | `back`   | no        | no     | backward                       |
//!
//! `next` and `submit` are the same default form submission: on the terminal
//! position either one commits. Every move clamps at the schedule's ends.

use serde::{Deserialize, Serialize};

use crate::{
  ObservationError, Result,
  commit::{CommitEngine, CommitSummary, LogContext},
  draft::WizardDraft,
  schedule::{self, Position},
  store::{AuditSink, ObservationStore},
  validate::{self, ObservationFields},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
  #[default]
  Next,
  Submit,
  Skip,
  Back,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEffect {
  /// The payload was stored and the walk moved forward.
  Advanced,
  Skipped,
  Retreated,
  /// The payload failed validation; position and draft are unchanged.
  Rejected(ObservationError),
  /// The terminal step committed; the draft has been cleared.
  Completed(CommitSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
  pub position: Position,
  pub effect:   StepEffect,
}

pub struct StepController<'a, S, A = S> {
  engine: &'a CommitEngine<S, A>,
}

impl<'a, S, A> StepController<'a, S, A>
where
  S: ObservationStore,
  A: AuditSink,
{
  pub fn new(engine: &'a CommitEngine<S, A>) -> Self { Self { engine } }

  /// Apply `action` at `position`.
  ///
  /// Validation failures come back as [`StepEffect::Rejected`]. A failed
  /// commit is an `Err`; `draft` then holds every stored entry, the terminal
  /// one included, and nothing else has changed.
  pub async fn handle(
    &self,
    ctx: &LogContext,
    draft: &mut WizardDraft,
    position: Position,
    action: StepAction,
    fields: &ObservationFields,
  ) -> Result<StepOutcome> {
    let step = position.step();
    match action {
      StepAction::Skip => {
        return Ok(StepOutcome { position: schedule::next(position), effect: StepEffect::Skipped });
      }
      StepAction::Back => {
        return Ok(StepOutcome {
          position: schedule::prev(position),
          effect:   StepEffect::Retreated,
        });
      }
      StepAction::Next | StepAction::Submit => {}
    }

    let observation = match validate::parse(step.category, fields) {
      Ok(obs) => obs,
      Err(e) => {
        tracing::debug!(
          resident_id = %ctx.resident_id,
          step = %step.category,
          meal = %step.meal,
          error = %e,
          "step rejected"
        );
        return Ok(StepOutcome { position, effect: StepEffect::Rejected(e) });
      }
    };

    draft.set(step.meal, observation)?;
    if !position.is_terminal() {
      return Ok(StepOutcome { position: schedule::next(position), effect: StepEffect::Advanced });
    }

    let summary = self.engine.commit(ctx, draft).await?;
    draft.clear();
    Ok(StepOutcome { position, effect: StepEffect::Completed(summary) })
  }
}
