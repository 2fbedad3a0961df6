//! HTTP layer for Carelog.
//!
//! Exposes an axum [`Router`] over a [`CommitEngine`] and an in-process
//! [`DraftStore`], backed by any store implementing both
//! [`ObservationStore`] and [`AuditSink`]. Caller identity arrives in
//! headers set by an upstream authenticator; see [`auth`].

pub mod audit;
pub mod auth;
pub mod drafts;
pub mod error;
pub mod logs;
pub mod meals;
pub mod steps;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  routing::{get, post},
};
use carelog_core::{
  commit::{CommitEngine, LogContext},
  draft::DraftStore,
  store::{AuditSink, ObservationStore},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use auth::Actor;
pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CARELOG_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("carelog.db"),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub engine: Arc<CommitEngine<S>>,
  pub drafts: Arc<DraftStore>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      engine: self.engine.clone(),
      drafts: self.drafts.clone(),
    }
  }
}

impl<S> AppState<S>
where
  S: ObservationStore + AuditSink,
{
  /// One store serves as both the observation store and the audit sink.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      engine: Arc::new(CommitEngine::new(store.clone(), store)),
      drafts: Arc::new(DraftStore::new()),
    }
  }

  pub(crate) fn context(&self, resident_id: Uuid, actor: &Actor) -> LogContext {
    LogContext { resident_id, user_id: actor.user_id, day: today() }
  }
}

/// The server's local calendar day.
pub(crate) fn today() -> NaiveDate { chrono::Local::now().date_naive() }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the Carelog router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ObservationStore + AuditSink + 'static,
{
  Router::new()
    .route("/health", get(health))
    .route("/audit", get(audit::handler::<S>))
    .route("/residents/{id}/log", get(logs::handler::<S>))
    .route("/residents/{id}/log/step", post(steps::handler::<S>))
    .route(
      "/residents/{id}/log/draft",
      get(drafts::show::<S>).delete(drafts::discard::<S>),
    )
    .route("/residents/{id}/log/{meal}", post(meals::handler::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

// ─── Integration tests ────────────────────────────────────────────────────────
