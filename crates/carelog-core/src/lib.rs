//! Core types and the stepwise daily-log engine for Carelog.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage and auditing are reached through the traits in [`store`]; the
//! SQLite backend and the HTTP layer live in sibling crates.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod commit;
pub mod controller;
pub mod draft;
pub mod error;
pub mod observation;
pub mod schedule;
pub mod store;
pub mod validate;

pub use error::{Error, ObservationError, Result};

#[cfg(test)]
mod testing;
