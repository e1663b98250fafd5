//! Sightline - Code Intelligence Engine for JavaScript and TypeScript
//!
//! Tracks a set of source files, builds an immutable whole-program model of
//! their declarations, scopes and module links, and answers completion,
//! hover, definition and reference queries against it.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod infra;
pub mod models;
pub mod services;

pub use error::{SightlineError, SightlineResult};
pub use services::engine::Engine;
