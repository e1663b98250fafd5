//! Command implementations for Sightline
//!
//! Each command is implemented in its own module. Query commands expose a
//! synchronous `run`-style function over an [`Engine`](crate::services::engine::Engine)
//! so batch mode can reuse them.

pub mod batch;
pub mod complete;
pub mod config;
pub mod find;
pub mod hover;
pub mod status;
