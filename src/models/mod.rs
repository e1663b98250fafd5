//! Data models for Sightline
//!
//! Contains core type definitions used throughout the engine.

pub mod completion;
pub mod config;
pub mod position;
pub mod query;
pub mod source;
pub mod symbol;

// Re-export commonly used types
pub use completion::{CompletionItem, CompletionKind, HoverResult};
pub use config::SightlineConfig;
pub use position::{Location, Position, Range};
pub use query::{QueryOutcome, QueryWarning, ReferenceResult, TruncationReason};
pub use source::{ContentChange, SourceFile};
pub use symbol::{DeclKind, Language, ScopeId, Symbol, SymbolId, SymbolKind};
