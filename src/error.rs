//! Error types for Sightline

use thiserror::Error;

use crate::models::symbol::SymbolId;

pub type SightlineResult<T> = std::result::Result<T, SightlineError>;

#[derive(Debug, Error)]
pub enum SightlineError {
    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Query(#[from] QueryError),

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Parser setup failed: {0}")]
    ParserSetup(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SightlineError {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Registry(e) => e.is_not_found(),
            Self::Query(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// Source registry mutation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("File already tracked: {0}")]
    DuplicateFile(String),

    #[error("File not tracked: {0}")]
    NotFound(String),
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Query failures. Both variants are "not found" conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("File not tracked: {0}")]
    FileNotFound(String),

    #[error("Position {line}:{column} is outside {uri}")]
    PositionOutOfRange { uri: String, line: u32, column: u32 },
}

impl QueryError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::PositionOutOfRange { .. }
        )
    }
}

/// Type facts provider failures. Callers degrade instead of propagating these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactsError {
    #[error("Type facts unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown symbol #{0}")]
    UnknownSymbol(SymbolId),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Source root does not exist: {}", .0.display())]
    RootNotFound(std::path::PathBuf),

    #[error("File too large ({size_mb}MB > {limit_mb}MB limit): {path}")]
    FileTooLarge {
        path: String,
        size_mb: u64,
        limit_mb: u64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
