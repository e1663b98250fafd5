//! Query result envelopes

use serde::Serialize;

use super::position::Location;

/// Non-fatal condition reported next to an otherwise valid result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum QueryWarning {
    /// The file's syntax tree contains error or missing nodes
    ParseDegraded { uri: String, error_nodes: usize },
    /// A whole-program scan stopped at its cap
    ResultTruncated {
        limit: usize,
        reason: TruncationReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationReason {
    ResultLimit,
    TimeBudget,
}

/// Query value plus the warnings produced while computing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryOutcome<T> {
    pub value: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<QueryWarning>,
}

impl<T> QueryOutcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<QueryWarning>) -> Self {
        Self { value, warnings }
    }

    pub fn is_degraded(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, QueryWarning::ParseDegraded { .. }))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryOutcome<U> {
        QueryOutcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

/// Reference scan result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceResult {
    pub locations: Vec<Location>,
    /// Set when the scan hit its result or time cap
    pub truncated: bool,
}
