//! Response types for CLI output
//!
//! Positions are converted to 1-indexed lines and columns here; the engine
//! itself works with 0-indexed positions.

use serde::Serialize;

use crate::models::completion::{CompletionItem, HoverResult};
use crate::models::position::Location;
use crate::models::query::QueryWarning;
use crate::models::symbol::Symbol;

/// Location in a file, 1-indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationOutput {
    pub file: String,
    pub line: u32,
    pub column: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
}

impl LocationOutput {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            end_line: None,
            end_column: None,
        }
    }

    pub fn from_location(location: &Location) -> Self {
        let (line, column) = location.range.start.to_display();
        let (end_line, end_column) = location.range.end.to_display();
        Self {
            file: location.uri.clone(),
            line,
            column,
            end_line: Some(end_line),
            end_column: Some(end_column),
        }
    }
}

/// Symbol output for find symbol command
#[derive(Debug, Clone, Serialize)]
pub struct SymbolOutput {
    pub name: String,
    pub qualified_name: String,
    pub kind: String,
    pub location: LocationOutput,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merged_with: Vec<LocationOutput>,
}

impl SymbolOutput {
    pub fn from_symbol(symbol: &Symbol) -> Self {
        Self {
            name: symbol.name.clone(),
            qualified_name: symbol.qualified_name.clone(),
            kind: symbol.kind.to_string(),
            location: LocationOutput::from_location(symbol.location()),
            merged_with: symbol
                .declarations
                .iter()
                .skip(1)
                .map(LocationOutput::from_location)
                .collect(),
        }
    }
}

/// Response for find symbol command
#[derive(Debug, Serialize)]
pub struct SymbolsResponse {
    pub count: usize,
    pub symbols: Vec<SymbolOutput>,
}

/// Response for find refs command
#[derive(Debug, Serialize)]
pub struct ReferencesResponse {
    pub count: usize,
    pub truncated: bool,
    pub references: Vec<LocationOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<QueryWarning>,
}

/// Response for find def command
#[derive(Debug, Serialize)]
pub struct DefinitionResponse {
    pub count: usize,
    pub definitions: Vec<LocationOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<QueryWarning>,
}

/// Response for hover command
#[derive(Debug, Serialize)]
pub struct HoverResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<LocationOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<QueryWarning>,
}

impl HoverResponse {
    pub fn new(uri: &str, hover: Option<HoverResult>, warnings: Vec<QueryWarning>) -> Self {
        match hover {
            Some(hover) => Self {
                content: Some(hover.display_text),
                range: Some(LocationOutput::from_location(&Location::new(
                    uri,
                    hover.range,
                ))),
                message: None,
                warnings,
            },
            None => Self {
                content: None,
                range: None,
                message: Some("No hover information available".to_string()),
                warnings,
            },
        }
    }
}

/// Response for complete command
#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub count: usize,
    pub items: Vec<CompletionItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<QueryWarning>,
}
