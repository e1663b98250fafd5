//! Completion and hover result types

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::position::Range;
use super::symbol::SymbolKind;

/// Completion item kind, serialized as the LSP `CompletionItemKind` number
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum CompletionKind {
    Method = 2,
    Function = 3,
    Field = 5,
    Variable = 6,
    Class = 7,
    Interface = 8,
    Module = 9,
    Property = 10,
    Enum = 13,
    Keyword = 14,
    Constant = 21,
    EnumMember = 20,
    TypeParameter = 25,
}

impl CompletionKind {
    /// Tie-break rank inside an ordering bucket, lower sorts first
    pub fn priority(self) -> u8 {
        match self {
            Self::Variable => 0,
            Self::Constant => 1,
            Self::Field | Self::Property => 2,
            Self::Method => 3,
            Self::Function => 4,
            Self::Class => 5,
            Self::Interface => 6,
            Self::Enum => 7,
            Self::EnumMember => 8,
            Self::TypeParameter => 9,
            Self::Module => 10,
            Self::Keyword => 11,
        }
    }
}

impl From<SymbolKind> for CompletionKind {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Module | SymbolKind::Namespace => Self::Module,
            SymbolKind::Class => Self::Class,
            SymbolKind::Method => Self::Method,
            SymbolKind::Property => Self::Property,
            SymbolKind::Enum => Self::Enum,
            SymbolKind::Interface => Self::Interface,
            SymbolKind::Function => Self::Function,
            SymbolKind::Variable => Self::Variable,
            SymbolKind::Constant => Self::Constant,
            SymbolKind::EnumMember => Self::EnumMember,
            SymbolKind::TypeAlias => Self::TypeParameter,
        }
    }
}

/// Single completion candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionKind,
    pub insert_text: String,
    pub sort_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// Hover information for an identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoverResult {
    pub display_text: String,
    pub range: Range,
}
