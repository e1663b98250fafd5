//! Source file model

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::symbol::Language;

/// A tracked source file at one version. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub uri: String,
    pub text: Arc<str>,
    pub version: u64,
}

impl SourceFile {
    pub fn new(uri: impl Into<String>, text: impl Into<Arc<str>>, version: u64) -> Self {
        Self {
            uri: uri.into(),
            text: text.into(),
            version,
        }
    }

    pub fn language(&self) -> Language {
        Language::from_path(Path::new(&self.uri))
    }
}

/// Raw-content change notification from a content provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ContentChange {
    Added { uri: String, text: String },
    Modified { uri: String, text: String },
    Removed { uri: String },
}

impl ContentChange {
    pub fn uri(&self) -> &str {
        match self {
            Self::Added { uri, .. } | Self::Modified { uri, .. } | Self::Removed { uri } => uri,
        }
    }
}
