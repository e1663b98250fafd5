//! Symbol model definitions
//!
//! Core types for representing resolved program symbols.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::position::Location;

/// Index of a symbol inside a `Program`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a lexical scope inside a `Program`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The shared scope holding script-level declarations of every file
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A named, resolved program entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Declaration form of the first declaration
    pub decl_kind: DeclKind,
    /// Every declaration site; more than one for merged declarations
    pub declarations: Vec<Location>,
    pub scope: ScopeId,
    pub qualified_name: String,
    /// Scope holding the members of classes, enums and namespaces
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<ScopeId>,
}

impl Symbol {
    pub fn new(
        name: String,
        decl_kind: DeclKind,
        declaration: Location,
        scope: ScopeId,
        qualified_name: String,
    ) -> Self {
        Self {
            name,
            kind: decl_kind.symbol_kind(),
            decl_kind,
            declarations: vec![declaration],
            scope,
            qualified_name,
            members: None,
        }
    }

    /// Primary declaration site
    pub fn location(&self) -> &Location {
        &self.declarations[0]
    }

    pub fn is_merged(&self) -> bool {
        self.declarations.len() > 1
    }

    /// Match the qualified name against a glob-like pattern
    ///
    /// Supports `*` as a whole pattern, as prefix, suffix or infix wildcard.
    /// Patterns without `*` match the simple name exactly.
    pub fn matches_pattern(&self, pattern: &str) -> bool {
        if pattern.contains('*') {
            Self::matches_glob(&self.qualified_name, pattern)
                || Self::matches_glob(&self.name, pattern)
        } else {
            self.name == pattern || self.qualified_name == pattern
        }
    }

    fn matches_glob(value: &str, pattern: &str) -> bool {
        if pattern == "*" {
            return true;
        }

        if let Some(prefix) = pattern.strip_suffix('*')
            && !prefix.contains('*')
        {
            return value.starts_with(prefix);
        }

        if let Some(suffix) = pattern.strip_prefix('*')
            && !suffix.contains('*')
        {
            return value.ends_with(suffix);
        }

        if let Some((prefix, suffix)) = pattern.split_once('*') {
            return value.len() >= prefix.len() + suffix.len()
                && value.starts_with(prefix)
                && value.ends_with(suffix);
        }

        value == pattern
    }
}

/// Syntactic declaration form, as written in source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Function,
    Class,
    Var,
    Let,
    Const,
    Parameter,
    Import,
    NamespaceImport,
    Interface,
    TypeAlias,
    Enum,
    Namespace,
    Method,
    Property,
    EnumMember,
}

impl DeclKind {
    pub fn symbol_kind(self) -> SymbolKind {
        match self {
            Self::Function => SymbolKind::Function,
            Self::Class => SymbolKind::Class,
            Self::Var | Self::Let | Self::Parameter | Self::Import => SymbolKind::Variable,
            Self::Const => SymbolKind::Constant,
            Self::NamespaceImport => SymbolKind::Module,
            Self::Interface => SymbolKind::Interface,
            Self::TypeAlias => SymbolKind::TypeAlias,
            Self::Enum => SymbolKind::Enum,
            Self::Namespace => SymbolKind::Namespace,
            Self::Method => SymbolKind::Method,
            Self::Property => SymbolKind::Property,
            Self::EnumMember => SymbolKind::EnumMember,
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Var => "var",
            Self::Let => "let",
            Self::Const => "const",
            Self::Parameter => "parameter",
            Self::Import => "import",
            Self::NamespaceImport => "namespace_import",
            Self::Interface => "interface",
            Self::TypeAlias => "type",
            Self::Enum => "enum",
            Self::Namespace => "namespace",
            Self::Method => "method",
            Self::Property => "property",
            Self::EnumMember => "enum_member",
        };
        write!(f, "{}", s)
    }
}

/// Symbol classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Module,
    Namespace,
    Class,
    Method,
    Property,
    Enum,
    Interface,
    Function,
    Variable,
    Constant,
    EnumMember,
    TypeAlias,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Module => "module",
            Self::Namespace => "namespace",
            Self::Class => "class",
            Self::Method => "method",
            Self::Property => "property",
            Self::Enum => "enum",
            Self::Interface => "interface",
            Self::Function => "function",
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::EnumMember => "enum_member",
            Self::TypeAlias => "type_alias",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "module" => Ok(Self::Module),
            "namespace" => Ok(Self::Namespace),
            "class" => Ok(Self::Class),
            "method" => Ok(Self::Method),
            "property" | "field" => Ok(Self::Property),
            "enum" => Ok(Self::Enum),
            "interface" => Ok(Self::Interface),
            "function" => Ok(Self::Function),
            "variable" => Ok(Self::Variable),
            "constant" => Ok(Self::Constant),
            "enum_member" | "enummember" => Ok(Self::EnumMember),
            "type_alias" | "type" => Ok(Self::TypeAlias),
            _ => Err(format!("Unknown symbol kind: {}", s)),
        }
    }
}

impl SymbolKind {
    /// All valid kind names for error messages
    pub fn all_kind_names() -> &'static [&'static str] {
        &[
            "function",
            "class",
            "method",
            "property",
            "variable",
            "constant",
            "interface",
            "enum",
            "enum_member",
            "namespace",
            "module",
            "type_alias",
        ]
    }
}

/// Supported source languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    /// TypeScript with JSX; angle-bracket casts are not valid here
    Tsx,
    JavaScript,
    #[default]
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "ts" | "mts" | "cts" => Self::TypeScript,
            "tsx" => Self::Tsx,
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            _ => Self::Unknown,
        }
    }

    /// Detect language from a file path or uri
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Get file extensions for this language
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::TypeScript => &["ts", "mts", "cts"],
            Self::Tsx => &["tsx"],
            Self::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Self::Unknown => &[],
        }
    }

    /// Get all supported file extensions
    pub fn all_extensions() -> Vec<&'static str> {
        Self::all()
            .iter()
            .flat_map(|l| l.extensions().iter().copied())
            .collect()
    }

    /// Get all supported languages (excluding Unknown)
    pub fn all() -> &'static [Self] {
        &[Self::TypeScript, Self::Tsx, Self::JavaScript]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::position::{Position, Range};

    fn make_symbol(name: &str, qualified: &str, decl: DeclKind) -> Symbol {
        Symbol::new(
            name.to_string(),
            decl,
            Location::new("test.ts", Range::point(Position::new(0, 0))),
            ScopeId::GLOBAL,
            qualified.to_string(),
        )
    }

    #[test]
    fn test_decl_kind_maps_to_symbol_kind() {
        assert_eq!(DeclKind::Const.symbol_kind(), SymbolKind::Constant);
        assert_eq!(DeclKind::Let.symbol_kind(), SymbolKind::Variable);
        assert_eq!(DeclKind::NamespaceImport.symbol_kind(), SymbolKind::Module);
    }

    #[test]
    fn test_matches_pattern() {
        let sym = make_symbol("update", "src/a.ts::Widget.update", DeclKind::Method);

        assert!(sym.matches_pattern("update"));
        assert!(sym.matches_pattern("*.update"));
        assert!(sym.matches_pattern("src/a.ts::*"));
        assert!(sym.matches_pattern("up*"));
        assert!(sym.matches_pattern("src/*update"));
        assert!(!sym.matches_pattern("reset"));
        assert!(!sym.matches_pattern("*.reset"));
    }

    #[test]
    fn test_symbol_kind_roundtrip_names() {
        for name in SymbolKind::all_kind_names() {
            let kind: SymbolKind = name.parse().unwrap();
            assert_eq!(&kind.to_string(), name);
        }
        assert!("bogus".parse::<SymbolKind>().is_err());
    }

    #[test]
    fn test_language_detection() {
        assert_eq!(Language::from_path(Path::new("src/a.tsx")), Language::Tsx);
        assert_eq!(Language::from_path(Path::new("src/a.mts")), Language::TypeScript);
        assert_eq!(Language::from_path(Path::new("lib/b.mjs")), Language::JavaScript);
        assert_eq!(Language::from_path(Path::new("README.md")), Language::Unknown);
        assert!(Language::all_extensions().contains(&"cts"));
        assert!(Language::all_extensions().contains(&"tsx"));
    }
}
