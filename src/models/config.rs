//! Configuration model for Sightline

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::symbol::SymbolKind;

/// Sightline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SightlineConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub references: ReferencesConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: Option<String>,

    /// Paths to ignore (gitignore syntax)
    #[serde(default = "default_ignored_paths")]
    pub ignored_paths: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: None,
            ignored_paths: default_ignored_paths(),
        }
    }
}

fn default_ignored_paths() -> Vec<String> {
    vec![
        "node_modules".to_string(),
        ".git".to_string(),
        "dist".to_string(),
        "build".to_string(),
        "coverage".to_string(),
        ".sightline".to_string(),
    ]
}

/// Builtin name offered by the completion global pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalName {
    pub name: String,
    pub kind: SymbolKind,
}

impl GlobalName {
    pub fn new(name: &str, kind: SymbolKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }
}

/// Completion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "defaults::max_items")]
    pub max_items: usize,

    #[serde(default = "defaults::globals")]
    pub globals: Vec<GlobalName>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_items: defaults::max_items(),
            globals: defaults::globals(),
        }
    }
}

/// Reference scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencesConfig {
    #[serde(default = "defaults::refs_limit")]
    pub limit: usize,

    #[serde(default = "defaults::time_budget_ms")]
    pub time_budget_ms: u64,
}

impl Default for ReferencesConfig {
    fn default() -> Self {
        Self {
            limit: defaults::refs_limit(),
            time_budget_ms: defaults::time_budget_ms(),
        }
    }
}

impl ReferencesConfig {
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }
}

mod defaults {
    use super::{GlobalName, SymbolKind};

    // Completion
    pub fn max_items() -> usize {
        200
    }

    pub fn globals() -> Vec<GlobalName> {
        const CLASSES: &[&str] = &[
            "Array", "ArrayBuffer", "BigInt", "Boolean", "DataView", "Date", "Error", "Map",
            "Number", "Object", "Promise", "Proxy", "RegExp", "Set", "String", "Symbol",
            "TypeError", "WeakMap", "WeakRef", "WeakSet",
        ];
        const NAMESPACES: &[&str] = &["Atomics", "Intl", "JSON", "Math", "Reflect"];
        const FUNCTIONS: &[&str] = &[
            "clearInterval",
            "clearTimeout",
            "decodeURIComponent",
            "encodeURIComponent",
            "isFinite",
            "isNaN",
            "parseFloat",
            "parseInt",
            "queueMicrotask",
            "setInterval",
            "setTimeout",
            "structuredClone",
        ];
        const VARIABLES: &[&str] = &["console", "globalThis"];
        const CONSTANTS: &[&str] = &["Infinity", "NaN", "undefined"];

        CLASSES
            .iter()
            .map(|n| GlobalName::new(n, SymbolKind::Class))
            .chain(
                NAMESPACES
                    .iter()
                    .map(|n| GlobalName::new(n, SymbolKind::Namespace)),
            )
            .chain(
                FUNCTIONS
                    .iter()
                    .map(|n| GlobalName::new(n, SymbolKind::Function)),
            )
            .chain(
                VARIABLES
                    .iter()
                    .map(|n| GlobalName::new(n, SymbolKind::Variable)),
            )
            .chain(
                CONSTANTS
                    .iter()
                    .map(|n| GlobalName::new(n, SymbolKind::Constant)),
            )
            .collect()
    }

    // References
    pub fn refs_limit() -> usize {
        500
    }
    pub fn time_budget_ms() -> u64 {
        2000
    }

    // Search
    pub fn max_file_size_mb() -> u32 {
        5
    }

    // Output
    pub fn format() -> String {
        "json".to_string()
    }
    pub fn color() -> bool {
        true
    }
}

/// Source discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "defaults::max_file_size_mb")]
    pub max_file_size_mb: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: defaults::max_file_size_mb(),
        }
    }
}

impl SearchConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        if self.max_file_size_mb == 0 {
            u64::MAX
        } else {
            self.max_file_size_mb as u64 * 1024 * 1024
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "defaults::format")]
    pub format: String,

    #[serde(default = "defaults::color")]
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: defaults::format(),
            color: defaults::color(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SightlineConfig::default();
        assert_eq!(config.completion.max_items, 200);
        assert_eq!(config.references.limit, 500);
        assert_eq!(config.references.time_budget(), Duration::from_secs(2));
        assert_eq!(config.search.max_file_size_bytes(), 5 * 1024 * 1024);
        assert_eq!(config.output.format, "json");
    }

    #[test]
    fn test_default_globals() {
        let config = SightlineConfig::default();
        let globals = &config.completion.globals;
        assert!(globals.contains(&GlobalName::new("console", SymbolKind::Variable)));
        assert!(globals.contains(&GlobalName::new("Promise", SymbolKind::Class)));
        assert!(globals.contains(&GlobalName::new("JSON", SymbolKind::Namespace)));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: SightlineConfig = toml::from_str(
            r#"
[completion]
max_items = 50
globals = [{ name = "Deno", kind = "namespace" }]

[references]
limit = 10
"#,
        )
        .unwrap();

        assert_eq!(config.completion.max_items, 50);
        assert_eq!(
            config.completion.globals,
            vec![GlobalName::new("Deno", SymbolKind::Namespace)]
        );
        assert_eq!(config.references.limit, 10);
        assert_eq!(config.references.time_budget_ms, 2000);
        assert!(
            config
                .project
                .ignored_paths
                .contains(&"node_modules".to_string())
        );
    }

    #[test]
    fn test_unlimited_file_size() {
        let search = SearchConfig {
            max_file_size_mb: 0,
        };
        assert_eq!(search.max_file_size_bytes(), u64::MAX);
    }
}
