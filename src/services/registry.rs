//! Source Registry
//!
//! Owns the current text of every tracked file together with one registry-wide
//! version counter. Every mutation takes the next counter value, so a counter
//! value identifies one set of file contents.

use std::collections::BTreeMap;

use crate::error::RegistryError;
use crate::models::source::{ContentChange, SourceFile};

/// Point-in-time copy of the registry, files ordered by uri. Texts are
/// shared `Arc<str>`s.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub version: u64,
    pub files: Vec<SourceFile>,
}

#[derive(Debug, Default)]
pub struct SourceRegistry {
    files: BTreeMap<String, SourceFile>,
    version: u64,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    pub fn add_file(&mut self, uri: &str, text: &str) -> Result<u64, RegistryError> {
        if self.files.contains_key(uri) {
            return Err(RegistryError::DuplicateFile(uri.to_string()));
        }
        let version = self.next_version();
        self.files
            .insert(uri.to_string(), SourceFile::new(uri, text, version));
        Ok(version)
    }

    pub fn update_file(&mut self, uri: &str, text: &str) -> Result<u64, RegistryError> {
        if !self.files.contains_key(uri) {
            return Err(RegistryError::NotFound(uri.to_string()));
        }
        let version = self.next_version();
        self.files
            .insert(uri.to_string(), SourceFile::new(uri, text, version));
        Ok(version)
    }

    /// Stop tracking `uri`. The counter still advances so the next program
    /// version differs from every earlier one.
    pub fn remove_file(&mut self, uri: &str) -> Result<u64, RegistryError> {
        if self.files.remove(uri).is_none() {
            return Err(RegistryError::NotFound(uri.to_string()));
        }
        Ok(self.next_version())
    }

    /// Apply a provider notification. `Added` for a tracked uri and
    /// `Modified` for an untracked one are treated as upserts.
    pub fn apply(&mut self, change: &ContentChange) -> Result<u64, RegistryError> {
        match change {
            ContentChange::Added { uri, text } | ContentChange::Modified { uri, text } => {
                if self.contains(uri) {
                    self.update_file(uri, text)
                } else {
                    self.add_file(uri, text)
                }
            }
            ContentChange::Removed { uri } => self.remove_file(uri),
        }
    }

    pub fn get(&self, uri: &str) -> Option<&SourceFile> {
        self.files.get(uri)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.files.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            version: self.version,
            files: self.files.values().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_monotonic() {
        let mut registry = SourceRegistry::new();
        let v1 = registry.add_file("a.ts", "let a = 1;").unwrap();
        let v2 = registry.add_file("b.ts", "let b = 2;").unwrap();
        let v3 = registry.update_file("a.ts", "let a = 3;").unwrap();
        let v4 = registry.remove_file("b.ts").unwrap();

        assert!(v1 < v2 && v2 < v3 && v3 < v4);
        assert_eq!(registry.version(), v4);
        assert_eq!(registry.get("a.ts").unwrap().version, v3);
    }

    #[test]
    fn test_duplicate_and_missing() {
        let mut registry = SourceRegistry::new();
        registry.add_file("a.ts", "").unwrap();

        assert_eq!(
            registry.add_file("a.ts", "x"),
            Err(RegistryError::DuplicateFile("a.ts".to_string()))
        );
        assert_eq!(
            registry.update_file("b.ts", "x"),
            Err(RegistryError::NotFound("b.ts".to_string()))
        );
        assert_eq!(
            registry.remove_file("b.ts"),
            Err(RegistryError::NotFound("b.ts".to_string()))
        );
        // Failed mutations leave the counter alone
        assert_eq!(registry.version(), 1);
    }

    #[test]
    fn test_snapshot_is_ordered_and_detached() {
        let mut registry = SourceRegistry::new();
        registry.add_file("z.ts", "z").unwrap();
        registry.add_file("a.ts", "a").unwrap();

        let snapshot = registry.snapshot();
        registry.update_file("a.ts", "changed").unwrap();

        let uris: Vec<&str> = snapshot.files.iter().map(|f| f.uri.as_str()).collect();
        assert_eq!(uris, vec!["a.ts", "z.ts"]);
        assert_eq!(&*snapshot.files[0].text, "a");
        assert_eq!(snapshot.version, 2);
    }

    #[test]
    fn test_apply_changes() {
        let mut registry = SourceRegistry::new();
        registry
            .apply(&ContentChange::Added {
                uri: "a.js".to_string(),
                text: "1".to_string(),
            })
            .unwrap();
        registry
            .apply(&ContentChange::Modified {
                uri: "a.js".to_string(),
                text: "2".to_string(),
            })
            .unwrap();
        assert_eq!(&*registry.get("a.js").unwrap().text, "2");

        registry
            .apply(&ContentChange::Removed {
                uri: "a.js".to_string(),
            })
            .unwrap();
        assert!(registry.is_empty());
    }
}
