//! Source discovery with .gitignore integration
//!
//! Uses the `ignore` crate (from ripgrep) for gitignore-style pattern matching.
//! Nested .gitignore files are scoped to their directory, `.sightline/ignore`
//! adds project-local patterns on top.

use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::overrides::{Override, OverrideBuilder};

/// File filter configuration
#[derive(Debug, Clone)]
pub struct FileFilterConfig {
    /// Root directory for relative path resolution
    pub root: PathBuf,
    pub respect_gitignore: bool,
    /// Use `.sightline/ignore` for filtering
    pub respect_project_ignore: bool,
    /// Additional ignore patterns (gitignore syntax)
    pub ignore_patterns: Vec<String>,
    /// Include patterns, these win over ignores
    pub include_patterns: Vec<String>,
    pub include_hidden: bool,
}

impl Default for FileFilterConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            respect_gitignore: true,
            respect_project_ignore: true,
            ignore_patterns: Vec::new(),
            include_patterns: Vec::new(),
            include_hidden: false,
        }
    }
}

pub struct FileFilter {
    config: FileFilterConfig,
    gitignore: Option<Gitignore>,
    project_ignore: Option<Gitignore>,
    overrides: Option<Override>,
}

impl FileFilter {
    pub fn new(config: FileFilterConfig) -> Self {
        let gitignore = config
            .respect_gitignore
            .then(|| Self::load_gitignore(&config.root))
            .flatten();
        let project_ignore = config
            .respect_project_ignore
            .then(|| Self::load_project_ignore(&config.root))
            .flatten();
        let overrides = Self::build_overrides(&config);

        Self {
            config,
            gitignore,
            project_ignore,
            overrides,
        }
    }

    /// Filter rooted at `root` with gitignore and project ignore enabled
    pub fn with_gitignore(root: impl AsRef<Path>) -> Self {
        Self::new(FileFilterConfig {
            root: root.as_ref().to_path_buf(),
            ..Default::default()
        })
    }

    /// Filter rooted at `root` with extra ignore patterns from configuration
    pub fn with_patterns(root: impl AsRef<Path>, ignore_patterns: &[String]) -> Self {
        Self::new(FileFilterConfig {
            root: root.as_ref().to_path_buf(),
            ignore_patterns: ignore_patterns.to_vec(),
            ..Default::default()
        })
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    fn load_gitignore(root: &Path) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(root);

        let gitignore_path = root.join(".gitignore");
        if gitignore_path.exists()
            && let Some(err) = builder.add(&gitignore_path)
        {
            tracing::warn!("Failed to parse .gitignore: {}", err);
        }

        // Walk with gitignore on so ignored trees such as node_modules are never entered
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .max_depth(Some(10))
            .build();

        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.file_name() == Some(std::ffi::OsStr::new(".gitignore"))
                && path != gitignore_path
                && let Some(err) = builder.add(path)
            {
                tracing::warn!("Failed to parse {:?}: {}", path, err);
            }
        }

        builder.build().ok()
    }

    fn load_project_ignore(root: &Path) -> Option<Gitignore> {
        let ignore_path = root.join(".sightline").join("ignore");
        if !ignore_path.exists() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(&ignore_path) {
            tracing::warn!("Failed to parse .sightline/ignore: {}", err);
        }

        builder.build().ok()
    }

    fn build_overrides(config: &FileFilterConfig) -> Option<Override> {
        if config.ignore_patterns.is_empty() && config.include_patterns.is_empty() {
            return None;
        }

        let mut builder = OverrideBuilder::new(&config.root);

        // Override globs whitelist on match, so ignores are added negated
        for pattern in &config.ignore_patterns {
            if let Err(e) = builder.add(&format!("!{}", pattern)) {
                tracing::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        for pattern in &config.include_patterns {
            if let Err(e) = builder.add(pattern) {
                tracing::warn!("Invalid include pattern '{}': {}", pattern, e);
            }
        }

        builder.build().ok()
    }

    fn matches_default_pattern(name: &str) -> bool {
        DEFAULT_IGNORE_PATTERNS.iter().any(|pattern| {
            match pattern.strip_prefix('*') {
                Some(suffix) => name.ends_with(suffix),
                None => name == *pattern,
            }
        })
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.config.root).unwrap_or(path);
        let is_dir = path.is_dir();

        for component in relative.components() {
            let Component::Normal(name) = component else {
                continue;
            };
            let Some(name) = name.to_str() else {
                continue;
            };
            if Self::matches_default_pattern(name) {
                return true;
            }
            if !self.config.include_hidden && name.starts_with('.') {
                return true;
            }
        }

        if let Some(ref ignore) = self.project_ignore {
            match ignore.matched(relative, is_dir) {
                ignore::Match::Ignore(_) => return true,
                ignore::Match::Whitelist(_) => return false,
                ignore::Match::None => {}
            }
        }

        if let Some(ref overrides) = self.overrides {
            match overrides.matched(relative, is_dir) {
                ignore::Match::Ignore(_) => return true,
                ignore::Match::Whitelist(_) => return false,
                ignore::Match::None => {}
            }
        }

        if let Some(ref gitignore) = self.gitignore {
            // A file below an ignored directory is ignored too
            let matched = if path.starts_with(&self.config.root) {
                gitignore.matched_path_or_any_parents(relative, is_dir)
            } else {
                gitignore.matched(relative, is_dir)
            };
            match matched {
                ignore::Match::Ignore(_) => return true,
                ignore::Match::Whitelist(_) => return false,
                ignore::Match::None => {}
            }
        }

        false
    }

    pub fn should_include(&self, path: &Path) -> bool {
        !self.is_ignored(path)
    }

    pub fn walk_builder(&self) -> WalkBuilder {
        let mut builder = WalkBuilder::new(&self.config.root);

        builder
            .hidden(!self.config.include_hidden)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .require_git(false);

        builder
    }

    /// All files under the root with one of `extensions`, sorted by path
    pub fn discover_files(&self, extensions: &[&str]) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .walk_builder()
            .build()
            .filter_map(|e| e.ok())
            .map(|entry| entry.into_path())
            .filter(|path| path.is_file())
            .filter(|path| {
                extensions.is_empty()
                    || path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|ext| extensions.contains(&ext))
            })
            .filter(|path| self.should_include(path))
            .collect();

        files.sort();
        files
    }
}

/// Directories and files never treated as program sources
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    // Version control
    ".git",
    ".svn",
    ".hg",
    // Dependencies
    "node_modules",
    "bower_components",
    "jspm_packages",
    ".pnp",
    ".yarn",
    // Build outputs
    "dist",
    "build",
    "out",
    ".next",
    ".nuxt",
    ".output",
    ".svelte-kit",
    "coverage",
    // Bundles
    "*.min.js",
    "*.bundle.js",
    // Editors
    ".idea",
    ".vscode",
    "*.swp",
    // Caches
    ".cache",
    ".parcel-cache",
    ".turbo",
    ".eslintcache",
    // Logs
    "*.log",
    ".sightline",
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_gitignore_integration() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join(".gitignore"), "*.generated.ts\nlegacy/\n").unwrap();
        fs::write(root.join("main.ts"), "export const a = 1;").unwrap();
        fs::write(root.join("api.generated.ts"), "export {}").unwrap();
        fs::create_dir(root.join("legacy")).unwrap();
        fs::write(root.join("legacy/old.js"), "var x;").unwrap();

        let filter = FileFilter::with_gitignore(root);

        assert!(filter.should_include(&root.join("main.ts")));
        assert!(!filter.should_include(&root.join("api.generated.ts")));
        assert!(!filter.should_include(&root.join("legacy")));
        assert!(!filter.should_include(&root.join("legacy/old.js")));
    }

    #[test]
    fn test_project_ignore() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join(".sightline")).unwrap();
        fs::write(root.join(".sightline/ignore"), "*.spec.ts\n").unwrap();
        fs::write(root.join("widget.ts"), "export class Widget {}").unwrap();
        fs::write(root.join("widget.spec.ts"), "import './widget';").unwrap();

        let filter = FileFilter::with_gitignore(root);

        assert!(filter.should_include(&root.join("widget.ts")));
        assert!(!filter.should_include(&root.join("widget.spec.ts")));
    }

    #[test]
    fn test_discover_files_by_extension() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("src/lib")).unwrap();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        fs::write(root.join("src/b.ts"), "").unwrap();
        fs::write(root.join("src/lib/a.js"), "").unwrap();
        fs::write(root.join("src/app.min.js"), "").unwrap();
        fs::write(root.join("README.md"), "").unwrap();
        fs::write(root.join("node_modules/dep/index.js"), "").unwrap();

        let filter = FileFilter::with_gitignore(root);
        let files = filter.discover_files(&["ts", "js"]);

        assert_eq!(
            files,
            vec![root.join("src/b.ts"), root.join("src/lib/a.js")]
        );
    }

    #[test]
    fn test_config_patterns() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("fixtures")).unwrap();
        fs::write(root.join("fixtures/data.ts"), "").unwrap();
        fs::write(root.join("index.ts"), "").unwrap();

        let filter = FileFilter::with_patterns(root, &["fixtures/**".to_string()]);
        let files = filter.discover_files(&["ts"]);

        assert_eq!(files, vec![root.join("index.ts")]);
    }
}
