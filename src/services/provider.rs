//! File Content Provider
//!
//! Supplies raw source text to the engine. The directory provider walks a
//! project root with the gitignore-aware filter and reads matching JS/TS
//! files concurrently.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::error::{ProviderError, SightlineResult};
use crate::infra::file_filter::FileFilter;
use crate::models::source::ContentChange;
use crate::models::symbol::Language;

#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Every file the provider currently knows, as `Added` changes sorted by uri
    async fn load(&self) -> SightlineResult<Vec<ContentChange>>;

    /// Current text of one file
    async fn read(&self, uri: &str) -> SightlineResult<String>;
}

pub struct DirectoryProvider {
    root: PathBuf,
    filter: FileFilter,
    max_file_size: u64,
    concurrency: usize,
}

impl DirectoryProvider {
    pub fn new(root: impl AsRef<Path>, ignored_paths: &[String]) -> SightlineResult<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ProviderError::RootNotFound(root.to_path_buf()).into());
        }

        Ok(Self {
            root: root.to_path_buf(),
            filter: FileFilter::with_patterns(root, ignored_paths),
            max_file_size: crate::config::max_file_size_bytes(),
            concurrency: crate::config::read_concurrency().max(1),
        })
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Root-relative uri with `/` separators
    pub fn uri_for(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn path_for(&self, uri: &str) -> PathBuf {
        uri.split('/').fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Read one file, rejecting it when it exceeds the size cap
    async fn read_path(&self, path: &Path) -> Result<String, ProviderError> {
        let metadata = tokio::fs::metadata(path).await?;
        if metadata.len() > self.max_file_size {
            return Err(ProviderError::FileTooLarge {
                path: path.display().to_string(),
                size_mb: metadata.len() / 1024 / 1024,
                limit_mb: self.max_file_size / 1024 / 1024,
            });
        }
        Ok(tokio::fs::read_to_string(path).await?)
    }
}

#[async_trait]
impl ContentProvider for DirectoryProvider {
    async fn load(&self) -> SightlineResult<Vec<ContentChange>> {
        let extensions = Language::all_extensions();
        let files = self.filter.discover_files(&extensions);
        debug!("Discovered {} source files under {}", files.len(), self.root.display());

        let mut changes: Vec<ContentChange> = stream::iter(files)
            .map(|path| async move {
                match self.read_path(&path).await {
                    Ok(text) => Some(ContentChange::Added {
                        uri: self.uri_for(&path),
                        text,
                    }),
                    Err(ProviderError::FileTooLarge {
                        path,
                        size_mb,
                        ..
                    }) => {
                        warn!("Skipping large file ({}MB): {}", size_mb, path);
                        None
                    }
                    Err(e) => {
                        warn!("Skipping unreadable file {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|change| async move { change })
            .collect()
            .await;

        changes.sort_by(|a, b| a.uri().cmp(b.uri()));
        debug!("Loaded {} files", changes.len());
        Ok(changes)
    }

    async fn read(&self, uri: &str) -> SightlineResult<String> {
        Ok(self.read_path(&self.path_for(uri)).await?)
    }
}
