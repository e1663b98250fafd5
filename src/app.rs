//! Application container for Sightline

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::cli::OutputContext;
use crate::config;
use crate::models::config::SightlineConfig;
use crate::services::config::{ConfigService, DefaultConfigService};
use crate::services::engine::Engine;
use crate::services::provider::{ContentProvider, DirectoryProvider};

pub struct App {
    root: PathBuf,
    pub(crate) output: OutputContext,
    pub(crate) config_service: Arc<dyn ConfigService>,
    pub(crate) config: SightlineConfig,
    engine: OnceCell<Arc<Engine>>,
}

impl App {
    pub async fn new() -> anyhow::Result<Self> {
        let root = std::env::current_dir()?;
        Self::with_root(root).await
    }

    pub async fn with_root(root: PathBuf) -> anyhow::Result<Self> {
        tracing::debug!("Initializing Sightline at {:?}", root);

        let output = OutputContext::new(root.clone());
        let config_service = Arc::new(DefaultConfigService::new(&root));
        let config = match config_service.load(false).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default configuration: {}", e);
                SightlineConfig::default()
            }
        };

        config::init(&config);

        Ok(Self {
            root,
            output,
            config_service,
            config,
            engine: OnceCell::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &SightlineConfig {
        &self.config
    }

    /// Engine loaded with every source file under the project root.
    /// The first call walks and reads the tree; later calls share the result.
    pub async fn engine(&self) -> anyhow::Result<Arc<Engine>> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                let provider =
                    DirectoryProvider::new(&self.root, &self.config.project.ignored_paths)?;
                let changes = provider.load().await?;

                let engine = Engine::with_config(&self.config)?;
                engine.apply_changes(&changes)?;
                tracing::debug!("Engine ready with {} files", changes.len());
                Ok::<_, anyhow::Error>(Arc::new(engine))
            })
            .await?;
        Ok(Arc::clone(engine))
    }

    pub fn is_initialized(&self) -> bool {
        self.root.join(".sightline").exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_engine_loads_project() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.js"), "function foo() {}\nfoo();").unwrap();
        std::fs::write(dir.path().join("b.ts"), "export const b = 1;").unwrap();

        let app = App::with_root(dir.path().to_path_buf()).await.unwrap();
        assert!(!app.is_initialized());

        let engine = app.engine().await.unwrap();
        assert_eq!(engine.status().files, 2);

        let again = app.engine().await.unwrap();
        assert!(Arc::ptr_eq(&engine, &again));
    }
}
