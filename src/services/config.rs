//! Configuration service for Sightline

use std::path::{Path, PathBuf};
use std::process::Command;

use async_trait::async_trait;

use crate::error::ConfigError;
use crate::models::config::{ProjectConfig, SightlineConfig};

#[async_trait]
pub trait ConfigService: Send + Sync {
    async fn load(&self, global_only: bool) -> Result<SightlineConfig, ConfigError>;
    fn config_path(&self, global: bool) -> PathBuf;
    async fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError>;
    async fn edit(&self, global: bool) -> Result<PathBuf, ConfigError>;
}

pub struct DefaultConfigService {
    root: PathBuf,
}

impl DefaultConfigService {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn global_config_path() -> PathBuf {
        // XDG standard: ~/.config/sightline/config.toml
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sightline")
            .join("config.toml")
    }

    fn project_config_path(&self) -> PathBuf {
        self.root.join(".sightline").join("config.toml")
    }

    async fn load_from_path(path: &Path) -> Result<SightlineConfig, ConfigError> {
        if !path.exists() {
            return Ok(SightlineConfig::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
    }

    async fn write_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let config = SightlineConfig::default();
        let content =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::Parse(e.to_string()))?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    fn get_editor() -> String {
        std::env::var("EDITOR").unwrap_or_else(|_| {
            if cfg!(target_os = "macos") {
                "open".to_string()
            } else if cfg!(target_os = "windows") {
                "notepad".to_string()
            } else {
                "vi".to_string()
            }
        })
    }
}

#[async_trait]
impl ConfigService for DefaultConfigService {
    async fn load(&self, global_only: bool) -> Result<SightlineConfig, ConfigError> {
        if global_only {
            return Self::load_from_path(&Self::global_config_path()).await;
        }

        let global = Self::load_from_path(&Self::global_config_path()).await?;
        let project = Self::load_from_path(&self.project_config_path()).await?;
        let config = merge_config(global, project);
        Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
    }

    fn config_path(&self, global: bool) -> PathBuf {
        if global {
            Self::global_config_path()
        } else {
            self.project_config_path()
        }
    }

    async fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError> {
        let path = self.config_path(global);

        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                key: "config".to_string(),
                message: format!(
                    "Config already exists: {}. Use --force to overwrite.",
                    path.display()
                ),
            });
        }

        Self::write_default_config(&path).await?;
        Ok(path)
    }

    async fn edit(&self, global: bool) -> Result<PathBuf, ConfigError> {
        let path = self.config_path(global);

        if !path.exists() {
            return Err(ConfigError::NotFound(format!(
                "Config file does not exist: {}\nRun: sightline config init{}",
                path.display(),
                if global { " --global" } else { "" }
            )));
        }

        let editor = Self::get_editor();
        let status =
            Command::new(&editor)
                .arg(&path)
                .status()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "editor".to_string(),
                    message: format!("Failed to launch editor '{}': {}", editor, e),
                })?;

        if !status.success() {
            return Err(ConfigError::InvalidValue {
                key: "editor".to_string(),
                message: "Editor exited with error".to_string(),
            });
        }

        Ok(path)
    }
}

/// Project settings win section by section; the project name falls back to the global one
fn merge_config(base: SightlineConfig, overlay: SightlineConfig) -> SightlineConfig {
    SightlineConfig {
        project: ProjectConfig {
            name: overlay.project.name.or(base.project.name),
            ignored_paths: overlay.project.ignored_paths,
        },
        completion: overlay.completion,
        references: overlay.references,
        search: overlay.search,
        output: overlay.output,
    }
}

fn apply_env_overrides(
    mut config: SightlineConfig,
    var: impl Fn(&str) -> Option<String>,
) -> SightlineConfig {
    if let Some(val) = var("SIGHTLINE_OUTPUT_FORMAT") {
        config.output.format = val;
    }
    if let Some(val) = var("SIGHTLINE_REFS_LIMIT")
        && let Ok(limit) = val.parse()
    {
        config.references.limit = limit;
    }
    if let Some(val) = var("SIGHTLINE_COMPLETION_LIMIT")
        && let Ok(limit) = val.parse()
    {
        config.completion.max_items = limit;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_project_config_loaded() {
        let dir = TempDir::new().unwrap();
        let service = DefaultConfigService::new(dir.path());
        let path = service.config_path(false);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "[references]\nlimit = 7\n").await.unwrap();

        let config = DefaultConfigService::load_from_path(&path).await.unwrap();
        assert_eq!(config.references.limit, 7);
        assert_eq!(config.completion.max_items, 200);
    }

    #[tokio::test]
    async fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = DefaultConfigService::load_from_path(&dir.path().join("none.toml"))
            .await
            .unwrap();
        assert_eq!(config.references.limit, 500);
    }

    #[tokio::test]
    async fn test_invalid_toml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[references\nlimit = ").await.unwrap();

        let err = DefaultConfigService::load_from_path(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let service = DefaultConfigService::new(dir.path());

        let path = service.init(false, false).await.unwrap();
        assert!(path.ends_with(".sightline/config.toml"));
        let written = DefaultConfigService::load_from_path(&path).await.unwrap();
        assert_eq!(written.references.limit, 500);

        assert!(service.init(false, false).await.is_err());
        assert!(service.init(false, true).await.is_ok());
    }

    #[test]
    fn test_merge_keeps_global_name() {
        let mut global = SightlineConfig::default();
        global.project.name = Some("shared".to_string());
        let mut project = SightlineConfig::default();
        project.references.limit = 3;

        let merged = merge_config(global, project);
        assert_eq!(merged.project.name.as_deref(), Some("shared"));
        assert_eq!(merged.references.limit, 3);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SIGHTLINE_OUTPUT_FORMAT", "text"),
            ("SIGHTLINE_REFS_LIMIT", "25"),
            ("SIGHTLINE_COMPLETION_LIMIT", "not-a-number"),
        ]);
        let config = apply_env_overrides(SightlineConfig::default(), |key| {
            vars.get(key).map(|v| v.to_string())
        });

        assert_eq!(config.output.format, "text");
        assert_eq!(config.references.limit, 25);
        assert_eq!(config.completion.max_items, 200);
    }
}
