//! Global Configuration Singleton

use std::sync::OnceLock;
use std::time::Duration;

use crate::models::config::SightlineConfig;

static CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

/// Concurrent file reads while loading a source tree
const DEFAULT_READ_CONCURRENCY: usize = 32;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub max_file_size_bytes: u64,
    pub read_concurrency: usize,
    pub reference_limit: usize,
    pub reference_budget: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from(&SightlineConfig::default())
    }
}

impl From<&SightlineConfig> for RuntimeConfig {
    fn from(config: &SightlineConfig) -> Self {
        Self {
            max_file_size_bytes: config.search.max_file_size_bytes(),
            read_concurrency: DEFAULT_READ_CONCURRENCY,
            reference_limit: config.references.limit,
            reference_budget: config.references.time_budget(),
        }
    }
}

pub fn init(config: &SightlineConfig) {
    let _ = CONFIG.set(RuntimeConfig::from(config));
}

pub fn max_file_size_bytes() -> u64 {
    config().max_file_size_bytes
}

pub fn read_concurrency() -> usize {
    config().read_concurrency
}

pub fn reference_limit() -> usize {
    config().reference_limit
}

pub fn reference_budget() -> Duration {
    config().reference_budget
}

fn config() -> RuntimeConfig {
    CONFIG.get().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_file_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.reference_limit, 500);
        assert_eq!(config.reference_budget, Duration::from_millis(2000));
        assert_eq!(config.read_concurrency, DEFAULT_READ_CONCURRENCY);
    }

    #[test]
    fn test_runtime_from_config() {
        let mut config = SightlineConfig::default();
        config.search.max_file_size_mb = 1;
        config.references.time_budget_ms = 50;

        let runtime = RuntimeConfig::from(&config);
        assert_eq!(runtime.max_file_size_bytes, 1024 * 1024);
        assert_eq!(runtime.reference_budget, Duration::from_millis(50));
    }
}
