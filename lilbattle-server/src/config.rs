//! Service Configuration
//!
//! Read from `LILBATTLE_*` environment variables, falling back to defaults.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::indexer::IndexerConfig;
use crate::sync::service::DEFAULT_CHANNEL_CAPACITY;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable holds an unusable value.
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
        /// What was wrong.
        reason: String,
    },
}

/// Runtime configuration of the service and its workers.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Serve reads from the in-memory cache.
    pub cache_enabled: bool,
    /// Directory for file storage; in-memory storage when unset.
    pub storage_dir: Option<PathBuf>,
    /// Indexer coalescing window.
    pub indexer_flush_period: Duration,
    /// Indexer queue capacity.
    pub indexer_queue_capacity: usize,
    /// Screenshot themes, rendered in order.
    pub screenshot_themes: Vec<String>,
    /// Per-game sync channel capacity.
    pub sync_channel_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let indexer = IndexerConfig::default();
        Self {
            cache_enabled: true,
            storage_dir: None,
            indexer_flush_period: indexer.flush_period,
            indexer_queue_capacity: indexer.queue_capacity,
            screenshot_themes: indexer.themes,
            sync_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ServiceConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("LILBATTLE_CACHE_ENABLED") {
            config.cache_enabled = parse_bool("LILBATTLE_CACHE_ENABLED", &value)?;
        }
        if let Some(value) = lookup("LILBATTLE_STORAGE_DIR") {
            if !value.is_empty() {
                config.storage_dir = Some(PathBuf::from(value));
            }
        }
        if let Some(value) = lookup("LILBATTLE_INDEXER_FLUSH_MS") {
            let ms = parse_positive("LILBATTLE_INDEXER_FLUSH_MS", &value)?;
            config.indexer_flush_period = Duration::from_millis(ms as u64);
        }
        if let Some(value) = lookup("LILBATTLE_INDEXER_QUEUE") {
            config.indexer_queue_capacity = parse_positive("LILBATTLE_INDEXER_QUEUE", &value)?;
        }
        if let Some(value) = lookup("LILBATTLE_SCREENSHOT_THEMES") {
            let themes: Vec<String> = value
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
            if themes.is_empty() {
                return Err(ConfigError::Invalid {
                    var: "LILBATTLE_SCREENSHOT_THEMES",
                    value,
                    reason: "no themes listed".into(),
                });
            }
            config.screenshot_themes = themes;
        }
        if let Some(value) = lookup("LILBATTLE_SYNC_CAPACITY") {
            config.sync_channel_capacity = parse_positive("LILBATTLE_SYNC_CAPACITY", &value)?;
        }

        Ok(config)
    }

    /// Indexer worker settings.
    pub fn indexer_config(&self) -> IndexerConfig {
        IndexerConfig {
            flush_period: self.indexer_flush_period,
            queue_capacity: self.indexer_queue_capacity,
            themes: self.screenshot_themes.clone(),
        }
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "expected a boolean".into(),
        }),
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be positive".into(),
        }),
        Err(e) => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}
