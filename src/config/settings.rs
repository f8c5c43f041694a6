//! Application configuration

use crate::core::parse_modules;
use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tickhud_types::display::DEFAULT_PERMISSION;
use tickhud_types::{DisplayConfig, SurfaceKind, Theme};

/// Name of the theme that must always exist
pub const DEFAULT_THEME: &str = "default";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read or write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("display config '{permission}' has an invalid {surface} module list: {message}")]
    UnknownModule {
        permission: String,
        surface: SurfaceKind,
        message: String,
    },
    #[error("display config '{permission}' uses undefined theme '{theme}'")]
    UnknownTheme { permission: String, theme: String },
    #[error("more than one display config uses permission '{0}'")]
    DuplicatePermission(String),
}

/// Application-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the config format
    pub version: u32,
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Display config permissions, highest priority first
    #[serde(default)]
    pub permission_priorities: Vec<String>,
    #[serde(default = "default_display_configs")]
    pub display_configs: Vec<DisplayConfig>,
    #[serde(default = "default_themes")]
    pub themes: HashMap<String, Theme>,
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            let mut config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        Ok(Self::load_from_path(&config_path)?)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        Ok(self.save_to_path(&config_path)?)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("dev", "tickhud", "tickhud")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.json"))
    }

    /// Load and validate configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific file path
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content).map_err(io_error)
    }

    /// Reject broken display configs and normalise permission priorities
    ///
    /// Every config permission ends up in the priority list exactly once;
    /// priorities naming no config are dropped.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.themes
            .entry(DEFAULT_THEME.to_string())
            .or_insert_with(Theme::default);

        let mut permissions = HashSet::new();
        for config in &self.display_configs {
            if !permissions.insert(config.permission.as_str()) {
                return Err(ConfigError::DuplicatePermission(config.permission.clone()));
            }

            for (surface, list) in config.module_lists() {
                parse_modules(list).map_err(|e| ConfigError::UnknownModule {
                    permission: config.permission.clone(),
                    surface,
                    message: e.to_string(),
                })?;
            }

            for kind in SurfaceKind::ALL {
                let theme = &config.surface(kind).theme;
                if !self.themes.contains_key(theme) {
                    return Err(ConfigError::UnknownTheme {
                        permission: config.permission.clone(),
                        theme: theme.clone(),
                    });
                }
            }
        }

        let mut seen = HashSet::new();
        self.permission_priorities.retain(|permission| {
            let keep = permissions.contains(permission.as_str()) && seen.insert(permission.clone());
            if !keep {
                warn!("Dropping permission priority '{}' with no display config", permission);
            }
            keep
        });
        for config in &self.display_configs {
            if seen.insert(config.permission.clone()) {
                self.permission_priorities.push(config.permission.clone());
            }
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            sampler: SamplerConfig::default(),
            scheduler: SchedulerConfig::default(),
            permission_priorities: vec![DEFAULT_PERMISSION.to_string()],
            display_configs: default_display_configs(),
            themes: default_themes(),
        }
    }
}

fn default_display_configs() -> Vec<DisplayConfig> {
    vec![DisplayConfig::default()]
}

fn default_themes() -> HashMap<String, Theme> {
    HashMap::from([(DEFAULT_THEME.to_string(), Theme::default())])
}

/// CPU load sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub period_ms: u64,
}

impl SamplerConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms.max(1))
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self { period_ms: 500 }
    }
}

/// Display job scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub worker_threads: usize,
    pub shutdown_timeout_ms: u64,
}

impl SchedulerConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            shutdown_timeout_ms: 1000,
        }
    }
}
