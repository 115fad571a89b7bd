//! Storefront configuration file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::context::RenderConfig;

/// File names searched for when no config path is given.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["storefront.toml", ".storefront.toml", "storefront.json"];

/// Storefront configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorefrontConfig {
    /// Development mode.
    #[serde(default)]
    pub dev: bool,

    /// Path of the HTML template produced by the client build.
    #[serde(default = "default_template")]
    pub template: PathBuf,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,

    /// Environment-specific overrides.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environments: HashMap<String, EnvironmentConfig>,
}

fn default_template() -> PathBuf {
    PathBuf::from("dist/client/index.html")
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            dev: false,
            template: default_template(),
            log: LogConfig::default(),
            environments: HashMap::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Minimum level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Overrides applied for a named environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentConfig {
    /// Development mode override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev: Option<bool>,

    /// Template path override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,

    /// Logging override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<LogConfig>,
}

impl StorefrontConfig {
    /// Load config from a TOML or JSON file (by extension).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Find a config file in `start` or its ancestors.
    pub fn find(start: &Path) -> Option<(PathBuf, Self)> {
        let mut current = Some(start);

        while let Some(dir) = current {
            for name in CONFIG_FILE_NAMES {
                let candidate = dir.join(name);
                if candidate.exists() {
                    if let Ok(config) = Self::load(&candidate) {
                        return Some((candidate, config));
                    }
                }
            }
            current = dir.parent();
        }

        None
    }

    /// Config with the named environment's overrides applied.
    pub fn for_environment(&self, env: &str) -> Self {
        let mut config = self.clone();

        if let Some(overrides) = self.environments.get(env) {
            if let Some(dev) = overrides.dev {
                config.dev = dev;
            }
            if let Some(template) = &overrides.template {
                config.template = template.clone();
            }
            if let Some(log) = &overrides.log {
                config.log = log.clone();
            }
        }

        config
    }

    /// Render configuration handed to the rendering engine.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig { dev: self.dev }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}
