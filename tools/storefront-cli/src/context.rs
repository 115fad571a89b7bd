//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use storefront_core::StorefrontConfig;

use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// Configuration with environment overrides applied.
    pub config: StorefrontConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Selected environment.
    pub env: Option<String>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from a config file, or search for one from the working
    /// directory upwards.
    pub fn load(config_path: Option<&str>, env: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config_path, config) = match config_path {
            Some(path) => {
                let path = resolve(&cwd, Path::new(path));
                let config = StorefrontConfig::load(&path)?;
                (Some(path), config)
            }
            None => match StorefrontConfig::find(&cwd) {
                Some((path, config)) => (Some(path), config),
                None => (None, StorefrontConfig::default()),
            },
        };

        let config = match env {
            Some(env) => {
                if !config.environments.contains_key(env) {
                    output.warn(&format!("No overrides for environment '{}'", env));
                }
                config.for_environment(env)
            }
            None => config,
        };

        Ok(Self {
            config,
            config_path,
            env: env.map(str::to_string),
            output,
            cwd,
        })
    }

    /// Directory relative paths in the config are resolved against.
    pub fn project_dir(&self) -> &Path {
        self.config_path
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(self.cwd.as_path())
    }

    /// Template path from the config, resolved against the project directory.
    pub fn template_path(&self) -> PathBuf {
        resolve(self.project_dir(), &self.config.template)
    }

    /// Resolve a path given on the command line.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        resolve(&self.cwd, Path::new(path))
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
