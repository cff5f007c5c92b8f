//! Workspace context resolution for cardsend.
//!
//! The workspace root is the directory holding `cardsend.yaml`: the current
//! working directory by default, or the parent of an explicit `--config`
//! path. Relative paths from the config (extensions directory, log file)
//! are resolved against it.

use crate::config::Config;
use crate::error::{CardError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Default configuration file name in the workspace root.
pub const DEFAULT_CONFIG_FILE: &str = "cardsend.yaml";

/// Resolved paths for a cardsend workspace. All paths are absolute.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    /// Directory relative config paths are resolved against.
    pub root: PathBuf,

    /// Path to the configuration file (which may not exist).
    pub config_path: PathBuf,
}

impl DispatchContext {
    /// Resolve the context from the current working directory.
    pub fn resolve(config_override: Option<&Path>) -> Result<Self> {
        let cwd = env::current_dir().map_err(|e| {
            CardError::UserError(format!("failed to get current working directory: {}", e))
        })?;

        Ok(Self::resolve_from(&cwd, config_override))
    }

    /// Resolve the context from a specific directory.
    pub fn resolve_from<P: AsRef<Path>>(cwd: P, config_override: Option<&Path>) -> Self {
        let cwd = cwd.as_ref();

        match config_override {
            Some(path) => {
                let config_path = cwd.join(path);
                let root = config_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| cwd.to_path_buf());
                Self { root, config_path }
            }
            None => Self {
                root: cwd.to_path_buf(),
                config_path: cwd.join(DEFAULT_CONFIG_FILE),
            },
        }
    }

    /// Load the config, falling back to the built-in table.
    ///
    /// An explicit `--config` that does not exist is an error rather than a
    /// silent fallback.
    pub fn load_config(&self, explicit: bool) -> Result<Config> {
        if explicit && !self.config_path.exists() {
            return Err(CardError::UserError(format!(
                "config file not found at '{}'",
                self.config_path.display()
            )));
        }

        Config::load_or_builtin(&self.config_path)
    }

    /// Absolute path of the extensions directory.
    pub fn extensions_dir(&self, config: &Config) -> PathBuf {
        self.root.join(&config.extensions_dir)
    }

    /// Absolute path of the dispatch log file.
    pub fn log_path(&self, config: &Config) -> PathBuf {
        self.root.join(&config.log_file)
    }
}
