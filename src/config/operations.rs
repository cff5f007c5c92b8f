//! Config loading, validation, and utility operations.

use super::model::Config;
use crate::error::{CardError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Agent keys and module names. Module names become file names in the
/// extensions directory, so path separators are never allowed.
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("Invalid agent name regex")
});

/// Check whether `name` is usable as an agent key or module name.
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name) && !name.contains("..")
}

impl Config {
    /// Load config from a YAML file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    /// Returns `Err` if the file exists but cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            CardError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content).map(Some)
    }

    /// Load config from a YAML file, falling back to the built-in table.
    pub fn load_or_builtin<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::load(path)?.unwrap_or_else(Self::builtin))
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| CardError::UserError(format!("failed to parse cardsend.yaml: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Validation rules:
    /// - At least one agent must be configured
    /// - Agent keys and module names must be plain names (no path separators, no `..`)
    /// - Timeouts must be positive
    pub fn validate(&self) -> Result<()> {
        if self.defaults.timeout_seconds == 0 {
            return Err(CardError::UserError(
                "cardsend.yaml validation failed: defaults.timeout_seconds must be greater than 0"
                    .to_string(),
            ));
        }

        if self.agents.is_empty() {
            return Err(CardError::UserError(
                "cardsend.yaml validation failed: no agents configured".to_string(),
            ));
        }

        for (key, entry) in &self.agents {
            if !is_valid_name(key) {
                return Err(CardError::UserError(format!(
                    "cardsend.yaml validation failed: invalid agent key '{}'",
                    key
                )));
            }

            if entry.module.is_empty() {
                return Err(CardError::UserError(format!(
                    "cardsend.yaml validation failed: agent '{}' has empty module",
                    key
                )));
            }

            if !is_valid_name(&entry.module) {
                return Err(CardError::UserError(format!(
                    "cardsend.yaml validation failed: agent '{}' has invalid module name '{}'",
                    key, entry.module
                )));
            }

            if entry.timeout_seconds == Some(0) {
                return Err(CardError::UserError(format!(
                    "cardsend.yaml validation failed: agent '{}' has timeout_seconds of 0",
                    key
                )));
            }
        }

        Ok(())
    }
}
