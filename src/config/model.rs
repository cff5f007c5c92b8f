//! Config struct definition and default implementation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Default timeout for extension handlers in seconds.
pub(super) const DEFAULT_TIMEOUT_SECONDS: u64 = 600;

/// Built-in registry table used when no `cardsend.yaml` exists.
///
/// Only `echo` is a core module; the others must be provided as extension
/// executables before they can be dispatched to.
const BUILTIN_AGENTS: &[(&str, &str)] = &[
    ("dirtyrag", "quick_share"),
    ("echo", "echo"),
    ("gpt", "send_gpt_card"),
    ("jarvess", "post_to_notion"),
    ("orchestrator", "orchestrator_bootcheck"),
    ("trifecta", "trust_router"),
];

/// Configuration for cardsend, loaded from `cardsend.yaml`.
///
/// ```yaml
/// agents:
///   echo:
///     module: echo
///   gpt:
///     module: send_gpt_card
///     timeout_seconds: 120
///     environment:
///       OPENAI_MODEL: gpt-4o
/// extensions_dir: agents
/// log_file: logs/dispatch.log
/// defaults:
///   timeout_seconds: 600
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry table keyed by agent key.
    pub agents: BTreeMap<String, AgentEntry>,

    /// Directory searched for extension modules, relative to the workspace root.
    #[serde(default = "default_extensions_dir")]
    pub extensions_dir: PathBuf,

    /// Dispatch log file, relative to the workspace root.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Settings applied to every entry unless overridden.
    pub defaults: Defaults,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agents: BTreeMap::new(),
            extensions_dir: default_extensions_dir(),
            log_file: default_log_file(),
            defaults: Defaults::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The built-in registry table.
    pub fn builtin() -> Self {
        let agents = BUILTIN_AGENTS
            .iter()
            .map(|(key, module)| (key.to_string(), AgentEntry::new(*module)))
            .collect();

        Self {
            agents,
            ..Self::default()
        }
    }
}

/// Settings applied to all registry entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Timeout for extension handlers in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            extra: BTreeMap::new(),
        }
    }
}

/// One registry entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentEntry {
    /// Module name looked up in the core table, then the extensions directory.
    pub module: String,

    /// Timeout in seconds (overrides the default if set).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Environment variables for extension processes.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,

    /// Unknown fields preserved for forward compatibility.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl AgentEntry {
    /// An entry for `module` with no overrides.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            ..Self::default()
        }
    }

    /// Get the effective timeout for this entry.
    pub fn effective_timeout(&self, defaults: &Defaults) -> u64 {
        self.timeout_seconds.unwrap_or(defaults.timeout_seconds)
    }
}

fn default_extensions_dir() -> PathBuf {
    PathBuf::from("agents")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs").join("dispatch.log")
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}
