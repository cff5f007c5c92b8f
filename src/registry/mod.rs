//! Agent registry: maps agent keys to handler modules.
//!
//! The table is fixed when the registry is built and never changes, so a
//! single `Registry` can be shared by any number of concurrent dispatches.
//!
//! # Resolution Order
//!
//! 1. Look the key up in the table; unknown keys fail with the valid key set
//! 2. Ask each module source in turn (core, then extensions) for the module
//! 3. If no source has it, fail naming the module and the roots searched

mod source;


pub use source::{CoreSource, ExtensionSource, LoadedModule, Lookup, ModuleOrigin, ModuleSource};

use crate::config::Config;
use crate::context::DispatchContext;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use thiserror::Error;

/// One row of the registry table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Symbolic agent key.
    pub agent_key: String,
    /// Module name searched for in the module sources.
    pub module: String,
    /// Time limit for extension handlers.
    pub timeout: Duration,
    /// Environment variables for extension handlers.
    pub environment: HashMap<String, String>,
}

impl RegistryEntry {
    /// An entry with the default timeout and no environment.
    #[cfg(test)]
    pub fn new(agent_key: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            agent_key: agent_key.into(),
            module: module.into(),
            timeout: Duration::from_secs(crate::config::Defaults::default().timeout_seconds),
            environment: HashMap::new(),
        }
    }
}

/// Why a target could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The key is not in the registry table.
    #[error("unknown agent '{key}'. Valid agents: {}", format_keys(.valid))]
    UnknownAgent {
        /// The key that was asked for.
        key: String,
        /// Every key in the table, sorted.
        valid: Vec<String>,
    },

    /// No search root contains the module.
    #[error("agent module '{module}' not found (searched: {})", .searched.join(", "))]
    HandlerLoad {
        /// The module that could not be found.
        module: String,
        /// Labels of the roots searched, in order.
        searched: Vec<String>,
    },
}

fn format_keys(keys: &[String]) -> String {
    if keys.is_empty() {
        "(none)".to_string()
    } else {
        keys.join(", ")
    }
}

/// A target resolved to a module.
#[derive(Debug, Clone)]
pub struct ResolvedHandler {
    /// The agent key that was resolved.
    pub agent_key: String,
    /// The module found for it.
    pub module: LoadedModule,
}

/// Resolves agent keys to modules.
///
/// Implemented by [`Registry`]; the dispatcher is generic over it so tests
/// can substitute their own resolvers.
pub trait Resolve: Send + Sync {
    /// Resolve `agent_key` to a module.
    fn resolve(&self, agent_key: &str) -> Result<ResolvedHandler, ResolveError>;
}

/// The fixed agent table plus its ordered module sources.
pub struct Registry {
    entries: BTreeMap<String, RegistryEntry>,
    sources: Vec<Box<dyn ModuleSource>>,
}

impl Registry {
    /// Build a registry from entries and an ordered list of sources.
    pub fn new(
        entries: impl IntoIterator<Item = RegistryEntry>,
        sources: Vec<Box<dyn ModuleSource>>,
    ) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.agent_key.clone(), entry))
            .collect();
        Self { entries, sources }
    }

    /// Build the registry described by `config`.
    ///
    /// Sources are the built-in core modules first, then the configured
    /// extensions directory.
    pub fn from_config(config: &Config, ctx: &DispatchContext) -> Self {
        let entries = config.agents.iter().map(|(key, agent)| RegistryEntry {
            agent_key: key.clone(),
            module: agent.module.clone(),
            timeout: Duration::from_secs(agent.effective_timeout(&config.defaults)),
            environment: agent.environment.clone(),
        });

        let sources: Vec<Box<dyn ModuleSource>> = vec![
            Box::new(CoreSource::builtin()),
            Box::new(ExtensionSource::new(ctx.extensions_dir(config))),
        ];

        Self::new(entries, sources)
    }

    /// Get an entry by agent key.
    pub fn get(&self, agent_key: &str) -> Option<&RegistryEntry> {
        self.entries.get(agent_key)
    }

    /// Iterate over all entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    /// All agent keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Labels of the module sources, in search order.
    pub fn search_roots(&self) -> Vec<String> {
        self.sources.iter().map(|source| source.label()).collect()
    }

    /// Find the module for `entry` in the first source that has it.
    pub fn locate(&self, entry: &RegistryEntry) -> Option<LoadedModule> {
        self.sources
            .iter()
            .find_map(|source| match source.locate(entry) {
                Lookup::Found(module) => Some(module),
                Lookup::NotFound => None,
            })
    }
}

impl Resolve for Registry {
    fn resolve(&self, agent_key: &str) -> Result<ResolvedHandler, ResolveError> {
        let entry = self
            .get(agent_key)
            .ok_or_else(|| ResolveError::UnknownAgent {
                key: agent_key.to_string(),
                valid: self.keys(),
            })?;

        let module = self
            .locate(entry)
            .ok_or_else(|| ResolveError::HandlerLoad {
                module: entry.module.clone(),
                searched: self.search_roots(),
            })?;

        Ok(ResolvedHandler {
            agent_key: entry.agent_key.clone(),
            module,
        })
    }
}
