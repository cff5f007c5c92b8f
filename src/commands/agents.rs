//! Implementation of the `cardsend agents` commands.
//!
//! - `agents list` - show each agent key, its module and where it resolves
//! - `agents check` - fail if any agent is missing or non-conforming

use crate::context::DispatchContext;
use crate::error::{CardError, Result};
use crate::registry::{LoadedModule, Registry, RegistryEntry};

/// How one registry entry resolves right now.
#[derive(Debug, Clone)]
pub(crate) struct AgentStatus {
    pub agent_key: String,
    pub module: String,
    pub state: ModuleState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ModuleState {
    /// Found with a `handle_card` entry point.
    Ready { location: String },
    /// Found, but no entry point.
    NonConforming { location: String },
    /// Not in any search root.
    Missing,
}

impl AgentStatus {
    fn is_ok(&self) -> bool {
        matches!(self.state, ModuleState::Ready { .. })
    }

    fn describe(&self) -> String {
        match &self.state {
            ModuleState::Ready { location } => format!("ok ({})", location),
            ModuleState::NonConforming { location } => {
                format!("missing 'handle_card' entry point ({})", location)
            }
            ModuleState::Missing => "module not found".to_string(),
        }
    }
}

/// Resolve every registry entry without invoking any handler.
pub(crate) fn agent_statuses(registry: &Registry) -> Vec<AgentStatus> {
    registry.entries().map(|entry| status_of(registry, entry)).collect()
}

fn status_of(registry: &Registry, entry: &RegistryEntry) -> AgentStatus {
    let state = match registry.locate(entry) {
        Some(module) => located_state(&module),
        None => ModuleState::Missing,
    };

    AgentStatus {
        agent_key: entry.agent_key.clone(),
        module: entry.module.clone(),
        state,
    }
}

fn located_state(module: &LoadedModule) -> ModuleState {
    let location = module.location.clone();
    if module.is_conforming() {
        ModuleState::Ready { location }
    } else {
        ModuleState::NonConforming { location }
    }
}

fn load_registry(ctx: &DispatchContext, explicit_config: bool) -> Result<Registry> {
    let config = ctx.load_config(explicit_config)?;
    Ok(Registry::from_config(&config, ctx))
}

/// Execute the `cardsend agents list` command.
pub fn cmd_agents_list(ctx: &DispatchContext, explicit_config: bool) -> Result<()> {
    let registry = load_registry(ctx, explicit_config)?;
    let statuses = agent_statuses(&registry);

    println!("Configured agents ({}):", statuses.len());
    println!();
    for status in &statuses {
        println!("  {:<16} -> {:<24} {}", status.agent_key, status.module, status.describe());
    }
    println!();
    println!("Search order: {}", registry.search_roots().join(", "));

    Ok(())
}

/// Execute the `cardsend agents check` command.
pub fn cmd_agents_check(ctx: &DispatchContext, explicit_config: bool) -> Result<()> {
    let registry = load_registry(ctx, explicit_config)?;
    let statuses = agent_statuses(&registry);

    let broken: Vec<&AgentStatus> = statuses.iter().filter(|s| !s.is_ok()).collect();
    for status in &broken {
        println!("  @{}: {}: {}", status.agent_key, status.module, status.describe());
    }

    if broken.is_empty() {
        println!("All {} agents resolve to a handler.", statuses.len());
        return Ok(());
    }

    Err(CardError::ResolutionError(format!(
        "{} of {} agents do not resolve to a handler (searched: {})",
        broken.len(),
        statuses.len(),
        registry.search_roots().join(", ")
    )))
}
