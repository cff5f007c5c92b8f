//! The handler contract every agent satisfies.
//!
//! An agent receives the parsed card payload and returns a JSON result or a
//! [`HandlerError`]. The dispatcher knows nothing else about what an agent
//! does, so adding an agent never requires touching the dispatcher.
//!
//! Two kinds of handler exist:
//!
//! - **Core** handlers compiled into the binary (see [`core_modules`])
//! - **Extension** handlers run as executables via [`ProcessHandler`]

mod process;

pub use process::ProcessHandler;

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a handler while processing a card.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Create a handler error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The handler's description of what went wrong.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The `handle_card(payload)` entry point.
pub trait CardHandler: Send + Sync {
    /// Process one card payload.
    fn handle_card(&self, payload: &Value) -> Result<Value, HandlerError>;
}

impl<F> CardHandler for F
where
    F: Fn(&Value) -> Result<Value, HandlerError> + Send + Sync,
{
    fn handle_card(&self, payload: &Value) -> Result<Value, HandlerError> {
        self(payload)
    }
}

/// Returns the payload unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Echo;

impl CardHandler for Echo {
    fn handle_card(&self, payload: &Value) -> Result<Value, HandlerError> {
        Ok(payload.clone())
    }
}

/// Modules compiled into the binary, keyed by module name.
pub fn core_modules() -> BTreeMap<String, Arc<dyn CardHandler>> {
    let mut modules: BTreeMap<String, Arc<dyn CardHandler>> = BTreeMap::new();
    modules.insert("echo".to_string(), Arc::new(Echo));
    modules
}
