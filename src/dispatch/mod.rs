//! Card dispatch: validate, resolve, check, invoke, log.
//!
//! A single dispatch moves through
//! `RECEIVED → VALIDATED → RESOLVED → INTERFACE_CHECKED → INVOKED → {SUCCEEDED | FAILED}`.
//! Any failure before invocation short-circuits to `FAILED`. A handler that
//! errors or panics is contained and reported as a `handler_error` result,
//! so one bad agent never takes the dispatcher down with it.
//!
//! There are no retries and no result caching: each call is one complete
//! attempt.


use crate::error::CardError;
use crate::events::{DispatchLog, LogEntry};
use crate::handler::HandlerError;
use crate::payload::{self, Payload, ValidationError};
use crate::registry::{ModuleOrigin, Resolve, ResolveError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// Final status of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// The handler returned a result.
    Success,
    /// The payload was not valid JSON.
    ValidationError,
    /// The target did not resolve to a conforming handler.
    ResolutionError,
    /// The handler failed while processing the card.
    HandlerError,
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchStatus::Success => write!(f, "success"),
            DispatchStatus::ValidationError => write!(f, "validation_error"),
            DispatchStatus::ResolutionError => write!(f, "resolution_error"),
            DispatchStatus::HandlerError => write!(f, "handler_error"),
        }
    }
}

/// Why a dispatch failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The payload failed to parse.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The target key is unknown or its module is missing.
    #[error(transparent)]
    Resolution(#[from] ResolveError),

    /// The module was found but has no `handle_card` entry point.
    #[error("agent module '{module}' ({origin}) is missing 'handle_card(payload)'")]
    HandlerInterface {
        /// The non-conforming module.
        module: String,
        /// Where it was found.
        origin: ModuleOrigin,
    },

    /// The handler failed while processing the card.
    #[error("agent '@{target}' failed to process card: {source}")]
    HandlerRuntime {
        /// The agent key that was dispatched to.
        target: String,
        /// The handler's failure.
        source: HandlerError,
    },
}

impl DispatchError {
    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Validation(_) => "validation_error",
            DispatchError::Resolution(ResolveError::UnknownAgent { .. }) => "unknown_agent_error",
            DispatchError::Resolution(ResolveError::HandlerLoad { .. }) => "handler_load_error",
            DispatchError::HandlerInterface { .. } => "handler_interface_error",
            DispatchError::HandlerRuntime { .. } => "handler_runtime_error",
        }
    }

    /// The dispatch status this error produces.
    pub fn status(&self) -> DispatchStatus {
        match self {
            DispatchError::Validation(_) => DispatchStatus::ValidationError,
            DispatchError::Resolution(_) | DispatchError::HandlerInterface { .. } => {
                DispatchStatus::ResolutionError
            }
            DispatchError::HandlerRuntime { .. } => DispatchStatus::HandlerError,
        }
    }
}

impl From<DispatchError> for CardError {
    fn from(err: DispatchError) -> Self {
        let message = err.to_string();
        match err.status() {
            DispatchStatus::ValidationError => CardError::ValidationError(message),
            DispatchStatus::ResolutionError => CardError::ResolutionError(message),
            // Success never carries an error.
            DispatchStatus::HandlerError | DispatchStatus::Success => {
                CardError::HandlerError(message)
            }
        }
    }
}

/// Outcome of one dispatch, owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    /// The target agent key.
    pub target: String,
    /// The handler's return value, or why there isn't one.
    pub outcome: Result<Value, DispatchError>,
}

impl DispatchResult {
    /// Final status of the dispatch.
    pub fn status(&self) -> DispatchStatus {
        match &self.outcome {
            Ok(_) => DispatchStatus::Success,
            Err(err) => err.status(),
        }
    }

    /// Whether the handler returned a result.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The handler's return value on success, or a `{kind, message}` object.
    pub fn detail(&self) -> Value {
        match &self.outcome {
            Ok(value) => value.clone(),
            Err(err) => json!({
                "kind": err.kind(),
                "message": err.to_string(),
            }),
        }
    }

    /// The full result as a JSON object.
    pub fn to_json(&self) -> Value {
        json!({
            "status": self.status(),
            "target": self.target,
            "detail": self.detail(),
        })
    }

    /// Convert into the CLI error type, keeping the success value.
    pub fn into_result(self) -> crate::error::Result<Value> {
        self.outcome.map_err(CardError::from)
    }
}

/// Dispatches cards through a resolver, recording every attempt in a log.
pub struct Dispatcher<'a, R: Resolve + ?Sized> {
    resolver: &'a R,
    log: &'a dyn DispatchLog,
}

impl<'a, R: Resolve + ?Sized> Dispatcher<'a, R> {
    /// Create a dispatcher over `resolver`, logging to `log`.
    pub fn new(resolver: &'a R, log: &'a dyn DispatchLog) -> Self {
        Self { resolver, log }
    }

    /// Dispatch raw payload text to `target`.
    pub fn dispatch(&self, target: &str, raw_payload: &str) -> DispatchResult {
        let outcome = payload::validate(raw_payload)
            .map_err(DispatchError::from)
            .and_then(|payload| self.resolve_and_invoke(target, &payload));

        self.finish(target, outcome)
    }

    fn resolve_and_invoke(
        &self,
        target: &str,
        payload: &Payload,
    ) -> Result<(Value, ModuleOrigin), DispatchError> {
        let resolved = self.resolver.resolve(target)?;
        let module = resolved.module;

        let handler = module
            .entry_point()
            .ok_or_else(|| DispatchError::HandlerInterface {
                module: module.name.clone(),
                origin: module.origin,
            })?;

        let invoked = panic::catch_unwind(AssertUnwindSafe(|| handler.handle_card(payload)));

        let value = match invoked {
            Ok(Ok(value)) => value,
            Ok(Err(source)) => {
                return Err(DispatchError::HandlerRuntime {
                    target: target.to_string(),
                    source,
                });
            }
            Err(panic_payload) => {
                return Err(DispatchError::HandlerRuntime {
                    target: target.to_string(),
                    source: HandlerError::new(format!(
                        "handler panicked: {}",
                        panic_message(&*panic_payload)
                    )),
                });
            }
        };

        Ok((value, module.origin))
    }

    fn finish(
        &self,
        target: &str,
        outcome: Result<(Value, ModuleOrigin), DispatchError>,
    ) -> DispatchResult {
        let entry = match &outcome {
            Ok((_, origin)) => {
                LogEntry::new(target, DispatchStatus::Success).with_note(origin.to_string())
            }
            Err(err) => LogEntry::new(target, err.status()).with_note(err.kind()),
        };

        if let Err(e) = self.log.append(&entry) {
            eprintln!("Warning: failed to log dispatch of '{}': {}", target, e);
        }

        DispatchResult {
            target: target.to_string(),
            outcome: outcome.map(|(value, _)| value),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
