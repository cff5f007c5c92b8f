//! Error types for the cardsend CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for cardsend operations.
///
/// Each variant maps to a specific exit code. Dispatch failures are first
/// captured as a `DispatchResult` and only turned into a `CardError` at the
/// command boundary.
#[derive(Error, Debug)]
pub enum CardError {
    /// User provided invalid arguments or the environment is unusable.
    #[error("{0}")]
    UserError(String),

    /// The card payload is not valid JSON.
    #[error("{0}")]
    ValidationError(String),

    /// The target could not be turned into a conforming handler.
    #[error("{0}")]
    ResolutionError(String),

    /// The handler was invoked and failed.
    #[error("{0}")]
    HandlerError(String),
}

impl CardError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CardError::UserError(_) => exit_codes::USER_ERROR,
            CardError::ValidationError(_) => exit_codes::VALIDATION_FAILURE,
            CardError::ResolutionError(_) => exit_codes::RESOLUTION_FAILURE,
            CardError::HandlerError(_) => exit_codes::HANDLER_FAILURE,
        }
    }
}

/// Result type alias for cardsend operations.
pub type Result<T> = std::result::Result<T, CardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_has_correct_exit_code() {
        let err = CardError::UserError("bad argument".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn validation_error_has_correct_exit_code() {
        let err = CardError::ValidationError("invalid JSON payload".to_string());
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_FAILURE);
    }

    #[test]
    fn resolution_error_has_correct_exit_code() {
        let err = CardError::ResolutionError("unknown agent".to_string());
        assert_eq!(err.exit_code(), exit_codes::RESOLUTION_FAILURE);
    }

    #[test]
    fn handler_error_has_correct_exit_code() {
        let err = CardError::HandlerError("agent crashed".to_string());
        assert_eq!(err.exit_code(), exit_codes::HANDLER_FAILURE);
    }

    #[test]
    fn error_messages_pass_through() {
        let err = CardError::ResolutionError("unknown agent 'x'".to_string());
        assert_eq!(err.to_string(), "unknown agent 'x'");
    }
}
