//! Exit code constants for the cardsend CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, unreadable config or payload file)
//! - 2: Payload validation failure
//! - 3: Resolution failure (unknown agent, missing module, missing entry point)
//! - 4: Handler failure (handler error, panic or timeout)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or I/O failure.
pub const USER_ERROR: i32 = 1;

/// The payload is not well-formed JSON.
pub const VALIDATION_FAILURE: i32 = 2;

/// The target could not be resolved to a conforming handler.
pub const RESOLUTION_FAILURE: i32 = 3;

/// The handler ran and failed.
pub const HANDLER_FAILURE: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            VALIDATION_FAILURE,
            RESOLUTION_FAILURE,
            HANDLER_FAILURE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn failure_codes_are_non_zero() {
        for code in [
            USER_ERROR,
            VALIDATION_FAILURE,
            RESOLUTION_FAILURE,
            HANDLER_FAILURE,
        ] {
            assert_ne!(code, SUCCESS);
        }
    }
}
