//! Machine-readable error codes.
//!
//! Every error enum in the workspace implements [`ErrorCode`], so log lines
//! and replies can carry a stable code alongside the human message.
//!
//! # Example
//!
//! ```
//! use relay_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum QueueError {
//!     Full,
//!     Gone,
//! }
//!
//! impl ErrorCode for QueueError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Full => "QUEUE_FULL",
//!             Self::Gone => "QUEUE_GONE",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Full)
//!     }
//! }
//!
//! assert_eq!(QueueError::Full.code(), "QUEUE_FULL");
//! assert!(!QueueError::Gone.is_recoverable());
//! ```

/// Stable error code interface.
///
/// # Code Format
///
/// - UPPER_SNAKE_CASE
/// - Prefixed by the layer that raises it (`REGISTRY_`, `DRAIN_`, `SINK_`, `INVOKE_`)
/// - Part of the API: a code never changes meaning once published
///
/// # Recoverability
///
/// Recoverable errors are transient: a later attempt on a fresh stream may
/// succeed (timeouts, a full queue). Non-recoverable errors mean the stream
/// itself is gone or was misused.
pub trait ErrorCode {
    /// Returns the machine-readable code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying on a fresh stream may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error code is non-empty, carries `expected_prefix`
/// and is UPPER_SNAKE_CASE.
///
/// # Panics
///
/// Panics with a descriptive message when any check fails.
///
/// ```
/// use relay_types::{assert_error_code, ErrorCode};
///
/// struct Stalled;
///
/// impl ErrorCode for Stalled {
///     fn code(&self) -> &'static str { "DRAIN_STALLED" }
///     fn is_recoverable(&self) -> bool { true }
/// }
///
/// assert_error_code(&Stalled, "DRAIN_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "error code '{code}' must start with prefix '{expected_prefix}'"
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

/// Runs [`assert_error_code`] over every supplied variant.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('_')
        && !s.ends_with('_')
        && !s.contains("__")
        && s
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
