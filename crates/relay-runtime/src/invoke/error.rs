//! Invocation errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`InvokeError::Timeout`] | `INVOKE_TIMEOUT` | Yes |
//! | [`InvokeError::Cancelled`] | `INVOKE_CANCELLED` | No |
//! | [`InvokeError::Producer`] | `INVOKE_PRODUCER` | No |
//! | [`InvokeError::Panicked`] | `INVOKE_PANICKED` | No |
//!
//! A failed drain is not an invocation error; it shows up as a partial
//! [`InvokeReport`](super::InvokeReport).

use relay_types::ErrorCode;
use std::time::Duration;
use thiserror::Error;

/// Why an invocation produced no final text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// Producer and drain did not both finish within the overall deadline.
    #[error("invocation timed out after {0:?}")]
    Timeout(Duration),

    #[error("invocation cancelled")]
    Cancelled,

    /// The producing computation returned an error.
    #[error("producer failed: {0}")]
    Producer(String),

    /// The producing computation panicked.
    #[error("producer panicked")]
    Panicked,
}

impl InvokeError {
    /// Text handed back to the caller in place of the producer's reply.
    ///
    /// # Example
    ///
    /// ```
    /// use relay_runtime::invoke::InvokeError;
    /// use std::time::Duration;
    ///
    /// let err = InvokeError::Timeout(Duration::from_secs(60));
    /// assert_eq!(err.reply_text(), "Error: Streaming timeout");
    /// ```
    #[must_use]
    pub fn reply_text(&self) -> String {
        match self {
            Self::Timeout(_) => "Error: Streaming timeout".to_string(),
            Self::Cancelled => "Error: Streaming cancelled".to_string(),
            Self::Producer(msg) => format!("Error: {msg}"),
            Self::Panicked => "Error: Streaming tool crashed".to_string(),
        }
    }
}

impl ErrorCode for InvokeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "INVOKE_TIMEOUT",
            Self::Cancelled => "INVOKE_CANCELLED",
            Self::Producer(_) => "INVOKE_PRODUCER",
            Self::Panicked => "INVOKE_PANICKED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
