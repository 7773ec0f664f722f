//! Registry layer errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`RegistryError::NotFound`] | `REGISTRY_NOT_FOUND` | No |
//! | [`RegistryError::Sealed`] | `REGISTRY_SEALED` | No |
//! | [`RegistryError::WriteTimeout`] | `REGISTRY_WRITE_TIMEOUT` | Yes |
//! | [`RegistryError::Closed`] | `REGISTRY_CLOSED` | No |

use relay_types::{ErrorCode, StreamToken};
use std::time::Duration;
use thiserror::Error;

/// Failure of a single registry operation.
///
/// None of these are fatal to the process. Producers log and swallow
/// them; the drain loop turns the relevant ones into a `Failed` outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No stream is registered under the token.
    ///
    /// Expected when the invocation already finished or the stream
    /// was swept.
    #[error("stream {0} not found")]
    NotFound(StreamToken),

    /// The stream already carries its end-of-stream marker.
    #[error("stream {0} is sealed")]
    Sealed(StreamToken),

    /// The bounded enqueue did not complete in time.
    #[error("write to stream {token} timed out after {timeout:?}")]
    WriteTimeout {
        token: StreamToken,
        timeout: Duration,
    },

    /// The consuming half of the queue is gone.
    #[error("stream {0} is closed")]
    Closed(StreamToken),
}

impl RegistryError {
    /// Returns the token the failed operation targeted.
    #[must_use]
    pub fn token(&self) -> StreamToken {
        match self {
            Self::NotFound(token) | Self::Sealed(token) | Self::Closed(token) => *token,
            Self::WriteTimeout { token, .. } => *token,
        }
    }
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "REGISTRY_NOT_FOUND",
            Self::Sealed(_) => "REGISTRY_SEALED",
            Self::WriteTimeout { .. } => "REGISTRY_WRITE_TIMEOUT",
            Self::Closed(_) => "REGISTRY_CLOSED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::WriteTimeout { .. })
    }
}
