//! Drain loop failures.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`DrainFailure::NotFound`] | `DRAIN_NOT_FOUND` | No |
//! | [`DrainFailure::Evicted`] | `DRAIN_EVICTED` | No |
//! | [`DrainFailure::IdleTimeout`] | `DRAIN_IDLE_TIMEOUT` | Yes |
//! | [`DrainFailure::Disconnected`] | `DRAIN_DISCONNECTED` | No |
//! | [`DrainFailure::Abandoned`] | `DRAIN_ABANDONED` | No |
//! | [`DrainFailure::Sink`] | `DRAIN_SINK` | No |
//! | [`DrainFailure::Cancelled`] | `DRAIN_CANCELLED` | No |
//! | [`DrainFailure::Crashed`] | `DRAIN_CRASHED` | No |
//!
//! An idle timeout is a stall: the producer may still finish and its
//! final text is still returned, just with partial speech.

use crate::sink::SinkError;
use relay_types::ErrorCode;
use std::time::Duration;
use thiserror::Error;

/// Reason a drain loop ended in the `Failed` state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrainFailure {
    /// The stream was not registered when the loop started.
    #[error("stream not registered")]
    NotFound,

    /// The stream was removed or swept before its end marker arrived.
    #[error("stream evicted before end of stream")]
    Evicted,

    /// Nothing arrived within the idle window.
    #[error("no payload within {0:?}")]
    IdleTimeout(Duration),

    /// Every sender went away without an end marker.
    #[error("stream disconnected without end marker")]
    Disconnected,

    /// The producer finished without an end marker and the queue is empty.
    #[error("producer ended without end marker")]
    Abandoned,

    /// The sink refused a payload.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The invocation was torn down externally.
    #[error("drain cancelled")]
    Cancelled,

    /// The drain task panicked or was aborted.
    #[error("drain task crashed: {0}")]
    Crashed(String),
}

impl ErrorCode for DrainFailure {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "DRAIN_NOT_FOUND",
            Self::Evicted => "DRAIN_EVICTED",
            Self::IdleTimeout(_) => "DRAIN_IDLE_TIMEOUT",
            Self::Disconnected => "DRAIN_DISCONNECTED",
            Self::Abandoned => "DRAIN_ABANDONED",
            Self::Sink(_) => "DRAIN_SINK",
            Self::Cancelled => "DRAIN_CANCELLED",
            Self::Crashed(_) => "DRAIN_CRASHED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::IdleTimeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_types::assert_error_codes;

    #[test]
    fn all_error_codes_valid() {
        let errors = vec![
            DrainFailure::NotFound,
            DrainFailure::Evicted,
            DrainFailure::IdleTimeout(Duration::from_secs(30)),
            DrainFailure::Disconnected,
            DrainFailure::Abandoned,
            DrainFailure::Sink(SinkError::Closed),
            DrainFailure::Cancelled,
            DrainFailure::Crashed("boom".into()),
        ];
        assert_error_codes(&errors, "DRAIN_");
    }

    #[test]
    fn sink_error_converts() {
        let failure: DrainFailure = SinkError::rejected("tts offline").into();
        assert_eq!(failure.to_string(), "sink rejected payload: tts offline");
        assert!(!failure.is_recoverable());
    }
}
