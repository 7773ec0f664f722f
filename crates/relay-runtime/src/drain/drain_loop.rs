//! DrainLoop - consumer side of a stream.

use super::DrainFailure;
use crate::registry::{Message, StreamRegistry};
use crate::sink::Sink;
use relay_types::{ErrorCode, StreamToken};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// State of a [`DrainLoop`].
///
/// `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    Waiting,
    Done,
    Failed,
}

impl DrainState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Waiting)
    }
}

/// What a finished drain loop reports back to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub token: StreamToken,
    /// Payloads accepted by the sink.
    pub forwarded: usize,
    pub outcome: Result<(), DrainFailure>,
}

impl DrainReport {
    #[must_use]
    pub fn state(&self) -> DrainState {
        match self.outcome {
            Ok(()) => DrainState::Done,
            Err(_) => DrainState::Failed,
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.outcome.is_ok()
    }

    #[must_use]
    pub fn failure(&self) -> Option<&DrainFailure> {
        self.outcome.as_ref().err()
    }
}

/// Reads one stream until its end marker and forwards every payload.
///
/// The token is re-resolved through the registry on every iteration, so
/// the loop never keeps a channel alive that the registry dropped.
///
/// ```text
/// WAITING ──payload──▶ WAITING
/// WAITING ──marker───▶ DONE
/// WAITING ──timeout / error / eviction / cancel / abandoned──▶ FAILED
/// ```
///
/// Only the producer's marker ends the loop in `DONE`. Once the owner
/// signals producer exit, whatever is still queued is forwarded and an
/// empty queue without a marker fails with [`DrainFailure::Abandoned`].
pub struct DrainLoop {
    registry: Arc<StreamRegistry>,
    token: StreamToken,
    sink: Arc<dyn Sink>,
    idle_timeout: Duration,
    cancel: CancellationToken,
    producer_exited: CancellationToken,
    forwarded: usize,
}

impl std::fmt::Debug for DrainLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrainLoop")
            .field("token", &self.token)
            .field("idle_timeout", &self.idle_timeout)
            .field("forwarded", &self.forwarded)
            .finish_non_exhaustive()
    }
}

impl DrainLoop {
    #[must_use]
    pub fn new(
        registry: Arc<StreamRegistry>,
        token: StreamToken,
        sink: Arc<dyn Sink>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            token,
            sink,
            idle_timeout,
            cancel: CancellationToken::new(),
            producer_exited: CancellationToken::new(),
            forwarded: 0,
        }
    }

    /// Replaces the loop's cancel token.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token the owner cancels once the producing computation has ended.
    #[must_use]
    pub fn with_producer_exit(mut self, exited: CancellationToken) -> Self {
        self.producer_exited = exited;
        self
    }

    /// Runs the loop to a terminal state.
    pub async fn run(mut self) -> DrainReport {
        let outcome = self.drain().await;

        match &outcome {
            Ok(()) => info!(
                token = %self.token.short(),
                forwarded = self.forwarded,
                "Drain complete"
            ),
            Err(DrainFailure::Sink(err)) => error!(
                token = %self.token.short(),
                forwarded = self.forwarded,
                error = %err,
                "Sink failed, drain stopped"
            ),
            Err(failure) => warn!(
                token = %self.token.short(),
                forwarded = self.forwarded,
                code = failure.code(),
                "Drain stalled: {failure}"
            ),
        }

        DrainReport {
            token: self.token,
            forwarded: self.forwarded,
            outcome,
        }
    }

    async fn drain(&mut self) -> Result<(), DrainFailure> {
        let mut first = true;

        loop {
            let Some(channel) = self.registry.lookup(&self.token) else {
                return Err(if first {
                    DrainFailure::NotFound
                } else {
                    DrainFailure::Evicted
                });
            };
            first = false;

            let received = tokio::select! {
                biased;

                _ = self.cancel.cancelled() => return Err(DrainFailure::Cancelled),
                _ = channel.evicted() => return Err(DrainFailure::Evicted),
                received = tokio::time::timeout(self.idle_timeout, channel.next()) => Some(received),
                _ = self.producer_exited.cancelled() => None,
            };
            let message = match received {
                Some(Err(_)) => return Err(DrainFailure::IdleTimeout(self.idle_timeout)),
                Some(Ok(None)) => return Err(DrainFailure::Disconnected),
                Some(Ok(Some(message))) => message,
                // Producer is gone; only what is already queued can follow.
                None => channel.try_next().ok_or(DrainFailure::Abandoned)?,
            };
            // Release the channel before the sink runs.
            drop(channel);

            match message {
                Message::EndOfStream => {
                    debug!(token = %self.token.short(), "End of stream");
                    return Ok(());
                }
                Message::Payload(text) => {
                    tokio::select! {
                        biased;

                        _ = self.cancel.cancelled() => return Err(DrainFailure::Cancelled),
                        accepted = self.sink.accept(&text) => accepted?,
                    }
                    self.forwarded += 1;
                    trace!(token = %self.token.short(), forwarded = self.forwarded, "Forwarded");
                }
            }
        }
    }
}
