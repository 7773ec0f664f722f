//! Downstream sinks fed by the drain loop.
//!
//! A [`Sink`] accepts one payload at a time, in order. It may be slow; the
//! drain loop awaits each call before reading the next payload, so the
//! forwarding order always equals the enqueue order.

use async_trait::async_trait;
use relay_types::ErrorCode;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Failure to forward a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The sink refused the payload.
    #[error("sink rejected payload: {0}")]
    Rejected(String),

    /// The downstream consumer is gone.
    #[error("sink closed")]
    Closed,
}

impl SinkError {
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

impl ErrorCode for SinkError {
    fn code(&self) -> &'static str {
        match self {
            Self::Rejected(_) => "SINK_REJECTED",
            Self::Closed => "SINK_CLOSED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Destination for drained payloads.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Forwards one payload.
    ///
    /// # Errors
    ///
    /// Any error ends the drain loop. It is not retried.
    async fn accept(&self, payload: &str) -> Result<(), SinkError>;
}

#[async_trait]
impl<S: Sink + ?Sized> Sink for Arc<S> {
    async fn accept(&self, payload: &str) -> Result<(), SinkError> {
        (**self).accept(payload).await
    }
}

/// Forwards payloads into an mpsc queue, e.g. a speech pipeline.
///
/// Waits for queue space, so a slow consumer applies backpressure to the
/// drain loop rather than dropping text.
#[derive(Debug, Clone)]
pub struct QueueSink {
    tx: mpsc::Sender<String>,
}

impl QueueSink {
    #[must_use]
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Sink for QueueSink {
    async fn accept(&self, payload: &str) -> Result<(), SinkError> {
        self.tx
            .send(payload.to_string())
            .await
            .map_err(|_| SinkError::Closed)
    }
}

/// Adapts a synchronous closure into a [`Sink`].
pub struct FnSink<F> {
    f: F,
}

impl<F> FnSink<F>
where
    F: Fn(&str) -> Result<(), SinkError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> std::fmt::Debug for FnSink<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSink").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> Sink for FnSink<F>
where
    F: Fn(&str) -> Result<(), SinkError> + Send + Sync,
{
    async fn accept(&self, payload: &str) -> Result<(), SinkError> {
        (self.f)(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use relay_types::assert_error_codes;

    #[tokio::test]
    async fn queue_sink_forwards() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = QueueSink::new(tx);

        sink.accept("hello").await.unwrap();
        sink.accept("world").await.unwrap();

        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
        assert_eq!(rx.recv().await.as_deref(), Some("world"));
    }

    #[tokio::test]
    async fn queue_sink_closed_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let err = QueueSink::new(tx).accept("lost").await.unwrap_err();
        assert_eq!(err, SinkError::Closed);
    }

    #[tokio::test]
    async fn fn_sink_and_arc_dyn() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in = Arc::clone(&seen);
        let sink: Arc<dyn Sink> = Arc::new(FnSink::new(move |p: &str| {
            seen_in.lock().push(p.to_string());
            Ok(())
        }));

        sink.accept("a").await.unwrap();
        Arc::clone(&sink).accept("b").await.unwrap();

        assert_eq!(*seen.lock(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn error_codes() {
        assert_error_codes(&[SinkError::rejected("no"), SinkError::Closed], "SINK_");
    }
}
