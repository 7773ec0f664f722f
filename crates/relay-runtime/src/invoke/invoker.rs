//! Invoker - runs one producing computation against one sink.

use super::InvokeError;
use crate::config::TimeoutsConfig;
use crate::drain::{DrainFailure, DrainLoop, DrainReport};
use crate::registry::StreamRegistry;
use crate::sink::Sink;
use relay_types::StreamToken;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{AbortHandle, JoinError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The three independent time bounds of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeSettings {
    /// Per-write bound for producers built against this invoker.
    pub write_timeout: Duration,
    /// Per-receive bound of the drain loop.
    pub idle_timeout: Duration,
    /// Bound on producer and drain together.
    pub invoke_timeout: Duration,
}

impl InvokeSettings {
    #[must_use]
    pub fn from_config(config: &TimeoutsConfig) -> Self {
        Self {
            write_timeout: config.write_timeout(),
            idle_timeout: config.idle_timeout(),
            invoke_timeout: config.invoke_timeout(),
        }
    }
}

impl Default for InvokeSettings {
    fn default() -> Self {
        Self::from_config(&TimeoutsConfig::default())
    }
}

/// Result of [`Invoker::invoke`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeReport {
    pub token: StreamToken,
    /// The producer's final text, or why there is none.
    pub result: Result<String, InvokeError>,
    /// Present when both tasks were joined.
    pub drain: Option<DrainReport>,
}

impl InvokeReport {
    /// Returns `true` if the producer replied but not everything was
    /// forwarded to the sink.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.result.is_ok() && self.drain.as_ref().is_some_and(|d| !d.is_done())
    }

    /// Payloads the sink accepted.
    #[must_use]
    pub fn forwarded(&self) -> usize {
        self.drain.as_ref().map_or(0, |d| d.forwarded)
    }

    /// Final text for the caller: the producer's reply or an error string.
    #[must_use]
    pub fn reply_text(&self) -> String {
        match &self.result {
            Ok(text) => text.clone(),
            Err(err) => err.reply_text(),
        }
    }
}

/// Removes the stream when dropped unless [`release`](Self::release) ran.
///
/// Covers the case where the invoke future itself is dropped mid-flight:
/// the stream is unregistered and both tasks are aborted.
#[derive(Debug)]
struct StreamGuard {
    registry: Arc<StreamRegistry>,
    token: StreamToken,
    tasks: Vec<AbortHandle>,
    armed: bool,
}

impl StreamGuard {
    fn new(registry: Arc<StreamRegistry>, token: StreamToken) -> Self {
        Self {
            registry,
            token,
            tasks: Vec::new(),
            armed: true,
        }
    }

    fn track(&mut self, task: AbortHandle) {
        self.tasks.push(task);
    }

    /// Removes the stream. Returns whether it was still registered.
    fn release(mut self) -> bool {
        self.armed = false;
        self.registry.remove(&self.token)
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for task in &self.tasks {
            task.abort();
        }
        if self.registry.remove(&self.token) {
            warn!(token = %self.token.short(), "Invocation dropped, stream removed");
        }
    }
}

/// The invocation orchestrator.
///
/// For each call it mints a token, runs a [`DrainLoop`] and the producing
/// computation as separate tasks, joins both under the overall deadline,
/// and unregisters the stream on every exit path.
///
/// # Example
///
/// ```no_run
/// use relay_runtime::invoke::{InvokeSettings, Invoker};
/// use relay_runtime::producer::StreamProducer;
/// use relay_runtime::registry::StreamRegistry;
/// use relay_runtime::sink::QueueSink;
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() {
/// let registry = Arc::new(StreamRegistry::new(Duration::from_secs(300), 64));
/// let invoker = Invoker::new(Arc::clone(&registry), InvokeSettings::default());
/// let (tx, _rx) = tokio::sync::mpsc::channel(16);
///
/// let report = invoker
///     .invoke(
///         |token| {
///             let producer = StreamProducer::new(registry, token, Duration::from_secs(1));
///             async move {
///                 producer.send("Digit 1 is 1").await;
///                 producer.finish().await;
///                 Ok::<_, String>("done".to_string())
///             }
///         },
///         Arc::new(QueueSink::new(tx)),
///         &CancellationToken::new(),
///     )
///     .await;
///
/// assert_eq!(report.reply_text(), "done");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Invoker {
    registry: Arc<StreamRegistry>,
    settings: InvokeSettings,
}

impl Invoker {
    #[must_use]
    pub fn new(registry: Arc<StreamRegistry>, settings: InvokeSettings) -> Self {
        Self { registry, settings }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn settings(&self) -> InvokeSettings {
        self.settings
    }

    /// Runs `produce` with a fresh token while a drain loop feeds `sink`.
    ///
    /// `produce` receives the token and is expected to write through a
    /// [`StreamProducer`](crate::producer::StreamProducer). The end marker
    /// only ever comes from the producer. If its task ends without one
    /// (error, early return, panic) the drain loop forwards what is queued
    /// and then fails with [`DrainFailure::Abandoned`].
    ///
    /// Cancelling `cancel` tears the invocation down like a timeout.
    pub async fn invoke<F, Fut, E>(
        &self,
        produce: F,
        sink: Arc<dyn Sink>,
        cancel: &CancellationToken,
    ) -> InvokeReport
    where
        F: FnOnce(StreamToken) -> Fut,
        Fut: Future<Output = Result<String, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let token = self.registry.create();
        let mut guard = StreamGuard::new(Arc::clone(&self.registry), token);
        debug!(token = %token.short(), "Invocation started");

        let drain_cancel = cancel.child_token();
        let producer_exited = CancellationToken::new();
        let drain = tokio::spawn(
            DrainLoop::new(
                Arc::clone(&self.registry),
                token,
                sink,
                self.settings.idle_timeout,
            )
            .with_cancel(drain_cancel.clone())
            .with_producer_exit(producer_exited.clone())
            .run(),
        );
        guard.track(drain.abort_handle());

        let fut = produce(token);
        let producer = tokio::spawn(async move { fut.await.map_err(|e| e.to_string()) });
        let producer_abort = producer.abort_handle();
        guard.track(producer.abort_handle());

        let joined = async {
            let result = match producer.await {
                Ok(Ok(text)) => Ok(text),
                Ok(Err(msg)) => Err(InvokeError::Producer(msg)),
                Err(err) => Err(producer_join_error(&err)),
            };
            producer_exited.cancel();
            let drain = match drain.await {
                Ok(report) => report,
                Err(err) => DrainReport {
                    token,
                    forwarded: 0,
                    outcome: Err(DrainFailure::Crashed(err.to_string())),
                },
            };
            (result, drain)
        };

        let deadline = self.settings.invoke_timeout;
        let (result, drain) = tokio::select! {
            biased;

            _ = cancel.cancelled() => (Err(InvokeError::Cancelled), None),
            _ = tokio::time::sleep(deadline) => (Err(InvokeError::Timeout(deadline)), None),
            (result, drain) = joined => (result, Some(drain)),
        };

        if drain.is_none() {
            drain_cancel.cancel();
            producer_abort.abort();
        }

        let removed = guard.release();
        info!(
            token = %token.short(),
            removed,
            ok = result.is_ok(),
            forwarded = drain.as_ref().map_or(0, |d| d.forwarded),
            "Invocation cleaned up"
        );

        let report = InvokeReport {
            token,
            result,
            drain,
        };
        if report.is_partial() {
            warn!(token = %token.short(), forwarded = report.forwarded(), "Partial delivery");
        }
        report
    }
}

fn producer_join_error(err: &JoinError) -> InvokeError {
    if err.is_panic() {
        InvokeError::Panicked
    } else {
        InvokeError::Cancelled
    }
}
