//! StreamRegistry - process-wide token → channel table.
//!
//! # Locking
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ StreamRegistry                                           │
//! │  Mutex<HashMap<StreamToken, Arc<StreamChannel>>>         │
//! │    held for insert / lookup / remove / sweep only        │
//! └───────────────┬──────────────────────────────────────────┘
//!                 │ Arc clone handed out by lookup()
//!                 ▼
//!        StreamChannel queue (its own synchronization)
//!          producer push ──► FIFO ──► drain loop next
//! ```
//!
//! The map lock is never held across an `.await`, so payload flow on one
//! stream never blocks map access for another.

use super::channel::{Message, StreamChannel};
use super::RegistryError;
use crate::config::RegistryConfig;
use parking_lot::Mutex;
use relay_types::StreamToken;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Counter snapshot returned by [`StreamRegistry::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
    /// Streams currently registered.
    pub live: usize,
    /// Streams created since construction.
    pub created: u64,
    /// Streams dropped through [`StreamRegistry::remove`].
    pub removed: u64,
    /// Streams dropped by sweeps.
    pub reaped: u64,
}

/// The channel store.
///
/// Construct one per process and share it as `Arc<StreamRegistry>`; the
/// orchestrator, producers and drain loops all receive the handle
/// explicitly.
///
/// # Example
///
/// ```
/// use relay_runtime::registry::StreamRegistry;
/// use std::time::Duration;
///
/// let registry = StreamRegistry::new(Duration::from_secs(300), 16);
///
/// let token = registry.create();
/// assert!(registry.lookup(&token).is_some());
/// assert_eq!(registry.count(), 1);
///
/// assert!(registry.remove(&token));
/// assert!(!registry.remove(&token)); // idempotent
/// assert_eq!(registry.count(), 0);
/// ```
#[derive(Debug)]
pub struct StreamRegistry {
    streams: Mutex<HashMap<StreamToken, Arc<StreamChannel>>>,
    ttl: Duration,
    queue_capacity: usize,
    created: AtomicU64,
    removed: AtomicU64,
    reaped: AtomicU64,
}

impl StreamRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(ttl: Duration, queue_capacity: usize) -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            ttl,
            queue_capacity,
            created: AtomicU64::new(0),
            removed: AtomicU64::new(0),
            reaped: AtomicU64::new(0),
        }
    }

    /// Creates an empty registry from the `[registry]` config section.
    #[must_use]
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.ttl(), config.queue_capacity)
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mints a token and registers an empty channel under it.
    ///
    /// Expired channels are swept first. Never fails: in the
    /// vanishingly unlikely case of a UUID collision a new token is drawn.
    pub fn create(&self) -> StreamToken {
        self.sweep();

        let token = {
            let mut streams = self.streams.lock();
            let token = loop {
                let candidate = StreamToken::new();
                if !streams.contains_key(&candidate) {
                    break candidate;
                }
            };
            streams.insert(
                token,
                Arc::new(StreamChannel::new(token, self.queue_capacity)),
            );
            token
        };

        self.created.fetch_add(1, Ordering::Relaxed);
        debug!(token = %token.short(), "Registered stream");
        token
    }

    /// Returns the channel registered under `token`.
    ///
    /// Absence is an expected outcome, not an error: the invocation may
    /// have completed or the channel may have expired.
    #[must_use]
    pub fn lookup(&self, token: &StreamToken) -> Option<Arc<StreamChannel>> {
        self.streams.lock().get(token).cloned()
    }

    /// Returns `true` if a channel is registered under `token`.
    #[must_use]
    pub fn contains(&self, token: &StreamToken) -> bool {
        self.streams.lock().contains_key(token)
    }

    /// Unregisters `token`.
    ///
    /// Returns `true` if a channel was removed. Calling it again, or for a
    /// token that was swept, is a no-op.
    pub fn remove(&self, token: &StreamToken) -> bool {
        let removed = self.streams.lock().remove(token);
        match removed {
            Some(channel) => {
                channel.evict();
                self.removed.fetch_add(1, Ordering::Relaxed);
                debug!(token = %token.short(), "Unregistered stream");
                true
            }
            None => false,
        }
    }

    /// Number of live channels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.streams.lock().len()
    }

    /// Evicts every channel older than the TTL.
    ///
    /// Returns the number of channels reaped.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let (expired, live) = {
            let mut streams = self.streams.lock();
            let stale: Vec<StreamToken> = streams
                .iter()
                .filter(|(_, channel)| now.duration_since(channel.created_at()) > self.ttl)
                .map(|(token, _)| *token)
                .collect();
            let expired: Vec<Arc<StreamChannel>> = stale
                .iter()
                .filter_map(|token| streams.remove(token))
                .collect();
            (expired, streams.len())
        };

        if expired.is_empty() {
            return 0;
        }

        for channel in &expired {
            channel.evict();
            debug!(
                token = %channel.token().short(),
                age_secs = channel.age().as_secs(),
                "Reaped expired stream"
            );
        }

        let reaped = expired.len();
        self.reaped.fetch_add(reaped as u64, Ordering::Relaxed);
        warn!(
            reaped,
            live,
            ttl_secs = self.ttl.as_secs(),
            "Swept expired streams"
        );
        reaped
    }

    /// Resolves `token` and enqueues `message` within `timeout`.
    ///
    /// The map lock is released before the write is awaited.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] if the token is not registered, plus any
    /// error from [`StreamChannel::push`].
    pub async fn send(
        &self,
        token: &StreamToken,
        message: Message,
        timeout: Duration,
    ) -> Result<(), RegistryError> {
        let channel = self
            .lookup(token)
            .ok_or(RegistryError::NotFound(*token))?;
        channel.push(message, timeout).await
    }

    /// Returns a snapshot of the registry counters.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            live: self.count(),
            created: self.created.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
            reaped: self.reaped.load(Ordering::Relaxed),
        }
    }
}
