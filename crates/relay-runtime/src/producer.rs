//! Producer-side session adapter.
//!
//! The producing computation never sees the registry's channel directly.
//! It gets a [`StreamProducer`] bound to a token and writes through it;
//! every write re-resolves the token, so a channel that was removed or
//! swept in the meantime turns the write into a logged no-op instead of
//! a dangling reference.
//!
//! # Best-effort delivery
//!
//! | Registry result | Log level | [`Delivery`] |
//! |-----------------|-----------|--------------|
//! | `Ok` | trace | `Delivered` |
//! | `NotFound` / `Sealed` / `Closed` | warn | `Dropped(..)` |
//! | `WriteTimeout` | error | `Dropped(..)` |
//!
//! Nothing here returns an error to the caller. The producing
//! computation keeps running and returns its final text regardless.

use crate::registry::{Message, RegistryError, StreamRegistry};
use relay_types::{ErrorCode, ParseTokenError, StreamToken};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, trace, warn};

/// State key under which the stream token travels.
pub const STREAM_TOKEN_KEY: &str = "streaming_token";

/// String-typed state handed to a producing computation.
///
/// Mirrors the session state an agent framework carries between tool
/// calls. The stream token is stored as text and parsed back on use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationState(HashMap<String, String>);

impl InvocationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns state carrying `token` under [`STREAM_TOKEN_KEY`].
    #[must_use]
    pub fn with_stream(token: StreamToken) -> Self {
        let mut state = Self::new();
        state.set_stream(token);
        state
    }

    pub fn set_stream(&mut self, token: StreamToken) {
        self.0.insert(STREAM_TOKEN_KEY.to_string(), token.to_string());
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Parses the stream token out of the state.
    ///
    /// # Errors
    ///
    /// [`BindError::Missing`] if the key is absent, [`BindError::Malformed`]
    /// if it holds something other than a token.
    pub fn stream_token(&self) -> Result<StreamToken, BindError> {
        let raw = self.get(STREAM_TOKEN_KEY).ok_or(BindError::Missing)?;
        raw.parse().map_err(BindError::Malformed)
    }
}

/// The producing computation could not find its stream token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("no stream token in invocation state")]
    Missing,

    #[error(transparent)]
    Malformed(#[from] ParseTokenError),
}

impl ErrorCode for BindError {
    fn code(&self) -> &'static str {
        match self {
            Self::Missing => "PRODUCER_TOKEN_MISSING",
            Self::Malformed(_) => "PRODUCER_TOKEN_MALFORMED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Outcome of one best-effort write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The write was logged and discarded.
    Dropped(RegistryError),
}

impl Delivery {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Write handle bound to one stream.
#[derive(Debug, Clone)]
pub struct StreamProducer {
    registry: Arc<StreamRegistry>,
    token: StreamToken,
    write_timeout: Duration,
}

impl StreamProducer {
    #[must_use]
    pub fn new(registry: Arc<StreamRegistry>, token: StreamToken, write_timeout: Duration) -> Self {
        Self {
            registry,
            token,
            write_timeout,
        }
    }

    /// Binds to the token carried in `state`.
    ///
    /// # Errors
    ///
    /// See [`InvocationState::stream_token`].
    pub fn from_state(
        registry: Arc<StreamRegistry>,
        state: &InvocationState,
        write_timeout: Duration,
    ) -> Result<Self, BindError> {
        let token = state.stream_token()?;
        Ok(Self::new(registry, token, write_timeout))
    }

    #[must_use]
    pub fn token(&self) -> StreamToken {
        self.token
    }

    /// Returns `true` while the stream is still registered.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.registry.contains(&self.token)
    }

    /// Enqueues one payload.
    pub async fn send(&self, text: impl Into<String>) -> Delivery {
        self.deliver(Message::payload(text)).await
    }

    /// Enqueues the end-of-stream marker.
    ///
    /// Call exactly once, after the last payload.
    pub async fn finish(&self) -> Delivery {
        self.deliver(Message::EndOfStream).await
    }

    async fn deliver(&self, message: Message) -> Delivery {
        let is_end = message.is_end();
        match self
            .registry
            .send(&self.token, message, self.write_timeout)
            .await
        {
            Ok(()) => {
                trace!(token = %self.token.short(), end = is_end, "Delivered");
                Delivery::Delivered
            }
            Err(err) => {
                match &err {
                    RegistryError::WriteTimeout { timeout, .. } => error!(
                        token = %self.token.short(),
                        timeout = ?timeout,
                        end = is_end,
                        "Stream write timed out, dropping"
                    ),
                    _ => warn!(
                        token = %self.token.short(),
                        code = err.code(),
                        end = is_end,
                        "Stream unavailable, dropping"
                    ),
                }
                Delivery::Dropped(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_types::assert_error_codes;

    const WRITE: Duration = Duration::from_millis(50);

    fn registry() -> Arc<StreamRegistry> {
        Arc::new(StreamRegistry::new(Duration::from_secs(300), 4))
    }

    #[tokio::test]
    async fn send_and_finish_deliver_in_order() {
        let registry = registry();
        let token = registry.create();
        let producer = StreamProducer::new(Arc::clone(&registry), token, WRITE);

        assert!(producer.send("Digit 1 is 1").await.is_delivered());
        assert!(producer.send("Digit 2 is 2").await.is_delivered());
        assert!(producer.finish().await.is_delivered());

        let channel = registry.lookup(&token).unwrap();
        assert_eq!(channel.next().await, Some(Message::payload("Digit 1 is 1")));
        assert_eq!(channel.next().await, Some(Message::payload("Digit 2 is 2")));
        assert_eq!(channel.next().await, Some(Message::EndOfStream));
    }

    #[tokio::test]
    async fn send_to_removed_stream_is_dropped() {
        let registry = registry();
        let token = registry.create();
        let producer = StreamProducer::new(Arc::clone(&registry), token, WRITE);
        registry.remove(&token);

        assert!(!producer.is_attached());
        assert_eq!(
            producer.send("late").await,
            Delivery::Dropped(RegistryError::NotFound(token))
        );
        assert_eq!(
            producer.finish().await,
            Delivery::Dropped(RegistryError::NotFound(token))
        );
    }

    #[tokio::test]
    async fn send_after_finish_is_dropped() {
        let registry = registry();
        let token = registry.create();
        let producer = StreamProducer::new(Arc::clone(&registry), token, WRITE);

        producer.finish().await;
        assert_eq!(
            producer.send("after").await,
            Delivery::Dropped(RegistryError::Sealed(token))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn full_queue_is_dropped_after_timeout() {
        let registry = Arc::new(StreamRegistry::new(Duration::from_secs(300), 1));
        let token = registry.create();
        let producer = StreamProducer::new(Arc::clone(&registry), token, WRITE);

        assert!(producer.send("fills").await.is_delivered());
        let delivery = producer.send("blocked").await;

        assert_eq!(
            delivery,
            Delivery::Dropped(RegistryError::WriteTimeout {
                token,
                timeout: WRITE
            })
        );
        // The stream is still usable once drained.
        assert!(producer.is_attached());
    }

    #[tokio::test]
    async fn from_state_binds_token() {
        let registry = registry();
        let token = registry.create();
        let state = InvocationState::with_stream(token);

        let producer = StreamProducer::from_state(Arc::clone(&registry), &state, WRITE).unwrap();
        assert_eq!(producer.token(), token);
    }

    #[test]
    fn from_state_missing_token() {
        let err = StreamProducer::from_state(registry(), &InvocationState::new(), WRITE)
            .unwrap_err();
        assert_eq!(err, BindError::Missing);
    }

    #[test]
    fn from_state_malformed_token() {
        let mut state = InvocationState::new();
        state.insert(STREAM_TOKEN_KEY, "not-a-token");

        let err = StreamProducer::from_state(registry(), &state, WRITE).unwrap_err();
        assert!(matches!(err, BindError::Malformed(_)));
    }

    #[test]
    fn state_roundtrips_as_flat_json_object() {
        let token = StreamToken::new();
        let state = InvocationState::with_stream(token);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json[STREAM_TOKEN_KEY], token.to_string());

        let back: InvocationState = serde_json::from_value(json).unwrap();
        assert_eq!(back.stream_token().unwrap(), token);
    }

    #[test]
    fn bind_error_codes() {
        let malformed = "x".parse::<StreamToken>().unwrap_err();
        assert_error_codes(
            &[BindError::Missing, BindError::Malformed(malformed)],
            "PRODUCER_",
        );
    }
}
