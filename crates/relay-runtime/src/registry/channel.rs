//! Per-token stream channel.
//!
//! A [`StreamChannel`] is a FIFO queue of [`Message`]s plus its creation
//! time. It is owned by the [`StreamRegistry`](super::StreamRegistry);
//! producers and consumers only ever reach it through a lookup by token.
//!
//! # Sealing
//!
//! ```text
//! ┌──────┐  Payload(..)*  ┌──────┐  EndOfStream  ┌────────┐
//! │ Open │ ─────────────► │ Open │ ────────────► │ Sealed │
//! └──────┘                └──────┘               └────────┘
//! ```
//!
//! The sender half lives in an `Option`. Enqueueing the marker takes it
//! out, so any later write finds `None` and fails with
//! [`RegistryError::Sealed`] instead of landing after the marker.

use super::RegistryError;
use parking_lot::Mutex;
use relay_types::StreamToken;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// A unit travelling through a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A text fragment to forward to the sink.
    Payload(String),
    /// No more payloads will follow.
    EndOfStream,
}

impl Message {
    /// Creates a payload message.
    #[must_use]
    pub fn payload(text: impl Into<String>) -> Self {
        Self::Payload(text.into())
    }

    /// Returns `true` for the end-of-stream marker.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

/// FIFO queue shared by exactly one producer path and one drain loop.
#[derive(Debug)]
pub struct StreamChannel {
    token: StreamToken,
    created_at: Instant,
    sender: Mutex<Option<mpsc::Sender<Message>>>,
    receiver: tokio::sync::Mutex<mpsc::Receiver<Message>>,
    evicted: CancellationToken,
}

impl StreamChannel {
    /// Creates an open channel holding at most `capacity` queued messages.
    pub(crate) fn new(token: StreamToken, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            token,
            created_at: Instant::now(),
            sender: Mutex::new(Some(tx)),
            receiver: tokio::sync::Mutex::new(rx),
            evicted: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn token(&self) -> StreamToken {
        self.token
    }

    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Time since creation.
    #[must_use]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Returns `true` once the end-of-stream marker has been taken.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Returns `true` once the registry has dropped this channel.
    #[must_use]
    pub fn is_evicted(&self) -> bool {
        self.evicted.is_cancelled()
    }

    /// Resolves when the registry removes or sweeps this channel.
    pub async fn evicted(&self) {
        self.evicted.cancelled().await;
    }

    /// Enqueues `message`, waiting at most `timeout` for queue space.
    ///
    /// The parking_lot lock guards only the sender slot and is released
    /// before the send is awaited.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Sealed`] if the marker was already enqueued
    /// - [`RegistryError::WriteTimeout`] if the queue stayed full
    /// - [`RegistryError::Closed`] if the receiving half was closed
    pub async fn push(&self, message: Message, timeout: Duration) -> Result<(), RegistryError> {
        let sender = {
            let mut slot = self.sender.lock();
            if message.is_end() {
                slot.take()
            } else {
                slot.clone()
            }
        }
        .ok_or(RegistryError::Sealed(self.token))?;

        match sender.send_timeout(message, timeout).await {
            Ok(()) => {
                trace!(token = %self.token.short(), "enqueued");
                Ok(())
            }
            Err(SendTimeoutError::Timeout(_)) => Err(RegistryError::WriteTimeout {
                token: self.token,
                timeout,
            }),
            Err(SendTimeoutError::Closed(_)) => Err(RegistryError::Closed(self.token)),
        }
    }

    /// Waits for the next message.
    ///
    /// Returns `None` once every sender is gone and the queue is empty,
    /// which only happens when the marker write itself failed.
    pub async fn next(&self) -> Option<Message> {
        self.receiver.lock().await.recv().await
    }

    /// Takes the next message if one is already queued.
    ///
    /// Returns `None` when the queue is empty or another task is receiving.
    pub fn try_next(&self) -> Option<Message> {
        let mut rx = self.receiver.try_lock().ok()?;
        rx.try_recv().ok()
    }

    /// Marks the channel as gone and closes both ends.
    ///
    /// Wakes a drain loop waiting on [`evicted`](Self::evicted). Messages
    /// still buffered stay readable by a holder of the channel, but no new
    /// writes are accepted.
    pub(crate) fn evict(&self) {
        self.evicted.cancel();
        self.sender.lock().take();
        if let Ok(mut rx) = self.receiver.try_lock() {
            rx.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRITE: Duration = Duration::from_millis(100);

    #[tokio::test]
    async fn fifo_order() {
        let channel = StreamChannel::new(StreamToken::new(), 8);

        for text in ["one", "two", "three"] {
            channel.push(Message::payload(text), WRITE).await.unwrap();
        }
        channel.push(Message::EndOfStream, WRITE).await.unwrap();

        assert_eq!(channel.next().await, Some(Message::payload("one")));
        assert_eq!(channel.next().await, Some(Message::payload("two")));
        assert_eq!(channel.next().await, Some(Message::payload("three")));
        assert_eq!(channel.next().await, Some(Message::EndOfStream));
        // Sender was taken by the marker, queue is drained.
        assert_eq!(channel.next().await, None);
    }

    #[tokio::test]
    async fn payload_after_marker_is_rejected() {
        let token = StreamToken::new();
        let channel = StreamChannel::new(token, 8);

        channel.push(Message::EndOfStream, WRITE).await.unwrap();
        assert!(channel.is_sealed());

        let err = channel
            .push(Message::payload("late"), WRITE)
            .await
            .unwrap_err();
        assert_eq!(err, RegistryError::Sealed(token));
    }

    #[tokio::test]
    async fn second_marker_is_rejected() {
        let token = StreamToken::new();
        let channel = StreamChannel::new(token, 8);

        channel.push(Message::EndOfStream, WRITE).await.unwrap();
        let err = channel.push(Message::EndOfStream, WRITE).await.unwrap_err();
        assert_eq!(err, RegistryError::Sealed(token));
    }

    #[tokio::test(start_paused = true)]
    async fn full_queue_times_out() {
        let token = StreamToken::new();
        let channel = StreamChannel::new(token, 1);

        channel.push(Message::payload("fills"), WRITE).await.unwrap();
        let err = channel
            .push(Message::payload("blocked"), WRITE)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::WriteTimeout {
                token,
                timeout: WRITE
            }
        );
        assert!(!channel.is_sealed());
    }

    #[tokio::test]
    async fn evict_closes_queue() {
        let token = StreamToken::new();
        let channel = StreamChannel::new(token, 4);
        channel.push(Message::payload("kept"), WRITE).await.unwrap();

        channel.evict();

        assert!(channel.is_evicted());
        assert!(channel.is_sealed());
        channel.evicted().await;
        assert_eq!(
            channel.push(Message::payload("new"), WRITE).await,
            Err(RegistryError::Sealed(token))
        );
        // Buffered messages remain readable.
        assert_eq!(channel.next().await, Some(Message::payload("kept")));
        assert_eq!(channel.next().await, None);
    }

    #[tokio::test]
    async fn try_next_does_not_wait() {
        let channel = StreamChannel::new(StreamToken::new(), 4);
        assert_eq!(channel.try_next(), None);

        channel.push(Message::payload("ready"), WRITE).await.unwrap();
        assert_eq!(channel.try_next(), Some(Message::payload("ready")));
        assert_eq!(channel.try_next(), None);
        assert!(!channel.is_sealed());
    }

    #[tokio::test(start_paused = true)]
    async fn age_tracks_clock() {
        let channel = StreamChannel::new(StreamToken::new(), 1);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(channel.age() >= Duration::from_secs(5));
    }

    #[test]
    fn message_helpers() {
        assert!(Message::EndOfStream.is_end());
        assert!(!Message::payload("x").is_end());
    }
}
