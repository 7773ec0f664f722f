//! Stream registry.
//!
//! Maps a [`StreamToken`](relay_types::StreamToken) to the queue that
//! carries speech fragments from a producer running in one task to the
//! drain loop running in another. Neither side holds the other; both
//! resolve the token through the shared [`StreamRegistry`].
//!
//! # Lifecycle
//!
//! ```text
//!   create()                          remove() / sweep()
//!      │                                     │
//!      ▼                                     ▼
//! ┌──────────┐  Payload*  EndOfStream  ┌──────────┐
//! │  Live    │ ──────────────────────▶ │ Evicted  │
//! └──────────┘                         └──────────┘
//!      │                                     ▲
//!      └───────── age > ttl ─────────────────┘
//! ```
//!
//! # Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`StreamRegistry`] | Token → channel table with TTL |
//! | [`StreamChannel`] | Bounded FIFO, sealed by the end marker |
//! | [`Message`] | Payload or end-of-stream marker |
//! | [`Sweeper`] | Periodic TTL enforcement |

mod channel;
mod error;
mod store;
mod sweeper;

pub use channel::{Message, StreamChannel};
pub use error::RegistryError;
pub use store::{RegistryStats, StreamRegistry};
pub use sweeper::Sweeper;
