//! Relay Runtime - cross-context stream handoff.
//!
//! An agent computation and a real-time speech consumer run as separate
//! tasks and share nothing but a [`StreamToken`](relay_types::StreamToken).
//! This crate lets the agent push incremental text under that token and
//! lets the consumer drain it, with cleanup on every failure path and a
//! TTL sweep for channels both sides abandoned.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Invoker                               │
//! │   create token ─▶ spawn drain + producer ─▶ join ─▶ remove  │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │                               │
//!                ▼                               ▼
//!        ┌───────────────┐               ┌───────────────┐
//!        │ StreamProducer│──── send ────▶│StreamRegistry │◀── Sweeper
//!        └───────────────┘               └───────┬───────┘
//!                                                │ lookup
//!                                                ▼
//!                                        ┌───────────────┐     ┌──────┐
//!                                        │   DrainLoop   │────▶│ Sink │
//!                                        └───────────────┘     └──────┘
//! ```
//!
//! # Modules
//!
//! ## [`registry`] - Channel Store
//!
//! - [`StreamRegistry`](registry::StreamRegistry): token → channel table
//! - [`Sweeper`](registry::Sweeper): periodic TTL eviction
//!
//! ## [`producer`] - Producer Adapter
//!
//! - [`StreamProducer`](producer::StreamProducer): best-effort bounded writes
//! - [`InvocationState`](producer::InvocationState): token carried as state
//!
//! ## [`drain`] - Drain Loop
//!
//! - [`DrainLoop`](drain::DrainLoop): ordered forwarding to a sink
//!
//! ## [`invoke`] - Orchestrator
//!
//! - [`Invoker`](invoke::Invoker): one invocation, always cleaned up
//!
//! ## [`sink`] - Downstream
//!
//! - [`Sink`](sink::Sink), [`QueueSink`](sink::QueueSink), [`FnSink`](sink::FnSink)
//!
//! ## [`config`] - Configuration Management
//!
//! - [`RelayConfig`](config::RelayConfig): unified configuration type
//! - [`ConfigLoader`](config::ConfigLoader): multi-source loader
//!
//! Configuration priority: Environment > Project > Global > Default
//!
//! # Ownership
//!
//! There is no global registry. Build one [`StreamRegistry`] at startup,
//! wrap it in an `Arc`, and hand it to the [`Invoker`] and to whatever
//! builds producers.

pub mod config;
pub mod drain;
pub mod invoke;
pub mod producer;
pub mod registry;
pub mod sink;

pub use config::{
    default_config_dir, default_config_path, ConfigError, ConfigLoader, ConfigResolver,
    NoOpResolver, RelayConfig,
};
pub use drain::{DrainFailure, DrainLoop, DrainReport, DrainState};
pub use invoke::{InvokeError, InvokeReport, InvokeSettings, Invoker};
pub use producer::{BindError, Delivery, InvocationState, StreamProducer, STREAM_TOKEN_KEY};
pub use registry::{Message, RegistryError, RegistryStats, StreamRegistry, Sweeper};
pub use sink::{FnSink, QueueSink, Sink, SinkError};
