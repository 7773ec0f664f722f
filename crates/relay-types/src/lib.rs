//! Core types for the relay workspace.
//!
//! Relay hands incremental results from a long-running producing
//! computation to a real-time consumer. The two sides never call each
//! other; they share only a [`StreamToken`].
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  relay-types    : StreamToken, ErrorCode          ◄── HERE  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  relay-runtime  : registry, producer, drain, invoke, config │
//! ├─────────────────────────────────────────────────────────────┤
//! │  relay-cli      : `relay` binary, demo agent, speech sink   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use relay_types::StreamToken;
//!
//! let token = StreamToken::new();
//! println!("minted {token} ({})", token.short());
//! ```

mod error;
mod id;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{ParseTokenError, StreamToken};
