//! Invocation orchestrator.
//!
//! ```text
//! Invoker::invoke
//!   │ create() ──▶ token
//!   ├──spawn──▶ DrainLoop(token, sink)        ─┐
//!   ├──spawn──▶ produce(token) ─▶ exit signal ─┤ joined under invoke_timeout
//!   │                                          │ (or cancel)
//!   ◀──────────────────────────────────────────┘
//!   │ remove(token)   always, exactly once
//!   ▼
//! InvokeReport { token, result, drain }
//! ```

mod error;
mod invoker;

pub use error::InvokeError;
pub use invoker::{InvokeReport, InvokeSettings, Invoker};
