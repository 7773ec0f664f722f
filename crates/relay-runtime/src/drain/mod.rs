//! Consumer-side drain loop.
//!
//! A [`DrainLoop`] runs as its own task, bound to a token and a
//! [`Sink`](crate::sink::Sink). It forwards payloads in order until the
//! end marker arrives, then reports how many it forwarded.
//!
//! Every non-success path ends in [`DrainState::Failed`] with a
//! [`DrainFailure`] explaining why. The loop never resumes after either
//! terminal state.

mod drain_loop;
mod error;

pub use drain_loop::{DrainLoop, DrainReport, DrainState};
pub use error::DrainFailure;
