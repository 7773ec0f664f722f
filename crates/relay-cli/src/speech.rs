//! Speech output.
//!
//! Stands in for a text-to-speech pipeline: drained payloads arrive over
//! an mpsc queue and each one is written as a `speak: <text>` line.

use relay_runtime::QueueSink;
use std::io::Write;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Spawns the speaker task and returns the sink that feeds it.
///
/// The task ends once every clone of the sink is dropped and hands back
/// the writer.
pub fn spawn_speaker<W>(capacity: usize, mut out: W) -> (QueueSink, JoinHandle<W>)
where
    W: Write + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));

    let handle = tokio::spawn(async move {
        let mut spoken = 0usize;
        while let Some(text) = rx.recv().await {
            if let Err(e) = writeln!(out, "speak: {text}").and_then(|()| out.flush()) {
                error!(error = %e, "Speech output failed");
                break;
            }
            spoken += 1;
        }
        debug!(spoken, "Speaker stopped");
        out
    });

    (QueueSink::new(tx), handle)
}
