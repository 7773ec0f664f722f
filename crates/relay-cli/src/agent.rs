//! Demo agent: the streaming secret-code tool.
//!
//! Reveals a code one digit at a time. Each digit is pushed to the speech
//! stream as soon as it is "computed"; the tool's return value is the
//! final reply. Problems reaching the stream are reported as reply text,
//! never as errors, so the caller always has something to say.

use relay_runtime::config::AgentConfig;
use relay_runtime::{BindError, InvocationState, StreamProducer, StreamRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Reply once every digit has been sent.
pub const COMPLETE_REPLY: &str = "Secret code retrieval complete!";

/// The secret-code tool bound to a registry.
#[derive(Debug, Clone)]
pub struct SecretCodeTool {
    registry: Arc<StreamRegistry>,
    code: String,
    step_delay: Duration,
    write_timeout: Duration,
}

impl SecretCodeTool {
    pub fn new(registry: Arc<StreamRegistry>, config: &AgentConfig, write_timeout: Duration) -> Self {
        Self {
            registry,
            code: config.secret_code.clone(),
            step_delay: config.step_delay(),
            write_timeout,
        }
    }

    /// Runs the tool against the stream named in `state`.
    pub async fn run(self, state: InvocationState) -> String {
        let producer = match StreamProducer::from_state(self.registry, &state, self.write_timeout) {
            Ok(producer) => producer,
            Err(BindError::Missing) => {
                let msg = "Error: No streaming queue configured".to_string();
                error!("{msg}");
                return msg;
            }
            Err(BindError::Malformed(e)) => {
                let msg = format!("Error: {e}");
                error!("{msg}");
                return msg;
            }
        };

        let short = producer.token().short();
        if !producer.is_attached() {
            let msg = format!("Error: Streaming queue {short}... not found");
            error!("{msg}");
            return msg;
        }

        info!(token = %short, "Tool using stream");

        for (i, digit) in self.code.chars().enumerate() {
            tokio::time::sleep(self.step_delay).await;

            let text = format!("Digit {} is {digit}", i + 1);
            info!(token = %short, "Sending: {text}");
            producer.send(text).await;
        }

        producer.finish().await;
        COMPLETE_REPLY.to_string()
    }
}
