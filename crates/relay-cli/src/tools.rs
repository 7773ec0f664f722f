//! Tool dispatch.
//!
//! | Tool | Streams | Reply |
//! |------|---------|-------|
//! | `secret_code` | yes | agent's final text or `Error: ...` |
//! | `get_current_weather` | no | canned forecast |
//! | anything else | no | `Unknown function: <name>` |

use crate::agent::SecretCodeTool;
use crate::speech;
use relay_runtime::config::AgentConfig;
use relay_runtime::{InvocationState, Invoker};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const SECRET_CODE: &str = "secret_code";
pub const WEATHER: &str = "get_current_weather";

/// Capacity of the speech queue between drain loop and speaker.
const SPEECH_QUEUE: usize = 32;

/// A parsed tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    /// Streaming secret-code lookup. The query is free text.
    SecretCode { query: String },
    Weather { location: String, format: String },
    Unknown(String),
}

impl ToolCall {
    /// Builds a call from a tool name and its positional arguments.
    ///
    /// `get_current_weather <location...> [celsius|fahrenheit]`; the
    /// format defaults to celsius.
    pub fn parse(name: &str, args: &[String]) -> Self {
        match name {
            SECRET_CODE => Self::SecretCode {
                query: args.join(" "),
            },
            WEATHER => {
                let (location, format) = match args.split_last() {
                    Some((last, rest))
                        if !rest.is_empty() && is_temperature_format(last) =>
                    {
                        (rest.join(" "), last.clone())
                    }
                    _ => (args.join(" "), "celsius".to_string()),
                };
                Self::Weather { location, format }
            }
            other => Self::Unknown(other.to_string()),
        }
    }
}

fn is_temperature_format(s: &str) -> bool {
    s.eq_ignore_ascii_case("celsius") || s.eq_ignore_ascii_case("fahrenheit")
}

/// Stub weather lookup.
pub fn current_weather(location: &str, format: &str) -> String {
    info!(location, format, "Get current weather");
    if format.eq_ignore_ascii_case("celsius") {
        format!("In {location}, it's 22°C and clear.")
    } else {
        format!("In {location}, it's 72°F and clear.")
    }
}

/// Text handed back to the caller plus whether the call succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub ok: bool,
}

impl Reply {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ok: true,
        }
    }

    fn failed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ok: false,
        }
    }
}

/// Routes tool calls; streaming calls go through the [`Invoker`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    invoker: Invoker,
    agent: AgentConfig,
}

impl Dispatcher {
    pub fn new(invoker: Invoker, agent: AgentConfig) -> Self {
        Self { invoker, agent }
    }

    /// Runs `call`, writing spoken text to `speech_out`.
    pub async fn dispatch<W>(
        &self,
        call: ToolCall,
        speech_out: W,
        cancel: &CancellationToken,
    ) -> Reply
    where
        W: std::io::Write + Send + 'static,
    {
        match call {
            ToolCall::SecretCode { query } => self.secret_code(&query, speech_out, cancel).await,
            ToolCall::Weather { location, format } => Reply::ok(current_weather(&location, &format)),
            ToolCall::Unknown(name) => {
                warn!(tool = %name, "Unknown function");
                Reply::failed(format!("Unknown function: {name}"))
            }
        }
    }

    async fn secret_code<W>(&self, query: &str, speech_out: W, cancel: &CancellationToken) -> Reply
    where
        W: std::io::Write + Send + 'static,
    {
        info!(query, "Secret code requested");

        let (sink, speaker) = speech::spawn_speaker(SPEECH_QUEUE, speech_out);
        let tool = SecretCodeTool::new(
            Arc::clone(self.invoker.registry()),
            &self.agent,
            self.invoker.settings().write_timeout,
        );

        let report = self
            .invoker
            .invoke(
                move |token| async move {
                    Ok::<_, Infallible>(tool.run(InvocationState::with_stream(token)).await)
                },
                Arc::new(sink),
                cancel,
            )
            .await;

        // The drain loop held the only sink; the speaker finishes what it has.
        if let Err(e) = speaker.await {
            warn!(error = %e, "Speaker task failed");
        }

        let text = report.reply_text();
        if report.result.is_ok() && !text.starts_with("Error:") {
            Reply::ok(text)
        } else {
            Reply::failed(text)
        }
    }
}
