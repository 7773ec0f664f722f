//! relay - run an agent tool with streamed speech output.
//!
//! # Configuration
//!
//! Configuration is loaded from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`RELAY_*`)
//! 3. Project config (`.relay/config.toml` in the project root)
//! 4. Global config (`~/.relay/config.toml`)
//! 5. Default values (lowest priority)
//!
//! # Output
//!
//! Spoken fragments are printed as `speak: <text>` lines on stdout,
//! followed by the tool's final reply. Logs go to stderr and, when
//! enabled, to `<log dir>/relay.log`.
//!
//! # Exit Status
//!
//! `0` when the tool replied normally, `1` when the reply is an error
//! (unknown tool, timeout, cancellation, missing stream).

mod agent;
mod speech;
mod tools;
mod tracing_writer;

use anyhow::Result;
use clap::Parser;
use relay_runtime::config::RelayConfig;
use relay_runtime::{
    ConfigError, ConfigLoader, ConfigResolver, InvokeSettings, Invoker, StreamRegistry, Sweeper,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tools::{Dispatcher, ToolCall};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// relay - run an agent tool with streamed speech output
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Project root directory (defaults to current directory)
    #[arg(short = 'C', long)]
    project: Option<PathBuf>,

    /// Per-write timeout in milliseconds (also: RELAY_WRITE_TIMEOUT_MS)
    #[arg(long, value_name = "MS")]
    write_timeout_ms: Option<u64>,

    /// Drain idle timeout in milliseconds (also: RELAY_IDLE_TIMEOUT_MS)
    #[arg(long, value_name = "MS")]
    idle_timeout_ms: Option<u64>,

    /// Overall invocation timeout in milliseconds (also: RELAY_INVOKE_TIMEOUT_MS)
    #[arg(long, value_name = "MS")]
    invoke_timeout_ms: Option<u64>,

    /// Code revealed by the secret_code tool
    #[arg(long)]
    code: Option<String>,

    /// Simulated work per digit in milliseconds
    #[arg(long, value_name = "MS")]
    step_delay_ms: Option<u64>,

    /// Enable file logging into this directory (also: RELAY_LOG_FILE)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Override file log level (also: RELAY_LOG_LEVEL, default: debug)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Tool to call: secret_code, get_current_weather
    tool: String,

    /// Tool arguments
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

/// CLI-based configuration resolver.
///
/// Merges file/env config via [`ConfigLoader`] and applies CLI argument
/// overrides as the highest-priority layer.
struct CliConfigResolver {
    project_root: PathBuf,
    debug: bool,
    write_timeout_ms: Option<u64>,
    idle_timeout_ms: Option<u64>,
    invoke_timeout_ms: Option<u64>,
    code: Option<String>,
    step_delay_ms: Option<u64>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
}

impl CliConfigResolver {
    fn from_args(args: &Args) -> Self {
        let project_root = args.project.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|e| {
                warn!(error = %e, "Failed to get current directory, using '.'");
                PathBuf::from(".")
            })
        });

        Self {
            project_root,
            debug: args.debug,
            write_timeout_ms: args.write_timeout_ms,
            idle_timeout_ms: args.idle_timeout_ms,
            invoke_timeout_ms: args.invoke_timeout_ms,
            code: args.code.clone(),
            step_delay_ms: args.step_delay_ms,
            log_file: args.log_file.clone(),
            log_level: args.log_level.clone(),
        }
    }
}

impl ConfigResolver for CliConfigResolver {
    fn resolve(&self) -> Result<RelayConfig, ConfigError> {
        let mut config = ConfigLoader::new()
            .with_project_root(&self.project_root)
            .load()?;

        // CLI args override (highest priority)
        if self.debug {
            config.debug = true;
        }
        if let Some(ms) = self.write_timeout_ms {
            config.timeouts.write_ms = ms;
        }
        if let Some(ms) = self.idle_timeout_ms {
            config.timeouts.idle_ms = ms;
        }
        if let Some(ms) = self.invoke_timeout_ms {
            config.timeouts.invoke_ms = ms;
        }
        if let Some(ref code) = self.code {
            config.agent.secret_code.clone_from(code);
        }
        if let Some(ms) = self.step_delay_ms {
            config.agent.step_delay_ms = ms;
        }
        if let Some(ref p) = self.log_file {
            config.logging.file = true;
            config.logging.file_path = Some(p.clone());
        }
        if let Some(ref level) = self.log_level {
            config.logging.file_level.clone_from(level);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Installs the terminal layer and, if enabled, the file layer.
///
/// Terminal filter: --debug > --verbose > RUST_LOG env > default "warn".
/// File filter: `logging.file_level`, always independent.
fn init_tracing(args: &Args, config: &RelayConfig) {
    let terminal_filter = if args.debug || config.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let terminal_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let log_file = if config.logging.file {
        tracing_writer::open_log_file(&config.logging.resolved_file_path())
    } else {
        None
    };

    if let Some(file) = log_file {
        let file_filter = EnvFilter::new(config.logging.file_filter_directive());
        let file_layer = fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(tracing_writer::FileMakeWriter::new(file));

        tracing_subscriber::registry()
            .with(terminal_layer.with_filter(terminal_filter))
            .with(file_layer.with_filter(file_filter))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(terminal_layer.with_filter(terminal_filter))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = CliConfigResolver::from_args(&args);
    let config = resolver
        .resolve()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;

    init_tracing(&args, &config);

    info!(path = %resolver.project_root.display(), "Project root");
    if config.logging.file {
        info!(
            path = %config
                .logging
                .resolved_file_path()
                .join(tracing_writer::LOG_FILE_NAME)
                .display(),
            level = %config.logging.file_level,
            "File logging enabled"
        );
    }

    let registry = Arc::new(StreamRegistry::from_config(&config.registry));
    let sweeper_stop = config.registry.sweep_interval().map(|interval| {
        let sweeper = Sweeper::new(&registry, interval);
        let stop = sweeper.cancel_token();
        sweeper.spawn();
        stop
    });

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling invocation");
            interrupt.cancel();
        }
    });

    let invoker = Invoker::new(
        Arc::clone(&registry),
        InvokeSettings::from_config(&config.timeouts),
    );
    let dispatcher = Dispatcher::new(invoker, config.agent.clone());

    let call = ToolCall::parse(&args.tool, &args.args);
    debug!(?call, "Dispatching");
    let reply = dispatcher.dispatch(call, std::io::stdout(), &cancel).await;

    if let Some(stop) = sweeper_stop {
        stop.cancel();
    }
    let stats = registry.stats();
    debug!(
        live = stats.live,
        created = stats.created,
        removed = stats.removed,
        reaped = stats.reaped,
        "Registry stats"
    );

    println!("{}", reply.text);
    if !reply.ok {
        std::process::exit(1);
    }

    Ok(())
}
