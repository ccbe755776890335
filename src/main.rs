//! valwatch - watch one numeric value on a web page and log every change
//!
//! A Rust monitoring tool: pick a URL and a number, and every change to
//! that number lands in an append-only audit log.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use valwatch::commands::{CheckCommand, WatchCommand};
use valwatch::config::{Config, FetchEngine, OutputFormat};

#[derive(Parser)]
#[command(
    name = "valwatch",
    version,
    about = "Watch a numeric value on a web page and log every change",
    long_about = "Polls a page on a fixed cadence, pins the target number down with a \
                  structural locator, and appends every detected change to an audit log."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "VALWATCH_PROXY")]
    proxy: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor a value until cancelled
    #[command(alias = "w")]
    Watch {
        /// Page to monitor (http:// or https://)
        url: String,

        /// Target value, in either decimal convention (e.g. 5,718 or 5.718)
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Seconds between polling cycles
        #[arg(short, long, default_value = "60", env = "VALWATCH_INTERVAL")]
        interval: u64,

        /// Stop after this many cycles (default: run until cancelled)
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Per-fetch timeout in seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// Fetch engine
        #[arg(short, long, default_value = "static", env = "VALWATCH_ENGINE")]
        engine: FetchEngine,

        /// Audit log path
        #[arg(long)]
        audit_log: Option<PathBuf>,

        /// Operator name recorded in the audit log
        #[arg(long)]
        operator: Option<String>,

        /// Also log unchanged observations
        #[arg(long)]
        log_unchanged: bool,
    },

    /// Probe a page once and print the synthesized locator
    #[command(alias = "c")]
    Check {
        /// Page to probe (http:// or https://)
        url: String,

        /// Target value, in either decimal convention
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Per-fetch timeout in seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// Fetch engine
        #[arg(short, long, default_value = "static", env = "VALWATCH_ENGINE")]
        engine: FetchEngine,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    config.format = cli.format;

    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Watch {
            url,
            value,
            interval,
            max_cycles,
            timeout,
            engine,
            audit_log,
            operator,
            log_unchanged,
        } => {
            config.interval_secs = interval;
            config.timeout_secs = timeout;
            config.engine = engine;
            config.log_unchanged = log_unchanged;

            if max_cycles.is_some() {
                config.max_cycles = max_cycles;
            }
            if let Some(path) = audit_log {
                config.audit_log = path;
            }
            if operator.is_some() {
                config.operator = operator;
            }

            let cmd = WatchCommand::new(config);
            let output = cmd.execute(&url, &value).await?;
            println!("{}", output);
        }

        Commands::Check { url, value, timeout, engine } => {
            config.timeout_secs = timeout;
            config.engine = engine;

            let cmd = CheckCommand::new(config);
            let output = cmd.execute(&url, &value).await?;
            println!("{}", output);
        }
    }

    Ok(())
}
