//! pool-watcher
//!
//! Tails the proxy access log and posts to a Slack webhook when the active
//! backend pool changes or the upstream 5xx rate climbs.
//!
//! # Architecture Overview
//!
//! ```text
//!   access.log ──▶ source ──▶ parser ──▶ monitor ─┬─▶ failover detector
//!   (appended by                                  └─▶ error-rate window
//!    the proxy)                                            │
//!                                                          ▼
//!                                     alert dispatcher (maintenance, cooldown)
//!                                                          │
//!                                                          ▼
//!                                                  Slack webhook (JSON)
//!
//!   Cross-cutting: config (env + TOML), observability (tracing, metrics),
//!                  lifecycle (startup, signals, shutdown)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use pool_watcher::config::{loader, watcher::ConfigWatcher, WatcherConfig};
use pool_watcher::lifecycle::{signals, startup, Shutdown};
use pool_watcher::observability;

#[derive(Parser)]
#[command(name = "pool-watcher")]
#[command(about = "Alert on backend pool failovers and upstream 5xx rates from an access log", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log file to watch (overrides LOG_FILE)
    #[arg(short, long)]
    log_file: Option<String>,

    /// Read the whole file once instead of tailing it
    #[arg(long)]
    replay: bool,

    /// Validate configuration, print it and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match loader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pool-watcher: configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = cli.log_file.clone() {
        config.source.log_file = path;
    }

    if cli.check_config {
        return match toml::to_string_pretty(&config.redacted()) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("pool-watcher: cannot render configuration: {e}");
                ExitCode::FAILURE
            }
        };
    }

    observability::logging::init(&config.observability.log_level);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: WatcherConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        log_file = %config.source.log_file,
        window_size = config.detection.window_size,
        threshold = config.detection.error_rate_threshold,
        cooldown_secs = config.alerts.cooldown_secs,
        maintenance = config.detection.maintenance_mode,
        "pool-watcher v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if let Some(addr) = &config.observability.metrics_address {
        observability::metrics::init_metrics(addr.parse()?)?;
    }

    let startup::Watcher {
        mut monitor,
        maintenance,
    } = startup::build(&config)?;

    // Keeps the notify watcher alive for the lifetime of `run`.
    let _config_watch = match (&cli.config, config.watch_config) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            tokio::spawn(maintenance.clone().follow(updates));
            Some(handle)
        }
        _ => None,
    };

    let mut source = startup::open_source(&config, cli.replay).await?;

    let shutdown = Shutdown::new();
    signals::spawn_listener(shutdown.clone());

    monitor.run(source.as_mut(), shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
