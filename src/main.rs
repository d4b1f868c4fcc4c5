use anyhow::Context;
use clap::Parser;
use log::{info, warn, LevelFilter};
use logwarden::config::Config;
use logwarden::run;
use std::fs;
use std::path::PathBuf;

/// Command-line arguments for the log scanner
#[derive(Parser)]
#[command(
    name = "logwarden",
    about = "Incremental log scanner with threshold-based alerting",
    long_about = "Scans append-only log files incrementally, detects threshold-based \
                  anomalies (SSH brute-force attempts, HTTP 5xx spikes, disk usage \
                  exhaustion) and dispatches batched alerts through the configured \
                  notification channels. Designed to be invoked periodically by a \
                  scheduler; each invocation is one complete, short-lived run."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging output")]
    verbose: bool,
}

impl Cli {
    /// Validate the CLI arguments
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files are handled gracefully by Config::load, which
            // warns and falls back to defaults.
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }
                if let Some(extension) = config_path.extension() {
                    if extension != "toml" {
                        warn!(
                            "Configuration file does not have .toml extension: {}",
                            config_path.display()
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    cli.validate().map_err(anyhow::Error::msg)?;

    let config = match cli.config {
        Some(ref path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    // Directory setup is the only fatal error path: without the state
    // directories, offsets and snapshots cannot be persisted at all.
    for dir in [
        config.offsets_dir(),
        config.locks_dir(),
        config.snapshots_dir(),
    ] {
        fs::create_dir_all(&dir)
            .with_context(|| format!("cannot create state directory {}", dir.display()))?;
    }

    let summary = run::execute(&config);
    info!(
        "Run complete: {} alert(s), {} source(s) skipped{}",
        summary.alerts,
        summary.sources_skipped,
        summary
            .snapshot
            .map(|p| format!(", snapshot {}", p.display()))
            .unwrap_or_default()
    );

    // Alerts firing or individual transports failing never fail the run;
    // only setup errors above reach the caller.
    Ok(())
}
