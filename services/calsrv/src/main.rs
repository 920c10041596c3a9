//! calsrv - Calibration Service
//!
//! Reads newline-delimited JSON deltas on stdin, applies the configured
//! sensor calibrations and writes the forwarded deltas to stdout.

mod logging;
mod runtime;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use voltage_calibration::{
    load_options, plugin, Calibration, FileOptionsStore, NullOptionsStore, OptionsStore,
    PluginOptions,
};

use crate::logging::LogConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Calsrv - sensor calibration service")]
struct Args {
    /// Calibration options file (yaml, json or toml)
    #[arg(short, long, value_name = "FILE", env = "CALSRV_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,

    /// Disable colored console output
    #[arg(long)]
    no_color: bool,

    /// Directory for daily-rolling log files
    #[arg(long, value_name = "DIR", env = "CALSRV_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Seconds between status log lines (0 disables)
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    status_interval: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Calibrate deltas from stdin (default)
    Run,
    /// Validate the options file and list calibrations
    Check,
    /// Print the options JSON schema
    Schema,
}

impl Args {
    fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.log_level.clone(),
            json: self.log_json,
            ansi: !self.no_color,
            log_dir: self.log_dir.clone(),
        }
    }
}

/// Load options and pick the store sorted tables are written back to
fn load(args: &Args) -> Result<(PluginOptions, Arc<dyn OptionsStore>)> {
    match &args.config {
        Some(path) => {
            let options = load_options(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            info!(
                "Loaded {} calibrations from {}",
                options.calibrations.len(),
                path.display()
            );
            Ok((options, Arc::new(FileOptionsStore::new(path))))
        },
        None => {
            warn!("No options file given, running without calibrations");
            Ok((PluginOptions::default(), Arc::new(NullOptionsStore)))
        },
    }
}

/// One line per calibration: path and whether it will be installed
fn describe(options: &PluginOptions) -> Vec<String> {
    options
        .calibrations
        .iter()
        .map(|config| {
            let mut sorted = config.clone();
            sorted.sort_mappings();
            let state = match Calibration::build(&sorted) {
                Some(cal) => {
                    let mut parts = vec![format!("{} mappings", sorted.mappings.len())];
                    if let Some(period) = cal.period() {
                        parts.push(format!("period={}", period));
                    }
                    if let Some(decimals) = cal.decimals() {
                        parts.push(format!("decimals={}", decimals));
                    }
                    if let Some(source) = &sorted.source_ref {
                        parts.push(format!("source={}", source));
                    }
                    format!("active ({})", parts.join(", "))
                },
                None => format!("inert ({} mappings)", sorted.mappings.len()),
            };
            format!("{}: {}", config.path, state)
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Run);

    if command == Command::Schema {
        println!("{}", serde_json::to_string_pretty(&plugin::schema())?);
        return Ok(());
    }

    let _guard = logging::init(&args.log_config())?;
    let (options, store) = load(&args)?;

    match command {
        Command::Check => {
            for line in describe(&options) {
                println!("{}", line);
            }
        },
        Command::Run | Command::Schema => {
            info!("Starting {} v{}", logging::SERVICE_NAME, env!("CARGO_PKG_VERSION"));
            runtime::run(options, store, args.status_interval).await?;
            info!("{} stopped", logging::SERVICE_NAME);
        },
    }

    Ok(())
}
