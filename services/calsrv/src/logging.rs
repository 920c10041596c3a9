//! Logging setup for calsrv
//!
//! Console output goes to stderr; stdout carries forwarded deltas.

use chrono::SecondsFormat;
use std::path::PathBuf;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

pub const SERVICE_NAME: &str = "calsrv";

/// Level tag and ANSI color code
fn level_style(level: Level) -> (&'static str, &'static str) {
    match level {
        Level::ERROR => ("ERROR", "31"),
        Level::WARN => ("WARN", "33"),
        Level::INFO => ("INFO", "32"),
        Level::DEBUG => ("DEBUG", "34"),
        Level::TRACE => ("TRACE", "35"),
    }
}

/// One line per event: `timestamp [LEVEL] target: message`
struct ServiceFormat;

impl<S, N> FormatEvent<S, N> for ServiceFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let (tag, color) = level_style(*meta.level());
        let stamp = chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        if writer.has_ansi_escapes() {
            write!(writer, "{} \x1b[{}m[{}]\x1b[0m {}: ", stamp, color, tag, meta.target())?;
        } else {
            write!(writer, "{} [{}] {}: ", stamp, tag, meta.target())?;
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for calsrv and the calibration library
    pub level: String,
    /// Emit JSON lines instead of the bracketed format
    pub json: bool,
    /// Colorize console output
    pub ansi: bool,
    /// Also write daily-rolling log files here
    pub log_dir: Option<PathBuf>,
}

/// Build the filter; `RUST_LOG` takes precedence over the configured level
fn build_filter(level: &str) -> EnvFilter {
    if let Ok(env_str) = std::env::var("RUST_LOG") {
        if !env_str.trim().is_empty() {
            return EnvFilter::new(env_str);
        }
    }

    let spec = format!(
        "info,{}={},voltage_calibration={}",
        SERVICE_NAME, level, level
    );
    EnvFilter::try_new(spec).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the service.
pub fn init(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let console_layer = if config.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(config.ansi)
            .event_format(ServiceFormat)
            .boxed()
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender =
                tracing_appender::rolling::daily(dir, format!("{}.log", SERVICE_NAME));
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .event_format(ServiceFormat)
                .boxed();
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(build_filter(&config.level))
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    if let Some(dir) = &config.log_dir {
        tracing::info!("Logging: {} @ {:?}", SERVICE_NAME, dir);
    }

    Ok(guard)
}
