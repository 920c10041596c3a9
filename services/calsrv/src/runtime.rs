//! Delta loop: stdin → pipeline → stdout
//!
//! Each stdin line holds one JSON delta. Deltas are dispatched through the
//! pipeline the calibration plugin is installed on; whatever reaches the
//! pipeline sink is written to stdout as one JSON line.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use voltage_calibration::{CalibrationPlugin, Delta, DeltaPipeline, OptionsStore, PluginOptions};

/// Counters reported at shutdown
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Deltas parsed and dispatched
    pub received: u64,
    /// Lines that were not valid deltas
    pub rejected: u64,
    /// Deltas written to stdout
    pub forwarded: u64,
}

/// Parse one input line and dispatch it
///
/// Blank lines are ignored; malformed lines are logged and counted.
pub fn process_line(pipeline: &DeltaPipeline, line: &str, stats: &mut RuntimeStats) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    match serde_json::from_str::<Delta>(line) {
        Ok(delta) => {
            stats.received += 1;
            pipeline.dispatch(delta);
        },
        Err(e) => {
            stats.rejected += 1;
            warn!("Discarding malformed delta: {}", e);
        },
    }
}

/// Write forwarded deltas as JSON lines until the channel closes
pub async fn write_deltas<W>(mut rx: UnboundedReceiver<Delta>, mut out: W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut count = 0;
    while let Some(delta) = rx.recv().await {
        let mut line = serde_json::to_vec(&delta)?;
        line.push(b'\n');
        out.write_all(&line).await?;
        out.flush().await?;
        count += 1;
    }
    Ok(count)
}

/// Wait for Ctrl+C, or SIGTERM on Unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Run the service until stdin closes or a shutdown signal arrives
pub async fn run(
    options: PluginOptions,
    store: Arc<dyn OptionsStore>,
    status_interval_secs: u64,
) -> Result<RuntimeStats> {
    let (tx, rx) = mpsc::unbounded_channel::<Delta>();
    let pipeline = Arc::new(DeltaPipeline::new(move |delta| {
        if tx.send(delta).is_err() {
            debug!("Output closed, dropping delta");
        }
    }));
    let writer = tokio::spawn(write_deltas(rx, tokio::io::stdout()));

    let mut plugin = CalibrationPlugin::new(pipeline.clone(), store);
    let active = plugin.start(options);
    if active == 0 {
        warn!("No active calibrations; deltas pass through unchanged");
    }

    let mut stats = RuntimeStats::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = (status_interval_secs > 0)
        .then(|| interval(Duration::from_secs(status_interval_secs)));

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => process_line(&pipeline, &line, &mut stats),
                Ok(None) => {
                    debug!("Input closed");
                    break;
                },
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                },
            },
            _ = async {
                match ticker.as_mut() {
                    Some(t) => {
                        t.tick().await;
                    },
                    None => std::future::pending::<()>().await,
                }
            } => {
                let status = plugin.status_message();
                if !status.is_empty() {
                    info!("Status: {}", status);
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            },
        }
    }

    plugin.stop();
    // Dropping every pipeline handle closes the output channel
    drop(plugin);
    drop(pipeline);

    match writer.await {
        Ok(Ok(forwarded)) => stats.forwarded = forwarded,
        Ok(Err(e)) => error!("Output writer failed: {}", e),
        Err(e) => error!("Output writer task panicked: {}", e),
    }

    info!(
        "Processed {} deltas ({} rejected, {} forwarded)",
        stats.received, stats.rejected, stats.forwarded
    );
    Ok(stats)
}
