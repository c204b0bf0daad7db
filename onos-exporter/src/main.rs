//! Prometheus exporter for ONOS.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use onos_exporter::{Exporter, ExporterConfig, HttpServer};

/// Prometheus exporter for ONOS.
#[derive(Parser, Debug)]
#[command(name = "onos-exporter")]
#[command(about = "Export ONOS e2t, topo and profiling state as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Log level (overrides config).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    if let Some(listen) = args.listen {
        config.exporter.listen = listen;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    onos_exporter_common::init_tracing(&config.logging)?;

    info!("Starting ONOS exporter");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let exporter = Arc::new(Exporter::from_config(&config)?);
    if exporter.collector_names().is_empty() {
        info!("No collectors configured; only exporter metrics will be served");
    }

    let listen_addr = config
        .exporter
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let http_server = HttpServer::new(exporter.clone(), listen_addr, config.exporter.path.clone());

    let collect_exporter = exporter.clone();
    let collect_shutdown = shutdown_rx.clone();
    let collect_task = tokio::spawn(async move {
        collect_exporter.run(collect_shutdown).await;
    });

    let http_shutdown = shutdown_rx.clone();
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run(http_shutdown).await {
            error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        error!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    shutdown_tx.send(true)?;

    // A cycle in flight is not interrupted; give it a bounded grace period.
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = http_task.await;
        let _ = collect_task.await;
    })
    .await;

    info!(
        cycles = exporter.cycles_completed(),
        series = exporter.series_count(),
        "Final statistics"
    );

    info!("Exporter stopped");
    Ok(())
}
