//! Service assembly and lifecycle.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

use surge_api::{AppState, build_metrics_router, build_router};
use surge_core::ServiceConfig;
use surge_load::LoadGenerator;
use surge_metrics::{ProcSampler, ServiceMetrics, SystemSampler};
use surge_queue::{AdmissionQueue, Drainer};

/// Build every subsystem, serve until a shutdown signal, then wind down.
pub async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    info!(
        capacity = config.queue.capacity,
        http_burst = config.load.http_burst,
        "surge daemon starting"
    );

    // ── Initialize subsystems ──────────────────────────────────

    let queue = Arc::new(AdmissionQueue::new(config.queue.capacity));
    let sampler: Arc<dyn SystemSampler> = Arc::new(ProcSampler::new());
    let metrics = Arc::new(ServiceMetrics::new(queue.clone(), sampler));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let load = LoadGenerator::new(config.load.clone(), shutdown_rx.clone());

    // ── Start background tasks ─────────────────────────────────

    let drain_handle = Drainer::new(
        queue.clone(),
        config.queue.work_duration,
        config.queue.idle_wait,
    )
    .spawn(shutdown_rx.clone());

    // ── Start listeners ────────────────────────────────────────

    let app_listener = TcpListener::bind(config.listen).await?;
    info!(addr = %app_listener.local_addr()?, "application listener bound");

    let scrape_listener = TcpListener::bind(config.metrics_listen).await?;
    info!(addr = %scrape_listener.local_addr()?, "metrics listener bound");

    let app = build_router(AppState {
        queue: queue.clone(),
        metrics: metrics.clone(),
        load,
        http_burst: config.load.http_burst,
    });
    let scrape = build_metrics_router(metrics);

    let scrape_shutdown = shutdown_rx.clone();
    let scrape_handle = tokio::spawn(async move {
        axum::serve(scrape_listener, scrape)
            .with_graceful_shutdown(shutdown_requested(scrape_shutdown))
            .await
    });

    axum::serve(app_listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    scrape_handle.await??;
    drain_handle.await?;

    info!(
        admitted = queue.admitted_total(),
        processed = queue.processed_total(),
        "surge daemon stopped"
    );
    Ok(())
}

async fn shutdown_requested(mut rx: watch::Receiver<bool>) {
    // A dropped sender also means shutdown.
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
