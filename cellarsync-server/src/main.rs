use anyhow::Context;
use cellarsync_google::build_client;
use cellarsync_server::bootstrap::build_driver;
use cellarsync_server::keepalive::start_keepalive;
use cellarsync_server::scheduler::spawn_periodic;
use cellarsync_server::{ServiceConfig, SyncJob, health};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServiceConfig::load_or_default();
    info!(
        "starting cellarsync: spreadsheet '{}', sync every {}s",
        config.spreadsheet_name, config.sync_interval_secs
    );

    let job = match build_driver(&config) {
        Ok(driver) => {
            info!("syncing {} collections", driver.schemas().len());
            SyncJob::new(driver)
        }
        Err(e) => {
            error!("sync pipeline unavailable: {e}");
            SyncJob::unavailable(e.to_string())
        }
    };
    let sync_task = spawn_periodic(Arc::new(job), config.sync_interval());

    let keepalive_task = start_keepalive(
        config.keepalive_target(),
        build_client(config.google.request_timeout_secs),
        config.keepalive_interval(),
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("liveness endpoint listening on {addr}");

    axum::serve(listener, health::router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("liveness server failed")?;

    sync_task.abort();
    if let Some(task) = keepalive_task {
        task.abort();
    }
    info!("cellarsync stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
