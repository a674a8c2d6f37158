//! ridgeline server binary.
//!
//! Wires the pieces together: resolve configuration, discover and open the
//! sensor (the only fatal error class), load the registry, spawn the reader
//! controller and serve the REST/WebSocket API until interrupted.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ridgeline_sensor::{MockSensorDriver, SensorDriver};
use ridgeline_session::ReaderController;
use ridgeline_store::JsonStore;

mod config;
mod http;
mod ws;

use config::{Args, Config};
use http::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::resolve(&args)?;

    init_tracing(config.debug);
    tracing::info!(version = ridgeline_core::VERSION, "ridgeline starting");

    // Discovery failures must stop the process here, before anything binds
    let driver = MockSensorDriver::new();
    let devices = driver
        .discover_devices()
        .map_err(ridgeline_core::Error::from)?;
    for device in &devices {
        tracing::info!(%device, "device found");
    }

    let device = driver
        .open_device(&config.device_id)
        .map_err(ridgeline_core::Error::from)?;
    tracing::info!(device = %config.device_id, "using device");

    let store = JsonStore::open(&config.store_path);
    tracing::info!(
        path = %config.store_path.display(),
        users = store.len(),
        "registry loaded"
    );

    let (controller, registry) = ReaderController::new(device, store);
    let controller_task = tokio::spawn(controller.run());

    let app = http::router(AppState { registry });
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(port = config.port, "fprint server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    controller_task.abort();
    Ok(())
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}
