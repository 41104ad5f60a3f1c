// Main entry point - Wiring and lifecycle
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{Router, routing::get};
use tokio::sync::{RwLock, broadcast, mpsc, watch};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::application::connection_manager::ConnectionManager;
use crate::application::dashboard_state::{self, DashboardState};
use crate::application::rotor;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::ws_feed::WsFeedTransport;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_dashboard, health_check, stream_dashboard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Configuration problems are fatal, detected before the first connect
    // attempt.
    let config = load_dashboard_config().context("invalid dashboard configuration")?;
    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .context("invalid listen address")?;

    // Shared dashboard state plus the channels tying the pipeline together
    let dashboard = Arc::new(RwLock::new(DashboardState::new(
        config.max_fan_rpm,
        config.window_capacity,
    )));
    let (events_tx, events_rx) = mpsc::channel(64);
    let (updates_tx, _) = broadcast::channel(32);

    // Feed connection lifecycle (infrastructure transport behind the port)
    let transport = Arc::new(WsFeedTransport::new(config.endpoint_url.clone()));
    let mut manager = ConnectionManager::new(
        transport,
        events_tx,
        Duration::from_millis(config.reconnect_delay_ms),
    );
    manager.start();

    // Event-drive and rotor loops
    let driver = tokio::spawn(dashboard_state::drive(
        dashboard.clone(),
        events_rx,
        updates_tx.clone(),
    ));
    let (rotor_shutdown, rotor_signal) = watch::channel(false);
    let rotor_loop = tokio::spawn(rotor::run(
        dashboard.clone(),
        config.max_rotations_per_second,
        rotor_signal,
    ));

    // Read-only presentation surface
    let state = Arc::new(AppState {
        dashboard,
        updates: updates_tx,
    });
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/stream", get(stream_dashboard))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    info!("starting climate-telemetry service on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Teardown releases the socket, the pending reconnect timer, and the
    // rotor loop on every exit path.
    manager.stop().await;
    drop(manager);
    let _ = rotor_shutdown.send(true);
    let _ = rotor_loop.await;
    let _ = driver.await;
    info!("climate-telemetry service stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {e}");
    }
}
