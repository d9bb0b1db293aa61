//! Sky Arena relay server
//!
//! Serves the browser client's static assets and relays player positions,
//! missiles and hits between connected pilots over WebSocket. The server
//! runs no physics; every client simulates its own ship.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sky_arena::app::AppState;
use sky_arena::config::Config;
use sky_arena::http::build_router;
use sky_arena::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level);
    init_server_time();

    info!("Starting Sky Arena relay");
    info!(
        static_dir = %config.static_dir.display(),
        missile_ttl_ms = config.missile_ttl_ms,
        missile_sweep_ms = config.missile_sweep_ms,
        "Configuration loaded"
    );

    let (state, hub) = AppState::new(config.clone());
    tokio::spawn(hub.run());

    let router = build_router(state);

    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Relay listening (GET /ws, GET /health, static client on /)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Relay stopped cleanly");
    Ok(())
}

/// Initialize tracing/logging. RUST_LOG wins over LOG_LEVEL.
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Resolves on Ctrl+C or SIGTERM, whichever comes first
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    let signal = tokio::select! {
        _ = ctrl_c => "ctrl-c",
        _ = sigterm => "sigterm",
    };

    info!(signal, "Shutting down, closing open connections");
}
