//! Arena Server - realtime lobby and match relay
//!
//! This is the main entry point for the session server. It handles:
//! - Raw HTTP/WebSocket connections from game clients
//! - The shared lobby and authoritative match state machine
//! - Broadcast relay of player state and match events

mod app;
mod assets;
mod config;
mod game;
mod ws;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Arena Server");

    // Create application state
    let state = AppState::new(config.clone());

    // Bind the listener, probing default ports if PORT is not set
    let listener = bind_listener(&config).await?;
    let addr = listener.local_addr()?;

    info!("Server listening on {}", addr);
    info!("Game page: http://{}", addr);
    info!("WebSocket endpoint: ws://{}", addr);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let state = state.clone();
                        tokio::spawn(async move {
                            ws::handler::handle_connection(stream, peer, state).await;
                        });
                    }
                    Err(e) => warn!(error = %e, "Failed to accept connection"),
                }
            }
            _ = shutdown_signal() => break,
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Bind the first available candidate port.
async fn bind_listener(config: &Config) -> anyhow::Result<TcpListener> {
    let candidates = config.candidate_ports();
    for port in &candidates {
        match TcpListener::bind(("0.0.0.0", *port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => warn!(port, error = %e, "Port unavailable, trying next"),
        }
    }
    anyhow::bail!("No available port among {:?}", candidates)
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
