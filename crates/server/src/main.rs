//! Pricewall - live token price kiosk service
//!
//! Main entry point for the HTTP server

use std::env;
use std::net::SocketAddr;

use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pricewall_core::{builtin_pairs, FeedTiming};
use pricewall_feed::EndpointResolver;
use pricewall_server::{router, AppState, SessionSupervisor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting pricewall v{}", env!("CARGO_PKG_VERSION"));

    let host = env::var("PRICEWALL_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PRICEWALL_PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    // The feed consumes the resolver over HTTP; by default that is our
    // own endpoint-configuration route.
    let resolver_url = env::var("RESOLVER_URL").unwrap_or_else(|_| {
        let self_host = if host == "0.0.0.0" { "127.0.0.1" } else { host.as_str() };
        format!("http://{self_host}:{}/api/rpc-url", local_addr.port())
    });
    info!(resolver = %resolver_url, "resolver endpoint");

    let supervisor = SessionSupervisor::new(
        EndpointResolver::new(resolver_url),
        builtin_pairs(),
        FeedTiming::default(),
    );
    supervisor.spawn_all();

    let state = AppState {
        supervisor: supervisor.clone(),
        http: reqwest::Client::new(),
    };
    let app = router(state);

    info!("listening on {local_addr}");
    info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    supervisor.shutdown().await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        }
        _ = terminate => {
            info!("Received termination signal");
        }
    }
}
