//! Read-only JSON API over the trip store.

pub mod handlers;
pub mod response;
pub mod router;
pub mod state;

use std::sync::Arc;

use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

pub use router::create_router;
pub use state::AppState;

use crate::services::TripQueries;

/// Binds `host:port` and serves the API until ctrl+c or SIGTERM.
pub async fn serve(store: Arc<dyn TripQueries>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(AppState::new(store));
    let listener = TcpListener::bind((host, port)).await?;
    info!(address = %listener.local_addr()?, "Serving trip API");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
