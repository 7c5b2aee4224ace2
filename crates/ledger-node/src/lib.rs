pub mod api;
pub mod config;

pub use api::{router, AppState};
pub use config::Args;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Serve `app` until ctrl-c.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    info!("ledger-node listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("shutting down"),
                Err(err) => error!(%err, "failed to listen for ctrl-c, shutting down"),
            }
        })
        .await?;
    Ok(())
}
