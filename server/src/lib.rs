pub mod config;
pub mod error;
pub mod routes;
pub mod service;

use std::sync::Arc;

use log::{error, info};
use tokio::{net::TcpListener, signal};

pub use config::ServerConfig;
pub use error::{Result, ServerErr, ServiceErr};
pub use routes::router;
pub use service::PredictionService;

/// Loads the model and serves predictions until ctrl-c is received.
///
/// In flight requests are allowed to finish before returning.
pub async fn run(config: ServerConfig) -> Result<()> {
    let service = Arc::new(PredictionService::load(&config.model_path)?);
    info!(
        "serving {} model, status {:?}",
        service.model().kind(),
        service.health().status
    );

    let addr = config.addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("listening at {addr}");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("wrapping up, server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("received ctrl-c, shutting down"),
        Err(e) => {
            error!("couldn't listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    }
}
