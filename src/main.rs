use anyhow::Result;
use tokio::net::TcpListener;

use realtime_hub::config::Settings;
use realtime_hub::server::{create_app, AppState};
use realtime_hub::shutdown::{shutdown_signal, GracefulShutdown};
use realtime_hub::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Tracing must be up before anything logs
    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!("Configuration loaded");

    let state = AppState::new(settings.clone());
    let shutdown = GracefulShutdown::new(state.connection_manager.clone());
    tracing::info!("Application state initialized");

    let app = create_app(state);

    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown.execute("server shutting down").await;
        })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
