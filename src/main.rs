//! Main entry point for the Inference Gateway

use infer_gateway::{
    api,
    backend::{Dispatcher, ServiceRegistry},
    config::Settings,
    AppState,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment; API keys live there
    // in local deployments.
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone()));

    if settings.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }

    info!("Starting Inference Gateway");

    // Load the service registry; it is immutable for the process lifetime
    let registry = Arc::new(ServiceRegistry::load_from_path(&settings.registry.path)?);
    info!("Registered {} services", registry.len());

    let dispatcher = Dispatcher::new()?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let app_state = Arc::new(AppState {
        settings,
        registry,
        dispatcher,
    });

    // Build the router
    let app = api::routes::create_router(app_state);

    info!("Server listening on {}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
