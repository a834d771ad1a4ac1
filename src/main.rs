use std::net::SocketAddr;

use anyhow::Result;
use tracing::info;

use consultation_gateway::{
    router::build_router,
    startup::{init_tracing, initialize_app, shutdown_signal},
    Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format);
    info!("Loaded configuration for environment: {}", config.environment);

    let app_state = initialize_app(&config).await?;
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Consultation gateway listening on {}", addr);
    info!("API docs available at http://{}/api/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
