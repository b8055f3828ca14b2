use tracing_subscriber::EnvFilter;

use vidmix_api::{
    api::{create_router, AppState},
    config::Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    // Initialize application state
    let state = AppState::from_config(&config)?;

    tracing::info!(
        sources = state.chain.source_count(),
        fetch_timeout_ms = config.fetch_timeout_ms,
        "Candidate sources configured"
    );

    // Create the router with all routes
    let app = create_router(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
