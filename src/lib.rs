pub mod config;
pub mod error;
pub mod jukebox;
pub mod routes;
pub mod slack;
pub mod spotify;
pub mod telemetry;

use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the full HTTP application
pub fn app(config: config::Config) -> Result<Router, error::AppError> {
    let state = routes::AppState::from_config(config)?;

    Ok(routes::routes(state).layer(TraceLayer::new_for_http()))
}

pub async fn run(config: config::Config) -> anyhow::Result<()> {
    telemetry::init_tracing(&config.rust_log);

    if !config.spotify_connected() {
        tracing::warn!("SPOTIFY_REFRESH_TOKEN not set, song requests will be declined");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let app = app(config)?;

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
