//! Thin proxy endpoints for the StoryBuddy front-end.
//!
//! Each endpoint forwards one request to a hosted AI provider,
//! injecting a server-held credential the client never sees. There is
//! no business logic, persistence or retry policy here.

mod config;
mod error;
mod routes;

use anyhow::Context;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();

    // A permissive CORS policy, so that a separately served front-end
    // can call the proxies.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = routes::AppState::new(config);
    let app = routes::router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!("listening on {bind_addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
