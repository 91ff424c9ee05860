use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use paperqa_backend::core::logging;
use paperqa_backend::server::router;
use paperqa_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize()?;
    logging::init(&state.paths);

    if !state.provider.health_check().await.unwrap_or(false) {
        tracing::warn!(
            "Ollama server at {} is not reachable; uploads and questions will fail until it is running",
            state.settings.ollama.base_url
        );
    }

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(8808);
    let bind_addr = format!("127.0.0.1:{}", port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("PAPERQA_PORT={}", addr.port());
    tracing::info!("Listening on {}", addr);

    let app: Router = router::router(state);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
