//! Sky Server - user, device and role storage with push dispatch.

mod config;
mod dispatch;

use std::sync::Arc;

use color_eyre::eyre::WrapErr as _;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::dispatch::ConfiguredDispatcher;

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("sky-server starting");

    let config = Config::load().wrap_err("failed to load configuration")?;

    // Initialize storage
    let storage = sky_storage::SqliteStorage::new(&config.database_url)
        .wrap_err("failed to initialize storage")?;

    storage
        .run_migrations()
        .wrap_err("failed to run migrations")?;

    let dispatcher = ConfiguredDispatcher::from_config(config.apns.as_ref())
        .wrap_err("failed to initialize push dispatcher")?;

    let state = sky_http::AppState::new(storage, Arc::new(dispatcher));
    let app = sky_http::api_router(state).layer(TraceLayer::new_for_http());

    tracing::info!(addr = %config.listen, "listening");

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .wrap_err("failed to bind")?;

    axum::serve(listener, app).await.wrap_err("server error")?;

    Ok(())
}
