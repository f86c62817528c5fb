mod config;
mod console;
mod routes;
mod sdk;
mod state;
mod store;

use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::FlagSource;
use console::model::ExperimentConfig;
use console::Console;
use sdk::{ExperimentProvider, HttpAnalytics, RemoteExperimentProvider, StubExperimentProvider};
use store::{BlobStore, ConfigStore, MemoryBlobStore, PgBlobStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "experiment_console=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env();

    let blobs: Arc<dyn BlobStore> = match config.database_url.as_deref() {
        Some(url) => match PgBlobStore::connect(url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!("settings database unavailable, nothing will persist: {:?}", e);
                Arc::new(MemoryBlobStore::default())
            }
        },
        None => Arc::new(MemoryBlobStore::default()),
    };
    let store = ConfigStore::new(blobs, ExperimentConfig::with_server_url(&config.experiment_server_url));

    let experiments: Arc<dyn ExperimentProvider> = match config.flag_source {
        FlagSource::Remote => Arc::new(RemoteExperimentProvider::new()),
        FlagSource::Stub => {
            tracing::info!("flag source is stub: every flag resolves to control");
            Arc::new(StubExperimentProvider)
        }
    };

    let console = Arc::new(
        Console::restore(
            Arc::new(HttpAnalytics::new(&config.analytics_endpoint)),
            experiments,
            store,
        )
        .await,
    );

    let state = state::AppState { console: console.clone() };

    let app = routes::routes()
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = match tokio::net::TcpListener::bind(config.addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", config.addr(), e);
            return;
        }
    };

    tracing::info!(
        persistence = console.store_backend(),
        "console is listening at http://{}",
        config.addr()
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("server error: {}", e);
    }

    console.flush_tracking().await;
    tracing::info!("console stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
    }
}
