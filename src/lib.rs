pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::core::config::{Settings, StorageBackend};
use crate::core::{state::AppState, telemetry, time::SystemClock};
use crate::repositories::{memory::MemoryStore, postgres::PgStore, Store};
use crate::tasks::scheduler::Scheduler;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let store = build_store(&settings).await?;
    let state = AppState::new(settings, store, Arc::new(SystemClock));

    let restored = state
        .attempts()
        .restore_timers()
        .await
        .context("Failed to restore attempt timers")?;
    tracing::info!(restored, "Attempt timers restored");

    let scheduler = Scheduler::start(state.clone());
    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        storage = state.settings().storage().backend.as_str(),
        "Quizglass API listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    scheduler.shutdown().await;
    tracing::info!("Background tasks stopped");

    result?;

    Ok(())
}

async fn build_store(settings: &Settings) -> anyhow::Result<Arc<dyn Store>> {
    match settings.storage().backend {
        StorageBackend::Postgres => {
            let pool = db::init_pool(settings).await?;
            db::run_migrations(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageBackend::Memory => {
            let store = MemoryStore::new();
            if let Some(path) = settings.storage().fixtures_path.as_deref() {
                let loaded = repositories::fixtures::load_into(&store, Path::new(path))?;
                tracing::info!(path, loaded, "Quiz fixtures loaded");
            } else {
                tracing::warn!("Memory backend started without QUIZ_FIXTURES_PATH; no quizzes");
            }
            Ok(Arc::new(store))
        }
    }
}
