use anyhow::Context;
use std::sync::Arc;
use store_server::cache::CacheStore;
use store_server::{AppState, ColumnStore, Config, RedisCache, utils};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    utils::logger::init(&config.log_level, config.log_dir.as_deref());
    tracing::info!(environment = %config.environment, "Starting store-server");

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create data dir {}", config.data_dir))?;
    let store = ColumnStore::open(format!("{}/store.redb", config.data_dir))
        .context("failed to open column store")?;

    let cache: Arc<dyn CacheStore> = Arc::new(
        RedisCache::connect(&config.redis_url)
            .await
            .context("failed to connect to redis")?,
    );

    let state = AppState::new(config, cache, store);
    let statistics_worker = state.spawn_statistics_worker();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    state.shutdown.cancel();
    if let Err(e) = statistics_worker.await {
        tracing::error!(error = %e, "Statistics worker did not stop cleanly");
    }

    tracing::info!("store-server stopped");
    Ok(())
}
