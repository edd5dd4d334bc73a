//! Application state - explicit construction and wiring
//!
//! Every component receives its store handles at construction time and
//! the whole graph is built in one place. The cache and column store are
//! opened at startup and shared by cloning their handles; shutdown flows
//! through one `CancellationToken`.

use crate::cache::CacheStore;
use crate::cart::CartService;
use crate::catalog::{ProductCatalog, ProductRepository};
use crate::core::config::Config;
use crate::db::ColumnStore;
use crate::orders::{OrderIdGenerator, OrderRepository, OrderService};
use crate::statistics::{StatisticsService, StatisticsWorker};
use crate::stock::StockLedger;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct AppState {
    pub config: Config,
    pub cache: Arc<dyn CacheStore>,
    pub store: ColumnStore,
    pub ledger: StockLedger,
    pub products: Arc<ProductRepository>,
    pub carts: CartService,
    pub orders: OrderService,
    pub statistics: StatisticsService,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, cache: Arc<dyn CacheStore>, store: ColumnStore) -> Self {
        let ledger = StockLedger::new(cache.clone(), config.stock_ttl_secs);
        let products = Arc::new(ProductRepository::new(
            cache.clone(),
            store.clone(),
            ledger.clone(),
        ));
        let catalog: Arc<dyn ProductCatalog> = products.clone();

        let carts = CartService::new(
            cache.clone(),
            store.clone(),
            catalog.clone(),
            ledger.clone(),
            config.cart_ttl_secs,
        );
        let repo = OrderRepository::new(store.clone());
        let statistics = StatisticsService::new(
            cache.clone(),
            repo.clone(),
            catalog,
            config.stats_drain_batch_size,
        );
        let orders = OrderService::new(
            cache.clone(),
            repo,
            carts.clone(),
            ledger.clone(),
            OrderIdGenerator::new(cache.clone()),
            statistics.clone(),
        );

        Self {
            config,
            cache,
            store,
            ledger,
            products,
            carts,
            orders,
            statistics,
            shutdown: CancellationToken::new(),
        }
    }

    /// Start the fixed-interval statistics drain
    pub fn spawn_statistics_worker(&self) -> JoinHandle<()> {
        let worker = StatisticsWorker::new(
            self.statistics.clone(),
            Duration::from_secs(self.config.stats_drain_interval_secs),
            self.shutdown.clone(),
        );
        tokio::spawn(worker.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    #[tokio::test]
    async fn state_wires_the_full_graph() {
        let config = Config {
            redis_url: "redis://unused".into(),
            data_dir: "/tmp/unused".into(),
            environment: "development".into(),
            log_level: "info".into(),
            log_dir: None,
            cart_ttl_secs: 60,
            stock_ttl_secs: 60,
            stats_drain_interval_secs: 20,
            stats_drain_batch_size: 10,
        };
        let state = AppState::new(
            config,
            Arc::new(MemoryCache::new()),
            ColumnStore::open_in_memory().unwrap(),
        );

        // The wired graph is usable end to end against empty stores
        assert!(state.carts.get("u1").await.unwrap().is_empty());
        assert!(state.orders.list(None, 1, 10).await.unwrap().orders.is_empty());

        let worker = state.spawn_statistics_worker();
        state.shutdown.cancel();
        worker.await.unwrap();
    }
}
