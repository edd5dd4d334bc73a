//! Fixed-interval drain worker
//!
//! One tokio task owns the drain loop: a single drain per tick, never
//! overlapping, shut down through a `CancellationToken`. The first tick
//! fires immediately so a restart catches up on whatever queued while the
//! process was down.

use super::service::StatisticsService;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct StatisticsWorker {
    service: StatisticsService,
    interval: Duration,
    shutdown: CancellationToken,
}

impl StatisticsWorker {
    pub fn new(
        service: StatisticsService,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            service,
            interval,
            shutdown,
        }
    }

    /// Main loop: drain on every tick until shutdown
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Statistics worker started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.service.drain().await {
                        tracing::error!(error = %e, "Statistics drain failed");
                    }
                }
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Statistics worker received shutdown signal");
                    break;
                }
            }
        }

        tracing::info!("Statistics worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, MemoryCache, keys};
    use crate::catalog::ProductRepository;
    use crate::db::ColumnStore;
    use crate::orders::repository::OrderRepository;
    use crate::stock::StockLedger;
    use rust_decimal::Decimal;
    use shared::models::order::{Order, OrderStatus};
    use shared::util;
    use std::sync::Arc;

    #[tokio::test]
    async fn worker_drains_and_stops_on_cancel() {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
        let store = ColumnStore::open_in_memory().unwrap();
        let ledger = StockLedger::new(cache.clone(), keys::STOCK_TTL_SECS);
        let products = Arc::new(ProductRepository::new(cache.clone(), store.clone(), ledger));
        let repo = OrderRepository::new(store);

        let now = util::now_local();
        let order_id = format!("{}120000000001", util::today_compact());
        let order = Order {
            order_id: order_id.clone(),
            user_id: "000000000001".into(),
            total_amount: Decimal::new(1500, 2),
            discount_amount: Decimal::ZERO,
            actual_amount: Decimal::new(1500, 2),
            status: OrderStatus::Completed,
            create_time: now,
            pay_time: Some(now),
            cancel_time: None,
            complete_time: Some(now),
            receiver: "Default User".into(),
            phone: "13800138000".into(),
            address: "Room 1001".into(),
            postcode: "100000".into(),
            items: Vec::new(),
        };
        repo.save(&order).unwrap();

        let service = StatisticsService::new(cache.clone(), repo, products, 1000);
        service.enqueue(&order_id).await.unwrap();

        let shutdown = CancellationToken::new();
        let worker = StatisticsWorker::new(
            service,
            Duration::from_millis(10),
            shutdown.clone(),
        );
        let handle = tokio::spawn(worker.run());

        // Give the immediate first tick a chance to run, then stop
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(cache.llen(keys::UPDATE_QUEUE).await.unwrap(), 0);
        assert_eq!(
            cache.get(keys::SALES_TOTAL).await.unwrap().as_deref(),
            Some("15")
        );
    }
}
