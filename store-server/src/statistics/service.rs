use crate::cache::{CacheStore, keys};
use crate::catalog::ProductCatalog;
use crate::orders::repository::OrderRepository;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use shared::models::order::{Order, OrderStatus};
use shared::models::statistics::{DailyOrders, DailySales, TopProduct, TotalSales};
use shared::{AppResult, util};
use std::sync::Arc;

#[derive(Clone)]
pub struct StatisticsService {
    cache: Arc<dyn CacheStore>,
    repo: OrderRepository,
    catalog: Arc<dyn ProductCatalog>,
    batch_size: usize,
}

impl StatisticsService {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        repo: OrderRepository,
        catalog: Arc<dyn ProductCatalog>,
        batch_size: usize,
    ) -> Self {
        Self {
            cache,
            repo,
            catalog,
            batch_size,
        }
    }

    // ========== Ingestion ==========

    /// Append a completed order id to the work queue
    pub async fn enqueue(&self, order_id: &str) -> AppResult<()> {
        self.cache.lpush(keys::UPDATE_QUEUE, order_id).await?;
        tracing::info!(order_id = %order_id, "Order enqueued for statistics update");
        Ok(())
    }

    /// Drain up to one batch from the queue.
    ///
    /// Per item: skip when already in the day's dedup set; skip (log, no
    /// retry) when the order is missing or not COMPLETED - the consumer
    /// does not trust the enqueue contract; otherwise fold the order into
    /// every aggregate and mark it processed. Per-item errors
    /// skip-and-continue so one bad record never blocks the batch.
    pub async fn drain(&self) -> AppResult<usize> {
        let today = util::today_compact();
        let processed_key = keys::processed_orders(&today);
        let mut processed = 0usize;

        for _ in 0..self.batch_size {
            let Some(order_id) = self.cache.rpop(keys::UPDATE_QUEUE).await? else {
                break;
            };

            match self.cache.sismember(&processed_key, &order_id).await {
                Ok(true) => {
                    tracing::debug!(order_id = %order_id, "Order already processed, skipping");
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(order_id = %order_id, error = %e, "Dedup check failed, processing anyway");
                }
            }

            let order = match self.repo.get_by_id(&order_id) {
                Ok(Some(order)) => order,
                Ok(None) => {
                    tracing::warn!(order_id = %order_id, "Order not found, skipping");
                    continue;
                }
                Err(e) => {
                    tracing::error!(order_id = %order_id, error = %e, "Order lookup failed, skipping");
                    continue;
                }
            };
            if order.status != OrderStatus::Completed {
                tracing::warn!(order_id = %order_id, status = %order.status,
                    "Order not completed, skipping");
                continue;
            }

            self.fold_total_sales(&order).await;
            self.fold_daily_sales(&order).await;
            self.fold_product_sales(&order).await;

            if let Err(e) = self.mark_processed(&processed_key, &order_id).await {
                tracing::error!(order_id = %order_id, error = %e, "Failed to mark order processed");
            }
            processed += 1;
        }

        if processed > 0 {
            tracing::info!(count = processed, "Processed orders for statistics update");
        }
        Ok(processed)
    }

    async fn mark_processed(&self, processed_key: &str, order_id: &str) -> AppResult<()> {
        self.cache.sadd(processed_key, order_id).await?;
        self.cache
            .expire(processed_key, keys::PROCESSED_ORDERS_TTL_SECS)
            .await
    }

    // ========== Aggregate folds (best-effort, log-on-failure) ==========

    async fn fold_total_sales(&self, order: &Order) {
        let amount = order.actual_amount.to_f64().unwrap_or_default();
        if let Err(e) = self.cache.incr_by_float(keys::SALES_TOTAL, amount).await {
            tracing::error!(order_id = %order.order_id, error = %e, "Failed to update total sales");
            return;
        }
        if let Err(e) = self.cache.incr_by(keys::SALES_TOTAL_COUNT, 1).await {
            tracing::error!(order_id = %order.order_id, error = %e, "Failed to update completed-order count");
        }
        if let Err(e) = self
            .cache
            .set(keys::SALES_TOTAL_UPDATE, &util::now_millis().to_string())
            .await
        {
            tracing::error!(error = %e, "Failed to stamp total sales update time");
        }
    }

    async fn fold_daily_sales(&self, order: &Order) {
        // Day bucket follows the completion date, not the drain date
        let date = util::compact_date(&order.complete_time.unwrap_or(order.create_time));
        let hash_key = keys::sales_daily(&date);
        let amount = order.actual_amount.to_f64().unwrap_or_default();

        let result = async {
            self.cache
                .hincr_by_float(&hash_key, "sales", amount)
                .await?;
            self.cache.hincr_by(&hash_key, "orders", 1).await?;
            self.cache
                .hset(&hash_key, "lastUpdate", &util::now_millis().to_string())
                .await?;
            self.cache
                .expire(&hash_key, keys::DAILY_STATS_TTL_SECS)
                .await
        }
        .await;
        if let Err(e) = result {
            tracing::error!(order_id = %order.order_id, date = %date, error = %e,
                "Failed to update daily sales");
        }
    }

    async fn fold_product_sales(&self, order: &Order) {
        for line in &order.items {
            let detail_key = keys::product_sales(&line.product_id);
            let result = async {
                self.cache
                    .zincr_by(
                        keys::PRODUCT_SALES_RANK,
                        &line.product_id,
                        line.quantity as f64,
                    )
                    .await?;
                self.cache
                    .hincr_by(&detail_key, "totalSales", line.quantity as i64)
                    .await?;
                self.cache
                    .hset(&detail_key, "lastUpdate", &util::now_millis().to_string())
                    .await
            }
            .await;
            if let Err(e) = result {
                tracing::error!(order_id = %order.order_id, product_id = %line.product_id,
                    error = %e, "Failed to update product sales");
                continue;
            }

            self.backfill_product_name(&detail_key, &line.product_id).await;
        }
    }

    /// Set the display name once, lazily, from the catalog
    async fn backfill_product_name(&self, detail_key: &str, product_id: &str) {
        match self.cache.hget(detail_key, "name").await {
            Ok(Some(_)) => return,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(product_id = %product_id, error = %e, "Name backfill check failed");
                return;
            }
        }
        match self.catalog.get_product(product_id).await {
            Ok(Some(product)) => {
                if let Err(e) = self.cache.hset(detail_key, "name", &product.name).await {
                    tracing::warn!(product_id = %product_id, error = %e, "Failed to backfill product name");
                }
            }
            Ok(None) => {
                tracing::warn!(product_id = %product_id, "Product missing for name backfill");
            }
            Err(e) => {
                tracing::warn!(product_id = %product_id, error = %e, "Product lookup failed for name backfill");
            }
        }
    }

    // ========== Read APIs ==========

    /// Running totals. When the cache has no running total (cold start),
    /// recompute from the order table and re-cache.
    pub async fn total_sales(&self) -> AppResult<TotalSales> {
        let sales = self.cache.get(keys::SALES_TOTAL).await?;
        let count = self.cache.get(keys::SALES_TOTAL_COUNT).await?;
        let update = self.cache.get(keys::SALES_TOTAL_UPDATE).await?;

        if let (Some(sales), Some(count)) = (&sales, &count) {
            return Ok(TotalSales {
                total_sales: sales.parse().unwrap_or(Decimal::ZERO),
                completed_orders: count.parse().unwrap_or(0),
                last_update: update
                    .and_then(|raw| raw.parse().ok())
                    .unwrap_or_else(util::now_millis),
            });
        }

        tracing::info!("Total sales not cached, recomputing from the order table");
        let (total, completed) = self.repo.fold_completed()?;
        let now = util::now_millis();
        self.cache.set(keys::SALES_TOTAL, &total.to_string()).await?;
        self.cache
            .set(keys::SALES_TOTAL_COUNT, &completed.to_string())
            .await?;
        self.cache
            .set(keys::SALES_TOTAL_UPDATE, &now.to_string())
            .await?;

        Ok(TotalSales {
            total_sales: total,
            completed_orders: completed,
            last_update: now,
        })
    }

    /// One day's sales rollup; defaults to today
    pub async fn daily_sales(&self, date: Option<&str>) -> AppResult<DailySales> {
        let date = date.map(str::to_string).unwrap_or_else(util::today_compact);
        let stats = self.cache.hget_all(&keys::sales_daily(&date)).await?;

        let sales: Decimal = stats
            .get("sales")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(Decimal::ZERO);
        let orders: u64 = stats
            .get("orders")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0);
        let average_order_value = if orders > 0 {
            (sales / Decimal::from(orders)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Ok(DailySales {
            date,
            sales,
            orders,
            average_order_value,
            last_update: stats
                .get("lastUpdate")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or_else(util::now_millis),
        })
    }

    /// One day's completed-order count; defaults to today
    pub async fn daily_orders(&self, date: Option<&str>) -> AppResult<DailyOrders> {
        let date = date.map(str::to_string).unwrap_or_else(util::today_compact);
        let hash_key = keys::sales_daily(&date);

        let orders = self
            .cache
            .hget(&hash_key, "orders")
            .await?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0);
        let last_update = self
            .cache
            .hget(&hash_key, "lastUpdate")
            .await?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(util::now_millis);

        Ok(DailyOrders {
            date,
            orders,
            last_update,
        })
    }

    /// Best-selling products by cumulative quantity
    pub async fn top_products(&self, limit: usize) -> AppResult<Vec<TopProduct>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let members = self
            .cache
            .zrevrange(keys::PRODUCT_SALES_RANK, 0, limit as isize - 1)
            .await?;

        let mut top = Vec::with_capacity(members.len());
        for (index, product_id) in members.into_iter().enumerate() {
            let detail = self.cache.hget_all(&keys::product_sales(&product_id)).await?;
            if detail.is_empty() {
                continue;
            }
            top.push(TopProduct {
                rank: index as u32 + 1,
                product_name: detail.get("name").cloned(),
                total_quantity: detail
                    .get("totalSales")
                    .and_then(|raw| raw.parse().ok())
                    .unwrap_or(0),
                last_update: detail.get("lastUpdate").and_then(|raw| raw.parse().ok()),
                product_id,
            });
        }
        Ok(top)
    }
}
