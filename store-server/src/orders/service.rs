//! Order lifecycle
//!
//! Synchronous (request-scoped) command processing over the two stores.
//! There is no cross-store transaction: creation reserves stock in the
//! cache, persists to the column store and trims the cart, with a
//! [`Saga`] restoring every reservation if a later step fails. Cancel
//! restores stock before flipping status, so a failed status write is
//! safe to retry. Complete hands the order id to the statistics queue.

use crate::cache::{CacheStore, keys};
use crate::cart::CartService;
use crate::orders::id_gen::OrderIdGenerator;
use crate::orders::repository::OrderRepository;
use crate::saga::Saga;
use crate::statistics::StatisticsService;
use crate::stock::StockLedger;
use rust_decimal::Decimal;
use shared::models::cart::CartLineView;
use shared::models::order::{Order, OrderLine, OrderPage, OrderStatus, OrderSummary};
use shared::models::statistics::StatusCounts;
use shared::{AppError, AppResult, util};
use std::collections::HashMap;
use std::sync::Arc;

// Default shipping profile for the single-tenant storefront
const DEFAULT_RECEIVER: &str = "Default User";
const DEFAULT_PHONE: &str = "13800138000";
const DEFAULT_ADDRESS: &str = "Room 1001, Sunrise Tower, Chaoyang District, Beijing";
const DEFAULT_POSTCODE: &str = "100000";

#[derive(Clone)]
pub struct OrderService {
    cache: Arc<dyn CacheStore>,
    repo: OrderRepository,
    carts: CartService,
    ledger: StockLedger,
    id_gen: OrderIdGenerator,
    statistics: StatisticsService,
}

impl OrderService {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        repo: OrderRepository,
        carts: CartService,
        ledger: StockLedger,
        id_gen: OrderIdGenerator,
        statistics: StatisticsService,
    ) -> Self {
        Self {
            cache,
            repo,
            carts,
            ledger,
            id_gen,
            statistics,
        }
    }

    // ========== create ==========

    /// Create an order from the user's cart.
    ///
    /// Validates the selection and stock, reserves stock per line with a
    /// restore compensation recorded in a saga, persists the order, then
    /// removes the ordered lines from the cart. Any failure after the
    /// first reservation compensates every reservation taken so far.
    pub async fn create(&self, user_id: &str, product_ids: &[String]) -> AppResult<Order> {
        tracing::info!(user_id = %user_id, count = product_ids.len(), "Creating order from cart");

        // 1. Resolve the requested lines against the cart, in request order
        let cart = self.carts.get(user_id).await?;
        let mut by_id: HashMap<String, CartLineView> = cart
            .lines
            .into_iter()
            .map(|line| (line.product_id.clone(), line))
            .collect();

        let mut selected = Vec::with_capacity(product_ids.len());
        for product_id in product_ids {
            match by_id.remove(product_id) {
                Some(line) => selected.push(line),
                None => {
                    tracing::warn!(product_id = %product_id, "Requested product is not in the cart");
                    return Err(AppError::validation("some products are not in the cart"));
                }
            }
        }
        if selected.is_empty() {
            return Err(AppError::EmptyCart);
        }

        // 2. Stock pre-check: best-effort early rejection. A concurrent
        //    reservation can still win between this pass and the reserve
        //    pass below; the saga covers that window.
        for line in &selected {
            let available = self.ledger.peek(&line.product_id).await?.unwrap_or(0);
            if available < line.quantity as u64 {
                return Err(AppError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    requested: line.quantity,
                    available: available.min(u32::MAX as u64) as u32,
                });
            }
        }

        // 3. Totals: no promotion logic, actual = total
        let total_amount: Decimal = selected
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();

        // 4. Order id
        let order_id = self.id_gen.next().await;

        // 5. Reserve stock per line, recording compensations
        let mut saga = Saga::new("create_order");
        for line in &selected {
            let reserved = match self.ledger.reserve(&line.product_id, line.quantity).await {
                Ok(reserved) => reserved,
                Err(e) => {
                    saga.compensate().await;
                    return Err(AppError::order_creation(format!(
                        "stock reservation failed for product {}: {e}",
                        line.product_id
                    )));
                }
            };
            if !reserved {
                // Lost the pre-check/reserve race to a concurrent order
                tracing::warn!(order_id = %order_id, product_id = %line.product_id,
                    "Reservation failed after pre-check, rolling back");
                saga.compensate().await;
                let available = self
                    .ledger
                    .peek(&line.product_id)
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or(0);
                return Err(AppError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    requested: line.quantity,
                    available: available.min(u32::MAX as u64) as u32,
                });
            }

            let ledger = self.ledger.clone();
            let product_id = line.product_id.clone();
            let quantity = line.quantity;
            saga.record("restore_stock", async move {
                if let Err(e) = ledger.restore(&product_id, quantity).await {
                    tracing::error!(product_id = %product_id, quantity, error = %e,
                        "Stock restore failed during rollback");
                }
            });
        }

        // 6. Persist
        let order = Self::build_order(&order_id, user_id, &selected, total_amount);
        if let Err(e) = self.repo.save(&order) {
            tracing::error!(order_id = %order_id, error = %e, "Order persistence failed, rolling back stock");
            saga.compensate().await;
            return Err(AppError::order_creation(format!(
                "failed to persist order: {e}"
            )));
        }

        // 7. Drop the ordered lines from the cart. On failure the stock
        //    compensation still runs; the persisted row stays
        //    PENDING_PAYMENT and can be cancelled.
        if let Err(e) = self.carts.remove(user_id, product_ids).await {
            tracing::error!(order_id = %order_id, error = %e, "Cart cleanup failed, rolling back stock");
            saga.compensate().await;
            return Err(AppError::order_creation(format!(
                "failed to remove ordered lines from cart: {e}"
            )));
        }

        saga.commit();
        tracing::info!(order_id = %order_id, amount = %order.actual_amount, "Order created");
        Ok(order)
    }

    fn build_order(
        order_id: &str,
        user_id: &str,
        lines: &[CartLineView],
        total_amount: Decimal,
    ) -> Order {
        let items = lines
            .iter()
            .map(|line| OrderLine {
                product_id: line.product_id.clone(),
                product_name: line.product_name.clone(),
                category: line.category.clone(),
                brand: line.brand.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                line_total: line.unit_price * Decimal::from(line.quantity),
            })
            .collect();

        Order {
            order_id: order_id.to_string(),
            user_id: user_id.to_string(),
            total_amount,
            discount_amount: Decimal::ZERO,
            actual_amount: total_amount,
            status: OrderStatus::PendingPayment,
            create_time: util::now_local(),
            pay_time: None,
            cancel_time: None,
            complete_time: None,
            receiver: DEFAULT_RECEIVER.to_string(),
            phone: DEFAULT_PHONE.to_string(),
            address: DEFAULT_ADDRESS.to_string(),
            postcode: DEFAULT_POSTCODE.to_string(),
            items,
        }
    }

    // ========== Transitions ==========

    /// `PENDING_PAYMENT -> PAID`
    pub async fn pay(&self, order_id: &str) -> AppResult<Order> {
        let mut order = self.load(order_id).await?;
        Self::ensure_transition(&order, OrderStatus::Paid)?;

        let old_status = order.status;
        order.status = OrderStatus::Paid;
        order.pay_time = Some(util::now_local());

        self.bump_status_tallies(old_status, OrderStatus::Paid).await;
        self.repo.update(&order)?;

        tracing::info!(order_id = %order_id, "Order paid");
        Ok(order)
    }

    /// `PENDING_PAYMENT -> CANCELLED`, restoring stock first.
    ///
    /// Restore runs before the status flip: if the status write then
    /// fails the stock is already back and the cancel can be retried; a
    /// restore failure aborts with no status change.
    pub async fn cancel(&self, order_id: &str) -> AppResult<Order> {
        let mut order = self.load(order_id).await?;
        Self::ensure_transition(&order, OrderStatus::Cancelled)?;

        for line in &order.items {
            self.ledger.restore(&line.product_id, line.quantity).await?;
        }

        let old_status = order.status;
        order.status = OrderStatus::Cancelled;
        order.cancel_time = Some(util::now_local());

        self.bump_status_tallies(old_status, OrderStatus::Cancelled)
            .await;
        self.repo.update(&order)?;

        tracing::info!(order_id = %order_id, "Order cancelled");
        Ok(order)
    }

    /// `PAID -> COMPLETED`, then enqueue for statistics.
    ///
    /// Enqueue failure is logged, not fatal: statistics are
    /// eventually-consistent and must not fail the completion.
    pub async fn complete(&self, order_id: &str) -> AppResult<Order> {
        let mut order = self.load(order_id).await?;
        Self::ensure_transition(&order, OrderStatus::Completed)?;

        let old_status = order.status;
        order.status = OrderStatus::Completed;
        order.complete_time = Some(util::now_local());

        self.bump_status_tallies(old_status, OrderStatus::Completed)
            .await;
        self.repo.update(&order)?;

        if let Err(e) = self.statistics.enqueue(order_id).await {
            tracing::error!(order_id = %order_id, error = %e,
                "Failed to enqueue order for statistics update");
        }

        tracing::info!(order_id = %order_id, "Order completed");
        Ok(order)
    }

    // ========== Queries ==========

    pub async fn get_detail(&self, order_id: &str) -> AppResult<Order> {
        self.load(order_id).await
    }

    /// Newest-first listing, optional status filter, 1-based pages
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        page: usize,
        size: usize,
    ) -> AppResult<OrderPage> {
        let orders = self.repo.list(status, page, size)?;
        Ok(OrderPage {
            orders: orders.iter().map(OrderSummary::from).collect(),
            page,
            size,
        })
    }

    /// Best-effort tallies from the cache; the order table is authoritative
    pub async fn status_counts(&self) -> AppResult<StatusCounts> {
        let read = |value: Option<String>| -> u64 {
            value
                .and_then(|raw| raw.parse::<i64>().ok())
                .map(|n| n.max(0) as u64)
                .unwrap_or(0)
        };

        Ok(StatusCounts {
            total: read(self.cache.get(keys::ORDER_COUNT_TOTAL).await?),
            pending_payment: read(
                self.cache
                    .get(&keys::order_count_status(OrderStatus::PendingPayment))
                    .await?,
            ),
            paid: read(
                self.cache
                    .get(&keys::order_count_status(OrderStatus::Paid))
                    .await?,
            ),
            completed: read(
                self.cache
                    .get(&keys::order_count_status(OrderStatus::Completed))
                    .await?,
            ),
            cancelled: read(
                self.cache
                    .get(&keys::order_count_status(OrderStatus::Cancelled))
                    .await?,
            ),
        })
    }

    // ========== Internals ==========

    async fn load(&self, order_id: &str) -> AppResult<Order> {
        self.repo
            .get_by_id(order_id)?
            .ok_or_else(|| AppError::not_found(format!("order {order_id}")))
    }

    fn ensure_transition(order: &Order, requested: OrderStatus) -> AppResult<()> {
        if !order.can_transition_to(requested) {
            tracing::warn!(order_id = %order.order_id, current = %order.status, requested = %requested,
                "Invalid status transition");
            return Err(AppError::InvalidTransition {
                current: order.status,
                requested,
            });
        }
        Ok(())
    }

    /// Move the cache tallies from `old` to `new`. Bookkeeping only:
    /// failures are logged and never fail the transition.
    async fn bump_status_tallies(&self, old: OrderStatus, new: OrderStatus) {
        let today = util::today_compact();
        self.bump(&keys::order_count_status(old), -1).await;
        self.bump(&keys::order_count_daily_status(&today, old), -1).await;
        self.bump(keys::ORDER_COUNT_TOTAL, 1).await;
        self.bump(&keys::order_count_status(new), 1).await;
        self.bump(&keys::order_count_daily(&today), 1).await;
        self.bump(&keys::order_count_daily_status(&today, new), 1).await;
    }

    async fn bump(&self, key: &str, delta: i64) {
        if let Err(e) = self.cache.incr_by(key, delta).await {
            tracing::warn!(key = %key, error = %e, "Status tally update failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::catalog::ProductRepository;
    use crate::db::ColumnStore;
    use async_trait::async_trait;
    use shared::models::product::ProductCreate;
    use std::collections::HashMap;

    const USER: &str = "000000000001";

    struct Fixture {
        cache: Arc<dyn CacheStore>,
        carts: CartService,
        orders: OrderService,
        ledger: StockLedger,
    }

    async fn fixture() -> Fixture {
        fixture_with_cache(Arc::new(MemoryCache::new())).await
    }

    async fn fixture_with_cache(cache: Arc<dyn CacheStore>) -> Fixture {
        let store = ColumnStore::open_in_memory().unwrap();
        let ledger = StockLedger::new(cache.clone(), keys::STOCK_TTL_SECS);
        let products = Arc::new(ProductRepository::new(
            cache.clone(),
            store.clone(),
            ledger.clone(),
        ));

        for (id, name, price, stock) in [
            ("p1", "Laptop", Decimal::new(1000, 2), 5u32),
            ("p2", "Mouse", Decimal::new(2500, 2), 1),
        ] {
            products
                .create(ProductCreate {
                    id: id.into(),
                    name: name.into(),
                    category: "electronics".into(),
                    brand: "Acme".into(),
                    price,
                    description: None,
                    initial_stock: stock,
                })
                .await
                .unwrap();
        }

        let carts = CartService::new(
            cache.clone(),
            store.clone(),
            products.clone(),
            ledger.clone(),
            keys::CART_TTL_SECS,
        );
        let repo = OrderRepository::new(store);
        let statistics = StatisticsService::new(cache.clone(), repo.clone(), products, 1000);
        let orders = OrderService::new(
            cache.clone(),
            repo,
            carts.clone(),
            ledger.clone(),
            OrderIdGenerator::new(cache.clone()),
            statistics,
        );

        Fixture {
            cache,
            carts,
            orders,
            ledger,
        }
    }

    #[tokio::test]
    async fn create_order_from_cart() {
        let fx = fixture().await;
        fx.carts.add(USER, "p1", 2).await.unwrap();

        let order = fx.orders.create(USER, &["p1".into()]).await.unwrap();

        // 2 × 10.00, no discount
        assert_eq!(order.actual_amount, Decimal::new(2000, 2));
        assert_eq!(order.discount_amount, Decimal::ZERO);
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.order_id.len(), 20);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].line_total, Decimal::new(2000, 2));

        // Cart no longer holds p1, stock reduced by 2
        assert!(fx.carts.get(USER).await.unwrap().is_empty());
        assert_eq!(fx.ledger.peek("p1").await.unwrap(), Some(3));

        // And it round-trips from the repository
        let loaded = fx.orders.get_detail(&order.order_id).await.unwrap();
        assert_eq!(loaded.actual_amount, order.actual_amount);
    }

    #[tokio::test]
    async fn create_rejects_lines_missing_from_cart() {
        let fx = fixture().await;
        fx.carts.add(USER, "p1", 1).await.unwrap();

        let err = fx
            .orders
            .create(USER, &["p1".into(), "p2".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        // Nothing was mutated
        assert_eq!(fx.ledger.peek("p1").await.unwrap(), Some(5));
        assert_eq!(fx.carts.get(USER).await.unwrap().lines.len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_empty_selection() {
        let fx = fixture().await;
        let err = fx.orders.create(USER, &[]).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyCart));
    }

    #[tokio::test]
    async fn create_rejects_insufficient_stock_at_precheck() {
        let fx = fixture().await;
        fx.carts.add(USER, "p2", 1).await.unwrap();
        // A concurrent order takes the last unit before checkout
        assert!(fx.ledger.reserve("p2", 1).await.unwrap());

        let err = fx.orders.create(USER, &["p2".into()]).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));
        assert_eq!(fx.ledger.peek("p2").await.unwrap(), Some(0));
        // Cart untouched
        assert_eq!(fx.carts.get(USER).await.unwrap().lines.len(), 1);
    }

    /// Delegating cache that inflates reads of one stock counter,
    /// simulating a reservation racing in between the pre-check and the
    /// reserve pass.
    struct RacyCache {
        inner: MemoryCache,
        lie_key: String,
        lie_value: String,
    }

    #[async_trait]
    impl CacheStore for RacyCache {
        async fn get(&self, key: &str) -> AppResult<Option<String>> {
            if key == self.lie_key {
                return Ok(Some(self.lie_value.clone()));
            }
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: &str) -> AppResult<()> {
            self.inner.set(key, value).await
        }
        async fn del(&self, key: &str) -> AppResult<()> {
            self.inner.del(key).await
        }
        async fn expire(&self, key: &str, seconds: i64) -> AppResult<()> {
            self.inner.expire(key, seconds).await
        }
        async fn incr_by(&self, key: &str, delta: i64) -> AppResult<i64> {
            self.inner.incr_by(key, delta).await
        }
        async fn incr_by_float(&self, key: &str, delta: f64) -> AppResult<f64> {
            self.inner.incr_by_float(key, delta).await
        }
        async fn check_and_decr(&self, key: &str, amount: i64) -> AppResult<i64> {
            self.inner.check_and_decr(key, amount).await
        }
        async fn hget(&self, key: &str, field: &str) -> AppResult<Option<String>> {
            self.inner.hget(key, field).await
        }
        async fn hset(&self, key: &str, field: &str, value: &str) -> AppResult<()> {
            self.inner.hset(key, field, value).await
        }
        async fn hget_all(&self, key: &str) -> AppResult<HashMap<String, String>> {
            self.inner.hget_all(key).await
        }
        async fn hdel(&self, key: &str, fields: &[&str]) -> AppResult<()> {
            self.inner.hdel(key, fields).await
        }
        async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> AppResult<i64> {
            self.inner.hincr_by(key, field, delta).await
        }
        async fn hincr_by_float(&self, key: &str, field: &str, delta: f64) -> AppResult<f64> {
            self.inner.hincr_by_float(key, field, delta).await
        }
        async fn lpush(&self, key: &str, value: &str) -> AppResult<i64> {
            self.inner.lpush(key, value).await
        }
        async fn rpop(&self, key: &str) -> AppResult<Option<String>> {
            self.inner.rpop(key).await
        }
        async fn llen(&self, key: &str) -> AppResult<i64> {
            self.inner.llen(key).await
        }
        async fn sadd(&self, key: &str, member: &str) -> AppResult<()> {
            self.inner.sadd(key, member).await
        }
        async fn sismember(&self, key: &str, member: &str) -> AppResult<bool> {
            self.inner.sismember(key, member).await
        }
        async fn zincr_by(&self, key: &str, member: &str, delta: f64) -> AppResult<f64> {
            self.inner.zincr_by(key, member, delta).await
        }
        async fn zrevrange(&self, key: &str, start: isize, stop: isize) -> AppResult<Vec<String>> {
            self.inner.zrevrange(key, start, stop).await
        }
    }

    /// Creation is atomic w.r.t. stock: when a reservation fails after
    /// the pre-check (the narrow race window), every reservation already
    /// taken for the attempt is restored.
    #[tokio::test]
    async fn create_rolls_back_partial_reservations() {
        let racy = Arc::new(RacyCache {
            inner: MemoryCache::new(),
            // peek sees one unit of p2 even though the counter is drained
            lie_key: keys::stock("p2"),
            lie_value: "1".to_string(),
        });
        let fx = fixture_with_cache(racy).await;

        fx.carts.add(USER, "p1", 2).await.unwrap();
        fx.carts.add(USER, "p2", 1).await.unwrap();
        // Drain p2 for real; the pre-check still sees the lied value
        assert_eq!(
            fx.cache.check_and_decr(&keys::stock("p2"), 1).await.unwrap(),
            0
        );

        let err = fx
            .orders
            .create(USER, &["p1".into(), "p2".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));

        // p1's reservation was rolled back; stock level equals the
        // pre-attempt level (read through the inner cache, not the lie)
        assert_eq!(
            fx.cache.get(&keys::stock("p1")).await.unwrap().as_deref(),
            Some("5")
        );
        // Cart untouched
        assert_eq!(fx.carts.get(USER).await.unwrap().lines.len(), 2);
    }

    #[tokio::test]
    async fn pay_happy_path_and_double_pay() {
        let fx = fixture().await;
        fx.carts.add(USER, "p1", 1).await.unwrap();
        let order = fx.orders.create(USER, &["p1".into()]).await.unwrap();

        let paid = fx.orders.pay(&order.order_id).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert!(paid.pay_time.is_some());

        let err = fx.orders.pay(&order.order_id).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                current: OrderStatus::Paid,
                requested: OrderStatus::Paid,
            }
        ));
    }

    #[tokio::test]
    async fn pay_unknown_order_is_not_found() {
        let fx = fixture().await;
        assert!(matches!(
            fx.orders.pay("20260101000000000001").await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn cancel_after_pay_is_rejected() {
        let fx = fixture().await;
        fx.carts.add(USER, "p1", 1).await.unwrap();
        let order = fx.orders.create(USER, &["p1".into()]).await.unwrap();
        fx.orders.pay(&order.order_id).await.unwrap();

        let err = fx.orders.cancel(&order.order_id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn cancel_restores_stock_for_every_line() {
        let fx = fixture().await;
        fx.carts.add(USER, "p1", 2).await.unwrap();
        fx.carts.add(USER, "p2", 1).await.unwrap();
        let order = fx
            .orders
            .create(USER, &["p1".into(), "p2".into()])
            .await
            .unwrap();
        assert_eq!(fx.ledger.peek("p1").await.unwrap(), Some(3));
        assert_eq!(fx.ledger.peek("p2").await.unwrap(), Some(0));

        let cancelled = fx.orders.cancel(&order.order_id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.cancel_time.is_some());
        assert_eq!(fx.ledger.peek("p1").await.unwrap(), Some(5));
        assert_eq!(fx.ledger.peek("p2").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn complete_enqueues_for_statistics() {
        let fx = fixture().await;
        fx.carts.add(USER, "p1", 2).await.unwrap();
        let order = fx.orders.create(USER, &["p1".into()]).await.unwrap();
        fx.orders.pay(&order.order_id).await.unwrap();

        let completed = fx.orders.complete(&order.order_id).await.unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);
        assert!(completed.complete_time.is_some());

        assert_eq!(fx.cache.llen(keys::UPDATE_QUEUE).await.unwrap(), 1);
        assert_eq!(
            fx.cache.rpop(keys::UPDATE_QUEUE).await.unwrap().as_deref(),
            Some(order.order_id.as_str())
        );
    }

    #[tokio::test]
    async fn complete_from_pending_is_rejected() {
        let fx = fixture().await;
        fx.carts.add(USER, "p1", 1).await.unwrap();
        let order = fx.orders.create(USER, &["p1".into()]).await.unwrap();

        let err = fx.orders.complete(&order.order_id).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                current: OrderStatus::PendingPayment,
                requested: OrderStatus::Completed,
            }
        ));
    }

    #[tokio::test]
    async fn list_and_status_counts() {
        let fx = fixture().await;
        fx.carts.add(USER, "p1", 1).await.unwrap();
        let order = fx.orders.create(USER, &["p1".into()]).await.unwrap();
        fx.orders.pay(&order.order_id).await.unwrap();

        let page = fx.orders.list(Some(OrderStatus::Paid), 1, 10).await.unwrap();
        assert_eq!(page.orders.len(), 1);
        assert_eq!(page.orders[0].order_id, order.order_id);

        let empty = fx
            .orders
            .list(Some(OrderStatus::Cancelled), 1, 10)
            .await
            .unwrap();
        assert!(empty.orders.is_empty());

        let counts = fx.orders.status_counts().await.unwrap();
        assert_eq!(counts.paid, 1);
        assert_eq!(counts.total, 1);
    }
}
