//! End-to-end order flow against in-memory backends
//!
//! Covers the full path: seed catalog and stock, build a cart, create an
//! order, pay, complete, then drain the statistics pipeline (twice, to
//! prove idempotence).

use rust_decimal::Decimal;
use shared::models::order::OrderStatus;
use shared::models::product::ProductCreate;
use std::sync::Arc;
use store_server::cache::{CacheStore, MemoryCache, keys};
use store_server::{AppState, ColumnStore, Config};

const USER: &str = "000000000001";

fn test_config() -> Config {
    Config {
        redis_url: "redis://unused".into(),
        data_dir: "/tmp/unused".into(),
        environment: "development".into(),
        log_level: "info".into(),
        log_dir: None,
        cart_ttl_secs: 604_800,
        stock_ttl_secs: 3_600,
        stats_drain_interval_secs: 20,
        stats_drain_batch_size: 1000,
    }
}

fn state() -> AppState {
    AppState::new(
        test_config(),
        Arc::new(MemoryCache::new()),
        ColumnStore::open_in_memory().unwrap(),
    )
}

async fn seed_product(state: &AppState, id: &str, name: &str, price: Decimal, stock: u32) {
    state
        .products
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

#[tokio::test]
async fn full_lifecycle_with_statistics() {
    let state = state();
    seed_product(&state, "p1", "Laptop", Decimal::new(1000, 2), 5).await;

    // Cart: p1 × 2 at 10.00
    state.carts.add(USER, "p1", 2).await.unwrap();
    let cart = state.carts.get(USER).await.unwrap();
    assert_eq!(cart.total_amount, Decimal::new(2000, 2));

    // Create: actualAmount 20.00, cart emptied, stock 5 -> 3
    let order = state.orders.create(USER, &["p1".into()]).await.unwrap();
    assert_eq!(order.actual_amount, Decimal::new(2000, 2));
    assert_eq!(order.status, OrderStatus::PendingPayment);
    assert!(state.carts.get(USER).await.unwrap().is_empty());
    assert_eq!(state.ledger.peek("p1").await.unwrap(), Some(3));

    // Pay, complete
    let paid = state.orders.pay(&order.order_id).await.unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);

    let completed = state.orders.complete(&order.order_id).await.unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);
    assert!(completed.complete_time.is_some());

    // The order id reached the statistics queue
    assert_eq!(state.cache.llen(keys::UPDATE_QUEUE).await.unwrap(), 1);

    // Drain twice before the dedup TTL expires: totals move exactly once
    assert_eq!(state.statistics.drain().await.unwrap(), 1);
    state.statistics.enqueue(&order.order_id).await.unwrap();
    assert_eq!(state.statistics.drain().await.unwrap(), 0);

    let totals = state.statistics.total_sales().await.unwrap();
    assert_eq!(totals.total_sales, Decimal::new(2000, 2));
    assert_eq!(totals.completed_orders, 1);

    let daily = state.statistics.daily_sales(None).await.unwrap();
    assert_eq!(daily.orders, 1);
    assert_eq!(daily.sales, Decimal::new(2000, 2));

    let top = state.statistics.top_products(5).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].product_id, "p1");
    assert_eq!(top[0].total_quantity, 2);

    // Completed is terminal
    assert!(state.orders.cancel(&order.order_id).await.is_err());
    assert!(state.orders.pay(&order.order_id).await.is_err());
}

#[tokio::test]
async fn cancel_flow_returns_stock() {
    let state = state();
    seed_product(&state, "p1", "Laptop", Decimal::new(1000, 2), 5).await;
    seed_product(&state, "p2", "Mouse", Decimal::new(2500, 2), 2).await;

    state.carts.add(USER, "p1", 3).await.unwrap();
    state.carts.add(USER, "p2", 2).await.unwrap();

    let order = state
        .orders
        .create(USER, &["p1".into(), "p2".into()])
        .await
        .unwrap();
    assert_eq!(order.actual_amount, Decimal::new(8000, 2));
    assert_eq!(state.ledger.peek("p1").await.unwrap(), Some(2));
    assert_eq!(state.ledger.peek("p2").await.unwrap(), Some(0));

    let cancelled = state.orders.cancel(&order.order_id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(state.ledger.peek("p1").await.unwrap(), Some(5));
    assert_eq!(state.ledger.peek("p2").await.unwrap(), Some(2));

    // A cancelled order never reaches the statistics queue
    assert_eq!(state.cache.llen(keys::UPDATE_QUEUE).await.unwrap(), 0);

    // Terminal: no further transitions
    assert!(state.orders.pay(&order.order_id).await.is_err());
}

#[tokio::test]
async fn durable_stores_survive_cache_eviction() {
    let state = state();
    seed_product(&state, "p1", "Laptop", Decimal::new(1000, 2), 5).await;
    state.carts.add(USER, "p1", 2).await.unwrap();

    // Wipe every hot key, as if the cache restarted
    state.cache.del(&keys::cart(USER)).await.unwrap();
    state.cache.del(&keys::product_cache("p1")).await.unwrap();

    // The cart refills from the durable row, products from their table
    let cart = state.carts.get(USER).await.unwrap();
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].product_name, "Laptop");
    assert_eq!(cart.total_amount, Decimal::new(2000, 2));
}
