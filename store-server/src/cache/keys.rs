//! Cache key schema
//!
//! Namespacing by concern:
//!
//! | Key | Type | TTL |
//! |-----|------|-----|
//! | `cart:{userId}` | hash productId -> cart line JSON | 7 days, refreshed on mutation |
//! | `stock:{productId}` | integer string | 1 hour |
//! | `product:cache:{productId}` | hash of product fields | 5 minutes |
//! | `order:seq:{yyyyMMddHHmmss}` | integer counter | 2 seconds |
//! | `order:count:*` | integer tallies | none |
//! | `statistics:sales:total[*]` | running totals | none |
//! | `statistics:sales:daily:{yyyyMMdd}` | hash {sales, orders, lastUpdate} | 30 days |
//! | `statistics:product:sales:rank` | zset member=productId score=quantity | none |
//! | `statistics:product:sales:{productId}` | hash {name, totalSales, lastUpdate} | none |
//! | `statistics:update:queue` | list of pending orderIds | none |
//! | `statistics:processed:orders:{yyyyMMdd}` | set of orderIds | 24 hours |

use shared::models::order::OrderStatus;

// ========== Default TTLs (seconds) ==========

pub const CART_TTL_SECS: i64 = 604_800; // 7 days
pub const STOCK_TTL_SECS: i64 = 3_600; // 1 hour
pub const PRODUCT_CACHE_TTL_SECS: i64 = 300; // 5 minutes
pub const ORDER_SEQ_TTL_SECS: i64 = 2; // each second's sequence space is independent
pub const DAILY_STATS_TTL_SECS: i64 = 2_592_000; // 30 days
pub const PROCESSED_ORDERS_TTL_SECS: i64 = 86_400; // 24 hours

// ========== Fixed keys ==========

pub const SALES_TOTAL: &str = "statistics:sales:total";
pub const SALES_TOTAL_COUNT: &str = "statistics:sales:total:count";
pub const SALES_TOTAL_UPDATE: &str = "statistics:sales:total:update";
pub const PRODUCT_SALES_RANK: &str = "statistics:product:sales:rank";
pub const UPDATE_QUEUE: &str = "statistics:update:queue";
pub const ORDER_COUNT_TOTAL: &str = "order:count:total";

// ========== Key builders ==========

pub fn cart(user_id: &str) -> String {
    format!("cart:{user_id}")
}

pub fn stock(product_id: &str) -> String {
    format!("stock:{product_id}")
}

pub fn product_cache(product_id: &str) -> String {
    format!("product:cache:{product_id}")
}

/// Sequence counter namespaced by the second-precision timestamp prefix
pub fn order_seq(timestamp: &str) -> String {
    format!("order:seq:{timestamp}")
}

pub fn order_count_status(status: OrderStatus) -> String {
    format!("order:count:status:{status}")
}

pub fn order_count_daily(date: &str) -> String {
    format!("order:count:daily:{date}")
}

pub fn order_count_daily_status(date: &str, status: OrderStatus) -> String {
    format!("order:count:daily:{date}:{status}")
}

pub fn sales_daily(date: &str) -> String {
    format!("statistics:sales:daily:{date}")
}

pub fn product_sales(product_id: &str) -> String {
    format!("statistics:product:sales:{product_id}")
}

pub fn processed_orders(date: &str) -> String {
    format!("statistics:processed:orders:{date}")
}
