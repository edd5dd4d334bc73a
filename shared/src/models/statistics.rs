//! Statistics read models
//!
//! Aggregates maintained incrementally by the statistics pipeline.
//! `last_update` fields carry epoch millis, matching the cache
//! representation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Running totals over all completed orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalSales {
    pub total_sales: Decimal,
    pub completed_orders: u64,
    pub last_update: i64,
}

/// One day's sales rollup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySales {
    /// Day bucket, `yyyyMMdd`
    pub date: String,
    pub sales: Decimal,
    pub orders: u64,
    pub average_order_value: Decimal,
    pub last_update: i64,
}

/// One day's completed-order count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyOrders {
    pub date: String,
    pub orders: u64,
    pub last_update: i64,
}

/// One entry of the per-product sales ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopProduct {
    pub rank: u32,
    pub product_id: String,
    /// Backfilled lazily from the catalog; may be absent for stale entries
    pub product_name: Option<String>,
    /// Cumulative quantity sold
    pub total_quantity: u64,
    pub last_update: Option<i64>,
}

/// Best-effort order tallies kept in the cache
///
/// Bookkeeping only; the order table is authoritative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: u64,
    pub pending_payment: u64,
    pub paid: u64,
    pub completed: u64,
    pub cancelled: u64,
}
