//! Order persistence in the column store
//!
//! # Row addressing
//!
//! Row key: `{yyyyMMdd of create_time}_{last 6 digits of order id}_{write millis}`.
//! Lexicographic order approximates chronological order within a day, and
//! the logical order id is NOT the physical key. `get_by_id` and `update`
//! resolve the physical row by scanning the id's date prefix and filtering
//! on the `base:order_id` column; `update` rewrites the located row and
//! never derives a fresh key, which would duplicate the order.
//!
//! # Forward compatibility
//!
//! Missing optional columns default on read (zero amounts, absent
//! timestamps) so rows written before a schema addition stay readable. A
//! row without `base:order_id` is unparsable and skipped, never
//! fabricated.

use crate::db::{ColumnStore, Row, TableKind};
use rust_decimal::Decimal;
use shared::models::order::{Order, OrderLine, OrderStatus};
use shared::{AppError, AppResult, util};

const CF_BASE: &str = "base";
const CF_ADDR: &str = "addr";
const CF_ITEMS: &str = "items";

#[derive(Clone)]
pub struct OrderRepository {
    store: ColumnStore,
}

impl OrderRepository {
    pub fn new(store: ColumnStore) -> Self {
        Self { store }
    }

    /// Persist a freshly created order under a new row key
    pub fn save(&self, order: &Order) -> AppResult<()> {
        let row_key = Self::row_key(order);
        let row = Self::to_row(order)?;
        self.store.put_row(TableKind::Orders, &row_key, &row)?;
        tracing::info!(order_id = %order.order_id, row_key = %row_key, "Order saved");
        Ok(())
    }

    pub fn get_by_id(&self, order_id: &str) -> AppResult<Option<Order>> {
        match self.locate(order_id)? {
            Some((_, row)) => Ok(Self::parse_order(&row)),
            None => Ok(None),
        }
    }

    /// Update status and timestamp columns of an existing order in place
    pub fn update(&self, order: &Order) -> AppResult<()> {
        let Some((row_key, mut row)) = self.locate(&order.order_id)? else {
            return Err(AppError::not_found(format!("order {}", order.order_id)));
        };

        row.put(CF_BASE, "status", order.status.as_str());
        if let Some(pay_time) = &order.pay_time {
            row.put(CF_BASE, "pay_time", util::format_datetime(pay_time));
        }
        if let Some(cancel_time) = &order.cancel_time {
            row.put(CF_BASE, "cancel_time", util::format_datetime(cancel_time));
        }
        if let Some(complete_time) = &order.complete_time {
            row.put(CF_BASE, "complete_time", util::format_datetime(complete_time));
        }

        self.store.put_row(TableKind::Orders, &row_key, &row)?;
        tracing::info!(order_id = %order.order_id, status = %order.status, "Order updated");
        Ok(())
    }

    /// Newest-first listing with optional status filter, 1-based pages
    pub fn list(
        &self,
        status: Option<OrderStatus>,
        page: usize,
        size: usize,
    ) -> AppResult<Vec<Order>> {
        let skip = page.saturating_sub(1).saturating_mul(size);
        let mut matched = 0usize;
        let mut orders = Vec::new();

        self.store.for_each_reverse(TableKind::Orders, |_key, row| {
            let Some(order) = Self::parse_order(&row) else {
                return true;
            };
            if let Some(want) = status {
                if order.status != want {
                    return true;
                }
            }
            if matched < skip {
                matched += 1;
                return true;
            }
            orders.push(order);
            orders.len() < size
        })?;

        Ok(orders)
    }

    /// Fold every completed order into `(total actual amount, count)`.
    ///
    /// Cold-start fallback for the statistics totals; scans the whole
    /// table, so it only runs when the cache has no running total.
    pub fn fold_completed(&self) -> AppResult<(Decimal, u64)> {
        let mut total = Decimal::ZERO;
        let mut count = 0u64;
        self.store.for_each_reverse(TableKind::Orders, |_key, row| {
            if let Some(order) = Self::parse_order(&row) {
                if order.status == OrderStatus::Completed {
                    total += order.actual_amount;
                    count += 1;
                }
            }
            true
        })?;
        Ok((total, count))
    }

    // ========== Row mapping ==========

    fn row_key(order: &Order) -> String {
        let date = order.create_time.format(util::COMPACT_DATE);
        let id = &order.order_id;
        let sequence = id.get(id.len().saturating_sub(6)..).unwrap_or("000000");
        format!("{date}_{sequence}_{}", util::now_millis())
    }

    /// Locate the physical row holding an order by scanning its date prefix
    fn locate(&self, order_id: &str) -> AppResult<Option<(String, Row)>> {
        let prefix = order_id.get(..8).unwrap_or(order_id);
        for (row_key, row) in self.store.scan_prefix(TableKind::Orders, prefix)? {
            if row.get(CF_BASE, "order_id") == Some(order_id) {
                return Ok(Some((row_key, row)));
            }
        }
        Ok(None)
    }

    fn to_row(order: &Order) -> AppResult<Row> {
        let mut row = Row::new();

        row.put(CF_BASE, "order_id", &order.order_id);
        row.put(CF_BASE, "user_id", &order.user_id);
        row.put(CF_BASE, "total_amount", order.total_amount.to_string());
        row.put(CF_BASE, "discount_amount", order.discount_amount.to_string());
        row.put(CF_BASE, "actual_amount", order.actual_amount.to_string());
        row.put(CF_BASE, "status", order.status.as_str());
        row.put(CF_BASE, "create_time", util::format_datetime(&order.create_time));
        if let Some(pay_time) = &order.pay_time {
            row.put(CF_BASE, "pay_time", util::format_datetime(pay_time));
        }
        if let Some(cancel_time) = &order.cancel_time {
            row.put(CF_BASE, "cancel_time", util::format_datetime(cancel_time));
        }
        if let Some(complete_time) = &order.complete_time {
            row.put(CF_BASE, "complete_time", util::format_datetime(complete_time));
        }

        row.put(CF_ADDR, "receiver", &order.receiver);
        row.put(CF_ADDR, "phone", &order.phone);
        row.put(CF_ADDR, "address", &order.address);
        row.put(CF_ADDR, "postcode", &order.postcode);

        if !order.items.is_empty() {
            row.put(CF_ITEMS, "items_json", serde_json::to_string(&order.items)?);
            row.put(CF_ITEMS, "item_count", order.items.len().to_string());
        }

        Ok(row)
    }

    fn parse_order(row: &Row) -> Option<Order> {
        let Some(order_id) = row.get(CF_BASE, "order_id") else {
            tracing::warn!("Order row without order_id column skipped");
            return None;
        };

        let amount = |qualifier: &str| -> Decimal {
            row.get(CF_BASE, qualifier)
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(Decimal::ZERO)
        };
        let time = |qualifier: &str| row.get(CF_BASE, qualifier).and_then(util::parse_datetime);

        let items: Vec<OrderLine> = row
            .get(CF_ITEMS, "items_json")
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();

        Some(Order {
            order_id: order_id.to_string(),
            user_id: row.get(CF_BASE, "user_id").unwrap_or_default().to_string(),
            total_amount: amount("total_amount"),
            discount_amount: amount("discount_amount"),
            actual_amount: amount("actual_amount"),
            status: row
                .get(CF_BASE, "status")
                .and_then(OrderStatus::parse)
                .unwrap_or(OrderStatus::PendingPayment),
            create_time: time("create_time")
                .unwrap_or_else(|| chrono::DateTime::<chrono::Utc>::UNIX_EPOCH.naive_utc()),
            pay_time: time("pay_time"),
            cancel_time: time("cancel_time"),
            complete_time: time("complete_time"),
            receiver: row.get(CF_ADDR, "receiver").unwrap_or_default().to_string(),
            phone: row.get(CF_ADDR, "phone").unwrap_or_default().to_string(),
            address: row.get(CF_ADDR, "address").unwrap_or_default().to_string(),
            postcode: row.get(CF_ADDR, "postcode").unwrap_or_default().to_string(),
            items,
        })
    }
}
