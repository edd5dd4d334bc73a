//! Order Model

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order status state machine
///
/// ```text
/// PENDING_PAYMENT ──pay──▶ PAID ──complete──▶ COMPLETED
///        │
///        └──cancel──▶ CANCELLED
/// ```
///
/// `COMPLETED` and `CANCELLED` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::PendingPayment,
        OrderStatus::Paid,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Whether a transition from `self` to `next` is allowed
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        match self {
            OrderStatus::PendingPayment => {
                matches!(next, OrderStatus::Paid | OrderStatus::Cancelled)
            }
            OrderStatus::Paid => matches!(next, OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Wire representation, also used in cache keys and column values
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::Paid => "PAID",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING_PAYMENT" => Some(OrderStatus::PendingPayment),
            "PAID" => Some(OrderStatus::Paid),
            "COMPLETED" => Some(OrderStatus::Completed),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order line item, immutable once the order is created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub brand: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    /// unit_price × quantity
    pub line_total: Decimal,
}

/// Order aggregate
///
/// Created at checkout, mutated only through lifecycle transitions,
/// never physically deleted (terminal states are retained for audit and
/// statistics).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub user_id: String,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    /// total_amount − discount_amount
    pub actual_amount: Decimal,
    pub status: OrderStatus,
    pub create_time: NaiveDateTime,
    pub pay_time: Option<NaiveDateTime>,
    pub cancel_time: Option<NaiveDateTime>,
    pub complete_time: Option<NaiveDateTime>,

    // Shipping
    pub receiver: String,
    pub phone: String,
    pub address: String,
    pub postcode: String,

    pub items: Vec<OrderLine>,
}

impl Order {
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.status.can_transition_to(next)
    }
}

/// Compact order row for list views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: String,
    pub total_amount: Decimal,
    pub actual_amount: Decimal,
    pub status: OrderStatus,
    pub create_time: NaiveDateTime,
    pub item_count: usize,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            total_amount: order.total_amount,
            actual_amount: order.actual_amount,
            status: order.status,
            create_time: order.create_time,
            item_count: order.items.len(),
        }
    }
}

/// Paginated order list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<OrderSummary>,
    pub page: usize,
    pub size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_matrix() {
        use OrderStatus::*;

        assert!(PendingPayment.can_transition_to(Paid));
        assert!(PendingPayment.can_transition_to(Cancelled));
        assert!(!PendingPayment.can_transition_to(Completed));

        assert!(Paid.can_transition_to(Completed));
        assert!(!Paid.can_transition_to(Cancelled));
        assert!(!Paid.can_transition_to(PendingPayment));

        for status in OrderStatus::ALL {
            assert!(!Completed.can_transition_to(status));
            assert!(!Cancelled.can_transition_to(status));
        }
    }

    #[test]
    fn status_round_trips_through_wire_form() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("SHIPPED"), None);
    }
}
