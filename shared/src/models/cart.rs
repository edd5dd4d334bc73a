//! Cart Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_selected() -> bool {
    true
}

/// One cart line, keyed by product id within a user's cart
///
/// This is the stored form: serialized as JSON both into the cache hash
/// field and into the durable cart row. Rows written before the
/// `selected` column existed deserialize with `selected = true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u32,
    /// Epoch millis of first add
    pub added_at: i64,
    #[serde(default = "default_selected")]
    pub selected: bool,
}

/// Cart line joined with catalog data for read views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineView {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub brand: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub added_at: i64,
    pub selected: bool,
}

/// Full cart read model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSummary {
    pub user_id: String,
    pub lines: Vec<CartLineView>,
    pub total_quantity: u32,
    pub total_amount: Decimal,
}

impl CartSummary {
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            lines: Vec::new(),
            total_quantity: 0,
            total_amount: Decimal::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
