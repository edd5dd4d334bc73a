//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product listing status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Active => "ACTIVE",
            ProductStatus::Inactive => "INACTIVE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(ProductStatus::Active),
            "INACTIVE" => Some(ProductStatus::Inactive),
            _ => None,
        }
    }
}

/// Product entity
///
/// Image binaries live in an external object store and are not handled by
/// this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub brand: String,
    pub price: Decimal,
    pub status: ProductStatus,
    pub description: Option<String>,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub id: String,
    pub name: String,
    pub category: String,
    pub brand: String,
    pub price: Decimal,
    pub description: Option<String>,
    /// Seeds the stock counter at creation
    pub initial_stock: u32,
}
