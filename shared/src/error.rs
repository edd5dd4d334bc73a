//! Unified error system for the storefront core
//!
//! One application-level error type with a stable code per variant:
//!
//! | Range | Category | Examples |
//! |-------|----------|----------|
//! | E1xxx | Validation | bad input, empty cart, insufficient stock |
//! | E2xxx | Not found | unknown order id |
//! | E3xxx | Business rule | invalid status transition, creation failure |
//! | E9xxx | Infrastructure | cache/storage/serialization failures |
//!
//! Validation and not-found errors are caller-visible and never retried.
//! Infrastructure errors trigger compensation where one exists (stock
//! restore, cart revert) and are re-raised after the compensation attempt.
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCategory};
//!
//! let err = AppError::not_found("order 20260101120000000001");
//! assert_eq!(err.code(), "E2001");
//! assert_eq!(err.category(), ErrorCategory::NotFound);
//! ```

use crate::models::order::OrderStatus;
use thiserror::Error;

/// Application-level Result type
pub type AppResult<T> = Result<T, AppError>;

/// Error classification, used by callers to pick response semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input or violated business precondition (400-style)
    Validation,
    /// Referenced resource does not exist (404-style)
    NotFound,
    /// State machine rule violation (409-style)
    Conflict,
    /// Store unreachable, serialization failure (500-style)
    Infrastructure,
}

/// Unified application error
#[derive(Debug, Error)]
pub enum AppError {
    // ========== Validation errors ==========
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },

    // ========== Not-found errors ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    // ========== Business rule errors ==========
    /// State machine violation, carries current vs. requested status
    #[error("Invalid order status transition: {current} -> {requested}")]
    InvalidTransition {
        current: OrderStatus,
        requested: OrderStatus,
    },

    /// Order creation failed after compensation ran
    #[error("Order creation failed: {0}")]
    OrderCreation(String),

    // ========== Infrastructure errors ==========
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    // ========== Convenient constructors ==========

    /// Create a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a NotFound error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create a Cache error
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache(message.into())
    }

    /// Create a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create an OrderCreation error
    pub fn order_creation(message: impl Into<String>) -> Self {
        Self::OrderCreation(message.into())
    }

    // ========== Error inspection ==========

    /// Stable error code for this variant
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E1001",
            Self::EmptyCart => "E1002",
            Self::InsufficientStock { .. } => "E1003",
            Self::NotFound(_) => "E2001",
            Self::InvalidTransition { .. } => "E3001",
            Self::OrderCreation(_) => "E3002",
            Self::Cache(_) => "E9001",
            Self::Storage(_) => "E9002",
            Self::Serialization(_) => "E9003",
        }
    }

    /// Classify the error by domain
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::EmptyCart | Self::InsufficientStock { .. } => {
                ErrorCategory::Validation
            }
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::InvalidTransition { .. } => ErrorCategory::Conflict,
            Self::OrderCreation(_) | Self::Cache(_) | Self::Storage(_) | Self::Serialization(_) => {
                ErrorCategory::Infrastructure
            }
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(AppError::validation("x").code(), "E1001");
        assert_eq!(AppError::EmptyCart.code(), "E1002");
        assert_eq!(AppError::not_found("x").code(), "E2001");
        assert_eq!(AppError::cache("x").code(), "E9001");
    }

    #[test]
    fn categories_match_taxonomy() {
        let insufficient = AppError::InsufficientStock {
            product_id: "p1".into(),
            requested: 3,
            available: 1,
        };
        assert_eq!(insufficient.category(), ErrorCategory::Validation);

        let transition = AppError::InvalidTransition {
            current: OrderStatus::Completed,
            requested: OrderStatus::Paid,
        };
        assert_eq!(transition.category(), ErrorCategory::Conflict);
        assert_eq!(
            AppError::storage("down").category(),
            ErrorCategory::Infrastructure
        );
    }
}
