//! Data models
//!
//! Shared between the server crate and its tests. Money fields use
//! `rust_decimal::Decimal`; timestamps follow the original wire formats
//! (`yyyy-MM-dd HH:mm:ss` datetimes, epoch-millis counters).

pub mod cart;
pub mod order;
pub mod product;
pub mod statistics;

// Re-exports
pub use cart::*;
pub use order::*;
pub use product::*;
pub use statistics::*;
