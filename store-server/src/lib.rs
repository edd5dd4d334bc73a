//! Storefront order-processing core
//!
//! Reserves inventory, creates orders from a cart, drives orders through
//! a payment/cancel/complete lifecycle and rolls completed orders into
//! sales statistics. Hot state (cart hashes, stock counters, tallies,
//! running aggregates) lives in the cache; orders and products live in
//! the column store as the system of record. There is no transaction
//! across the two, so every cross-store sequence compensates explicitly
//! (see [`saga`]).
//!
//! # Module structure
//!
//! ```text
//! store-server/src/
//! ├── core/          # configuration, state wiring
//! ├── cache/         # CacheStore trait, Redis and in-memory backends, key schema
//! ├── db/            # column store over redb
//! ├── stock.rs       # atomic stock ledger
//! ├── saga.rs        # reverse-order compensation primitive
//! ├── catalog/       # product repository and lookup trait
//! ├── cart/          # cart dual-write service
//! ├── orders/        # id generator, repository, lifecycle service
//! ├── statistics/    # queue + dedup pipeline and drain worker
//! └── utils/         # logging
//! ```

pub mod cache;
pub mod cart;
pub mod catalog;
pub mod core;
pub mod db;
pub mod orders;
pub mod saga;
pub mod statistics;
pub mod stock;
pub mod utils;

// Re-export public types
pub use cache::{CacheStore, MemoryCache, RedisCache};
pub use cart::CartService;
pub use catalog::{ProductCatalog, ProductRepository};
pub use self::core::{AppState, Config};
pub use db::ColumnStore;
pub use orders::{OrderIdGenerator, OrderRepository, OrderService};
pub use saga::Saga;
pub use statistics::{StatisticsService, StatisticsWorker};
pub use stock::StockLedger;
