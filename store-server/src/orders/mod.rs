//! Orders - lifecycle state machine and persistence
//!
//! # Flow
//!
//! ```text
//! create(user, product_ids)
//!     ├─ 1. Load cart, validate selection (missing lines vs. empty cart)
//!     ├─ 2. Stock pre-check (peek, best-effort early rejection)
//!     ├─ 3. Compute totals, generate order id
//!     ├─ 4. Reserve stock per line, recording a restore compensation
//!     ├─ 5. Persist the order row
//!     ├─ 6. Remove ordered lines from the cart
//!     └─ any failure after 4 ⇒ saga restores every reservation
//!
//! pay / cancel / complete
//!     ├─ existence check, state machine check
//!     ├─ cancel restores stock BEFORE flipping status
//!     ├─ best-effort status tallies in the cache
//!     └─ complete enqueues the order id for statistics
//! ```

pub mod id_gen;
pub mod repository;
pub mod service;

pub use id_gen::OrderIdGenerator;
pub use repository::OrderRepository;
pub use service::OrderService;
