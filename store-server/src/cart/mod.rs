//! Cart - dual-write between cache and column store
//!
//! The cache hash `cart:{userId}` is the low-latency working copy; the
//! `cart_data` row is the durable copy that survives cache eviction.
//! Every mutation validates first, applies to the cache, then rewrites
//! the entire durable row; a durable-store failure reverts the cache from
//! the pre-mutation snapshot so the two stores never diverge in the
//! durable direction. Reads are cache-first with a read-through fill from
//! the durable row on a miss.
//!
//! Concurrent edits to the same user's cart are last-writer-wins on the
//! durable copy. Accepted for a single-user-per-cart system; adding a
//! per-cart lock would be the fix if that ever changes.

mod service;

pub use service::CartService;
