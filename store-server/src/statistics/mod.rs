//! Statistics pipeline - enqueue, dedup, scheduled batch aggregation
//!
//! Completion enqueues the order id onto a durable cache list; a
//! fixed-interval worker drains up to a bounded batch per tick. A per-day
//! dedup set makes the aggregation idempotent per order, so duplicate
//! enqueues (or a drain racing a retry) never double-count. Decoupling
//! the latency-sensitive completion path from the aggregation work is the
//! point: the consumer may lag, the queue absorbs it.
//!
//! The polling model is deliberate - bounded latency without a message
//! broker - and should stay a poll unless requirements change.

pub mod service;
pub mod worker;

pub use service::StatisticsService;
pub use worker::StatisticsWorker;
