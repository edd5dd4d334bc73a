//! Shared types for the storefront order core
//!
//! Domain models, the unified error taxonomy, and small utilities used
//! across the workspace.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCategory};
pub use serde::{Deserialize, Serialize};
