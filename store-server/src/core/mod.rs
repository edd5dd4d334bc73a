//! Configuration and wiring

pub mod config;
pub mod state;

pub use config::Config;
pub use state::AppState;
