//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and
//! production environments.

use std::path::Path;

/// Initialize the logger; logs roll daily into `log_dir` when provided
/// and the directory exists, otherwise go to stdout.
pub fn init(log_level: &str, log_dir: Option<&str>) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level.parse().unwrap_or(tracing::Level::INFO))
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        if Path::new(dir).exists() {
            let file_appender = tracing_appender::rolling::daily(dir, "store-server");
            subscriber.with_writer(file_appender).init();
            return;
        }
        eprintln!("Log directory {dir} does not exist, logging to stdout");
    }

    subscriber.init();
}
