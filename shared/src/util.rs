//! Time helpers shared across the workspace
//!
//! The original wire formats are kept: compact day buckets (`yyyyMMdd`),
//! second-precision id prefixes (`yyyyMMddHHmmss`) and human-readable
//! column timestamps (`yyyy-MM-dd HH:mm:ss`), all in local time.

use chrono::NaiveDateTime;

/// Compact day bucket format, e.g. `20260107`
pub const COMPACT_DATE: &str = "%Y%m%d";

/// Second-precision compact format, e.g. `20260107103000`
pub const COMPACT_DATETIME: &str = "%Y%m%d%H%M%S";

/// Column timestamp format, e.g. `2026-01-07 10:30:00`
pub const DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current local wall-clock time, second precision dropped to naive
pub fn now_local() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Today's compact day bucket in local time
pub fn today_compact() -> String {
    chrono::Local::now().format(COMPACT_DATE).to_string()
}

pub fn format_datetime(t: &NaiveDateTime) -> String {
    t.format(DATETIME).to_string()
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME).ok()
}

/// Compact day bucket for an arbitrary timestamp
pub fn compact_date(t: &NaiveDateTime) -> String {
    t.format(COMPACT_DATE).to_string()
}
