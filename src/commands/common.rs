// Common helpers for commands

/// Get current timestamp in milliseconds
pub fn now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
