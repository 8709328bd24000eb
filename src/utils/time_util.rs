use std::time::{SystemTime, UNIX_EPOCH};

/// seconds since `1970-1-1 00:00:00`,named as [UNIX_EPOCH]
/// a clock set before the epoch reads as 0
pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
