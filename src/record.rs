// Record identity for anything persisted in a listings log

use serde::{Serialize, de::DeserializeOwned};

/// Core trait that any record kept in a JSONL log must implement
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Unique identifier for this record
    fn id(&self) -> &str;

    /// Timestamp when this record was last updated (milliseconds since epoch)
    fn updated_at(&self) -> i64;
}

/// Current timestamp in milliseconds
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
