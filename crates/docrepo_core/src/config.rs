//! Store configuration.
//!
//! # Responsibility
//! - Describe where the document store lives and how connections behave.
//!
//! # Invariants
//! - `default_page_size` is never zero once validated.
//! - In-memory stores are private to one `DocumentStore` instance.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Physical location of the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum StoreLocation {
    /// SQLite database file; created when missing.
    File(PathBuf),
    /// Private in-memory database living as long as the store.
    Memory,
}

/// Configuration for [`crate::store::DocumentStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// Upper bound a storage call waits on a locked database.
    #[serde(with = "duration_millis")]
    pub busy_timeout: Duration,
    /// Page size used when callers do not supply a limit.
    pub default_page_size: u32,
}

impl StoreConfig {
    /// File-backed configuration with default tuning.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            ..Self::default()
        }
    }

    /// In-memory configuration with default tuning.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Returns a copy with a different busy timeout.
    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Returns a copy with a different default page size.
    pub fn with_default_page_size(mut self, default_page_size: u32) -> Self {
        self.default_page_size = default_page_size;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, StoreLocation, DEFAULT_PAGE_SIZE};
    use std::time::Duration;

    #[test]
    fn default_is_in_memory_with_five_second_busy_timeout() {
        let config = StoreConfig::default();
        assert_eq!(config.location, StoreLocation::Memory);
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn deserializes_partial_config_with_defaults() {
        let config: StoreConfig = serde_json::from_str(
            r#"{"location": {"kind": "file", "path": "/tmp/docs.db"}, "busy_timeout": 250}"#,
        )
        .unwrap();
        assert_eq!(config.location, StoreLocation::File("/tmp/docs.db".into()));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.default_page_size, 20);
    }
}
