//! History entries and the append-only history log.
//!
//! The log is stored as one json array under a single key and rewritten
//! as a whole on every append:
//! - absent key (or an empty value) reads as an empty log
//! - anything that is not an array of entries is reported as corrupt
//! - entries are never mutated or removed

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::KeyValueStore;

pub const DEFAULT_HISTORY_KEY: &str = "qrHistory";

/// Matches the locale string a phone shows, e.g. "10/19/2026, 3:04:05 PM".
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinates { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub data: String,
    pub timestamp: String,
    pub location: Option<Coordinates>,
}

impl HistoryEntry {
    pub fn new(data: impl Into<String>, timestamp: impl Into<String>, location: Option<Coordinates>) -> Self {
        HistoryEntry {
            data: data.into(),
            timestamp: timestamp.into(),
            location,
        }
    }
}

/// True if chrono can render `format`.
pub fn is_valid_timestamp_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Current local time rendered with a chrono format string.
///
/// An invalid format falls back to `DEFAULT_TIMESTAMP_FORMAT`.
pub fn now_timestamp(format: &str) -> String {
    let format = if is_valid_timestamp_format(format) {
        format
    } else {
        warn!(format, "invalid timestamp format, using default");
        DEFAULT_TIMESTAMP_FORMAT
    };
    chrono::Local::now().format(format).to_string()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    pub fn from_json(key: &str, raw: &str) -> Result<Self, StoreError> {
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }
        let entries = serde_json::from_str(raw).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        Ok(HistoryLog { entries })
    }

    /// Read the log stored under `key`.
    pub async fn load(store: &dyn KeyValueStore, key: &str) -> Result<Self, StoreError> {
        match store.get(key).await? {
            Some(raw) => Self::from_json(key, &raw),
            None => Ok(Self::new()),
        }
    }

    /// Write the whole log under `key`.
    pub async fn save(&self, store: &dyn KeyValueStore, key: &str) -> Result<(), StoreError> {
        store.set(key, &self.to_json()?).await
    }

    /// Read-modify-write: load, push `entry`, write everything back.
    ///
    /// Not safe with concurrent writers; two overlapping appends lose one entry.
    pub async fn append(store: &dyn KeyValueStore, key: &str, entry: HistoryEntry) -> Result<Self, StoreError> {
        let mut log = Self::load(store, key).await?;
        log.push(entry);
        log.save(store, key).await?;
        debug!(key, len = log.len(), "history log written");
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn entry(data: &str) -> HistoryEntry {
        HistoryEntry::new(data, "1/2/2026, 3:04:05 PM", None)
    }

    #[tokio::test]
    async fn absent_key_is_empty_log() {
        let store = MemoryStore::new();
        let log = HistoryLog::load(&store, DEFAULT_HISTORY_KEY).await.unwrap();
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn empty_value_is_empty_log() {
        let store = MemoryStore::with_value(DEFAULT_HISTORY_KEY, "");
        let log = HistoryLog::load(&store, DEFAULT_HISTORY_KEY).await.unwrap();
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn append_preserves_insertion_order_and_duplicates() {
        let store = MemoryStore::new();

        HistoryLog::append(&store, DEFAULT_HISTORY_KEY, entry("first")).await.unwrap();
        HistoryLog::append(&store, DEFAULT_HISTORY_KEY, entry("second")).await.unwrap();
        let log = HistoryLog::append(&store, DEFAULT_HISTORY_KEY, entry("first")).await.unwrap();

        let data: Vec<&str> = log.entries().iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, ["first", "second", "first"]);
        assert_eq!(store.write_count(), 3);
    }

    #[tokio::test]
    async fn corrupt_value_is_an_error() {
        let store = MemoryStore::with_value(DEFAULT_HISTORY_KEY, "{\"not\": \"a list\"}");

        let err = HistoryLog::append(&store, DEFAULT_HISTORY_KEY, entry("x")).await.unwrap_err();

        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn failed_write_leaves_stored_log_untouched() {
        let store = MemoryStore::new();
        HistoryLog::append(&store, DEFAULT_HISTORY_KEY, entry("kept")).await.unwrap();

        store.fail_writes(true);
        assert!(HistoryLog::append(&store, DEFAULT_HISTORY_KEY, entry("lost")).await.is_err());

        store.fail_writes(false);
        let log = HistoryLog::load(&store, DEFAULT_HISTORY_KEY).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].data, "kept");
    }

    #[test]
    fn missing_location_serializes_as_null() {
        let mut log = HistoryLog::new();
        log.push(entry("ABC123"));

        let json = log.to_json().unwrap();

        assert_eq!(
            json,
            r#"[{"data":"ABC123","timestamp":"1/2/2026, 3:04:05 PM","location":null}]"#
        );
    }

    #[test]
    fn reads_entries_without_location_field() {
        let log = HistoryLog::from_json("k", r#"[{"data":"x","timestamp":"t"}]"#).unwrap();
        assert_eq!(log.entries()[0].location, None);
    }

    #[test]
    fn default_timestamp_format_is_valid() {
        assert!(is_valid_timestamp_format(DEFAULT_TIMESTAMP_FORMAT));
        assert!(is_valid_timestamp_format("%Y-%m-%d %H:%M:%S"));
        assert!(!is_valid_timestamp_format("%!"));
    }

    #[test]
    fn invalid_format_falls_back_to_default() {
        let stamp = now_timestamp("%!");

        assert!(!stamp.is_empty());
        assert!(stamp.ends_with("AM") || stamp.ends_with("PM"), "{stamp}");
        assert_eq!(stamp.matches('/').count(), 2, "{stamp}");
    }

    #[test]
    fn reads_entries_with_location() {
        let raw = r#"[{"data":"x","timestamp":"t","location":{"latitude":52.5,"longitude":13.4}}]"#;
        let log = HistoryLog::from_json("k", raw).unwrap();
        assert_eq!(log.entries()[0].location, Some(Coordinates::new(52.5, 13.4)));
    }
}
