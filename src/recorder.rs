//! Save workflow.
//!
//! Location is best effort: permission is requested on every save, and a
//! denial, a failed fix or a timeout only means the entry is written
//! without coordinates. Storage failures are the only errors returned.

use std::time::Duration;

use tracing::{info, warn};

use crate::capture::{LocationProvider, Permission};
use crate::error::{LocationError, StoreError};
use crate::history::{self, Coordinates, HistoryEntry, HistoryLog};
use crate::store::KeyValueStore;

#[derive(Debug, Clone)]
pub struct RecorderSettings {
    pub history_key: String,
    pub timestamp_format: String,
    pub location_timeout: Duration,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        RecorderSettings {
            history_key: history::DEFAULT_HISTORY_KEY.to_string(),
            timestamp_format: history::DEFAULT_TIMESTAMP_FORMAT.to_string(),
            location_timeout: Duration::from_secs(10),
        }
    }
}

pub struct HistoryRecorder {
    store: Box<dyn KeyValueStore>,
    location: Box<dyn LocationProvider>,
    settings: RecorderSettings,
}

impl HistoryRecorder {
    pub fn new(
        store: Box<dyn KeyValueStore>,
        location: Box<dyn LocationProvider>,
        settings: RecorderSettings,
    ) -> Self {
        HistoryRecorder { store, location, settings }
    }

    /// Current position, or `None` for any location failure.
    pub async fn acquire_location(&self) -> Option<Coordinates> {
        match self.try_location().await {
            Ok(coords) => Some(coords),
            Err(e) => {
                warn!(error = %e, "recording entry without location");
                None
            }
        }
    }

    async fn try_location(&self) -> Result<Coordinates, LocationError> {
        if self.location.request_permission().await == Permission::Denied {
            return Err(LocationError::PermissionDenied);
        }

        tokio::time::timeout(self.settings.location_timeout, self.location.current_position())
            .await
            .map_err(|_| LocationError::TimedOut)?
    }

    /// Capture a location and append a new entry for `data` to the log.
    pub async fn record(&self, data: &str) -> Result<HistoryEntry, StoreError> {
        let timestamp = history::now_timestamp(&self.settings.timestamp_format);
        let location = self.acquire_location().await;
        let entry = HistoryEntry::new(data, timestamp, location);

        let log = HistoryLog::append(&*self.store, &self.settings.history_key, entry.clone()).await?;

        info!(
            data = %entry.data,
            located = entry.location.is_some(),
            entries = log.len(),
            "history entry saved"
        );
        Ok(entry)
    }

    pub async fn history(&self) -> Result<HistoryLog, StoreError> {
        HistoryLog::load(&*self.store, &self.settings.history_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeLocation {
        permission: Permission,
        fix: Result<Coordinates, LocationError>,
        delay: Duration,
        permission_requests: AtomicUsize,
    }

    impl FakeLocation {
        fn new(permission: Permission, fix: Result<Coordinates, LocationError>) -> Self {
            FakeLocation {
                permission,
                fix,
                delay: Duration::ZERO,
                permission_requests: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LocationProvider for Arc<FakeLocation> {
        async fn request_permission(&self) -> Permission {
            self.permission_requests.fetch_add(1, Ordering::SeqCst);
            self.permission
        }

        async fn current_position(&self) -> Result<Coordinates, LocationError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.fix.clone()
        }
    }

    fn recorder(location: FakeLocation) -> (HistoryRecorder, Arc<MemoryStore>, Arc<FakeLocation>) {
        let store = Arc::new(MemoryStore::new());
        let location = Arc::new(location);
        let settings = RecorderSettings {
            location_timeout: Duration::from_millis(50),
            ..RecorderSettings::default()
        };
        let recorder = HistoryRecorder::new(Box::new(store.clone()), Box::new(location.clone()), settings);
        (recorder, store, location)
    }

    #[tokio::test]
    async fn granted_permission_records_coordinates() {
        let here = Coordinates::new(48.8584, 2.2945);
        let (recorder, _, _) = recorder(FakeLocation::new(Permission::Granted, Ok(here)));

        let entry = recorder.record("ABC123").await.unwrap();

        assert_eq!(entry.location, Some(here));
        assert_eq!(recorder.history().await.unwrap().entries(), [entry]);
    }

    #[tokio::test]
    async fn denied_permission_still_saves_without_location() {
        let (recorder, store, _) = recorder(FakeLocation::new(
            Permission::Denied,
            Ok(Coordinates::new(1.0, 1.0)),
        ));

        let entry = recorder.record("ABC123").await.unwrap();

        assert_eq!(entry.location, None);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn failed_fix_is_swallowed() {
        let (recorder, _, _) = recorder(FakeLocation::new(
            Permission::Granted,
            Err(LocationError::Unavailable("no satellites".to_string())),
        ));

        let entry = recorder.record("ABC123").await.unwrap();

        assert_eq!(entry.location, None);
    }

    #[tokio::test]
    async fn slow_fix_times_out_without_failing_save() {
        let mut location = FakeLocation::new(Permission::Granted, Ok(Coordinates::new(1.0, 1.0)));
        location.delay = Duration::from_secs(5);
        let (recorder, _, _) = recorder(location);

        let entry = recorder.record("ABC123").await.unwrap();

        assert_eq!(entry.location, None);
    }

    #[tokio::test]
    async fn permission_requested_on_every_save() {
        let (recorder, _, location) = recorder(FakeLocation::new(Permission::Denied, Ok(Coordinates::new(0.0, 0.0))));

        recorder.record("a").await.unwrap();
        recorder.record("a").await.unwrap();
        recorder.record("a").await.unwrap();

        assert_eq!(location.permission_requests.load(Ordering::SeqCst), 3);
        assert_eq!(recorder.history().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn invalid_timestamp_format_still_records() {
        let store = Arc::new(MemoryStore::new());
        let settings = RecorderSettings {
            timestamp_format: "%!".to_string(),
            ..RecorderSettings::default()
        };
        let recorder = HistoryRecorder::new(
            Box::new(store.clone()),
            Box::new(Arc::new(FakeLocation::new(Permission::Denied, Ok(Coordinates::new(0.0, 0.0))))),
            settings,
        );

        let entry = recorder.record("ABC123").await.unwrap();

        assert!(!entry.timestamp.is_empty());
        assert!(!entry.timestamp.contains('!'));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn storage_failure_is_returned() {
        let (recorder, store, _) = recorder(FakeLocation::new(Permission::Denied, Ok(Coordinates::new(0.0, 0.0))));
        store.fail_writes(true);

        assert!(recorder.record("ABC123").await.is_err());
        assert_eq!(store.peek(history::DEFAULT_HISTORY_KEY), None);
    }

    #[tokio::test]
    async fn read_failure_is_returned() {
        let (recorder, store, _) = recorder(FakeLocation::new(Permission::Denied, Ok(Coordinates::new(0.0, 0.0))));
        store.fail_reads(true);

        assert!(recorder.record("ABC123").await.is_err());
        assert_eq!(store.write_count(), 0);
    }
}
