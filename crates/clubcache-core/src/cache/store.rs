use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::manager::{age_display, CacheManager};
use crate::error::ContentError;
use crate::models::{ContentSnapshot, FolderMetadata};

/// Bump whenever the shape of `CacheRecord` or the snapshot changes.
/// Records written under any other version are ignored.
pub const CACHE_SCHEMA_VERSION: &str = "3";

/// Default validity window for a stored record.
pub const DEFAULT_CACHE_EXPIRY_HOURS: i64 = 24;

const CONTENT_CACHE: &str = "content";

/// Persisted snapshot plus what is needed to judge it later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub version: String,
    pub cached_at: DateTime<Utc>,
    pub snapshot: ContentSnapshot,
    #[serde(default)]
    pub metadata: Vec<FolderMetadata>,
    /// Newest modification time seen across the source folders
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

impl CacheRecord {
    pub fn new(snapshot: ContentSnapshot, metadata: Vec<FolderMetadata>) -> Self {
        let last_modified = metadata.iter().filter_map(FolderMetadata::newest_modification).max();
        Self {
            version: CACHE_SCHEMA_VERSION.to_string(),
            cached_at: Utc::now(),
            snapshot,
            metadata,
            last_modified,
        }
    }

    /// Same content, new capture time and metadata. Used when revalidation
    /// finds nothing changed.
    pub fn touched(&self, metadata: Vec<FolderMetadata>) -> Self {
        Self::new(self.snapshot.clone(), metadata)
    }

    pub fn is_expired(&self, expiry: Duration) -> bool {
        Utc::now() - self.cached_at > expiry
    }

    pub fn age_display(&self) -> String {
        age_display(self.cached_at)
    }

    /// A record is usable only under the current schema and inside the expiry window.
    pub fn validate(&self, expiry: Duration) -> Result<(), ContentError> {
        if self.version != CACHE_SCHEMA_VERSION {
            return Err(ContentError::CacheCorrupt(format!(
                "schema version {} does not match {}",
                self.version, CACHE_SCHEMA_VERSION
            )));
        }
        if self.is_expired(expiry) {
            return Err(ContentError::CacheCorrupt(format!(
                "record from {} is past the expiry window",
                self.cached_at.to_rfc3339()
            )));
        }
        Ok(())
    }
}

/// Persistence for the single content record.
///
/// `read` never fails: anything unusable is reported as absent so the caller
/// falls back to a fresh fetch.
pub trait CacheStore: Send + Sync {
    fn read(&self) -> Option<CacheRecord>;
    fn write(&self, record: &CacheRecord) -> Result<(), ContentError>;
    fn clear(&self) -> Result<(), ContentError>;
}

fn usable(record: CacheRecord, expiry: Duration) -> Option<CacheRecord> {
    match record.validate(expiry) {
        Ok(()) => Some(record),
        Err(e) => {
            debug!(error = %e, "Ignoring cached content");
            None
        }
    }
}

/// Record stored as JSON in the cache directory.
pub struct FileCacheStore {
    manager: CacheManager,
    expiry: Duration,
}

impl FileCacheStore {
    pub fn new(manager: CacheManager, expiry: Duration) -> Self {
        Self { manager, expiry }
    }
}

impl CacheStore for FileCacheStore {
    fn read(&self) -> Option<CacheRecord> {
        match self.manager.read_json::<CacheRecord>(CONTENT_CACHE) {
            Ok(Some(record)) => usable(record, self.expiry),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Content cache unreadable, treating as absent");
                None
            }
        }
    }

    fn write(&self, record: &CacheRecord) -> Result<(), ContentError> {
        self.manager
            .write_json(CONTENT_CACHE, record)
            .map_err(|e| ContentError::CacheCorrupt(format!("{:#}", e)))
    }

    fn clear(&self) -> Result<(), ContentError> {
        self.manager
            .remove(CONTENT_CACHE)
            .map_err(|e| ContentError::CacheCorrupt(format!("{:#}", e)))
    }
}

/// In-process store, for tests and sessions that should not touch disk.
pub struct MemoryCacheStore {
    record: Mutex<Option<CacheRecord>>,
    expiry: Duration,
}

impl MemoryCacheStore {
    pub fn new(expiry: Duration) -> Self {
        Self {
            record: Mutex::new(None),
            expiry,
        }
    }

    pub fn with_record(record: CacheRecord, expiry: Duration) -> Self {
        Self {
            record: Mutex::new(Some(record)),
            expiry,
        }
    }

    /// Stored record without validation.
    pub fn raw(&self) -> Option<CacheRecord> {
        self.record.lock().ok().and_then(|r| r.clone())
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_CACHE_EXPIRY_HOURS))
    }
}

impl CacheStore for MemoryCacheStore {
    fn read(&self) -> Option<CacheRecord> {
        let record = self.record.lock().ok()?.clone()?;
        usable(record, self.expiry)
    }

    fn write(&self, record: &CacheRecord) -> Result<(), ContentError> {
        let mut slot = self
            .record
            .lock()
            .map_err(|_| ContentError::CacheCorrupt("cache lock poisoned".to_string()))?;
        *slot = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ContentError> {
        let mut slot = self
            .record
            .lock()
            .map_err(|_| ContentError::CacheCorrupt("cache lock poisoned".to_string()))?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::ImageRef;
    use crate::models::{EventGallery, ImportantLink};

    fn snapshot() -> ContentSnapshot {
        ContentSnapshot {
            links: vec![ImportantLink {
                title: "Join us".into(),
                url: "https://example.edu/join".into(),
                description: None,
            }],
            galleries: vec![EventGallery {
                id: "g1".into(),
                title: "Gala".into(),
                date: "2024-03-15".into(),
                description: String::new(),
                cover: ImageRef::drive("img1"),
                image_count: 1,
                images: vec![],
            }],
            ..Default::default()
        }
    }

    fn file_store(dir: &tempfile::TempDir, expiry: Duration) -> FileCacheStore {
        let manager = CacheManager::new(dir.path().to_path_buf()).unwrap();
        FileCacheStore::new(manager, expiry)
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir, Duration::hours(1));
        assert!(store.read().is_none());

        let record = CacheRecord::new(snapshot(), vec![]);
        store.write(&record).unwrap();

        let read = store.read().expect("record should be readable");
        assert_eq!(read.snapshot, record.snapshot);
        assert_eq!(read, record);
    }

    #[test]
    fn test_expired_record_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir, Duration::hours(1));

        let mut record = CacheRecord::new(snapshot(), vec![]);
        record.cached_at = Utc::now() - Duration::hours(2);
        store.write(&record).unwrap();

        assert!(store.read().is_none());
    }

    #[test]
    fn test_version_mismatch_is_absent() {
        let store = MemoryCacheStore::default();
        let mut record = CacheRecord::new(snapshot(), vec![]);
        record.version = "0".into();
        store.write(&record).unwrap();

        assert!(store.read().is_none());
        assert!(store.raw().is_some());
    }

    #[test]
    fn test_corrupt_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir, Duration::hours(1));
        std::fs::write(dir.path().join("content.json"), "{\"version\": 3").unwrap();
        assert!(store.read().is_none());
    }

    #[test]
    fn test_clear_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir, Duration::hours(1));
        store.write(&CacheRecord::new(snapshot(), vec![])).unwrap();
        assert!(store.read().is_some());

        store.clear().unwrap();
        assert!(store.read().is_none());
    }

    #[test]
    fn test_touched_keeps_snapshot_and_refreshes_time() {
        let mut record = CacheRecord::new(snapshot(), vec![]);
        record.cached_at = Utc::now() - Duration::hours(3);
        let touched = record.touched(vec![]);
        assert_eq!(touched.snapshot, record.snapshot);
        assert!(touched.cached_at > record.cached_at);
    }
}
