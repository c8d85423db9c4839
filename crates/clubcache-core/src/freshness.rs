//! Staleness decisions from folder listings.
//!
//! Comparing listings is much cheaper than downloading and re-parsing every
//! document, so revalidation only refetches content when a listing moved.
//! Modification timestamps are the only signal used.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::ContentError;
use crate::models::FolderMetadata;

/// Outcome of comparing cached and current source metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    /// Current metadata could not be retrieved; never read as "fresh".
    Unknown(ContentError),
}

/// Whether a single folder changed between two listings.
pub fn is_stale(cached: &FolderMetadata, current: &FolderMetadata) -> bool {
    if cached.folder_id != current.folder_id || cached.file_count != current.file_count {
        return true;
    }
    if cached.files.len() != current.files.len() {
        return true;
    }

    let cached_times: HashMap<&str, Option<DateTime<Utc>>> = cached
        .files
        .iter()
        .map(|f| (f.id.as_str(), f.modified_time))
        .collect();

    // Same length and every current id present with the same time means the
    // id sets are equal too.
    current.files.iter().any(|file| match cached_times.get(file.id.as_str()) {
        Some(time) => *time != file.modified_time,
        None => true,
    })
}

/// Compare a cached set of folder listings against freshly fetched ones.
pub fn check(cached: &[FolderMetadata], current: Result<Vec<FolderMetadata>, ContentError>) -> Freshness {
    let current = match current {
        Ok(current) => current,
        Err(e) => return Freshness::Unknown(e),
    };

    if cached.is_empty() || cached.len() != current.len() {
        return Freshness::Stale;
    }

    let by_id: HashMap<&str, &FolderMetadata> =
        cached.iter().map(|m| (m.folder_id.as_str(), m)).collect();

    let stale = current.iter().any(|folder| match by_id.get(folder.folder_id.as_str()) {
        Some(previous) => is_stale(previous, folder),
        None => true,
    });

    if stale {
        Freshness::Stale
    } else {
        Freshness::Fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileStamp;
    use chrono::{Duration, TimeZone};

    fn stamp(id: &str, minute: u32) -> FileStamp {
        FileStamp {
            id: id.into(),
            name: format!("{}.jpg", id),
            modified_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()),
        }
    }

    fn folder(id: &str, files: Vec<FileStamp>) -> FolderMetadata {
        FolderMetadata {
            folder_id: id.into(),
            modified_time: None,
            file_count: files.len(),
            files,
        }
    }

    #[test]
    fn test_identical_metadata_is_fresh() {
        let a = folder("f", vec![stamp("1", 0), stamp("2", 1)]);
        let b = a.clone();
        assert!(!is_stale(&a, &b));
        assert!(!is_stale(&b, &a));
        assert_eq!(check(&[a.clone()], Ok(vec![b])), Freshness::Fresh);
    }

    #[test]
    fn test_one_modified_time_differs() {
        let a = folder("f", vec![stamp("1", 0), stamp("2", 1)]);
        let mut b = a.clone();
        b.files[1].modified_time = b.files[1].modified_time.map(|t| t + Duration::seconds(1));
        assert!(is_stale(&a, &b));
        assert_eq!(check(&[a], Ok(vec![b])), Freshness::Stale);
    }

    #[test]
    fn test_file_count_differs() {
        let a = folder("f", vec![stamp("1", 0)]);
        let b = folder("f", vec![stamp("1", 0), stamp("2", 1)]);
        assert!(is_stale(&a, &b));
    }

    #[test]
    fn test_file_ids_differ_with_same_count() {
        let a = folder("f", vec![stamp("1", 0), stamp("2", 1)]);
        let b = folder("f", vec![stamp("1", 0), stamp("3", 1)]);
        assert!(is_stale(&a, &b));
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = folder("f", vec![stamp("1", 0), stamp("2", 1)]);
        let b = folder("f", vec![stamp("2", 1), stamp("1", 0)]);
        assert!(!is_stale(&a, &b));
    }

    #[test]
    fn test_new_folder_is_stale() {
        let a = folder("content", vec![stamp("1", 0)]);
        let b = folder("gallery-new", vec![]);
        assert_eq!(check(&[a.clone()], Ok(vec![a, b])), Freshness::Stale);
    }

    #[test]
    fn test_missing_cached_metadata_is_stale() {
        let a = folder("content", vec![stamp("1", 0)]);
        assert_eq!(check(&[], Ok(vec![a])), Freshness::Stale);
    }

    #[test]
    fn test_fetch_failure_is_unknown() {
        let a = folder("content", vec![stamp("1", 0)]);
        let err = ContentError::SourceUnavailable("offline".into());
        assert_eq!(check(&[a], Err(err.clone())), Freshness::Unknown(err));
    }
}
