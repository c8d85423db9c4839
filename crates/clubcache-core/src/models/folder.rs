use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::DriveFile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStamp {
    pub id: String,
    pub name: String,
    pub modified_time: Option<DateTime<Utc>>,
}

/// Listing summary of one Drive folder. Only used to decide staleness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderMetadata {
    pub folder_id: String,
    pub modified_time: Option<DateTime<Utc>>,
    pub file_count: usize,
    pub files: Vec<FileStamp>,
}

impl FolderMetadata {
    pub fn from_listing(folder: &DriveFile, children: &[DriveFile]) -> Self {
        Self {
            folder_id: folder.id.clone(),
            modified_time: folder.modified_time,
            file_count: children.len(),
            files: children
                .iter()
                .map(|f| FileStamp {
                    id: f.id.clone(),
                    name: f.name.clone(),
                    modified_time: f.modified_time,
                })
                .collect(),
        }
    }

    /// Newest modification time among the folder and its files.
    pub fn newest_modification(&self) -> Option<DateTime<Utc>> {
        self.files
            .iter()
            .filter_map(|f| f.modified_time)
            .chain(self.modified_time)
            .max()
    }
}
