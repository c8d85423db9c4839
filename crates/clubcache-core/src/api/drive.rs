//! Google Drive v3 file listing and download.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ApiClient, ApiError};

/// Base URL for Drive v3 endpoints
const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// MIME type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Page size for folder listings (Drive caps this at 1000).
const LIST_PAGE_SIZE: u32 = 1000;

/// Fields requested for every file; keeps responses small.
const FILE_FIELDS: &str = "id,name,mimeType,modifiedTime,description";

/// A file or folder entry as returned by Drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
}

impl DriveFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListResponse {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

/// Read-only access to a file store organized in folders.
///
/// `DriveClient` is the production implementation; tests provide in-memory
/// folders.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Metadata for a single file or folder.
    async fn file(&self, file_id: &str) -> Result<DriveFile, ApiError>;

    /// Direct children of a folder, ordered by name.
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>, ApiError>;

    /// Raw content of a (text) file.
    async fn download(&self, file_id: &str) -> Result<String, ApiError>;
}

#[derive(Clone)]
pub struct DriveClient {
    api: ApiClient,
}

impl DriveClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl FileSource for DriveClient {
    async fn file(&self, file_id: &str) -> Result<DriveFile, ApiError> {
        let url = format!("{}/files/{}", DRIVE_BASE_URL, file_id);
        self.api
            .get_json(&url, &[("fields", FILE_FIELDS.to_string())])
            .await
    }

    async fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>, ApiError> {
        let url = format!("{}/files", DRIVE_BASE_URL);
        let q = format!("'{}' in parents and trashed = false", folder_id);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("q", q.clone()),
                ("fields", format!("nextPageToken,files({})", FILE_FIELDS)),
                ("orderBy", "name".to_string()),
                ("pageSize", LIST_PAGE_SIZE.to_string()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let page: FileListResponse = self.api.get_json(&url, &query).await?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(folder = folder_id, count = files.len(), "Listed Drive folder");
        Ok(files)
    }

    async fn download(&self, file_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/files/{}", DRIVE_BASE_URL, file_id);
        self.api.get_text(&url, &[("alt", "media".to_string())]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_list() {
        let json = r#"{
            "nextPageToken": "abc",
            "files": [
                {"id": "1", "name": "officers.json", "mimeType": "application/json",
                 "modifiedTime": "2024-09-01T12:00:00.000Z"},
                {"id": "2", "name": "2024-03-15 Spring Gala",
                 "mimeType": "application/vnd.google-apps.folder"}
            ]
        }"#;
        let parsed: FileListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.next_page_token.as_deref(), Some("abc"));
        assert_eq!(parsed.files.len(), 2);
        assert!(parsed.files[0].modified_time.is_some());
        assert!(!parsed.files[0].is_folder());
        assert!(parsed.files[1].is_folder());
        assert!(parsed.files[1].modified_time.is_none());
    }

    #[test]
    fn test_is_image() {
        let file = DriveFile {
            id: "x".into(),
            name: "a.jpg".into(),
            mime_type: "image/jpeg".into(),
            modified_time: None,
            description: None,
        };
        assert!(file.is_image());
    }
}
