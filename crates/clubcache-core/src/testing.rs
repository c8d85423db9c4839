//! In-memory Drive used by the fetcher and orchestrator tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::watch;

use crate::api::{ApiError, DriveFile, FileSource, FOLDER_MIME_TYPE};

#[derive(Default)]
struct DriveState {
    files: HashMap<String, DriveFile>,
    children: HashMap<String, Vec<String>>,
    contents: HashMap<String, String>,
}

pub struct MemoryDrive {
    state: Mutex<DriveState>,
    offline: AtomicBool,
    clock: AtomicI64,
    gate: watch::Sender<bool>,
    pub list_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
}

impl MemoryDrive {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            state: Mutex::new(DriveState::default()),
            offline: AtomicBool::new(false),
            clock: AtomicI64::new(0),
            gate,
            list_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    /// Content folder with `officers` officers, one link and site text; a
    /// gallery folder with two dated galleries.
    pub fn sample(officers: usize) -> Self {
        let drive = Self::new();
        drive.add_folder(None, "content", "Website");
        drive.add_folder(None, "gallery", "Galleries");
        drive.set_officers(officers);
        drive.put_document(
            "content",
            "links.json",
            r#"[{"title": "Join the club", "url": "https://example.edu/join"}]"#,
        );
        drive.put_document("content", "site.json", r#"{"title": "Test Club"}"#);

        drive.add_folder(Some("gallery"), "gala", "2024-03-15 Spring Gala");
        drive.add_file("gala", "gala-img-1", "a-opening.jpg", "image/jpeg", Some("Opening dance"));
        drive.add_file("gala", "gala-cover", "cover.jpg", "image/jpeg", None);
        drive.put_document(
            "gala",
            "gallery.json",
            r#"{"title": "Spring Gala Highlights", "description": "Our biggest night of the year"}"#,
        );

        drive.add_folder(Some("gallery"), "culture", "2024-11-02 Culture Night");
        drive.add_file("culture", "culture-stage", "stage.jpg", "image/jpeg", None);
        drive
    }

    /// Rewrite `officers.json` with `count` officers and their photos.
    pub fn set_officers(&self, count: usize) {
        let entries: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "name": format!("Officer {}", i),
                    "role": "Member at Large",
                    "year": "Junior",
                    "image": format!("officer-photo-{}.jpg", i),
                    "countryCode": "gh",
                })
            })
            .collect();
        for i in 0..count {
            let name = format!("officer-photo-{}.jpg", i);
            let exists = self.find_child("content", &name).is_some();
            if !exists {
                self.add_file("content", &format!("officer-photo-{}", i), &name, "image/jpeg", None);
            }
        }
        self.put_document("content", "officers.json", &serde_json::Value::Array(entries).to_string());
    }

    fn tick(&self) -> DateTime<Utc> {
        let minutes = self.clock.fetch_add(1, Ordering::SeqCst);
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    pub fn add_folder(&self, parent: Option<&str>, id: &str, name: &str) {
        let file = DriveFile {
            id: id.into(),
            name: name.into(),
            mime_type: FOLDER_MIME_TYPE.into(),
            modified_time: Some(self.tick()),
            description: None,
        };
        self.insert(parent, file, None);
    }

    pub fn add_file(&self, parent: &str, id: &str, name: &str, mime: &str, description: Option<&str>) {
        let file = DriveFile {
            id: id.into(),
            name: name.into(),
            mime_type: mime.into(),
            modified_time: Some(self.tick()),
            description: description.map(str::to_string),
        };
        self.insert(Some(parent), file, None);
    }

    /// Create or replace a JSON document, bumping its modified time.
    pub fn put_document(&self, folder: &str, name: &str, content: &str) {
        let id = self
            .find_child(folder, name)
            .unwrap_or_else(|| format!("{}-{}", folder, name));
        let file = DriveFile {
            id,
            name: name.into(),
            mime_type: "application/json".into(),
            modified_time: Some(self.tick()),
            description: None,
        };
        self.insert(Some(folder), file, Some(content.to_string()));
    }

    pub fn remove_file(&self, folder: &str, name: &str) {
        if let Some(id) = self.find_child(folder, name) {
            let mut state = self.state.lock().unwrap();
            state.files.remove(&id);
            state.contents.remove(&id);
            if let Some(children) = state.children.get_mut(folder) {
                children.retain(|c| *c != id);
            }
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Hold every listing until `open_gate` is called.
    pub fn close_gate(&self) {
        self.gate.send_replace(false);
    }

    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    fn find_child(&self, folder: &str, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .children
            .get(folder)?
            .iter()
            .find(|id| state.files.get(*id).map_or(false, |f| f.name == name))
            .cloned()
    }

    fn insert(&self, parent: Option<&str>, file: DriveFile, content: Option<String>) {
        let mut state = self.state.lock().unwrap();
        if let Some(parent) = parent {
            let children = state.children.entry(parent.to_string()).or_default();
            if !children.contains(&file.id) {
                children.push(file.id.clone());
            }
        }
        if let Some(content) = content {
            state.contents.insert(file.id.clone(), content);
        }
        state.files.insert(file.id.clone(), file);
    }

    async fn wait_for_gate(&self) {
        let mut rx = self.gate.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }

    fn check_online(&self) -> Result<(), ApiError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ApiError::ServerError("simulated outage".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FileSource for MemoryDrive {
    async fn file(&self, file_id: &str) -> Result<DriveFile, ApiError> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        state
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(file_id.to_string()))
    }

    async fn list_folder(&self, folder_id: &str) -> Result<Vec<DriveFile>, ApiError> {
        self.wait_for_gate().await;
        self.check_online()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        let mut files: Vec<DriveFile> = state
            .children
            .get(folder_id)
            .map(|ids| ids.iter().filter_map(|id| state.files.get(id).cloned()).collect())
            .unwrap_or_default();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    async fn download(&self, file_id: &str) -> Result<String, ApiError> {
        self.check_online()?;
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        state
            .contents
            .get(file_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(file_id.to_string()))
    }
}
