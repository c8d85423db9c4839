//! clubcache-core: content layer for the club website.
//!
//! This crate provides:
//! - Google Drive and Calendar clients (`api`)
//! - Data models for officers, links, galleries, site text and events (`models`)
//! - Versioned content cache with file and in-memory stores (`cache`)
//! - Metadata freshness checks and the Drive fetcher (`freshness`, `fetcher`)
//! - Stale-while-revalidate orchestration (`orchestrator`)
//! - Page/modal navigation reducer (`navigation`)
//! - Configuration and API key storage (`config`, `credentials`)

pub mod api;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod defaults;
pub mod error;
pub mod fetcher;
pub mod freshness;
pub mod images;
pub mod models;
pub mod navigation;
pub mod orchestrator;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiError, CalendarClient, CalendarSource, DriveClient, FileSource};
pub use cache::{CacheManager, CacheRecord, CacheStore, FileCacheStore, MemoryCacheStore};
pub use config::{Config, SiteSettings};
pub use credentials::CredentialStore;
pub use error::ContentError;
pub use fetcher::{ContentFolders, Fetcher};
pub use images::{ImageAttempts, ImageRef, ImageSource};
pub use navigation::{HistoryEffect, Location, Modal, NavEvent, NavState, Page};
pub use orchestrator::{CacheStatus, ContentView, RefreshOrchestrator, RefreshState};
