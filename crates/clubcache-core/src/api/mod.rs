//! REST API clients for the Google services the club publishes through.
//!
//! - `ApiClient`: shared HTTP client with API-key auth, timeout and retries
//! - `DriveClient` / `FileSource`: folder listings and file downloads
//! - `CalendarClient` / `CalendarSource`: upcoming events

pub mod calendar;
pub mod client;
pub mod drive;
pub mod error;

pub use calendar::{CalendarClient, CalendarSource};
pub use client::{ApiClient, RetryPolicy};
pub use drive::{DriveClient, DriveFile, FileSource, FOLDER_MIME_TYPE};
pub use error::ApiError;
