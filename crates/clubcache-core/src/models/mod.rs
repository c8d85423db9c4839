//! Data models for the club's published content.
//!
//! - `Officer`, `ImportantLink`, `EventGallery`, `SiteContent`: normalized records
//! - `ContentSnapshot`: the full payload the site renders
//! - `FolderMetadata`: Drive listing summaries used for freshness checks
//! - `CalendarEvent`: upcoming events from the club calendar
//! - `*Entry` / `GalleryInfo`: documents as authored in Drive, before validation

pub mod event;
pub mod folder;
pub mod gallery;
pub mod link;
pub mod officer;
pub mod site;
pub mod snapshot;

pub use event::{CalendarEvent, EventStatus, EventTime};
pub use folder::{FileStamp, FolderMetadata};
pub use gallery::{caption_from_file_name, split_folder_name, EventGallery, EventImage, GalleryInfo};
pub use link::{ImportantLink, LinkEntry};
pub use officer::{flag_from_country_code, Officer, OfficerEntry};
pub use site::SiteContent;
pub use snapshot::ContentSnapshot;

/// Lowercase, ASCII-alphanumeric words joined by dashes.
pub fn slugify(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
