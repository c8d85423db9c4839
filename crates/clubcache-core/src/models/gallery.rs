use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::images::ImageRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventImage {
    pub image: ImageRef,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventGallery {
    /// Drive folder id of the gallery
    pub id: String,
    pub title: String,
    pub date: String,
    pub description: String,
    pub cover: ImageRef,
    pub image_count: usize,
    pub images: Vec<EventImage>,
}

impl EventGallery {
    pub fn record_id(&self) -> String {
        format!("gallery:{}", self.id)
    }

    /// Parsed date label, used for ordering.
    pub fn sort_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

/// Optional `gallery.json` inside a gallery folder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalleryInfo {
    pub title: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    /// File name of the cover image
    pub cover: Option<String>,
}

/// Split a gallery folder name of the form `2024-03-15 Spring Gala`.
///
/// Returns `(date, title)`; the date is `None` when the prefix is not a valid
/// `YYYY-MM-DD` date.
pub fn split_folder_name(name: &str) -> (Option<String>, String) {
    let name = name.trim();
    if let Some(prefix) = name.get(..10) {
        if NaiveDate::parse_from_str(prefix, "%Y-%m-%d").is_ok() {
            let rest = name[10..].trim_start_matches([' ', '-', '_']).trim();
            let title = if rest.is_empty() { prefix } else { rest };
            return (Some(prefix.to_string()), title.to_string());
        }
    }
    (None, name.to_string())
}

/// Human caption from a file name: drop the extension, separators to spaces.
pub fn caption_from_file_name(name: &str) -> String {
    let stem = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };
    stem.replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_folder_name_with_date() {
        let (date, title) = split_folder_name("2024-03-15 Spring Gala");
        assert_eq!(date.as_deref(), Some("2024-03-15"));
        assert_eq!(title, "Spring Gala");

        let (date, title) = split_folder_name("2023-11-02 - Diwali Night");
        assert_eq!(date.as_deref(), Some("2023-11-02"));
        assert_eq!(title, "Diwali Night");
    }

    #[test]
    fn test_split_folder_name_without_date() {
        let (date, title) = split_folder_name("Welcome Picnic");
        assert!(date.is_none());
        assert_eq!(title, "Welcome Picnic");

        let (date, title) = split_folder_name("2024-13-45 Bad Date");
        assert!(date.is_none());
        assert_eq!(title, "2024-13-45 Bad Date");
    }

    #[test]
    fn test_caption_from_file_name() {
        assert_eq!(caption_from_file_name("group_photo-01.jpg"), "group photo 01");
        assert_eq!(caption_from_file_name("stage.png"), "stage");
        assert_eq!(caption_from_file_name(".hidden"), ".hidden");
    }
}
