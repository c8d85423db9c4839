//! Built-in content shown when nothing better is available.
//!
//! Used when the first fetch fails with no cache, or when configuration is
//! missing, so the UI always has something to render.

use crate::images::ImageRef;
use crate::models::{ContentSnapshot, EventGallery, EventImage, ImportantLink, SiteContent};

/// Id of the placeholder gallery.
pub const SAMPLE_GALLERY_ID: &str = "sample";

const SAMPLE_IMAGE: &str = "images/sample-gallery.jpg";

pub fn sample_gallery() -> EventGallery {
    let image = ImageRef::from_reference(SAMPLE_IMAGE);
    EventGallery {
        id: SAMPLE_GALLERY_ID.to_string(),
        title: "Welcome Night".to_string(),
        date: String::new(),
        description: "Photos will appear here once the gallery can be reached.".to_string(),
        cover: image.clone(),
        image_count: 1,
        images: vec![EventImage {
            image,
            caption: "Members at our welcome night".to_string(),
        }],
    }
}

pub fn fallback_snapshot() -> ContentSnapshot {
    ContentSnapshot {
        officers: Vec::new(),
        links: vec![ImportantLink {
            title: "Contact us".to_string(),
            url: "mailto:club@example.edu".to_string(),
            description: Some("Questions about membership or events".to_string()),
        }],
        galleries: vec![sample_gallery()],
        site: SiteContent::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_has_single_sample_gallery() {
        let snapshot = fallback_snapshot();
        assert_eq!(snapshot.galleries.len(), 1);
        assert_eq!(snapshot.galleries[0].id, SAMPLE_GALLERY_ID);
        assert!(!snapshot.galleries[0].cover.is_empty());
        assert!(!snapshot.site.title.is_empty());
    }
}
