//! Retrieval of the club's content from Drive and normalization into a
//! `ContentSnapshot`.
//!
//! Layout expected in Drive:
//!
//! - content folder: `officers.json`, `links.json`, `site.json` and officer photos
//! - gallery folder: one subfolder per event (`2024-03-15 Spring Gala`) holding
//!   images and an optional `gallery.json`
//!
//! Source failures abort the fetch so a half-built snapshot never replaces a
//! good cache. A single bad record is logged and skipped.

use std::cmp::Ordering;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{DriveFile, FileSource};
use crate::error::ContentError;
use crate::images::ImageRef;
use crate::models::{
    caption_from_file_name, split_folder_name, ContentSnapshot, EventGallery, EventImage,
    FolderMetadata, GalleryInfo, ImportantLink, LinkEntry, Officer, OfficerEntry, SiteContent,
};

pub const OFFICERS_FILE: &str = "officers.json";
pub const LINKS_FILE: &str = "links.json";
pub const SITE_FILE: &str = "site.json";
pub const GALLERY_INFO_FILE: &str = "gallery.json";

/// Maximum gallery folders listed concurrently.
const MAX_CONCURRENT_LISTINGS: usize = 8;

/// Drive folders the site is published from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFolders {
    pub content: String,
    pub gallery: String,
}

/// A freshly fetched snapshot and the listings it was built from.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub snapshot: ContentSnapshot,
    pub metadata: Vec<FolderMetadata>,
}

/// A folder and its direct children.
#[derive(Debug, Clone)]
struct Listing {
    folder: DriveFile,
    children: Vec<DriveFile>,
}

impl Listing {
    fn metadata(&self) -> FolderMetadata {
        FolderMetadata::from_listing(&self.folder, &self.children)
    }

    fn find(&self, name: &str) -> Option<&DriveFile> {
        self.children
            .iter()
            .find(|f| !f.is_folder() && f.name.eq_ignore_ascii_case(name))
    }

    fn subfolders(&self) -> impl Iterator<Item = &DriveFile> {
        self.children.iter().filter(|f| f.is_folder())
    }
}

pub struct Fetcher {
    source: Arc<dyn FileSource>,
    folders: ContentFolders,
}

impl Fetcher {
    pub fn new(source: Arc<dyn FileSource>, folders: ContentFolders) -> Self {
        Self { source, folders }
    }

    pub fn folders(&self) -> &ContentFolders {
        &self.folders
    }

    // ===== Public operations =====

    /// Fetch everything, running the four sections concurrently.
    pub async fn fetch_all(&self) -> Result<FetchedContent, ContentError> {
        let (content, gallery_root) = tokio::try_join!(
            self.listing(&self.folders.content),
            self.listing(&self.folders.gallery),
        )?;

        let (officers, links, site, galleries) = tokio::try_join!(
            self.officers_from(&content),
            self.links_from(&content),
            self.site_from(&content),
            self.galleries_with_metadata(&gallery_root),
        )?;
        let (galleries, gallery_metadata) = galleries;

        let mut metadata = vec![content.metadata(), gallery_root.metadata()];
        metadata.extend(gallery_metadata);

        info!(
            officers = officers.len(),
            links = links.len(),
            galleries = galleries.len(),
            "Content fetched"
        );

        Ok(FetchedContent {
            snapshot: ContentSnapshot {
                officers,
                links,
                galleries,
                site,
            },
            metadata,
        })
    }

    pub async fn fetch_officers(&self) -> Result<Vec<Officer>, ContentError> {
        let content = self.listing(&self.folders.content).await?;
        self.officers_from(&content).await
    }

    pub async fn fetch_links(&self) -> Result<Vec<ImportantLink>, ContentError> {
        let content = self.listing(&self.folders.content).await?;
        self.links_from(&content).await
    }

    pub async fn fetch_site_content(&self) -> Result<SiteContent, ContentError> {
        let content = self.listing(&self.folders.content).await?;
        self.site_from(&content).await
    }

    pub async fn fetch_galleries(&self) -> Result<Vec<EventGallery>, ContentError> {
        let root = self.listing(&self.folders.gallery).await?;
        Ok(self.galleries_with_metadata(&root).await?.0)
    }

    /// Listings of every source folder without downloading any document.
    ///
    /// Order: content folder, gallery root, then each gallery subfolder.
    pub async fn current_metadata(&self) -> Result<Vec<FolderMetadata>, ContentError> {
        let (content, gallery_root) = tokio::try_join!(
            self.listing(&self.folders.content),
            self.listing(&self.folders.gallery),
        )?;
        let galleries = self.gallery_listings(&gallery_root).await?;

        let mut metadata = vec![content.metadata(), gallery_root.metadata()];
        metadata.extend(galleries.iter().map(Listing::metadata));
        Ok(metadata)
    }

    // ===== Listing helpers =====

    async fn listing(&self, folder_id: &str) -> Result<Listing, ContentError> {
        let (folder, children) = tokio::try_join!(
            self.source.file(folder_id),
            self.source.list_folder(folder_id),
        )?;
        Ok(Listing { folder, children })
    }

    async fn gallery_listings(&self, root: &Listing) -> Result<Vec<Listing>, ContentError> {
        let subfolders: Vec<DriveFile> = root.subfolders().cloned().collect();
        stream::iter(subfolders)
            .map(|folder| async move {
                let children = self.source.list_folder(&folder.id).await?;
                Ok::<_, ContentError>(Listing { folder, children })
            })
            .buffered(MAX_CONCURRENT_LISTINGS)
            .try_collect()
            .await
    }

    /// Download a JSON document. `Ok(None)` when the file is not present.
    async fn document<T: DeserializeOwned>(
        &self,
        listing: &Listing,
        name: &str,
    ) -> Result<Option<T>, ContentError> {
        let Some(file) = listing.find(name) else {
            return Ok(None);
        };
        let text = self.source.download(&file.id).await?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ContentError::malformed(name, e.to_string()))
    }

    // ===== Section builders =====

    async fn officers_from(&self, content: &Listing) -> Result<Vec<Officer>, ContentError> {
        let Some(entries) = self.document::<Vec<Value>>(content, OFFICERS_FILE).await? else {
            warn!(folder = %content.folder.id, "No {} in content folder", OFFICERS_FILE);
            return Ok(Vec::new());
        };

        let officers = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match officer_from_value(value, content) {
                Ok(officer) => Some(officer),
                Err(e) => {
                    warn!(index, error = %e, "Skipping officer entry");
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!(count = officers.len(), "Officers parsed");
        Ok(officers)
    }

    async fn links_from(&self, content: &Listing) -> Result<Vec<ImportantLink>, ContentError> {
        let Some(entries) = self.document::<Vec<Value>>(content, LINKS_FILE).await? else {
            debug!("No {} in content folder", LINKS_FILE);
            return Ok(Vec::new());
        };

        Ok(entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match link_from_value(value) {
                Ok(link) => Some(link),
                Err(e) => {
                    warn!(index, error = %e, "Skipping link entry");
                    None
                }
            })
            .collect())
    }

    async fn site_from(&self, content: &Listing) -> Result<SiteContent, ContentError> {
        match self.document::<SiteContent>(content, SITE_FILE).await? {
            Some(site) => Ok(site),
            None => {
                debug!("No {} in content folder, using default site text", SITE_FILE);
                Ok(SiteContent::default())
            }
        }
    }

    async fn galleries_with_metadata(
        &self,
        root: &Listing,
    ) -> Result<(Vec<EventGallery>, Vec<FolderMetadata>), ContentError> {
        let listings = self.gallery_listings(root).await?;
        let metadata = listings.iter().map(Listing::metadata).collect();

        let mut galleries = Vec::with_capacity(listings.len());
        for listing in &listings {
            let info = self.gallery_info(listing).await?;
            if let Some(gallery) = build_gallery(listing, info) {
                galleries.push(gallery);
            }
        }
        galleries.sort_by(compare_galleries);
        Ok((galleries, metadata))
    }

    /// `gallery.json` of one gallery. A broken document only loses the
    /// overrides; the gallery is still built from its folder.
    async fn gallery_info(&self, listing: &Listing) -> Result<GalleryInfo, ContentError> {
        match self.document::<GalleryInfo>(listing, GALLERY_INFO_FILE).await {
            Ok(info) => Ok(info.unwrap_or_default()),
            Err(e @ ContentError::MalformedContent { .. }) => {
                warn!(gallery = %listing.folder.name, error = %e, "Ignoring gallery info");
                Ok(GalleryInfo::default())
            }
            Err(e) => Err(e),
        }
    }
}

fn required(value: Option<String>, field: &str, context: &str) -> Result<String, ContentError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ContentError::malformed(context, format!("missing `{}`", field)))
}

fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Resolve an image reference: a file name in the folder, or a URL/path.
fn resolve_image(reference: Option<&str>, listing: &Listing) -> ImageRef {
    match reference.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reference) => match listing.find(reference) {
            Some(file) => ImageRef::drive(&file.id),
            None => ImageRef::from_reference(reference),
        },
        None => ImageRef::default(),
    }
}

fn officer_from_value(value: Value, content: &Listing) -> Result<Officer, ContentError> {
    let entry: OfficerEntry = serde_json::from_value(value)
        .map_err(|e| ContentError::malformed(OFFICERS_FILE, e.to_string()))?;
    let flag = entry.flag_glyph();
    let image = resolve_image(entry.image.as_deref(), content);

    Ok(Officer {
        name: required(entry.name, "name", OFFICERS_FILE)?,
        role: required(entry.role, "role", OFFICERS_FILE)?,
        year: text(entry.year),
        image,
        major: text(entry.major),
        country: text(entry.country),
        flag,
        quote: text(entry.quote),
    })
}

fn link_from_value(value: Value) -> Result<ImportantLink, ContentError> {
    let entry: LinkEntry = serde_json::from_value(value)
        .map_err(|e| ContentError::malformed(LINKS_FILE, e.to_string()))?;
    Ok(ImportantLink {
        title: required(entry.title, "title", LINKS_FILE)?,
        url: required(entry.url, "url", LINKS_FILE)?,
        description: entry.description.filter(|d| !d.trim().is_empty()),
    })
}

fn is_cover_name(name: &str) -> bool {
    name.rsplit_once('.')
        .map_or(false, |(stem, _)| stem.eq_ignore_ascii_case("cover"))
}

fn build_gallery(listing: &Listing, info: GalleryInfo) -> Option<EventGallery> {
    let image_files: Vec<&DriveFile> = listing.children.iter().filter(|f| f.is_image()).collect();
    if image_files.is_empty() {
        debug!(gallery = %listing.folder.name, "Skipping gallery without images");
        return None;
    }

    let (folder_date, folder_title) = split_folder_name(&listing.folder.name);

    let cover_file = info
        .cover
        .as_deref()
        .and_then(|name| image_files.iter().find(|f| f.name.eq_ignore_ascii_case(name.trim())))
        .or_else(|| image_files.iter().find(|f| is_cover_name(&f.name)))
        .or_else(|| image_files.first())
        .copied();

    let images: Vec<EventImage> = image_files
        .iter()
        .map(|file| EventImage {
            image: ImageRef::drive(&file.id),
            caption: file
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| caption_from_file_name(&file.name)),
        })
        .collect();

    Some(EventGallery {
        id: listing.folder.id.clone(),
        title: info
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(folder_title),
        date: info.date.or(folder_date).unwrap_or_default(),
        description: text(info.description),
        cover: cover_file.map(|f| ImageRef::drive(&f.id)).unwrap_or_default(),
        image_count: images.len(),
        images,
    })
}

/// Newest first, undated last, then by title.
fn compare_galleries(a: &EventGallery, b: &EventGallery) -> Ordering {
    match (a.sort_date(), b.sort_date()) {
        (Some(da), Some(db)) => db.cmp(&da).then_with(|| a.title.cmp(&b.title)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.title.cmp(&b.title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryDrive;

    fn fetcher(drive: &Arc<MemoryDrive>) -> Fetcher {
        Fetcher::new(
            drive.clone(),
            ContentFolders {
                content: "content".into(),
                gallery: "gallery".into(),
            },
        )
    }

    #[tokio::test]
    async fn test_fetch_all_builds_snapshot() {
        let drive = Arc::new(MemoryDrive::sample(3));
        let fetched = fetcher(&drive).fetch_all().await.unwrap();

        assert_eq!(fetched.snapshot.officers.len(), 3);
        assert_eq!(fetched.snapshot.links.len(), 1);
        assert_eq!(fetched.snapshot.galleries.len(), 2);
        assert_eq!(fetched.snapshot.site.title, "Test Club");
        // content, gallery root, two gallery subfolders
        assert_eq!(fetched.metadata.len(), 4);
    }

    #[tokio::test]
    async fn test_officer_image_resolves_to_drive_file() {
        let drive = Arc::new(MemoryDrive::sample(1));
        let officers = fetcher(&drive).fetch_officers().await.unwrap();
        let officer = &officers[0];
        assert!(officer.image.primary.contains("officer-photo-0"));
        assert!(!officer.image.fallbacks.is_empty());
        assert_eq!(officer.flag, "\u{1F1EC}\u{1F1ED}");
    }

    #[tokio::test]
    async fn test_malformed_officer_is_skipped() {
        let drive = Arc::new(MemoryDrive::sample(2));
        drive.put_document(
            "content",
            OFFICERS_FILE,
            r#"[
                {"name": "Ada", "role": "President"},
                {"role": "Treasurer"},
                "not an object",
                {"name": "Ben", "role": "Secretary", "image": "https://example.org/ben.png"}
            ]"#,
        );
        let officers = fetcher(&drive).fetch_officers().await.unwrap();
        let names: Vec<&str> = officers.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Ben"]);
        assert_eq!(officers[1].image.primary, "https://example.org/ben.png");
    }

    #[tokio::test]
    async fn test_broken_officers_document_is_an_error() {
        let drive = Arc::new(MemoryDrive::sample(2));
        drive.put_document("content", OFFICERS_FILE, "{ nope");
        let err = fetcher(&drive).fetch_all().await.unwrap_err();
        assert!(matches!(err, ContentError::MalformedContent { .. }));
    }

    #[tokio::test]
    async fn test_missing_optional_documents_use_defaults() {
        let drive = Arc::new(MemoryDrive::sample(1));
        drive.remove_file("content", LINKS_FILE);
        drive.remove_file("content", SITE_FILE);
        let fetcher = fetcher(&drive);
        assert!(fetcher.fetch_links().await.unwrap().is_empty());
        assert_eq!(fetcher.fetch_site_content().await.unwrap(), SiteContent::default());
    }

    #[tokio::test]
    async fn test_galleries_sorted_newest_first_with_overrides() {
        let drive = Arc::new(MemoryDrive::sample(1));
        let galleries = fetcher(&drive).fetch_galleries().await.unwrap();
        assert_eq!(galleries[0].title, "Culture Night");
        assert_eq!(galleries[0].date, "2024-11-02");
        assert_eq!(galleries[1].title, "Spring Gala Highlights");
        assert_eq!(galleries[1].description, "Our biggest night of the year");
        assert_eq!(galleries[1].image_count, 2);
        // cover.jpg wins over the first image
        assert!(galleries[1].cover.primary.contains("gala-cover"));
        assert_eq!(galleries[1].images[0].caption, "Opening dance");
        assert_eq!(galleries[1].images[1].caption, "cover");
    }

    #[tokio::test]
    async fn test_source_unavailable_aborts_fetch() {
        let drive = Arc::new(MemoryDrive::sample(1));
        drive.set_offline(true);
        let err = fetcher(&drive).fetch_all().await.unwrap_err();
        assert!(matches!(err, ContentError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_current_metadata_matches_fetch_metadata() {
        let drive = Arc::new(MemoryDrive::sample(2));
        let fetcher = fetcher(&drive);
        let fetched = fetcher.fetch_all().await.unwrap();
        let current = fetcher.current_metadata().await.unwrap();
        assert_eq!(fetched.metadata, current);
    }

    #[test]
    fn test_is_cover_name() {
        assert!(is_cover_name("Cover.JPG"));
        assert!(!is_cover_name("discover.jpg"));
        assert!(!is_cover_name("cover"));
    }
}
