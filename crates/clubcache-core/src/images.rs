//! Image references and their fallback URL variants.
//!
//! Drive-hosted images are notoriously picky about which host and size
//! parameters load in a given context, so every image carries an ordered list
//! of candidate URLs. The presentation layer tries them in order through
//! `ImageAttempts`; nothing here probes the network.

use serde::{Deserialize, Serialize};

/// Hard cap on how many URLs are tried for one image.
pub const MAX_IMAGE_CANDIDATES: usize = 4;

/// Preferred rendered width for Drive thumbnails.
const DRIVE_IMAGE_WIDTH: u32 = 1000;

/// Primary URL plus alternates to try on load failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub primary: String,
    #[serde(default)]
    pub fallbacks: Vec<String>,
}

impl ImageRef {
    pub fn from_source(source: &ImageSource) -> Self {
        let mut candidates = source.candidates().into_iter();
        let primary = candidates.next().unwrap_or_default();
        Self {
            primary,
            fallbacks: candidates.collect(),
        }
    }

    /// Classify a raw reference (URL, Drive link or asset path) and expand it.
    pub fn from_reference(reference: &str) -> Self {
        Self::from_source(&ImageSource::classify(reference))
    }

    pub fn drive(file_id: &str) -> Self {
        Self::from_source(&ImageSource::DriveHosted {
            file_id: file_id.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    /// All candidates in the order they should be tried.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str())
            .chain(self.fallbacks.iter().map(String::as_str))
            .filter(|url| !url.is_empty())
    }

    pub fn attempts(&self) -> ImageAttempts<'_> {
        self.attempts_after(0)
    }

    /// Cursor resumed after `failures` candidates already failed to load.
    pub fn attempts_after(&self, failures: usize) -> ImageAttempts<'_> {
        ImageAttempts {
            image: self,
            failures: failures.min(self.candidate_count()),
        }
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates().take(MAX_IMAGE_CANDIDATES).count()
    }
}

/// Where an image lives, which decides the candidate strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    DriveHosted { file_id: String },
    LocalAsset { path: String },
    Generic { url: String },
}

impl ImageSource {
    pub fn classify(reference: &str) -> Self {
        let reference = reference.trim();
        if let Some(file_id) = drive_file_id(reference) {
            return ImageSource::DriveHosted { file_id };
        }
        if reference.contains("://") || reference.starts_with("data:") {
            ImageSource::Generic {
                url: reference.to_string(),
            }
        } else {
            ImageSource::LocalAsset {
                path: reference.to_string(),
            }
        }
    }

    /// Candidate URLs in fixed priority order, bounded by `MAX_IMAGE_CANDIDATES`.
    pub fn candidates(&self) -> Vec<String> {
        let mut urls = match self {
            ImageSource::DriveHosted { file_id } => vec![
                format!(
                    "https://drive.google.com/thumbnail?id={}&sz=w{}",
                    file_id, DRIVE_IMAGE_WIDTH
                ),
                format!(
                    "https://lh3.googleusercontent.com/d/{}=w{}",
                    file_id, DRIVE_IMAGE_WIDTH
                ),
                format!("https://drive.google.com/uc?export=view&id={}", file_id),
                format!(
                    "https://drive.usercontent.google.com/download?id={}&export=view",
                    file_id
                ),
            ],
            ImageSource::LocalAsset { path } => {
                let trimmed = path.trim_start_matches("./");
                if trimmed.starts_with('/') {
                    vec![trimmed.to_string()]
                } else {
                    vec![format!("/{}", trimmed), format!("/assets/{}", trimmed)]
                }
            }
            ImageSource::Generic { url } => vec![url.clone()],
        };
        urls.dedup();
        urls.truncate(MAX_IMAGE_CANDIDATES);
        urls
    }
}

/// Extract a Drive file id from the usual sharing URL shapes.
fn drive_file_id(reference: &str) -> Option<String> {
    if !(reference.contains("drive.google.com")
        || reference.contains("googleusercontent.com")
        || reference.starts_with("drive:"))
    {
        return None;
    }

    let candidate = if let Some(rest) = reference.strip_prefix("drive:") {
        rest
    } else if let Some((_, rest)) = reference.split_once("/d/") {
        rest.split(['/', '?', '=', '&', '#']).next().unwrap_or_default()
    } else if let Some((_, rest)) = reference.split_once("id=") {
        rest.split(['&', '#']).next().unwrap_or_default()
    } else {
        return None;
    };

    let valid = !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| candidate.to_string())
}

/// Cursor over an image's candidates for the rendering side.
#[derive(Debug, Clone)]
pub struct ImageAttempts<'a> {
    image: &'a ImageRef,
    failures: usize,
}

impl<'a> ImageAttempts<'a> {
    /// URL to load now, `None` once every candidate has failed.
    pub fn current(&self) -> Option<&'a str> {
        self.image
            .candidates()
            .take(MAX_IMAGE_CANDIDATES)
            .nth(self.failures)
    }

    /// Record a load failure and return the next URL to try.
    pub fn on_failure(&mut self) -> Option<&'a str> {
        if self.current().is_some() {
            self.failures += 1;
        }
        self.current()
    }

    pub fn exhausted(&self) -> bool {
        self.current().is_none()
    }

    pub fn failures(&self) -> usize {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_drive_links() {
        let cases = [
            "https://drive.google.com/file/d/1AbC_d-9/view?usp=sharing",
            "https://drive.google.com/open?id=1AbC_d-9",
            "https://drive.google.com/uc?export=view&id=1AbC_d-9",
            "https://lh3.googleusercontent.com/d/1AbC_d-9=w400",
            "drive:1AbC_d-9",
        ];
        for case in cases {
            assert_eq!(
                ImageSource::classify(case),
                ImageSource::DriveHosted {
                    file_id: "1AbC_d-9".into()
                },
                "{}",
                case
            );
        }
    }

    #[test]
    fn test_classify_generic_and_local() {
        assert!(matches!(
            ImageSource::classify("https://example.org/a.png"),
            ImageSource::Generic { .. }
        ));
        assert!(matches!(
            ImageSource::classify("./images/logo.png"),
            ImageSource::LocalAsset { .. }
        ));
    }

    #[test]
    fn test_drive_candidates_are_distinct_and_bounded() {
        let image = ImageRef::drive("abc");
        let all: Vec<&str> = image.candidates().collect();
        assert!(all.len() <= MAX_IMAGE_CANDIDATES);
        assert!(all[0].contains("thumbnail?id=abc"));
        let mut unique = all.clone();
        unique.dedup();
        assert_eq!(unique.len(), all.len());
    }

    #[test]
    fn test_local_asset_candidates() {
        let image = ImageRef::from_reference("images/logo.png");
        assert_eq!(image.primary, "/images/logo.png");
        assert_eq!(image.fallbacks, vec!["/assets/images/logo.png".to_string()]);
    }

    #[test]
    fn test_attempts_walk_candidates_then_stop() {
        let image = ImageRef::drive("abc");
        let mut attempts = image.attempts();
        let first = attempts.current().unwrap();
        assert_eq!(first, image.primary);

        let mut seen = 1;
        while attempts.on_failure().is_some() {
            seen += 1;
        }
        assert_eq!(seen, 1 + image.fallbacks.len());
        assert!(attempts.exhausted());
        assert!(attempts.on_failure().is_none());
    }

    #[test]
    fn test_attempts_resume_after_failures() {
        let image = ImageRef::drive("abc");
        let resumed = image.attempts_after(2);
        assert_eq!(resumed.failures(), 2);
        assert_eq!(resumed.current(), Some(image.fallbacks[1].as_str()));

        let past_end = image.attempts_after(99);
        assert_eq!(past_end.failures(), image.candidate_count());
        assert!(past_end.exhausted());
    }

    #[test]
    fn test_empty_image_has_no_attempts() {
        let image = ImageRef::default();
        assert!(image.attempts().exhausted());
    }
}
