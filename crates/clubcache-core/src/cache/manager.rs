use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::CalendarEvent;

/// Consider auxiliary cached data (calendar events) stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

const EVENTS_CACHE: &str = "events";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        age_display(self.cached_at)
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

/// "just now", "12m ago", "3h ago", "2d ago", rounding hours and days to nearest.
pub fn age_display(since: DateTime<Utc>) -> String {
    let minutes = (Utc::now() - since).num_minutes();
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// JSON files in a per-user cache directory.
#[derive(Debug, Clone)]
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(value))
    }

    /// Write through a temporary file and rename, so readers never observe a
    /// half-written cache.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.cache_path(name);
        let tmp = self.cache_dir.join(format!(".{}.json.tmp", name));
        let contents = serde_json::to_string_pretty(value)?;
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace cache file: {}", name))?;
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.cache_path(name);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove cache file: {}", name))?;
        }
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        self.read_json(name)
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        self.write_json(name, &CachedData::new(data))
    }

    // ===== Calendar Events =====

    pub fn load_events(&self) -> Result<Option<CachedData<Vec<CalendarEvent>>>> {
        self.load(EVENTS_CACHE)
    }

    pub fn save_events(&self, events: &[CalendarEvent]) -> Result<()> {
        self.save(EVENTS_CACHE, &events)
    }

    pub fn clear_events(&self) -> Result<()> {
        self.remove(EVENTS_CACHE)
    }

    /// Age of the events cache for the status bar, logging errors without failing
    pub fn events_age(&self) -> Option<String> {
        match self.load_events() {
            Ok(Some(cached)) => Some(cached.age_display()),
            Ok(None) => None,
            Err(e) => {
                debug!(error = %e, "Failed to load events cache for age display");
                None
            }
        }
    }
}
