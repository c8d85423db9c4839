//! Application configuration.
//!
//! Two layers are merged into `SiteSettings`:
//!
//! - `Config`: persisted defaults at `~/.config/clubcache/config.json`
//! - environment variables (usually from a `.env` file), which win
//!
//! The API key may also come from the OS keyring. Missing required values are
//! reported as `ContentError::ConfigurationMissing` naming every absent variable.

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::DEFAULT_CACHE_EXPIRY_HOURS;
use crate::credentials::CredentialStore;
use crate::error::ContentError;

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "clubcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_KEY: &str = "CLUBCACHE_API_KEY";
pub const ENV_CONTENT_FOLDER: &str = "CLUBCACHE_CONTENT_FOLDER_ID";
pub const ENV_GALLERY_FOLDER: &str = "CLUBCACHE_GALLERY_FOLDER_ID";
pub const ENV_CALENDAR_ID: &str = "CLUBCACHE_CALENDAR_ID";
pub const ENV_CACHE_EXPIRY_HOURS: &str = "CLUBCACHE_CACHE_EXPIRY_HOURS";
pub const ENV_REFRESH_INTERVAL_MINS: &str = "CLUBCACHE_REFRESH_INTERVAL_MINS";
pub const ENV_CALENDAR_MAX_RESULTS: &str = "CLUBCACHE_CALENDAR_MAX_RESULTS";

/// Periodic revalidation interval when not configured.
const DEFAULT_REFRESH_INTERVAL_MINS: u64 = 15;

/// Upcoming events to request when not configured.
const DEFAULT_CALENDAR_MAX_RESULTS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub content_folder_id: Option<String>,
    pub gallery_folder_id: Option<String>,
    pub calendar_id: Option<String>,
    pub cache_expiry_hours: Option<i64>,
    pub refresh_interval_mins: Option<u64>,
    pub calendar_max_results: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

/// Fully resolved settings the content layer runs with.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub api_key: String,
    pub content_folder_id: String,
    pub gallery_folder_id: String,
    /// Events page is disabled without a calendar
    pub calendar_id: Option<String>,
    pub cache_expiry: Duration,
    pub refresh_interval: StdDuration,
    pub calendar_max_results: usize,
}

impl SiteSettings {
    /// Resolve from the process environment, falling back to the keyring for the API key.
    pub fn from_env(config: &Config) -> Result<Self, ContentError> {
        Self::resolve(
            config,
            |name| std::env::var(name).ok(),
            || CredentialStore::get_api_key().ok(),
        )
    }

    /// Resolve from an arbitrary variable lookup.
    pub fn resolve(
        config: &Config,
        lookup: impl Fn(&str) -> Option<String>,
        stored_api_key: impl FnOnce() -> Option<String>,
    ) -> Result<Self, ContentError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = var(ENV_API_KEY).or_else(stored_api_key);
        let content_folder_id = var(ENV_CONTENT_FOLDER).or_else(|| config.content_folder_id.clone());
        let gallery_folder_id = var(ENV_GALLERY_FOLDER).or_else(|| config.gallery_folder_id.clone());
        let calendar_id = var(ENV_CALENDAR_ID).or_else(|| config.calendar_id.clone());

        let mut missing = Vec::new();
        if api_key.is_none() {
            missing.push(ENV_API_KEY);
        }
        if content_folder_id.is_none() {
            missing.push(ENV_CONTENT_FOLDER);
        }
        if gallery_folder_id.is_none() {
            missing.push(ENV_GALLERY_FOLDER);
        }
        let (Some(api_key), Some(content_folder_id), Some(gallery_folder_id)) =
            (api_key, content_folder_id, gallery_folder_id)
        else {
            return Err(ContentError::ConfigurationMissing(format!(
                "set {} (environment or .env file)",
                missing.join(", ")
            )));
        };

        let expiry_hours = parse_number(&var, ENV_CACHE_EXPIRY_HOURS)?
            .or(config.cache_expiry_hours)
            .unwrap_or(DEFAULT_CACHE_EXPIRY_HOURS);
        let refresh_mins = parse_number(&var, ENV_REFRESH_INTERVAL_MINS)?
            .or(config.refresh_interval_mins)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_MINS);
        let max_results = parse_number(&var, ENV_CALENDAR_MAX_RESULTS)?
            .or(config.calendar_max_results)
            .unwrap_or(DEFAULT_CALENDAR_MAX_RESULTS);

        let settings = Self {
            api_key,
            content_folder_id,
            gallery_folder_id,
            calendar_id,
            cache_expiry: Duration::try_hours(expiry_hours.max(0))
                .ok_or_else(|| out_of_range(ENV_CACHE_EXPIRY_HOURS, expiry_hours))?,
            refresh_interval: refresh_mins
                .max(1)
                .checked_mul(60)
                .map(StdDuration::from_secs)
                .ok_or_else(|| out_of_range(ENV_REFRESH_INTERVAL_MINS, refresh_mins))?,
            calendar_max_results: max_results.max(1),
        };
        debug!(
            content_folder = %settings.content_folder_id,
            gallery_folder = %settings.gallery_folder_id,
            calendar = settings.calendar_id.is_some(),
            "Site settings resolved"
        );
        Ok(settings)
    }

    /// Per-site cache directory, keyed by content folder so two sites never
    /// share a cache.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        Ok(app_cache_dir()?.join(&self.content_folder_id))
    }
}

/// Root of everything clubcache keeps in the user cache directory.
pub fn app_cache_dir() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
    Ok(cache_dir.join(APP_NAME))
}

fn out_of_range(name: &str, value: impl std::fmt::Display) -> ContentError {
    ContentError::ConfigurationMissing(format!("{} is out of range, got {}", name, value))
}

fn parse_number<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ContentError> {
    match var(name) {
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            ContentError::ConfigurationMissing(format!("{} must be a number, got {:?}", name, raw))
        }),
        None => Ok(None),
    }
}
