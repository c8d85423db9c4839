//! Application state management for clubcache.
//!
//! `App` holds navigation history, list selections and the latest
//! `ContentView` published by the refresh orchestrator. Calendar events are
//! fetched on a background task and delivered back through a channel.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use clubcache_core::api::{ApiClient, CalendarClient, CalendarSource, DriveClient};
use clubcache_core::cache::{CacheManager, FileCacheStore};
use clubcache_core::config::ENV_CALENDAR_ID;
use clubcache_core::fetcher::{ContentFolders, Fetcher};
use clubcache_core::images::ImageRef;
use clubcache_core::models::{CalendarEvent, EventGallery, Officer};
use clubcache_core::navigation::{
    reduce, HistoryEffect, Location, Modal, NavEvent, NavState, Page,
};
use clubcache_core::{ContentError, ContentView, RefreshOrchestrator, SiteSettings};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    ConfirmingClearCache,
    Quitting,
}

/// Results sent back from background tasks.
enum BackgroundResult {
    Events(Vec<CalendarEvent>),
    EventsFailed(String),
}

/// Calendar wiring, only present when a calendar id is configured.
struct CalendarFeed {
    source: Arc<dyn CalendarSource>,
    max_results: usize,
}

pub struct App {
    pub state: AppState,
    pub nav: NavState,
    back_stack: Vec<Location>,
    forward_stack: Vec<Location>,

    // Site content
    pub content: ContentView,
    orchestrator: Option<RefreshOrchestrator>,
    content_rx: Option<watch::Receiver<ContentView>>,
    refresh_interval: Option<Duration>,

    // Calendar
    calendar: Option<CalendarFeed>,
    cache: Option<CacheManager>,
    pub events: Vec<CalendarEvent>,
    pub events_loading: bool,
    pub events_error: Option<String>,
    pub events_age: Option<String>,

    // Selections
    pub officer_selection: usize,
    pub gallery_selection: usize,
    pub event_selection: usize,
    pub image_selection: usize,
    /// Candidate URLs of the shown image that failed to load
    pub image_failures: usize,

    pub status_message: Option<String>,

    bg_rx: mpsc::Receiver<BackgroundResult>,
    bg_tx: mpsc::Sender<BackgroundResult>,
}

impl App {
    /// Create the application. Without usable settings the app still starts,
    /// showing built-in content and the configuration error.
    pub fn new(settings: Result<SiteSettings, ContentError>, start: Location) -> Result<Self> {
        let (bg_tx, bg_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let mut app = Self {
            state: AppState::Normal,
            nav: NavState::default(),
            back_stack: Vec::new(),
            forward_stack: Vec::new(),

            content: ContentView::unavailable(&ContentError::ConfigurationMissing(
                "site settings not loaded".to_string(),
            )),
            orchestrator: None,
            content_rx: None,
            refresh_interval: None,

            calendar: None,
            cache: None,
            events: Vec::new(),
            events_loading: false,
            events_error: None,
            events_age: None,

            officer_selection: 0,
            gallery_selection: 0,
            event_selection: 0,
            image_selection: 0,
            image_failures: 0,

            status_message: None,

            bg_rx,
            bg_tx,
        };

        match settings {
            Ok(settings) => app.connect(&settings)?,
            Err(e) => {
                warn!(error = %e, "Starting without site settings");
                app.content = ContentView::unavailable(&e);
            }
        }

        app.set_nav(start.into());
        Ok(app)
    }

    fn connect(&mut self, settings: &SiteSettings) -> Result<()> {
        let api = ApiClient::new(settings.api_key.clone())?;

        let cache_dir = settings
            .cache_dir()
            .unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");
        let cache = CacheManager::new(cache_dir)?;

        let fetcher = Fetcher::new(
            Arc::new(DriveClient::new(api.clone())),
            ContentFolders {
                content: settings.content_folder_id.clone(),
                gallery: settings.gallery_folder_id.clone(),
            },
        );
        let store = FileCacheStore::new(cache.clone(), settings.cache_expiry);
        let orchestrator = RefreshOrchestrator::new(fetcher, Arc::new(store));

        self.content = orchestrator.view();
        self.content_rx = Some(orchestrator.subscribe());
        self.orchestrator = Some(orchestrator);
        self.refresh_interval = Some(settings.refresh_interval);

        self.calendar = settings.calendar_id.as_ref().map(|id| CalendarFeed {
            source: Arc::new(CalendarClient::new(api.clone(), id.clone())),
            max_results: settings.calendar_max_results,
        });
        self.cache = Some(cache);
        Ok(())
    }

    /// Mount the orchestrator and load calendar events. Content arrives
    /// asynchronously through `check_background_tasks`.
    pub fn start(&mut self) {
        if let Some(orchestrator) = self.orchestrator.clone() {
            let interval = self.refresh_interval;
            tokio::spawn(async move {
                // Revalidation after a cache hit runs detached.
                let _ = orchestrator.mount().await;
                if let Some(every) = interval {
                    orchestrator.spawn_periodic(every);
                }
            });
        }

        if self.calendar.is_none() {
            self.events_error = Some(format!(
                "Calendar not configured (set {})",
                ENV_CALENDAR_ID
            ));
            return;
        }

        if self.load_events_from_cache() {
            debug!("Events cache is fresh");
        } else {
            self.refresh_events();
        }
    }

    /// Stop background work before exit.
    pub fn shutdown(&self) {
        if let Some(ref orchestrator) = self.orchestrator {
            orchestrator.unmount();
        }
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Refetch everything, ignoring the cache.
    pub fn refresh(&mut self) {
        match self.orchestrator.clone() {
            Some(orchestrator) => {
                tokio::spawn(async move { orchestrator.refresh().await });
                self.status_message = Some("Refreshing content...".to_string());
            }
            None => {
                self.status_message = Some("Cannot refresh: site settings are missing".to_string());
            }
        }
        self.refresh_events();
    }

    pub fn clear_cache(&mut self) {
        info!("Clearing caches");
        if let Some(orchestrator) = self.orchestrator.clone() {
            tokio::spawn(async move { orchestrator.clear_cache().await });
        }
        if let Some(ref cache) = self.cache {
            if let Err(e) = cache.clear_events() {
                warn!(error = %e, "Failed to clear events cache");
            }
        }
        self.events.clear();
        self.events_age = None;
        self.status_message = Some("Cache cleared, reloading...".to_string());
        self.refresh_events();
    }

    pub fn dismiss_error(&mut self) {
        if let Some(ref orchestrator) = self.orchestrator {
            orchestrator.dismiss_error();
        }
        self.content.error = None;
        self.status_message = None;
    }

    pub fn is_changed(&self, record_id: &str) -> bool {
        self.content.is_changed(record_id)
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let view = match self.content_rx.as_mut() {
            Some(rx) if rx.has_changed().unwrap_or(false) => Some(rx.borrow_and_update().clone()),
            _ => None,
        };
        if let Some(view) = view {
            self.apply_view(view);
        }

        while let Ok(result) = self.bg_rx.try_recv() {
            self.process_background_result(result);
        }
    }

    fn apply_view(&mut self, view: ContentView) {
        if !view.change_detected.is_empty() && view.change_detected != self.content.change_detected {
            self.status_message = Some(format!(
                "{} updated since your last visit",
                crate::utils::plural(view.change_detected.len(), "item")
            ));
        } else if !view.loading && self.status_message.as_deref() == Some("Refreshing content...") {
            self.status_message = None;
        }
        self.content = view;
        self.clamp_selections();
        self.sync_selection_to_modal();
    }

    fn process_background_result(&mut self, result: BackgroundResult) {
        self.events_loading = false;
        match result {
            BackgroundResult::Events(events) => {
                if let Some(ref cache) = self.cache {
                    if let Err(e) = cache.save_events(&events) {
                        warn!(error = %e, "Failed to cache calendar events");
                    }
                    self.events_age = cache.events_age();
                }
                info!(count = events.len(), "Calendar events loaded");
                self.events = events;
                self.events_error = None;
                self.clamp_selections();
            }
            BackgroundResult::EventsFailed(message) => {
                self.events_error = Some(message);
            }
        }
    }

    // =========================================================================
    // Calendar
    // =========================================================================

    /// Load cached events. Returns true if they are fresh enough to skip a fetch.
    fn load_events_from_cache(&mut self) -> bool {
        let Some(ref cache) = self.cache else {
            return false;
        };
        match cache.load_events() {
            Ok(Some(cached)) => {
                let fresh = !cached.is_stale();
                self.events_age = Some(cached.age_display());
                self.events = cached.data;
                fresh
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Failed to load events cache");
                false
            }
        }
    }

    pub fn refresh_events(&mut self) {
        let Some(ref feed) = self.calendar else {
            return;
        };
        let source = feed.source.clone();
        let max_results = feed.max_results;
        let tx = self.bg_tx.clone();
        self.events_loading = true;

        tokio::spawn(async move {
            let result = match source.upcoming_events(max_results).await {
                Ok(events) => BackgroundResult::Events(events),
                Err(e) => {
                    warn!(error = %e, "Failed to fetch calendar events");
                    BackgroundResult::EventsFailed(ContentError::from(e).to_string())
                }
            };
            if tx.send(result).await.is_err() {
                debug!("App closed before events arrived");
            }
        });
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Run a navigation event through the reducer and record history.
    pub fn dispatch(&mut self, event: NavEvent) {
        let (next, effect) = reduce(&self.nav, event);
        match effect {
            HistoryEffect::Push(_) => {
                self.back_stack.push(self.nav.location());
                self.forward_stack.clear();
            }
            // The current entry is always `self.nav`, so replacing it is implicit.
            HistoryEffect::Replace(_) | HistoryEffect::None => {}
        }
        self.set_nav(next);
    }

    pub fn go_back(&mut self) -> bool {
        let current = self.nav.location();
        while let Some(previous) = self.back_stack.pop() {
            if previous == current {
                continue;
            }
            self.forward_stack.push(current);
            self.dispatch(NavEvent::PopState(previous));
            return true;
        }
        false
    }

    pub fn go_forward(&mut self) -> bool {
        let current = self.nav.location();
        while let Some(next) = self.forward_stack.pop() {
            if next == current {
                continue;
            }
            self.back_stack.push(current);
            self.dispatch(NavEvent::PopState(next));
            return true;
        }
        false
    }

    pub fn can_go_back(&self) -> bool {
        self.back_stack.iter().any(|l| *l != self.nav.location())
    }

    fn set_nav(&mut self, next: NavState) {
        if next.modal != self.nav.modal {
            self.image_selection = 0;
            self.image_failures = 0;
        }
        self.nav = next;
        self.sync_selection_to_modal();
    }

    /// Keep the list cursor on the entity a (possibly deep-linked) modal shows.
    fn sync_selection_to_modal(&mut self) {
        match &self.nav.modal {
            Some(Modal::Officer(name)) => {
                if let Some(i) = self.content.data.officers.iter().position(|o| o.matches_name(name)) {
                    self.officer_selection = i;
                }
            }
            Some(Modal::Gallery(id)) => {
                if let Some(i) = self.content.data.galleries.iter().position(|g| g.id == *id) {
                    self.gallery_selection = i;
                }
            }
            None => {}
        }
    }

    /// Open the modal for the selected item on the current page.
    pub fn open_selected(&mut self) {
        let modal = match self.nav.page {
            Page::Home => self.selected_officer().map(|o| Modal::Officer(o.name.clone())),
            Page::Gallery => self.selected_gallery().map(|g| Modal::Gallery(g.id.clone())),
            Page::History | Page::Events => None,
        };
        if let Some(modal) = modal {
            self.dispatch(NavEvent::OpenModal(modal));
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Move the cursor of whatever list is active.
    pub fn move_selection(&mut self, delta: isize) {
        if let Some(Modal::Gallery(_)) = self.nav.modal {
            let count = self.modal_gallery().map_or(0, |g| g.images.len());
            let before = self.image_selection;
            self.image_selection = step(self.image_selection, delta, count);
            if self.image_selection != before {
                self.image_failures = 0;
            }
            return;
        }
        if self.nav.modal.is_some() {
            return;
        }
        match self.nav.page {
            Page::Home => {
                let count = self.content.data.officers.len();
                self.officer_selection = step(self.officer_selection, delta, count);
            }
            Page::Gallery => {
                let count = self.content.data.galleries.len();
                self.gallery_selection = step(self.gallery_selection, delta, count);
            }
            Page::Events => {
                self.event_selection = step(self.event_selection, delta, self.events.len());
            }
            Page::History => {}
        }
    }

    fn clamp_selections(&mut self) {
        let clamp = |selection: usize, len: usize| selection.min(len.saturating_sub(1));
        self.officer_selection = clamp(self.officer_selection, self.content.data.officers.len());
        self.gallery_selection = clamp(self.gallery_selection, self.content.data.galleries.len());
        self.event_selection = clamp(self.event_selection, self.events.len());
        let images = self.modal_gallery().map_or(0, |g| g.images.len());
        self.image_selection = clamp(self.image_selection, images);
    }

    pub fn selected_officer(&self) -> Option<&Officer> {
        self.content.data.officers.get(self.officer_selection)
    }

    pub fn selected_gallery(&self) -> Option<&EventGallery> {
        self.content.data.galleries.get(self.gallery_selection)
    }

    pub fn selected_event(&self) -> Option<&CalendarEvent> {
        self.events.get(self.event_selection)
    }

    pub fn modal_officer(&self) -> Option<&Officer> {
        match &self.nav.modal {
            Some(Modal::Officer(name)) => self.content.data.find_officer(name),
            _ => None,
        }
    }

    pub fn modal_gallery(&self) -> Option<&EventGallery> {
        match &self.nav.modal {
            Some(Modal::Gallery(id)) => self.content.data.find_gallery(id),
            _ => None,
        }
    }

    /// Image shown in the open modal.
    pub fn shown_image(&self) -> Option<&ImageRef> {
        if let Some(officer) = self.modal_officer() {
            return Some(&officer.image);
        }
        let gallery = self.modal_gallery()?;
        gallery
            .images
            .get(self.image_selection)
            .map(|i| &i.image)
            .or(Some(&gallery.cover))
    }

    /// The viewer could not load the shown URL; move to the next candidate.
    pub fn report_image_failure(&mut self) {
        let Some(image) = self.shown_image() else {
            return;
        };
        let mut attempts = image.attempts_after(self.image_failures);
        let total = image.candidate_count();
        let next = attempts.on_failure().is_some();
        let failures = attempts.failures();

        self.image_failures = failures;
        self.status_message = Some(if next {
            format!("Trying image source {} of {}", failures + 1, total)
        } else {
            "No more image sources to try".to_string()
        });
    }
}

/// Move `current` by `delta` within `0..len`, saturating at both ends.
fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = current as isize + delta;
    next.clamp(0, len as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubcache_core::defaults::SAMPLE_GALLERY_ID;
    use clubcache_core::RefreshState;

    fn offline_app(start: &str) -> App {
        let error = ContentError::ConfigurationMissing("CLUBCACHE_API_KEY".to_string());
        App::new(Err(error), Location::parse(start)).unwrap()
    }

    #[test]
    fn test_missing_settings_show_fallback_content() {
        let app = offline_app("");
        assert_eq!(app.content.state, RefreshState::Error);
        assert!(app.content.error.as_deref().unwrap().contains("CLUBCACHE_API_KEY"));
        assert_eq!(app.content.data.galleries[0].id, SAMPLE_GALLERY_ID);
        assert_eq!(app.nav, NavState::default());
    }

    #[test]
    fn test_deep_link_opens_gallery_modal() {
        let app = offline_app("#gallery?event=sample");
        assert_eq!(app.nav.page, Page::Gallery);
        assert_eq!(app.modal_gallery().unwrap().id, SAMPLE_GALLERY_ID);
        assert!(!app.can_go_back());
    }

    #[test]
    fn test_history_back_and_forward() {
        let mut app = offline_app("");
        app.dispatch(NavEvent::Navigate(Page::Gallery));
        app.open_selected();
        assert!(app.modal_gallery().is_some());

        assert!(app.go_back());
        assert_eq!(app.nav, NavState { page: Page::Gallery, modal: None });
        assert!(app.go_back());
        assert_eq!(app.nav.page, Page::Home);
        assert!(!app.go_back());

        assert!(app.go_forward());
        assert_eq!(app.nav.page, Page::Gallery);
        assert!(app.go_forward());
        assert!(app.modal_gallery().is_some());
    }

    #[test]
    fn test_escape_closes_modal_without_new_entry() {
        let mut app = offline_app("#gallery");
        app.open_selected();
        app.dispatch(NavEvent::Escape);
        assert!(app.nav.modal.is_none());
        assert_eq!(app.nav.page, Page::Gallery);
        // Back skips the entry identical to the current location.
        assert!(!app.go_back());
    }

    #[test]
    fn test_image_failure_walks_candidates() {
        let mut app = offline_app("#gallery?event=sample");
        let total = app.shown_image().unwrap().candidate_count();
        assert_eq!(total, 2);

        app.report_image_failure();
        assert_eq!(app.image_failures, 1);
        assert_eq!(app.status_message.as_deref(), Some("Trying image source 2 of 2"));

        app.report_image_failure();
        assert_eq!(app.image_failures, 2);
        assert_eq!(app.status_message.as_deref(), Some("No more image sources to try"));
        assert!(app.shown_image().unwrap().attempts_after(app.image_failures).exhausted());
    }

    #[test]
    fn test_selection_saturates() {
        assert_eq!(step(0, -1, 5), 0);
        assert_eq!(step(3, PAGE_SCROLL_SIZE as isize, 5), 4);
        assert_eq!(step(2, 1, 0), 0);
    }
}
