//! Refresh orchestration: serve cached content immediately, revalidate in the
//! background, and publish a single read model to consumers.
//!
//! State machine:
//!
//! ```text
//! Idle ──mount, no cache──▶ InitialLoading ──▶ Fresh | Error
//! Idle ──mount, cache────▶ CacheHit ──▶ BackgroundRefreshing ──▶ Fresh
//!                                                  └─failure──▶ CacheHit (+error)
//! any ──refresh / clear cache──▶ InitialLoading
//! ```
//!
//! Every fetch takes a generation number and only commits if it is still the
//! latest one, so a slow superseded fetch can never overwrite newer state.
//! `unmount` retires the current generation, which silences in-flight work.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheRecord, CacheStore};
use crate::defaults::fallback_snapshot;
use crate::error::ContentError;
use crate::fetcher::{FetchedContent, Fetcher};
use crate::freshness::{self, Freshness};
use crate::models::ContentSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefreshState {
    Idle,
    InitialLoading,
    CacheHit,
    BackgroundRefreshing,
    Fresh,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStatus {
    Loading,
    CacheHit,
    Fresh,
    Error,
}

impl CacheStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CacheStatus::Loading => "loading",
            CacheStatus::CacheHit => "cache-hit",
            CacheStatus::Fresh => "fresh",
            CacheStatus::Error => "error",
        }
    }
}

/// Everything a consumer needs to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentView {
    pub data: ContentSnapshot,
    pub state: RefreshState,
    pub loading: bool,
    pub initial_loading: bool,
    pub background_refreshing: bool,
    pub error: Option<String>,
    pub is_from_cache: bool,
    pub cache_status: CacheStatus,
    pub last_updated: Option<DateTime<Utc>>,
    pub change_detected: Vec<String>,
}

impl ContentView {
    fn idle() -> Self {
        Self {
            data: ContentSnapshot::default(),
            state: RefreshState::Idle,
            loading: false,
            initial_loading: false,
            background_refreshing: false,
            error: None,
            is_from_cache: false,
            cache_status: CacheStatus::Loading,
            last_updated: None,
            change_detected: Vec::new(),
        }
    }

    /// View for a session that cannot fetch at all, e.g. missing settings.
    pub fn unavailable(error: &ContentError) -> Self {
        Self {
            data: fallback_snapshot(),
            state: RefreshState::Error,
            error: Some(error.to_string()),
            cache_status: CacheStatus::Error,
            ..Self::idle()
        }
    }

    fn begin_loading(&self) -> Self {
        Self {
            state: RefreshState::InitialLoading,
            loading: true,
            initial_loading: true,
            background_refreshing: false,
            cache_status: CacheStatus::Loading,
            change_detected: Vec::new(),
            ..self.clone()
        }
    }

    fn cache_hit(record: &CacheRecord, error: Option<String>) -> Self {
        Self {
            data: record.snapshot.clone(),
            state: RefreshState::CacheHit,
            error,
            is_from_cache: true,
            cache_status: CacheStatus::CacheHit,
            last_updated: Some(record.cached_at),
            ..Self::idle()
        }
    }

    fn fresh(record: &CacheRecord, is_from_cache: bool, change_detected: Vec<String>) -> Self {
        Self {
            data: record.snapshot.clone(),
            state: RefreshState::Fresh,
            is_from_cache,
            cache_status: CacheStatus::Fresh,
            last_updated: Some(record.cached_at),
            change_detected,
            ..Self::idle()
        }
    }

    pub fn is_changed(&self, record_id: &str) -> bool {
        self.change_detected.iter().any(|id| id == record_id)
    }
}

struct Inner {
    fetcher: Fetcher,
    store: Arc<dyn CacheStore>,
    view: watch::Sender<ContentView>,
    generation: AtomicU64,
    mounted: AtomicBool,
    periodic: Mutex<Option<JoinHandle<()>>>,
}

/// Long-lived owner of the content read model. Clone is cheap.
#[derive(Clone)]
pub struct RefreshOrchestrator {
    inner: Arc<Inner>,
}

impl RefreshOrchestrator {
    pub fn new(fetcher: Fetcher, store: Arc<dyn CacheStore>) -> Self {
        let (view, _) = watch::channel(ContentView::idle());
        Self {
            inner: Arc::new(Inner {
                fetcher,
                store,
                view,
                generation: AtomicU64::new(0),
                mounted: AtomicBool::new(false),
                periodic: Mutex::new(None),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ContentView> {
        self.inner.view.subscribe()
    }

    /// Current read model.
    pub fn view(&self) -> ContentView {
        self.inner.view.borrow().clone()
    }

    // ===== Lifecycle =====

    /// Start serving content.
    ///
    /// With a usable cache the snapshot is published at once and a background
    /// revalidation is spawned; its handle is returned. Without one, this
    /// waits for the initial fetch.
    pub async fn mount(&self) -> Option<JoinHandle<()>> {
        self.inner.mounted.store(true, Ordering::SeqCst);

        match self.inner.store.read() {
            Some(record) => {
                info!(age = %record.age_display(), "Serving cached content");
                self.inner.view.send_replace(ContentView::cache_hit(&record, None));
                let this = self.clone();
                Some(tokio::spawn(async move { this.revalidate().await }))
            }
            None => {
                info!("No usable cache, fetching content");
                self.load_fresh().await;
                None
            }
        }
    }

    /// Stop publishing. In-flight fetches finish but their results are dropped.
    pub fn unmount(&self) {
        self.inner.mounted.store(false, Ordering::SeqCst);
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut periodic) = self.inner.periodic.lock() {
            if let Some(handle) = periodic.take() {
                handle.abort();
            }
        }
        debug!("Orchestrator unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    /// Revalidate every `every` until unmounted. Replaces any earlier schedule.
    pub fn spawn_periodic(&self, every: Duration) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately; mount already covered it.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !this.is_mounted() {
                    break;
                }
                let busy = this.inner.view.borrow().loading;
                if busy {
                    debug!("Skipping periodic revalidation, a fetch is in flight");
                    continue;
                }
                this.revalidate().await;
            }
        });

        if let Ok(mut periodic) = self.inner.periodic.lock() {
            if let Some(previous) = periodic.replace(handle) {
                previous.abort();
            }
        }
    }

    // ===== User actions =====

    /// Explicit refresh: blocking refetch regardless of cache state.
    pub async fn refresh(&self) {
        info!("Refresh requested");
        self.load_fresh().await;
    }

    /// Drop the stored record and fetch from scratch.
    pub async fn clear_cache(&self) {
        info!("Clearing content cache");
        // Retire in-flight work so nothing persists after the clear.
        self.next_generation();
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear content cache");
        }
        self.load_fresh().await;
    }

    pub fn dismiss_error(&self) {
        self.inner.view.send_if_modified(|view| view.error.take().is_some());
    }

    // ===== Internals =====

    fn next_generation(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.is_mounted() && self.inner.generation.load(Ordering::SeqCst) == generation
    }

    /// Publish only if `generation` is still the latest request.
    fn commit(&self, generation: u64, view: ContentView) -> bool {
        if self.is_current(generation) {
            self.inner.view.send_replace(view);
            true
        } else {
            debug!(generation, "Discarding superseded result");
            false
        }
    }

    fn persist(&self, record: &CacheRecord) {
        if let Err(e) = self.inner.store.write(record) {
            warn!(error = %e, "Failed to write content cache");
        }
    }

    /// Blocking fetch: `InitialLoading` then `Fresh` or `Error`.
    async fn load_fresh(&self) {
        let generation = self.next_generation();
        if !self.is_current(generation) {
            return;
        }
        let loading = self.inner.view.borrow().begin_loading();
        self.inner.view.send_replace(loading);

        let result = self.inner.fetcher.fetch_all().await;
        if !self.is_current(generation) {
            debug!(generation, "Discarding superseded fetch");
            return;
        }

        match result {
            Ok(FetchedContent { snapshot, metadata }) => {
                let record = CacheRecord::new(snapshot, metadata);
                self.persist(&record);
                self.commit(generation, ContentView::fresh(&record, false, Vec::new()));
            }
            Err(e) => {
                warn!(error = %e, "Content fetch failed");
                let view = match self.inner.store.read() {
                    Some(record) => ContentView {
                        state: RefreshState::Error,
                        cache_status: CacheStatus::Error,
                        ..ContentView::cache_hit(&record, Some(e.to_string()))
                    },
                    None => ContentView::unavailable(&e),
                };
                self.commit(generation, view);
            }
        }
    }

    /// Non-blocking check against the source, refetching only on change.
    pub async fn revalidate(&self) {
        let generation = self.next_generation();
        if !self.is_current(generation) {
            return;
        }

        let cached = self.inner.store.read();
        let settled = {
            let view = self.inner.view.borrow();
            settled_state(view.cache_status)
        };
        // Fallback content is not a baseline to diff against.
        let previous = match &cached {
            Some(record) => Some(record.snapshot.clone()),
            None if settled != RefreshState::Error => Some(self.inner.view.borrow().data.clone()),
            None => None,
        };
        let cached_metadata = cached.as_ref().map(|r| r.metadata.clone()).unwrap_or_default();

        self.inner.view.send_modify(|view| {
            view.state = RefreshState::BackgroundRefreshing;
            view.loading = true;
            view.initial_loading = false;
            view.background_refreshing = true;
        });

        let current = self.inner.fetcher.current_metadata().await;
        if !self.is_current(generation) {
            return;
        }

        match freshness::check(&cached_metadata, current.clone()) {
            Freshness::Fresh => {
                // Unchanged at the source: keep the snapshot, restart its clock.
                let record = match (cached, current) {
                    (Some(record), Ok(metadata)) => record.touched(metadata),
                    _ => return,
                };
                debug!("Content unchanged at source");
                self.persist(&record);
                self.commit(generation, ContentView::fresh(&record, true, Vec::new()));
            }
            Freshness::Stale => {
                info!("Content changed at source, refetching");
                let result = self.inner.fetcher.fetch_all().await;
                if !self.is_current(generation) {
                    return;
                }
                match result {
                    Ok(FetchedContent { snapshot, metadata }) => {
                        let changed = previous
                            .map(|previous| previous.changed_ids(&snapshot))
                            .unwrap_or_default();
                        info!(changed = changed.len(), "Content replaced");
                        let record = CacheRecord::new(snapshot, metadata);
                        self.persist(&record);
                        self.commit(generation, ContentView::fresh(&record, false, changed));
                    }
                    Err(e) => self.background_failed(generation, cached.as_ref(), settled, e),
                }
            }
            Freshness::Unknown(e) => {
                self.background_failed(generation, cached.as_ref(), settled, e)
            }
        }
    }

    /// Keep the last good snapshot and surface a non-fatal error.
    /// Without a cached record the view goes back to `settled`.
    fn background_failed(
        &self,
        generation: u64,
        cached: Option<&CacheRecord>,
        settled: RefreshState,
        error: ContentError,
    ) {
        warn!(error = %error, "Background revalidation failed");
        let view = match cached {
            Some(record) => {
                ContentView::cache_hit(record, Some(format!("Showing saved content: {}", error)))
            }
            None => {
                let current = self.inner.view.borrow().clone();
                ContentView {
                    state: settled,
                    loading: false,
                    initial_loading: false,
                    background_refreshing: false,
                    error: Some(error.to_string()),
                    ..current
                }
            }
        };
        self.commit(generation, view);
    }
}

/// State a view with this status rests in once no fetch is running.
fn settled_state(status: CacheStatus) -> RefreshState {
    match status {
        CacheStatus::CacheHit => RefreshState::CacheHit,
        CacheStatus::Fresh => RefreshState::Fresh,
        CacheStatus::Loading | CacheStatus::Error => RefreshState::Error,
    }
}
