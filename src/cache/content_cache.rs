//! Content cache with superseding fetches
//!
//! Owns the authoritative in-memory collection:
//! - Replaced wholesale on every successful fetch (no merge)
//! - Cleared on error, so stale data never sits beside an error banner
//! - Filtered synchronously, without touching the network
//!
//! Every fetch takes a generation number. A completion is applied only if
//! its generation is still the latest issued, so the last caller wins even
//! when an older, slower response arrives afterwards.

use crate::error::{ErrorDescriptor, ErrorKind};
use crate::source::ContentSource;
use crate::types::{ContentItem, KindFilter};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// What a call to [`ContentCache::fetch`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Results replaced the collection
    Applied,
    /// No user: collection cleared without a request
    Cleared,
    /// Request failed; error recorded and collection cleared
    Failed(ErrorKind),
    /// A newer fetch (or a detach) was issued; results were discarded
    Superseded,
}

/// Point-in-time view of the cache, taken under a single lock
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub items: Arc<[ContentItem]>,
    pub filtered: Vec<ContentItem>,
    pub filter: KindFilter,
    pub loading: bool,
    pub error: Option<ErrorDescriptor>,
    pub is_empty: bool,
}

#[derive(Debug)]
struct CacheState {
    /// Latest issued fetch generation
    generation: u64,
    /// Active views sharing this cache
    attached: usize,
    items: Arc<[ContentItem]>,
    /// Indices into `items` matching `filter`
    view: Vec<usize>,
    filter: KindFilter,
    loading: bool,
    error: Option<ErrorDescriptor>,
}

impl CacheState {
    fn recompute_view(&mut self) {
        self.view = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.filter.matches(item))
            .map(|(idx, _)| idx)
            .collect();
    }

    fn clear_items(&mut self) {
        self.items = Arc::from(Vec::new());
        self.view.clear();
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty() && !self.loading && self.error.is_none()
    }

    fn filtered(&self) -> Vec<ContentItem> {
        self.view.iter().map(|&idx| self.items[idx].clone()).collect()
    }
}

/// Resets the loading state of a fetch whose future is dropped before the
/// source answers (timeout, `select!`, task abort)
struct AbandonGuard<'a> {
    cache: &'a ContentCache,
    generation: u64,
    armed: bool,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.cache.write();
        if state.generation == self.generation {
            state.generation += 1;
            state.loading = false;
            tracing::debug!(generation = self.generation, "Fetch abandoned before completion");
        }
    }
}

/// Client-side cache of a user's content
///
/// # Example
///
/// ```rust,ignore
/// use second_brain_sdk::{ApiClient, ClientConfig, ContentCache, KindFilter};
/// use std::sync::Arc;
///
/// let client = Arc::new(ApiClient::new(ClientConfig::new("http://localhost:3000"))?);
/// let cache = ContentCache::new(client);
///
/// cache.fetch(Some("user-1")).await;
/// cache.filter_by_kind(KindFilter::NOTES);
///
/// println!("{} notes of {}", cache.filtered().len(), cache.count_by_kind(&KindFilter::All));
/// ```
pub struct ContentCache {
    source: Arc<dyn ContentSource>,
    state: RwLock<CacheState>,
}

impl ContentCache {
    /// Create an empty cache reading from `source`
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            state: RwLock::new(CacheState {
                generation: 0,
                attached: 0,
                items: Arc::from(Vec::new()),
                view: Vec::new(),
                filter: KindFilter::All,
                loading: false,
                error: None,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the collection for a user.
    ///
    /// A missing or blank user id is the logged-out state: the collection is
    /// cleared and no request is made. Failures are recorded in
    /// [`error`](Self::error) and never returned.
    pub async fn fetch(&self, user_id: Option<&str>) -> FetchOutcome {
        let Some(user_id) = user_id.map(str::trim).filter(|id| !id.is_empty()) else {
            let mut state = self.write();
            state.generation += 1;
            state.clear_items();
            state.error = None;
            state.loading = false;
            tracing::debug!("No user, content cleared");
            return FetchOutcome::Cleared;
        };

        let generation = {
            let mut state = self.write();
            state.generation += 1;
            state.loading = true;
            state.error = None;
            state.generation
        };

        let mut guard = AbandonGuard {
            cache: self,
            generation,
            armed: true,
        };
        let result = self.source.list_content(user_id).await;
        guard.armed = false;

        let mut state = self.write();
        if state.generation != generation {
            tracing::debug!(
                generation,
                latest = state.generation,
                user_id,
                "Discarding superseded fetch"
            );
            return FetchOutcome::Superseded;
        }

        state.loading = false;
        match result {
            Ok(items) => {
                state.items = Arc::from(items);
                state.recompute_view();
                tracing::info!(
                    user_id,
                    count = state.items.len(),
                    visible = state.view.len(),
                    "Content loaded"
                );
                FetchOutcome::Applied
            }
            Err(err) => {
                tracing::error!(user_id, kind = %err.kind(), "Failed to fetch content: {}", err);
                state.clear_items();
                let descriptor = ErrorDescriptor::from(&err);
                let kind = descriptor.kind;
                state.error = Some(descriptor);
                FetchOutcome::Failed(kind)
            }
        }
    }

    /// Select the active filter and recompute the view.
    ///
    /// A filter on an unknown kind is logged and shows everything.
    /// Returns the number of visible items.
    pub fn filter_by_kind(&self, filter: KindFilter) -> usize {
        let mut state = self.write();
        state.filter = filter.effective();
        state.recompute_view();
        state.view.len()
    }

    /// [`filter_by_kind`](Self::filter_by_kind) from a filter name such as
    /// `"ALL"` or `"NOTE"`; unrecognized names show everything.
    pub fn filter_by_name(&self, name: &str) -> usize {
        self.filter_by_kind(KindFilter::lenient(name))
    }

    /// Number of items matching `filter`; `All` is the total
    pub fn count_by_kind(&self, filter: &KindFilter) -> usize {
        let filter = filter.effective();
        let state = self.read();
        match filter {
            KindFilter::All => state.items.len(),
            filter => state.items.iter().filter(|item| filter.matches(item)).count(),
        }
    }

    /// Dismiss the recorded error without refetching
    pub fn clear_error(&self) {
        self.write().error = None;
    }

    /// Register an active view on this cache
    pub fn attach(&self) {
        self.write().attached += 1;
    }

    /// Release one view's attachment.
    ///
    /// When no attached view remains, any in-flight fetch is discarded and
    /// the loading state dropped; completions arriving afterwards are not
    /// applied. Returns whether that happened.
    pub fn detach(&self) -> bool {
        let mut state = self.write();
        state.attached = state.attached.saturating_sub(1);
        if state.attached > 0 {
            tracing::debug!(remaining = state.attached, "View detached, cache still in use");
            return false;
        }
        state.generation += 1;
        state.loading = false;
        true
    }

    /// Number of views currently attached
    pub fn attached(&self) -> usize {
        self.read().attached
    }

    /// The full collection, in server order
    pub fn items(&self) -> Arc<[ContentItem]> {
        self.read().items.clone()
    }

    /// Items passing the active filter
    pub fn filtered(&self) -> Vec<ContentItem> {
        self.read().filtered()
    }

    pub fn active_filter(&self) -> KindFilter {
        self.read().filter.clone()
    }

    pub fn loading(&self) -> bool {
        self.read().loading
    }

    pub fn error(&self) -> Option<ErrorDescriptor> {
        self.read().error.clone()
    }

    /// No items, not loading and no error
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let state = self.read();
        CacheSnapshot {
            items: state.items.clone(),
            filtered: state.filtered(),
            filter: state.filter.clone(),
            loading: state.loading,
            error: state.error.clone(),
            is_empty: state.is_empty(),
        }
    }
}
