//! Mounted consumers of the content cache
//!
//! A [`ContentView`] is what a screen listing content holds while it is
//! shown. Activation fetches for the view's user; while active, the view
//! reacts to the [`InvalidationSignal`] by refetching exactly once per reset.
//! Views that show the same user's content should share one
//! [`ContentCache`], so a single refetch updates all of them.

use crate::cache::{ContentCache, FetchOutcome};
use crate::signal::InvalidationSignal;
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Lifecycle hooks of anything that consumes content while shown.
#[async_trait]
pub trait Activatable: Send + Sync {
    /// Called when the consumer becomes visible.
    async fn on_activate(&self);

    /// Called when the consumer goes away. Work still in flight on its behalf
    /// must not be applied afterwards unless another active consumer shares it.
    fn on_deactivate(&self);
}

/// A mounted consumer of a [`ContentCache`]
pub struct ContentView {
    cache: Arc<ContentCache>,
    signal: Arc<InvalidationSignal>,
    user_id: RwLock<Option<String>>,
    active: watch::Sender<bool>,
}

impl ContentView {
    /// Create an inactive view
    pub fn new(
        cache: Arc<ContentCache>,
        signal: Arc<InvalidationSignal>,
        user_id: Option<String>,
    ) -> Self {
        let (active, _) = watch::channel(false);
        Self {
            cache,
            signal,
            user_id: RwLock::new(user_id),
            active,
        }
    }

    /// Create a view on the process-wide invalidation signal
    pub fn with_global_signal(cache: Arc<ContentCache>, user_id: Option<String>) -> Self {
        Self::new(cache, InvalidationSignal::global(), user_id)
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    pub fn signal(&self) -> &Arc<InvalidationSignal> {
        &self.signal
    }

    pub fn user_id(&self) -> Option<String> {
        self.user_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    /// Activate and fetch. A pending invalidation is consumed by this fetch.
    pub async fn activate(&self) -> FetchOutcome {
        if !self.active.send_replace(true) {
            self.cache.attach();
        }
        if self.signal.take_dirty() {
            tracing::debug!("Pending invalidation folded into activation fetch");
        }
        self.fetch().await
    }

    /// Deactivate: stop reacting to the signal and release the cache.
    ///
    /// In-flight fetches are discarded once no other active view shares the
    /// cache.
    pub fn deactivate(&self) {
        if self.active.send_replace(false) {
            self.cache.detach();
        }
    }

    /// Switch user and refetch if active (logging out passes `None`)
    pub async fn set_user(&self, user_id: Option<String>) -> Option<FetchOutcome> {
        *self.user_id.write().unwrap_or_else(PoisonError::into_inner) = user_id;
        self.refresh().await
    }

    /// Manual refetch, e.g. a retry button. `None` when inactive.
    pub async fn refresh(&self) -> Option<FetchOutcome> {
        if !self.is_active() {
            return None;
        }
        Some(self.fetch().await)
    }

    /// Refetch once if the signal is dirty.
    ///
    /// Inactive views leave the flag alone for the next active consumer.
    pub async fn refresh_if_dirty(&self) -> bool {
        if !self.is_active() || !self.signal.take_dirty() {
            return false;
        }
        tracing::debug!("Refetching after invalidation");
        self.fetch().await;
        true
    }

    /// Spawn a task that refreshes on every invalidation until deactivated.
    pub fn spawn_refresh_task(self: &Arc<Self>) -> JoinHandle<()> {
        let view = Arc::clone(self);
        tokio::spawn(async move {
            let mut active = view.active.subscribe();
            loop {
                tokio::select! {
                    _ = wait_inactive(&mut active) => break,
                    _ = view.signal.wait_dirty() => {}
                }
                if !view.is_active() {
                    break;
                }
                view.refresh_if_dirty().await;
            }
            tracing::debug!("Refresh task stopped");
        })
    }

    async fn fetch(&self) -> FetchOutcome {
        let user_id = self.user_id();
        self.cache.fetch(user_id.as_deref()).await
    }
}

impl Drop for ContentView {
    fn drop(&mut self) {
        self.deactivate();
    }
}

async fn wait_inactive(active: &mut watch::Receiver<bool>) {
    while *active.borrow_and_update() {
        if active.changed().await.is_err() {
            return;
        }
    }
}

#[async_trait]
impl Activatable for ContentView {
    async fn on_activate(&self) {
        self.activate().await;
    }

    fn on_deactivate(&self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockSource;
    use crate::types::{ContentItem, ContentKind, KindFilter};
    use chrono::Utc;
    use std::time::Duration;

    fn items(n: usize) -> Vec<ContentItem> {
        (0..n)
            .map(|i| ContentItem {
                id: format!("item-{}", i),
                kind: ContentKind::Note,
                title: String::new(),
                body: "text".to_string(),
                resource_url: None,
                metadata: Default::default(),
                created_at: Utc::now(),
                updated_at: None,
            })
            .collect()
    }

    fn setup(n: usize) -> (Arc<MockSource>, Arc<InvalidationSignal>, Arc<ContentView>) {
        let source = Arc::new(MockSource::new().with_items(items(n)));
        let signal = Arc::new(InvalidationSignal::new());
        let cache = Arc::new(ContentCache::new(source.clone()));
        let view = Arc::new(ContentView::new(cache, signal.clone(), Some("user-1".into())));
        (source, signal, view)
    }

    #[tokio::test]
    async fn test_post_mutation_refresh() {
        let (source, signal, view) = setup(3);

        view.activate().await;
        assert_eq!(view.cache().count_by_kind(&KindFilter::All), 3);

        // A delete elsewhere removes one item, then raises the signal
        source.set_items(items(2));
        signal.mark_dirty();

        assert!(view.refresh_if_dirty().await);
        assert_eq!(view.cache().count_by_kind(&KindFilter::All), 2);
        assert!(!view.refresh_if_dirty().await);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_repeated_marks_single_refetch() {
        let (source, signal, view) = setup(1);
        view.activate().await;

        for _ in 0..4 {
            signal.mark_dirty();
        }
        let mut refetches = 0;
        while view.refresh_if_dirty().await {
            refetches += 1;
        }

        assert_eq!(refetches, 1);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_activation_consumes_pending_invalidation() {
        let (source, signal, view) = setup(1);
        signal.mark_dirty();

        assert_eq!(view.activate().await, FetchOutcome::Applied);
        assert!(!signal.is_dirty());
        assert!(!view.refresh_if_dirty().await);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_inactive_view_leaves_flag() {
        let (source, signal, view) = setup(1);
        signal.mark_dirty();

        assert!(!view.refresh_if_dirty().await);
        assert!(view.refresh().await.is_none());
        assert!(signal.is_dirty());
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_deactivate_discards_in_flight() {
        let source = Arc::new(MockSource::new().holding());
        let signal = Arc::new(InvalidationSignal::new());
        let cache = Arc::new(ContentCache::new(source.clone()));
        let view = Arc::new(ContentView::new(cache, signal, Some("user-1".into())));

        let pending = {
            let view = view.clone();
            tokio::spawn(async move { view.activate().await })
        };
        let call = source.next_held().await.unwrap();

        view.on_deactivate();
        call.respond_items(items(3));

        assert_eq!(pending.await.unwrap(), FetchOutcome::Superseded);
        assert!(view.cache().items().is_empty());
        assert!(!view.cache().loading());
    }

    #[tokio::test]
    async fn test_shared_cache_survives_other_view_deactivating() {
        let source = Arc::new(MockSource::new().holding());
        let signal = Arc::new(InvalidationSignal::new());
        let cache = Arc::new(ContentCache::new(source.clone()));
        let dashboard = Arc::new(ContentView::new(cache.clone(), signal.clone(), Some("user-1".into())));
        let ideas = Arc::new(ContentView::new(cache.clone(), signal, Some("user-1".into())));

        let first = {
            let dashboard = dashboard.clone();
            tokio::spawn(async move { dashboard.activate().await })
        };
        source.next_held().await.unwrap().respond_items(items(1));
        assert_eq!(first.await.unwrap(), FetchOutcome::Applied);

        let pending = {
            let ideas = ideas.clone();
            tokio::spawn(async move { ideas.activate().await })
        };
        let call = source.next_held().await.unwrap();
        assert_eq!(cache.attached(), 2);

        dashboard.deactivate();
        assert_eq!(cache.attached(), 1);
        assert!(cache.loading());

        call.respond_items(items(3));
        assert_eq!(pending.await.unwrap(), FetchOutcome::Applied);
        assert!(ideas.is_active());
        assert_eq!(cache.items().len(), 3);
        assert!(!cache.loading());
        assert!(!cache.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_deactivate_releases_once() {
        let (_source, _signal, view) = setup(1);
        let other = ContentView::new(view.cache().clone(), view.signal().clone(), Some("user-1".into()));

        view.activate().await;
        other.activate().await;
        assert_eq!(view.cache().attached(), 2);

        other.deactivate();
        other.deactivate();
        assert_eq!(view.cache().attached(), 1);

        drop(other);
        assert_eq!(view.cache().attached(), 1);
        view.deactivate();
        assert_eq!(view.cache().attached(), 0);
    }

    #[tokio::test]
    async fn test_dropping_active_view_releases_cache() {
        let (_source, _signal, view) = setup(1);
        let cache = view.cache().clone();
        view.activate().await;
        assert_eq!(cache.attached(), 1);

        drop(view);
        assert_eq!(cache.attached(), 0);
    }

    #[tokio::test]
    async fn test_set_user_refetches() {
        let (source, _signal, view) = setup(2);
        view.activate().await;

        assert_eq!(
            view.set_user(Some("user-2".into())).await,
            Some(FetchOutcome::Applied)
        );
        assert_eq!(source.last_user().as_deref(), Some("user-2"));

        assert_eq!(view.set_user(None).await, Some(FetchOutcome::Cleared));
        assert!(view.cache().items().is_empty());
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_refresh_task_follows_signal() {
        let (source, signal, view) = setup(3);
        view.on_activate().await;
        let task = view.spawn_refresh_task();

        source.set_items(items(5));
        signal.mark_dirty();

        tokio::time::timeout(Duration::from_secs(2), async {
            while view.cache().count_by_kind(&KindFilter::All) != 5 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("refresh task should refetch");
        assert!(!signal.is_dirty());

        view.on_deactivate();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("task should stop on deactivate")
            .unwrap();

        // Marks after deactivation are left for the next consumer
        signal.mark_dirty();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(signal.is_dirty());
        assert_eq!(source.call_count(), 2);
    }
}
