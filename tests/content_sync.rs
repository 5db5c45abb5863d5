//! End-to-end tests for content sync
//!
//! A mounted view over the real HTTP client, driven by mutations through the
//! invalidation signal. The backend is a wiremock server.

use second_brain_sdk::{
    ApiClient, ClientConfig, ContentCache, ContentMutations, ContentView, ErrorKind, FetchOutcome,
    InvalidationSignal, KindFilter,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "user-1";

fn item(id: &str, kind: &str) -> Value {
    json!({
        "id": id,
        "type": kind,
        "title": format!("Title {}", id),
        "content": "",
        "url": "",
        "createdAt": "2025-01-26T10:00:00.000Z"
    })
}

fn envelope(items: Vec<Value>) -> Value {
    let count = items.len();
    json!({ "success": true, "data": items, "count": count })
}

struct Harness {
    server: MockServer,
    client: Arc<ApiClient>,
    cache: Arc<ContentCache>,
    signal: Arc<InvalidationSignal>,
}

impl Harness {
    async fn start() -> Self {
        let server = MockServer::start().await;
        let client = Arc::new(ApiClient::new(ClientConfig::new(server.uri())).unwrap());
        let cache = Arc::new(ContentCache::new(client.clone()));
        Self {
            server,
            client,
            cache,
            signal: Arc::new(InvalidationSignal::new()),
        }
    }

    fn view(&self) -> ContentView {
        ContentView::new(self.cache.clone(), self.signal.clone(), Some(USER.into()))
    }

    fn mutations(&self) -> ContentMutations {
        ContentMutations::new(self.client.clone(), self.signal.clone())
    }

    /// Serve `body` for the next `times` listings
    async fn listing(&self, status: u16, body: Value, times: u64) {
        Mock::given(method("GET"))
            .and(path("/api/v1/content"))
            .and(query_param("userId", USER))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }
}

/// Test the dashboard happy path: counts per kind after one fetch
#[tokio::test]
async fn test_fetch_and_count() {
    let h = Harness::start().await;
    h.listing(200, envelope(vec![item("a", "NOTE"), item("b", "LINK")]), 1)
        .await;

    let view = h.view();
    assert_eq!(view.activate().await, FetchOutcome::Applied);

    assert_eq!(h.cache.count_by_kind(&KindFilter::All), 2);
    assert_eq!(h.cache.count_by_kind(&KindFilter::NOTES), 1);
    assert_eq!(h.cache.count_by_kind(&KindFilter::DOCUMENTS), 0);
    assert!(!h.cache.loading());
    assert!(h.cache.error().is_none());
}

/// Test that an authentication failure leaves an empty collection and an error
#[tokio::test]
async fn test_unauthenticated_fetch() {
    let h = Harness::start().await;
    h.listing(401, json!({ "error": "Unauthorized" }), 1).await;

    let view = h.view();
    assert_eq!(
        view.activate().await,
        FetchOutcome::Failed(ErrorKind::Unauthenticated)
    );

    let snapshot = h.cache.snapshot();
    assert!(snapshot.items.is_empty());
    assert!(!snapshot.loading);
    assert!(!snapshot.is_empty);
    assert_eq!(snapshot.error.unwrap().kind, ErrorKind::Unauthenticated);
}

/// Test that a failed refetch drops previously loaded items
#[tokio::test]
async fn test_failed_refetch_clears_items() {
    let h = Harness::start().await;
    h.listing(200, envelope(vec![item("a", "NOTE")]), 1).await;
    h.listing(500, json!({ "error": "database unavailable" }), 1)
        .await;

    let view = h.view();
    view.activate().await;
    assert_eq!(h.cache.items().len(), 1);

    assert_eq!(
        view.refresh().await,
        Some(FetchOutcome::Failed(ErrorKind::ServerFault))
    );
    assert!(h.cache.items().is_empty());
    assert!(h
        .cache
        .error()
        .unwrap()
        .message
        .contains("database unavailable"));

    // Acknowledging the error does not refetch
    let requests = h.server.received_requests().await.unwrap().len();
    h.cache.clear_error();
    assert!(h.cache.error().is_none());
    assert_eq!(h.server.received_requests().await.unwrap().len(), requests);
}

/// Test that a delete makes the mounted view refetch: 3 items become 2
#[tokio::test]
async fn test_delete_refreshes_view() {
    let h = Harness::start().await;
    h.listing(
        200,
        envelope(vec![item("n1", "NOTE"), item("d1", "DOCUMENT"), item("l1", "LINK")]),
        1,
    )
    .await;
    h.listing(200, envelope(vec![item("n1", "NOTE"), item("d1", "DOCUMENT")]), 1)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/notes/l1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&h.server)
        .await;

    let view = h.view();
    view.activate().await;
    assert_eq!(h.cache.count_by_kind(&KindFilter::All), 3);

    h.mutations().delete("l1").await.unwrap();
    assert!(h.signal.is_dirty());

    assert!(view.refresh_if_dirty().await);
    assert!(!h.signal.is_dirty());
    assert_eq!(h.cache.count_by_kind(&KindFilter::All), 2);
    assert_eq!(h.cache.count_by_kind(&KindFilter::LINKS), 0);
}

/// Test that creating a note is picked up by the background refresh task
#[tokio::test]
async fn test_create_note_background_refresh() {
    let h = Harness::start().await;
    h.listing(200, envelope(vec![item("n1", "NOTE")]), 1).await;
    h.listing(200, envelope(vec![item("n1", "NOTE"), item("n2", "NOTE")]), 1)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/notes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "success": true })))
        .mount(&h.server)
        .await;

    let view = Arc::new(h.view());
    view.activate().await;
    let task = view.spawn_refresh_task();

    h.mutations()
        .create_note("Groceries", "milk, eggs", USER)
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while h.cache.count_by_kind(&KindFilter::NOTES) != 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("view did not refresh after note creation");

    view.deactivate();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("refresh task did not stop")
        .unwrap();
}

/// Test that a failed mutation does not invalidate views
#[tokio::test]
async fn test_failed_delete_keeps_signal_clean() {
    let h = Harness::start().await;
    h.listing(200, envelope(vec![item("n1", "NOTE")]), 1).await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/notes/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Note not found" })))
        .mount(&h.server)
        .await;

    let view = h.view();
    view.activate().await;

    let err = h.mutations().delete("gone").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!h.signal.is_dirty());
    assert!(!view.refresh_if_dirty().await);
    assert_eq!(h.cache.items().len(), 1);
}

/// Test that the active filter survives a refetch and stays consistent with counts
#[tokio::test]
async fn test_filter_survives_refetch() {
    let h = Harness::start().await;
    h.listing(200, envelope(vec![item("n1", "NOTE"), item("l1", "LINK")]), 1)
        .await;
    h.listing(
        200,
        envelope(vec![item("n1", "NOTE"), item("l1", "LINK"), item("l2", "LINK")]),
        1,
    )
    .await;

    let view = h.view();
    view.activate().await;
    assert_eq!(h.cache.filter_by_kind(KindFilter::LINKS), 1);

    view.refresh().await;
    assert_eq!(h.cache.active_filter(), KindFilter::LINKS);
    assert_eq!(h.cache.filtered().len(), 2);
    assert_eq!(
        h.cache.filtered().len(),
        h.cache.count_by_kind(&KindFilter::LINKS)
    );
}

/// Test that logging out clears content without contacting the backend
#[tokio::test]
async fn test_logout_clears_without_request() {
    let h = Harness::start().await;
    h.listing(200, envelope(vec![item("n1", "NOTE")]), 1).await;

    let view = h.view();
    view.activate().await;
    let requests = h.server.received_requests().await.unwrap().len();

    assert_eq!(view.set_user(None).await, Some(FetchOutcome::Cleared));
    assert!(h.cache.items().is_empty());
    assert!(h.cache.error().is_none());
    assert!(!h.cache.loading());
    assert_eq!(h.server.received_requests().await.unwrap().len(), requests);
}
