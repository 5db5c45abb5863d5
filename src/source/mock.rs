//! Mock content source for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};

use super::ContentSource;
use crate::error::{ContentError, Result};
use crate::types::ContentItem;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A call parked by a holding [`MockSource`], answered by the test.
pub struct HeldCall {
    /// User the call was made for
    pub user_id: String,
    responder: oneshot::Sender<Result<Vec<ContentItem>>>,
}

impl HeldCall {
    /// Complete the call with a result.
    ///
    /// Returns false if the caller is no longer waiting.
    pub fn respond(self, result: Result<Vec<ContentItem>>) -> bool {
        self.responder.send(result).is_ok()
    }

    /// Complete the call successfully with the given items.
    pub fn respond_items(self, items: Vec<ContentItem>) -> bool {
        self.respond(Ok(items))
    }
}

/// Mock content source for testing.
///
/// Answers from, in order of precedence:
/// - held mode: every call is parked until the test answers it, so
///   responses can be released in any order
/// - scripted responses, consumed one per call
/// - the standing item list
pub struct MockSource {
    items: Mutex<Vec<ContentItem>>,
    scripted: Mutex<VecDeque<Result<Vec<ContentItem>>>>,
    hold: AtomicBool,
    held_tx: mpsc::UnboundedSender<HeldCall>,
    held_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<HeldCall>>,
    call_count: AtomicU32,
    last_user: Mutex<Option<String>>,
}

impl MockSource {
    /// Create a mock that returns an empty collection.
    pub fn new() -> Self {
        let (held_tx, held_rx) = mpsc::unbounded_channel();
        Self {
            items: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
            hold: AtomicBool::new(false),
            held_tx,
            held_rx: tokio::sync::Mutex::new(held_rx),
            call_count: AtomicU32::new(0),
            last_user: Mutex::new(None),
        }
    }

    /// Set the standing item list.
    pub fn with_items(self, items: Vec<ContentItem>) -> Self {
        self.set_items(items);
        self
    }

    /// Park every call until answered through [`next_held`](Self::next_held).
    pub fn holding(self) -> Self {
        self.hold.store(true, Ordering::SeqCst);
        self
    }

    /// Replace the standing item list.
    pub fn set_items(&self, items: Vec<ContentItem>) {
        *lock(&self.items) = items;
    }

    /// Queue a one-shot response for the next unheld call.
    pub fn push_response(&self, result: Result<Vec<ContentItem>>) {
        lock(&self.scripted).push_back(result);
    }

    /// Wait for the next parked call.
    pub async fn next_held(&self) -> Option<HeldCall> {
        self.held_rx.lock().await.recv().await
    }

    /// Get the number of times list_content was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// User id of the most recent call.
    pub fn last_user(&self) -> Option<String> {
        lock(&self.last_user).clone()
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentSource for MockSource {
    async fn list_content(&self, user_id: &str) -> Result<Vec<ContentItem>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_user) = Some(user_id.to_string());

        if self.hold.load(Ordering::SeqCst) {
            let (responder, response) = oneshot::channel();
            let call = HeldCall {
                user_id: user_id.to_string(),
                responder,
            };
            if self.held_tx.send(call).is_err() {
                return Err(ContentError::Network("mock source closed".into()));
            }
            return response
                .await
                .unwrap_or_else(|_| Err(ContentError::Network("held call dropped".into())));
        }

        if let Some(result) = lock(&self.scripted).pop_front() {
            return result;
        }

        Ok(lock(&self.items).clone())
    }
}
