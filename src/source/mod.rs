//! Content source abstraction.
//!
//! The cache never talks to HTTP directly; it asks a [`ContentSource`] for a
//! user's collection. [`ApiClient`](crate::ApiClient) is the production
//! implementation, [`MockSource`] a scriptable one for tests.

pub mod mock;

pub use mock::{HeldCall, MockSource};

use crate::error::Result;
use crate::types::ContentItem;
use async_trait::async_trait;

/// Where a user's content collection comes from.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the full collection for a user, in server order.
    async fn list_content(&self, user_id: &str) -> Result<Vec<ContentItem>>;
}
