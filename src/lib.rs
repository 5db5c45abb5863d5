//! Second Brain SDK - content cache and sync for the Second Brain API
//!
//! Client-side core of a note/document/link capture product. All business
//! logic lives in the backend; this crate owns the in-memory view of a
//! user's content and keeps every view consistent with the backend and with
//! each other.
//!
//! # Architecture
//!
//! - **ApiClient**: REST client for the backend (listing, notes, documents, session)
//! - **ContentCache**: the user's collection, a filtered view and counts;
//!   newer fetches supersede older ones
//! - **InvalidationSignal**: process-wide dirty flag raised by mutations
//! - **ContentView**: a mounted consumer that refetches when the signal is raised
//! - **ContentMutations**: create/upload/delete, raising the signal on success
//!
//! # Example
//!
//! ```rust,ignore
//! use second_brain_sdk::{
//!     ApiClient, ClientConfig, ContentCache, ContentMutations, ContentView, KindFilter,
//! };
//! use std::sync::Arc;
//!
//! let client = Arc::new(ApiClient::new(ClientConfig::new("http://localhost:3000"))?);
//! let cache = Arc::new(ContentCache::new(client.clone()));
//!
//! // Dashboard view
//! let view = Arc::new(ContentView::with_global_signal(cache, Some("user-1".into())));
//! view.activate().await;
//! let refresher = view.spawn_refresh_task();
//!
//! // Upload dialog, elsewhere
//! let mutations = ContentMutations::with_global_signal(client);
//! mutations.create_note("Groceries", "milk, eggs", "user-1").await?;
//!
//! // ...the view refetches on its own
//! let notes = view.cache().count_by_kind(&KindFilter::NOTES);
//! ```

// Error types
pub mod error;

// Client configuration
pub mod config;

// Content API types
pub mod types;

// Content source abstraction
pub mod source;

// HTTP client
pub mod client;

// Content cache
pub mod cache;

// Invalidation signal
pub mod signal;

// Mounted consumers
pub mod view;

// Mutation sites
pub mod mutations;

pub use cache::{CacheSnapshot, ContentCache, FetchOutcome};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ContentError, ErrorDescriptor, ErrorKind, Result};
pub use mutations::ContentMutations;
pub use signal::InvalidationSignal;
pub use source::{ContentSource, MockSource};
pub use types::{ContentItem, ContentKind, DocumentUpload, KindFilter, NewNote, User};
pub use view::{Activatable, ContentView};
