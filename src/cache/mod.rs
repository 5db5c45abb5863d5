//! Client-side content cache
//!
//! Holds a user's content collection as fetched from the backend, with a
//! filtered view and per-kind counts derived from it.

mod content_cache;

pub use content_cache::{CacheSnapshot, ContentCache, FetchOutcome};
