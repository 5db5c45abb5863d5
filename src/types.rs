//! Types for the content API

use crate::error::{ContentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ==================== Content Kind ====================

/// Discriminator of a content item
///
/// The backend sends `NOTE`, `DOCUMENT` or `LINK`. Any other value is kept
/// verbatim as `Unknown` so the item stays visible in the "all" view without
/// being routed to a view it doesn't belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentKind {
    Note,
    Document,
    Link,
    Unknown(String),
}

impl ContentKind {
    /// All known kinds, in display order
    pub const KNOWN: [ContentKind; 3] = [ContentKind::Note, ContentKind::Document, ContentKind::Link];

    pub fn as_str(&self) -> &str {
        match self {
            ContentKind::Note => "NOTE",
            ContentKind::Document => "DOCUMENT",
            ContentKind::Link => "LINK",
            ContentKind::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ContentKind::Unknown(_))
    }
}

impl From<String> for ContentKind {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "NOTE" => ContentKind::Note,
            "DOCUMENT" => ContentKind::Document,
            "LINK" => ContentKind::Link,
            _ => ContentKind::Unknown(raw),
        }
    }
}

impl From<&str> for ContentKind {
    fn from(raw: &str) -> Self {
        ContentKind::from(raw.to_string())
    }
}

impl From<ContentKind> for String {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ==================== Kind Filter ====================

/// Filter selecting which items a view shows
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum KindFilter {
    #[default]
    All,
    Kind(ContentKind),
}

impl KindFilter {
    pub const NOTES: KindFilter = KindFilter::Kind(ContentKind::Note);
    pub const DOCUMENTS: KindFilter = KindFilter::Kind(ContentKind::Document);
    pub const LINKS: KindFilter = KindFilter::Kind(ContentKind::Link);

    /// Parse a filter name, falling back to `All` for anything unrecognized.
    ///
    /// Hiding data because of a typo is worse than showing everything, so an
    /// invalid name is logged and shows all items.
    pub fn lenient(name: &str) -> Self {
        match name.parse() {
            Ok(filter) => filter,
            Err(_) => {
                tracing::warn!(filter = name, "Unknown content filter, showing all items");
                KindFilter::All
            }
        }
    }

    /// The filter actually applied: a filter on an unknown kind becomes `All`
    pub fn effective(&self) -> KindFilter {
        match self {
            KindFilter::Kind(ContentKind::Unknown(raw)) => {
                tracing::warn!(filter = %raw, "Filter on unknown content kind, showing all items");
                KindFilter::All
            }
            other => other.clone(),
        }
    }

    /// Whether an item passes this filter
    pub fn matches(&self, item: &ContentItem) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Kind(ContentKind::Unknown(_)) => true,
            KindFilter::Kind(kind) => &item.kind == kind,
        }
    }
}

impl FromStr for KindFilter {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("ALL") {
            return Ok(KindFilter::All);
        }
        match ContentKind::from(s) {
            ContentKind::Unknown(raw) => Err(ContentError::InvalidRequest(format!(
                "unknown content filter: {}",
                raw
            ))),
            kind => Ok(KindFilter::Kind(kind)),
        }
    }
}

impl fmt::Display for KindFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindFilter::All => f.pad("ALL"),
            KindFilter::Kind(kind) => kind.fmt(f),
        }
    }
}

// ==================== Content Item ====================

/// One user-owned note, document or link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Stable unique identifier
    pub id: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: ContentKind,
    #[serde(default)]
    pub title: String,
    /// Note text, or the extracted/linked description
    #[serde(rename = "content", alias = "body", default)]
    pub body: String,
    #[serde(
        rename = "url",
        alias = "resourceUrl",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_url: Option<String>,
    /// Open key-value bag (thumbnail, author, fileName, mimeType, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

impl ContentItem {
    /// Title for display, "Untitled" when blank
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    /// String metadata value
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    /// Lowercase file extension, from `metadata.fileName` or the resource URL
    pub fn file_extension(&self) -> Option<String> {
        let name = match self.metadata_str("fileName") {
            Some(name) => name,
            None => last_path_segment(self.resource_url.as_deref()?)?,
        };
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Whether this is a link to a post on Twitter/X
    pub fn is_tweet(&self) -> bool {
        if self.kind != ContentKind::Link {
            return false;
        }
        let Some(url) = self.resource_url.as_deref() else {
            return false;
        };
        let Some((host, path)) = split_host_path(url) else {
            return false;
        };
        let host = host.trim_start_matches("www.").trim_start_matches("mobile.");
        (host == "twitter.com" || host == "x.com") && path.contains("/status/")
    }
}

/// `(host, path)` of an absolute URL, ignoring query and fragment
fn split_host_path(url: &str) -> Option<(&str, &str)> {
    let (_, rest) = url.split_once("://")?;
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);
    match rest.find('/') {
        Some(idx) => Some((&rest[..idx], &rest[idx..])),
        None => Some((rest, "")),
    }
}

fn last_path_segment(url: &str) -> Option<&str> {
    let (_, path) = split_host_path(url)?;
    path.rsplit('/').next().filter(|s| !s.is_empty())
}

// ==================== API Envelopes ====================

/// Response envelope of the content listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEnvelope {
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<Vec<ContentItem>>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ContentEnvelope {
    /// Validate the envelope and return its items.
    ///
    /// `success: false` is a failure even on HTTP 200.
    pub fn into_items(self) -> Result<Vec<ContentItem>> {
        let message = self
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        match self.success {
            None => {
                return Err(ContentError::MalformedResponse(
                    "envelope is missing `success`".into(),
                ))
            }
            Some(false) => {
                return Err(match message {
                    Some(message) => ContentError::ServerFault { status: 200, message },
                    None => ContentError::MalformedResponse(
                        "request reported failure without a message".into(),
                    ),
                })
            }
            Some(true) => {}
        }

        let items = self
            .data
            .ok_or_else(|| ContentError::MalformedResponse("envelope is missing `data`".into()))?;

        if let Some(count) = self.count {
            if count != items.len() as u64 {
                tracing::warn!(
                    count,
                    received = items.len(),
                    "Content envelope count does not match data length"
                );
            }
        }

        Ok(items)
    }
}

/// Request body for creating a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub user_id: String,
}

impl NewNote {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            user_id: user_id.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(ContentError::InvalidRequest("user id is required".into()));
        }
        if self.title.trim().is_empty() {
            return Err(ContentError::InvalidRequest("note title is required".into()));
        }
        if self.content.trim().is_empty() {
            return Err(ContentError::InvalidRequest("note content is required".into()));
        }
        Ok(())
    }
}

/// A document to upload as multipart form data
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub user_id: String,
}

impl DocumentUpload {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
            user_id: user_id.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(ContentError::InvalidRequest("user id is required".into()));
        }
        if self.file_name.trim().is_empty() {
            return Err(ContentError::InvalidRequest("file name is required".into()));
        }
        if self.bytes.is_empty() {
            return Err(ContentError::InvalidRequest(format!(
                "document {} is empty",
                self.file_name
            )));
        }
        Ok(())
    }
}

/// The logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: String,
}

/// Response of the current-user endpoint: either `{ "user": ... }` or a bare user
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum UserResponse {
    // Bare first: a missing `user` field would otherwise match Wrapped as None
    Bare(User),
    Wrapped { user: Option<User> },
}

impl UserResponse {
    pub(crate) fn into_user(self) -> Option<User> {
        match self {
            UserResponse::Bare(user) => Some(user),
            UserResponse::Wrapped { user } => user,
        }
    }
}
