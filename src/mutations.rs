//! Content mutations
//!
//! Every successful write raises the [`InvalidationSignal`] so mounted views
//! refetch. Failed writes leave the signal untouched.

use crate::client::ApiClient;
use crate::error::{ContentError, Result};
use crate::signal::InvalidationSignal;
use crate::types::{DocumentUpload, NewNote};
use std::sync::Arc;

/// Mutation site for notes, documents and deletes
pub struct ContentMutations {
    client: Arc<ApiClient>,
    signal: Arc<InvalidationSignal>,
}

impl ContentMutations {
    pub fn new(client: Arc<ApiClient>, signal: Arc<InvalidationSignal>) -> Self {
        Self { client, signal }
    }

    /// Mutations that raise the process-wide signal
    pub fn with_global_signal(client: Arc<ApiClient>) -> Self {
        Self::new(client, InvalidationSignal::global())
    }

    pub fn signal(&self) -> &Arc<InvalidationSignal> {
        &self.signal
    }

    /// Create a note
    pub async fn create_note(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<()> {
        let note = NewNote::new(title, content, user_id);
        note.validate()?;

        self.client.create_note(&note).await?;
        tracing::info!(title = %note.title, "Note created");
        self.signal.mark_dirty();
        Ok(())
    }

    /// Upload a document
    pub async fn upload_document(&self, upload: DocumentUpload) -> Result<()> {
        upload.validate()?;

        self.client.upload_document(&upload).await?;
        tracing::info!(
            file_name = %upload.file_name,
            bytes = upload.bytes.len(),
            "Document uploaded"
        );
        self.signal.mark_dirty();
        Ok(())
    }

    /// Delete a content item
    pub async fn delete(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(ContentError::InvalidRequest("content id is required".into()));
        }

        self.client.delete_content(id).await?;
        tracing::info!(id, "Content deleted");
        self.signal.mark_dirty();
        Ok(())
    }
}
