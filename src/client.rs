//! HTTP client for the content API

use crate::config::ClientConfig;
use crate::error::{ContentError, Result};
use crate::source::ContentSource;
use crate::types::*;
use async_trait::async_trait;
use reqwest::{header, multipart, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// HTTP client for the content API
///
/// Requests carry credentials: the cookie store is enabled so a session
/// cookie set by the backend is replayed, and a configured bearer token or
/// session cookie is attached to every request.
///
/// # Example
///
/// ```rust,no_run
/// use second_brain_sdk::{ApiClient, ClientConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new(ClientConfig::new("http://localhost:3000"))?;
///
/// let items = client.list_content("user-1").await?;
/// println!("{} items", items.len());
/// # Ok(())
/// # }
/// ```
pub struct ApiClient {
    config: ClientConfig,
    client: Client,
}

/// Acknowledgement body of mutation endpoints
#[derive(Debug, Deserialize)]
struct Ack {
    success: Option<bool>,
    message: Option<String>,
    error: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = config.api_token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ContentError::Config("API token is not a valid header value".into()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        if let Some(ref cookie) = config.session_cookie {
            let value = header::HeaderValue::from_str(cookie)
                .map_err(|_| ContentError::Config("session cookie is not a valid header value".into()))?;
            headers.insert(header::COOKIE, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ContentError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.config.base(), path)
    }

    // ==================== Content ====================

    /// List all content for a user
    pub async fn list_content(&self, user_id: &str) -> Result<Vec<ContentItem>> {
        let url = self.url("content");
        tracing::debug!(user_id, "Listing content");

        let response = self
            .client
            .get(&url)
            .query(&[("userId", user_id)])
            .send()
            .await?;

        let envelope: ContentEnvelope = self.handle_response(response).await?;
        envelope.into_items()
    }

    /// Delete a content item
    pub async fn delete_content(&self, id: &str) -> Result<()> {
        let url = self.url(&format!("notes/{}", urlencoding::encode(id)));
        tracing::debug!(id, "Deleting content");

        let response = self.client.delete(&url).send().await?;
        self.handle_ack(response).await
    }

    /// Create a note
    pub async fn create_note(&self, note: &NewNote) -> Result<()> {
        let url = self.url("notes");
        tracing::debug!(title = %note.title, "Creating note");

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(note)
            .send()
            .await?;

        self.handle_ack(response).await
    }

    /// Upload a document as multipart form data (`file`, `userId`)
    pub async fn upload_document(&self, upload: &DocumentUpload) -> Result<()> {
        let url = self.url("documents");
        tracing::debug!(
            file_name = %upload.file_name,
            bytes = upload.bytes.len(),
            "Uploading document"
        );

        let part = multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)
            .map_err(|_| {
                ContentError::InvalidRequest(format!("invalid mime type: {}", upload.mime_type))
            })?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("userId", upload.user_id.clone());

        let response = self.client.post(&url).multipart(form).send().await?;
        self.handle_ack(response).await
    }

    // ==================== Session ====================

    /// Get the logged-in user, `None` when not logged in
    pub async fn current_user(&self) -> Result<Option<User>> {
        let url = self.url("auth/user");

        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        let user: UserResponse = self.handle_response(response).await?;
        Ok(user.into_user())
    }

    // ==================== Helper Methods ====================

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ContentError::from_status(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn handle_ack(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ContentError::from_status(status.as_u16(), &body));
        }

        // Bodies are optional on mutations; only an explicit failure counts
        match serde_json::from_str::<Ack>(&body) {
            Ok(Ack {
                success: Some(false),
                message,
                error,
            }) => match message.or(error).filter(|m| !m.trim().is_empty()) {
                Some(message) => Err(ContentError::ServerFault {
                    status: status.as_u16(),
                    message,
                }),
                None => Err(ContentError::MalformedResponse(
                    "request reported failure without a message".into(),
                )),
            },
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ContentSource for ApiClient {
    async fn list_content(&self, user_id: &str) -> Result<Vec<ContentItem>> {
        ApiClient::list_content(self, user_id).await
    }
}
