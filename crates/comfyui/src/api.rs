//! REST API client for the ComfyUI HTTP endpoints.
//!
//! [`ComfyUIService`] is the seam the pipeline stages are written
//! against; [`ComfyUIApi`] implements it over HTTP using [`reqwest`].

use async_trait::async_trait;
use comfyrun_core::artifact::ArtifactRef;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;

use crate::history::HistoryResponse;
use crate::queue::QueueSnapshot;

/// The ComfyUI endpoints the pipeline consumes.
#[async_trait]
pub trait ComfyUIService: Send + Sync {
    /// `GET /system_stats`, used as a connectivity probe. Any 2xx answer
    /// counts as reachable; the body is not inspected.
    async fn system_stats(&self) -> Result<(), ComfyUIApiError>;

    /// `POST /prompt` with the workflow and a client id.
    async fn submit_workflow(
        &self,
        workflow: &serde_json::Value,
        client_id: &str,
    ) -> Result<SubmitResponse, ComfyUIApiError>;

    /// `GET /queue`.
    async fn get_queue(&self) -> Result<QueueSnapshot, ComfyUIApiError>;

    /// `GET /history/{prompt_id}`.
    async fn get_history(&self, prompt_id: &str) -> Result<HistoryResponse, ComfyUIApiError>;

    /// `GET /view?filename=&subfolder=&type=`, returning the raw bytes.
    async fn view(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, ComfyUIApiError>;
}

/// HTTP client for a single ComfyUI instance.
#[derive(Debug)]
pub struct ComfyUIApi {
    client: reqwest::Client,
    api_url: String,
}

/// Response returned by the ComfyUI `/prompt` endpoint.
///
/// Every field is optional so that a body without `prompt_id` can be
/// reported as a protocol error instead of a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned identifier for the queued prompt.
    #[serde(default)]
    pub prompt_id: Option<String>,
    /// Position in the execution queue.
    #[serde(default)]
    pub number: Option<i64>,
    /// Per-node validation errors, keyed by node id.
    #[serde(default)]
    pub node_errors: serde_json::Value,
}

/// Errors from the ComfyUI REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ComfyUIApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// ComfyUI returned a non-2xx status code.
    #[error("ComfyUI API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body was not the JSON shape we expected.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The API key cannot be sent as an HTTP header value.
    #[error("API key contains characters not allowed in an HTTP header")]
    InvalidApiKey,
}

impl ComfyUIApi {
    /// Create a new API client for a ComfyUI instance.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8188`. A trailing
    ///   slash is ignored.
    /// * `api_key` - Optional bearer token sent on every request.
    pub fn new(api_url: &str, api_key: Option<&str>) -> Result<Self, ComfyUIApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| ComfyUIApiError::InvalidApiKey)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// HTTP API base URL without a trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ComfyUIApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ComfyUIApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ComfyUIApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ComfyUIApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ComfyUIService for ComfyUIApi {
    async fn system_stats(&self) -> Result<(), ComfyUIApiError> {
        let response = self
            .client
            .get(format!("{}/system_stats", self.api_url))
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn submit_workflow(
        &self,
        workflow: &serde_json::Value,
        client_id: &str,
    ) -> Result<SubmitResponse, ComfyUIApiError> {
        let body = serde_json::json!({
            "prompt": workflow,
            "client_id": client_id,
        });

        let response = self
            .client
            .post(format!("{}/prompt", self.api_url))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn get_queue(&self) -> Result<QueueSnapshot, ComfyUIApiError> {
        let response = self
            .client
            .get(format!("{}/queue", self.api_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn get_history(&self, prompt_id: &str) -> Result<HistoryResponse, ComfyUIApiError> {
        let response = self
            .client
            .get(format!("{}/history/{}", self.api_url, prompt_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn view(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, ComfyUIApiError> {
        let response = self
            .client
            .get(format!("{}/view", self.api_url))
            .query(&[
                ("filename", artifact.filename.as_str()),
                ("subfolder", artifact.subfolder.as_str()),
                ("type", artifact.category.as_str()),
            ])
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
