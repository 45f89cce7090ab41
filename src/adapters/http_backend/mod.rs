// HTTP backend adapter - Signed upload issuance, binary PUT and status checks

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::Serialize;
use tracing::debug;

use crate::adapters::toml_config::UploadConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

const UPLOAD_TARGET_PATH: &str = "/api/upload-url";
const STATUS_PATH: &str = "/api/status";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadTargetRequest<'a> {
    filename: &'a str,
    content_type: &'a str,
    metadata: &'a serde_json::Value,
}

/// Client for the analysis backend and the signed storage URLs it hands out
pub struct HttpBackendAdapter {
    http: Client,
    base_url: String,
}

impl HttpBackendAdapter {
    pub fn new(config: &UploadConfig) -> Result<Self, DomainError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| DomainError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// Non-2xx answers carry the status and, when present, the body text
async fn upload_failure(response: Response, action: &str) -> DomainError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
        DomainError::Upload(format!("{} failed with HTTP {}", action, status))
    } else {
        DomainError::Upload(format!("{} failed with HTTP {}: {}", action, status, body))
    }
}

#[async_trait]
impl UploadPort for HttpBackendAdapter {
    async fn request_upload_target(
        &self,
        filename: &str,
        content_type: &str,
        metadata: &serde_json::Value,
    ) -> Result<UploadTarget, DomainError> {
        let url = self.endpoint(UPLOAD_TARGET_PATH);
        debug!(%url, %filename, %content_type, "Requesting upload target");

        let response = self
            .http
            .post(&url)
            .json(&UploadTargetRequest {
                filename,
                content_type,
                metadata,
            })
            .send()
            .await
            .map_err(|e| DomainError::Upload(format!("Upload target request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(upload_failure(response, "Upload target request").await);
        }
        response
            .json::<UploadTarget>()
            .await
            .map_err(|e| DomainError::Upload(format!("Malformed upload target: {}", e)))
    }

    async fn put(&self, upload_url: &str, video: &OutputVideo) -> Result<(), DomainError> {
        debug!(%upload_url, bytes = video.len(), "Uploading video");
        let response = self
            .http
            .put(upload_url)
            .header(header::CONTENT_TYPE, video.mime_type())
            .body(video.bytes().to_vec())
            .send()
            .await
            .map_err(|e| DomainError::Upload(format!("Upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(upload_failure(response, "Upload").await);
        }
        Ok(())
    }
}

#[async_trait]
impl StatusPort for HttpBackendAdapter {
    async fn check_status(&self, file_name: &str) -> Result<ProcessingStatus, DomainError> {
        let url = self.endpoint(STATUS_PATH);
        let response = self
            .http
            .get(&url)
            .query(&[("fileName", file_name)])
            .send()
            .await
            .map_err(|e| DomainError::Network(format!("Status check failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::Network(format!(
                "Status check failed with HTTP {}",
                status
            )));
        }
        response
            .json::<ProcessingStatus>()
            .await
            .map_err(|e| DomainError::Network(format!("Malformed status answer: {}", e)))
    }
}
