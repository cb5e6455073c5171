//! Hosted media service client.
//!
//! Unsigned uploads through a named upload preset: one multipart POST to
//! `{base}/{cloud}/image/upload`, answered with the stored file's
//! `secure_url`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::instrument;

use super::{MediaError, MediaUploader, UploadFile};
use crate::config::UploadConfig;

/// Hosted media API base URL.
const BASE_URL: &str = "https://api.cloudinary.com/v1_1";

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Uploader for the hosted media service.
#[derive(Clone)]
pub struct HostedUploader {
    inner: Arc<HostedUploaderInner>,
}

struct HostedUploaderInner {
    client: reqwest::Client,
    endpoint: String,
    upload_preset: String,
}

impl HostedUploader {
    /// Create an uploader from configuration.
    #[must_use]
    pub fn new(config: &UploadConfig) -> Self {
        Self::with_base_url(config, BASE_URL)
    }

    /// Create an uploader that talks to a different endpoint.
    #[must_use]
    pub fn with_base_url(config: &UploadConfig, base_url: &str) -> Self {
        Self {
            inner: Arc::new(HostedUploaderInner {
                client: reqwest::Client::new(),
                endpoint: format!(
                    "{}/{}/image/upload",
                    base_url.trim_end_matches('/'),
                    config.cloud_name
                ),
                upload_preset: config.upload_preset.clone(),
            }),
        }
    }

    /// The upload URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }
}

fn rejection(status: reqwest::StatusCode, body: &str) -> MediaError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_owned());
    MediaError::Upload {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl MediaUploader for HostedUploader {
    #[instrument(skip(self, file), fields(file_name = %file.file_name, size = file.bytes.len()))]
    async fn upload(&self, file: &UploadFile, folder: &str) -> Result<String, MediaError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.normalized_content_type())?;

        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.inner.upload_preset.clone())
            .text("folder", folder.to_owned());

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let uploaded: UploadResponse = response.json().await?;
            return Ok(uploaded.secure_url);
        }

        let body = response.text().await.unwrap_or_default();
        Err(rejection(status, &body))
    }

    fn uploader_name(&self) -> &'static str {
        "hosted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_includes_cloud_name() {
        let config = UploadConfig {
            cloud_name: "central-library".to_owned(),
            upload_preset: "unsigned".to_owned(),
            folder: "libris".to_owned(),
        };
        let uploader = HostedUploader::with_base_url(&config, "http://localhost:9000/");
        assert_eq!(uploader.endpoint(), "http://localhost:9000/central-library/image/upload");
    }

    #[test]
    fn test_rejection_reads_error_message() {
        let err = rejection(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"Upload preset not found"}}"#,
        );
        match err {
            MediaError::Upload { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Upload preset not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
