//! Media uploads.
//!
//! Files are checked against [`UploadFile::validate`] before they reach an
//! uploader. Uploaders return a URL that can be stored as-is.
//!
//! # Uploaders
//!
//! - [`HostedUploader`] - unsigned-preset upload to the hosted media service
//! - [`InlineUploader`] - embeds the file as a `data:` URL (no service configured)

pub mod hosted;

pub use hosted::HostedUploader;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Image types accepted for logos.
pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/gif",
    "image/svg+xml",
];

/// Errors that can occur during uploads.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Content type is not an accepted image type.
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    /// File exceeds [`MAX_UPLOAD_BYTES`].
    #[error("file is {size} bytes, the limit is {max}")]
    TooLarge { size: usize, max: usize },

    /// File has no content.
    #[error("file is empty")]
    Empty,

    /// The upload service could not be reached.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upload service rejected the file.
    #[error("upload rejected: {status} - {message}")]
    Upload { status: u16, message: String },
}

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Check type and size.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Empty`, `MediaError::TooLarge` or
    /// `MediaError::UnsupportedType`.
    pub fn validate(&self) -> Result<(), MediaError> {
        if self.bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(MediaError::TooLarge {
                size: self.bytes.len(),
                max: MAX_UPLOAD_BYTES,
            });
        }
        let content_type = self.normalized_content_type();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(MediaError::UnsupportedType(self.content_type.clone()));
        }
        Ok(())
    }

    /// Content type without parameters, lowercased.
    #[must_use]
    pub fn normalized_content_type(&self) -> String {
        self.content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }
}

/// A destination for uploaded files.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Store `file` under `folder` and return its URL.
    async fn upload(&self, file: &UploadFile, folder: &str) -> Result<String, MediaError>;

    /// Uploader name for logs and diagnostics.
    fn uploader_name(&self) -> &'static str;
}

/// Validate, then upload.
///
/// # Errors
///
/// Returns the validation error without contacting the uploader, or the
/// uploader's error.
pub async fn upload_validated(
    uploader: &dyn MediaUploader,
    file: &UploadFile,
    folder: &str,
) -> Result<String, MediaError> {
    file.validate()?;
    let url = uploader.upload(file, folder).await?;
    tracing::info!(
        uploader = uploader.uploader_name(),
        file_name = %file.file_name,
        size = file.bytes.len(),
        "File uploaded"
    );
    Ok(url)
}

/// Embeds files as `data:` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineUploader;

#[async_trait]
impl MediaUploader for InlineUploader {
    async fn upload(&self, file: &UploadFile, _folder: &str) -> Result<String, MediaError> {
        Ok(format!(
            "data:{};base64,{}",
            file.normalized_content_type(),
            STANDARD.encode(&file.bytes)
        ))
    }

    fn uploader_name(&self) -> &'static str {
        "inline"
    }
}
