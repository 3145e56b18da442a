//! Object storage for product images.
//!
//! Speaks the Supabase-compatible storage REST API:
//! `POST {base}/storage/v1/object/{bucket}/{path}` with the service key as a
//! bearer token, and public URLs under `{base}/storage/v1/object/public/`.

use std::time::Duration;

use reqwest::{Client, Url};
use sha2::{Digest, Sha256};
use thiserror::Error;

const IMAGE_PREFIX: &str = "product-images";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid storage url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: Url,
    service_key: String,
    bucket: String,
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("base_url", &self.base_url.as_str())
            .field("service_key", &"[redacted]")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl StorageClient {
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidBaseUrl`] if `base_url` does not parse,
    /// or [`StorageError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        service_key: &str,
        bucket: &str,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("storefront-server/0.1")
            .build()?;
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| StorageError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            service_key: service_key.to_owned(),
            bucket: bucket.to_owned(),
        })
    }

    /// Public URL of an object in this bucket.
    #[must_use]
    pub fn public_url(&self, path: &str) -> String {
        self.object_url(&["public"], path).to_string()
    }

    /// Uploads `bytes` to `path` without overwriting and returns the
    /// object's public URL.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Rejected`] on a non-2xx answer (including an
    /// existing object at `path`) or [`StorageError::Http`] on network failure.
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = self.object_url(&[], path);
        let size = bytes.len();
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.service_key)
            .header("x-upsert", "false")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(path, size, "image uploaded");
        Ok(self.public_url(path))
    }

    fn object_url(&self, scope: &[&str], path: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["storage", "v1", "object"])
                .extend(scope)
                .push(&self.bucket)
                .extend(path.split('/'));
        }
        url
    }
}

/// Content-addressed object path: re-uploading the same bytes under the same
/// name lands on the same key.
#[must_use]
pub fn image_path(filename: &str, bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!(
        "{IMAGE_PREFIX}/{}-{}",
        hex::encode(&digest[..6]),
        sanitize_filename(filename)
    )
}

fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '-' || c == '.');
    if trimmed.is_empty() {
        "image".to_owned()
    } else {
        trimmed.to_owned()
    }
}
