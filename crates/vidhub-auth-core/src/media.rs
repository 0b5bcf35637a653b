//! Profile media hosting
//!
//! Avatars and cover images live on an external media host. Uploads are
//! staged on local disk first; the staged file is removed after every upload
//! attempt, successful or not.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

/// Default Cloudinary API base URL
pub const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Media host errors
#[derive(Error, Debug)]
pub enum MediaError {
    /// Staged file could not be read
    #[error("failed to read staged file: {0}")]
    Io(#[from] std::io::Error),

    /// Request never completed
    #[error("media host request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Host answered with a non-success status
    #[error("media host rejected request with status {status}")]
    Rejected { status: u16 },

    /// URL does not name a hosted asset
    #[error("not a hosted asset URL: {0}")]
    InvalidUrl(String),
}

/// A successfully hosted asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// Public HTTPS URL
    pub url: String,
    /// Host-side identifier, used for deletion
    pub public_id: String,
}

/// Media host abstraction
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Upload a staged local file; the file is removed afterwards either way
    async fn upload(&self, staged: &Path) -> Result<UploadedAsset, MediaError>;

    /// Delete a previously hosted asset by public ID
    async fn delete(&self, public_id: &str) -> Result<(), MediaError>;
}

/// Cloudinary credentials
#[derive(Clone)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
}

impl MediaConfig {
    /// Create a config against the public Cloudinary API
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            api_base: CLOUDINARY_API_BASE.to_string(),
        }
    }

    /// Point at a different API base (used by tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

/// Cloudinary-backed media host
#[derive(Clone)]
pub struct CloudinaryHost {
    client: Client,
    config: MediaConfig,
}

impl CloudinaryHost {
    /// Create a new Cloudinary host
    pub fn new(config: MediaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{path}", self.config.api_base, self.config.cloud_name)
    }

    async fn upload_inner(&self, staged: &Path) -> Result<UploadedAsset, MediaError> {
        let bytes = tokio::fs::read(staged).await?;
        let file_name = staged
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(&[("timestamp", &timestamp)], &self.config.api_secret);

        let form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name(file_name))
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(self.endpoint("auto/upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Media upload rejected");
            return Err(MediaError::Rejected {
                status: status.as_u16(),
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        Ok(UploadedAsset {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    #[instrument(skip(self))]
    async fn upload(&self, staged: &Path) -> Result<UploadedAsset, MediaError> {
        let result = self.upload_inner(staged).await;
        discard_staged(staged).await;

        if let Ok(asset) = &result {
            debug!(public_id = %asset.public_id, "Media uploaded");
        }
        result
    }

    #[instrument(skip(self))]
    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let form = [
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response = self
            .client
            .post(self.endpoint("image/destroy"))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MediaError::Rejected {
                status: response.status().as_u16(),
            });
        }

        debug!(public_id = %public_id, "Media deleted");
        Ok(())
    }
}

impl std::fmt::Debug for CloudinaryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryHost")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Sign request parameters: SHA-256 hex of the sorted `k=v&...` string
/// followed by the API secret.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Derive the public ID from a hosted asset URL (last path segment, no extension)
pub fn public_id_from_url(url: &str) -> Result<String, MediaError> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let segment = path
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MediaError::InvalidUrl(url.to_string()))?;

    let id = match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    };
    Ok(id.to_string())
}

/// Delete a hosted asset by URL, logging and swallowing any failure
pub async fn delete_best_effort<M: MediaHost + ?Sized>(host: &M, url: &str) {
    if url.is_empty() {
        return;
    }

    let public_id = match public_id_from_url(url) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "Skipping media cleanup");
            return;
        }
    };

    if let Err(e) = host.delete(&public_id).await {
        warn!(public_id = %public_id, error = %e, "Failed to delete hosted media");
    }
}

/// Remove a staged upload from local disk, ignoring files already gone
pub async fn discard_staged(staged: &Path) {
    match tokio::fs::remove_file(staged).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %staged.display(), error = %e, "Failed to remove staged file"),
    }
}
