//! Blob storage provider contract.
//!
//! Media rows hold a resolved URL. The provider turns uploaded bytes into
//! such a URL and can later delete the asset behind it. Only URLs the
//! provider recognises via [`BlobStorage::asset_id_from_url`] are managed.

mod local;

pub use local::LocalBlobStorage;

use std::io::ErrorKind;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::MediaType;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("asset not found")]
    NotFound,
    #[error("invalid asset id")]
    InvalidAssetId,
    #[error("asset already exists")]
    AlreadyExists,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlobError {
    fn from_io(e: std::io::Error) -> Self {
        if e.kind() == ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io(e)
        }
    }
}

impl From<BlobError> for crate::error::Error {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::NotFound => Self::NotFound,
            BlobError::InvalidAssetId => Self::Validation("invalid asset id".to_string()),
            BlobError::AlreadyExists => Self::AlreadyExists,
            BlobError::Io(e) => Self::Storage(e.to_string()),
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub url: String,
    pub resource_type: MediaType,
    pub asset_id: String,
}

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores `data` as `<folder>/<name>`. Never replaces an existing asset.
    async fn upload(
        &self,
        data: &[u8],
        folder: &str,
        name: &str,
    ) -> Result<UploadedAsset, BlobError>;

    /// Deletes an asset. Returns false if it was already gone.
    async fn delete(&self, asset_id: &str) -> Result<bool, BlobError>;

    /// Extracts the asset id from a URL this provider issued, or `None` if
    /// the URL is not managed here.
    fn asset_id_from_url(&self, url: &str) -> Option<String>;
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "m4v", "avi", "mkv"];

/// Classifies an asset by its file extension.
#[must_use]
pub fn resource_type_for(name: &str) -> MediaType {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        MediaType::Video
    } else {
        MediaType::Image
    }
}

/// Reduces an uploaded file name to a safe `<stem>.<ext>` pair. The stem
/// keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (base, None),
    };

    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    };

    let stem = match clean(stem) {
        s if s.trim_matches('_').is_empty() => "upload".to_string(),
        s => s,
    };

    match ext.map(|e| clean(e).to_ascii_lowercase()) {
        Some(ext) if !ext.is_empty() => format!("{stem}.{ext}"),
        _ => stem,
    }
}
