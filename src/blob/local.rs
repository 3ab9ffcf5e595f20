use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufReader};
use uuid::Uuid;

use super::{BlobError, BlobStorage, UploadedAsset, resource_type_for};

/// Stores assets on the local filesystem and serves them under
/// `<base_url>/assets/<asset_id>`.
pub struct LocalBlobStorage {
    base_path: PathBuf,
    url_prefix: String,
}

impl LocalBlobStorage {
    pub fn new(assets_dir: &Path, base_url: &str) -> Self {
        Self {
            base_path: assets_dir.to_path_buf(),
            url_prefix: format!("{}/assets/", base_url.trim_end_matches('/')),
        }
    }

    fn asset_path(&self, asset_id: &str) -> PathBuf {
        self.base_path.join(asset_id)
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path.join(".tmp").join(Uuid::new_v4().to_string())
    }

    /// Opens a stored asset for streaming. Returns the reader and its size.
    pub async fn open(&self, asset_id: &str) -> Result<(BufReader<File>, u64), BlobError> {
        validate_asset_id(asset_id)?;
        let path = self.asset_path(asset_id);
        let file = File::open(&path).await.map_err(BlobError::from_io)?;

        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(BlobError::NotFound);
        }

        Ok((BufReader::new(file), metadata.len()))
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    async fn upload(
        &self,
        data: &[u8],
        folder: &str,
        name: &str,
    ) -> Result<UploadedAsset, BlobError> {
        let asset_id = format!("{}/{}", folder.trim_matches('/'), name);
        validate_asset_id(&asset_id)?;

        let temp_path = self.temp_path();
        if let Some(parent) = temp_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut temp_file = File::create(&temp_path).await?;
        temp_file.write_all(data).await?;
        temp_file.sync_all().await?;

        let final_path = self.asset_path(&asset_id);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // The link fails instead of replacing an asset already at this id.
        let linked = fs::hard_link(&temp_path, &final_path).await;
        if let Err(e) = fs::remove_file(&temp_path).await {
            tracing::warn!("Failed to remove temp upload {}: {}", temp_path.display(), e);
        }
        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(BlobError::AlreadyExists);
            }
            Err(e) => return Err(BlobError::Io(e)),
        }

        Ok(UploadedAsset {
            url: format!("{}{}", self.url_prefix, asset_id),
            resource_type: resource_type_for(name),
            asset_id,
        })
    }

    async fn delete(&self, asset_id: &str) -> Result<bool, BlobError> {
        validate_asset_id(asset_id)?;

        match fs::remove_file(self.asset_path(asset_id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    fn asset_id_from_url(&self, url: &str) -> Option<String> {
        let asset_id = url.strip_prefix(&self.url_prefix)?;
        is_valid_asset_id(asset_id).then(|| asset_id.to_string())
    }
}

fn validate_asset_id(asset_id: &str) -> Result<(), BlobError> {
    if asset_id.is_empty() || asset_id.starts_with('/') || asset_id.contains('\\') {
        return Err(BlobError::InvalidAssetId);
    }

    for segment in asset_id.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." || segment.starts_with('.') {
            return Err(BlobError::InvalidAssetId);
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(BlobError::InvalidAssetId);
        }
    }

    Ok(())
}

#[must_use]
pub fn is_valid_asset_id(asset_id: &str) -> bool {
    validate_asset_id(asset_id).is_ok()
}
