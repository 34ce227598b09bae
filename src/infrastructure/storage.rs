//! Content-addressed image object store on the local filesystem.
//!
//! Objects live under `<root>/<bucket>/<sha256>.<ext>` and are served
//! statically from `/storage`.

use image::ImageFormat;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::DomainError;

/// Bucket figure images are uploaded to
pub const FIGURE_BUCKET: &str = "figures";

#[derive(Debug, Clone, Serialize)]
pub struct StoredObject {
    pub url: String,
    pub key: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct ObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

fn valid_bucket(bucket: &str) -> bool {
    !bucket.is_empty()
        && bucket
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

fn extension_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("png"),
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::WebP => Some("webp"),
        ImageFormat::Gif => Some("gif"),
        _ => None,
    }
}

impl ObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Store `bytes` and return its public URL. Uploading the same content
    /// twice yields the same key.
    pub async fn upload(
        &self,
        bucket: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<StoredObject, DomainError> {
        if !valid_bucket(bucket) {
            return Err(DomainError::Validation(format!(
                "Invalid bucket name: {}",
                bucket
            )));
        }
        if bytes.is_empty() {
            return Err(DomainError::Validation("Empty file".to_string()));
        }

        let ext = image::guess_format(bytes)
            .ok()
            .and_then(extension_for)
            .ok_or_else(|| {
                DomainError::Validation(format!("{} is not a supported image", filename))
            })?;

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let sha256 = hex::encode(hasher.finalize());
        let key = format!("{}.{}", sha256, ext);

        let dir = self.root.join(bucket);
        fs::create_dir_all(&dir).await?;

        let path = dir.join(&key);
        if fs::try_exists(&path).await? {
            tracing::debug!("Object already stored: {}/{}", bucket, key);
        } else {
            let mut file = fs::File::create(&path).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
        }

        let url = format!("{}/storage/{}/{}", self.public_base_url, bucket, key);
        tracing::info!("Object uploaded: {} (sha256: {})", url, &sha256[..16]);

        Ok(StoredObject {
            url,
            key,
            size: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[tokio::test]
    async fn test_upload_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ObjectStorage::new(dir.path(), "http://localhost:8000/");

        let first = storage.upload("figures", "rem.png", PNG).await.unwrap();
        let second = storage.upload("figures", "copy.png", PNG).await.unwrap();

        assert_eq!(first.key, second.key);
        assert!(first.key.ends_with(".png"));
        assert_eq!(
            first.url,
            format!("http://localhost:8000/storage/figures/{}", first.key)
        );
        assert!(dir.path().join("figures").join(&first.key).exists());
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ObjectStorage::new(dir.path(), "http://localhost:8000");

        assert!(matches!(
            storage.upload("Figures", "a.png", PNG).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            storage.upload("../etc", "a.png", PNG).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            storage.upload("figures", "a.png", b"").await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            storage.upload("figures", "notes.txt", b"just some text").await,
            Err(DomainError::Validation(_))
        ));
    }
}
