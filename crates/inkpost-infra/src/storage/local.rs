//! Local filesystem image store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use inkpost_core::ports::{ImageStore, ImageUpload, StorageError, StoredImage};

/// Stores uploaded images as plain files in one directory.
///
/// Names look like `<unix-millis>-<uuid><ext>`. Files are opened with
/// create-new semantics, so an existing file is never overwritten.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    /// Open the store, creating the directory if it does not exist.
    pub async fn init(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::Io(format!("creating {}: {}", root.display(), e)))?;

        tracing::info!(upload_dir = %root.display(), "Image store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn generate_file_name(extension: &str) -> String {
        format!(
            "{}-{}{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            extension
        )
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, image: ImageUpload) -> Result<StoredImage, StorageError> {
        let file_name = Self::generate_file_name(&image.extension());
        let path = self.root.join(&file_name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    StorageError::Io(format!("upload name collision on {file_name}"))
                }
                _ => StorageError::Io(e.to_string()),
            })?;

        let written = async {
            file.write_all(image.bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            // Do not leave a truncated file behind.
            let _ = fs::remove_file(&path).await;
            return Err(StorageError::Io(e.to_string()));
        }

        tracing::debug!(
            file_name = %file_name,
            content_type = image.content_type(),
            size = image.bytes().len(),
            "Stored uploaded image"
        );

        Ok(StoredImage {
            file_name,
            size: image.bytes().len(),
        })
    }
}
