//! Image storage port - where uploaded images end up.

use async_trait::async_trait;

/// Largest image accepted unless configured otherwise (5 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// An image received from a client, already checked against the upload rules.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    original_name: Option<String>,
    content_type: String,
    bytes: Vec<u8>,
}

impl ImageUpload {
    /// Build an upload, rejecting non-image MIME types and oversized payloads.
    pub fn new(
        original_name: Option<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
        max_bytes: usize,
    ) -> Result<Self, StorageError> {
        let content_type = content_type.into();
        if !is_image_mime(&content_type) {
            return Err(StorageError::NotAnImage);
        }
        if bytes.len() > max_bytes {
            return Err(StorageError::TooLarge { max_bytes });
        }

        Ok(Self {
            original_name,
            content_type,
            bytes,
        })
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Extension of the original filename including the dot, lowercased.
    /// Empty when there is none or it contains anything but ASCII alphanumerics.
    pub fn extension(&self) -> String {
        let Some(name) = self.original_name.as_deref() else {
            return String::new();
        };
        match name.rsplit_once('.') {
            Some((stem, ext))
                if !stem.is_empty()
                    && !ext.is_empty()
                    && ext.len() <= 10
                    && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                format!(".{}", ext.to_ascii_lowercase())
            }
            _ => String::new(),
        }
    }
}

/// True when `content_type` names an `image/*` media type.
pub fn is_image_mime(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .strip_prefix("image/")
        .is_some_and(|subtype| !subtype.is_empty())
}

/// A stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Generated name, unique within the store.
    pub file_name: String,
    pub size: usize,
}

/// Image store trait - abstraction over upload backends.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist an image under a freshly generated name.
    async fn put(&self, image: ImageUpload) -> Result<StoredImage, StorageError>;
}

/// Upload and storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Please upload a file")]
    MissingFile,

    #[error("Not an image! Please upload only images.")]
    NotAnImage,

    #[error("File is too large. Maximum size is {}MB", .max_bytes / (1024 * 1024))]
    TooLarge { max_bytes: usize },

    #[error("Storage I/O failed: {0}")]
    Io(String),
}
