//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod rate_limit;
mod repository;
mod storage;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use rate_limit::{RateDecision, RateLimitError, RateLimiter};
pub use repository::{BaseRepository, PostRepository};
pub use storage::{
    DEFAULT_MAX_IMAGE_BYTES, ImageStore, ImageUpload, StorageError, StoredImage, is_image_mime,
};
