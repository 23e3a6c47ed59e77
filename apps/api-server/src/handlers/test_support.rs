//! Shared fixtures for handler tests.

use std::sync::Arc;

use tempfile::TempDir;

use inkpost_core::domain::ADMIN_ROLE;
use inkpost_core::ports::{DEFAULT_MAX_IMAGE_BYTES, PasswordService};
use inkpost_infra::{
    Argon2PasswordService, InMemoryPostRepository, JwtConfig, JwtTokenService, LocalImageStore,
};

use crate::config::AuthConfig;
use crate::state::{AppState, UploadSettings};

pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

const BOUNDARY: &str = "----inkpost-test-boundary";

/// In-memory state plus the temp directory backing the image store.
pub struct TestContext {
    pub state: AppState,
    pub upload_dir: TempDir,
}

impl TestContext {
    /// Everything open, matching a deployment without admin credentials.
    pub async fn open() -> Self {
        Self::build(AuthConfig::default()).await
    }

    /// Admin surface protected by [`ADMIN_PASSWORD`].
    pub async fn protected(protect_public_writes: bool) -> Self {
        let hash = Argon2PasswordService::new().hash(ADMIN_PASSWORD).unwrap();
        Self::build(AuthConfig {
            admin_password_hash: Some(hash),
            protect_public_writes,
        })
        .await
    }

    async fn build(auth: AuthConfig) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let images = LocalImageStore::init(upload_dir.path()).await.unwrap();

        let state = AppState {
            posts: Arc::new(InMemoryPostRepository::new()),
            images: Arc::new(images),
            tokens: Arc::new(JwtTokenService::new(JwtConfig {
                secret: "test-secret".to_string(),
                ..JwtConfig::default()
            })),
            passwords: Arc::new(Argon2PasswordService::new()),
            access: auth.access_policy(),
            admin_password_hash: auth.admin_password_hash,
            uploads: UploadSettings {
                max_bytes: DEFAULT_MAX_IMAGE_BYTES,
                public_base_url: None,
            },
            storage_backend: "memory",
        };

        Self { state, upload_dir }
    }

    pub fn admin_token(&self) -> String {
        self.state
            .tokens
            .generate_token("admin", vec![ADMIN_ROLE.to_string()])
            .unwrap()
    }

    pub fn reader_token(&self) -> String {
        self.state
            .tokens
            .generate_token("reader", vec!["reader".to_string()])
            .unwrap()
    }

    /// Number of files currently in the upload directory.
    pub fn stored_file_count(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path()).unwrap().count()
    }
}

/// Build the full application service around a [`TestContext`].
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.state.clone()))
                .configure($crate::handlers::configure_routes)
                .service($crate::handlers::uploads_service($ctx.upload_dir.path())),
        )
        .await
    };
}

pub(crate) use test_app;

/// Encode a single-file `multipart/form-data` body.
/// Returns the `Content-Type` header value and the body.
pub fn multipart_file(
    field: &str,
    file_name: &str,
    content_type: &str,
    data: &[u8],
) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
