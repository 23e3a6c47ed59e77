//! Application state - shared across all handlers.

use std::sync::Arc;

use inkpost_core::domain::AccessPolicy;
use inkpost_core::ports::{ImageStore, PasswordService, PostRepository, TokenService};
use inkpost_infra::{Argon2PasswordService, InMemoryPostRepository, JwtTokenService, LocalImageStore};

#[cfg(feature = "postgres")]
use inkpost_infra::PostgresPostRepository;

use crate::config::AppConfig;

/// Upload rules handlers need at request time.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_bytes: usize,
    pub public_base_url: Option<String>,
}

/// Shared application state.
///
/// Built once at startup and injected into every handler as `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub images: Arc<dyn ImageStore>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub access: AccessPolicy,
    pub admin_password_hash: Option<String>,
    pub uploads: UploadSettings,
    /// Name of the post store backend, reported by the health check.
    pub storage_backend: &'static str,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let access = config.auth.access_policy();
        if !access.protect_admin {
            tracing::warn!("ADMIN_PASSWORD_HASH not set. Admin routes are open to everyone.");
        }
        if access.protect_public_writes && config.auth.admin_password_hash.is_none() {
            tracing::warn!("PROTECT_PUBLIC_WRITES is set without an admin password; public writes are impossible.");
        }
        // Tokens signed with the built-in secret can be forged by anyone.
        if (access.protect_admin || access.protect_public_writes) && config.jwt.uses_builtin_secret() {
            anyhow::bail!("JWT_SECRET must be set when admin routes or public writes are protected");
        }

        let (posts, storage_backend) = Self::post_repository(config).await?;

        let images: Arc<dyn ImageStore> = Arc::new(LocalImageStore::init(&config.upload.dir).await?);

        tracing::info!(storage = storage_backend, "Application state initialized");

        Ok(Self {
            posts,
            images,
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            access,
            admin_password_hash: config.auth.admin_password_hash.clone(),
            uploads: UploadSettings {
                max_bytes: config.upload.max_bytes,
                public_base_url: config.upload.public_base_url.clone(),
            },
            storage_backend,
        })
    }

    #[cfg(feature = "postgres")]
    async fn post_repository(
        config: &AppConfig,
    ) -> anyhow::Result<(Arc<dyn PostRepository>, &'static str)> {
        match &config.database {
            Some(db_config) => {
                let conn = inkpost_infra::database::connect(db_config).await?;
                Ok((Arc::new(PostgresPostRepository::new(conn)), "postgres"))
            }
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Ok((Arc::new(InMemoryPostRepository::new()), "memory"))
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn post_repository(
        config: &AppConfig,
    ) -> anyhow::Result<(Arc<dyn PostRepository>, &'static str)> {
        if config.database.is_some() {
            tracing::warn!("DATABASE_URL is ignored without the postgres feature");
        }
        tracing::info!("Running without postgres feature - using in-memory repository");
        Ok((Arc::new(InMemoryPostRepository::new()), "memory"))
    }
}
