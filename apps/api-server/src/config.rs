//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use inkpost_core::domain::AccessPolicy;
use inkpost_core::ports::DEFAULT_MAX_IMAGE_BYTES;
use inkpost_infra::database::DatabaseConfig;
use inkpost_infra::{JwtConfig, RateLimitConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub upload: UploadConfig,
    pub auth: AuthConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    /// Key rate limits on `Forwarded`/`X-Forwarded-For` instead of the peer
    /// address. Only safe behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
}

/// Where uploaded images go and how they are addressed.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
    /// Overrides the request's scheme and host when building image URLs.
    pub public_base_url: Option<String>,
}

/// Administrator credentials and which surfaces they protect.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Argon2 PHC string of the admin password. Unset disables admin login.
    pub admin_password_hash: Option<String>,
    pub protect_public_writes: bool,
}

impl AuthConfig {
    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy {
            protect_admin: self.admin_password_hash.is_some(),
            protect_public_writes: self.protect_public_writes,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let mut db = DatabaseConfig::new(url);
            if let Some(max) = parse_var("DB_MAX_CONNECTIONS") {
                db.max_connections = max;
            }
            if let Some(min) = parse_var("DB_MIN_CONNECTIONS") {
                db.min_connections = min;
            }
            db
        });

        let upload = UploadConfig {
            dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            max_bytes: parse_var("UPLOAD_MAX_BYTES").unwrap_or(DEFAULT_MAX_IMAGE_BYTES),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        let auth = AuthConfig {
            admin_password_hash: env::var("ADMIN_PASSWORD_HASH")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            protect_public_writes: parse_flag("PROTECT_PUBLIC_WRITES"),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT").unwrap_or(5000),
            database,
            upload,
            auth,
            jwt: JwtConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            trust_proxy_headers: parse_flag("TRUST_PROXY_HEADERS"),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}

fn parse_flag(name: &str) -> bool {
    env::var(name).map(|v| v == "true" || v == "1").unwrap_or(false)
}
