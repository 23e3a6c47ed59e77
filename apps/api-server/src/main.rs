//! # Inkpost API Server
//!
//! The main entry point for the Actix-web HTTP server.
//!
//! `api-server hash-password <password>` prints an Argon2 hash suitable for
//! `ADMIN_PASSWORD_HASH` and exits.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use inkpost_core::ports::{PasswordService, RateLimiter};
use inkpost_infra::{Argon2PasswordService, InMemoryRateLimiter};

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::rate_limit::RateLimitMiddleware;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::LogFormat;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("hash-password") {
        let password = args
            .next()
            .ok_or_else(|| anyhow::anyhow!("usage: api-server hash-password <password>"))?;
        println!("{}", Argon2PasswordService::new().hash(&password)?);
        return Ok(());
    }

    telemetry::init_telemetry(LogFormat::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Inkpost API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await?;
    let limiter: Arc<dyn RateLimiter> =
        Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone())?);
    let upload_dir = config.upload.dir.clone();
    let trust_proxy_headers = config.trust_proxy_headers;
    if trust_proxy_headers {
        tracing::info!("Rate limits keyed on forwarding headers (TRUST_PROXY_HEADERS)");
    }

    HttpServer::new(move || {
        App::new()
            .wrap(
                RateLimitMiddleware::new(limiter.clone())
                    .trust_forwarded_headers(trust_proxy_headers),
            )
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
            .service(handlers::uploads_service(&upload_dir))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
