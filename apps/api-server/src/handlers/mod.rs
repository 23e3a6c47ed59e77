//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;
mod upload;

#[cfg(test)]
mod test_support;

use actix_web::web;

use inkpost_core::domain::Surface;

use crate::middleware::error::AppError;

pub use upload::uploads_service;

/// Configure all `/api` routes.
///
/// `/api/posts` and `/api/admin/posts` are served by the same handlers; the
/// scope-level `Surface` tells the access gate which rules apply.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .route("/upload", web::post().to(upload::upload_image))
            .service(web::scope("/auth").route("/login", web::post().to(auth::login)))
            .service(
                web::scope("/posts")
                    .app_data(web::Data::new(Surface::Public))
                    .route("", web::get().to(posts::list_posts))
                    .route("", web::post().to(posts::create_post))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}", web::put().to(posts::update_post))
                    .route("/{id}", web::delete().to(posts::delete_post)),
            )
            // Admin routes
            .service(
                web::scope("/admin")
                    .app_data(web::Data::new(Surface::Admin))
                    .route("/posts", web::get().to(posts::list_posts))
                    .route("/posts", web::post().to(posts::create_post))
                    .route("/posts/{id}", web::delete().to(posts::delete_post)),
            ),
    );
}

/// Malformed JSON bodies become problem-details 400s instead of plain text.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}
