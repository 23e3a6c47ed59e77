//! Admin login.

use actix_web::{HttpResponse, web};

use inkpost_core::domain::ADMIN_ROLE;
use inkpost_core::ports::AuthError;
use inkpost_shared::dto::{AuthResponse, LoginRequest};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Subject of tokens issued to the administrator.
const ADMIN_SUBJECT: &str = "admin";

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let Some(hash) = state.admin_password_hash.clone() else {
        return Err(AppError::Unauthorized(
            "Admin login is not configured".to_string(),
        ));
    };

    // Argon2 verification blocks for tens of milliseconds.
    let passwords = state.passwords.clone();
    let password = body.into_inner().password;
    let verified = web::block(move || passwords.verify(&password, &hash)).await??;

    if !verified {
        tracing::warn!("Admin login failed");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state
        .tokens
        .generate_token(ADMIN_SUBJECT, vec![ADMIN_ROLE.to_string()])?;

    tracing::info!("Admin logged in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    }))
}
