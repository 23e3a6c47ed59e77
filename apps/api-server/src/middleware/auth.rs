//! Access gate extractor - resolves the caller and the route surface.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};

use inkpost_core::domain::{Access, AccessPolicy, Caller, Operation, Surface};
use inkpost_core::ports::AuthError;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Per-request access gate.
///
/// Every post handler takes a `Gate` and calls [`Gate::require`] before
/// touching the store, so the public and admin routes share one rule set:
/// ```ignore
/// async fn delete_post(gate: Gate, ...) -> AppResult<HttpResponse> {
///     gate.require(Operation::Write)?;
///     ...
/// }
/// ```
/// The surface comes from the scope's `web::Data<Surface>` (public if unset).
#[derive(Debug, Clone)]
pub struct Gate {
    surface: Surface,
    policy: AccessPolicy,
    caller: Caller,
    /// Why presented credentials were not accepted, for the 401 message.
    rejected: Option<String>,
}

impl Gate {
    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Fail with 401/403 unless the caller may perform `operation` here.
    pub fn require(&self, operation: Operation) -> Result<(), AppError> {
        match self.policy.check(self.surface, operation, &self.caller) {
            Access::Granted => Ok(()),
            Access::NeedsAuthentication => {
                tracing::debug!(surface = ?self.surface, ?operation, "Rejected anonymous caller");
                Err(match &self.rejected {
                    Some(reason) => AppError::Unauthorized(reason.clone()),
                    None => AuthError::MissingAuth.into(),
                })
            }
            Access::Forbidden => {
                tracing::warn!(surface = ?self.surface, ?operation, "Rejected non-admin caller");
                Err(AppError::Forbidden)
            }
        }
    }
}

/// Resolve the caller from an `Authorization: Bearer` header.
fn resolve_caller(req: &HttpRequest, state: &AppState) -> Result<Caller, AuthError> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(Caller::Anonymous);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    let claims = state.tokens.validate_token(token)?;
    Ok(Caller::Authenticated {
        subject: claims.subject,
        roles: claims.roles,
    })
}

impl FromRequest for Gate {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            tracing::error!("AppState not found in app data");
            return ready(Err(AppError::Internal(
                "Server configuration error".to_string(),
            )));
        };

        let surface = req
            .app_data::<web::Data<Surface>>()
            .map(|s| *s.get_ref())
            .unwrap_or(Surface::Public);

        let (caller, rejected) = match resolve_caller(req, state) {
            Ok(caller) => (caller, None),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unusable credentials");
                let reason = match AppError::from(e) {
                    AppError::Unauthorized(msg) => msg,
                    other => other.to_string(),
                };
                (Caller::Anonymous, Some(reason))
            }
        };

        ready(Ok(Gate {
            surface,
            policy: state.access,
            caller,
            rejected,
        }))
    }
}
