//! Access guard: caller identity resolution
//!
//! Token verification is an external collaborator. The API consumes it
//! through the [`AccessGuard`] trait; the default [`HeaderAccessGuard`]
//! trusts `x-user-id`, `x-clinic-id` and `x-role` headers, which is what a
//! fronting auth proxy injects after verifying the session.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use clinicdesk_types::{AuthContext, ClinicId, Role, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Resolves the caller identity for a request
#[async_trait]
pub trait AccessGuard: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<AuthContext, ApiError>;
}

/// Trusts identity headers injected by a fronting auth proxy
pub struct HeaderAccessGuard;

fn header<'h>(headers: &'h HeaderMap, name: &str) -> Result<&'h str, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)
}

#[async_trait]
impl AccessGuard for HeaderAccessGuard {
    async fn resolve(&self, headers: &HeaderMap) -> Result<AuthContext, ApiError> {
        let user_id =
            UserId::parse(header(headers, "x-user-id")?).map_err(|_| ApiError::Unauthorized)?;
        let clinic_id =
            ClinicId::parse(header(headers, "x-clinic-id")?).map_err(|_| ApiError::Unauthorized)?;
        let role = match header(headers, "x-role")? {
            "doctor" => Role::Doctor,
            "frontdesk" | "front_desk" => Role::FrontDesk,
            _ => return Err(ApiError::Unauthorized),
        };
        Ok(AuthContext::new(user_id, clinic_id, role))
    }
}

/// Middleware for authenticated routes: resolve the caller and stash the
/// context in request extensions for the `Auth` extractor.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = state.guard.resolve(req.headers()).await?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
