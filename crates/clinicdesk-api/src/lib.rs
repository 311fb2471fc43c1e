//! ClinicDesk REST API
//!
//! # API Structure
//!
//! ```text
//! /api/v1/
//! ├── /visits                         - check-in, day list, lifecycle
//! │   /visits/{id}/status             - transitions
//! │   /visits/{id}/prescription       - draft, edit, finalize
//! ├── /receipts                       - create, list, mark-paid, delete
//! │   /receipts/{id}/share            - project onto the kiosk
//! ├── /shared                         - GET public kiosk read, DELETE clear
//! └── /clinic/settings                - PUT (doctor)
//! /health                             - liveness
//! ```
//!
//! Authenticated routes resolve the caller through the [`guard::AccessGuard`]
//! trait; the default implementation trusts identity headers injected by a
//! fronting auth proxy.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod guard;
pub mod handlers;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::http::HeaderName;
use axum::Router;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub use error::{ApiError, ApiResult};
pub use guard::{AccessGuard, HeaderAccessGuard};
pub use state::AppState;

/// API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Enable CORS for browser clients (the kiosk page is one)
    pub enable_cors: bool,
    /// Enable request tracing
    pub enable_tracing: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            enable_tracing: true,
        }
    }
}

/// Create the main API router with all middleware
pub fn create_router(state: Arc<AppState>, config: ApiConfig) -> Router {
    let mut router = Router::new()
        .nest("/api/v1", routes::api_v1_routes(state.clone()))
        .route("/health", axum::routing::get(handlers::health::health_check))
        .with_state(state);

    let x_request_id = HeaderName::from_static("x-request-id");
    router = router
        .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(x_request_id));

    if config.enable_tracing {
        router = router.layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");

                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        );
    }

    if config.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}
