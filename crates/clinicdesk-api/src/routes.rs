//! Route definitions
//!
//! Everything under `/api/v1` except the kiosk read requires the access
//! guard; `GET /shared` stays open and takes the clinic id as a query
//! parameter since the kiosk holds no credentials.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::guard;
use crate::handlers;
use crate::state::AppState;

/// Create API v1 routes
pub fn api_v1_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let authenticated = Router::new()
        .nest("/visits", visit_routes())
        .nest("/receipts", receipt_routes())
        .route("/shared", delete(handlers::sharing::clear_shared))
        .route("/clinic/settings", put(handlers::sharing::update_settings))
        .route_layer(middleware::from_fn_with_state(state, guard::auth_middleware));

    Router::new()
        .merge(authenticated)
        // Public kiosk read
        .route("/shared", get(handlers::sharing::read_shared))
}

fn visit_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(handlers::visits::create_visit))
        .route("/", get(handlers::visits::list_visits))
        .route("/:id", get(handlers::visits::get_visit))
        .route("/:id", delete(handlers::visits::delete_visit))
        .route("/:id/status", post(handlers::visits::transition_visit))
        .route("/:id/prescription", post(handlers::visits::create_prescription))
        .route("/:id/prescription", get(handlers::visits::get_prescription))
        .route("/:id/prescription", put(handlers::visits::update_prescription))
        .route(
            "/:id/prescription/finalize",
            post(handlers::visits::finalize_prescription),
        )
}

fn receipt_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(handlers::receipts::create_receipt))
        .route("/", get(handlers::receipts::list_receipts))
        .route("/mark-paid", post(handlers::receipts::mark_paid))
        .route("/:id", get(handlers::receipts::get_receipt))
        .route("/:id", delete(handlers::receipts::delete_receipt))
        .route("/:id/share", post(handlers::sharing::share_receipt))
}
