//! Shared-receipt kiosk and clinic settings handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use clinicdesk_sharing::{ClinicSettingsUpdate, SharedReceiptView};
use clinicdesk_types::{Clinic, ReceiptId};

use crate::dto::{ShareResponse, SharedQuery, UpdateSettingsRequest};
use crate::error::ApiResult;
use crate::extractors::{Auth, ValidatedJson};
use crate::state::AppState;

pub async fn share_receipt(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    Path(id): Path<ReceiptId>,
) -> ApiResult<Json<ShareResponse>> {
    let slot = state.sharing.share(&ctx, id).await?;
    Ok(Json(ShareResponse {
        receipt_id: slot.receipt_id,
        expires_at: slot.expires_at,
    }))
}

/// The unauthenticated kiosk read. Returns 200 with null when nothing is
/// shared, so the kiosk can poll without special-casing.
pub async fn read_shared(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SharedQuery>,
) -> ApiResult<Json<Option<SharedReceiptView>>> {
    Ok(Json(state.sharing.read(query.clinic_id).await?))
}

pub async fn clear_shared(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
) -> ApiResult<StatusCode> {
    state.sharing.clear(&ctx).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    ValidatedJson(req): ValidatedJson<UpdateSettingsRequest>,
) -> ApiResult<Json<Clinic>> {
    let update = ClinicSettingsUpdate {
        name: req.name,
        address: req.address,
        phone: req.phone,
        share_duration_minutes: req.share_duration_minutes,
    };
    Ok(Json(state.sharing.update_settings(&ctx, update).await?))
}
