//! Receipt handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use clinicdesk_receipts::NewReceipt;
use clinicdesk_types::{Receipt, ReceiptId};

use crate::dto::{CreateReceiptRequest, MarkPaidRequest, MarkPaidResponse};
use crate::error::ApiResult;
use crate::extractors::{Auth, ValidatedJson};
use crate::state::AppState;

pub async fn create_receipt(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    ValidatedJson(req): ValidatedJson<CreateReceiptRequest>,
) -> ApiResult<(StatusCode, Json<Receipt>)> {
    let input = NewReceipt {
        visit_id: req.visit_id,
        patient: req.patient.clone().map(Into::into),
        line_items: req.line_items(),
        discount_amount: req.discount_amount,
        discount_reason: req.discount_reason.clone(),
    };
    let receipt = state.receipts.create_receipt(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list_receipts(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
) -> ApiResult<Json<Vec<Receipt>>> {
    Ok(Json(state.receipts.list_receipts(&ctx).await))
}

pub async fn get_receipt(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    Path(id): Path<ReceiptId>,
) -> ApiResult<Json<Receipt>> {
    Ok(Json(state.receipts.get_receipt(&ctx, id).await?))
}

pub async fn mark_paid(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    ValidatedJson(req): ValidatedJson<MarkPaidRequest>,
) -> ApiResult<Json<MarkPaidResponse>> {
    let updated = state
        .receipts
        .mark_paid(&ctx, &req.receipt_ids, req.payment_mode)
        .await?;
    Ok(Json(MarkPaidResponse { updated }))
}

pub async fn delete_receipt(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    Path(id): Path<ReceiptId>,
) -> ApiResult<StatusCode> {
    state.receipts.delete_receipt(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
