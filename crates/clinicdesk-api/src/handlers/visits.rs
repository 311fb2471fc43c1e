//! Visit and prescription handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use clinicdesk_types::{Prescription, Visit, VisitId};

use crate::dto::{
    CreateVisitRequest, ListVisitsQuery, PrescriptionRequest, TransitionRequest,
};
use crate::error::ApiResult;
use crate::extractors::{Auth, ValidatedJson};
use crate::state::AppState;

pub async fn create_visit(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    ValidatedJson(req): ValidatedJson<CreateVisitRequest>,
) -> ApiResult<(StatusCode, Json<Visit>)> {
    let visit = state
        .visits
        .create_visit(&ctx, req.patient.into(), req.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(visit)))
}

pub async fn list_visits(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    Query(query): Query<ListVisitsQuery>,
) -> ApiResult<Json<Vec<Visit>>> {
    Ok(Json(state.visits.list_visits(&ctx, query.date).await))
}

pub async fn get_visit(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    Path(id): Path<VisitId>,
) -> ApiResult<Json<Visit>> {
    Ok(Json(state.visits.get_visit(&ctx, id).await?))
}

pub async fn transition_visit(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    Path(id): Path<VisitId>,
    ValidatedJson(req): ValidatedJson<TransitionRequest>,
) -> ApiResult<Json<Visit>> {
    Ok(Json(state.visits.transition(&ctx, id, req.status).await?))
}

pub async fn delete_visit(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    Path(id): Path<VisitId>,
) -> ApiResult<StatusCode> {
    state.visits.delete_visit(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_prescription(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    Path(id): Path<VisitId>,
    ValidatedJson(req): ValidatedJson<PrescriptionRequest>,
) -> ApiResult<(StatusCode, Json<Prescription>)> {
    let rx = state
        .visits
        .create_prescription(&ctx, id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(rx)))
}

pub async fn get_prescription(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    Path(id): Path<VisitId>,
) -> ApiResult<Json<Prescription>> {
    Ok(Json(state.visits.get_prescription(&ctx, id).await?))
}

pub async fn update_prescription(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    Path(id): Path<VisitId>,
    ValidatedJson(req): ValidatedJson<PrescriptionRequest>,
) -> ApiResult<Json<Prescription>> {
    Ok(Json(
        state.visits.update_prescription(&ctx, id, req.into()).await?,
    ))
}

pub async fn finalize_prescription(
    State(state): State<Arc<AppState>>,
    Auth(ctx): Auth,
    Path(id): Path<VisitId>,
) -> ApiResult<Json<Prescription>> {
    Ok(Json(state.visits.finalize_prescription(&ctx, id).await?))
}
