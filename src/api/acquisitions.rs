//! Acquisition handlers. Every route acts on the caller's own records.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::api::error_response;
use crate::domain::CreateAcquisitionInput;
use crate::domain::acquisition::{AcquisitionPatch, AmountEdit, Milestone};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::services::acquisition_service;

pub async fn list_acquisitions(State(state): State<AppState>, claims: Claims) -> impl IntoResponse {
    match acquisition_service::list(state.acquisition_repo.as_ref(), claims.uid).await {
        Ok(acquisitions) => Json(json!({
            "success": true,
            "total": acquisitions.len(),
            "acquisitions": acquisitions
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn create_acquisition(
    State(state): State<AppState>,
    claims: Claims,
    Json(input): Json<CreateAcquisitionInput>,
) -> impl IntoResponse {
    match acquisition_service::create(state.acquisition_repo.as_ref(), claims.uid, input).await {
        Ok(view) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "acquisition": view })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_acquisition(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match acquisition_service::get(state.acquisition_repo.as_ref(), claims.uid, id).await {
        Ok(view) => Json(json!({ "success": true, "acquisition": view })).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn update_acquisition(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(patch): Json<AcquisitionPatch>,
) -> impl IntoResponse {
    match acquisition_service::update(state.acquisition_repo.as_ref(), claims.uid, id, patch).await
    {
        Ok(view) => Json(json!({ "success": true, "acquisition": view })).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn delete_acquisition(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match acquisition_service::remove(state.acquisition_repo.as_ref(), claims.uid, id).await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn toggle_milestone(
    State(state): State<AppState>,
    claims: Claims,
    Path((id, milestone)): Path<(i32, String)>,
) -> impl IntoResponse {
    let milestone = match milestone.parse::<Milestone>() {
        Ok(milestone) => milestone,
        Err(e) => return error_response(e),
    };
    match acquisition_service::toggle_milestone(
        state.acquisition_repo.as_ref(),
        claims.uid,
        id,
        milestone,
        acquisition_service::today(),
    )
    .await
    {
        Ok(view) => Json(json!({ "success": true, "acquisition": view })).into_response(),
        Err(e) => error_response(e),
    }
}

/// Body is `{"deposit": n}` or `{"balance": n}`
pub async fn edit_amount(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(edit): Json<AmountEdit>,
) -> impl IntoResponse {
    match acquisition_service::edit_amount(state.acquisition_repo.as_ref(), claims.uid, id, edit)
        .await
    {
        Ok(view) => Json(json!({ "success": true, "acquisition": view })).into_response(),
        Err(e) => error_response(e),
    }
}
