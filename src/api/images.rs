use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::error_response;
use crate::domain::figure::ImageInput;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub image_ids: Vec<i32>,
}

pub async fn list_images(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match state.figure_repo.list_images(id).await {
        Ok(images) => Json(json!({ "success": true, "images": images })).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn add_image(
    State(state): State<AppState>,
    _claims: Claims,
    Path(id): Path<i32>,
    Json(input): Json<ImageInput>,
) -> impl IntoResponse {
    match state.figure_repo.add_image(id, input).await {
        Ok(image) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "image": image })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn set_thumbnail(
    State(state): State<AppState>,
    _claims: Claims,
    Path((id, image_id)): Path<(i32, i32)>,
) -> impl IntoResponse {
    match state.figure_repo.set_thumbnail(id, image_id).await {
        Ok(images) => Json(json!({ "success": true, "images": images })).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn reorder_images(
    State(state): State<AppState>,
    _claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<ReorderRequest>,
) -> impl IntoResponse {
    match state.figure_repo.reorder_images(id, payload.image_ids).await {
        Ok(images) => Json(json!({ "success": true, "images": images })).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn delete_image(
    State(state): State<AppState>,
    _claims: Claims,
    Path((id, image_id)): Path<(i32, i32)>,
) -> impl IntoResponse {
    match state.figure_repo.delete_image(id, image_id).await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => error_response(e),
    }
}
