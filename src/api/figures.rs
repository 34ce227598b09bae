//! Catalog handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::api::{error_response, not_found};
use crate::domain::FigureFilter;
use crate::domain::figure::{RegisterFigureInput, UpdateFigureInput};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::services;

#[utoipa::path(
    get,
    path = "/api/figures",
    params(
        ("q" = Option<String>, Query, description = "Name substring, any locale"),
        ("series_id" = Option<i32>, Query, description = "Series filter"),
        ("manufacturer_id" = Option<i32>, Query, description = "Manufacturer filter"),
        ("category_id" = Option<i32>, Query, description = "Category filter"),
        ("page" = Option<u64>, Query, description = "Page number starting at 0"),
        ("limit" = Option<u64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Matching figures, newest first")
    )
)]
pub async fn list_figures(
    State(state): State<AppState>,
    Query(filter): Query<FigureFilter>,
) -> impl IntoResponse {
    match state.figure_repo.find_all(filter).await {
        Ok(result) => Json(json!({
            "success": true,
            "figures": result.figures,
            "total": result.total
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/figures",
    responses(
        (status = 201, description = "Figure registered with its master data and images"),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn register_figure(
    State(state): State<AppState>,
    claims: Claims,
    Json(input): Json<RegisterFigureInput>,
) -> impl IntoResponse {
    match services::register_figure(state.db(), input, Some(claims.uid)).await {
        Ok(figure) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "figure": figure })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/figures/{id}",
    params(("id" = i32, Path, description = "Figure id")),
    responses(
        (status = 200, description = "Figure with master data and images"),
        (status = 404, description = "Unknown figure")
    )
)]
pub async fn get_figure(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    match state.figure_repo.find_by_id(id).await {
        Ok(Some(figure)) => Json(json!({ "success": true, "figure": figure })).into_response(),
        Ok(None) => not_found("Figure"),
        Err(e) => error_response(e),
    }
}

pub async fn update_figure(
    State(state): State<AppState>,
    _claims: Claims,
    Path(id): Path<i32>,
    Json(input): Json<UpdateFigureInput>,
) -> impl IntoResponse {
    match state.figure_repo.update(id, input).await {
        Ok(figure) => Json(json!({ "success": true, "figure": figure })).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn delete_figure(
    State(state): State<AppState>,
    _claims: Claims,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    match state.figure_repo.delete(id).await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => error_response(e),
    }
}
