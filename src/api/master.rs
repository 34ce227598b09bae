//! Master data handlers (series, characters, manufacturers, categories,
//! scales, shops)

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::error_response;
use crate::domain::MasterFilter;
use crate::domain::figure::MasterKind;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;

#[derive(Debug, Deserialize)]
pub struct CreateMasterRequest {
    pub name: String,
    pub parent_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RenameMasterRequest {
    pub name: String,
}

#[utoipa::path(
    get,
    path = "/api/master/{kind}",
    params(
        ("kind" = String, Path, description = "series, character, manufacturer, category, scale or shop"),
        ("q" = Option<String>, Query, description = "Name prefix"),
        ("parent_id" = Option<i32>, Query, description = "Parent row, e.g. the series of a character"),
        ("limit" = Option<u64>, Query, description = "Maximum number of rows")
    ),
    responses(
        (status = 200, description = "Entries ordered by name"),
        (status = 400, description = "Unknown kind")
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(filter): Query<MasterFilter>,
) -> impl IntoResponse {
    let kind = match kind.parse::<MasterKind>() {
        Ok(kind) => kind,
        Err(e) => return error_response(e),
    };
    match state.master_repo.search(kind, filter).await {
        Ok(entries) => Json(json!({ "success": true, "entries": entries })).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn create(
    State(state): State<AppState>,
    _claims: Claims,
    Path(kind): Path<String>,
    Json(payload): Json<CreateMasterRequest>,
) -> impl IntoResponse {
    let kind = match kind.parse::<MasterKind>() {
        Ok(kind) => kind,
        Err(e) => return error_response(e),
    };
    match state
        .master_repo
        .create(kind, payload.name, payload.parent_id)
        .await
    {
        Ok(entry) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "entry": entry })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Renames show up in every user's catalog, so only admins may do them.
pub async fn rename(
    State(state): State<AppState>,
    claims: Claims,
    Path((kind, id)): Path<(String, i32)>,
    Json(payload): Json<RenameMasterRequest>,
) -> impl IntoResponse {
    if !claims.is_admin() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "error": "Admin role required" })),
        )
            .into_response();
    }
    let kind = match kind.parse::<MasterKind>() {
        Ok(kind) => kind,
        Err(e) => return error_response(e),
    };
    match state.master_repo.rename(kind, id, payload.name).await {
        Ok(entry) => Json(json!({ "success": true, "entry": entry })).into_response(),
        Err(e) => error_response(e),
    }
}
