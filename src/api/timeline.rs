use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Datelike;
use serde::Deserialize;
use serde_json::json;

use crate::api::error_response;
use crate::domain::timeline::{DateField, TimelineQuery};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::services::acquisition_service;

#[derive(Debug, Default, Deserialize)]
pub struct TimelineParams {
    /// Defaults to the current year
    pub year: Option<i32>,
    #[serde(default)]
    pub field: DateField,
    #[serde(default)]
    pub exclude_owned: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct YearsParams {
    #[serde(default)]
    pub field: DateField,
}

#[utoipa::path(
    get,
    path = "/api/timeline",
    params(
        ("year" = Option<i32>, Query, description = "Calendar year, defaults to the current one"),
        ("field" = Option<String>, Query, description = "payment or release"),
        ("exclude_owned" = Option<bool>, Query, description = "Hide owned figures")
    ),
    responses(
        (status = 200, description = "Twelve month buckets with summaries"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_timeline(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<TimelineParams>,
) -> impl IntoResponse {
    let query = TimelineQuery {
        year: params
            .year
            .unwrap_or_else(|| acquisition_service::today().year()),
        field: params.field,
        exclude_owned: params.exclude_owned,
    };

    match acquisition_service::timeline(state.acquisition_repo.as_ref(), claims.uid, query).await {
        Ok(timeline) => Json(json!({ "success": true, "timeline": timeline })).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_years(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<YearsParams>,
) -> impl IntoResponse {
    match acquisition_service::years(state.acquisition_repo.as_ref(), claims.uid, params.field)
        .await
    {
        Ok(years) => Json(json!({ "success": true, "years": years })).into_response(),
        Err(e) => error_response(e),
    }
}
