use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::api::error_response;
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::modules::import::{self, ImportFormat, RawRecord};
use crate::services::{BulkOutcome, bulk_service};

/// Pasted import text and how to read it
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub format: ImportFormat,
    pub text: String,
}

fn parse_records(payload: &BulkRequest) -> Result<Vec<RawRecord>, Response> {
    import::parse(payload.format, &payload.text)
        .map_err(|e| error_response(DomainError::Validation(e)))
}

/// Preview: per-record status without registering anything
pub async fn validate(Json(payload): Json<BulkRequest>) -> impl IntoResponse {
    let records = match parse_records(&payload) {
        Ok(records) => records,
        Err(response) => return response,
    };
    let report = import::validate_data(&records);
    Json(json!({ "success": true, "report": report })).into_response()
}

pub async fn register(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<BulkRequest>,
) -> impl IntoResponse {
    let records = match parse_records(&payload) {
        Ok(records) => records,
        Err(response) => return response,
    };

    match bulk_service::submit(state.db(), &records, Some(claims.uid)).await {
        Ok(BulkOutcome::Blocked(report)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "success": false,
                "error": format!("{} of {} records are invalid", report.errors.len(), report.total),
                "report": report
            })),
        )
            .into_response(),
        Ok(BulkOutcome::Completed(summary)) => Json(json!({
            "success": summary.failed == 0,
            "message": summary.message,
            "summary": summary
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}
