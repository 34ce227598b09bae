use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::api::error_response;
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;

/// POST /api/storage/:bucket - upload one image (multipart field `file`)
pub async fn upload(
    State(state): State<AppState>,
    _claims: Claims,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return error_response(DomainError::Validation(format!(
                    "Multipart error: {}",
                    e
                )));
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                return error_response(DomainError::Validation(format!(
                    "File read error: {}",
                    e
                )));
            }
        };

        return match state.storage.upload(&bucket, &filename, &data).await {
            Ok(object) => (
                StatusCode::CREATED,
                Json(json!({
                    "success": true,
                    "url": object.url,
                    "key": object.key,
                    "size": object.size
                })),
            )
                .into_response(),
            Err(e) => error_response(e),
        };
    }

    error_response(DomainError::Validation("No file provided".to_string()))
}
