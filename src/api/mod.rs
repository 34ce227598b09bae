pub mod acquisitions;
pub mod auth;
pub mod bulk;
pub mod figures;
pub mod health;
pub mod images;
pub mod master;
pub mod storage;
pub mod timeline;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::json;

use crate::domain::DomainError;
use crate::infrastructure::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Catalog
        .route(
            "/figures",
            get(figures::list_figures).post(figures::register_figure),
        )
        .route(
            "/figures/:id",
            get(figures::get_figure)
                .patch(figures::update_figure)
                .delete(figures::delete_figure),
        )
        .route(
            "/figures/:id/images",
            get(images::list_images).post(images::add_image),
        )
        .route(
            "/figures/:id/images/:image_id",
            axum::routing::delete(images::delete_image),
        )
        .route(
            "/figures/:id/images/:image_id/thumbnail",
            put(images::set_thumbnail),
        )
        .route("/figures/:id/image-order", put(images::reorder_images))
        // Object storage
        .route("/storage/:bucket", post(storage::upload))
        // Master data
        .route("/master/:kind", get(master::search).post(master::create))
        .route("/master/:kind/:id", put(master::rename))
        // Bulk registration
        .route("/bulk/validate", post(bulk::validate))
        .route("/bulk/register", post(bulk::register))
        // Acquisitions
        .route(
            "/acquisitions",
            get(acquisitions::list_acquisitions).post(acquisitions::create_acquisition),
        )
        .route(
            "/acquisitions/:id",
            get(acquisitions::get_acquisition)
                .patch(acquisitions::update_acquisition)
                .delete(acquisitions::delete_acquisition),
        )
        .route(
            "/acquisitions/:id/milestones/:milestone",
            post(acquisitions::toggle_milestone),
        )
        .route("/acquisitions/:id/amounts", put(acquisitions::edit_amount))
        // Timeline
        .route("/timeline", get(timeline::get_timeline))
        .route("/timeline/years", get(timeline::get_years))
        .with_state(state)
}

/// Map a domain error to `{"success": false, "error": ...}` with its status.
pub fn error_response(err: DomainError) -> Response {
    let status = match &err {
        DomainError::NotFound => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Database(_) | DomainError::Storage(_) | DomainError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        tracing::error!("API Error: {}", err);
    } else {
        tracing::warn!("API Error: {}", err);
    }

    let message = match err {
        DomainError::Validation(msg) => msg,
        other => other.to_string(),
    };
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

pub(crate) fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": format!("{} not found", what) })),
    )
        .into_response()
}
