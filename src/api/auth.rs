use crate::infrastructure::auth::{
    Claims, ROLE_ADMIN, ROLE_USER, create_jwt, hash_password, verify_password,
};
use crate::models::user;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct CredentialsRequest {
    username: String,
    password: String,
}

fn unauthorized() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "error": "Invalid credentials" })),
    )
        .into_response()
}

fn internal(e: impl std::fmt::Display) -> axum::response::Response {
    tracing::error!("Auth error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": e.to_string() })),
    )
        .into_response()
}

/// Create an account. The very first account becomes the admin.
pub async fn register(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<CredentialsRequest>,
) -> impl IntoResponse {
    let username = payload.username.trim().to_string();
    if username.is_empty() || payload.password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "username and password are required" })),
        )
            .into_response();
    }

    match user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(&db)
        .await
    {
        Ok(Some(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": "Username already taken" })),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => return internal(e),
    }

    let role = match user::Entity::find().count(&db).await {
        Ok(0) => ROLE_ADMIN,
        Ok(_) => ROLE_USER,
        Err(e) => return internal(e),
    };

    let password_hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(e) => return internal(e),
    };

    let now = chrono::Utc::now().to_rfc3339();
    let model = user::ActiveModel {
        username: Set(username),
        password_hash: Set(password_hash),
        role: Set(role.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = match model.insert(&db).await {
        Ok(created) => created,
        Err(e) => return internal(e),
    };

    tracing::info!("Registered user {} ({})", created.username, created.role);

    match create_jwt(created.id, &created.username, &created.role) {
        Ok(token) => (
            StatusCode::CREATED,
            Json(json!({ "success": true, "token": token, "user": created })),
        )
            .into_response(),
        Err(e) => internal(e),
    }
}

pub async fn login(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<CredentialsRequest>,
) -> impl IntoResponse {
    tracing::info!("Login attempt for user: {}", payload.username);

    let user = match user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.trim()))
        .one(&db)
        .await
    {
        Ok(Some(u)) => u,
        Ok(None) => {
            tracing::warn!("User not found: {}", payload.username);
            return unauthorized();
        }
        Err(e) => return internal(e),
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => match create_jwt(user.id, &user.username, &user.role) {
            Ok(token) => (StatusCode::OK, Json(json!({ "success": true, "token": token })))
                .into_response(),
            Err(e) => internal(e),
        },
        _ => {
            tracing::warn!("Password verification failed for user: {}", user.username);
            unauthorized()
        }
    }
}

pub async fn me(claims: Claims, State(db): State<DatabaseConnection>) -> impl IntoResponse {
    match user::Entity::find_by_id(claims.uid).one(&db).await {
        Ok(Some(user)) => (StatusCode::OK, Json(json!({ "success": true, "user": user })))
            .into_response(),
        Ok(None) => crate::api::not_found("User"),
        Err(e) => internal(e),
    }
}
