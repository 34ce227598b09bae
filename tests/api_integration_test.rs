use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use figurelog::api;
use figurelog::auth;
use figurelog::config::Config;
use figurelog::db;
use figurelog::infrastructure::AppState;
use figurelog::server;
use figurelog::storage::ObjectStorage;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

// Helper to create a test app state backed by in-memory SQLite and a temp store
async fn setup_test_state() -> (AppState, TempDir) {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = ObjectStorage::new(dir.path(), "http://localhost:8000");
    (AppState::new(db, storage), dir)
}

// Helper to create a user and a valid token for it
async fn create_test_user(db: &DatabaseConnection, username: &str) -> String {
    let now = chrono::Utc::now().to_rfc3339();
    let user = figurelog::models::user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set("hash".to_string()),
        role: Set("user".to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let res = user.insert(db).await.expect("Failed to create user");
    auth::create_jwt(res.id, &res.username, &res.role).expect("Failed to create token")
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn api_app(state: AppState) -> Router {
    Router::new().nest("/api", api::api_router(state))
}

fn rem_payload() -> Value {
    json!({
        "name": "Rem 1/7 Wedding Ver.",
        "name_ja": "レム 1/7 ウェディングVer.",
        "manufacturer": "Good Smile Company",
        "series": "Re:Zero",
        "character": "Rem",
        "category": "Scale Figure",
        "scale": "1/7",
        "release_date": "2024-08-31",
        "release_precision": "month",
        "price_jpy": 24800,
        "images": [
            {"url": "http://localhost:8000/storage/figures/front.png"},
            {"url": "http://localhost:8000/storage/figures/side.png"}
        ]
    })
}

#[tokio::test]
async fn test_register_figure_creates_master_data() {
    let (state, _dir) = setup_test_state().await;
    let token = create_test_user(state.db(), "admin").await;
    let app = api_app(state);

    let (status, body) = send(&app, "POST", "/api/figures", Some(&token), Some(rem_payload())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    let figure = &body["figure"];
    let figure_id = figure["id"].as_i64().unwrap();
    let series_id = figure["series"]["id"].as_i64().unwrap();
    assert_eq!(figure["character"]["parent_id"], series_id);
    assert_eq!(figure["release_precision"], "month");
    assert_eq!(
        figure["thumbnail_url"],
        "http://localhost:8000/storage/figures/front.png"
    );
    assert_eq!(figure["images"][1]["sort_order"], 1);

    // Characters cascade under their series
    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/master/character?parent_id={}", series_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"][0]["name"], "Rem");

    // Typeahead by prefix
    let (_, body) = send(&app, "GET", "/api/master/manufacturer?q=Good", None, None).await;
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);

    // The catalog search finds it by its Japanese name
    let (_, body) = send(&app, "GET", "/api/figures?q=%E3%83%AC%E3%83%A0", None, None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["figures"][0]["id"], figure_id);

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/figures/{}", figure_id),
        Some(&token),
        Some(json!({ "price_jpy": 26000, "description": "Reissue" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["figure"]["price_jpy"], 26000);
    assert_eq!(body["figure"]["name"], "Rem 1/7 Wedding Ver.");
}

#[tokio::test]
async fn test_image_management() {
    let (state, _dir) = setup_test_state().await;
    let token = create_test_user(state.db(), "admin").await;
    let app = api_app(state);

    let (_, body) = send(&app, "POST", "/api/figures", Some(&token), Some(rem_payload())).await;
    let figure_id = body["figure"]["id"].as_i64().unwrap();
    let base = format!("/api/figures/{}", figure_id);

    let (status, body) = send(
        &app,
        "POST",
        &format!("{}/images", base),
        Some(&token),
        Some(json!({ "url": "http://localhost:8000/storage/figures/back.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["image"]["sort_order"], 2);
    assert_eq!(body["image"]["is_thumbnail"], false);
    let back_id = body["image"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("{}/images/{}/thumbnail", base, back_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let thumbnails: Vec<i64> = body["images"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|img| img["is_thumbnail"] == true)
        .map(|img| img["id"].as_i64().unwrap())
        .collect();
    assert_eq!(thumbnails, vec![back_id]);

    let mut ids: Vec<i64> = body["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|img| img["id"].as_i64().unwrap())
        .collect();
    ids.reverse();
    let (status, body) = send(
        &app,
        "PUT",
        &format!("{}/image-order", base),
        Some(&token),
        Some(json!({ "image_ids": ids })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["images"][0]["id"], back_id);

    // Deleting the thumbnail promotes another image
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("{}/images/{}", base, back_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, "GET", &format!("{}/images", base), None, None).await;
    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(
        images.iter().filter(|img| img["is_thumbnail"] == true).count(),
        1
    );
}

#[tokio::test]
async fn test_acquisition_lifecycle_and_timeline() {
    let (state, _dir) = setup_test_state().await;
    let token = create_test_user(state.db(), "collector").await;
    let app = api_app(state);

    let (_, body) = send(&app, "POST", "/api/figures", Some(&token), Some(rem_payload())).await;
    let figure_id = body["figure"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/acquisitions",
        Some(&token),
        Some(json!({
            "figure_id": figure_id,
            "total_price": 100000,
            "deposit_price": 20000,
            "deposit_paid_at": "2024-03-10"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let acquisition = &body["acquisition"];
    let id = acquisition["id"].as_i64().unwrap();
    assert_eq!(acquisition["status"], "reserved");
    assert_eq!(acquisition["status_label"], "예약");
    assert_eq!(acquisition["remaining_amount"], 80000);
    assert_eq!(acquisition["deposit_percentage"], 20);
    assert_eq!(acquisition["figure"]["name"], "Rem 1/7 Wedding Ver.");

    // Payment timeline: March 2024
    let (status, body) = send(&app, "GET", "/api/timeline?year=2024", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let months = body["timeline"]["months"].as_array().unwrap();
    assert_eq!(months.len(), 12);
    assert_eq!(months[2]["entries"].as_array().unwrap().len(), 1);
    assert_eq!(months[2]["summary"]["remaining_total"], 80000);

    // Release timeline: August 2024
    let (_, body) = send(
        &app,
        "GET",
        "/api/timeline?year=2024&field=release",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["timeline"]["months"][7]["summary"]["count"], 1);

    // Paying the balance stamps paid_at as well
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/acquisitions/{}/milestones/balance_paid", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["acquisition"]["balance_paid_at"].is_string());
    assert_eq!(
        body["acquisition"]["balance_paid_at"],
        body["acquisition"]["paid_at"]
    );

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/acquisitions/{}/milestones/delivered", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["acquisition"]["status"], "owned");
    assert_eq!(body["acquisition"]["status_color"], "emerald");

    // Editing the balance recomputes the total, the deposit stays
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/acquisitions/{}/amounts", id),
        Some(&token),
        Some(json!({ "balance": 50000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["acquisition"]["total_price"], 70000);
    assert_eq!(body["acquisition"]["deposit_price"], 20000);

    let (_, body) = send(
        &app,
        "GET",
        "/api/timeline?year=2024&exclude_owned=true",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["timeline"]["summary"]["count"], 0);

    let (_, body) = send(&app, "GET", "/api/timeline/years", Some(&token), None).await;
    assert_eq!(body["years"], json!([2024]));
}

#[tokio::test]
async fn test_patched_milestones_apply_side_effects() {
    let (state, _dir) = setup_test_state().await;
    let token = create_test_user(state.db(), "collector").await;
    let app = api_app(state);

    let (_, body) = send(&app, "POST", "/api/figures", Some(&token), Some(rem_payload())).await;
    let figure_id = body["figure"]["id"].as_i64().unwrap();
    let (_, body) = send(
        &app,
        "POST",
        "/api/acquisitions",
        Some(&token),
        Some(json!({ "figure_id": figure_id, "total_price": 100000, "deposit_price": 20000 })),
    )
    .await;
    let id = body["acquisition"]["id"].as_i64().unwrap();
    let uri = format!("/api/acquisitions/{}", id);

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&token),
        Some(json!({ "balance_paid_at": "2024-06-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["acquisition"]["paid_at"], "2024-06-10");
    assert_eq!(body["acquisition"]["status"], "reserved");

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(&token),
        Some(json!({ "delivered_at": "2024-09-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["acquisition"]["status"], "owned");

    // Persisted, not just echoed
    let (_, body) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(body["acquisition"]["status"], "owned");
    assert_eq!(body["acquisition"]["delivered_at"], "2024-09-01");
    assert_eq!(body["acquisition"]["paid_at"], "2024-06-10");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("{}/amounts", uri),
        Some(&token),
        Some(json!({ "balance": i64::MAX })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "balance too large");
}

#[tokio::test]
async fn test_master_rename_requires_admin() {
    let (state, _dir) = setup_test_state().await;
    let user = create_test_user(state.db(), "collector").await;
    let admin = auth::create_jwt(99, "curator", auth::ROLE_ADMIN).expect("Failed to create token");
    let app = api_app(state);

    let (status, body) = send(
        &app,
        "POST",
        "/api/master/shop",
        Some(&user),
        Some(json!({ "name": "Amiami" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/master/shop/{}", body["entry"]["id"]);

    let (status, body) = send(&app, "PUT", &uri, Some(&user), Some(json!({ "name": "AmiAmi" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, "PUT", &uri, Some(&admin), Some(json!({ "name": "AmiAmi" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entry"]["name"], "AmiAmi");
}

#[tokio::test]
async fn test_acquisitions_are_scoped_to_their_owner() {
    let (state, _dir) = setup_test_state().await;
    let alice = create_test_user(state.db(), "alice").await;
    let bob = create_test_user(state.db(), "bob").await;
    let app = api_app(state);

    let (_, body) = send(&app, "POST", "/api/figures", Some(&alice), Some(rem_payload())).await;
    let figure_id = body["figure"]["id"].as_i64().unwrap();

    let (_, body) = send(
        &app,
        "POST",
        "/api/acquisitions",
        Some(&alice),
        Some(json!({ "figure_id": figure_id, "total_price": 30000 })),
    )
    .await;
    let id = body["acquisition"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/acquisitions/{}", id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", "/api/acquisitions", Some(&bob), None).await;
    assert_eq!(body["total"], 0);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/acquisitions/{}", id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_bulk_validate_and_register() {
    let (state, _dir) = setup_test_state().await;
    let token = create_test_user(state.db(), "admin").await;
    let app = api_app(state);

    let text = "name,manufacturer,series,character,category,releaseDate,price,sculptors\n\
        Rem,GSC,Re:Zero,Rem,Scale,2024-01-10,22000,\"Kagen, Oda\"\n\
        Ram,GSC,Re:Zero,Ram,Scale,2024-02-10,0,\n";

    let (status, body) = send(
        &app,
        "POST",
        "/api/bulk/validate",
        None,
        Some(json!({ "format": "csv", "text": text })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["is_valid"], true);
    assert_eq!(body["report"]["records"][1]["status"], "유효함");

    let (status, body) = send(
        &app,
        "POST",
        "/api/bulk/register",
        Some(&token),
        Some(json!({ "format": "csv", "text": text })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "2 succeeded, 0 failed");

    let (_, body) = send(&app, "GET", "/api/figures", None, None).await;
    assert_eq!(body["total"], 2);
    let rem = body["figures"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == "Rem")
        .unwrap();
    assert_eq!(rem["sculptors"], json!(["Kagen", "Oda"]));
}

#[tokio::test]
async fn test_upload_is_served_from_storage() {
    let (state, _dir) = setup_test_state().await;
    let token = create_test_user(state.db(), "admin").await;
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        port: 8000,
        cors_allowed_origins: Vec::new(),
        profile: "test".to_string(),
        storage_dir: state.storage.root().clone(),
        public_base_url: "http://localhost:8000".to_string(),
        max_upload_bytes: 1024 * 1024,
        seed_demo: false,
    };
    let app = server::build_router(state, &config);

    let png: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    let mut body = Vec::new();
    body.extend_from_slice(
        b"--BOUNDARY\r\nContent-Disposition: form-data; name=\"file\"; filename=\"rem.png\"\r\nContent-Type: image/png\r\n\r\n",
    );
    body.extend_from_slice(png);
    body.extend_from_slice(b"\r\n--BOUNDARY--\r\n");

    let request = Request::builder()
        .method("POST")
        .uri("/api/storage/figures")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    let key = json["key"].as_str().unwrap().to_string();
    assert_eq!(
        json["url"],
        format!("http://localhost:8000/storage/figures/{}", key)
    );

    let request = Request::builder()
        .uri(format!("/storage/figures/{}", key))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let served = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&served[..], png);
}
