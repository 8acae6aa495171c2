use std::path::Path;

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig, StorageConfig};
use crate::policy::Principal;
use crate::repo::users;
use crate::routes;
use crate::state::AppState;
use crate::types::UploadedFileDto;

pub const BASE_URL: &str = "http://testserver/files/";
const BOUNDARY: &str = "mediashare-test-boundary";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    // Removed on drop
    pub media: TempDir,
}

pub struct TestUser {
    pub principal: Principal,
    pub token: String,
}

pub fn test_config(media_root: &Path) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            debug: false,
            allowed_hosts: vec!["*".to_string()],
            utc_offset_minutes: 0,
        },
        database: DatabaseConfig { url: "sqlite::memory:".to_string() },
        storage: StorageConfig {
            media_root: media_root.display().to_string(),
            media_url: "/media/".to_string(),
            upload_dir: "uploads".to_string(),
            base_download_url: BASE_URL.to_string(),
            max_upload_bytes: 1024 * 1024,
        },
        auth: AuthConfig::default(),
        security: None,
    }
}

pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    crate::db::init_db(&pool).await.unwrap();
    pool
}

pub async fn setup_with_config(config_fn: impl FnOnce(&mut AppConfig)) -> TestApp {
    let media = TempDir::new().unwrap();
    let mut config = test_config(media.path());
    config_fn(&mut config);
    let state = AppState::new(test_pool().await, config);
    let app = routes::router(state.clone());
    TestApp { app, state, media }
}

pub async fn setup_test_app() -> TestApp {
    setup_with_config(|_| {}).await
}

pub async fn create_user(state: &AppState, username: &str, is_superuser: bool) -> TestUser {
    let (user, token) = users::create_user(&state.db, username, is_superuser).await.unwrap();
    TestUser { principal: user.into(), token }
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn multipart_request(method: &str, uri: &str, token: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Uploads through the admin API and returns the created record.
pub async fn upload(t: &TestApp, token: &str, filename: &str, data: &[u8], is_public: bool) -> UploadedFileDto {
    let flag = if is_public { "true" } else { "false" };
    let req = multipart_request(
        "POST",
        "/admin/files",
        token,
        &[Part::Text("author", "John Doe"), Part::Text("is_public", flag), Part::File("file", filename, data)],
    );
    let response = send(&t.app, req).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
