//! Shared setup for router tests.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use modelfetch_axum::bootstrap::{CorsConfig, ServerConfig, bootstrap};
use modelfetch_axum::routes::create_router;
use modelfetch_core::{DownloadManagerConfig, FolderMap};

/// Router over a fresh models directory.
pub struct TestApp {
    pub router: Router,
    pub models: TempDir,
}

pub fn test_app() -> TestApp {
    let models = TempDir::new().unwrap();
    let config = ServerConfig::new(FolderMap::new(models.path())).with_downloads(
        DownloadManagerConfig::default()
            .with_retention(Duration::from_millis(300))
            .with_progress_interval(Duration::from_millis(10)),
    );
    let ctx = bootstrap(&config).unwrap();
    TestApp {
        router: create_router(ctx, &CorsConfig::AllowAll),
        models,
    }
}

/// Send a request and decode the JSON answer.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", content_type)
        .body(body.into())
        .unwrap()
}

/// Poll the progress route until the download reaches a terminal state.
pub async fn wait_for_terminal(router: &Router, id: &str) -> serde_json::Value {
    for _ in 0..200 {
        let (status, json) = send(router, get(&format!("/api/download-progress/{id}"))).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        let state = json["download"]["status"].as_str().unwrap().to_string();
        if state == "completed" || state == "failed" {
            return json["download"].clone();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("download {id} did not finish");
}
