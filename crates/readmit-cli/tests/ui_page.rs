//! The form UI against live inference APIs on ephemeral ports.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceExt;

use readmit_classifiers::artifacts::ArtifactPaths;
use readmit_classifiers::inference::InferenceService;
use readmit_cli::serve;
use readmit_cli::ui::client::PredictClient;
use readmit_cli::ui::{create_router, UiState};

/// Serve the inference API in the background and return its base URL.
async fn spawn_api(service: InferenceService) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = serve::create_router(Arc::new(service));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn ui_router(api_url: &str) -> Router {
    let client = PredictClient::new(api_url, Duration::from_secs(5)).unwrap();
    create_router(Arc::new(UiState { client }))
}

async fn submit(router: Router, form: &'static str) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_index_shows_default_form() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = ui_router("http://127.0.0.1:9")
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Patient Readmission Predictor"));
    assert!(html.contains(r#"value="45""#));
    assert!(html.contains(r#"value="25.0""#));
    assert!(!html.contains("Readmission risk score"));
}

#[tokio::test]
async fn test_unreachable_service_is_reported_on_page() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let html = submit(
        ui_router(&format!("http://{}", addr)),
        "age=45&bmi=25.0&num_prior_admissions=0",
    )
    .await;
    assert!(html.contains("Could not reach the prediction service"));
}

#[tokio::test]
async fn test_service_without_models_is_reported_on_page() {
    let api_url = spawn_api(InferenceService::not_loaded("no artifacts")).await;
    let html = submit(ui_router(&api_url), "age=45&bmi=25.0&num_prior_admissions=0").await;
    assert!(html.contains("HTTP 503"));
    assert!(html.contains("Models not loaded"));
}

#[tokio::test]
async fn test_out_of_range_age_never_reaches_service() {
    let html = submit(
        ui_router("http://127.0.0.1:9"),
        "age=150&bmi=25.0&num_prior_admissions=0",
    )
    .await;
    assert!(html.contains("between 0 and 120"));
    assert!(html.contains(r#"value="150""#));
}

#[tokio::test]
async fn test_score_is_displayed_with_band() {
    let dir = tempfile::tempdir().unwrap();
    let artifact_dir = common::train_artifacts(dir.path());

    let service = InferenceService::load(&ArtifactPaths::in_dir(&artifact_dir));
    let api_url = spawn_api(service).await;
    let html = submit(ui_router(&api_url), "age=45&bmi=25.0&num_prior_admissions=0").await;
    assert!(html.contains("Readmission risk score"));
    assert!(html.contains("risk)"));
}
