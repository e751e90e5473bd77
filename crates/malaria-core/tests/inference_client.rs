//! Integration tests for the inference client against an in-process server
//! that mimics the inference service.

use std::path::PathBuf;

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use malaria_core::{
    AnalysisHistory, Analyzer, Error, InferenceClient, InferenceError, malaria_store::Store,
    malaria_types::Diagnosis,
};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Behaves like the real service: reads field `image`, rejects non-images
/// and empty files with a 200 `{"error": ...}`, and classifies by name.
async fn analyze(mut multipart: Multipart) -> Json<Value> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("image") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.unwrap_or_default();

        if !content_type.starts_with("image/") {
            return Json(json!({"error": "File is not an image"}));
        }
        if data.is_empty() {
            return Json(json!({"error": "Empty image file"}));
        }

        let (diagnosis, confidence) = if file_name.contains("para") {
            ("parasitized", 0.97)
        } else {
            ("uninfected", 0.03)
        };
        return Json(json!({
            "diagnosis": diagnosis,
            "confidence": confidence,
            "processing_time": 0.12,
            "model_used": "EfficientNet-B0"
        }));
    }

    Json(json!({"error": "No image field"}))
}

fn service(model_loaded: bool) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route(
            "/health",
            get(move || async move {
                let status = if model_loaded {
                    "healthy"
                } else {
                    "model_not_loaded"
                };
                Json(json!({
                    "status": status,
                    "service": "malaria-ml-api",
                    "device": "cpu",
                    "model_loaded": model_loaded
                }))
            }),
        )
        .route(
            "/model-info",
            get(move || async move {
                if model_loaded {
                    Json(json!({
                        "model_name": "EfficientNet-B0",
                        "total_parameters": 4010110,
                        "input_size": 224,
                        "device": "cpu"
                    }))
                } else {
                    Json(json!({"error": "Model not loaded"}))
                }
            }),
        )
}

fn write_image(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[tokio::test]
async fn test_health_ready() {
    let url = spawn(service(true)).await;
    let client = InferenceClient::new(&url).unwrap();

    let health = client.health().await.unwrap();
    assert_eq!(health.service, "malaria-ml-api");
    assert!(health.is_ready());
    assert!(client.is_ready().await);
    assert!(client.is_reachable().await);
}

#[tokio::test]
async fn test_health_without_model() {
    let url = spawn(service(false)).await;
    let client = InferenceClient::new(&url).unwrap();

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "model_not_loaded");
    assert!(!health.is_ready());
    assert!(!client.is_ready().await);
    assert!(client.is_reachable().await);
}

#[tokio::test]
async fn test_model_info() {
    let url = spawn(service(true)).await;
    let client = InferenceClient::new(&url).unwrap();

    let info = client.model_info().await.unwrap();
    assert_eq!(info.model_name, "EfficientNet-B0");
    assert_eq!(info.input_size, 224);
    assert_eq!(info.total_parameters, 4_010_110);
}

#[tokio::test]
async fn test_model_info_error_body() {
    let url = spawn(service(false)).await;
    let client = InferenceClient::new(&url).unwrap();

    let err = client.model_info().await.unwrap_err();
    assert!(matches!(
        err,
        InferenceError::ApiError { status: 200, ref message } if message == "Model not loaded"
    ));
}

#[tokio::test]
async fn test_analyze_uploads_image_field() {
    let url = spawn(service(true)).await;
    let client = InferenceClient::new(&url).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let parasitized = write_image(&dir, "para_01.png", b"\x89PNG....");
    let prediction = client
        .analyze(&parasitized)
        .await
        .unwrap()
        .into_prediction();
    assert_eq!(prediction.diagnosis, Diagnosis::Parasitized);
    assert_eq!(prediction.confidence, 0.97);
    assert_eq!(prediction.processing_time, 0.12);

    let uninfected = write_image(&dir, "cell_02.jpeg", b"\xff\xd8\xff....");
    let prediction = client
        .analyze(&uninfected)
        .await
        .unwrap()
        .into_prediction();
    assert_eq!(prediction.diagnosis, Diagnosis::Uninfected);
}

#[tokio::test]
async fn test_analyze_error_body_with_success_status() {
    let url = spawn(service(true)).await;
    let client = InferenceClient::new(&url).unwrap();
    let dir = tempfile::tempdir().unwrap();

    // Unknown extensions are sent as application/octet-stream
    let path = write_image(&dir, "notes.txt", b"hello");
    let response = client.analyze(&path).await.unwrap();
    assert_eq!(response.error.as_deref(), Some("File is not an image"));

    let prediction = response.into_prediction();
    assert_eq!(prediction.diagnosis, Diagnosis::Error);
    assert!(!prediction.is_successful());
}

#[tokio::test]
async fn test_analyze_missing_file() {
    let url = spawn(service(true)).await;
    let client = InferenceClient::new(&url).unwrap();

    let err = client
        .analyze("/no/such/image.png".as_ref())
        .await
        .unwrap_err();
    assert!(matches!(err, InferenceError::Io { .. }));
}

#[tokio::test]
async fn test_server_error_uses_detail() {
    let app = Router::new().route(
        "/health",
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "CUDA out of memory"})),
            )
        }),
    );
    let url = spawn(app).await;
    let client = InferenceClient::new(&url).unwrap();

    let err = client.health().await.unwrap_err();
    assert!(matches!(
        err,
        InferenceError::ApiError { status: 500, ref message } if message == "CUDA out of memory"
    ));
}

#[tokio::test]
async fn test_missing_route_reports_status() {
    let url = spawn(Router::new()).await;
    let client = InferenceClient::new(&url).unwrap();

    let err = client.health().await.unwrap_err();
    assert!(matches!(err, InferenceError::ApiError { status: 404, .. }));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let app = Router::new().route("/health", get(|| async { "definitely not json" }));
    let url = spawn(app).await;
    let client = InferenceClient::new(&url).unwrap();

    let err = client.health().await.unwrap_err();
    assert!(matches!(err, InferenceError::Decode { .. }));
}

#[tokio::test]
async fn test_unreachable_service() {
    // Bind and immediately release a port so nothing is listening on it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = InferenceClient::new(&format!("http://{}", addr)).unwrap();
    let err = client.health().await.unwrap_err();
    assert!(matches!(err, InferenceError::NotReachable { .. }));
    assert!(!client.is_reachable().await);
}

#[tokio::test]
async fn test_analyzer_end_to_end() {
    let url = spawn(service(true)).await;
    let client = InferenceClient::new(&url).unwrap();
    let history = AnalysisHistory::new(Store::open_in_memory().unwrap());
    let analyzer = Analyzer::new(client).with_history(history);
    let dir = tempfile::tempdir().unwrap();

    let first = analyzer
        .analyze(&write_image(&dir, "para_01.png", b"\x89PNG...."))
        .await;
    let second = analyzer
        .analyze(&write_image(&dir, "cell_02.png", b"\x89PNG...."))
        .await;

    assert_eq!(first.record_id, Some(1));
    assert_eq!(second.record_id, Some(2));

    let history = analyzer.history().unwrap();
    let all = history.all();
    assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1]);
    assert_eq!(all[1].diagnosis, Diagnosis::Parasitized);
    assert_eq!(all[1].file_name, "para_01.png");

    let uninfected = history.filter(Some(Diagnosis::Uninfected));
    assert_eq!(uninfected.len(), 1);
    assert_eq!(uninfected[0].id, 2);
}

#[tokio::test]
async fn test_analyzer_refuses_when_model_missing() {
    let url = spawn(service(false)).await;
    let client = InferenceClient::new(&url).unwrap();
    let analyzer = Analyzer::new(client)
        .with_history(AnalysisHistory::new(Store::open_in_memory().unwrap()));
    let dir = tempfile::tempdir().unwrap();
    let path = write_image(&dir, "para_01.png", b"\x89PNG....");

    let err = analyzer.classify(&path).await.unwrap_err();
    assert!(matches!(err, Error::ServiceNotReady { .. }));

    let outcome = analyzer.analyze(&path).await;
    assert_eq!(outcome.prediction.diagnosis, Diagnosis::Error);
    assert!(!outcome.is_saved());
}
