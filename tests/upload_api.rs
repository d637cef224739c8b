use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;
use upload_pipeline::{
    app,
    services::{UploadService, UploadServiceConfig},
    state::{AppState, UploadLimits},
    storage::{
        CloudCredentials, CloudProvider, CloudStorage, CloudStorageConfig, LocalStorage,
        SharedStorage,
    },
};

const BOUNDARY: &str = "X-UPLOAD-BOUNDARY";

struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    content_type: Option<&'a str>,
    data: &'a [u8],
}

fn file_part<'a>(name: &'a str, filename: &'a str, content_type: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        name,
        filename: Some(filename),
        content_type: Some(content_type),
        data,
    }
}

fn options_part(json: &str) -> Part<'_> {
    Part {
        name: "options",
        filename: None,
        content_type: None,
        data: json.as_bytes(),
    }
}

fn multipart(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = part.filename {
            disposition.push_str(&format!("; filename=\"{filename}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn router_with(storage: SharedStorage) -> Router {
    let uploads = UploadService::new(storage, UploadServiceConfig::default());
    app(AppState::new(uploads, UploadLimits::default(), "test"))
}

fn local_router() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let storage: SharedStorage = Arc::new(LocalStorage::new(
        dir.path(),
        Some("http://localhost:3000/api/uploads".into()),
    ));
    (dir, router_with(storage))
}

async fn send(router: &Router, req: Request<Body>) -> Response {
    router.clone().oneshot(req).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn single_upload_then_fetch_inspect_and_delete() {
    let (_dir, router) = local_router();

    let response = send(
        &router,
        multipart(
            "/api/uploads/single",
            &[file_part("file", "a.png", "image/png", b"hello")],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["size"], json!(5));
    assert_eq!(body["data"]["mimeType"], json!("image/png"));
    assert_eq!(body["data"]["originalName"], json!("a.png"));

    let filename = body["data"]["filename"].as_str().unwrap().to_string();
    assert_eq!(
        body["data"]["url"],
        json!(format!("http://localhost:3000/api/uploads/{filename}"))
    );

    let response = send(&router, request("GET", &format!("/api/uploads/{filename}"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"hello");

    let response = send(
        &router,
        request("GET", &format!("/api/uploads/{filename}/metadata")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let meta = json_body(response).await;
    assert_eq!(meta["data"]["filename"], json!(filename));
    assert_eq!(meta["data"]["size"], json!(5));

    let response = send(&router, request("DELETE", &format!("/api/uploads/{filename}"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&router, request("DELETE", &format!("/api/uploads/{filename}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&router, request("GET", &format!("/api/uploads/{filename}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejected_single_upload_is_a_bad_request() {
    let (_dir, router) = local_router();

    let response = send(
        &router,
        multipart(
            "/api/uploads/single",
            &[file_part("file", "run.exe", "application/x-msdownload", b"MZ")],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn missing_file_part_is_a_bad_request() {
    let (_dir, router) = local_router();
    let response = send(
        &router,
        multipart("/api/uploads/single", &[options_part("{}")]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn options_part_selects_generic_category() {
    let (_dir, router) = local_router();

    let response = send(
        &router,
        multipart(
            "/api/uploads/single",
            &[
                options_part(r#"{"category":"generic","metadata":{"owner":"ops"}}"#),
                file_part("file", "report.pdf", "application/pdf", b"%PDF-1.7"),
            ],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["metadata"]["owner"], json!("ops"));
    assert_eq!(body["data"]["metadata"]["processed"], json!(false));
}

#[tokio::test]
async fn malformed_options_are_rejected() {
    let (_dir, router) = local_router();
    let response = send(
        &router,
        multipart(
            "/api/uploads/single",
            &[
                options_part("{not json"),
                file_part("file", "a.png", "image/png", b"hello"),
            ],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_upload_reports_partial_failure() {
    let (_dir, router) = local_router();

    let response = send(
        &router,
        multipart(
            "/api/uploads/multiple",
            &[
                file_part("files", "one.png", "image/png", b"1"),
                file_part("files", "two.txt", "text/plain", b"2"),
                file_part("files", "three.gif", "image/gif", b"3"),
            ],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"]["uploaded"], json!(2));
    assert_eq!(body["data"]["failed"], json!(1));
    assert_eq!(body["data"]["errors"][0]["originalName"], json!("two.txt"));
    assert_eq!(body["data"]["files"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn batch_over_file_limit_is_rejected() {
    let (_dir, router) = local_router();
    let parts: Vec<Part<'_>> = (0..11)
        .map(|_| file_part("files", "x.png", "image/png", b"x"))
        .collect();

    let response = send(&router, multipart("/api/uploads/multiple", &parts)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_readiness() {
    let (_dir, router) = local_router();

    let response = send(&router, request("GET", "/api/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["environment"], json!("test"));

    let response = send(&router, request("GET", "/api/ready")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn cloud_backend_without_integration_is_not_ready() {
    let storage: SharedStorage = Arc::new(CloudStorage::new(CloudStorageConfig {
        provider: CloudProvider::Aws,
        bucket: "media".into(),
        region: None,
        credentials: CloudCredentials::default(),
        base_url: None,
    }));
    let router = router_with(storage);

    let response = send(&router, request("GET", "/api/ready")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = send(
        &router,
        multipart(
            "/api/uploads/single",
            &[file_part("file", "a.png", "image/png", b"hello")],
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0], json!("cloud storage for aws not yet implemented"));
}

#[tokio::test]
async fn oversized_file_reports_the_size_violation() {
    let (_dir, router) = local_router();
    let oversized = vec![0u8; 11 * 1024 * 1024];

    let response = send(
        &router,
        multipart(
            "/api/uploads/single",
            &[file_part("file", "big.png", "image/png", &oversized)],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    let message = errors[0].as_str().unwrap();
    assert!(message.contains("11534336"), "{message}");
    assert!(message.contains("10485760"), "{message}");
}

#[tokio::test]
async fn original_names_with_dot_runs_are_stored() {
    let (_dir, router) = local_router();

    let response = send(
        &router,
        multipart(
            "/api/uploads/single",
            &[
                options_part(r#"{"naming":"withOriginal"}"#),
                file_part("file", "my..photo.png", "image/png", b"hello"),
            ],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    let filename = body["data"]["filename"].as_str().unwrap();
    assert!(filename.ends_with("-my.photo.png"), "{filename}");
}

#[tokio::test]
async fn dotfile_with_image_extension_is_accepted() {
    let (_dir, router) = local_router();

    let response = send(
        &router,
        multipart(
            "/api/uploads/single",
            &[file_part("file", ".png", "image/png", b"hello")],
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
}
