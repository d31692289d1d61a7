// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Upload server tests for POST /upload and the /static file route
//!
//! The ONNX models are replaced by stub pipelines, so these tests exercise
//! multipart handling, storage, rendering and the JSON contract.

use axum::http::{header, StatusCode};
use plate_vision::api::create_upload_router;
use plate_vision::vision::decode_image_bytes;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use super::common::*;

const BODY_LIMIT: usize = 16 * 1024 * 1024;

#[tokio::test]
async fn test_upload_page_served() {
    let dir = TempDir::new().unwrap();
    let app = create_upload_router(stub_state(vec![], dir.path()), BODY_LIMIT);

    let response = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("name=\"file\""));
    assert!(html.contains("/upload"));
}

#[tokio::test]
async fn test_upload_success() {
    let dir = TempDir::new().unwrap();
    let app = create_upload_router(
        stub_state(vec![blue_plate(), yellow_double_plate()], dir.path()),
        BODY_LIMIT,
    );

    let body = multipart_body("file", "car.png", &png_bytes(200, 120));
    let response = app.oneshot(multipart_request("/upload", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);

    let plates = json["plates"].as_array().unwrap();
    assert_eq!(plates.len(), 2);
    assert_eq!(plates[0]["plate_no"], "京A12345");
    assert_eq!(plates[0]["color"], "蓝色");
    assert_eq!(plates[0]["plate_type"], "单层");
    assert_eq!(plates[0]["bbox"], serde_json::json!([40, 60, 160, 100]));
    assert!((plates[0]["confidence"].as_f64().unwrap() - 0.91).abs() < 1e-6);
    assert_eq!(plates[1]["color"], "黄色");
    assert_eq!(plates[1]["plate_type"], "双层");

    let original = json["original_image"].as_str().unwrap();
    assert!(original.starts_with("/static/uploads/"));
    assert!(original.ends_with("_car.png"));

    let result = json["result_image"].as_str().unwrap();
    assert!(result.starts_with("/static/results/result_"));
    assert!(result.ends_with(".jpg"));

    // Both files exist on disk and the result is a same-size JPEG
    let original_path = dir.path().join(original.trim_start_matches("/static/"));
    let result_path = dir.path().join(result.trim_start_matches("/static/"));
    assert!(original_path.exists());
    let (img, _) = decode_image_bytes(&std::fs::read(result_path).unwrap()).unwrap();
    assert_eq!((img.width(), img.height()), (200, 120));
}

#[tokio::test]
async fn test_upload_no_plates() {
    let dir = TempDir::new().unwrap();
    let app = create_upload_router(stub_state(vec![], dir.path()), BODY_LIMIT);

    let body = multipart_body("file", "empty.jpg", &png_bytes(32, 32));
    let response = app.oneshot(multipart_request("/upload", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert!(json["plates"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_missing_file_field() {
    let dir = TempDir::new().unwrap();
    let app = create_upload_router(stub_state(vec![], dir.path()), BODY_LIMIT);

    let body = multipart_body("other", "car.png", &png_bytes(8, 8));
    let response = app.oneshot(multipart_request("/upload", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "没有文件被上传");
}

#[tokio::test]
async fn test_upload_empty_filename() {
    let dir = TempDir::new().unwrap();
    let app = create_upload_router(stub_state(vec![], dir.path()), BODY_LIMIT);

    let body = multipart_body("file", "", &png_bytes(8, 8));
    let response = app.oneshot(multipart_request("/upload", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "没有选择文件");
}

#[tokio::test]
async fn test_upload_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let app = create_upload_router(stub_state(vec![], dir.path()), BODY_LIMIT);

    let body = multipart_body("file", "car.tiff", &png_bytes(8, 8));
    let response = app.oneshot(multipart_request("/upload", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "不支持的文件格式");
    assert_eq!(json["error_type"], "unsupported_format");

    // Nothing was stored
    let stored = std::fs::read_dir(dir.path().join("uploads")).unwrap().count();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn test_upload_undecodable_image() {
    let dir = TempDir::new().unwrap();
    let app = create_upload_router(stub_state(vec![], dir.path()), BODY_LIMIT);

    let body = multipart_body("file", "car.jpg", b"definitely not a jpeg");
    let response = app.oneshot(multipart_request("/upload", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_type"], "invalid_image");
}

#[tokio::test]
async fn test_upload_pipeline_failure() {
    let dir = TempDir::new().unwrap();
    let app = create_upload_router(state_with(Arc::new(FailingPipeline), dir.path()), BODY_LIMIT);

    let body = multipart_body("file", "car.png", &png_bytes(16, 16));
    let response = app.oneshot(multipart_request("/upload", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    let message = json["error"].as_str().unwrap();
    assert!(message.starts_with("处理失败: "));
    assert!(message.contains("no outputs"));
}

#[tokio::test]
async fn test_upload_body_limit() {
    let dir = TempDir::new().unwrap();
    let app = create_upload_router(stub_state(vec![], dir.path()), 1024);

    let body = multipart_body("file", "big.png", &vec![0u8; 8 * 1024]);
    let response = app.oneshot(multipart_request("/upload", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_static_files_not_cached() {
    let dir = TempDir::new().unwrap();
    let app = create_upload_router(stub_state(vec![blue_plate()], dir.path()), BODY_LIMIT);

    let body = multipart_body("file", "car.png", &png_bytes(200, 120));
    let response = app
        .clone()
        .oneshot(multipart_request("/upload", body))
        .await
        .unwrap();
    let json = body_json(response).await;
    let result_url = json["result_image"].as_str().unwrap().to_string();

    let response = app.oneshot(get_request(&result_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
}

#[tokio::test]
async fn test_static_missing_file() {
    let dir = TempDir::new().unwrap();
    let app = create_upload_router(stub_state(vec![], dir.path()), BODY_LIMIT);

    let response = app
        .oneshot(get_request("/static/results/missing.jpg"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let app = create_upload_router(stub_state(vec![], dir.path()), BODY_LIMIT);

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["build"]["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["font"], "embedded font");
}
