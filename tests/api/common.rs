// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared helpers: stub pipelines, multipart bodies and state setup
#![allow(dead_code)]

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, Response};
use plate_vision::api::AppState;
use plate_vision::render::{FontChain, TextOverlay};
use plate_vision::storage::UploadStore;
use plate_vision::vision::plate::{PlateColor, PlateLayout, PlatePipeline, PlateResult};
use plate_vision::vision::BgrFrame;
use serde_json::Value;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

pub const BOUNDARY: &str = "----plate-vision-test-boundary";

/// Returns a fixed set of plates regardless of input
pub struct StubPipeline {
    pub plates: Vec<PlateResult>,
}

impl PlatePipeline for StubPipeline {
    fn detect_recognition_plate(&self, _frame: &BgrFrame) -> Result<Vec<PlateResult>> {
        Ok(self.plates.clone())
    }
}

/// Always fails, like a model that rejects its input
pub struct FailingPipeline;

impl PlatePipeline for FailingPipeline {
    fn detect_recognition_plate(&self, _frame: &BgrFrame) -> Result<Vec<PlateResult>> {
        anyhow::bail!("recognition model returned no outputs")
    }
}

pub fn blue_plate() -> PlateResult {
    PlateResult {
        rect: [40, 60, 160, 100],
        detect_conf: 0.91,
        landmarks: [[40, 60], [160, 60], [160, 100], [40, 100]],
        plate_no: "京A12345".to_string(),
        rec_conf: 0.97,
        char_confidences: vec![0.97; 7],
        roi_height: 40,
        plate_color: Some(PlateColor::Blue),
        color_conf: Some(0.99),
        plate_type: PlateLayout::Single,
    }
}

pub fn yellow_double_plate() -> PlateResult {
    PlateResult {
        rect: [10, 10, 90, 50],
        detect_conf: 0.82,
        landmarks: [[10, 10], [90, 10], [90, 50], [10, 50]],
        plate_no: "沪B67890".to_string(),
        rec_conf: 0.88,
        char_confidences: vec![0.88; 7],
        roi_height: 16,
        plate_color: Some(PlateColor::Yellow),
        color_conf: Some(0.95),
        plate_type: PlateLayout::Double,
    }
}

pub fn state_with(pipeline: Arc<dyn PlatePipeline>, static_dir: &Path) -> AppState {
    let overlay = TextOverlay::with_chain(FontChain::embedded().unwrap());
    let store = UploadStore::new(static_dir);
    store.ensure_dirs().unwrap();
    AppState::new(pipeline, Arc::new(overlay), Arc::new(store))
}

pub fn stub_state(plates: Vec<PlateResult>, static_dir: &Path) -> AppState {
    state_with(Arc::new(StubPipeline { plates }), static_dir)
}

/// A gray PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([90, 90, 90]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// multipart/form-data body with a single file field
pub fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
