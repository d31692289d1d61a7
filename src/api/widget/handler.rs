// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Widget UI endpoint handlers

use axum::extract::State;
use axum::Json;
use axum_extra::extract::Multipart;
use std::path::Path;
use tracing::{debug, info, warn};

use super::response::{summary_text, ExampleImage, ExamplesResponse, RecognizeResponse};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::upload::{PlateInfo, UploadedFile};
use crate::storage::{allowed_file, TempImage};
use crate::vision::image_utils::{detect_format, format_to_extension, jpeg_data_url};
use crate::vision::{decode_image_bytes, BgrFrame};

/// Form field carrying the image in the widget UI
pub const WIDGET_FIELD: &str = "image";

/// POST /api/recognize - Recognize plates for the widget UI
///
/// The upload only lives for the duration of the request: it is written to
/// a temporary file, read back and decoded, and the file is removed when
/// the handler returns.
pub async fn recognize_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RecognizeResponse>, ApiError> {
    // 1. Extract the image field
    let upload = UploadedFile::from_multipart(&mut multipart, WIDGET_FIELD)
        .await?
        .filter(|u| !u.bytes.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest("请上传图片".to_string()))?;

    // 2. Persist to a temporary file for the request
    let temp = TempImage::persist(&upload.bytes, temp_extension(&upload.bytes)?)
        .map_err(|e| ApiError::InternalError(format!("{:#}", e)))?;
    debug!("Widget upload stored at {}", temp.path().display());

    // 3. Decode from the temporary file
    let bytes = temp
        .read()
        .map_err(|e| ApiError::InternalError(format!("{:#}", e)))?;
    let (image, _) =
        decode_image_bytes(&bytes).map_err(|e| ApiError::InvalidImage(e.to_string()))?;

    // 4. Detect, recognize and annotate
    let recognition = state.recognize(BgrFrame::from(&image)).await?;

    // 5. Encode for the result widget
    let data_url = jpeg_data_url(&recognition.annotated)
        .map_err(|e| ApiError::ProcessingFailed(e.to_string()))?;

    info!(
        "Widget recognition: {} plates, {}ms",
        recognition.plates.len(),
        recognition.processing_time_ms
    );

    Ok(Json(RecognizeResponse {
        image: data_url,
        text: summary_text(&recognition.plates),
        plates: recognition.plates.iter().map(PlateInfo::from).collect(),
        processing_time_ms: recognition.processing_time_ms,
    }))
}

/// Suffix for the temporary copy, taken from the image's magic bytes
fn temp_extension(bytes: &[u8]) -> Result<&'static str, ApiError> {
    let format = detect_format(bytes).map_err(|e| ApiError::InvalidImage(e.to_string()))?;
    Ok(format_to_extension(format))
}

/// GET /api/examples - Sample images under the examples directory
pub async fn examples_handler(State(state): State<AppState>) -> Json<ExamplesResponse> {
    let examples = match &state.examples_dir {
        Some(dir) => list_examples(dir).await,
        None => Vec::new(),
    };
    Json(ExamplesResponse { examples })
}

/// Image files directly under `dir`, sorted by name
pub async fn list_examples(dir: &Path) -> Vec<ExampleImage> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read examples directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut examples = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file && allowed_file(&name) {
            examples.push(ExampleImage {
                url: format!("/examples/{}", name),
                name,
            });
        }
    }
    examples.sort_by(|a, b| a.name.cmp(&b.name));
    examples
}
