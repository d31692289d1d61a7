// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload endpoint handler

use axum::extract::State;
use axum::Json;
use axum_extra::extract::Multipart;
use tracing::{debug, info};

use super::request::{UploadedFile, UPLOAD_FIELD};
use super::response::UploadResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::{decode_image_bytes, BgrFrame};

/// POST /upload - Recognize plates in an uploaded image
///
/// Accepts a multipart form with the image in the `file` field. The
/// original is kept under `/static/uploads`, the annotated copy under
/// `/static/results`.
///
/// # Response
/// - `success`: always `true`
/// - `plates`: plate number, detection confidence, color, box and row type
/// - `result_image`, `original_image`: URLs under `/static`
///
/// # Errors
/// - 400 Bad Request: no file, empty filename, unsupported extension,
///   unreadable image
/// - 413 Payload Too Large: body above the configured limit
/// - 500 Internal Server Error: inference or storage failed
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    // 1. Extract the file field
    let upload = UploadedFile::from_multipart(&mut multipart, UPLOAD_FIELD)
        .await?
        .ok_or(ApiError::NoFile)?;

    // 2. Validate filename and extension
    upload.validate()?;
    debug!(
        "Upload received: {} ({} bytes)",
        upload.filename,
        upload.bytes.len()
    );

    // 3. Keep the original
    let original = state
        .store
        .save_upload(&upload.filename, &upload.bytes)
        .await
        .map_err(|e| ApiError::InternalError(format!("{:#}", e)))?;

    // 4. Decode
    let (image, image_info) =
        decode_image_bytes(&upload.bytes).map_err(|e| ApiError::InvalidImage(e.to_string()))?;
    debug!(
        "Decoded image: {}x{}, {} bytes",
        image_info.width, image_info.height, image_info.size_bytes
    );

    // 5. Detect, recognize and annotate
    let recognition = state.recognize(BgrFrame::from(&image)).await?;

    // 6. Store the annotated result
    let result = state
        .store
        .save_result(&recognition.annotated)
        .await
        .map_err(|e| ApiError::ProcessingFailed(format!("{:#}", e)))?;

    info!(
        "Upload {}: {} plates, {}ms",
        original.url,
        recognition.plates.len(),
        recognition.processing_time_ms
    );

    Ok(Json(UploadResponse::new(
        &recognition.plates,
        result.url,
        original.url,
        recognition.processing_time_ms,
    )))
}
