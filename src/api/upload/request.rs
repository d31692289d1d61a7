// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart image extraction and validation

use axum::body::Bytes;
use axum_extra::extract::Multipart;

use crate::api::errors::ApiError;
use crate::storage::allowed_file;

/// Form field carrying the image on the upload page
pub const UPLOAD_FIELD: &str = "file";

/// An image file received in a multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename (may be empty)
    pub filename: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Read the first field named `field_name`, skipping all others
    pub async fn from_multipart(
        multipart: &mut Multipart,
        field_name: &str,
    ) -> Result<Option<Self>, ApiError> {
        while let Some(field) = multipart.next_field().await? {
            if field.name() != Some(field_name) {
                continue;
            }
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            return Ok(Some(Self { filename, bytes }));
        }
        Ok(None)
    }

    /// Validate the upload
    pub fn validate(&self) -> Result<(), ApiError> {
        // Validate a file was chosen
        if self.filename.is_empty() {
            return Err(ApiError::EmptyFilename);
        }

        // Validate extension
        if !allowed_file(&self.filename) {
            return Err(ApiError::UnsupportedFormat);
        }

        Ok(())
    }
}
