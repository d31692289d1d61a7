// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload response types

use serde::{Deserialize, Serialize};

use crate::vision::plate::PlateResult;

/// Per-plate summary returned to the pages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlateInfo {
    pub plate_no: String,
    /// Detection confidence (0.0-1.0)
    pub confidence: f32,
    /// Color label, `unknown` without a color head
    pub color: String,
    /// `[x1, y1, x2, y2]`
    pub bbox: [i32; 4],
    /// `单层` or `双层`
    pub plate_type: String,
}

impl From<&PlateResult> for PlateInfo {
    fn from(result: &PlateResult) -> Self {
        Self {
            plate_no: result.plate_no.clone(),
            confidence: result.detect_conf,
            color: result.color_label().to_string(),
            bbox: result.rect,
            plate_type: result.plate_type.label().to_string(),
        }
    }
}

/// Response from `POST /upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub plates: Vec<PlateInfo>,
    /// URL of the annotated image
    pub result_image: String,
    /// URL of the stored upload
    pub original_image: String,
    pub processing_time_ms: u64,
}

impl UploadResponse {
    pub fn new(
        plates: &[PlateResult],
        result_image: String,
        original_image: String,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            success: true,
            plates: plates.iter().map(PlateInfo::from).collect(),
            result_image,
            original_image,
            processing_time_ms,
        }
    }
}
