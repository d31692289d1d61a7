// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Widget UI response types

use serde::{Deserialize, Serialize};

use crate::api::upload::PlateInfo;
use crate::vision::plate::PlateResult;

/// Response from `POST /api/recognize`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizeResponse {
    /// Annotated image as a `data:image/jpeg;base64,...` URL
    pub image: String,
    /// Text for the details box
    pub text: String,
    pub plates: Vec<PlateInfo>,
    pub processing_time_ms: u64,
}

/// A sample image offered below the upload widget
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExampleImage {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamplesResponse {
    pub examples: Vec<ExampleImage>,
}

/// Multi-line summary shown in the details box
pub fn summary_text(plates: &[PlateResult]) -> String {
    if plates.is_empty() {
        return "未检测到车牌".to_string();
    }

    let mut lines = vec![format!("检测到 {} 个车牌", plates.len())];
    lines.extend(plates.iter().enumerate().map(|(i, p)| {
        format!(
            "{}. {} | {} | {} | 置信度 {:.2}",
            i + 1,
            p.plate_no,
            p.color_label(),
            p.plate_type.label(),
            p.detect_conf
        )
    }));
    lines.join("\n")
}
