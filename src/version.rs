// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the plate recognition service

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-plate-recognition-2025-11-20";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-11-20";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "plate-detection",
    "plate-recognition",
    "plate-color",
    "double-row-plates",
    "upload-server",
    "widget-ui",
    "cjk-text-overlay",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Plate Vision {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
