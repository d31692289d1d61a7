// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON body of every failed request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: String,
    /// Human-readable message shown by the pages
    pub error: String,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    /// Multipart form had no image field
    NoFile,
    /// Image field present but without a filename
    EmptyFilename,
    UnsupportedFormat,
    InvalidImage(String),
    InvalidRequest(String),
    PayloadTooLarge(String),
    ProcessingFailed(String),
    InternalError(String),
}

impl ApiError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::NoFile => "no_file",
            ApiError::EmptyFilename => "empty_filename",
            ApiError::UnsupportedFormat => "unsupported_format",
            ApiError::InvalidImage(_) => "invalid_image",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::ProcessingFailed(_) => "processing_failed",
            ApiError::InternalError(_) => "internal_error",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            success: false,
            error_type: self.error_type().to_string(),
            error: self.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoFile
            | ApiError::EmptyFilename
            | ApiError::UnsupportedFormat
            | ApiError::InvalidImage(_)
            | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ProcessingFailed(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NoFile => write!(f, "没有文件被上传"),
            ApiError::EmptyFilename => write!(f, "没有选择文件"),
            ApiError::UnsupportedFormat => write!(f, "不支持的文件格式"),
            ApiError::InvalidImage(msg) => write!(f, "无法读取图片: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "无效请求: {}", msg),
            ApiError::PayloadTooLarge(msg) => write!(f, "文件过大: {}", msg),
            ApiError::ProcessingFailed(msg) => write!(f, "处理失败: {}", msg),
            ApiError::InternalError(msg) => write!(f, "内部错误: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status_code().is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }
        (self.status_code(), Json(self.to_response())).into_response()
    }
}

impl From<axum_extra::extract::multipart::MultipartError> for ApiError {
    fn from(e: axum_extra::extract::multipart::MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(e.body_text())
        } else {
            ApiError::InvalidRequest(e.body_text())
        }
    }
}
