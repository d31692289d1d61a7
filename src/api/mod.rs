// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod http_server;
pub mod pages;
pub mod upload;
pub mod widget;

pub use errors::{ApiError, ErrorResponse};
pub use http_server::{create_upload_router, create_widget_router, serve, AppState, Recognition};
pub use upload::{upload_handler, PlateInfo, UploadResponse, UploadedFile};
pub use widget::{examples_handler, recognize_handler, summary_text, RecognizeResponse};
