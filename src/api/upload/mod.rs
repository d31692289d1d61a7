// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload-page front-end

pub mod handler;
pub mod request;
pub mod response;

pub use handler::upload_handler;
pub use request::UploadedFile;
pub use response::{PlateInfo, UploadResponse};
