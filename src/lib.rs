// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod render;
pub mod storage;
pub mod version;
pub mod vision;

pub use api::{create_upload_router, create_widget_router, AppState};
pub use config::{AppConfig, ServerConfig};
pub use render::{annotate, put_text, TextOverlay};
pub use vision::plate::{PlatePipeline, PlateRecognizer, PlateResult};
pub use vision::{BgrFrame, PlateModelConfig, PlateModelManager};
