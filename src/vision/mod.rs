// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for license plates
//!
//! This module provides:
//! - Image decoding and the BGR/RGB frame representations
//! - Compute device selection for ONNX Runtime
//! - Plate detection, rectification and recognition

pub mod device;
pub mod frame;
pub mod image_utils;
pub mod model_manager;
pub mod plate;

pub use device::Device;
pub use frame::{BgrFrame, FrameError, ImageInput};
pub use image_utils::{decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use model_manager::{PlateModelConfig, PlateModelInfo, PlateModelManager};
