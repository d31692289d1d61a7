// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! License plate detection and recognition

pub mod detection;
pub mod geometry;
pub mod model;
pub mod preprocessing;
pub mod recognition;

pub use detection::{PlateDetection, PlateDetectionModel};
pub use model::{PlateColor, PlateLayout, PlatePipeline, PlateRecognizer, PlateResult};
pub use recognition::{PlateRecognitionModel, RecognizedPlate, PLATE_ALPHABET};
