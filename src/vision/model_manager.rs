// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Loads the plate detection and recognition models as one unit

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::vision::device::Device;
use crate::vision::plate::detection::{DEFAULT_CONF_THRESHOLD, DEFAULT_IOU_THRESHOLD};
use crate::vision::plate::preprocessing::DETECT_INPUT_SIZE;
use crate::vision::plate::{PlateDetectionModel, PlateRecognitionModel, PlateRecognizer};

/// Configuration for loading the plate models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateModelConfig {
    /// Detection model (ONNX)
    pub detect_model_path: PathBuf,
    /// Recognition model with color head (ONNX)
    pub rec_model_path: PathBuf,
    #[serde(with = "device_serde")]
    pub device: Device,
    /// Detection input size
    pub img_size: u32,
    pub conf_thres: f32,
    pub iou_thres: f32,
}

impl Default for PlateModelConfig {
    fn default() -> Self {
        Self {
            detect_model_path: PathBuf::from("weights/plate_detect.onnx"),
            rec_model_path: PathBuf::from("weights/plate_rec_color.onnx"),
            device: Device::Auto,
            img_size: DETECT_INPUT_SIZE,
            conf_thres: DEFAULT_CONF_THRESHOLD,
            iou_thres: DEFAULT_IOU_THRESHOLD,
        }
    }
}

impl PlateModelConfig {
    /// Both model files must exist before anything is loaded
    pub fn validate(&self) -> Result<()> {
        for (label, path) in [
            ("Detection", &self.detect_model_path),
            ("Recognition", &self.rec_model_path),
        ] {
            if !path.exists() {
                anyhow::bail!("{} model file not found: {}", label, path.display());
            }
        }
        if self.img_size == 0 || self.img_size % 32 != 0 {
            anyhow::bail!("img_size must be a positive multiple of 32, got {}", self.img_size);
        }
        Ok(())
    }
}

mod device_serde {
    use super::Device;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(device: &Device, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&device.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Device, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Information about the loaded models
#[derive(Debug, Clone, Serialize)]
pub struct PlateModelInfo {
    pub detect_model: String,
    pub rec_model: String,
    pub device: String,
    pub color_head: bool,
    pub load_time_ms: u64,
}

/// Owns the loaded pipeline
#[derive(Debug)]
pub struct PlateModelManager {
    recognizer: Arc<PlateRecognizer>,
    info: PlateModelInfo,
}

impl PlateModelManager {
    /// Load both models. Loading is all-or-nothing: a missing or
    /// malformed file fails the whole call.
    pub fn load(config: &PlateModelConfig) -> Result<Self> {
        config.validate()?;
        let start = Instant::now();

        let detector = PlateDetectionModel::new(&config.detect_model_path, config.device)
            .context("Failed to initialise plate detection model")?
            .with_input_size(config.img_size)
            .with_thresholds(config.conf_thres, config.iou_thres);

        let recognizer = PlateRecognitionModel::new(&config.rec_model_path, config.device)
            .context("Failed to initialise plate recognition model")?;

        let info = PlateModelInfo {
            detect_model: config.detect_model_path.display().to_string(),
            rec_model: config.rec_model_path.display().to_string(),
            device: config.device.to_string(),
            color_head: recognizer.has_color_head(),
            load_time_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "✅ Plate models ready on {} in {}ms",
            info.device,
            info.load_time_ms
        );

        Ok(Self {
            recognizer: Arc::new(PlateRecognizer::new(detector, recognizer)),
            info,
        })
    }

    pub fn recognizer(&self) -> Arc<PlateRecognizer> {
        self.recognizer.clone()
    }

    pub fn info(&self) -> &PlateModelInfo {
        &self.info
    }
}
