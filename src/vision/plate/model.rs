// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate results and the detection + recognition pipeline

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use super::detection::{PlateDetection, PlateDetectionModel};
use super::geometry::{four_point_transform, split_merge};
use super::recognition::PlateRecognitionModel;
use crate::vision::frame::BgrFrame;

/// Single- or double-row plate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateLayout {
    Single,
    Double,
}

impl PlateLayout {
    pub fn label(&self) -> &'static str {
        match self {
            PlateLayout::Single => "单层",
            PlateLayout::Double => "双层",
        }
    }

    pub fn is_double(&self) -> bool {
        matches!(self, PlateLayout::Double)
    }
}

/// Plate background color, in the order of the color head's logits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateColor {
    #[serde(rename = "黑色")]
    Black,
    #[serde(rename = "蓝色")]
    Blue,
    #[serde(rename = "绿色")]
    Green,
    #[serde(rename = "白色")]
    White,
    #[serde(rename = "黄色")]
    Yellow,
}

impl PlateColor {
    pub const ALL: [PlateColor; 5] = [
        PlateColor::Black,
        PlateColor::Blue,
        PlateColor::Green,
        PlateColor::White,
        PlateColor::Yellow,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PlateColor::Black => "黑色",
            PlateColor::Blue => "蓝色",
            PlateColor::Green => "绿色",
            PlateColor::White => "白色",
            PlateColor::Yellow => "黄色",
        }
    }
}

/// One recognized plate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateResult {
    /// `[x1, y1, x2, y2]` in original image pixels
    pub rect: [i32; 4],
    pub detect_conf: f32,
    /// Corner points as predicted by the detector
    pub landmarks: [[i32; 2]; 4],
    pub plate_no: String,
    /// Mean character probability
    pub rec_conf: f32,
    #[serde(default)]
    pub char_confidences: Vec<f32>,
    /// Height of the crop handed to recognition
    pub roi_height: u32,
    pub plate_color: Option<PlateColor>,
    pub color_conf: Option<f32>,
    pub plate_type: PlateLayout,
}

impl PlateResult {
    /// Color label, or `unknown` when the model has no color head
    pub fn color_label(&self) -> &'static str {
        self.plate_color.map(|c| c.label()).unwrap_or("unknown")
    }

    /// Overlay label: plate number and color, suffixed with `双层` for
    /// double-row plates
    pub fn label(&self) -> String {
        let mut label = format!("{} {}", self.plate_no, self.color_label());
        if self.plate_type.is_double() {
            label.push_str(PlateLayout::Double.label());
        }
        label
    }
}

/// Detect and recognize every plate in an image
///
/// Implementations must be usable from blocking worker threads.
pub trait PlatePipeline: Send + Sync {
    fn detect_recognition_plate(&self, frame: &BgrFrame) -> Result<Vec<PlateResult>>;
}

/// ONNX-backed pipeline: detection, perspective crop, recognition
#[derive(Debug, Clone)]
pub struct PlateRecognizer {
    detector: PlateDetectionModel,
    recognizer: PlateRecognitionModel,
}

impl PlateRecognizer {
    pub fn new(detector: PlateDetectionModel, recognizer: PlateRecognitionModel) -> Self {
        Self {
            detector,
            recognizer,
        }
    }

    pub fn detector(&self) -> &PlateDetectionModel {
        &self.detector
    }

    pub fn recognizer(&self) -> &PlateRecognitionModel {
        &self.recognizer
    }

    fn recognize_one(&self, frame: &BgrFrame, det: &PlateDetection) -> Result<PlateResult> {
        let mut roi = four_point_transform(frame, &det.landmarks)
            .context("Failed to rectify plate region")?;
        if det.layout.is_double() {
            roi = split_merge(&roi)?;
        }

        let plate = self.recognizer.recognize(&roi)?;
        debug!(
            "Plate {} ({:.2}) roi {}x{}",
            plate.text,
            plate.confidence,
            roi.width(),
            roi.height()
        );

        Ok(PlateResult {
            rect: det.rect.map(|v| v as i32),
            detect_conf: det.score,
            landmarks: det.landmarks.map(|[x, y]| [x as i32, y as i32]),
            plate_no: plate.text,
            rec_conf: plate.confidence,
            char_confidences: plate.char_confidences,
            roi_height: roi.height(),
            plate_color: plate.color.map(|(c, _)| c),
            color_conf: plate.color.map(|(_, conf)| conf),
            plate_type: det.layout,
        })
    }
}

impl PlatePipeline for PlateRecognizer {
    fn detect_recognition_plate(&self, frame: &BgrFrame) -> Result<Vec<PlateResult>> {
        let start = Instant::now();
        let detections = self.detector.detect(&frame.to_rgb_image())?;

        let results = detections
            .iter()
            .map(|det| self.recognize_one(frame, det))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Recognized {} plates in {}ms",
            results.len(),
            start.elapsed().as_millis()
        );
        Ok(results)
    }
}
