// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! License plate detection model
//!
//! A YOLO-style detector with four corner landmarks per box. Each output row
//! holds 15 values: `cx, cy, w, h, objectness, 8 landmark coordinates,
//! 2 class scores` where class 0 is a single-row plate and class 1 a
//! double-row plate.

use anyhow::{Context, Result};
use image::RgbImage;
use ndarray::ArrayViewD;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::geometry::{non_max_suppression, BBox, Quad};
use super::model::PlateLayout;
use super::preprocessing::{detection_tensor, LetterboxInfo, DETECT_INPUT_SIZE};
use crate::vision::device::{load_session, Device};

/// Values per detection row
pub const DETECTION_ROW_LEN: usize = 15;

/// Default objectness/class confidence threshold
pub const DEFAULT_CONF_THRESHOLD: f32 = 0.3;

/// Default NMS IoU threshold
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;

/// A detected plate in original image coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct PlateDetection {
    /// `[x1, y1, x2, y2]`
    pub rect: BBox,
    /// Objectness times class score
    pub score: f32,
    /// Four corners as predicted by the model (not yet ordered)
    pub landmarks: Quad,
    pub layout: PlateLayout,
}

/// Plate detection model backed by ONNX Runtime
#[derive(Clone)]
pub struct PlateDetectionModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    input_name: String,
    input_size: u32,
    conf_threshold: f32,
    iou_threshold: f32,
}

impl std::fmt::Debug for PlateDetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlateDetectionModel")
            .field("input_name", &self.input_name)
            .field("input_size", &self.input_size)
            .field("conf_threshold", &self.conf_threshold)
            .field("iou_threshold", &self.iou_threshold)
            .finish_non_exhaustive()
    }
}

impl PlateDetectionModel {
    /// Load the detection model from an ONNX file
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime cannot load it.
    pub fn new<P: AsRef<Path>>(model_path: P, device: Device) -> Result<Self> {
        let session = load_session(model_path.as_ref(), device, "Plate detection")?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "input".to_string());

        if let Some(input) = session.inputs.first() {
            debug!("Detection model input shape: {:?}", input.input_type);
        }

        info!("✅ Plate detection model loaded (input: {})", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            input_size: DETECT_INPUT_SIZE,
            conf_threshold: DEFAULT_CONF_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        })
    }

    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size.max(32);
        self
    }

    pub fn with_thresholds(mut self, conf: f32, iou: f32) -> Self {
        self.conf_threshold = conf.clamp(0.0, 1.0);
        self.iou_threshold = iou.clamp(0.0, 1.0);
        self
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Detect plates in an RGB image
    pub fn detect(&self, image: &RgbImage) -> Result<Vec<PlateDetection>> {
        let (tensor, letterbox) = detection_tensor(image, self.input_size);

        let input_value =
            Value::from_array(tensor).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Detection session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        debug!("Detection output shape: {:?}", output_tensor.shape());

        let detections = decode_detections(
            output_tensor.view(),
            &letterbox,
            (image.width(), image.height()),
            self.conf_threshold,
            self.iou_threshold,
        )?;

        debug!("Detected {} plates", detections.len());
        Ok(detections)
    }
}

/// Turn raw detector rows into plates in original image coordinates
///
/// Accepts `[1, N, 15]` or `[N, 15]`.
pub fn decode_detections(
    output: ArrayViewD<f32>,
    letterbox: &LetterboxInfo,
    image_size: (u32, u32),
    conf_threshold: f32,
    iou_threshold: f32,
) -> Result<Vec<PlateDetection>> {
    let shape = output.shape().to_vec();
    let (rows, cols) = match shape.as_slice() {
        [1, n, c] => (*n, *c),
        [n, c] => (*n, *c),
        _ => anyhow::bail!("Unexpected detection output shape: {:?}", shape),
    };
    if cols < DETECTION_ROW_LEN {
        anyhow::bail!(
            "Detection rows have {} values, expected {}",
            cols,
            DETECTION_ROW_LEN
        );
    }

    let flat: Vec<f32> = output.iter().copied().collect();
    let mut candidates = Vec::new();

    for row in flat.chunks_exact(cols).take(rows) {
        let objectness = row[4];
        if objectness <= conf_threshold {
            continue;
        }

        let single = row[13] * objectness;
        let double = row[14] * objectness;
        let (score, layout) = if double > single {
            (double, PlateLayout::Double)
        } else {
            (single, PlateLayout::Single)
        };
        if score <= conf_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        let rect = [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0];
        let landmarks = [
            [row[5], row[6]],
            [row[7], row[8]],
            [row[9], row[10]],
            [row[11], row[12]],
        ];

        candidates.push(PlateDetection {
            rect,
            score,
            landmarks,
            layout,
        });
    }

    let boxes: Vec<BBox> = candidates.iter().map(|d| d.rect).collect();
    let scores: Vec<f32> = candidates.iter().map(|d| d.score).collect();
    let keep = non_max_suppression(&boxes, &scores, iou_threshold);

    let (img_w, img_h) = (image_size.0 as f32, image_size.1 as f32);
    let restore = |x: f32, y: f32| {
        let (ox, oy) = letterbox.map_to_original(x, y);
        [
            ox.clamp(0.0, img_w).round(),
            oy.clamp(0.0, img_h).round(),
        ]
    };

    Ok(keep
        .into_iter()
        .map(|i| {
            let det = &candidates[i];
            let [x1, y1] = restore(det.rect[0], det.rect[1]);
            let [x2, y2] = restore(det.rect[2], det.rect[3]);
            PlateDetection {
                rect: [x1, y1, x2, y2],
                score: det.score,
                landmarks: det.landmarks.map(|[x, y]| restore(x, y)),
                layout: det.layout,
            }
        })
        .collect())
}
