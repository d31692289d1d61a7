// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! License plate character and color recognition model
//!
//! The model reads a rectified 168x48 plate crop and emits per-timestep
//! character logits over [`PLATE_ALPHABET`]. Color-capable exports carry a
//! second output with logits over the five plate colors.

use anyhow::{Context, Result};
use ndarray::{ArrayViewD, Axis};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::model::PlateColor;
use super::preprocessing::recognition_tensor;
use crate::vision::device::{load_session, Device};
use crate::vision::frame::BgrFrame;

/// Character set of the recognition head; index 0 is the CTC blank
pub const PLATE_ALPHABET: &str = "#京沪津渝冀晋蒙辽吉黑苏浙皖闽赣鲁豫鄂湘粤桂琼川贵云藏陕甘青宁新学警港澳挂使领民航危0123456789ABCDEFGHJKLMNPQRSTUVWXYZ险品";

/// Recognized plate text with confidences
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedPlate {
    pub text: String,
    /// Mean of the per-character probabilities
    pub confidence: f32,
    pub char_confidences: Vec<f32>,
    /// `None` when the model has no color head
    pub color: Option<(PlateColor, f32)>,
}

/// Plate recognition model backed by ONNX Runtime
#[derive(Clone)]
pub struct PlateRecognitionModel {
    session: Arc<Mutex<Session>>,
    input_name: String,
    alphabet: Vec<char>,
    has_color_head: bool,
}

impl std::fmt::Debug for PlateRecognitionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlateRecognitionModel")
            .field("input_name", &self.input_name)
            .field("alphabet_size", &self.alphabet.len())
            .field("has_color_head", &self.has_color_head)
            .finish_non_exhaustive()
    }
}

impl PlateRecognitionModel {
    /// Load the recognition model from an ONNX file
    pub fn new<P: AsRef<Path>>(model_path: P, device: Device) -> Result<Self> {
        let session = load_session(model_path.as_ref(), device, "Plate recognition")?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        let has_color_head = session.outputs.len() > 1;

        info!(
            "✅ Plate recognition model loaded (input: {}, color head: {})",
            input_name, has_color_head
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            alphabet: PLATE_ALPHABET.chars().collect(),
            has_color_head,
        })
    }

    pub fn has_color_head(&self) -> bool {
        self.has_color_head
    }

    /// Recognize a rectified plate crop
    pub fn recognize(&self, plate: &BgrFrame) -> Result<RecognizedPlate> {
        let tensor = recognition_tensor(plate);
        let input_value =
            Value::from_array(tensor).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Recognition session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Recognition inference failed")?;

        let plate_logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract plate output tensor")?;
        debug!("Recognition output shape: {:?}", plate_logits.shape());

        let (text, char_confidences) = ctc_decode(plate_logits.view(), &self.alphabet)?;

        let color = if self.has_color_head {
            let color_logits = outputs[1]
                .try_extract_array::<f32>()
                .context("Failed to extract color output tensor")?;
            Some(decode_color(color_logits.view())?)
        } else {
            None
        };

        let confidence = mean(&char_confidences);
        Ok(RecognizedPlate {
            text,
            confidence,
            char_confidences,
            color,
        })
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

fn argmax(values: &[f32]) -> (usize, f32) {
    values
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, v)| {
            if v > best.1 {
                (i, v)
            } else {
                best
            }
        })
}

/// Greedy CTC decoding over `[1, T, C]` or `[T, C]` logits
///
/// Index 0 is blank. A symbol is emitted when it is not blank and differs
/// from the raw index at the previous timestep, so repeats separated by a
/// blank are kept.
pub fn ctc_decode(output: ArrayViewD<f32>, alphabet: &[char]) -> Result<(String, Vec<f32>)> {
    let output = match output.ndim() {
        3 => output.index_axis_move(Axis(0), 0),
        2 => output,
        _ => anyhow::bail!("Unexpected recognition output shape: {:?}", output.shape()),
    };

    let mut text = String::new();
    let mut char_confidences = Vec::new();
    let mut prev_index = 0usize;

    for step in output.axis_iter(Axis(0)) {
        let logits: Vec<f32> = step.iter().copied().collect();
        let (index, prob) = argmax(&softmax(&logits));

        if index != 0 && index != prev_index {
            if let Some(&ch) = alphabet.get(index) {
                text.push(ch);
                char_confidences.push(prob);
            }
        }
        prev_index = index;
    }

    Ok((text, char_confidences))
}

/// Softmax + argmax over the color head's logits
pub fn decode_color(output: ArrayViewD<f32>) -> Result<(PlateColor, f32)> {
    let logits: Vec<f32> = output.iter().copied().collect();
    if logits.len() != PlateColor::ALL.len() {
        anyhow::bail!(
            "Color head has {} logits, expected {}",
            logits.len(),
            PlateColor::ALL.len()
        );
    }
    let (index, prob) = argmax(&softmax(&logits));
    Ok((PlateColor::ALL[index], prob))
}
