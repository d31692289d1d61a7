// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tensor preparation for the plate detection and recognition models

use image::{imageops, Rgb, RgbImage};
use ndarray::Array4;

use crate::vision::frame::BgrFrame;

/// Square input size of the detection model
pub const DETECT_INPUT_SIZE: u32 = 640;

/// Letterbox padding value
pub const PAD_VALUE: u8 = 114;

/// Recognition model input width
pub const REC_INPUT_WIDTH: u32 = 168;

/// Recognition model input height
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Mean used by the recognition model (single value, all channels)
pub const REC_MEAN: f32 = 0.588;

/// Std used by the recognition model (single value, all channels)
pub const REC_STD: f32 = 0.193;

/// Scale and padding applied by [`letterbox`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxInfo {
    /// Scale factor applied to the original image
    pub ratio: f32,
    /// Padding added on the left
    pub left: u32,
    /// Padding added on top
    pub top: u32,
}

impl LetterboxInfo {
    /// Map a coordinate from letterboxed space back to the original image
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.left as f32) / self.ratio,
            (y - self.top as f32) / self.ratio,
        )
    }
}

/// Resize keeping aspect ratio and pad to `size` x `size`, centered
pub fn letterbox(image: &RgbImage, size: u32) -> (RgbImage, LetterboxInfo) {
    let (w, h) = image.dimensions();
    let mut output = RgbImage::from_pixel(size, size, Rgb([PAD_VALUE; 3]));

    if w == 0 || h == 0 {
        return (
            output,
            LetterboxInfo {
                ratio: 1.0,
                left: 0,
                top: 0,
            },
        );
    }

    let ratio = (size as f32 / h as f32).min(size as f32 / w as f32);
    let new_w = ((w as f32 * ratio) as u32).clamp(1, size);
    let new_h = ((h as f32 * ratio) as u32).clamp(1, size);
    let left = (size - new_w) / 2;
    let top = (size - new_h) / 2;

    let resized = imageops::resize(image, new_w, new_h, imageops::FilterType::Triangle);
    imageops::replace(&mut output, &resized, left as i64, top as i64);

    (output, LetterboxInfo { ratio, left, top })
}

/// Detection input: letterboxed RGB scaled to [0, 1], NCHW `[1, 3, size, size]`
pub fn detection_tensor(image: &RgbImage, size: u32) -> (Array4<f32>, LetterboxInfo) {
    let (boxed, info) = letterbox(image, size);
    let s = size as usize;
    let mut tensor = Array4::zeros((1, 3, s, s));

    for (x, y, pixel) in boxed.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    (tensor, info)
}

/// Recognition input: plate crop resized to 168x48, channels kept in B-G-R
/// order, normalized `(v / 255 - 0.588) / 0.193`, NCHW `[1, 3, 48, 168]`
pub fn recognition_tensor(plate: &BgrFrame) -> Array4<f32> {
    let resized = imageops::resize(
        &plate.channel_image(),
        REC_INPUT_WIDTH,
        REC_INPUT_HEIGHT,
        imageops::FilterType::Triangle,
    );

    let mut tensor = Array4::zeros((1, 3, REC_INPUT_HEIGHT as usize, REC_INPUT_WIDTH as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel[c] as f32 / 255.0 - REC_MEAN) / REC_STD;
        }
    }

    tensor
}
