// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pixel buffer representations used across the pipeline
//!
//! Models consume and renderers produce a row-major BGR buffer
//! ([`BgrFrame`]); decoders and the text overlay work on `image::RgbImage`.
//! [`ImageInput`] accepts either.

use image::{imageops, DynamicImage, Rgb, RgbImage};
use thiserror::Error;

const BGR_CHANNELS: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("Buffer length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Frame dimensions must be non-zero: {0}x{1}")]
    EmptyDimensions(u32, u32),
}

/// Row-major, 3 bytes per pixel, B-G-R channel order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgrFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BgrFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyDimensions(width, height));
        }
        let expected = BGR_CHANNELS * width as usize * height as usize;
        if data.len() != expected {
            return Err(FrameError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Frame filled with a single BGR color
    pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> Result<Self, FrameError> {
        let pixels = width as usize * height as usize;
        let data = bgr.iter().copied().cycle().take(pixels * BGR_CHANNELS).collect();
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// BGR triple at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * BGR_CHANNELS;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let mut data = image.as_raw().clone();
        swap_red_blue(&mut data);
        Self {
            width: image.width(),
            height: image.height(),
            data,
        }
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        let mut data = self.data.clone();
        swap_red_blue(&mut data);
        // Length is validated on construction, so this cannot fail.
        RgbImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// Copy of the region `[x1, x2) x [y1, y2)`, clamped to the frame
    pub fn crop(&self, x1: u32, y1: u32, x2: u32, y2: u32) -> Result<Self, FrameError> {
        let x2 = x2.min(self.width);
        let y2 = y2.min(self.height);
        let w = x2.saturating_sub(x1);
        let h = y2.saturating_sub(y1);
        let view = imageops::crop_imm(&self.channel_image(), x1, y1, w, h).to_image();
        Self::from_channel_image(view)
    }

    /// Resize without touching channel order
    pub fn resize(&self, width: u32, height: u32) -> Result<Self, FrameError> {
        let resized = imageops::resize(
            &self.channel_image(),
            width,
            height,
            imageops::FilterType::Triangle,
        );
        Self::from_channel_image(resized)
    }

    /// Place two frames of equal height side by side
    pub fn hconcat(&self, right: &BgrFrame) -> Result<Self, FrameError> {
        if self.height != right.height {
            return Err(FrameError::LengthMismatch {
                expected: self.height as usize,
                actual: right.height as usize,
            });
        }
        let width = self.width + right.width;
        let mut out = RgbImage::new(width, self.height);
        imageops::replace(&mut out, &self.channel_image(), 0, 0);
        imageops::replace(&mut out, &right.channel_image(), self.width as i64, 0);
        Self::from_channel_image(out)
    }

    /// The buffer wrapped as an `RgbImage` with channels left in B-G-R order,
    /// for channel-agnostic operations (resize, crop, warp).
    pub(crate) fn channel_image(&self) -> RgbImage {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    pub(crate) fn from_channel_image(image: RgbImage) -> Result<Self, FrameError> {
        let (w, h) = image.dimensions();
        Self::new(w, h, image.into_raw())
    }
}

impl From<&DynamicImage> for BgrFrame {
    /// Alpha is discarded; grayscale is expanded to three channels.
    fn from(image: &DynamicImage) -> Self {
        BgrFrame::from_rgb_image(&image.to_rgb8())
    }
}

fn swap_red_blue(data: &mut [u8]) {
    for px in data.chunks_exact_mut(BGR_CHANNELS) {
        px.swap(0, 2);
    }
}

/// Either supported representation of an image
#[derive(Debug, Clone)]
pub enum ImageInput {
    Bgr(BgrFrame),
    Rgb(RgbImage),
}

impl ImageInput {
    pub fn into_bgr(self) -> BgrFrame {
        match self {
            ImageInput::Bgr(frame) => frame,
            ImageInput::Rgb(image) => BgrFrame::from_rgb_image(&image),
        }
    }

    pub fn into_rgb(self) -> RgbImage {
        match self {
            ImageInput::Bgr(frame) => frame.to_rgb_image(),
            ImageInput::Rgb(image) => image,
        }
    }
}

impl From<BgrFrame> for ImageInput {
    fn from(frame: BgrFrame) -> Self {
        ImageInput::Bgr(frame)
    }
}

impl From<RgbImage> for ImageInput {
    fn from(image: RgbImage) -> Self {
        ImageInput::Rgb(image)
    }
}

/// Convert an RGB triple into the BGR order used by [`BgrFrame`]
pub fn rgb_to_bgr(color: Rgb<u8>) -> [u8; 3] {
    [color[2], color[1], color[0]]
}
