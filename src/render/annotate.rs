// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Draws recognized plates onto a copy of the input image

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use tracing::{info, warn};

use super::text::TextOverlay;
use crate::vision::frame::BgrFrame;
use crate::vision::plate::PlateResult;

/// Landmark dot colors, one per corner
pub const LANDMARK_COLORS: [Rgb<u8>; 4] = [
    Rgb([0, 0, 255]),
    Rgb([0, 255, 0]),
    Rgb([255, 0, 0]),
    Rgb([0, 255, 255]),
];

pub const LANDMARK_RADIUS: i32 = 5;
pub const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const BOX_THICKNESS: u32 = 2;
pub const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const LABEL_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
pub const MIN_LABEL_SIZE: f32 = 12.0;

/// Horizontal and vertical box padding, as fractions of box size
const PAD_X: f32 = 0.05;
const PAD_Y: f32 = 0.11;

/// Plate box grown by the padding ratios and clamped to the image,
/// as `(x1, y1, x2, y2)`
pub fn padded_rect(rect: [i32; 4], width: u32, height: u32) -> (i32, i32, i32, i32) {
    let w = (rect[2] - rect[0]) as f32;
    let h = (rect[3] - rect[1]) as f32;
    let pad_w = PAD_X * w;
    let pad_h = PAD_Y * h;

    let x1 = ((rect[0] as f32 - pad_w) as i32).max(0);
    let y1 = ((rect[1] as f32 - pad_h) as i32).max(0);
    let x2 = ((rect[2] as f32 + pad_w) as i32).min(width as i32);
    let y2 = ((rect[3] as f32 + pad_h) as i32).min(height as i32);
    (x1, y1, x2, y2)
}

/// Render every plate onto a copy of `frame`
///
/// Text failures are logged; boxes and landmarks are always drawn.
pub fn annotate(frame: &BgrFrame, plates: &[PlateResult], overlay: &TextOverlay) -> BgrFrame {
    let mut image = frame.to_rgb_image();

    for plate in plates {
        draw_plate(&mut image, plate, overlay);
    }

    if !plates.is_empty() {
        let summary: Vec<String> = plates.iter().map(PlateResult::label).collect();
        info!("Annotated plates: {}", summary.join(", "));
    }

    BgrFrame::from_rgb_image(&image)
}

fn draw_plate(image: &mut RgbImage, plate: &PlateResult, overlay: &TextOverlay) {
    let (img_w, img_h) = image.dimensions();

    for (point, color) in plate.landmarks.iter().zip(LANDMARK_COLORS) {
        draw_filled_circle_mut(image, (point[0], point[1]), LANDMARK_RADIUS, color);
    }

    let (x1, y1, x2, y2) = padded_rect(plate.rect, img_w, img_h);
    for t in 0..BOX_THICKNESS as i32 {
        let w = x2 - x1 - 2 * t;
        let h = y2 - y1 - 2 * t;
        if w <= 0 || h <= 0 {
            break;
        }
        draw_hollow_rect_mut(
            image,
            Rect::at(x1 + t, y1 + t).of_size(w as u32, h as u32),
            BOX_COLOR,
        );
    }

    let label = plate.label();
    let size = (plate.roi_height as f32).max(MIN_LABEL_SIZE);
    let (text_w, text_h) = match overlay.measure(&label, size) {
        Ok(dims) => dims,
        Err(e) => {
            warn!("Skipping label for {}: {}", plate.plate_no, e);
            return;
        }
    };

    let (left, top) = label_origin(x1, y1, text_w, text_h, img_w);
    if text_w > 0 && text_h > 0 {
        draw_filled_rect_mut(
            image,
            Rect::at(left, top).of_size(text_w, text_h),
            LABEL_BACKGROUND,
        );
    }
    if let Err(e) = overlay.draw(image, &label, left, top, LABEL_TEXT_COLOR, size) {
        warn!("Failed to draw label for {}: {}", plate.plate_no, e);
    }
}

/// Top-left of a label sitting just above the box, kept inside the image
pub fn label_origin(x1: i32, y1: i32, text_w: u32, text_h: u32, img_w: u32) -> (i32, i32) {
    let mut left = x1;
    if left + text_w as i32 > img_w as i32 {
        left = img_w as i32 - text_w as i32;
    }
    let top = y1 - text_h as i32;
    (left.max(0), top.max(0))
}
