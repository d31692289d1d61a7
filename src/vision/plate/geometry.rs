// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Box and quadrilateral geometry for plate crops

use anyhow::{Context, Result};
use image::Rgb;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

use crate::vision::frame::BgrFrame;

/// Axis-aligned box `[x1, y1, x2, y2]`
pub type BBox = [f32; 4];

/// Four landmark points, `[x, y]` each
pub type Quad = [[f32; 2]; 4];

/// Intersection over union of two boxes
pub fn iou(a: &BBox, b: &BBox) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    let union = area_a + area_b - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Class-agnostic non-maximum suppression
///
/// Returns indices into `boxes` of the kept entries, highest score first.
/// A box is suppressed when its IoU with an already kept box exceeds
/// `iou_threshold`.
pub fn non_max_suppression(boxes: &[BBox], scores: &[f32], iou_threshold: f32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..boxes.len().min(scores.len())).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut keep = Vec::new();
    let mut suppressed = vec![false; boxes.len()];

    for (pos, &i) in order.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep.push(i);

        for &j in &order[pos + 1..] {
            if !suppressed[j] && iou(&boxes[i], &boxes[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Order points as top-left, top-right, bottom-right, bottom-left
///
/// Top-left has the smallest `x + y`, bottom-right the largest; top-right
/// has the smallest `y - x`, bottom-left the largest.
pub fn order_points(points: &Quad) -> Quad {
    let by = |key: fn(&[f32; 2]) -> f32, max: bool| {
        let iter = points.iter().copied();
        let pick = if max {
            iter.max_by(|a, b| key(a).total_cmp(&key(b)))
        } else {
            iter.min_by(|a, b| key(a).total_cmp(&key(b)))
        };
        pick.unwrap_or([0.0, 0.0])
    };
    let sum = |p: &[f32; 2]| p[0] + p[1];
    let diff = |p: &[f32; 2]| p[1] - p[0];

    [by(sum, false), by(diff, false), by(sum, true), by(diff, true)]
}

/// Shoelace area of a quadrilateral given in drawing order
fn quad_area(points: &Quad) -> f32 {
    let mut twice = 0.0;
    for i in 0..4 {
        let [x1, y1] = points[i];
        let [x2, y2] = points[(i + 1) % 4];
        twice += x1 * y2 - x2 * y1;
    }
    (twice / 2.0).abs()
}

fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

/// Warp the quadrilateral spanned by `points` onto an upright rectangle
///
/// Output width is the longer of the top and bottom edges, height the
/// longer of the left and right edges.
pub fn four_point_transform(frame: &BgrFrame, points: &Quad) -> Result<BgrFrame> {
    let ordered = order_points(points);
    if quad_area(&ordered) < 1.0 {
        anyhow::bail!("Degenerate plate quadrilateral: {:?}", points);
    }
    let [tl, tr, br, bl] = ordered;

    let width = (distance(br, bl) as u32).max(distance(tr, tl) as u32).max(1);
    let height = (distance(tr, br) as u32).max(distance(tl, bl) as u32).max(1);

    let (w, h) = ((width - 1) as f32, (height - 1) as f32);
    let from = [
        (tl[0], tl[1]),
        (tr[0], tr[1]),
        (br[0], br[1]),
        (bl[0], bl[1]),
    ];
    let to = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

    let projection = Projection::from_control_points(from, to)
        .with_context(|| format!("Degenerate plate quadrilateral: {:?}", points))?;

    let source = frame.channel_image();
    let mut out = image::RgbImage::new(width, height);
    warp_into(
        &source,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut out,
    );

    BgrFrame::from_channel_image(out).context("Failed to build warped plate frame")
}

/// Rearrange a double-row plate into a single row
///
/// The upper band (top 5/12) is resized to the size of the lower band
/// (from 1/3 down) and placed to its left.
pub fn split_merge(plate: &BgrFrame) -> Result<BgrFrame> {
    let (w, h) = (plate.width(), plate.height());
    let upper_end = ((5.0 / 12.0) * h as f32) as u32;
    let lower_start = ((1.0 / 3.0) * h as f32) as u32;

    let upper = plate
        .crop(0, 0, w, upper_end.max(1))
        .context("Failed to crop upper plate row")?;
    let lower = plate
        .crop(0, lower_start.min(h - 1), w, h)
        .context("Failed to crop lower plate row")?;

    let upper = upper
        .resize(lower.width(), lower.height())
        .context("Failed to resize upper plate row")?;

    upper
        .hconcat(&lower)
        .context("Failed to merge plate rows")
}
