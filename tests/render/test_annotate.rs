// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Result rendering on synthetic frames

use plate_vision::render::annotate::{padded_rect, BOX_COLOR, LANDMARK_COLORS};
use plate_vision::render::{annotate, FontChain, TextOverlay};
use plate_vision::vision::plate::{PlateColor, PlateLayout, PlateResult};
use plate_vision::vision::BgrFrame;

fn overlay() -> TextOverlay {
    TextOverlay::with_chain(FontChain::embedded().unwrap())
}

fn plate(rect: [i32; 4], layout: PlateLayout) -> PlateResult {
    PlateResult {
        rect,
        detect_conf: 0.9,
        landmarks: [
            [rect[0], rect[1]],
            [rect[2], rect[1]],
            [rect[2], rect[3]],
            [rect[0], rect[3]],
        ],
        plate_no: "粤B12345".to_string(),
        rec_conf: 0.9,
        char_confidences: vec![0.9; 7],
        roi_height: 24,
        plate_color: Some(PlateColor::Green),
        color_conf: Some(0.9),
        plate_type: layout,
    }
}

fn rgb_at(frame: &BgrFrame, x: u32, y: u32) -> [u8; 3] {
    let [b, g, r] = frame.pixel(x, y).unwrap();
    [r, g, b]
}

#[test]
fn test_annotate_leaves_input_untouched() {
    let frame = BgrFrame::filled(300, 200, [50, 50, 50]).unwrap();
    let before = frame.clone();
    let out = annotate(&frame, &[plate([100, 100, 200, 140], PlateLayout::Single)], &overlay());
    assert_eq!(frame, before);
    assert_ne!(out, frame);
}

#[test]
fn test_annotate_draws_box_and_landmarks() {
    let frame = BgrFrame::filled(300, 200, [50, 50, 50]).unwrap();
    let result = plate([100, 100, 200, 140], PlateLayout::Single);
    let out = annotate(&frame, &[result.clone()], &overlay());

    // Box edge sits on the padded rectangle
    let (x1, _, _, y2) = padded_rect(result.rect, 300, 200);
    assert_eq!(rgb_at(&out, x1 as u32, (y2 - 1) as u32), BOX_COLOR.0);

    // Bottom-right landmark dot
    assert_eq!(rgb_at(&out, 200, 140), LANDMARK_COLORS[2].0);
}

#[test]
fn test_annotate_without_plates_is_identity() {
    let frame = BgrFrame::filled(64, 48, [1, 2, 3]).unwrap();
    assert_eq!(annotate(&frame, &[], &overlay()), frame);
}

#[test]
fn test_annotate_plate_at_image_edge() {
    // Label would start above the image and past its right border
    let frame = BgrFrame::filled(120, 60, [0, 0, 0]).unwrap();
    let out = annotate(&frame, &[plate([60, 0, 120, 30], PlateLayout::Double)], &overlay());
    assert_eq!((out.width(), out.height()), (120, 60));
}
