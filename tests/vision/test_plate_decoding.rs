// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Post-processing chain without models: detector rows to plate boxes,
//! rectification, double-row merge and CTC decoding.

use image::{Rgb, RgbImage};
use ndarray::{Array2, Array3};
use plate_vision::vision::plate::detection::decode_detections;
use plate_vision::vision::plate::geometry::{four_point_transform, split_merge};
use plate_vision::vision::plate::preprocessing::{detection_tensor, recognition_tensor};
use plate_vision::vision::plate::recognition::{ctc_decode, decode_color};
use plate_vision::vision::plate::{PlateColor, PlateLayout, PLATE_ALPHABET};
use plate_vision::vision::BgrFrame;

/// Detector row in letterboxed coordinates
fn row(cx: f32, cy: f32, w: f32, h: f32, obj: f32, single: f32, double: f32) -> Vec<f32> {
    let (x1, y1, x2, y2) = (cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0);
    vec![
        cx, cy, w, h, obj, x1, y1, x2, y1, x2, y2, x1, y2, single, double,
    ]
}

fn rows_to_array(rows: &[Vec<f32>]) -> Array3<f32> {
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    Array3::from_shape_vec((1, rows.len(), 15), flat).unwrap()
}

#[test]
fn test_detections_map_back_through_letterbox() {
    // 1280x640 scales by 0.5 into 640x320, padded 160 on top
    let image = RgbImage::new(1280, 640);
    let (tensor, info) = detection_tensor(&image, 640);
    assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
    assert_eq!((info.left, info.top), (0, 160));

    let output = rows_to_array(&[
        row(320.0, 320.0, 100.0, 40.0, 0.9, 0.8, 0.1),
        // Overlaps the first with a lower score
        row(322.0, 321.0, 100.0, 40.0, 0.8, 0.7, 0.1),
        // Below the confidence threshold
        row(100.0, 200.0, 50.0, 20.0, 0.2, 0.9, 0.0),
    ]);

    let plates = decode_detections(output.view().into_dyn(), &info, (1280, 640), 0.3, 0.5).unwrap();
    assert_eq!(plates.len(), 1);

    let plate = &plates[0];
    assert_eq!(plate.rect, [540.0, 280.0, 740.0, 360.0]);
    assert_eq!(plate.layout, PlateLayout::Single);
    assert!((plate.score - 0.72).abs() < 1e-5);
    assert_eq!(plate.landmarks[0], [540.0, 280.0]);
    assert_eq!(plate.landmarks[2], [740.0, 360.0]);
}

#[test]
fn test_double_row_class_wins() {
    let image = RgbImage::new(640, 640);
    let (_, info) = detection_tensor(&image, 640);
    let output = rows_to_array(&[row(300.0, 300.0, 80.0, 60.0, 0.9, 0.2, 0.7)]);

    let plates = decode_detections(output.view().into_dyn(), &info, (640, 640), 0.3, 0.5).unwrap();
    assert_eq!(plates[0].layout, PlateLayout::Double);
}

#[test]
fn test_rectify_merge_and_normalize() {
    // 120x60 double-row plate on a 200x100 frame
    let frame = BgrFrame::filled(200, 100, [200, 120, 40]).unwrap();
    let quad = [[40.0, 20.0], [160.0, 20.0], [160.0, 80.0], [40.0, 80.0]];

    let roi = four_point_transform(&frame, &quad).unwrap();
    assert_eq!((roi.width(), roi.height()), (120, 60));

    let merged = split_merge(&roi).unwrap();
    assert_eq!(merged.height(), 40);
    assert_eq!(merged.width(), 240);

    let tensor = recognition_tensor(&merged);
    assert_eq!(tensor.shape(), &[1, 3, 48, 168]);
}

#[test]
fn test_degenerate_quad_rejected() {
    let frame = BgrFrame::filled(50, 50, [0, 0, 0]).unwrap();
    let line = [[10.0, 10.0], [20.0, 10.0], [30.0, 10.0], [40.0, 10.0]];
    assert!(four_point_transform(&frame, &line).is_err());
}

#[test]
fn test_ctc_decodes_plate_number() {
    let alphabet: Vec<char> = PLATE_ALPHABET.chars().collect();
    let classes = alphabet.len();
    let text = "京A12345";

    // Each character repeated twice, then a blank
    let mut steps = Vec::new();
    for ch in text.chars() {
        let idx = alphabet.iter().position(|&c| c == ch).unwrap();
        steps.extend([idx, idx, 0]);
    }

    let mut logits = Array2::<f32>::zeros((steps.len(), classes));
    for (t, &idx) in steps.iter().enumerate() {
        logits[[t, idx]] = 10.0;
    }

    let (decoded, confidences) = ctc_decode(logits.view().into_dyn(), &alphabet).unwrap();
    assert_eq!(decoded, text);
    assert_eq!(confidences.len(), 7);
    assert!(confidences.iter().all(|&c| c > 0.99));
}

#[test]
fn test_color_head_decoding() {
    let logits = ndarray::arr2(&[[0.1f32, 5.0, 0.2, 0.3, 0.4]]);
    let (color, conf) = decode_color(logits.view().into_dyn()).unwrap();
    assert_eq!(color, PlateColor::Blue);
    assert!(conf > 0.9);

    let short = ndarray::arr1(&[1.0f32, 2.0]);
    assert!(decode_color(short.view().into_dyn()).is_err());
}

#[test]
fn test_frame_roundtrip_preserves_channel_order() {
    let mut rgb = RgbImage::new(2, 1);
    rgb.put_pixel(0, 0, Rgb([255, 0, 0]));
    let frame = BgrFrame::from_rgb_image(&rgb);
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 255]));
    assert_eq!(frame.to_rgb_image().get_pixel(0, 0), &Rgb([255, 0, 0]));
}
