// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Plate model manager tests
//!
//! Tests marked `#[ignore]` need the exported ONNX models under `weights/`:
//! `cargo test -- --ignored`

use plate_vision::render::{annotate, FontChain, TextOverlay};
use plate_vision::vision::plate::PlatePipeline;
use plate_vision::vision::{decode_image_bytes, BgrFrame, Device, PlateModelConfig, PlateModelManager};
use std::path::PathBuf;
use tempfile::TempDir;

const DETECT_MODEL: &str = "weights/plate_detect.onnx";
const REC_MODEL: &str = "weights/plate_rec_color.onnx";
const SAMPLE_IMAGE: &str = "imgs/single_blue.jpg";

fn cpu_config() -> PlateModelConfig {
    PlateModelConfig {
        detect_model_path: PathBuf::from(DETECT_MODEL),
        rec_model_path: PathBuf::from(REC_MODEL),
        device: Device::Cpu,
        ..Default::default()
    }
}

#[test]
fn test_default_config() {
    let config = PlateModelConfig::default();
    assert!(config.detect_model_path.ends_with("plate_detect.onnx"));
    assert!(config.rec_model_path.ends_with("plate_rec_color.onnx"));
    assert_eq!(config.device, Device::Auto);
    assert_eq!(config.img_size, 640);
}

#[test]
fn test_missing_detection_model() {
    let dir = TempDir::new().unwrap();
    let config = PlateModelConfig {
        detect_model_path: dir.path().join("nope.onnx"),
        ..cpu_config()
    };
    let err = PlateModelManager::load(&config).unwrap_err();
    assert!(err.to_string().contains("Detection model file not found"));
}

#[test]
fn test_missing_recognition_model() {
    let dir = TempDir::new().unwrap();
    let detect = dir.path().join("detect.onnx");
    std::fs::write(&detect, b"placeholder").unwrap();

    let config = PlateModelConfig {
        detect_model_path: detect,
        rec_model_path: dir.path().join("rec.onnx"),
        device: Device::Cpu,
        ..Default::default()
    };
    let err = PlateModelManager::load(&config).unwrap_err();
    assert!(err.to_string().contains("Recognition model file not found"));
}

#[test]
fn test_malformed_model_fails_whole_load() {
    let dir = TempDir::new().unwrap();
    let detect = dir.path().join("detect.onnx");
    let rec = dir.path().join("rec.onnx");
    std::fs::write(&detect, b"not an onnx graph").unwrap();
    std::fs::write(&rec, b"not an onnx graph").unwrap();

    let config = PlateModelConfig {
        detect_model_path: detect,
        rec_model_path: rec,
        device: Device::Cpu,
        ..Default::default()
    };
    assert!(PlateModelManager::load(&config).is_err());
}

#[test]
#[ignore] // Requires exported models in weights/
fn test_load_real_models() {
    let manager = PlateModelManager::load(&cpu_config()).expect("models should load");
    assert!(manager.info().color_head);
    assert_eq!(manager.info().device, "cpu");
}

#[test]
#[ignore] // Requires exported models and a sample image
fn test_recognize_sample_image() {
    let manager = PlateModelManager::load(&cpu_config()).expect("models should load");
    let bytes = std::fs::read(SAMPLE_IMAGE).expect("sample image");
    let (image, _) = decode_image_bytes(&bytes).unwrap();
    let frame = BgrFrame::from(&image);

    let plates = manager.recognizer().detect_recognition_plate(&frame).unwrap();
    assert!(!plates.is_empty(), "expected at least one plate");
    for plate in &plates {
        assert!(plate.detect_conf > 0.3);
        assert!(!plate.plate_no.is_empty());
        assert!(plate.rect[0] <= plate.rect[2] && plate.rect[1] <= plate.rect[3]);
    }

    let overlay = TextOverlay::with_chain(FontChain::embedded().unwrap());
    let annotated = annotate(&frame, &plates, &overlay);
    assert_eq!(
        (annotated.width(), annotated.height()),
        (frame.width(), frame.height())
    );
}

#[test]
#[ignore] // Requires exported models
fn test_blank_image_has_no_plates() {
    let manager = PlateModelManager::load(&cpu_config()).expect("models should load");
    let frame = BgrFrame::filled(640, 480, [255, 255, 255]).unwrap();
    let plates = manager.recognizer().detect_recognition_plate(&frame).unwrap();
    assert!(plates.is_empty());
}
