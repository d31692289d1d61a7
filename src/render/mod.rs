// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Result rendering: plate boxes, landmarks and CJK labels

pub mod annotate;
pub mod text;

pub use annotate::annotate;
pub use text::{put_text, FontChain, FontConfig, FontSource, OverlayError, TextOverlay};
