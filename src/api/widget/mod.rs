// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Component-style browser UI front-end

pub mod handler;
pub mod response;

pub use handler::{examples_handler, recognize_handler};
pub use response::{summary_text, ExampleImage, RecognizeResponse};
