// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Compute device selection and ONNX Runtime session construction

use anyhow::{Context, Result};
use ort::execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Where inference runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    /// GPU when the CUDA provider registers, CPU otherwise
    #[default]
    Auto,
    Cpu,
    Cuda(i32),
}

impl Device {
    /// Execution providers in registration order. ONNX Runtime skips
    /// providers that fail to register, so CPU is always last.
    pub fn execution_providers(&self) -> Vec<ExecutionProviderDispatch> {
        let mut providers = Vec::new();
        match self {
            Device::Cpu => {}
            Device::Auto => push_cuda(&mut providers, 0),
            Device::Cuda(id) => push_cuda(&mut providers, *id),
        }
        providers.push(CPUExecutionProvider::default().build());
        providers
    }

    /// Where inference will actually run, for logs
    pub fn describe(&self) -> String {
        match self {
            Device::Cpu => "CPU".to_string(),
            Device::Auto | Device::Cuda(_) => {
                let id = match self {
                    Device::Cuda(id) => *id,
                    _ => 0,
                };
                if cuda_available() {
                    format!("CUDA device {}", id)
                } else {
                    "CPU (CUDA unavailable)".to_string()
                }
            }
        }
    }
}

#[cfg(feature = "cuda")]
fn push_cuda(providers: &mut Vec<ExecutionProviderDispatch>, device_id: i32) {
    use ort::execution_providers::CUDAExecutionProvider;
    providers.push(
        CUDAExecutionProvider::default()
            .with_device_id(device_id)
            .build(),
    );
}

#[cfg(feature = "cuda")]
fn cuda_available() -> bool {
    use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
    CUDAExecutionProvider::default().is_available().unwrap_or(false)
}

#[cfg(not(feature = "cuda"))]
fn cuda_available() -> bool {
    false
}

#[cfg(not(feature = "cuda"))]
fn push_cuda(_providers: &mut Vec<ExecutionProviderDispatch>, device_id: i32) {
    tracing::debug!(
        "CUDA device {} requested but built without the `cuda` feature, using CPU",
        device_id
    );
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Auto => write!(f, "auto"),
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(id) => write!(f, "cuda:{}", id),
        }
    }
}

impl FromStr for Device {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "auto" | "" => Ok(Device::Auto),
            "cpu" => Ok(Device::Cpu),
            "cuda" | "gpu" => Ok(Device::Cuda(0)),
            other => {
                let id = other
                    .strip_prefix("cuda:")
                    .ok_or_else(|| anyhow::anyhow!("unknown device '{}'", other))?;
                let id = id
                    .parse::<i32>()
                    .with_context(|| format!("invalid CUDA device id '{}'", id))?;
                Ok(Device::Cuda(id))
            }
        }
    }
}

/// Load an ONNX model onto `device`
///
/// # Errors
/// - Model file not found
/// - ONNX Runtime rejects the file
pub fn load_session(model_path: &Path, device: Device, label: &str) -> Result<Session> {
    if !model_path.exists() {
        anyhow::bail!("{} model not found: {}", label, model_path.display());
    }

    info!(
        "Loading {} model from {} (device: {})",
        label,
        model_path.display(),
        device.describe()
    );

    if matches!(device, Device::Cuda(_)) && !cuda_available() {
        warn!("{} model: CUDA requested but unavailable, running on CPU", label);
    }

    let session = Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers(device.execution_providers())
        .context("Failed to set execution providers")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(4)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .context(format!(
            "Failed to load {} model from {}",
            label,
            model_path.display()
        ))?;

    Ok(session)
}
