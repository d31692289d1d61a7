// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server configuration

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use crate::render::text::FontConfig;
use crate::vision::image_utils::MAX_IMAGE_SIZE;
use crate::vision::model_manager::PlateModelConfig;

/// Default port of the upload server
pub const UPLOAD_SERVER_PORT: u16 = 5000;

/// Default port of the widget UI
pub const WIDGET_SERVER_PORT: u16 = 7860;

/// HTTP server settings shared by both front-ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Served at `/static`; uploads and results live underneath
    pub static_dir: PathBuf,
    /// Sample images offered by the widget UI
    pub examples_dir: Option<PathBuf>,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: UPLOAD_SERVER_PORT,
            static_dir: PathBuf::from("static"),
            examples_dir: None,
            max_upload_bytes: MAX_IMAGE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Defaults for the widget UI
    pub fn widget() -> Self {
        Self {
            port: WIDGET_SERVER_PORT,
            examples_dir: Some(PathBuf::from("imgs")),
            ..Default::default()
        }
    }

    /// Listen address; host names such as `localhost` are resolved
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .with_context(|| format!("Invalid listen address {}", addr))?
            .next()
            .ok_or_else(|| anyhow::anyhow!("Invalid listen address {}: no addresses", addr))
    }
}

/// Everything needed to start a front-end
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub models: PlateModelConfig,
    pub server: ServerConfig,
    pub fonts: FontConfig,
}
