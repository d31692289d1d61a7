// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use image::Rgb;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{create_upload_router, create_widget_router, serve, AppState};
use crate::config::{AppConfig, ServerConfig};
use crate::render::{annotate, FontConfig, TextOverlay};
use crate::storage::UploadStore;
use crate::vision::image_utils::encode_jpeg;
use crate::vision::plate::PlatePipeline;
use crate::vision::{decode_image_bytes, BgrFrame, Device, ImageInput};
use crate::vision::{PlateModelConfig, PlateModelManager};

/// Model loading options
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Plate detection model (ONNX)
    #[arg(long, env = "PLATE_DETECT_MODEL", default_value = "weights/plate_detect.onnx")]
    pub detect_model: PathBuf,

    /// Plate recognition model with color head (ONNX)
    #[arg(long, env = "PLATE_REC_MODEL", default_value = "weights/plate_rec_color.onnx")]
    pub rec_model: PathBuf,

    /// Compute device: auto, cpu, cuda or cuda:N
    #[arg(long, env = "PLATE_DEVICE", default_value = "auto")]
    pub device: String,

    /// Detection input size
    #[arg(long, env = "PLATE_IMG_SIZE", default_value_t = 640)]
    pub img_size: u32,

    /// Detection confidence threshold
    #[arg(long, env = "PLATE_CONF_THRES", default_value_t = 0.3)]
    pub conf_thres: f32,

    /// NMS IoU threshold
    #[arg(long, env = "PLATE_IOU_THRES", default_value_t = 0.5)]
    pub iou_thres: f32,
}

impl ModelArgs {
    pub fn to_config(&self) -> Result<PlateModelConfig> {
        let device: Device = self.device.parse()?;
        Ok(PlateModelConfig {
            detect_model_path: self.detect_model.clone(),
            rec_model_path: self.rec_model.clone(),
            device,
            img_size: self.img_size,
            conf_thres: self.conf_thres,
            iou_thres: self.iou_thres,
        })
    }

    /// Load both models or fail with a message naming the missing piece
    pub fn load(&self) -> Result<PlateModelManager> {
        let config = self.to_config()?;
        PlateModelManager::load(&config).context("Model loading failed")
    }
}

/// Font options
#[derive(Args, Debug, Clone)]
pub struct FontArgs {
    /// TrueType font tried before the system fonts
    #[arg(long, env = "PLATE_FONT", default_value = "fonts/platech.ttf")]
    pub font: PathBuf,

    /// Skip system fonts and fall back straight to the embedded one
    #[arg(long)]
    pub no_system_fonts: bool,
}

impl FontArgs {
    pub fn to_config(&self) -> FontConfig {
        FontConfig {
            bundled_font: self.font.clone(),
            use_system_fonts: !self.no_system_fonts,
        }
    }
}

/// Listener options; unset values take the front-end's defaults
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    #[arg(long, env = "PLATE_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "PLATE_PORT")]
    pub port: Option<u16>,

    /// Directory served at /static
    #[arg(long, env = "PLATE_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Sample images for the component UI
    #[arg(long, env = "PLATE_EXAMPLES_DIR")]
    pub examples_dir: Option<PathBuf>,
}

impl ServerArgs {
    pub fn apply(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = &self.static_dir {
            config.static_dir = dir.clone();
        }
        if let Some(dir) = &self.examples_dir {
            config.examples_dir = Some(dir.clone());
        }
        config
    }
}

/// Arguments for serve and demo
#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub models: ModelArgs,

    #[command(flatten)]
    pub fonts: FontArgs,

    #[command(flatten)]
    pub server: ServerArgs,
}

impl ServeArgs {
    /// Effective configuration on top of a front-end's server defaults
    pub fn to_app_config(&self, defaults: ServerConfig) -> Result<AppConfig> {
        Ok(AppConfig {
            models: self.models.to_config()?,
            server: self.server.apply(defaults),
            fonts: self.fonts.to_config(),
        })
    }
}

/// Arguments for recognize
#[derive(Args, Debug)]
pub struct RecognizeArgs {
    /// Input image
    #[arg(long)]
    pub image: PathBuf,

    /// Annotated output image
    #[arg(long, default_value = "result.jpg")]
    pub output: PathBuf,

    #[command(flatten)]
    pub models: ModelArgs,

    #[command(flatten)]
    pub fonts: FontArgs,
}

/// Arguments for overlay
#[derive(Args, Debug)]
pub struct OverlayArgs {
    /// Input image
    #[arg(long)]
    pub image: PathBuf,

    /// Text to draw
    #[arg(long)]
    pub text: String,

    /// Output image
    #[arg(long)]
    pub output: PathBuf,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub left: i32,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub top: i32,

    /// Font size in pixels
    #[arg(long, default_value_t = 20.0)]
    pub size: f32,

    /// Text color as r,g,b
    #[arg(long, value_delimiter = ',', default_value = "0,255,0")]
    pub color: Vec<u8>,

    #[command(flatten)]
    pub fonts: FontArgs,
}

fn parse_color(values: &[u8]) -> Result<Rgb<u8>> {
    match values {
        [r, g, b] => Ok(Rgb([*r, *g, *b])),
        _ => Err(anyhow!(
            "--color takes three components r,g,b, got {}",
            values.len()
        )),
    }
}

fn build_state(config: &AppConfig) -> Result<AppState> {
    debug!("Effective config: {}", serde_json::to_string(config)?);

    let manager = PlateModelManager::load(&config.models).context("Model loading failed")?;
    let info = manager.info();
    info!(
        "Detection model: {}, recognition model: {} (color head: {})",
        info.detect_model, info.rec_model, info.color_head
    );

    let overlay = TextOverlay::new(&config.fonts)?;
    info!("Labels drawn with {}", overlay.font_source());

    let store = UploadStore::new(&config.server.static_dir);
    store.ensure_dirs()?;

    let pipeline: Arc<dyn PlatePipeline> = manager.recognizer();
    Ok(AppState::new(pipeline, Arc::new(overlay), Arc::new(store))
        .with_examples_dir(config.server.examples_dir.clone()))
}

/// `serve`: upload page with JSON API
pub async fn serve_upload(args: ServeArgs) -> Result<()> {
    let config = args.to_app_config(ServerConfig::default())?;
    let addr = config.server.socket_addr()?;
    let state = build_state(&config).context("Server not started")?;

    println!("🚀 Upload server on http://{}", addr);
    let router = create_upload_router(state, config.server.max_upload_bytes);
    serve(router, addr).await
}

/// `demo`: component-style UI
pub async fn serve_widget(args: ServeArgs) -> Result<()> {
    let config = args.to_app_config(ServerConfig::widget())?;
    let addr = config.server.socket_addr()?;
    let state = build_state(&config).context("Server not started")?;

    if let Some(dir) = &state.examples_dir {
        if !dir.is_dir() {
            warn!("Examples directory {} does not exist", dir.display());
        }
    }

    println!("🚀 Plate recognition UI on http://{}", addr);
    let router = create_widget_router(state, config.server.max_upload_bytes);
    serve(router, addr).await
}

/// `recognize`: one image through the pipeline
pub async fn recognize(args: RecognizeArgs) -> Result<()> {
    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let (image, _) = decode_image_bytes(&bytes)
        .with_context(|| format!("Failed to decode {}", args.image.display()))?;

    let manager = args.models.load()?;
    let overlay = TextOverlay::new(&args.fonts.to_config())?;
    let pipeline = manager.recognizer();

    let frame = BgrFrame::from(&image);
    let (plates, annotated) = tokio::task::spawn_blocking(move || {
        let plates = pipeline.detect_recognition_plate(&frame)?;
        let annotated = annotate(&frame, &plates, &overlay);
        Ok::<_, anyhow::Error>((plates, annotated))
    })
    .await??;

    std::fs::write(&args.output, encode_jpeg(&annotated)?)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Annotated image written to {}", args.output.display());

    println!("{}", serde_json::to_string_pretty(&plates)?);
    Ok(())
}

/// `overlay`: draw text without any model
pub fn overlay(args: OverlayArgs) -> Result<()> {
    let color = parse_color(&args.color)?;
    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let (image, _) = decode_image_bytes(&bytes)
        .with_context(|| format!("Failed to decode {}", args.image.display()))?;

    let input = ImageInput::Rgb(image.to_rgb8());
    let frame = crate::render::put_text(
        input,
        &args.text,
        args.left,
        args.top,
        color,
        args.size,
        &args.fonts.to_config(),
    );

    frame
        .to_rgb_image()
        .save(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("✅ Wrote {}", args.output.display());
    Ok(())
}
