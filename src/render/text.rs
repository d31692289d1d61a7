// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Unicode text overlay with a font fallback chain
//!
//! Fonts are tried in order: the bundled TrueType file, the operating
//! system's CJK-capable fonts, then a font compiled into the binary.
//! Overlay is best-effort: [`put_text`] and [`TextOverlay::put_text`]
//! return the input unchanged when anything goes wrong.

use ab_glyph::{FontArc, FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::vision::frame::{BgrFrame, ImageInput};

/// Font compiled into the binary, used when no file candidate loads
static EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Largest font size accepted by the overlay
pub const MAX_FONT_SIZE: f32 = 1024.0;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Invalid font size: {0}")]
    InvalidFontSize(f32),

    #[error("Failed to read font {path}: {source}")]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse font {0}")]
    FontParse(String),
}

/// Font lookup configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontConfig {
    /// First candidate, shipped alongside the binary
    pub bundled_font: PathBuf,
    /// Whether OS font directories are searched after the bundled font
    pub use_system_fonts: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            bundled_font: PathBuf::from("fonts/platech.ttf"),
            use_system_fonts: true,
        }
    }
}

/// System fonts tried for `os` (values of `std::env::consts::OS`)
pub fn system_font_candidates_for(os: &str) -> Vec<PathBuf> {
    let paths: &[&str] = match os {
        "windows" => &[
            "C:/Windows/Fonts/msyh.ttc",
            "C:/Windows/Fonts/simhei.ttf",
            "C:/Windows/Fonts/simsun.ttc",
            "C:/Windows/Fonts/arial.ttf",
        ],
        "macos" => &[
            "/System/Library/Fonts/PingFang.ttc",
            "/System/Library/Fonts/Arial.ttf",
        ],
        _ => &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        ],
    };
    paths.iter().map(PathBuf::from).collect()
}

/// System fonts tried on the current platform
pub fn system_font_candidates() -> Vec<PathBuf> {
    system_font_candidates_for(std::env::consts::OS)
}

/// Where the active font came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    Bundled(PathBuf),
    System(PathBuf),
    Embedded,
}

impl fmt::Display for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontSource::Bundled(p) => write!(f, "bundled font {}", p.display()),
            FontSource::System(p) => write!(f, "system font {}", p.display()),
            FontSource::Embedded => write!(f, "embedded font"),
        }
    }
}

/// Read a font file; collections (`.ttc`) use their first face
pub fn load_font_file(path: &Path) -> Result<FontArc, OverlayError> {
    let data = std::fs::read(path).map_err(|source| OverlayError::FontRead {
        path: path.to_path_buf(),
        source,
    })?;
    let font = FontVec::try_from_vec_and_index(data, 0)
        .map_err(|_| OverlayError::FontParse(path.display().to_string()))?;
    Ok(FontArc::new(font))
}

/// The resolved font and its origin
#[derive(Clone)]
pub struct FontChain {
    font: FontArc,
    source: FontSource,
}

impl fmt::Debug for FontChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontChain")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl FontChain {
    /// First candidate that exists and parses wins
    pub fn resolve(config: &FontConfig) -> Result<Self, OverlayError> {
        let mut candidates = vec![(config.bundled_font.clone(), true)];
        if config.use_system_fonts {
            candidates.extend(system_font_candidates().into_iter().map(|p| (p, false)));
        }

        for (path, bundled) in candidates {
            if !path.exists() {
                continue;
            }
            match load_font_file(&path) {
                Ok(font) => {
                    let source = if bundled {
                        FontSource::Bundled(path)
                    } else {
                        FontSource::System(path)
                    };
                    debug!("Using {}", source);
                    return Ok(Self { font, source });
                }
                Err(e) => warn!("Skipping font candidate: {}", e),
            }
        }

        Self::embedded()
    }

    pub fn embedded() -> Result<Self, OverlayError> {
        let font = FontArc::try_from_slice(EMBEDDED_FONT)
            .map_err(|_| OverlayError::FontParse("embedded font".to_string()))?;
        Ok(Self {
            font,
            source: FontSource::Embedded,
        })
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    pub fn source(&self) -> &FontSource {
        &self.source
    }
}

/// Draws text with a resolved font
#[derive(Debug, Clone)]
pub struct TextOverlay {
    chain: FontChain,
}

impl TextOverlay {
    pub fn new(config: &FontConfig) -> Result<Self, OverlayError> {
        Ok(Self {
            chain: FontChain::resolve(config)?,
        })
    }

    pub fn with_chain(chain: FontChain) -> Self {
        Self { chain }
    }

    pub fn font_source(&self) -> &FontSource {
        self.chain.source()
    }

    /// Width and height of `text` rendered at `size` pixels
    pub fn measure(&self, text: &str, size: f32) -> Result<(u32, u32), OverlayError> {
        let scale = checked_scale(size)?;
        Ok(text_size(scale, self.chain.font(), text))
    }

    /// Draw `text` with its top-left corner at (`left`, `top`)
    pub fn draw(
        &self,
        image: &mut RgbImage,
        text: &str,
        left: i32,
        top: i32,
        color: Rgb<u8>,
        size: f32,
    ) -> Result<(), OverlayError> {
        let scale = checked_scale(size)?;
        // Nothing can land on the canvas past its right or bottom edge
        let past_right = i64::from(left) >= i64::from(image.width());
        let past_bottom = i64::from(top) >= i64::from(image.height());
        if past_right || past_bottom {
            return Ok(());
        }
        draw_text_mut(image, color, left, top, scale, self.chain.font(), text);
        Ok(())
    }

    /// Best-effort overlay on either representation, returning a BGR frame
    ///
    /// On failure the input comes back unmodified.
    pub fn put_text(
        &self,
        input: ImageInput,
        text: &str,
        left: i32,
        top: i32,
        color: Rgb<u8>,
        size: f32,
    ) -> BgrFrame {
        let mut image = input.into_rgb();
        if let Err(e) = self.draw(&mut image, text, left, top, color, size) {
            warn!("Text overlay skipped: {}", e);
        }
        BgrFrame::from_rgb_image(&image)
    }
}

fn checked_scale(size: f32) -> Result<PxScale, OverlayError> {
    if !size.is_finite() || size <= 0.0 || size > MAX_FONT_SIZE {
        return Err(OverlayError::InvalidFontSize(size));
    }
    Ok(PxScale::from(size))
}

/// Resolve fonts per `config` and draw `text` onto `input`
///
/// Never fails: any error leaves the image unmodified (converted to BGR).
pub fn put_text(
    input: ImageInput,
    text: &str,
    left: i32,
    top: i32,
    color: Rgb<u8>,
    size: f32,
    config: &FontConfig,
) -> BgrFrame {
    match TextOverlay::new(config) {
        Ok(overlay) => overlay.put_text(input, text, left, top, color, size),
        Err(e) => {
            warn!("Text overlay unavailable: {}", e);
            input.into_bgr()
        }
    }
}
