// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload and result files on disk
//!
//! The upload server keeps originals under `static/uploads` and annotated
//! results under `static/results`, both served from `/static`. The widget
//! UI only needs the upload for the length of one request and uses
//! [`TempImage`].

use anyhow::{Context, Result};
use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::vision::frame::BgrFrame;
use crate::vision::image_utils::encode_jpeg;

/// Extensions accepted by the upload form
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Lower-cased extension of `filename`, if any
pub fn file_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether the filename carries an allowed image extension
pub fn allowed_file(filename: &str) -> bool {
    file_extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Reduce a client-supplied filename to a safe ASCII name
///
/// Path separators and whitespace become `_`, characters outside
/// `[A-Za-z0-9_.-]` are dropped and leading/trailing `.`/`_` are stripped.
/// When nothing usable with an extension remains, `upload.<ext>` is used.
pub fn secure_filename(filename: &str) -> String {
    let joined = filename
        .replace(['/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');

    if cleaned.contains('.') {
        return cleaned.to_string();
    }

    match file_extension(filename) {
        Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric()) => format!("upload.{}", ext),
        _ if !cleaned.is_empty() => cleaned.to_string(),
        _ => "upload".to_string(),
    }
}

/// A file written under the static directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: PathBuf,
    /// Public URL, e.g. `/static/results/result_1735732800_ab12cd34.jpg`
    pub url: String,
}

/// Layout of the static directory
#[derive(Debug, Clone)]
pub struct UploadStore {
    static_dir: PathBuf,
    uploads_dir: PathBuf,
    results_dir: PathBuf,
}

impl UploadStore {
    pub const UPLOADS: &'static str = "uploads";
    pub const RESULTS: &'static str = "results";

    pub fn new<P: AsRef<Path>>(static_dir: P) -> Self {
        let static_dir = static_dir.as_ref().to_path_buf();
        Self {
            uploads_dir: static_dir.join(Self::UPLOADS),
            results_dir: static_dir.join(Self::RESULTS),
            static_dir,
        }
    }

    /// Create the upload and result directories
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.uploads_dir, &self.results_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Unix seconds
    fn timestamp() -> i64 {
        Utc::now().timestamp()
    }

    fn stored(&self, sub: &str, name: String) -> StoredFile {
        let dir = if sub == Self::UPLOADS {
            &self.uploads_dir
        } else {
            &self.results_dir
        };
        StoredFile {
            path: dir.join(&name),
            url: format!("/static/{}/{}", sub, name),
        }
    }

    /// Save the original upload as `<timestamp>_<secure name>`
    pub async fn save_upload(&self, filename: &str, bytes: &[u8]) -> Result<StoredFile> {
        let name = format!("{}_{}", Self::timestamp(), secure_filename(filename));
        let file = self.stored(Self::UPLOADS, name);

        tokio::fs::write(&file.path, bytes)
            .await
            .with_context(|| format!("Failed to write upload {}", file.path.display()))?;
        debug!("Saved upload to {}", file.path.display());
        Ok(file)
    }

    /// Save an annotated frame as `result_<timestamp>_<id>.jpg`
    pub async fn save_result(&self, frame: &BgrFrame) -> Result<StoredFile> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let name = format!("result_{}_{}.jpg", Self::timestamp(), &id[..8]);
        let file = self.stored(Self::RESULTS, name);

        let jpeg = encode_jpeg(frame)?;
        tokio::fs::write(&file.path, jpeg)
            .await
            .with_context(|| format!("Failed to write result {}", file.path.display()))?;
        debug!("Saved result to {}", file.path.display());
        Ok(file)
    }
}

/// An uploaded image persisted for one request, deleted on drop
#[derive(Debug)]
pub struct TempImage {
    file: NamedTempFile,
}

impl TempImage {
    /// Write `bytes` to a fresh temporary file ending in `.<ext>`
    pub fn persist(bytes: &[u8], ext: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("plate_")
            .suffix(&format!(".{}", ext))
            .tempfile()
            .context("Failed to create temporary image file")?;
        file.write_all(bytes)
            .context("Failed to write temporary image file")?;
        file.flush().context("Failed to flush temporary image file")?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(self.path())
            .with_context(|| format!("Failed to read {}", self.path().display()))
    }
}
