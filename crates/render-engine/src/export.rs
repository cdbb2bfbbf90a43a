//! Raster export of canvases and saved sketches.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbaImage};

use airsketch_common::error::{SketchError, SketchResult};
use airsketch_model::document::SketchDocument;
use airsketch_processing::canvas::CanvasSnapshot;

use crate::raster::{RasterStyle, Rasterizer};

/// Image formats the exporter writes, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
    Bmp,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> SketchResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(|| {
                SketchError::export(format!("{} has no file extension", path.display()))
            })?;
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "bmp" => Ok(Self::Bmp),
            other => Err(SketchError::export(format!(
                "unsupported image format '.{other}' (expected png, jpg, or bmp)"
            ))),
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Bmp => ImageFormat::Bmp,
        }
    }

    /// JPEG has no alpha channel.
    fn keeps_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }
}

/// Write an image, creating parent directories as needed.
pub fn export_image(img: &RgbaImage, path: &Path) -> SketchResult<PathBuf> {
    let format = ExportFormat::from_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let result = if format.keeps_alpha() {
        img.save_with_format(path, format.image_format())
    } else {
        DynamicImage::ImageRgba8(img.clone())
            .to_rgb8()
            .save_with_format(path, format.image_format())
    };
    result.map_err(|e| SketchError::export(format!("{}: {e}", path.display())))?;

    tracing::debug!(path = %path.display(), format = ?format, "Image written");
    Ok(path.to_path_buf())
}

/// Rasterize a snapshot without its cursor and write it to `path`.
pub fn export_snapshot(
    snapshot: &CanvasSnapshot,
    style: &RasterStyle,
    path: &Path,
) -> SketchResult<PathBuf> {
    let img = Rasterizer::new(style.clone().with_cursor(false)).render(snapshot);
    let written = export_image(&img, path)?;
    tracing::info!(
        path = %written.display(),
        strokes = snapshot.strokes.len(),
        "Exported canvas"
    );
    Ok(written)
}

/// Re-render a saved sketch to an image file.
pub fn export_document(doc: &SketchDocument, path: &Path) -> SketchResult<PathBuf> {
    let img = Rasterizer::render_document(doc);
    let written = export_image(&img, path)?;
    tracing::info!(
        path = %written.display(),
        name = %doc.name,
        strokes = doc.strokes.len(),
        "Exported sketch"
    );
    Ok(written)
}
