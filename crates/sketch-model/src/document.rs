//! Saved sketches (`*.sketch.json`).
//!
//! A document is the persisted form of a canvas: its sealed strokes in
//! creation order plus enough metadata to re-render it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::stroke::{Rgba, Stroke};

pub const DOCUMENT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SketchDocument {
    /// Schema version.
    pub version: String,

    /// Human-readable name.
    pub name: String,

    /// Creation timestamp (RFC 3339).
    pub created_at: String,

    /// Last modified timestamp (RFC 3339).
    pub modified_at: String,

    /// Canvas size in pixels.
    pub width: u32,
    pub height: u32,

    #[serde(default = "default_background")]
    pub background: Rgba,

    /// Sealed strokes, oldest first.
    #[serde(default)]
    pub strokes: Vec<Stroke>,
}

fn default_background() -> Rgba {
    Rgba::WHITE
}

impl SketchDocument {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: DOCUMENT_VERSION.to_string(),
            name: name.into(),
            created_at: now.clone(),
            modified_at: now,
            width,
            height,
            background: default_background(),
            strokes: vec![],
        }
    }

    pub fn with_strokes(mut self, strokes: Vec<Stroke>) -> Self {
        self.strokes = strokes;
        self
    }

    pub fn with_background(mut self, background: Rgba) -> Self {
        self.background = background;
        self
    }

    pub fn touch(&mut self) {
        self.modified_at = chrono::Utc::now().to_rfc3339();
    }

    /// Total number of stroke points.
    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(|s| s.points.len()).sum()
    }

    /// Index the next sealed stroke should receive.
    pub fn next_index(&self) -> u64 {
        self.strokes.iter().map(|s| s.index + 1).max().unwrap_or(0)
    }

    /// Check structural invariants after loading.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.width == 0 || self.height == 0 {
            return Err(DocumentError::ValidationError {
                message: format!("canvas size {}x{} is empty", self.width, self.height),
            });
        }
        for pair in self.strokes.windows(2) {
            if pair[1].index <= pair[0].index {
                return Err(DocumentError::ValidationError {
                    message: format!(
                        "stroke indices out of order: {} follows {}",
                        pair[1].index, pair[0].index
                    ),
                });
            }
        }
        if let Some(bad) = self.strokes.iter().find(|s| s.points.is_empty()) {
            return Err(DocumentError::ValidationError {
                message: format!("stroke {} has no points", bad.index),
            });
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DocumentError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: SketchDocument =
            serde_json::from_str(&json).map_err(|source| DocumentError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DocumentError::IoError {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| DocumentError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| DocumentError::IoError {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid sketch: {message}")]
    ValidationError { message: String },
}
