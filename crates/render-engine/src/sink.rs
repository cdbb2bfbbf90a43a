//! Render sinks: where per-frame canvas snapshots go.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use airsketch_common::clock::{RateController, SessionClock};
use airsketch_common::error::SketchResult;
use airsketch_processing::canvas::CanvasSnapshot;

use crate::export::{export_image, ExportFormat};
use crate::raster::{RasterStyle, Rasterizer};

/// Receives one canvas snapshot per processed frame.
///
/// `present` runs off the frame loop and may block; the session gives it
/// a bounded amount of time before dropping the render.
pub trait RenderSink: Send {
    fn present(&mut self, snapshot: &CanvasSnapshot) -> SketchResult<()>;

    /// Sink name for logs.
    fn name(&self) -> &str;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn present(&mut self, _snapshot: &CanvasSnapshot) -> SketchResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    presented: u64,
    last: Option<CanvasSnapshot>,
}

/// Keeps the most recent snapshot in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemoryState>>,
}

/// Read side of a [`MemorySink`] that stays usable after the sink has been
/// moved into a session.
#[derive(Debug, Clone)]
pub struct MemorySinkHandle {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> MemorySinkHandle {
        MemorySinkHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl RenderSink for MemorySink {
    fn present(&mut self, snapshot: &CanvasSnapshot) -> SketchResult<()> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.presented += 1;
        state.last = Some(snapshot.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

impl MemorySinkHandle {
    /// Number of snapshots presented so far.
    pub fn presented(&self) -> u64 {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).presented
    }

    pub fn last(&self) -> Option<CanvasSnapshot> {
        self.state
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .last
            .clone()
    }
}

/// Periodically rewrites a preview image on disk.
#[derive(Debug)]
pub struct PreviewSink {
    rasterizer: Rasterizer,
    path: PathBuf,
    rate: RateController,
    clock: SessionClock,
    written: u64,
}

impl PreviewSink {
    /// Fails early when the path does not name a supported image format.
    pub fn new(path: impl Into<PathBuf>, style: RasterStyle, max_hz: u32) -> SketchResult<Self> {
        let path = path.into();
        ExportFormat::from_path(&path)?;
        Ok(Self {
            rasterizer: Rasterizer::new(style),
            path,
            rate: RateController::new(max_hz),
            clock: SessionClock::start(),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Previews written so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl RenderSink for PreviewSink {
    fn present(&mut self, snapshot: &CanvasSnapshot) -> SketchResult<()> {
        if !self.rate.should_tick(self.clock.elapsed_ns()) {
            return Ok(());
        }
        let img = self.rasterizer.render(snapshot);
        export_image(&img, &self.path)?;
        self.written += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "preview"
    }
}
