//! AirSketch Render Engine
//!
//! Turns canvas snapshots into pixels and hands them to whatever is
//! displaying or persisting the drawing.
//!
//! # Pipeline Architecture
//!
//! ```text
//! CanvasSnapshot ──┐
//!                  ├── Rasterize strokes (round brush stamps)
//! RasterStyle ─────┘         │
//!                            ├── Cursor Overlay
//!                            ▼
//!                     RgbaImage ──┬── RenderSink (preview, memory, null)
//!                                 └── Export (png / jpeg / bmp)
//! ```

pub mod export;
pub mod raster;
pub mod sink;

pub use export::*;
pub use raster::{RasterStyle, Rasterizer};
pub use sink::{MemorySink, MemorySinkHandle, NullSink, PreviewSink, RenderSink};
