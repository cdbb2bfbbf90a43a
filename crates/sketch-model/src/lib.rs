//! AirSketch Model
//!
//! Defines the data contracts shared by every stage of the
//! gesture-to-stroke pipeline:
//! - **Landmarks:** fixed-shape hand landmark sets and smoothed poses
//! - **Gestures:** classifier states and the events they emit
//! - **Strokes:** canvas-space polylines, colors, and palettes
//! - **Recordings:** JSONL landmark streams used for replay
//! - **Documents:** saved sketches
//!
//! Landmark coordinates are normalized to `[0.0, 1.0]` relative to the
//! camera frame; stroke coordinates are canvas pixels.

pub mod document;
pub mod geometry;
pub mod gesture;
pub mod landmark;
pub mod recording;
pub mod stroke;
pub mod synthetic;

pub use document::*;
pub use geometry::*;
pub use gesture::*;
pub use landmark::*;
pub use recording::*;
pub use stroke::*;
