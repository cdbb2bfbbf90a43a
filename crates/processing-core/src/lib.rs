//! AirSketch Processing Core
//!
//! The per-frame heart of the drawing pipeline:
//! - **Smoothing:** damp landmark jitter (EMA, moving average, One-Euro)
//! - **Shape:** read a hand shape and its anchor from one pose
//! - **Classifier:** debounce shapes into gesture events
//! - **Stroke Engine:** apply gesture events to the canvas, with undo/redo
//!
//! This crate does no I/O and owns no threads or clocks. Inputs and
//! outputs are plain data.

pub mod canvas;
pub mod classifier;
pub mod shape;
pub mod smoothing;
pub mod stroke_engine;

pub use canvas::{Canvas, CanvasSnapshot, Cursor, HistoryEntry};
pub use classifier::{ClassifierConfig, GestureClassifier};
pub use shape::{read_shape, ShapeKind, ShapeReading, ShapeThresholds};
pub use smoothing::{smooth, LandmarkSmoother, SmoothingConfig, SmoothingKind};
pub use stroke_engine::{CanvasDelta, StrokeConfig, StrokeEngine};
