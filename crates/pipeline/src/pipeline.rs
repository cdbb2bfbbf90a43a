//! Capture and detection contracts for the frame pipeline.
//!
//! A session pulls [`Frame`]s from a [`FrameSource`] and turns each one
//! into hand landmarks with a [`LandmarkDetector`]. Both run on the
//! detection worker thread, so they only need to be `Send`.

use airsketch_common::error::SketchResult;
use airsketch_model::landmark::LandmarkSet;

/// One captured image. Owned by the pipeline for a single pass and
/// dropped once landmarks have been extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Position in capture order, starting at 0.
    pub index: u64,

    /// Capture time (ns since the source started).
    pub timestamp_ns: u64,

    pub width: u32,
    pub height: u32,

    /// Packed RGB8 pixels. May be empty for sources that carry no image,
    /// such as landmark replays.
    pub pixels: Vec<u8>,
}

impl Frame {
    /// A frame with no pixel payload.
    pub fn empty(index: u64, timestamp_ns: u64, width: u32, height: u32) -> Self {
        Self {
            index,
            timestamp_ns,
            width,
            height,
            pixels: Vec::new(),
        }
    }

    pub fn has_pixels(&self) -> bool {
        !self.pixels.is_empty()
    }
}

/// Produces frames in capture order.
///
/// `Ok(None)` means end of stream. An `Err` is fatal to the session.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> SketchResult<Option<Frame>>;

    /// Source name for logs.
    fn name(&self) -> &str;
}

/// Finds hands in a frame.
///
/// Returning no sets is a normal "no hand" result, not an error.
pub trait LandmarkDetector: Send {
    fn detect(&mut self, frame: &Frame) -> SketchResult<Vec<LandmarkSet>>;

    /// Detector name for logs.
    fn name(&self) -> &str;
}

/// Runtime statistics from a drawing session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    /// Frames that went through classification.
    pub frames_processed: u64,

    /// Frames the detection handoff overwrote before they were consumed.
    pub frames_dropped: u64,

    /// Frames where the detector failed and no hand was assumed.
    pub detection_failures: u64,

    /// Gesture events applied to the canvas.
    pub events_applied: u64,

    /// Snapshots handed to the render sink.
    pub renders_presented: u64,

    /// Renders skipped because the sink was still busy or timed out.
    pub renders_dropped: u64,

    /// Render or export calls that returned an error.
    pub render_errors: u64,

    /// Frames whose processing exceeded the frame budget.
    pub budget_overruns: u64,

    /// Longest frame processing time in milliseconds.
    pub worst_frame_ms: f64,

    /// Processing rate over the most recent frames.
    pub fps: f64,
}

impl PipelineStats {
    /// Drop rate as a percentage.
    pub fn drop_rate(&self) -> f64 {
        let total = self.frames_processed + self.frames_dropped;
        if total == 0 {
            return 0.0;
        }
        self.frames_dropped as f64 / total as f64 * 100.0
    }
}
