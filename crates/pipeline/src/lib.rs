//! AirSketch Frame Pipeline
//!
//! Drives a drawing session frame by frame:
//! capture → detect → smooth → classify → mutate canvas → render.
//!
//! The source and detector run on a blocking worker thread; everything
//! that touches the canvas runs on the session's task, one frame at a time.

pub mod config;
pub mod handoff;
pub mod pipeline;
pub mod replay;
pub mod session;

pub use config::{CanvasConfig, ExportConfig, PipelineConfig, SessionConfig};
pub use handoff::HandoffMode;
pub use pipeline::{Frame, FrameSource, LandmarkDetector, PipelineStats};
pub use replay::{load_recording, replay, ReplayDetector, ReplaySource};
pub use session::{DrawingSession, SessionEnd, SessionSummary};
