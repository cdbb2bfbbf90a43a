//! Drawing session: the frame loop that ties everything together.
//!
//! ```text
//!  detection worker (blocking thread)        frame loop (async)
//!  ┌──────────────────────────────┐          ┌─────────────────────────────┐
//!  │ source.next_frame()          │          │ select primary hand         │
//!  │ detector.detect(&frame)      │ ──slot──▶│ smooth → classify → apply   │
//!  │ drop frame                   │          │ snapshot → render sink      │
//!  └──────────────────────────────┘          └─────────────────────────────┘
//! ```
//!
//! Frames are classified strictly in capture order and one at a time.
//! Only a frame source failure ends the session with an error; render,
//! export, and detection failures are logged and counted.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::{JoinError, JoinHandle};

use airsketch_common::clock::{FpsMeter, FrameBudget, SessionClock};
use airsketch_common::error::{SketchError, SketchResult};
use airsketch_model::landmark::{select_primary_hand, LandmarkSet};
use airsketch_processing::canvas::CanvasSnapshot;
use airsketch_processing::{GestureClassifier, LandmarkSmoother, StrokeEngine};
use airsketch_render::{export_snapshot, RenderSink};

use crate::config::SessionConfig;
use crate::handoff::{handoff, HandoffSender};
use crate::pipeline::{FrameSource, LandmarkDetector, PipelineStats};

/// Why the frame loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The source ran out of frames.
    EndOfStream,
    /// The stop flag was raised.
    Stopped,
    /// The source failed. `run` returns the error after cleanup.
    SourceFailed,
}

impl SessionEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EndOfStream => "end_of_stream",
            Self::Stopped => "stopped",
            Self::SourceFailed => "source_failed",
        }
    }
}

/// Outcome of a completed session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub end: SessionEnd,
    pub stats: PipelineStats,
    pub duration: Duration,
    /// Canvas after the in-progress stroke (if any) was sealed.
    pub final_snapshot: CanvasSnapshot,
    pub exported_image: Option<PathBuf>,
    pub saved_sketch: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct DetectedFrame {
    index: u64,
    timestamp_ns: u64,
    hands: Vec<LandmarkSet>,
    detection_failed: bool,
}

#[derive(Debug, Clone)]
enum WorkerMessage {
    Frame(DetectedFrame),
    /// `frames` is the number of frames the worker pulled from the source.
    End { frames: u64 },
    Failed { message: String, frames: u64 },
}

type SharedSink = Arc<Mutex<Box<dyn RenderSink>>>;

/// One drawing session over one frame source.
pub struct DrawingSession {
    config: SessionConfig,
    source: Option<Box<dyn FrameSource>>,
    detector: Option<Box<dyn LandmarkDetector>>,
    sink: SharedSink,
    sink_name: String,
    stop_flag: Arc<AtomicBool>,
    smoother: LandmarkSmoother,
    classifier: GestureClassifier,
    engine: StrokeEngine,
    stats: PipelineStats,
    pending_render: Option<JoinHandle<SketchResult<()>>>,
}

impl DrawingSession {
    /// Validate the config and assemble the per-frame stages.
    pub fn new(
        config: SessionConfig,
        source: Box<dyn FrameSource>,
        detector: Box<dyn LandmarkDetector>,
        sink: Box<dyn RenderSink>,
    ) -> SketchResult<Self> {
        config.validate()?;
        let classifier = GestureClassifier::new(
            config.gestures.clone(),
            config.canvas.mapping(),
            config.strokes.palette.len(),
        );
        Ok(Self {
            smoother: LandmarkSmoother::new(config.smoothing.clone()),
            engine: StrokeEngine::new(config.strokes.clone()),
            classifier,
            sink_name: sink.name().to_string(),
            sink: Arc::new(Mutex::new(sink)),
            source: Some(source),
            detector: Some(detector),
            stop_flag: Arc::new(AtomicBool::new(false)),
            stats: PipelineStats::default(),
            pending_render: None,
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The canvas owner. Holds the last state even after a failed run.
    pub fn engine(&self) -> &StrokeEngine {
        &self.engine
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Ask the session to stop at the top of the next iteration.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Flag that stops the session when set, usable from other tasks.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    /// Use an externally owned stop flag, e.g. one a signal handler sets.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = flag;
        self
    }

    /// Run the frame loop until the source ends, the session is stopped,
    /// or the source fails.
    ///
    /// On every exit path the in-progress stroke is sealed, the final
    /// canvas is presented, and configured exports are written. A source
    /// failure is returned afterwards.
    pub async fn run(&mut self) -> SketchResult<SessionSummary> {
        let (Some(source), Some(detector)) = (self.source.take(), self.detector.take()) else {
            return Err(SketchError::unsupported("drawing session has already run"));
        };

        let clock = SessionClock::start();
        tracing::info!(
            source = %source.name(),
            detector = %detector.name(),
            sink = %self.sink_name,
            mode = self.config.pipeline.mode.as_str(),
            started_at = clock.epoch_wall(),
            "Drawing session started"
        );

        let (tx, mut rx) = handoff(self.config.pipeline.mode);
        let stop = Arc::clone(&self.stop_flag);
        let worker = tokio::task::spawn_blocking(move || detection_worker(source, detector, tx, stop));

        let mut budget = FrameBudget::new(Duration::from_millis(self.config.pipeline.frame_budget_ms));
        let mut fps = FpsMeter::new(30);
        let mut expected_index = 0u64;
        let mut failure = None;

        let end = loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                break SessionEnd::Stopped;
            }
            let Some(message) = rx.recv().await else {
                // The worker only leaves without a message when stopped.
                break if self.stop_flag.load(Ordering::Relaxed) {
                    SessionEnd::Stopped
                } else {
                    SessionEnd::EndOfStream
                };
            };
            match message {
                WorkerMessage::Frame(frame) => {
                    self.stats.frames_dropped += frame.index.saturating_sub(expected_index);
                    expected_index = frame.index + 1;

                    let started = Instant::now();
                    let index = frame.index;
                    self.process(frame).await;
                    let spent = started.elapsed();
                    if budget.record(spent) {
                        tracing::debug!(
                            frame = index,
                            spent_ms = spent.as_secs_f64() * 1000.0,
                            "Frame over budget"
                        );
                    }
                    fps.tick(clock.elapsed_ns());
                }
                WorkerMessage::End { frames } => {
                    self.stats.frames_dropped += frames.saturating_sub(expected_index);
                    break SessionEnd::EndOfStream;
                }
                WorkerMessage::Failed { message, frames } => {
                    self.stats.frames_dropped += frames.saturating_sub(expected_index);
                    tracing::error!(error = %message, "Frame source failed");
                    failure = Some(SketchError::source(message));
                    break SessionEnd::SourceFailed;
                }
            }
        };

        drop(rx);
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "Detection worker did not exit cleanly");
        }

        self.stats.budget_overruns = budget.overruns();
        self.stats.worst_frame_ms = budget.worst().as_secs_f64() * 1000.0;
        self.stats.fps = fps.fps();

        let summary = self.shutdown(end, clock.elapsed_secs()).await;
        match failure {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    async fn process(&mut self, frame: DetectedFrame) {
        if frame.detection_failed {
            self.stats.detection_failures += 1;
        }
        let hand = select_primary_hand(frame.hands)
            .unwrap_or_else(|| LandmarkSet::no_hand(frame.timestamp_ns));
        let pose = self.smoother.step(&hand);

        for event in self.classifier.step(&pose) {
            let delta = self.engine.apply(&event);
            self.stats.events_applied += 1;
            tracing::debug!(frame = frame.index, event = event.name(), delta = ?delta, "Gesture applied");
        }
        self.stats.frames_processed += 1;

        let snapshot = self
            .engine
            .snapshot()
            .with_cursor(self.classifier.cursor(), self.classifier.state());
        self.render(snapshot).await;
    }

    fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.config.pipeline.render_timeout_ms)
    }

    /// Hand a snapshot to the sink, waiting at most the render timeout.
    /// A render still running from an earlier frame means this one is
    /// dropped.
    async fn render(&mut self, snapshot: CanvasSnapshot) {
        if let Some(pending) = self.pending_render.take() {
            if !pending.is_finished() {
                self.pending_render = Some(pending);
                self.stats.renders_dropped += 1;
                return;
            }
            let joined = pending.await;
            self.settle(joined, false);
        }

        let sink = Arc::clone(&self.sink);
        let mut handle = tokio::task::spawn_blocking(move || present(&sink, &snapshot));
        match tokio::time::timeout(self.render_timeout(), &mut handle).await {
            Ok(joined) => self.settle(joined, true),
            Err(_) => {
                self.stats.renders_dropped += 1;
                tracing::debug!(sink = %self.sink_name, "Render timed out, dropping frame");
                self.pending_render = Some(handle);
            }
        }
    }

    fn settle(&mut self, joined: Result<SketchResult<()>, JoinError>, in_time: bool) {
        match joined {
            Ok(Ok(())) => {
                if in_time {
                    self.stats.renders_presented += 1;
                }
            }
            Ok(Err(e)) => {
                self.stats.render_errors += 1;
                tracing::warn!(sink = %self.sink_name, error = %e, "Render failed, continuing");
            }
            Err(e) => {
                self.stats.render_errors += 1;
                tracing::warn!(sink = %self.sink_name, error = %e, "Render task panicked");
            }
        }
    }

    async fn shutdown(&mut self, end: SessionEnd, elapsed_secs: f64) -> SessionSummary {
        let delta = self.engine.finish();
        if delta.is_visible_change() {
            tracing::info!(delta = ?delta, "Sealed in-progress stroke on shutdown");
        }
        self.classifier.reset();
        self.smoother.reset();

        if let Some(pending) = self.pending_render.take() {
            match tokio::time::timeout(self.render_timeout(), pending).await {
                Ok(joined) => self.settle(joined, false),
                Err(_) => tracing::warn!(sink = %self.sink_name, "Render sink still busy at shutdown"),
            }
        }
        let snapshot = self.engine.snapshot();
        self.render(snapshot.clone()).await;

        let exported_image = self.export_image(&snapshot);
        let saved_sketch = self.save_sketch();

        tracing::info!(
            end = end.as_str(),
            frames = self.stats.frames_processed,
            dropped = self.stats.frames_dropped,
            strokes = snapshot.strokes.len(),
            renders_dropped = self.stats.renders_dropped,
            overruns = self.stats.budget_overruns,
            fps = self.stats.fps,
            "Drawing session finished"
        );

        SessionSummary {
            end,
            stats: self.stats.clone(),
            duration: Duration::from_secs_f64(elapsed_secs),
            final_snapshot: snapshot,
            exported_image,
            saved_sketch,
        }
    }

    fn export_image(&mut self, snapshot: &CanvasSnapshot) -> Option<PathBuf> {
        let path = self.config.export.image.clone()?;
        match export_snapshot(snapshot, &self.config.raster_style(), &path) {
            Ok(written) => Some(written),
            Err(e) => {
                self.stats.render_errors += 1;
                tracing::warn!(path = %path.display(), error = %e, "Image export failed");
                None
            }
        }
    }

    fn save_sketch(&mut self) -> Option<PathBuf> {
        let path = self.config.export.sketch.clone()?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("sketch");
        let canvas = &self.config.canvas;
        let doc = self
            .engine
            .to_document(name, canvas.width, canvas.height, canvas.background);
        match doc.save(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), strokes = doc.strokes.len(), "Saved sketch");
                Some(path)
            }
            Err(e) => {
                self.stats.render_errors += 1;
                tracing::warn!(path = %path.display(), error = %e, "Sketch save failed");
                None
            }
        }
    }
}

fn present(sink: &Mutex<Box<dyn RenderSink>>, snapshot: &CanvasSnapshot) -> SketchResult<()> {
    let mut sink = sink
        .lock()
        .map_err(|_| SketchError::render("render sink lock poisoned"))?;
    sink.present(snapshot)
}

/// Pull frames, detect hands, and push results until the source ends,
/// the loop goes away, or the session is stopped. Frames are dropped here,
/// right after detection.
fn detection_worker(
    mut source: Box<dyn FrameSource>,
    mut detector: Box<dyn LandmarkDetector>,
    tx: HandoffSender<WorkerMessage>,
    stop: Arc<AtomicBool>,
) {
    let mut frames = 0u64;
    while !stop.load(Ordering::Relaxed) {
        let message = match source.next_frame() {
            Ok(Some(frame)) => {
                frames += 1;
                let (hands, detection_failed) = match detector.detect(&frame) {
                    Ok(hands) => (hands, false),
                    Err(e) => {
                        tracing::warn!(frame = frame.index, error = %e, "Detection failed, assuming no hand");
                        (Vec::new(), true)
                    }
                };
                WorkerMessage::Frame(DetectedFrame {
                    index: frame.index,
                    timestamp_ns: frame.timestamp_ns,
                    hands,
                    detection_failed,
                })
            }
            Ok(None) => {
                let _ = tx.send_blocking(WorkerMessage::End { frames });
                return;
            }
            Err(e) => {
                let message = match e {
                    SketchError::Source { message } => message,
                    other => other.to_string(),
                };
                let _ = tx.send_blocking(WorkerMessage::Failed { message, frames });
                return;
            }
        };
        if tx.send_blocking(message).is_err() {
            return;
        }
    }
    tracing::debug!(frames, "Detection worker stopped");
}
