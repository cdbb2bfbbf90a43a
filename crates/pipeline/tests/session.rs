//! Drawing sessions over synthetic recordings.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use airsketch_common::error::{SketchError, SketchResult};
use airsketch_model::document::SketchDocument;
use airsketch_model::landmark::LandmarkSet;
use airsketch_model::recording::Recording;
use airsketch_model::synthetic::Scenario;
use airsketch_pipeline::{
    replay, DrawingSession, Frame, FrameSource, HandoffMode, LandmarkDetector, ReplaySource,
    SessionConfig, SessionEnd,
};
use airsketch_processing::canvas::CanvasSnapshot;
use airsketch_render::{MemorySink, NullSink, RenderSink};

fn config() -> SessionConfig {
    let mut config = SessionConfig::default();
    config.pipeline.render_timeout_ms = 1_000;
    config
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("airsketch_test_session_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn session(config: SessionConfig, recording: Recording, sink: Box<dyn RenderSink>) -> DrawingSession {
    let (source, detector) = replay(recording, false);
    DrawingSession::new(config, Box::new(source), Box::new(detector), sink).unwrap()
}

fn stroke_indices(snapshot: &CanvasSnapshot) -> Vec<u64> {
    snapshot.strokes.iter().map(|s| s.index).collect()
}

/// Fails after yielding `limit` frames.
struct FailingSource {
    inner: ReplaySource,
    limit: u64,
    yielded: u64,
}

impl FrameSource for FailingSource {
    fn next_frame(&mut self) -> SketchResult<Option<Frame>> {
        if self.yielded == self.limit {
            return Err(SketchError::source("camera unplugged"));
        }
        self.yielded += 1;
        self.inner.next_frame()
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Raises the session stop flag when yielding frame `at`.
struct StoppingSource {
    inner: ReplaySource,
    at: u64,
    stop: Arc<AtomicBool>,
}

impl FrameSource for StoppingSource {
    fn next_frame(&mut self) -> SketchResult<Option<Frame>> {
        let frame = self.inner.next_frame()?;
        if frame.as_ref().is_some_and(|f| f.index == self.at) {
            self.stop.store(true, Ordering::SeqCst);
        }
        Ok(frame)
    }

    fn name(&self) -> &str {
        "stopping"
    }
}

struct BrokenDetector;

impl LandmarkDetector for BrokenDetector {
    fn detect(&mut self, _frame: &Frame) -> SketchResult<Vec<LandmarkSet>> {
        Err(SketchError::detection("model not loaded"))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

struct SlowSink {
    delay: Duration,
}

impl RenderSink for SlowSink {
    fn present(&mut self, _snapshot: &CanvasSnapshot) -> SketchResult<()> {
        std::thread::sleep(self.delay);
        Ok(())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

struct FailingSink;

impl RenderSink for FailingSink {
    fn present(&mut self, _snapshot: &CanvasSnapshot) -> SketchResult<()> {
        Err(SketchError::render("window closed"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[tokio::test]
async fn draw_scenario_produces_one_stroke() {
    let recording = Scenario::Draw.build(30);
    let total = recording.frames.len() as u64;
    let sink = MemorySink::new();
    let handle = sink.handle();

    let mut session = session(config(), recording, Box::new(sink));
    let summary = session.run().await.unwrap();

    assert_eq!(summary.end, SessionEnd::EndOfStream);
    assert_eq!(summary.stats.frames_processed, total);
    assert_eq!(summary.stats.frames_dropped, 0);
    assert_eq!(stroke_indices(&summary.final_snapshot), vec![0]);
    assert!(summary.final_snapshot.strokes[0].points.len() >= 20);
    assert!(summary.final_snapshot.active.is_none());

    // One render per frame plus the final canvas.
    assert_eq!(handle.presented(), total + 1);
    assert_eq!(handle.last(), Some(summary.final_snapshot.clone()));
}

#[tokio::test]
async fn erase_scenario_leaves_an_empty_canvas() {
    let mut session = session(config(), Scenario::Erase.build(30), Box::new(NullSink));
    let summary = session.run().await.unwrap();

    assert!(summary.final_snapshot.strokes.is_empty());
    assert_eq!(summary.final_snapshot.undo_depth, 2);
}

#[tokio::test]
async fn undo_scenario_restores_both_strokes() {
    let mut session = session(config(), Scenario::Undo.build(30), Box::new(NullSink));
    let summary = session.run().await.unwrap();

    assert_eq!(stroke_indices(&summary.final_snapshot), vec![0, 1]);
    assert_eq!(summary.final_snapshot.redo_depth, 0);
    assert!(summary.stats.events_applied > 0);
}

#[tokio::test]
async fn exports_are_written_on_exit() {
    let dir = temp_dir("exports");
    let mut config = config();
    config.export.image = Some(dir.join("final.png"));
    config.export.sketch = Some(dir.join("final.json"));

    let mut session = session(config, Scenario::Draw.build(30), Box::new(NullSink));
    let summary = session.run().await.unwrap();

    let image_path = summary.exported_image.unwrap();
    let img = image::open(&image_path).unwrap();
    assert_eq!((img.width(), img.height()), (1280, 960));

    let doc = SketchDocument::load(summary.saved_sketch.unwrap()).unwrap();
    assert_eq!(doc.name, "final");
    assert_eq!(doc.strokes.len(), 1);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn source_failure_is_fatal_but_keeps_the_canvas() {
    let dir = temp_dir("failure");
    let mut config = config();
    config.export.sketch = Some(dir.join("rescued.json"));

    // Three empty frames, then the hand is drawing by frame 9.
    let (inner, detector) = replay(Scenario::Draw.build(30), false);
    let source = FailingSource {
        inner,
        limit: 20,
        yielded: 0,
    };
    let mut session =
        DrawingSession::new(config, Box::new(source), Box::new(detector), Box::new(NullSink))
            .unwrap();

    let err = session.run().await.unwrap_err();
    assert!(matches!(err, SketchError::Source { .. }));
    assert!(err.is_fatal());
    assert_eq!(session.stats().frames_processed, 20);

    let canvas = session.engine().canvas();
    assert!(canvas.active().is_none());
    assert_eq!(canvas.strokes().len(), 1);

    let doc = SketchDocument::load(dir.join("rescued.json")).unwrap();
    assert_eq!(doc.strokes.len(), 1);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn stop_flag_seals_the_active_stroke() {
    let recording = Scenario::Draw.build(30);
    let total = recording.frames.len() as u64;
    let (inner, detector) = replay(recording, false);
    let stop = Arc::new(AtomicBool::new(false));
    let source = StoppingSource {
        inner,
        at: 20,
        stop: Arc::clone(&stop),
    };

    let mut session =
        DrawingSession::new(config(), Box::new(source), Box::new(detector), Box::new(NullSink))
            .unwrap()
            .with_stop_flag(stop);
    let summary = session.run().await.unwrap();

    assert_eq!(summary.end, SessionEnd::Stopped);
    assert!(summary.stats.frames_processed <= 21);
    assert!(summary.stats.frames_processed < total);
    assert_eq!(summary.final_snapshot.strokes.len(), 1);
    assert!(summary.final_snapshot.active.is_none());
}

#[tokio::test]
async fn stop_before_run_processes_nothing() {
    let mut session = session(config(), Scenario::Draw.build(30), Box::new(NullSink));
    session.stop();
    let summary = session.run().await.unwrap();

    assert_eq!(summary.end, SessionEnd::Stopped);
    assert_eq!(summary.stats.frames_processed, 0);
    assert!(summary.final_snapshot.strokes.is_empty());
}

#[tokio::test]
async fn detection_errors_count_as_no_hand() {
    let recording = Scenario::Draw.build(30);
    let total = recording.frames.len() as u64;
    let (source, _) = replay(recording, false);
    let mut session = DrawingSession::new(
        config(),
        Box::new(source),
        Box::new(BrokenDetector),
        Box::new(NullSink),
    )
    .unwrap();

    let summary = session.run().await.unwrap();
    assert_eq!(summary.end, SessionEnd::EndOfStream);
    assert_eq!(summary.stats.detection_failures, total);
    assert!(summary.final_snapshot.strokes.is_empty());
}

#[tokio::test]
async fn slow_sink_drops_renders_but_not_frames() {
    let recording = Scenario::Draw.build(30);
    let total = recording.frames.len() as u64;
    let mut config = config();
    config.pipeline.render_timeout_ms = 2;

    let sink = SlowSink {
        delay: Duration::from_millis(20),
    };
    let mut session = session(config, recording, Box::new(sink));
    let summary = session.run().await.unwrap();

    assert_eq!(summary.stats.frames_processed, total);
    assert!(summary.stats.renders_dropped > 0);
    assert_eq!(stroke_indices(&summary.final_snapshot), vec![0]);
}

#[tokio::test]
async fn render_errors_do_not_stop_the_session() {
    let recording = Scenario::Draw.build(30);
    let total = recording.frames.len() as u64;
    let mut session = session(config(), recording, Box::new(FailingSink));
    let summary = session.run().await.unwrap();

    assert_eq!(summary.stats.frames_processed, total);
    assert_eq!(summary.stats.render_errors, total + 1);
    assert_eq!(summary.stats.renders_presented, 0);
}

#[tokio::test]
async fn latest_mode_accounts_for_every_frame() {
    let recording = Scenario::Draw.build(30);
    let total = recording.frames.len() as u64;
    let mut config = config();
    config.pipeline.mode = HandoffMode::Latest;

    let sink = SlowSink {
        delay: Duration::from_millis(10),
    };
    let mut session = session(config, recording, Box::new(sink));
    let summary = session.run().await.unwrap();

    // The worker outruns the loop, so most frames are overwritten.
    let stats = &summary.stats;
    assert!(stats.frames_dropped > 0);
    assert_eq!(stats.frames_processed + stats.frames_dropped, total);
}

#[tokio::test]
async fn a_session_runs_only_once() {
    let mut session = session(config(), Scenario::Draw.build(30), Box::new(NullSink));
    session.run().await.unwrap();
    assert!(matches!(
        session.run().await,
        Err(SketchError::Unsupported { .. })
    ));
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let mut config = SessionConfig::default();
    config.gestures.debounce_frames = 0;
    let (source, detector) = replay(Scenario::Draw.build(30), false);
    let result = DrawingSession::new(config, Box::new(source), Box::new(detector), Box::new(NullSink));
    assert!(matches!(result, Err(SketchError::Config { .. })));
}
