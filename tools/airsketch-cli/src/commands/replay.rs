//! Run a drawing session over a landmark recording.

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use anyhow::Context;
use clap::Args;

use airsketch_common::config::AppConfig;
use airsketch_pipeline::{load_recording, replay, DrawingSession, HandoffMode, SessionConfig};
use airsketch_render::{NullSink, PreviewSink, RenderSink};

#[derive(Debug, Args)]
pub struct ReplayOptions {
    /// Session config file (JSON); defaults apply to missing fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Detection handoff: ordered|latest
    #[arg(long)]
    mode: Option<HandoffMode>,

    /// Write the final canvas to this image (png, jpg, or bmp)
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Save the sealed strokes as a sketch document
    #[arg(long)]
    save_sketch: Option<PathBuf>,

    /// Keep rewriting a live preview image while replaying
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Maximum preview rewrites per second
    #[arg(long, default_value = "10")]
    preview_hz: u32,

    /// Replay at the recorded frame rate instead of as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Frames a gesture must persist before it takes effect
    #[arg(short = 'N', long)]
    debounce: Option<u32>,

    /// Frames an undo/redo gesture must be held
    #[arg(long)]
    history: Option<u32>,

    /// Smoothing weight of the current frame, in (0, 1]
    #[arg(long)]
    alpha: Option<f64>,

    /// Erase radius in canvas pixels
    #[arg(long)]
    erase_radius: Option<f64>,
}

impl ReplayOptions {
    /// Command-line flags win over file values.
    fn apply(&self, config: &mut SessionConfig) {
        if let Some(mode) = self.mode {
            config.pipeline.mode = mode;
        }
        if let Some(path) = &self.export {
            config.export.image = Some(path.clone());
        }
        if let Some(path) = &self.save_sketch {
            config.export.sketch = Some(path.clone());
        }
        if let Some(n) = self.debounce {
            config.gestures.debounce_frames = n;
        }
        if let Some(m) = self.history {
            config.gestures.history_frames = m;
        }
        if let Some(alpha) = self.alpha {
            config.smoothing.alpha = alpha;
        }
        if let Some(radius) = self.erase_radius {
            config.strokes.erase_radius = radius;
        }
    }
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<SessionConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| AppConfig::load().session_config);
    match path {
        Some(path) => SessionConfig::from_file(&path)
            .with_context(|| format!("Failed to load session config {}", path.display())),
        None => Ok(SessionConfig::default()),
    }
}

pub async fn run(recording_path: PathBuf, options: ReplayOptions) -> anyhow::Result<()> {
    let mut config = load_config(options.config.as_deref())?;
    options.apply(&mut config);
    config.validate()?;

    let recording = load_recording(&recording_path)
        .with_context(|| format!("Failed to load recording {}", recording_path.display()))?;

    println!("Replaying: {}", recording_path.display());
    println!(
        "  Frames: {} ({} with hands)",
        recording.frames.len(),
        recording.frames_with_hands()
    );
    println!(
        "  Source: {}x{} @ {}fps",
        recording.header.frame_width, recording.header.frame_height, recording.header.fps
    );
    println!(
        "  Canvas: {}x{}",
        config.canvas.width, config.canvas.height
    );
    println!("  Mode: {}", config.pipeline.mode.as_str());
    println!();

    let sink: Box<dyn RenderSink> = match &options.preview {
        Some(path) => Box::new(PreviewSink::new(
            path.clone(),
            config.raster_style(),
            options.preview_hz,
        )?),
        None => Box::new(NullSink),
    };

    let (source, detector) = replay(recording, options.realtime);
    let mut session = DrawingSession::new(config, Box::new(source), Box::new(detector), sink)?;

    let stop = session.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Stop requested");
            stop.store(true, Ordering::SeqCst);
        }
    });

    let summary = session.run().await?;
    let stats = &summary.stats;

    println!("Session finished ({})", summary.end.as_str());
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!(
        "  Frames: {} processed, {} dropped ({:.1}%)",
        stats.frames_processed,
        stats.frames_dropped,
        stats.drop_rate()
    );
    println!("  Events: {}", stats.events_applied);
    println!(
        "  Renders: {} presented, {} dropped, {} failed",
        stats.renders_presented, stats.renders_dropped, stats.render_errors
    );
    println!(
        "  Budget overruns: {} (worst {:.1}ms)",
        stats.budget_overruns, stats.worst_frame_ms
    );
    println!("  Effective FPS: {:.1}", stats.fps);
    println!(
        "  Strokes: {} ({} points)",
        summary.final_snapshot.strokes.len(),
        summary.final_snapshot.point_count()
    );
    if let Some(path) = &summary.exported_image {
        println!("  Image: {}", path.display());
    }
    if let Some(path) = &summary.saved_sketch {
        println!("  Sketch: {}", path.display());
    }

    Ok(())
}
