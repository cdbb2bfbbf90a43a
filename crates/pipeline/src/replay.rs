//! Landmark recordings as a frame source.
//!
//! A recording already holds detector output, so replay is split into a
//! source that yields image-less frames in recorded order and a detector
//! that hands back the hands recorded for each frame index.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use airsketch_common::error::{SketchError, SketchResult};
use airsketch_model::landmark::LandmarkSet;
use airsketch_model::recording::{RecordedFrame, Recording, RecordingHeader};

use crate::pipeline::{Frame, FrameSource, LandmarkDetector};

/// Load a recording from disk.
pub fn load_recording(path: &Path) -> SketchResult<Recording> {
    if !path.exists() {
        return Err(SketchError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Recording::load(path).map_err(|e| SketchError::recording(e.to_string()))
}

/// Build the source/detector pair for a recording.
pub fn replay(recording: Recording, realtime: bool) -> (ReplaySource, ReplayDetector) {
    let frames: Arc<[RecordedFrame]> = recording.frames.into();
    let source = ReplaySource {
        header: recording.header,
        frames: Arc::clone(&frames),
        next: 0,
        realtime,
        started: None,
    };
    (source, ReplayDetector { frames })
}

/// Yields one frame per recorded line.
#[derive(Debug)]
pub struct ReplaySource {
    header: RecordingHeader,
    frames: Arc<[RecordedFrame]>,
    next: usize,
    realtime: bool,
    started: Option<Instant>,
}

impl ReplaySource {
    pub fn header(&self) -> &RecordingHeader {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Sleep until the frame's recorded offset has elapsed.
    fn pace(&mut self, timestamp_ns: u64) {
        let first_ns = self.frames.first().map_or(0, |f| f.t);
        let started = *self.started.get_or_insert_with(Instant::now);
        let due = started + Duration::from_nanos(timestamp_ns.saturating_sub(first_ns));
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> SketchResult<Option<Frame>> {
        let Some(recorded) = self.frames.get(self.next) else {
            return Ok(None);
        };
        let timestamp_ns = recorded.t;
        let frame = Frame::empty(
            self.next as u64,
            timestamp_ns,
            self.header.frame_width,
            self.header.frame_height,
        );
        self.next += 1;
        if self.realtime {
            self.pace(timestamp_ns);
        }
        Ok(Some(frame))
    }

    fn name(&self) -> &str {
        if self.header.source.is_empty() {
            "replay"
        } else {
            &self.header.source
        }
    }
}

/// Returns the hands recorded for a frame.
#[derive(Debug, Clone)]
pub struct ReplayDetector {
    frames: Arc<[RecordedFrame]>,
}

impl LandmarkDetector for ReplayDetector {
    fn detect(&mut self, frame: &Frame) -> SketchResult<Vec<LandmarkSet>> {
        let recorded = self.frames.get(frame.index as usize).ok_or_else(|| {
            SketchError::detection(format!(
                "frame {} is not in the recording ({} frames)",
                frame.index,
                self.frames.len()
            ))
        })?;
        Ok(recorded
            .hands
            .iter()
            .cloned()
            .map(|mut hand| {
                if hand.timestamp_ns == 0 {
                    hand.timestamp_ns = recorded.t;
                }
                hand
            })
            .collect())
    }

    fn name(&self) -> &str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airsketch_model::geometry::Point2D;
    use airsketch_model::synthetic::{HandShape, ScriptBuilder};

    fn recording() -> Recording {
        ScriptBuilder::new(30)
            .hold(HandShape::Pointing, Point2D::new(0.5, 0.5), 3)
            .absent(2)
            .build()
    }

    #[test]
    fn test_source_yields_every_frame_in_order() {
        let (mut source, _) = replay(recording(), false);
        assert_eq!(source.len(), 5);

        let mut indices = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            assert!(!frame.has_pixels());
            indices.push(frame.index);
        }
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_detector_returns_recorded_hands() {
        let (mut source, mut detector) = replay(recording(), false);
        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(detector.detect(&first).unwrap().len(), 1);

        let mut last = first;
        while let Some(frame) = source.next_frame().unwrap() {
            last = frame;
        }
        assert!(detector.detect(&last).unwrap().is_empty());

        let missing = Frame::empty(99, 0, 640, 480);
        assert!(matches!(
            detector.detect(&missing),
            Err(SketchError::Detection { .. })
        ));
    }

    #[test]
    fn test_load_recording_errors() {
        let dir = std::env::temp_dir().join("airsketch_test_load_recording");
        std::fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("missing.jsonl");
        assert!(matches!(
            load_recording(&missing),
            Err(SketchError::FileNotFound { .. })
        ));

        let broken = dir.join("broken.jsonl");
        std::fs::write(&broken, "{\"t\":0,\"hands\":[]}\nnot json\n").unwrap();
        let err = load_recording(&broken).unwrap_err();
        assert!(matches!(err, SketchError::Recording { .. }));
        assert!(err.to_string().contains("line 2"), "{err}");

        let good = dir.join("good.jsonl");
        recording().save(&good).unwrap();
        assert_eq!(load_recording(&good).unwrap().frames.len(), 5);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_realtime_pacing_waits_for_timestamps() {
        let rec = ScriptBuilder::new(100).absent(4).build();
        let (mut source, _) = replay(rec, true);
        let started = Instant::now();
        while source.next_frame().unwrap().is_some() {}
        // Three 10 ms intervals between four frames.
        assert!(started.elapsed() >= Duration::from_millis(29));
    }
}
