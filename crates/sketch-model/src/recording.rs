//! Landmark recordings (`*.landmarks.jsonl`).
//!
//! A recording is the detector's output for every frame of a session,
//! one JSON object per line. The first line is an optional `#`-prefixed
//! header describing the camera stream:
//!
//! ```text
//! # {"schema_version":"1.0","epoch_wall":"...","frame_width":640,"frame_height":480,"fps":30}
//! {"t":0,"hands":[{"landmarks":[...],"confidence":0.93,"t":0}]}
//! {"t":33333333,"hands":[]}
//! ```
//!
//! Replaying a recording through the pipeline reproduces the session
//! deterministically.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::landmark::LandmarkSet;

pub const RECORDING_SCHEMA_VERSION: &str = "1.0";

/// Stream metadata written as the first line of a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingHeader {
    pub schema_version: String,

    /// Wall-clock time of the first frame (RFC 3339).
    pub epoch_wall: String,

    /// Camera frame size in pixels.
    pub frame_width: u32,
    pub frame_height: u32,

    /// Nominal capture rate.
    pub fps: u32,

    /// Free-form description of where the landmarks came from.
    #[serde(default)]
    pub source: String,
}

impl RecordingHeader {
    pub fn new(frame_width: u32, frame_height: u32, fps: u32) -> Self {
        Self {
            schema_version: RECORDING_SCHEMA_VERSION.to_string(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
            frame_width,
            frame_height,
            fps,
            source: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Nominal spacing between frames.
    pub fn frame_interval_ns(&self) -> u64 {
        1_000_000_000 / u64::from(self.fps.max(1))
    }
}

impl Default for RecordingHeader {
    fn default() -> Self {
        Self::new(640, 480, 30)
    }
}

/// Detector output for one camera frame. `hands` is empty when nothing
/// was detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Frame timestamp (ns since the first frame).
    pub t: u64,
    #[serde(default)]
    pub hands: Vec<LandmarkSet>,
}

impl RecordedFrame {
    pub fn new(t: u64, hands: Vec<LandmarkSet>) -> Self {
        Self { t, hands }
    }

    pub fn empty(t: u64) -> Self {
        Self { t, hands: vec![] }
    }
}

/// A fully loaded recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub header: RecordingHeader,
    pub frames: Vec<RecordedFrame>,
}

impl Recording {
    pub fn new(header: RecordingHeader, frames: Vec<RecordedFrame>) -> Self {
        Self { header, frames }
    }

    /// Parse JSONL content. A missing header falls back to the default.
    pub fn parse(jsonl: &str) -> Result<Self, RecordingError> {
        let mut header = None;
        let mut frames = Vec::new();

        for (idx, raw) in jsonl.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                // Only the first non-empty line may carry the header.
                if header.is_none() && frames.is_empty() {
                    let parsed = serde_json::from_str(comment.trim()).map_err(|source| {
                        RecordingError::Parse {
                            line: idx + 1,
                            source,
                        }
                    })?;
                    header = Some(parsed);
                }
                continue;
            }
            let frame: RecordedFrame =
                serde_json::from_str(line).map_err(|source| RecordingError::Parse {
                    line: idx + 1,
                    source,
                })?;
            if let Some(prev) = frames.last().map(|f: &RecordedFrame| f.t) {
                if frame.t < prev {
                    return Err(RecordingError::NonMonotonic {
                        line: idx + 1,
                        previous: prev,
                        current: frame.t,
                    });
                }
            }
            frames.push(frame);
        }

        Ok(Self {
            header: header.unwrap_or_default(),
            frames,
        })
    }

    /// Serialize to JSONL, header first.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        let mut output = format!("# {}\n", serde_json::to_string(&self.header)?);
        for frame in &self.frames {
            output.push_str(&serde_json::to_string(frame)?);
            output.push('\n');
        }
        Ok(output)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordingError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RecordingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RecordingError> {
        let mut writer = RecordingWriter::create(path.as_ref(), &self.header)?;
        for frame in &self.frames {
            writer.write_frame(frame)?;
        }
        writer.flush()
    }

    /// Timestamp of the last frame.
    pub fn duration_ns(&self) -> u64 {
        self.frames.last().map(|f| f.t).unwrap_or(0)
    }

    /// Frames in which at least one hand was detected.
    pub fn frames_with_hands(&self) -> usize {
        self.frames.iter().filter(|f| !f.hands.is_empty()).count()
    }
}

/// Writes a recording incrementally, header first.
pub struct RecordingWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    frames_written: u64,
}

impl RecordingWriter {
    pub fn create(path: &Path, header: &RecordingHeader) -> Result<Self, RecordingError> {
        let io_err = |source| RecordingError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(io_err)?;

        let mut writer = BufWriter::new(file);
        let header_json = serde_json::to_string(header).map_err(RecordingError::Encode)?;
        writeln!(writer, "# {header_json}").map_err(io_err)?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            frames_written: 0,
        })
    }

    pub fn write_frame(&mut self, frame: &RecordedFrame) -> Result<(), RecordingError> {
        let json = serde_json::to_string(frame).map_err(RecordingError::Encode)?;
        writeln!(self.writer, "{json}").map_err(|source| RecordingError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.frames_written += 1;

        if self.frames_written % 500 == 0 {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), RecordingError> {
        self.writer.flush().map_err(|source| RecordingError::Io {
            path: self.path.clone(),
            source,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RecordingWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordingError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Encode error: {0}")]
    Encode(serde_json::Error),

    #[error("Timestamps go backwards on line {line}: {current} after {previous}")]
    NonMonotonic {
        line: usize,
        previous: u64,
        current: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, HAND_LANDMARK_COUNT};

    fn hand_at(t: u64) -> LandmarkSet {
        LandmarkSet::new(
            [Landmark::new(0.4, 0.6, 0.9); HAND_LANDMARK_COUNT],
            0.92,
            t,
        )
    }

    fn sample() -> Recording {
        Recording::new(
            RecordingHeader::new(640, 480, 30).with_source("test"),
            vec![
                RecordedFrame::new(0, vec![hand_at(0)]),
                RecordedFrame::empty(33_333_333),
                RecordedFrame::new(66_666_666, vec![hand_at(66_666_666)]),
            ],
        )
    }

    #[test]
    fn test_jsonl_starts_with_header() {
        let jsonl = sample().to_jsonl().unwrap();
        let lines: Vec<&str> = jsonl.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("# {"));
        assert!(lines[2].contains("\"hands\":[]"));

        let parsed = Recording::parse(&jsonl).unwrap();
        assert_eq!(parsed, sample());
        assert_eq!(parsed.frames_with_hands(), 2);
        assert_eq!(parsed.duration_ns(), 66_666_666);
    }

    #[test]
    fn test_headerless_recording_uses_defaults() {
        let jsonl = "{\"t\":0}\n\n{\"t\":10,\"hands\":[]}\n";
        let parsed = Recording::parse(jsonl).unwrap();
        assert_eq!(parsed.header.schema_version, RECORDING_SCHEMA_VERSION);
        assert_eq!(parsed.frames.len(), 2);
        assert!(parsed.frames[0].hands.is_empty());
    }

    #[test]
    fn test_parse_error_reports_line() {
        let jsonl = "# {\"schema_version\":\"1.0\",\"epoch_wall\":\"x\",\"frame_width\":1,\"frame_height\":1,\"fps\":30}\n{\"t\":0}\nnot json\n";
        match Recording::parse(jsonl) {
            Err(RecordingError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_backwards_timestamps() {
        let jsonl = "{\"t\":100}\n{\"t\":50}\n";
        assert!(matches!(
            Recording::parse(jsonl),
            Err(RecordingError::NonMonotonic { line: 2, .. })
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = std::env::temp_dir().join("airsketch_test_recording");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("session.landmarks.jsonl");

        sample().save(&path).unwrap();
        let loaded = Recording::load(&path).unwrap();
        assert_eq!(loaded.frames.len(), 3);
        assert_eq!(loaded.header.source, "test");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_frame_interval() {
        assert_eq!(RecordingHeader::new(1, 1, 30).frame_interval_ns(), 33_333_333);
        assert_eq!(RecordingHeader::new(1, 1, 0).frame_interval_ns(), 1_000_000_000);
    }
}
