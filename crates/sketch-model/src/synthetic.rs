//! Synthetic hand poses and scripted recordings.
//!
//! Produces geometrically plausible 21-point hands for each recognized
//! shape, and strings them together into [`Recording`]s. Used by tests
//! and by `airsketch synth` to exercise the pipeline without a camera.
//!
//! All script positions are *anchor* positions in normalized camera space:
//! the point the classifier will report for that shape (index tip, palm
//! center, or pinch midpoint). The wrist is placed so that the anchor
//! lands exactly there.

use crate::geometry::Point2D;
use crate::landmark::{hand, Landmark, LandmarkSet, HAND_LANDMARK_COUNT};
use crate::recording::{RecordedFrame, Recording, RecordingHeader};

/// Hand shapes the generator can pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandShape {
    Pointing,
    OpenPalm,
    Fist,
    Pinch,
    Victory,
    ThreeFingers,
}

impl HandShape {
    /// Which of index, middle, ring, pinky are extended.
    fn extended(&self) -> [bool; 4] {
        match self {
            Self::Pointing => [true, false, false, false],
            Self::Victory => [true, true, false, false],
            Self::ThreeFingers => [true, true, true, false],
            Self::OpenPalm => [true, true, true, true],
            Self::Fist | Self::Pinch => [false, false, false, false],
        }
    }

    /// Anchor position relative to the wrist, in units of hand scale.
    fn anchor_offset(&self) -> (f64, f64) {
        match self {
            Self::Pointing | Self::Victory | Self::ThreeFingers => (-0.15, -0.9),
            Self::OpenPalm | Self::Fist => (0.0, -0.36),
            Self::Pinch => (-0.29, -0.60),
        }
    }
}

const FINGER_BASE_X: [f64; 4] = [-0.15, -0.05, 0.05, 0.15];
const FINGER_MCP: [usize; 4] = [
    hand::INDEX_MCP,
    hand::MIDDLE_MCP,
    hand::RING_MCP,
    hand::PINKY_MCP,
];
const EXTENDED_Y: [f64; 3] = [-0.65, -0.78, -0.9];
const CURLED_Y: [f64; 3] = [-0.6, -0.5, -0.4];

/// Lay out a hand of the given shape with its wrist at `wrist` (normalized)
/// and a wrist-to-fingertip span of roughly `scale`.
pub fn hand_landmarks(
    shape: HandShape,
    wrist: Point2D,
    scale: f64,
    confidence: f64,
) -> [Landmark; HAND_LANDMARK_COUNT] {
    let at = |dx: f64, dy: f64| Landmark::new(wrist.x + dx * scale, wrist.y + dy * scale, confidence);
    let mut points = [Landmark::default(); HAND_LANDMARK_COUNT];

    points[hand::WRIST] = at(0.0, 0.0);

    let extended = shape.extended();
    for finger in 0..4 {
        let x = FINGER_BASE_X[finger];
        let mcp = FINGER_MCP[finger];
        points[mcp] = at(x, -0.45);
        let chain = if extended[finger] { EXTENDED_Y } else { CURLED_Y };
        for (joint, y) in chain.iter().enumerate() {
            points[mcp + 1 + joint] = at(x, *y);
        }
    }

    points[hand::THUMB_CMC] = at(-0.2, -0.1);
    points[hand::THUMB_MCP] = at(-0.3, -0.2);
    if shape == HandShape::Pinch {
        points[hand::THUMB_IP] = at(-0.34, -0.42);
        points[hand::THUMB_TIP] = at(-0.30, -0.58);
        points[hand::INDEX_PIP] = at(-0.15, -0.62);
        points[hand::INDEX_DIP] = at(-0.22, -0.66);
        points[hand::INDEX_TIP] = at(-0.28, -0.62);
    } else {
        points[hand::THUMB_IP] = at(-0.38, -0.3);
        points[hand::THUMB_TIP] = at(-0.45, -0.38);
    }

    points
}

/// A full landmark set whose anchor sits at `anchor`.
pub fn synthetic_hand(
    shape: HandShape,
    anchor: Point2D,
    scale: f64,
    confidence: f64,
    timestamp_ns: u64,
) -> LandmarkSet {
    let (dx, dy) = shape.anchor_offset();
    let wrist = Point2D::new(anchor.x - dx * scale, anchor.y - dy * scale);
    LandmarkSet::new(
        hand_landmarks(shape, wrist, scale, confidence),
        confidence,
        timestamp_ns,
    )
}

/// Builds a recording one segment at a time.
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    header: RecordingHeader,
    frames: Vec<RecordedFrame>,
    scale: f64,
    confidence: f64,
}

impl ScriptBuilder {
    pub fn new(fps: u32) -> Self {
        Self {
            header: RecordingHeader::new(640, 480, fps.max(1)).with_source("synthetic"),
            frames: vec![],
            scale: 0.2,
            confidence: 0.95,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Detection confidence for subsequent segments.
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    fn next_t(&self) -> u64 {
        self.frames.len() as u64 * self.header.frame_interval_ns()
    }

    /// Hold a shape still for `frames` frames.
    pub fn hold(self, shape: HandShape, anchor: Point2D, frames: usize) -> Self {
        self.glide(shape, anchor, anchor, frames)
    }

    /// Move a shape's anchor linearly from `from` to `to`, endpoints included.
    pub fn glide(mut self, shape: HandShape, from: Point2D, to: Point2D, frames: usize) -> Self {
        for i in 0..frames {
            let t = if frames > 1 {
                i as f64 / (frames - 1) as f64
            } else {
                0.0
            };
            let anchor = Point2D::lerp(&from, &to, t);
            let ts = self.next_t();
            let set = synthetic_hand(shape, anchor, self.scale, self.confidence, ts);
            self.frames.push(RecordedFrame::new(ts, vec![set]));
        }
        self
    }

    /// Frames in which no hand is detected.
    pub fn absent(mut self, frames: usize) -> Self {
        for _ in 0..frames {
            let ts = self.next_t();
            self.frames.push(RecordedFrame::empty(ts));
        }
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn build(self) -> Recording {
        Recording::new(self.header, self.frames)
    }
}

/// Canned scripts. Positions assume the default mirrored canvas mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// One horizontal stroke.
    Draw,
    /// A stroke, then an open palm over its middle.
    Erase,
    /// Two strokes, an undo gesture, then a redo gesture.
    Undo,
    /// Colors, two strokes, an erase, and an undo.
    Showcase,
}

impl Scenario {
    pub fn build(self, fps: u32) -> Recording {
        let left = Point2D::new(0.65, 0.45);
        let right = Point2D::new(0.35, 0.45);
        let lower_left = Point2D::new(0.65, 0.7);
        let lower_right = Point2D::new(0.35, 0.7);
        let middle = Point2D::midpoint(&left, &right);
        let gesture_spot = Point2D::new(0.5, 0.6);

        let script = ScriptBuilder::new(fps).absent(3);
        let script = match self {
            Self::Draw => script.glide(HandShape::Pointing, left, right, 30).absent(3),
            Self::Erase => script
                .glide(HandShape::Pointing, left, right, 30)
                .absent(3)
                .hold(HandShape::OpenPalm, middle, 10)
                .absent(3),
            Self::Undo => script
                .glide(HandShape::Pointing, left, right, 30)
                .absent(3)
                .glide(HandShape::Pointing, lower_left, lower_right, 30)
                .absent(3)
                .hold(HandShape::Victory, gesture_spot, 20)
                .absent(3)
                .hold(HandShape::ThreeFingers, gesture_spot, 20)
                .absent(3),
            // Mirrored: normalized x 0.75 lands on the left quarter of the canvas.
            Self::Showcase => script
                .hold(HandShape::Pinch, Point2D::new(0.25, 0.2), 8)
                .absent(2)
                .glide(HandShape::Pointing, left, right, 30)
                .absent(3)
                .hold(HandShape::Pinch, Point2D::new(0.75, 0.2), 8)
                .absent(2)
                .glide(HandShape::Pointing, lower_left, lower_right, 30)
                .absent(3)
                .hold(HandShape::OpenPalm, middle, 10)
                .absent(3)
                .hold(HandShape::Victory, gesture_spot, 20)
                .absent(3),
        };
        script.build()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Draw => "draw",
            Self::Erase => "erase",
            Self::Undo => "undo",
            Self::Showcase => "showcase",
        }
    }
}

impl std::str::FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draw" => Ok(Self::Draw),
            "erase" => Ok(Self::Erase),
            "undo" => Ok(Self::Undo),
            "showcase" => Ok(Self::Showcase),
            other => Err(format!(
                "unknown scenario '{other}' (expected draw, erase, undo, showcase)"
            )),
        }
    }
}
