//! Hand landmark sets and smoothed poses.
//!
//! Detector output is reduced at the boundary to a fixed-shape record:
//! exactly [`HAND_LANDMARK_COUNT`] points per hand, ordered by the
//! MediaPipe hand-landmark convention (see [`hand`]).

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;

/// Number of tracked points per hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Landmark indices (MediaPipe hand landmark convention).
pub mod hand {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;

    /// Fingertips, thumb first.
    pub const TIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

    /// Knuckles that, with the wrist, outline the palm.
    pub const PALM: [usize; 5] = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];
}

/// A single tracked point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// Normalized X [0.0, 1.0].
    pub x: f64,
    /// Normalized Y [0.0, 1.0].
    pub y: f64,
    /// Relative depth; zero when the detector is 2-D only.
    #[serde(default)]
    pub z: f64,
    /// Per-point confidence / visibility [0.0, 1.0].
    #[serde(rename = "c")]
    pub confidence: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            confidence,
        }
    }

    pub fn point(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Which hand the detector believes it saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

/// One detected hand: produced by the detector, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub landmarks: [Landmark; HAND_LANDMARK_COUNT],

    /// Overall detection confidence [0.0, 1.0].
    pub confidence: f64,

    /// Source frame timestamp (ns since session start).
    #[serde(default, rename = "t")]
    pub timestamp_ns: u64,

    #[serde(default)]
    pub handedness: Handedness,
}

/// Returned when detector output does not have the fixed cardinality.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {HAND_LANDMARK_COUNT} landmarks, got {actual}")]
pub struct CardinalityError {
    pub actual: usize,
}

impl LandmarkSet {
    pub fn new(
        landmarks: [Landmark; HAND_LANDMARK_COUNT],
        confidence: f64,
        timestamp_ns: u64,
    ) -> Self {
        Self {
            landmarks,
            confidence,
            timestamp_ns,
            handedness: Handedness::Unknown,
        }
    }

    /// Build a set from detector output of unknown length.
    pub fn from_slice(
        points: &[Landmark],
        confidence: f64,
        timestamp_ns: u64,
    ) -> Result<Self, CardinalityError> {
        let landmarks: [Landmark; HAND_LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| CardinalityError {
                actual: points.len(),
            })?;
        Ok(Self::new(landmarks, confidence, timestamp_ns))
    }

    /// The set used when the detector found nothing in a frame.
    pub fn no_hand(timestamp_ns: u64) -> Self {
        Self::new([Landmark::default(); HAND_LANDMARK_COUNT], 0.0, timestamp_ns)
    }

    pub fn with_handedness(mut self, handedness: Handedness) -> Self {
        self.handedness = handedness;
        self
    }

    pub fn landmark(&self, index: usize) -> &Landmark {
        &self.landmarks[index]
    }
}

/// Reduce multi-hand detector output to the single highest-confidence hand.
pub fn select_primary_hand(hands: Vec<LandmarkSet>) -> Option<LandmarkSet> {
    hands
        .into_iter()
        .filter(|h| h.confidence.is_finite())
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
}

/// A landmark set after temporal smoothing, or an explicit "no hand".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedPose {
    pub landmarks: [Landmark; HAND_LANDMARK_COUNT],
    pub confidence: f64,
    pub timestamp_ns: u64,
    pub handedness: Handedness,
    hand_present: bool,
}

impl SmoothedPose {
    /// A pose carrying the raw landmarks of `set` unchanged.
    pub fn from_raw(set: &LandmarkSet) -> Self {
        Self {
            landmarks: set.landmarks,
            confidence: set.confidence,
            timestamp_ns: set.timestamp_ns,
            handedness: set.handedness,
            hand_present: true,
        }
    }

    /// The pose emitted when no usable hand was seen this frame.
    pub fn no_hand(timestamp_ns: u64) -> Self {
        Self {
            landmarks: [Landmark::default(); HAND_LANDMARK_COUNT],
            confidence: 0.0,
            timestamp_ns,
            handedness: Handedness::Unknown,
            hand_present: false,
        }
    }

    pub fn is_no_hand(&self) -> bool {
        !self.hand_present
    }

    pub fn landmark(&self, index: usize) -> &Landmark {
        &self.landmarks[index]
    }

    /// Normalized position of a landmark.
    pub fn point(&self, index: usize) -> Point2D {
        self.landmarks[index].point()
    }

    /// Mean of the wrist and the four finger knuckles.
    pub fn palm_center(&self) -> Point2D {
        let (sx, sy) = hand::PALM.iter().fold((0.0, 0.0), |(sx, sy), &i| {
            (sx + self.landmarks[i].x, sy + self.landmarks[i].y)
        });
        let n = hand::PALM.len() as f64;
        Point2D::new(sx / n, sy / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with_confidence(confidence: f64) -> LandmarkSet {
        LandmarkSet::new(
            [Landmark::new(0.5, 0.5, confidence); HAND_LANDMARK_COUNT],
            confidence,
            0,
        )
    }

    #[test]
    fn from_slice_enforces_cardinality() {
        let points = vec![Landmark::new(0.1, 0.2, 1.0); 20];
        let err = LandmarkSet::from_slice(&points, 0.9, 0).unwrap_err();
        assert_eq!(err.actual, 20);

        let points = vec![Landmark::new(0.1, 0.2, 1.0); HAND_LANDMARK_COUNT];
        let set = LandmarkSet::from_slice(&points, 0.9, 42).unwrap();
        assert_eq!(set.timestamp_ns, 42);
        assert_eq!(set.landmark(hand::INDEX_TIP).x, 0.1);
    }

    #[test]
    fn primary_hand_is_most_confident() {
        let hands = vec![
            set_with_confidence(0.6),
            set_with_confidence(0.95).with_handedness(Handedness::Left),
            set_with_confidence(0.7),
        ];
        let primary = select_primary_hand(hands).unwrap();
        assert_eq!(primary.handedness, Handedness::Left);
        assert!(select_primary_hand(vec![]).is_none());
    }

    #[test]
    fn no_hand_pose_is_flagged() {
        let pose = SmoothedPose::no_hand(7);
        assert!(pose.is_no_hand());
        assert_eq!(pose.timestamp_ns, 7);

        let raw = SmoothedPose::from_raw(&set_with_confidence(0.9));
        assert!(!raw.is_no_hand());
    }

    #[test]
    fn palm_center_averages_knuckles() {
        let mut set = set_with_confidence(1.0);
        set.landmarks[hand::WRIST] = Landmark::new(0.0, 0.0, 1.0);
        for &i in &hand::PALM[1..] {
            set.landmarks[i] = Landmark::new(1.0, 1.0, 1.0);
        }
        let center = SmoothedPose::from_raw(&set).palm_center();
        assert!((center.x - 0.8).abs() < 1e-9);
        assert!((center.y - 0.8).abs() < 1e-9);
    }

    #[test]
    fn landmark_set_json_uses_compact_keys() {
        let set = set_with_confidence(0.8);
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.contains("\"c\":0.8"));
        assert!(json.contains("\"t\":0"));
        let parsed: LandmarkSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, set);
    }
}
