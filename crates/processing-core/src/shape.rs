//! Hand-shape signature.
//!
//! A purely geometric reading of one smoothed pose. Each finger is judged
//! by its extension ratio `|wrist→tip| / |wrist→pip|`: a straight finger
//! puts its tip well beyond its middle joint, a curled one folds the tip
//! back toward the palm. Works on 2-D coordinates only.

use serde::{Deserialize, Serialize};

use airsketch_model::geometry::Point2D;
use airsketch_model::landmark::{hand, SmoothedPose};

/// A recognized hand shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Index finger only: draw.
    Pointing,
    /// All four fingers: erase.
    OpenPalm,
    /// Thumb and index tips touching: pick a color.
    Pinch,
    /// Index and middle: undo.
    Victory,
    /// Index, middle and ring: redo.
    ThreeFingers,
    Unknown,
}

impl ShapeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pointing => "pointing",
            Self::OpenPalm => "open_palm",
            Self::Pinch => "pinch",
            Self::Victory => "victory",
            Self::ThreeFingers => "three_fingers",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finger {
    Extended,
    Curled,
    Ambiguous,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeThresholds {
    /// Minimum mean confidence of the wrist and fingertips.
    pub min_score: f64,
    pub extended_ratio: f64,
    pub curled_ratio: f64,
    /// Pinch distance as a fraction of palm size.
    pub pinch_ratio: f64,
}

impl Default for ShapeThresholds {
    fn default() -> Self {
        Self {
            min_score: 0.5,
            extended_ratio: 1.15,
            curled_ratio: 1.0,
            pinch_ratio: 0.35,
        }
    }
}

/// The shape seen in one pose, with its anchor in normalized camera space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeReading {
    pub kind: ShapeKind,
    pub score: f64,
    pub anchor: Point2D,
}

impl ShapeReading {
    fn unknown(score: f64, anchor: Point2D) -> Self {
        Self {
            kind: ShapeKind::Unknown,
            score,
            anchor,
        }
    }
}

const FINGERS: [(usize, usize); 4] = [
    (hand::INDEX_PIP, hand::INDEX_TIP),
    (hand::MIDDLE_PIP, hand::MIDDLE_TIP),
    (hand::RING_PIP, hand::RING_TIP),
    (hand::PINKY_PIP, hand::PINKY_TIP),
];

/// Classify the shape of a single pose.
pub fn read_shape(pose: &SmoothedPose, thresholds: &ShapeThresholds) -> ShapeReading {
    if pose.is_no_hand() {
        return ShapeReading::unknown(0.0, Point2D::new(0.0, 0.0));
    }

    let score = shape_score(pose);
    let palm = pose.palm_center();
    if score < thresholds.min_score {
        return ShapeReading::unknown(score, palm);
    }

    let wrist = pose.point(hand::WRIST);
    let thumb_tip = pose.point(hand::THUMB_TIP);
    let index_tip = pose.point(hand::INDEX_TIP);

    let palm_size = wrist.distance_to(&pose.point(hand::MIDDLE_MCP));
    if palm_size < f64::EPSILON {
        return ShapeReading::unknown(score, palm);
    }

    if thumb_tip.distance_to(&index_tip) < thresholds.pinch_ratio * palm_size {
        return ShapeReading {
            kind: ShapeKind::Pinch,
            score,
            anchor: Point2D::midpoint(&thumb_tip, &index_tip),
        };
    }

    let fingers = FINGERS.map(|(pip, tip)| finger_state(pose, &wrist, pip, tip, thresholds));
    use Finger::{Curled as C, Extended as E};
    let (kind, anchor) = match fingers {
        [E, C, C, C] => (ShapeKind::Pointing, index_tip),
        [E, E, C, C] => (ShapeKind::Victory, index_tip),
        [E, E, E, C] => (ShapeKind::ThreeFingers, index_tip),
        [E, E, E, E] => (ShapeKind::OpenPalm, palm),
        _ => (ShapeKind::Unknown, palm),
    };

    ShapeReading {
        kind,
        score,
        anchor,
    }
}

/// Mean confidence of the wrist and the five fingertips.
pub fn shape_score(pose: &SmoothedPose) -> f64 {
    let ids = std::iter::once(hand::WRIST).chain(hand::TIPS);
    let (sum, n) = ids.fold((0.0, 0.0), |(sum, n), i| {
        (sum + pose.landmark(i).confidence, n + 1.0)
    });
    sum / n
}

fn finger_state(
    pose: &SmoothedPose,
    wrist: &Point2D,
    pip: usize,
    tip: usize,
    thresholds: &ShapeThresholds,
) -> Finger {
    let to_pip = wrist.distance_to(&pose.point(pip));
    if to_pip < f64::EPSILON {
        return Finger::Ambiguous;
    }
    let ratio = wrist.distance_to(&pose.point(tip)) / to_pip;
    if ratio >= thresholds.extended_ratio {
        Finger::Extended
    } else if ratio <= thresholds.curled_ratio {
        Finger::Curled
    } else {
        Finger::Ambiguous
    }
}
