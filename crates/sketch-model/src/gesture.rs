//! Gesture states and the discrete events the classifier emits.

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;

/// Classifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureState {
    #[default]
    Idle,
    /// Drawing shape recognized; about to start a stroke.
    Pointing,
    Drawing,
    Erasing,
    /// Color-pick shape held; the selection has already been emitted.
    Selecting,
}

impl GestureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pointing => "pointing",
            Self::Drawing => "drawing",
            Self::Erasing => "erasing",
            Self::Selecting => "selecting",
        }
    }
}

/// A discrete classification result, consumed immediately by the stroke
/// engine. Anchors are canvas-space pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    Idle,
    DrawStart { anchor: Point2D },
    DrawContinue { anchor: Point2D },
    DrawEnd,
    Erase { anchor: Point2D },
    SelectColor { index: usize },
    Undo,
    Redo,
}

impl GestureEvent {
    /// The spatial anchor, for events that carry one.
    pub fn anchor(&self) -> Option<Point2D> {
        match self {
            Self::DrawStart { anchor } | Self::DrawContinue { anchor } | Self::Erase { anchor } => {
                Some(*anchor)
            }
            _ => None,
        }
    }

    /// Short name used in logs and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DrawStart { .. } => "draw_start",
            Self::DrawContinue { .. } => "draw_continue",
            Self::DrawEnd => "draw_end",
            Self::Erase { .. } => "erase",
            Self::SelectColor { .. } => "select_color",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}
