//! Gesture state machine.
//!
//! Turns a stream of smoothed poses into discrete [`GestureEvent`]s. Every
//! transition out of `Idle` requires the same shape on consecutive frames
//! (`debounce_frames`), so a single noisy frame can never start a stroke.
//!
//! ```text
//!            pointing ×N          +arm_frames
//!   Idle ──────────────▶ Pointing ───────────▶ Drawing ──┐ DrawContinue
//!    ▲ ▲ ▲                                        │  ◀───┘
//!    │ │ └──── shape lost ×N (DrawEnd) ───────────┘
//!    │ └────── palm lost ×N ◀── Erasing (Erase every frame)
//!    └──────── pinch released ◀── Selecting (SelectColor once)
//!
//!   victory ×M → Undo, three fingers ×M → Redo (once per hold)
//!   no hand → Idle from anywhere (DrawEnd if drawing)
//! ```

use serde::{Deserialize, Serialize};

use airsketch_common::error::{SketchError, SketchResult};
use airsketch_model::geometry::{CanvasMapping, Point2D};
use airsketch_model::gesture::{GestureEvent, GestureState};
use airsketch_model::landmark::SmoothedPose;

use crate::shape::{read_shape, ShapeKind, ShapeReading, ShapeThresholds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Consecutive frames a shape must persist to enter a state, and
    /// consecutive frames it must be missing to leave one (N).
    pub debounce_frames: u32,

    /// Extra frames in `Pointing` before the stroke starts.
    pub arm_frames: u32,

    /// Frames an undo/redo shape must be held (M, greater than N).
    pub history_frames: u32,

    /// Minimum mean landmark confidence for a shape to count.
    pub shape_confidence_threshold: f64,

    pub extended_ratio: f64,
    pub curled_ratio: f64,
    pub pinch_ratio: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            debounce_frames: 5,
            arm_frames: 1,
            history_frames: 15,
            shape_confidence_threshold: 0.5,
            extended_ratio: 1.15,
            curled_ratio: 1.0,
            pinch_ratio: 0.35,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> SketchResult<()> {
        if self.debounce_frames == 0 {
            return Err(SketchError::config("gestures.debounce_frames must be at least 1"));
        }
        if self.history_frames <= self.debounce_frames {
            return Err(SketchError::config(format!(
                "gestures.history_frames ({}) must exceed debounce_frames ({})",
                self.history_frames, self.debounce_frames
            )));
        }
        if self.curled_ratio <= 0.0 || self.extended_ratio < self.curled_ratio {
            return Err(SketchError::config(
                "gestures ratios must satisfy 0 < curled_ratio <= extended_ratio",
            ));
        }
        if self.pinch_ratio <= 0.0 {
            return Err(SketchError::config("gestures.pinch_ratio must be positive"));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> ShapeThresholds {
        ShapeThresholds {
            min_score: self.shape_confidence_threshold,
            extended_ratio: self.extended_ratio,
            curled_ratio: self.curled_ratio,
            pinch_ratio: self.pinch_ratio,
        }
    }
}

/// The classifier. One instance per session; never shared.
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    config: ClassifierConfig,
    thresholds: ShapeThresholds,
    mapping: CanvasMapping,
    palette_len: usize,

    state: GestureState,

    /// Shape accumulating consecutive frames.
    candidate: ShapeKind,
    /// Consecutive frames `candidate` has been seen.
    held: u32,
    /// Frames spent in `Pointing`.
    armed: u32,
    /// Consecutive frames the active state's shape has been missing.
    lost: u32,

    cursor: Option<Point2D>,
}

impl GestureClassifier {
    pub fn new(config: ClassifierConfig, mapping: CanvasMapping, palette_len: usize) -> Self {
        Self {
            thresholds: config.thresholds(),
            config,
            mapping,
            palette_len,
            state: GestureState::Idle,
            candidate: ShapeKind::Unknown,
            held: 0,
            armed: 0,
            lost: 0,
            cursor: None,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Canvas position of the last recognized anchor, if a hand is visible.
    pub fn cursor(&self) -> Option<Point2D> {
        self.cursor
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Return to `Idle` and forget all counters without emitting events.
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
        self.candidate = ShapeKind::Unknown;
        self.held = 0;
        self.armed = 0;
        self.lost = 0;
        self.cursor = None;
    }

    /// Advance one frame.
    pub fn step(&mut self, pose: &SmoothedPose) -> Vec<GestureEvent> {
        if pose.is_no_hand() {
            let events = match self.state {
                GestureState::Drawing => vec![GestureEvent::DrawEnd],
                GestureState::Idle => vec![],
                _ => vec![GestureEvent::Idle],
            };
            if self.state != GestureState::Idle {
                tracing::debug!(from = self.state.as_str(), "hand lost, returning to idle");
            }
            self.reset();
            return events;
        }

        let reading = read_shape(pose, &self.thresholds);
        if reading.kind == self.candidate {
            self.held = self.held.saturating_add(1);
        } else {
            self.candidate = reading.kind;
            self.held = 1;
        }
        let anchor = self.mapping.to_canvas(reading.anchor.x, reading.anchor.y);
        self.cursor = Some(anchor);

        match self.state {
            GestureState::Idle => self.step_idle(&reading, anchor),
            GestureState::Pointing => {
                if reading.kind == ShapeKind::Pointing {
                    self.step_pointing(anchor)
                } else {
                    self.enter(GestureState::Idle);
                    let mut events = vec![GestureEvent::Idle];
                    events.extend(self.step_idle(&reading, anchor));
                    events
                }
            }
            GestureState::Drawing => {
                if reading.kind == ShapeKind::Pointing {
                    self.lost = 0;
                    vec![GestureEvent::DrawContinue { anchor }]
                } else if self.shape_lost() {
                    self.enter(GestureState::Idle);
                    vec![GestureEvent::DrawEnd]
                } else {
                    vec![]
                }
            }
            GestureState::Erasing => {
                if reading.kind == ShapeKind::OpenPalm {
                    self.lost = 0;
                    vec![GestureEvent::Erase { anchor }]
                } else if self.shape_lost() {
                    self.enter(GestureState::Idle);
                    vec![GestureEvent::Idle]
                } else {
                    vec![]
                }
            }
            GestureState::Selecting => {
                if reading.kind == ShapeKind::Pinch {
                    vec![]
                } else {
                    self.enter(GestureState::Idle);
                    let mut events = vec![GestureEvent::Idle];
                    events.extend(self.step_idle(&reading, anchor));
                    events
                }
            }
        }
    }

    fn step_idle(&mut self, reading: &ShapeReading, anchor: Point2D) -> Vec<GestureEvent> {
        let n = self.config.debounce_frames;
        let m = self.config.history_frames;

        match reading.kind {
            ShapeKind::Pointing if self.held >= n => {
                self.enter(GestureState::Pointing);
                if self.config.arm_frames == 0 {
                    self.start_drawing(anchor)
                } else {
                    vec![]
                }
            }
            ShapeKind::OpenPalm if self.held >= n => {
                self.enter(GestureState::Erasing);
                vec![GestureEvent::Erase { anchor }]
            }
            ShapeKind::Pinch if self.held >= n => {
                self.enter(GestureState::Selecting);
                vec![GestureEvent::SelectColor {
                    index: self.palette_index(&anchor),
                }]
            }
            // Edge-triggered: fires on the M-th frame only.
            ShapeKind::Victory if self.held == m => {
                tracing::debug!(held = self.held, "undo gesture");
                vec![GestureEvent::Undo]
            }
            ShapeKind::ThreeFingers if self.held == m => {
                tracing::debug!(held = self.held, "redo gesture");
                vec![GestureEvent::Redo]
            }
            _ => vec![],
        }
    }

    fn step_pointing(&mut self, anchor: Point2D) -> Vec<GestureEvent> {
        self.armed += 1;
        if self.armed >= self.config.arm_frames {
            self.start_drawing(anchor)
        } else {
            vec![]
        }
    }

    fn start_drawing(&mut self, anchor: Point2D) -> Vec<GestureEvent> {
        self.enter(GestureState::Drawing);
        vec![GestureEvent::DrawStart { anchor }]
    }

    fn shape_lost(&mut self) -> bool {
        self.lost += 1;
        self.lost >= self.config.debounce_frames
    }

    fn enter(&mut self, next: GestureState) {
        if next != self.state {
            tracing::debug!(from = self.state.as_str(), to = next.as_str(), "gesture transition");
        }
        self.state = next;
        self.armed = 0;
        self.lost = 0;
    }

    fn palette_index(&self, anchor: &Point2D) -> usize {
        if self.palette_len == 0 {
            return 0;
        }
        let fraction = self.mapping.horizontal_fraction(anchor);
        ((fraction * self.palette_len as f64) as usize).min(self.palette_len - 1)
    }
}
