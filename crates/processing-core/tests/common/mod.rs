//! Shared harness: smoother → classifier → stroke engine, one frame at a time.

#![allow(dead_code)]

use airsketch_model::geometry::{CanvasMapping, Point2D};
use airsketch_model::gesture::GestureEvent;
use airsketch_model::landmark::LandmarkSet;
use airsketch_model::synthetic::{synthetic_hand, HandShape};
use airsketch_processing::{
    ClassifierConfig, GestureClassifier, LandmarkSmoother, SmoothingConfig, SmoothingKind,
    StrokeConfig, StrokeEngine,
};

pub const FRAME_NS: u64 = 33_333_333;

pub struct Rig {
    pub smoother: LandmarkSmoother,
    pub classifier: GestureClassifier,
    pub engine: StrokeEngine,
    pub mapping: CanvasMapping,
    frame: u64,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_configs(ClassifierConfig::default(), StrokeConfig::default())
    }

    pub fn with_configs(gestures: ClassifierConfig, strokes: StrokeConfig) -> Self {
        let mapping = CanvasMapping::default();
        let palette_len = strokes.palette.len();
        Self {
            smoother: LandmarkSmoother::new(SmoothingConfig::default()),
            classifier: GestureClassifier::new(gestures, mapping, palette_len),
            engine: StrokeEngine::new(strokes),
            mapping,
            frame: 0,
        }
    }

    /// A rig whose smoother passes landmarks through untouched.
    pub fn unsmoothed() -> Self {
        let mut rig = Self::new();
        rig.smoother = LandmarkSmoother::new(SmoothingConfig {
            algorithm: SmoothingKind::None,
            ..Default::default()
        });
        rig
    }

    fn next_t(&mut self) -> u64 {
        self.frame += 1;
        self.frame * FRAME_NS
    }

    /// Run one frame; `None` means the detector found no hand.
    pub fn frame(&mut self, hand: Option<LandmarkSet>) -> Vec<GestureEvent> {
        let t = self.next_t();
        let set = hand.unwrap_or_else(|| LandmarkSet::no_hand(t));
        let pose = self.smoother.step(&set);
        let events = self.classifier.step(&pose);
        for event in &events {
            self.engine.apply(event);
        }
        events
    }

    pub fn shape(&mut self, shape: HandShape, anchor: Point2D) -> Vec<GestureEvent> {
        let t = self.frame * FRAME_NS;
        self.frame(Some(synthetic_hand(shape, anchor, 0.2, 0.95, t)))
    }

    pub fn no_hand(&mut self) -> Vec<GestureEvent> {
        self.frame(None)
    }

    /// Per-frame events for a pointing hand gliding right-to-left in camera
    /// space (left-to-right on the mirrored canvas).
    pub fn swipe(&mut self, y: f64, frames: usize) -> Vec<Vec<GestureEvent>> {
        (0..frames)
            .map(|i| self.shape(HandShape::Pointing, Point2D::new(0.7 - 0.01 * i as f64, y)))
            .collect()
    }

    pub fn hold(&mut self, shape: HandShape, anchor: Point2D, frames: usize) -> Vec<GestureEvent> {
        (0..frames).flat_map(|_| self.shape(shape, anchor)).collect()
    }

    /// Normalized camera position that maps onto canvas point `p`.
    pub fn camera_point(&self, p: &Point2D) -> Point2D {
        let nx = p.x / self.mapping.width as f64;
        let ny = p.y / self.mapping.height as f64;
        let nx = if self.mapping.mirror_x { 1.0 - nx } else { nx };
        Point2D::new(nx, ny)
    }

    pub fn stroke_indices(&self) -> Vec<u64> {
        self.engine
            .canvas()
            .strokes()
            .iter()
            .map(|s| s.index)
            .collect()
    }
}
