//! The stroke engine: the single writer of the canvas.
//!
//! Consumes gesture events one at a time and mutates the [`Canvas`]
//! synchronously. Every event is accepted; sequences that make no sense
//! (a second `DrawStart`, a `DrawEnd` with nothing active, an unknown
//! palette slot) leave the canvas untouched and log a warning.

use serde::{Deserialize, Serialize};

use airsketch_common::error::{SketchError, SketchResult};
use airsketch_model::document::SketchDocument;
use airsketch_model::geometry::Point2D;
use airsketch_model::gesture::GestureEvent;
use airsketch_model::stroke::{default_palette, ActiveStroke, Rgba, Stroke};

use crate::canvas::{Canvas, CanvasSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeConfig {
    /// Strokes passing within this many pixels of an erase anchor are removed.
    pub erase_radius: f64,

    /// Points closer than this to the previous point are skipped.
    pub min_point_spacing: f64,

    pub default_width: f64,
    pub default_color: Rgba,

    /// Colors reachable through `SelectColor`.
    pub palette: Vec<Rgba>,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        let palette = default_palette();
        Self {
            erase_radius: 24.0,
            min_point_spacing: 2.0,
            default_width: 4.0,
            default_color: palette[0],
            palette,
        }
    }
}

impl StrokeConfig {
    pub fn validate(&self) -> SketchResult<()> {
        if self.erase_radius < 0.0 || self.min_point_spacing < 0.0 {
            return Err(SketchError::config(
                "strokes.erase_radius and strokes.min_point_spacing must be non-negative",
            ));
        }
        if self.default_width <= 0.0 {
            return Err(SketchError::config("strokes.default_width must be positive"));
        }
        if self.palette.is_empty() {
            return Err(SketchError::config("strokes.palette must not be empty"));
        }
        Ok(())
    }
}

/// What an event did to the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasDelta {
    /// Nothing changed.
    Unchanged,
    StrokeStarted { at: Point2D },
    PointAppended { at: Point2D },
    /// A point arrived too close to the previous one.
    PointSkipped,
    StrokeSealed { index: u64 },
    Erased { indices: Vec<u64> },
    /// `kind` names the action that was reversed or reapplied.
    Undone { kind: &'static str, strokes: usize },
    Redone { kind: &'static str, strokes: usize },
    ColorChanged { color: Rgba },
    Cleared,
}

impl CanvasDelta {
    /// Whether the visible canvas may look different afterwards.
    pub fn is_visible_change(&self) -> bool {
        !matches!(
            self,
            Self::Unchanged | Self::PointSkipped | Self::ColorChanged { .. }
        )
    }
}

pub struct StrokeEngine {
    config: StrokeConfig,
    canvas: Canvas,
    color: Rgba,
    width: f64,
}

impl StrokeEngine {
    pub fn new(config: StrokeConfig) -> Self {
        Self {
            color: config.default_color,
            width: config.default_width,
            canvas: Canvas::new(),
            config,
        }
    }

    /// Resume from a saved document. Loaded strokes are not undoable.
    pub fn from_document(config: StrokeConfig, doc: &SketchDocument) -> Self {
        let mut engine = Self::new(config);
        engine.canvas = Canvas::with_strokes(doc.strokes.clone());
        engine
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn config(&self) -> &StrokeConfig {
        &self.config
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn is_drawing(&self) -> bool {
        self.canvas.active().is_some()
    }

    /// Apply one gesture event.
    pub fn apply(&mut self, event: &GestureEvent) -> CanvasDelta {
        match *event {
            GestureEvent::Idle => CanvasDelta::Unchanged,
            GestureEvent::DrawStart { anchor } => self.start(anchor),
            GestureEvent::DrawContinue { anchor } => self.extend(anchor),
            GestureEvent::DrawEnd => self.seal(),
            GestureEvent::Erase { anchor } => {
                let indices = self.canvas.erase_near(&anchor, self.config.erase_radius);
                if indices.is_empty() {
                    CanvasDelta::Unchanged
                } else {
                    tracing::debug!(?indices, "erased strokes");
                    CanvasDelta::Erased { indices }
                }
            }
            GestureEvent::Undo => match self.canvas.undo() {
                Some(inverse) => CanvasDelta::Undone {
                    kind: inverse.inverse_kind(),
                    strokes: inverse.len(),
                },
                None => {
                    tracing::debug!("undo with empty history");
                    CanvasDelta::Unchanged
                }
            },
            GestureEvent::Redo => match self.canvas.redo() {
                Some(inverse) => CanvasDelta::Redone {
                    kind: inverse.inverse_kind(),
                    strokes: inverse.len(),
                },
                None => {
                    tracing::debug!("redo with empty history");
                    CanvasDelta::Unchanged
                }
            },
            GestureEvent::SelectColor { index } => match self.config.palette.get(index) {
                Some(&color) => {
                    self.color = color;
                    CanvasDelta::ColorChanged { color }
                }
                None => {
                    tracing::warn!(
                        index,
                        palette = self.config.palette.len(),
                        "color index outside palette, ignoring"
                    );
                    CanvasDelta::Unchanged
                }
            },
        }
    }

    /// Seal any in-progress stroke, as on shutdown.
    pub fn finish(&mut self) -> CanvasDelta {
        if self.is_drawing() {
            self.seal()
        } else {
            CanvasDelta::Unchanged
        }
    }

    /// Clear the canvas and its history. Creation indices keep increasing.
    pub fn reset(&mut self) -> CanvasDelta {
        self.canvas.clear();
        tracing::info!("canvas reset");
        CanvasDelta::Cleared
    }

    /// Brush width for the next stroke.
    pub fn set_width(&mut self, width: f64) {
        if width > 0.0 && width.is_finite() {
            self.width = width;
        } else {
            tracing::warn!(width, "ignoring non-positive brush width");
        }
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        CanvasSnapshot {
            strokes: self.canvas.strokes().to_vec(),
            active: self.canvas.active().cloned(),
            color: self.color,
            brush_width: self.width,
            cursor: None,
            undo_depth: self.canvas.undo_depth(),
            redo_depth: self.canvas.redo_depth(),
        }
    }

    /// Sealed strokes as a savable document.
    pub fn to_document(
        &self,
        name: &str,
        width: u32,
        height: u32,
        background: Rgba,
    ) -> SketchDocument {
        let strokes: Vec<Stroke> = self
            .canvas
            .strokes()
            .iter()
            .map(|s| Stroke::clone(s))
            .collect();
        SketchDocument::new(name, width, height)
            .with_background(background)
            .with_strokes(strokes)
    }

    fn start(&mut self, anchor: Point2D) -> CanvasDelta {
        if self.is_drawing() {
            tracing::warn!(
                x = anchor.x,
                y = anchor.y,
                "DrawStart while a stroke is active, ignoring"
            );
            return CanvasDelta::Unchanged;
        }
        self.canvas
            .set_active(ActiveStroke::new(anchor, self.color, self.width));
        CanvasDelta::StrokeStarted { at: anchor }
    }

    fn extend(&mut self, anchor: Point2D) -> CanvasDelta {
        let spacing = self.config.min_point_spacing;
        let Some(active) = self.canvas.active_mut() else {
            tracing::warn!("DrawContinue without an active stroke, ignoring");
            return CanvasDelta::Unchanged;
        };
        let far_enough = active
            .last_point()
            .map_or(true, |last| last.distance_to(&anchor) >= spacing);
        if far_enough {
            active.points.push(anchor);
            CanvasDelta::PointAppended { at: anchor }
        } else {
            CanvasDelta::PointSkipped
        }
    }

    fn seal(&mut self) -> CanvasDelta {
        match self.canvas.seal_active() {
            Some(index) => {
                tracing::debug!(index, "stroke sealed");
                CanvasDelta::StrokeSealed { index }
            }
            None => {
                tracing::warn!("DrawEnd without an active stroke, ignoring");
                CanvasDelta::Unchanged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> StrokeEngine {
        StrokeEngine::new(StrokeConfig::default())
    }

    fn draw(engine: &mut StrokeEngine, points: &[(f64, f64)]) {
        let mut iter = points.iter().map(|&(x, y)| Point2D::new(x, y));
        if let Some(first) = iter.next() {
            engine.apply(&GestureEvent::DrawStart { anchor: first });
        }
        for anchor in iter {
            engine.apply(&GestureEvent::DrawContinue { anchor });
        }
        engine.apply(&GestureEvent::DrawEnd);
    }

    #[test]
    fn test_draw_cycle() {
        let mut e = engine();
        let delta = e.apply(&GestureEvent::DrawStart {
            anchor: Point2D::new(0.0, 0.0),
        });
        assert_eq!(delta, CanvasDelta::StrokeStarted { at: Point2D::new(0.0, 0.0) });
        e.apply(&GestureEvent::DrawContinue {
            anchor: Point2D::new(10.0, 0.0),
        });
        assert_eq!(e.apply(&GestureEvent::DrawEnd), CanvasDelta::StrokeSealed { index: 0 });

        let snap = e.snapshot();
        assert_eq!(snap.strokes.len(), 1);
        assert_eq!(snap.strokes[0].points.len(), 2);
        assert!(snap.active.is_none());
    }

    #[test]
    fn test_min_spacing_skips_close_points() {
        let mut e = engine();
        e.apply(&GestureEvent::DrawStart {
            anchor: Point2D::new(0.0, 0.0),
        });
        let delta = e.apply(&GestureEvent::DrawContinue {
            anchor: Point2D::new(1.0, 1.0),
        });
        assert_eq!(delta, CanvasDelta::PointSkipped);
        assert_eq!(e.canvas().active().unwrap().points.len(), 1);
    }

    #[test]
    fn test_invalid_sequences_are_noops() {
        let mut e = engine();
        assert_eq!(e.apply(&GestureEvent::DrawEnd), CanvasDelta::Unchanged);
        assert_eq!(
            e.apply(&GestureEvent::DrawContinue {
                anchor: Point2D::new(1.0, 1.0)
            }),
            CanvasDelta::Unchanged
        );

        e.apply(&GestureEvent::DrawStart {
            anchor: Point2D::new(0.0, 0.0),
        });
        let second = e.apply(&GestureEvent::DrawStart {
            anchor: Point2D::new(50.0, 50.0),
        });
        assert_eq!(second, CanvasDelta::Unchanged);
        assert_eq!(e.canvas().active().unwrap().points[0], Point2D::new(0.0, 0.0));
    }

    #[test]
    fn test_select_color_affects_next_stroke() {
        let mut e = engine();
        let target = e.config().palette[3];
        assert_eq!(
            e.apply(&GestureEvent::SelectColor { index: 3 }),
            CanvasDelta::ColorChanged { color: target }
        );
        assert_eq!(
            e.apply(&GestureEvent::SelectColor { index: 99 }),
            CanvasDelta::Unchanged
        );
        draw(&mut e, &[(0.0, 0.0), (20.0, 0.0)]);
        assert_eq!(e.snapshot().strokes[0].color, target);
    }

    #[test]
    fn test_redo_invalidated_by_new_stroke() {
        let mut e = engine();
        draw(&mut e, &[(0.0, 0.0), (20.0, 0.0)]);
        e.apply(&GestureEvent::Undo);
        assert_eq!(e.canvas().redo_depth(), 1);
        draw(&mut e, &[(0.0, 50.0), (20.0, 50.0)]);
        assert_eq!(e.canvas().redo_depth(), 0);
        assert_eq!(e.apply(&GestureEvent::Redo), CanvasDelta::Unchanged);
    }

    #[test]
    fn test_finish_seals_active_stroke() {
        let mut e = engine();
        e.apply(&GestureEvent::DrawStart {
            anchor: Point2D::new(5.0, 5.0),
        });
        assert_eq!(e.finish(), CanvasDelta::StrokeSealed { index: 0 });
        assert_eq!(e.finish(), CanvasDelta::Unchanged);
    }

    #[test]
    fn test_reset_clears_but_keeps_numbering() {
        let mut e = engine();
        draw(&mut e, &[(0.0, 0.0), (20.0, 0.0)]);
        assert_eq!(e.reset(), CanvasDelta::Cleared);
        assert!(e.snapshot().strokes.is_empty());
        assert_eq!(e.canvas().undo_depth(), 0);
        draw(&mut e, &[(0.0, 0.0), (20.0, 0.0)]);
        assert_eq!(e.snapshot().strokes[0].index, 1);
    }

    #[test]
    fn test_brush_width() {
        let mut e = engine();
        e.set_width(9.0);
        e.set_width(-1.0);
        draw(&mut e, &[(0.0, 0.0), (20.0, 0.0)]);
        assert_eq!(e.snapshot().strokes[0].width, 9.0);
    }

    #[test]
    fn test_document_roundtrip_resumes_indices() {
        let mut e = engine();
        draw(&mut e, &[(0.0, 0.0), (20.0, 0.0)]);
        draw(&mut e, &[(0.0, 40.0), (20.0, 40.0)]);
        let doc = e.to_document("demo", 640, 480, Rgba::WHITE);
        assert_eq!(doc.strokes.len(), 2);

        let mut resumed = StrokeEngine::from_document(StrokeConfig::default(), &doc);
        draw(&mut resumed, &[(0.0, 80.0), (20.0, 80.0)]);
        let indices: Vec<u64> = resumed.snapshot().strokes.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(
            resumed.apply(&GestureEvent::Undo),
            CanvasDelta::Undone {
                kind: "draw",
                strokes: 1
            }
        );
        assert_eq!(resumed.apply(&GestureEvent::Undo), CanvasDelta::Unchanged);
    }

    #[test]
    fn test_config_validation() {
        assert!(StrokeConfig::default().validate().is_ok());
        let bad = StrokeConfig {
            palette: vec![],
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = StrokeConfig {
            erase_radius: -1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
