//! Canvas storage and the unified undo/redo history.
//!
//! Every stroke created in a session lives in exactly one place: either
//! on the canvas, or inside the payload of a [`HistoryEntry::Erase`] on
//! one of the history stacks. History entries are moved between stacks by
//! applying their inverse, never copied.

use std::sync::Arc;

use airsketch_model::geometry::Point2D;
use airsketch_model::gesture::GestureState;
use airsketch_model::stroke::{ActiveStroke, Rgba, Stroke};

/// A reversible canvas mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEntry {
    /// The strokes with these creation indices were put on the canvas.
    Draw { indices: Vec<u64> },
    /// These strokes were taken off the canvas, each with the position it
    /// occupied, in ascending position order.
    Erase { removed: Vec<(usize, Arc<Stroke>)> },
}

impl HistoryEntry {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Draw { .. } => "draw",
            Self::Erase { .. } => "erase",
        }
    }

    /// Kind of the entry this one reverses.
    pub fn inverse_kind(&self) -> &'static str {
        match self {
            Self::Draw { .. } => "erase",
            Self::Erase { .. } => "draw",
        }
    }

    /// Number of strokes the entry touches.
    pub fn len(&self) -> usize {
        match self {
            Self::Draw { indices } => indices.len(),
            Self::Erase { removed } => removed.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sealed strokes, the active stroke, and both history stacks.
#[derive(Debug, Clone, Default)]
pub struct Canvas {
    strokes: Vec<Arc<Stroke>>,
    active: Option<ActiveStroke>,
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    next_index: u64,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// A canvas pre-populated with already sealed strokes, without history.
    pub fn with_strokes(strokes: Vec<Stroke>) -> Self {
        let next_index = strokes.iter().map(|s| s.index + 1).max().unwrap_or(0);
        Self {
            strokes: strokes.into_iter().map(Arc::new).collect(),
            next_index,
            ..Self::default()
        }
    }

    pub fn strokes(&self) -> &[Arc<Stroke>] {
        &self.strokes
    }

    pub fn active(&self) -> Option<&ActiveStroke> {
        self.active.as_ref()
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut ActiveStroke> {
        self.active.as_mut()
    }

    pub(crate) fn set_active(&mut self, stroke: ActiveStroke) {
        self.active = Some(stroke);
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Seal the active stroke onto the canvas, recording a `Draw` entry and
    /// invalidating redo. Returns the new stroke's index.
    pub(crate) fn seal_active(&mut self) -> Option<u64> {
        let active = self.active.take()?;
        let index = self.next_index;
        self.next_index += 1;
        self.strokes.push(Arc::new(active.seal(index)));
        self.undo.push(HistoryEntry::Draw {
            indices: vec![index],
        });
        self.redo.clear();
        Some(index)
    }

    /// Remove every sealed stroke that passes within `radius` of `at`.
    /// Records one `Erase` entry when anything was removed.
    pub(crate) fn erase_near(&mut self, at: &Point2D, radius: f64) -> Vec<u64> {
        let positions: Vec<usize> = self
            .strokes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.passes_within(at, radius))
            .map(|(pos, _)| pos)
            .collect();
        if positions.is_empty() {
            return vec![];
        }

        let removed = self.take_positions(&positions);
        let indices = removed.iter().map(|(_, s)| s.index).collect();
        self.undo.push(HistoryEntry::Erase { removed });
        self.redo.clear();
        indices
    }

    /// Reverse the most recent entry. Returns the entry that was pushed on
    /// the redo stack.
    pub(crate) fn undo(&mut self) -> Option<&HistoryEntry> {
        let entry = self.undo.pop()?;
        let inverse = self.apply_inverse(entry);
        self.redo.push(inverse);
        self.redo.last()
    }

    pub(crate) fn redo(&mut self) -> Option<&HistoryEntry> {
        let entry = self.redo.pop()?;
        let inverse = self.apply_inverse(entry);
        self.undo.push(inverse);
        self.undo.last()
    }

    /// Drop everything except the index counter.
    pub(crate) fn clear(&mut self) {
        self.strokes.clear();
        self.active = None;
        self.undo.clear();
        self.redo.clear();
    }

    fn apply_inverse(&mut self, entry: HistoryEntry) -> HistoryEntry {
        match entry {
            HistoryEntry::Draw { indices } => {
                let positions: Vec<usize> = self
                    .strokes
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| indices.contains(&s.index))
                    .map(|(pos, _)| pos)
                    .collect();
                HistoryEntry::Erase {
                    removed: self.take_positions(&positions),
                }
            }
            HistoryEntry::Erase { removed } => {
                let mut indices = Vec::with_capacity(removed.len());
                for (pos, stroke) in removed {
                    indices.push(stroke.index);
                    let pos = pos.min(self.strokes.len());
                    self.strokes.insert(pos, stroke);
                }
                HistoryEntry::Draw { indices }
            }
        }
    }

    /// Remove strokes at ascending `positions`, returning them with their
    /// original positions.
    fn take_positions(&mut self, positions: &[usize]) -> Vec<(usize, Arc<Stroke>)> {
        let mut removed: Vec<(usize, Arc<Stroke>)> = positions
            .iter()
            .rev()
            .map(|&pos| (pos, self.strokes.remove(pos)))
            .collect();
        removed.reverse();
        removed
    }
}

/// Where the hand is pointing, for overlays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub position: Point2D,
    pub state: GestureState,
}

/// Immutable view of the canvas handed to renderers. Cheap to clone:
/// sealed strokes are shared.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasSnapshot {
    pub strokes: Vec<Arc<Stroke>>,
    pub active: Option<ActiveStroke>,
    pub color: Rgba,
    pub brush_width: f64,
    pub cursor: Option<Cursor>,
    pub undo_depth: usize,
    pub redo_depth: usize,
}

impl CanvasSnapshot {
    pub fn with_cursor(mut self, position: Option<Point2D>, state: GestureState) -> Self {
        self.cursor = position.map(|position| Cursor { position, state });
        self
    }

    /// Sealed strokes as owned values, oldest first.
    pub fn sealed(&self) -> Vec<Stroke> {
        self.strokes.iter().map(|s| Stroke::clone(s)).collect()
    }

    pub fn point_count(&self) -> usize {
        let sealed: usize = self.strokes.iter().map(|s| s.points.len()).sum();
        sealed + self.active.as_ref().map_or(0, |a| a.points.len())
    }
}
