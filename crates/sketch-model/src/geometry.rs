//! Points and coordinate mapping between camera and canvas space.

use serde::{Deserialize, Serialize};

/// A 2D point. Canvas points are in pixels; landmark-space points are
/// normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Linear interpolation between two points.
    pub fn lerp(a: &Point2D, b: &Point2D, t: f64) -> Point2D {
        let t = t.clamp(0.0, 1.0);
        Point2D {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }

    pub fn midpoint(a: &Point2D, b: &Point2D) -> Point2D {
        Point2D::lerp(a, b, 0.5)
    }

    /// Shortest distance from this point to the segment `a`–`b`.
    pub fn distance_to_segment(&self, a: &Point2D, b: &Point2D) -> f64 {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len_sq = dx * dx + dy * dy;
        if len_sq < f64::EPSILON {
            return self.distance_to(a);
        }
        let t = ((self.x - a.x) * dx + (self.y - a.y) * dy) / len_sq;
        let projected = Point2D::lerp(a, b, t);
        self.distance_to(&projected)
    }
}

/// Maps normalized camera coordinates onto the canvas.
///
/// Webcams are usually shown mirrored, so by default X is flipped before
/// scaling: a hand moving to the user's right draws to the right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasMapping {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Flip the X axis before scaling.
    pub mirror_x: bool,
}

impl CanvasMapping {
    pub fn new(width: u32, height: u32, mirror_x: bool) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            mirror_x,
        }
    }

    /// Convert a normalized camera point to canvas pixels.
    pub fn to_canvas(&self, nx: f64, ny: f64) -> Point2D {
        let nx = if self.mirror_x { 1.0 - nx } else { nx };
        Point2D::new(nx * self.width as f64, ny * self.height as f64)
    }

    /// Horizontal position of a canvas point as a fraction of the width,
    /// clamped to `[0.0, 1.0]`.
    pub fn horizontal_fraction(&self, p: &Point2D) -> f64 {
        (p.x / self.width as f64).clamp(0.0, 1.0)
    }
}

impl Default for CanvasMapping {
    fn default() -> Self {
        Self::new(1280, 960, true)
    }
}
