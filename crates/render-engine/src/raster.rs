//! Software rasterizer for canvas snapshots.
//!
//! Strokes are drawn as chains of filled circles stamped along each
//! segment, which gives round caps and joins at any brush width.

use image::{ImageBuffer, Rgba as Pixel, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};

use airsketch_model::document::SketchDocument;
use airsketch_model::geometry::Point2D;
use airsketch_model::gesture::GestureState;
use airsketch_model::stroke::{ActiveStroke, Rgba, Stroke};
use airsketch_processing::canvas::{CanvasSnapshot, Cursor};

/// Output surface and overlay settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStyle {
    pub width: u32,
    pub height: u32,
    pub background: Rgba,
    /// Draw the hand cursor above the strokes.
    pub show_cursor: bool,
    /// Radius of the eraser ring shown while erasing.
    pub erase_radius: f64,
}

impl Default for RasterStyle {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 960,
            background: Rgba::WHITE,
            show_cursor: true,
            erase_radius: 24.0,
        }
    }
}

impl RasterStyle {
    pub fn new(width: u32, height: u32, background: Rgba) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            background,
            ..Self::default()
        }
    }

    pub fn with_cursor(mut self, show: bool) -> Self {
        self.show_cursor = show;
        self
    }

    pub fn with_erase_radius(mut self, radius: f64) -> Self {
        self.erase_radius = radius;
        self
    }

    pub fn for_document(doc: &SketchDocument) -> Self {
        Self::new(doc.width, doc.height, doc.background).with_cursor(false)
    }
}

const CURSOR_RING: Rgba = Rgba::opaque(90, 90, 90);

/// Draws snapshots onto fresh RGBA images.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    style: RasterStyle,
}

impl Rasterizer {
    pub fn new(style: RasterStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &RasterStyle {
        &self.style
    }

    /// Render sealed strokes oldest first, then the active stroke, then
    /// the cursor when enabled.
    pub fn render(&self, snapshot: &CanvasSnapshot) -> RgbaImage {
        let mut img = self.blank();
        for stroke in &snapshot.strokes {
            draw_stroke(&mut img, stroke);
        }
        if let Some(active) = &snapshot.active {
            draw_active(&mut img, active);
        }
        if self.style.show_cursor {
            if let Some(cursor) = &snapshot.cursor {
                self.draw_cursor(&mut img, cursor, snapshot);
            }
        }
        img
    }

    pub fn render_strokes<'a>(&self, strokes: impl IntoIterator<Item = &'a Stroke>) -> RgbaImage {
        let mut img = self.blank();
        for stroke in strokes {
            draw_stroke(&mut img, stroke);
        }
        img
    }

    pub fn render_document(doc: &SketchDocument) -> RgbaImage {
        Self::new(RasterStyle::for_document(doc)).render_strokes(&doc.strokes)
    }

    fn blank(&self) -> RgbaImage {
        ImageBuffer::from_pixel(
            self.style.width,
            self.style.height,
            pixel(self.style.background),
        )
    }

    fn draw_cursor(&self, img: &mut RgbaImage, cursor: &Cursor, snapshot: &CanvasSnapshot) {
        let center = to_pixel(&cursor.position);
        match cursor.state {
            GestureState::Erasing => {
                let radius = self.style.erase_radius.round().max(1.0) as i32;
                draw_hollow_circle_mut(img, center, radius, pixel(CURSOR_RING));
            }
            GestureState::Drawing | GestureState::Pointing => {
                let radius = brush_radius(snapshot.brush_width) + 3;
                draw_hollow_circle_mut(img, center, radius, pixel(snapshot.color));
            }
            GestureState::Selecting => {
                draw_filled_circle_mut(img, center, 8, pixel(snapshot.color));
                draw_hollow_circle_mut(img, center, 10, pixel(CURSOR_RING));
            }
            GestureState::Idle => {
                draw_hollow_circle_mut(img, center, 6, pixel(CURSOR_RING));
            }
        }
    }
}

fn pixel(color: Rgba) -> Pixel<u8> {
    Pixel(color.to_array())
}

fn to_pixel(p: &Point2D) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

fn brush_radius(width: f64) -> i32 {
    (width / 2.0).round().max(1.0) as i32
}

fn draw_stroke(img: &mut RgbaImage, stroke: &Stroke) {
    draw_polyline(img, &stroke.points, stroke.color, stroke.width);
}

fn draw_active(img: &mut RgbaImage, stroke: &ActiveStroke) {
    draw_polyline(img, &stroke.points, stroke.color, stroke.width);
}

fn draw_polyline(img: &mut RgbaImage, points: &[Point2D], color: Rgba, width: f64) {
    let radius = brush_radius(width);
    let color = pixel(color);
    let Some(first) = points.first() else {
        return;
    };
    draw_filled_circle_mut(img, to_pixel(first), radius, color);

    // Stamp spacing below the radius keeps the edge continuous.
    let step = (radius as f64 * 0.5).max(0.5);
    for pair in points.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let steps = (a.distance_to(b) / step).ceil().max(1.0) as usize;
        for i in 1..=steps {
            let p = Point2D::lerp(a, b, i as f64 / steps as f64);
            draw_filled_circle_mut(img, to_pixel(&p), radius, color);
        }
    }
}
