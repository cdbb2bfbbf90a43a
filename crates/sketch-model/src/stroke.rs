//! Strokes, colors, and palettes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;

/// An 8-bit RGBA color, serialized as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb`, or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex.trim().trim_start_matches('#');
        let bad = || ColorParseError {
            input: hex.to_string(),
        };
        let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| bad());
        if !digits.is_ascii() {
            return Err(bad());
        }

        match digits.len() {
            3 => {
                let expand = |i: usize| byte(&digits[i..i + 1].repeat(2));
                Ok(Self::opaque(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Ok(Self::opaque(
                byte(&digits[0..2])?,
                byte(&digits[2..4])?,
                byte(&digits[4..6])?,
            )),
            8 => Ok(Self {
                r: byte(&digits[0..2])?,
                g: byte(&digits[2..4])?,
                b: byte(&digits[4..6])?,
                a: byte(&digits[6..8])?,
            }),
            _ => Err(bad()),
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Rgba {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgba::from_hex(&value)
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_hex()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {input:?}: expected #rgb, #rrggbb or #rrggbbaa")]
pub struct ColorParseError {
    pub input: String,
}

/// The palette offered to the color-pick gesture, left to right.
pub fn default_palette() -> Vec<Rgba> {
    vec![
        Rgba::opaque(0x1f, 0x1f, 0x1f),
        Rgba::opaque(0xe7, 0x4c, 0x3c),
        Rgba::opaque(0xf3, 0x9c, 0x12),
        Rgba::opaque(0x2e, 0xcc, 0x71),
        Rgba::opaque(0x34, 0x98, 0xdb),
        Rgba::opaque(0x9b, 0x59, 0xb6),
    ]
}

/// A sealed, immutable stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Monotonically increasing creation index within a session.
    pub index: u64,
    pub points: Vec<Point2D>,
    pub color: Rgba,
    pub width: f64,
}

impl Stroke {
    /// Whether the stroke's polyline comes within `radius` of `p`.
    pub fn passes_within(&self, p: &Point2D, radius: f64) -> bool {
        match self.points.as_slice() {
            [] => false,
            [only] => only.distance_to(p) <= radius,
            points => points
                .windows(2)
                .any(|seg| p.distance_to_segment(&seg[0], &seg[1]) <= radius),
        }
    }

    /// Total polyline length in pixels.
    pub fn length(&self) -> f64 {
        polyline_length(&self.points)
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> Option<(Point2D, Point2D)> {
        let first = self.points.first()?;
        let init = (*first, *first);
        Some(self.points.iter().fold(init, |(lo, hi), p| {
            (
                Point2D::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2D::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }
}

/// The single in-progress stroke. It has no creation index until sealed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveStroke {
    pub points: Vec<Point2D>,
    pub color: Rgba,
    pub width: f64,
}

impl ActiveStroke {
    pub fn new(start: Point2D, color: Rgba, width: f64) -> Self {
        Self {
            points: vec![start],
            color,
            width,
        }
    }

    pub fn last_point(&self) -> Option<&Point2D> {
        self.points.last()
    }

    /// Freeze into a sealed stroke with the given creation index.
    pub fn seal(self, index: u64) -> Stroke {
        Stroke {
            index,
            points: self.points,
            color: self.color,
            width: self.width,
        }
    }
}

fn polyline_length(points: &[Point2D]) -> f64 {
    points
        .windows(2)
        .map(|seg| seg[0].distance_to(&seg[1]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizontal_stroke() -> Stroke {
        Stroke {
            index: 0,
            points: vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(50.0, 0.0),
                Point2D::new(100.0, 0.0),
            ],
            color: Rgba::BLACK,
            width: 4.0,
        }
    }

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgba::from_hex("#ff8000").unwrap(), Rgba::opaque(255, 128, 0));
        assert_eq!(Rgba::from_hex("fff").unwrap(), Rgba::WHITE);
        let translucent = Rgba::from_hex("#00000080").unwrap();
        assert_eq!(translucent.a, 0x80);
        assert!(Rgba::from_hex("#12345").is_err());
        assert!(Rgba::from_hex("#gg0000").is_err());
    }

    #[test]
    fn test_non_ascii_hex_is_an_error() {
        assert!(Rgba::from_hex("#é1").is_err());
        assert!(Rgba::from_hex("aéééb").is_err());
        let parsed: Result<Rgba, _> = serde_json::from_str("\"aéééb\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_color_serializes_as_hex() {
        let json = serde_json::to_string(&Rgba::opaque(0x34, 0x98, 0xdb)).unwrap();
        assert_eq!(json, "\"#3498db\"");
        let parsed: Rgba = serde_json::from_str("\"#3498DB\"").unwrap();
        assert_eq!(parsed, Rgba::opaque(0x34, 0x98, 0xdb));
        assert!(serde_json::from_str::<Rgba>("\"blue\"").is_err());
    }

    #[test]
    fn test_passes_within_uses_segments() {
        let stroke = horizontal_stroke();
        // Between two points, far from both, but close to the segment.
        assert!(stroke.passes_within(&Point2D::new(25.0, 3.0), 5.0));
        assert!(!stroke.passes_within(&Point2D::new(25.0, 30.0), 5.0));
    }

    #[test]
    fn test_single_point_stroke_hit_test() {
        let mut stroke = horizontal_stroke();
        stroke.points.truncate(1);
        assert!(stroke.passes_within(&Point2D::new(3.0, 4.0), 5.0));
        assert!(!stroke.passes_within(&Point2D::new(30.0, 40.0), 5.0));
    }

    #[test]
    fn test_length_and_bounds() {
        let stroke = horizontal_stroke();
        assert!((stroke.length() - 100.0).abs() < 1e-9);
        let (lo, hi) = stroke.bounds().unwrap();
        assert_eq!(lo, Point2D::new(0.0, 0.0));
        assert_eq!(hi, Point2D::new(100.0, 0.0));
    }

    #[test]
    fn test_seal_keeps_points() {
        let mut active = ActiveStroke::new(Point2D::new(1.0, 1.0), Rgba::BLACK, 3.0);
        active.points.push(Point2D::new(2.0, 2.0));
        let sealed = active.seal(7);
        assert_eq!(sealed.index, 7);
        assert_eq!(sealed.points.len(), 2);
    }
}
