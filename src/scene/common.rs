use serde::{Deserialize, Serialize};
use std::fmt;

/// An RGB channel triplet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pair this color with an alpha value, clamped to [0, 1]
    pub fn with_alpha(self, alpha: f64) -> Rgba {
        Rgba { color: self, alpha: alpha.clamp(0.0, 1.0) }
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Color> for [u8; 3] {
    fn from(color: Color) -> Self {
        [color.r, color.g, color.b]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.r, self.g, self.b)
    }
}

/// A color with an alpha channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub color: Color,
    pub alpha: f64,
}

impl Rgba {
    /// Linear interpolation between two colors, `t` in [0, 1]
    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgba {
            color: Color::new(
                channel(self.color.r, other.color.r),
                channel(self.color.g, other.color.g),
                channel(self.color.b, other.color.b),
            ),
            alpha: self.alpha + (other.alpha - self.alpha) * t,
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {})", self.color, self.alpha)
    }
}

/// Color of the rings, the sweep and the grid
pub const RADAR_CYAN: Color = Color::new(0, 229, 255);

/// Particle colors, assigned round-robin by particle index
pub const PALETTE: [Color; 3] = [RADAR_CYAN, Color::new(16, 185, 129), Color::new(99, 102, 241)];

/// A position in display pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The point `distance` away from this one in direction `angle` (radians)
    pub fn polar(self, angle: f64, distance: f64) -> Point {
        Point::new(self.x + angle.cos() * distance, self.y + angle.sin() * distance)
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}
