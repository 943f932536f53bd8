use super::common::{Color, Point};
use crate::random::RandomSource;
use crate::surface::DrawingContext;
use serde::Serialize;
use std::f64::consts::TAU;
use strum::{Display, EnumIter};

/// Particles that float upwards wrap once they are this far above the top edge
const FLOAT_WRAP_MARGIN: f64 = 10.0;

/// Per-frame angular step of an orbital particle, per unit of speed
const ORBIT_STEP: f64 = 0.01;

/// Motion rule of a particle, fixed by its index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Behavior {
    /// Rises at its own speed, respawning below the bottom edge
    Floating,
    /// Circles the focal point
    Orbital,
    /// Wanders along a slow sine path, wrapping on every edge
    Drifting,
}

impl Behavior {
    pub fn for_index(index: usize) -> Self {
        match index % 3 {
            0 => Self::Floating,
            1 => Self::Orbital,
            _ => Self::Drifting,
        }
    }
}

/// A single glowing dot in the particle field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    /// Center, in display pixels
    pub position: Point,
    /// Core radius; the glow extends to twice this
    pub radius: f64,
    /// Opacity of the core, halved for the glow
    pub base_opacity: f64,
    /// Rise per frame for floating particles, angular rate for orbital ones
    pub speed: f64,
    /// Only advanced for orbital particles
    pub angle: f64,
    /// Distance from the focal point while orbiting
    pub orbit_distance: f64,
    pub color: Color,
}

impl Particle {
    /// Create the particle at `index`, placed uniformly inside a `width` x `height` region.
    ///
    /// Random values are drawn in a fixed order (x, y, radius, opacity, speed, angle, orbit
    /// distance) so a given random sequence always yields the same particle.
    pub fn spawn(index: usize, width: f64, height: f64, palette: &[Color], rng: &mut dyn RandomSource) -> Self {
        let position = Point::new(rng.range(0.0, width), rng.range(0.0, height));
        let radius = rng.range(0.5, 2.5);
        let base_opacity = rng.range(0.2, 0.8);
        let speed = rng.range(0.2, 1.0);
        let angle = rng.range(0.0, TAU);
        let orbit_distance = rng.range(50.0, 150.0);
        let color = palette.get(index % palette.len().max(1)).copied().unwrap_or(super::common::RADAR_CYAN);
        Self { position, radius, base_opacity, speed, angle, orbit_distance, color }
    }

    /// Advance this particle by one frame
    pub fn advance(
        &mut self,
        index: usize,
        frame: u64,
        focal_point: Point,
        width: f64,
        height: f64,
        rng: &mut dyn RandomSource,
    ) {
        match Behavior::for_index(index) {
            Behavior::Floating => {
                self.position.y -= self.speed;
                if self.position.y < -FLOAT_WRAP_MARGIN {
                    self.position.y = height + FLOAT_WRAP_MARGIN;
                    self.position.x = rng.range(0.0, width);
                }
            }
            Behavior::Orbital => {
                self.angle += self.speed * ORBIT_STEP;
                self.position = focal_point.polar(self.angle, self.orbit_distance);
            }
            Behavior::Drifting => {
                let phase = frame as f64 * 0.01 + index as f64;
                self.position.x += phase.sin() * 0.5;
                self.position.y += phase.cos() * 0.3;

                if self.position.x > width {
                    self.position.x = 0.0;
                }
                if self.position.x < 0.0 {
                    self.position.x = width;
                }
                if self.position.y > height {
                    self.position.y = 0.0;
                }
                if self.position.y < 0.0 {
                    self.position.y = height;
                }
            }
        }
    }

    /// Outer glow at twice the radius and half the opacity, then the core
    pub fn draw(&self, ctx: &mut dyn DrawingContext) {
        ctx.fill_circle(self.position, self.radius * 2.0, self.color.with_alpha(self.base_opacity * 0.5));
        ctx.fill_circle(self.position, self.radius, self.color.with_alpha(self.base_opacity));
    }
}
