mod common;
mod grid;
mod particle;
mod renderer;
mod rings;
mod sweep;

pub use common::{Color, PALETTE, Point, RADAR_CYAN, Rgba};
pub use grid::grid_opacity;
pub use particle::{Behavior, Particle};
pub use renderer::SceneRenderer;
pub use rings::{PULSE_AMPLITUDE, Ring};
pub use sweep::{beam_gradient, sweep_angle, trail_line};
