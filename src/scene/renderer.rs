use super::common::Point;
use super::grid::draw_grid;
use super::particle::Particle;
use super::rings::draw_rings;
use super::sweep::{draw_sweep, sweep_angle};
use crate::config::SceneConfig;
use crate::random::RandomSource;
use crate::surface::DrawingContext;
use crate::viewport::ViewportSize;

/// The animated radar backdrop: frame clock, particle field and the viewport they live in
pub struct SceneRenderer {
    config: SceneConfig,
    frame: u64,
    particles: Vec<Particle>,
    viewport: ViewportSize,
    rng: Box<dyn RandomSource>,
}

impl SceneRenderer {
    /// Create a renderer with its frame clock at zero and a fresh particle field spread over the
    /// viewport
    pub fn new(config: SceneConfig, viewport: ViewportSize, mut rng: Box<dyn RandomSource>) -> Self {
        let particles = (0..config.particle_count)
            .map(|index| Particle::spawn(index, viewport.width, viewport.height, &config.palette, rng.as_mut()))
            .collect();
        Self { config, frame: 0, particles, viewport, rng }
    }

    /// Frames drawn so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// The point the rings, sweep and orbits are centered on
    pub fn focal_point(&self) -> Point {
        Point::new(self.viewport.width * self.config.focal_x, self.viewport.height * self.config.focal_y)
    }

    /// Takes effect on the next frame
    pub fn resize(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
    }

    /// Draw one frame and advance the frame clock
    pub fn draw_frame(&mut self, ctx: &mut dyn DrawingContext) {
        let ViewportSize { width, height, .. } = self.viewport;
        let frame = self.frame;
        let config = &self.config;

        ctx.clear_rect(0.0, 0.0, width, height);

        let center = self.focal_point();
        draw_rings(ctx, center, config.ring_count, config.max_radius, frame);
        draw_sweep(ctx, center, config.max_radius, sweep_angle(frame, config.sweep_speed), config.trail_length);

        for (index, particle) in self.particles.iter_mut().enumerate() {
            particle.advance(index, frame, center, width, height, self.rng.as_mut());
            particle.draw(ctx);
        }

        draw_grid(ctx, width, height, config.grid_spacing, frame);

        self.frame += 1;
    }
}
