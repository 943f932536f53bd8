use super::common::{Point, RADAR_CYAN};
use crate::surface::{DrawingContext, Stroke};

/// How far a ring's radius swings around its base radius
pub const PULSE_AMPLITUDE: f64 = 5.0;

/// Geometry of one pulsing ring at a given frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    pub base_radius: f64,
    pub radius: f64,
    pub opacity: f64,
}

impl Ring {
    /// Ring `k` (1-based) of `count` evenly spaced rings reaching out to `max_radius`
    pub fn at(k: u32, count: u32, max_radius: f64, frame: u64) -> Self {
        let k = k as f64;
        let time = frame as f64;
        let base_radius = max_radius / count.max(1) as f64 * k;
        let radius = base_radius + (time * 0.02 + k).sin() * PULSE_AMPLITUDE;
        let opacity = 0.08 + (time * 0.015 + k * 0.5).sin() * 0.04;
        Self { base_radius, radius, opacity }
    }

    /// Stroke the ring and then a wider, fainter copy as a glow
    pub fn draw(&self, ctx: &mut dyn DrawingContext, center: Point) {
        ctx.stroke_arc(center, self.radius, Stroke::new(RADAR_CYAN.with_alpha(self.opacity), 1.5));
        ctx.stroke_arc(center, self.radius, Stroke::new(RADAR_CYAN.with_alpha(self.opacity * 0.3), 3.0));
    }
}

pub fn draw_rings(ctx: &mut dyn DrawingContext, center: Point, count: u32, max_radius: f64, frame: u64) {
    for k in 1..=count {
        Ring::at(k, count, max_radius, frame).draw(ctx, center);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawOperation, RecordingSurface};
    use rstest::rstest;

    #[test]
    fn outer_ring_starts_at_max_radius() {
        let ring = Ring::at(4, 4, 250.0, 0);
        assert_eq!(ring.base_radius, 250.0);
        assert!((ring.radius - (250.0 + 4f64.sin() * 5.0)).abs() < 1e-12);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    fn pulse_and_fade_phases(#[case] k: u32) {
        let ring = Ring::at(k, 4, 250.0, 100);
        let k = k as f64;
        assert!((ring.radius - (62.5 * k + 5.0 * (2.0 + k).sin())).abs() < 1e-9);
        assert!((ring.opacity - (0.08 + 0.04 * (1.5 + 0.5 * k).sin())).abs() < 1e-12);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    fn radius_stays_within_pulse(#[case] k: u32) {
        for frame in (0..10_000).step_by(7) {
            let ring = Ring::at(k, 4, 250.0, frame);
            assert_eq!(ring.base_radius, 62.5 * k as f64);
            assert!((ring.radius - ring.base_radius).abs() <= PULSE_AMPLITUDE + 1e-12);
            assert!((0.04 - 1e-12..=0.12 + 1e-12).contains(&ring.opacity));
        }
    }

    #[test]
    fn each_ring_is_stroked_twice() {
        let mut surface = RecordingSurface::new();
        draw_rings(&mut surface, Point::new(560.0, 300.0), 4, 250.0, 30);
        let strokes: Vec<_> = surface
            .operations()
            .iter()
            .map(|op| match op {
                DrawOperation::StrokeArc { stroke, .. } => *stroke,
                other => panic!("unexpected operation {other:?}"),
            })
            .collect();
        assert_eq!(strokes.len(), 8);
        for pair in strokes.chunks(2) {
            assert_eq!(pair[0].width, 1.5);
            assert_eq!(pair[1].width, 3.0);
            assert!((pair[1].color.alpha - pair[0].color.alpha * 0.3).abs() < 1e-12);
        }
    }
}
