use super::common::{Point, RADAR_CYAN};
use crate::surface::{DrawingContext, GradientStop, LinearGradient, Stroke};

/// Angular gap between consecutive trail lines
const TRAIL_SPACING: f64 = 0.1;

const SWEEP_WIDTH: f64 = 3.0;

/// Sweep beam angle in radians. Grows without bound; it is never wrapped.
pub fn sweep_angle(frame: u64, speed: f64) -> f64 {
    frame as f64 * speed
}

/// Bright at the focal point, fading to nothing at the beam's tip
pub fn beam_gradient() -> LinearGradient {
    LinearGradient::new(vec![
        GradientStop { offset: 0.0, color: RADAR_CYAN.with_alpha(0.9) },
        GradientStop { offset: 0.7, color: RADAR_CYAN.with_alpha(0.4) },
        GradientStop { offset: 1.0, color: RADAR_CYAN.with_alpha(0.0) },
    ])
}

/// Trail line `i` (1-based): its angle and stroke
pub fn trail_line(sweep_angle: f64, i: u32) -> (f64, Stroke) {
    let i = i.max(1) as f64;
    let angle = sweep_angle - i * TRAIL_SPACING;
    (angle, Stroke::new(RADAR_CYAN.with_alpha(0.3 / i), 2.0 / i))
}

/// Draw the beam followed by its fading trail
pub fn draw_sweep(ctx: &mut dyn DrawingContext, center: Point, length: f64, angle: f64, trail_length: u32) {
    let tip = center.polar(angle, length);
    ctx.stroke_gradient_line(center, tip, &beam_gradient(), SWEEP_WIDTH);

    for i in 1..=trail_length {
        let (trail_angle, stroke) = trail_line(angle, i);
        ctx.stroke_line(center, center.polar(trail_angle, length), stroke);
    }
}
