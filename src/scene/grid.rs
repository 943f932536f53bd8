use super::common::{Point, RADAR_CYAN};
use crate::surface::{DrawingContext, Stroke};

const GRID_LINE_WIDTH: f64 = 0.5;

/// Slow global flicker, between 0.01 and 0.05
pub fn grid_opacity(frame: u64) -> f64 {
    0.03 + (frame as f64 * 0.02).sin() * 0.02
}

/// Offsets `0, spacing, 2*spacing, ...` strictly below `extent`
fn line_offsets(extent: f64, spacing: f64) -> impl Iterator<Item = f64> {
    let count = if spacing > 0.0 && extent > 0.0 { (extent / spacing).ceil() as usize } else { 0 };
    (0..count).map(move |i| i as f64 * spacing).filter(move |offset| *offset < extent)
}

pub fn draw_grid(ctx: &mut dyn DrawingContext, width: f64, height: f64, spacing: f64, frame: u64) {
    let stroke = Stroke::new(RADAR_CYAN.with_alpha(grid_opacity(frame)), GRID_LINE_WIDTH);
    for x in line_offsets(width, spacing) {
        ctx.stroke_line(Point::new(x, 0.0), Point::new(x, height), stroke);
    }
    for y in line_offsets(height, spacing) {
        ctx.stroke_line(Point::new(0.0, y), Point::new(width, y), stroke);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawOperation, RecordingSurface};
    use rstest::rstest;

    #[rstest]
    #[case(800.0, 40.0, 20)]
    #[case(801.0, 40.0, 21)]
    #[case(39.0, 40.0, 1)]
    #[case(0.0, 40.0, 0)]
    #[case(100.0, 0.0, 0)]
    fn offsets(#[case] extent: f64, #[case] spacing: f64, #[case] expected: usize) {
        assert_eq!(line_offsets(extent, spacing).count(), expected);
    }

    #[test]
    fn opacity_flickers_within_bounds() {
        assert_eq!(grid_opacity(0), 0.03);
        for frame in 0..1_000 {
            let opacity = grid_opacity(frame);
            assert!((0.01 - 1e-12..=0.05 + 1e-12).contains(&opacity));
        }
    }

    #[rstest]
    #[case(100, 2.0)]
    #[case(250, 5.0)]
    fn opacity_phase(#[case] frame: u64, #[case] phase: f64) {
        assert!((grid_opacity(frame) - (0.03 + 0.02 * phase.sin())).abs() < 1e-12);
    }

    #[test]
    fn draws_vertical_then_horizontal_lines() {
        let mut surface = RecordingSurface::new();
        draw_grid(&mut surface, 800.0, 600.0, 40.0, 0);
        let ops = surface.operations();
        assert_eq!(ops.len(), 20 + 15);
        match (&ops[1], &ops[20]) {
            (DrawOperation::StrokeLine { from: vertical, stroke, .. }, DrawOperation::StrokeLine { to: horizontal, .. }) => {
                assert_eq!(*vertical, Point::new(40.0, 0.0));
                assert_eq!(*horizontal, Point::new(800.0, 0.0));
                assert_eq!(stroke.width, 0.5);
            }
            other => panic!("unexpected operations {other:?}"),
        }
    }
}
