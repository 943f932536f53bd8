use crate::scene::{Color, Point, RADAR_CYAN, Rgba};
use crate::surface::{DrawingContext, GradientStop, LinearGradient, Stroke};
use image::{ImageBuffer, Rgb, RgbImage, RgbaImage};
use std::path::Path;

/// What a transparent scene is flattened onto: an opaque color, optionally lit by an elliptical
/// glow centered on the image
#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    pub color: Color,
    /// Sampled from the center (offset 0) out to the corners (offset 1)
    pub glow: Option<LinearGradient>,
}

impl Backdrop {
    pub fn solid(color: Color) -> Self {
        Self { color, glow: None }
    }

    /// A faint cyan core fading through emerald to nothing at 70 % of the way to the corners
    pub fn glowing(color: Color) -> Self {
        let emerald = Color::new(16, 185, 129);
        let glow = LinearGradient::new(vec![
            GradientStop { offset: 0.0, color: RADAR_CYAN.with_alpha(0.15) },
            GradientStop { offset: 0.4, color: emerald.with_alpha(0.08) },
            GradientStop { offset: 0.7, color: emerald.with_alpha(0.0) },
        ]);
        Self { color, glow: Some(glow) }
    }

    /// Opaque color of backing pixel (x, y) in a `width` x `height` image
    fn pixel(&self, x: u32, y: u32, width: u32, height: u32) -> [f64; 3] {
        let base = [self.color.r as f64, self.color.g as f64, self.color.b as f64];
        let Some(glow) = self.glow.as_ref().and_then(|glow| {
            let (half_w, half_h) = (width as f64 / 2.0, height as f64 / 2.0);
            let nx = (x as f64 + 0.5 - half_w) / half_w;
            let ny = (y as f64 + 0.5 - half_h) / half_h;
            // The ellipse through the corners has radii sqrt(2) times the half extents.
            glow.sample((nx * nx + ny * ny).sqrt() / std::f64::consts::SQRT_2)
        }) else {
            return base;
        };
        let a = glow.alpha;
        let over = |fg: u8, bg: f64| fg as f64 * a + bg * (1.0 - a);
        [over(glow.color.r, base[0]), over(glow.color.g, base[1]), over(glow.color.b, base[2])]
    }
}

/// A software drawing context backed by an RGBA image.
///
/// Shapes are anti-aliased by pixel coverage and composited with source-over blending. The image
/// stores straight (non premultiplied) alpha.
pub struct RasterSurface {
    image: RgbaImage,
    scale: f64,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { image: RgbaImage::new(width, height), scale: 1.0 }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Composite the (transparent) surface over an opaque backdrop
    pub fn flatten(&self, backdrop: &Backdrop) -> RgbImage {
        let (width, height) = self.image.dimensions();
        ImageBuffer::from_fn(width, height, |x, y| {
            let [r, g, b, a] = self.image.get_pixel(x, y).0;
            let [br, bg, bb] = backdrop.pixel(x, y, width, height);
            let alpha = a as f64 / 255.0;
            let mix = |fg: u8, bg: f64| (fg as f64 * alpha + bg * (1.0 - alpha)).round().clamp(0.0, 255.0) as u8;
            Rgb([mix(r, br), mix(g, bg), mix(b, bb)])
        })
    }

    /// Write the flattened surface as a PNG
    pub fn save_png(&self, path: &Path, backdrop: &Backdrop) -> Result<(), SnapshotError> {
        self.flatten(backdrop).save(path).map_err(|e| SnapshotError::Write(path.display().to_string(), e))
    }

    /// Blend `color` into the pixel at (x, y) with the given coverage
    fn blend(&mut self, x: u32, y: u32, color: Rgba, coverage: f64) {
        let src_alpha = (color.alpha * coverage).clamp(0.0, 1.0);
        if src_alpha <= 0.0 {
            return;
        }
        let pixel = self.image.get_pixel_mut(x, y);
        let [dr, dg, db, da] = pixel.0;
        let dst_alpha = da as f64 / 255.0;
        let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
        let channel = |src: u8, dst: u8| {
            let value = (src as f64 * src_alpha + dst as f64 * dst_alpha * (1.0 - src_alpha)) / out_alpha;
            value.round().clamp(0.0, 255.0) as u8
        };
        pixel.0 = [
            channel(color.color.r, dr),
            channel(color.color.g, dg),
            channel(color.color.b, db),
            (out_alpha * 255.0).round() as u8,
        ];
    }

    /// Visit every backing pixel whose center lies within `reach` display pixels of the box
    /// `min..max`, passing the pixel center in display coordinates
    fn for_each_pixel(&mut self, min: Point, max: Point, reach: f64, mut visit: impl FnMut(&mut Self, u32, u32, Point)) {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 || self.scale <= 0.0 {
            return;
        }
        let to_backing = |value: f64, limit: u32| (value * self.scale).floor().clamp(0.0, limit as f64) as u32;
        let x0 = to_backing(min.x - reach, width);
        let x1 = to_backing(max.x + reach, width - 1);
        let y0 = to_backing(min.y - reach, height);
        let y1 = to_backing(max.y + reach, height - 1);
        if x0 > x1 || y0 > y1 {
            return;
        }
        let scale = self.scale;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let center = Point::new((x as f64 + 0.5) / scale, (y as f64 + 0.5) / scale);
                visit(self, x, y, center);
            }
        }
    }

    /// Coverage of a pixel whose center is `distance` (display pixels) inside an edge
    fn coverage(&self, distance: f64) -> f64 {
        (distance * self.scale + 0.5).clamp(0.0, 1.0)
    }

    /// Widths below a backing pixel are drawn one pixel wide with proportionally reduced alpha
    fn effective_stroke(&self, width: f64, alpha: f64) -> (f64, f64) {
        let minimum = 1.0 / self.scale;
        if width < minimum { (minimum, alpha * width / minimum) } else { (width, alpha) }
    }

    fn stroke_segment(&mut self, from: Point, to: Point, width: f64, color_at: impl Fn(f64) -> Rgba) {
        let min = Point::new(from.x.min(to.x), from.y.min(to.y));
        let max = Point::new(from.x.max(to.x), from.y.max(to.y));
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let length_squared = dx * dx + dy * dy;
        let half = width / 2.0;
        self.for_each_pixel(min, max, half + 1.0, |surface, x, y, p| {
            let t = if length_squared > 0.0 {
                (((p.x - from.x) * dx + (p.y - from.y) * dy) / length_squared).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let nearest = Point::new(from.x + dx * t, from.y + dy * t);
            let coverage = surface.coverage(half - p.distance_to(nearest));
            if coverage > 0.0 {
                surface.blend(x, y, color_at(t), coverage);
            }
        });
    }
}

impl DrawingContext for RasterSurface {
    fn resize_backing(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
        self.scale = 1.0;
    }

    fn set_scale(&mut self, ratio: f64) {
        self.scale = ratio;
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let (image_width, image_height) = self.image.dimensions();
        let to_backing = |value: f64, limit: u32| (value * self.scale).round().clamp(0.0, limit as f64) as u32;
        let (x0, x1) = (to_backing(x, image_width), to_backing(x + width, image_width));
        let (y0, y1) = (to_backing(y, image_height), to_backing(y + height, image_height));
        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px, py, image::Rgba([0, 0, 0, 0]));
            }
        }
    }

    fn stroke_arc(&mut self, center: Point, radius: f64, stroke: Stroke) {
        let (width, alpha) = self.effective_stroke(stroke.width, stroke.color.alpha);
        let color = Rgba { alpha, ..stroke.color };
        let half = width / 2.0;
        let reach = radius + half + 1.0;
        let min = Point::new(center.x - reach, center.y - reach);
        let max = Point::new(center.x + reach, center.y + reach);
        self.for_each_pixel(min, max, 0.0, |surface, x, y, p| {
            let coverage = surface.coverage(half - (p.distance_to(center) - radius).abs());
            if coverage > 0.0 {
                surface.blend(x, y, color, coverage);
            }
        });
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        let (width, alpha) = self.effective_stroke(stroke.width, stroke.color.alpha);
        let color = Rgba { alpha, ..stroke.color };
        self.stroke_segment(from, to, width, |_| color);
    }

    fn stroke_gradient_line(&mut self, from: Point, to: Point, gradient: &LinearGradient, width: f64) {
        let (width, factor) = self.effective_stroke(width, 1.0);
        let fallback = Color::new(0, 0, 0).with_alpha(0.0);
        self.stroke_segment(from, to, width, |t| {
            let color = gradient.sample(t).unwrap_or(fallback);
            Rgba { alpha: color.alpha * factor, ..color }
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        let min = Point::new(center.x - radius, center.y - radius);
        let max = Point::new(center.x + radius, center.y + radius);
        self.for_each_pixel(min, max, 1.0, |surface, x, y, p| {
            let coverage = surface.coverage(radius - p.distance_to(center));
            if coverage > 0.0 {
                surface.blend(x, y, color, coverage);
            }
        });
    }
}

/// Errors that can occur when writing a snapshot
#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("writing snapshot to {0}: {1}")]
    Write(String, image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha_at(surface: &RasterSurface, x: u32, y: u32) -> u8 {
        surface.image().get_pixel(x, y).0[3]
    }

    #[test]
    fn fill_circle_covers_center_not_corners() {
        let mut surface = RasterSurface::new(20, 20);
        surface.fill_circle(Point::new(10.0, 10.0), 4.0, RADAR_CYAN.with_alpha(1.0));
        assert_eq!(surface.image().get_pixel(10, 10).0, [0, 229, 255, 255]);
        assert_eq!(alpha_at(&surface, 0, 0), 0);
        assert_eq!(alpha_at(&surface, 19, 19), 0);
    }

    #[test]
    fn scale_maps_display_to_backing_pixels() {
        let mut surface = RasterSurface::new(40, 40);
        surface.set_scale(2.0);
        surface.fill_circle(Point::new(15.0, 15.0), 2.0, RADAR_CYAN.with_alpha(1.0));
        assert_eq!(alpha_at(&surface, 30, 30), 255);
        assert_eq!(alpha_at(&surface, 15, 15), 0);
    }

    #[test]
    fn translucent_layers_accumulate() {
        let mut surface = RasterSurface::new(10, 10);
        let color = RADAR_CYAN.with_alpha(0.5);
        surface.fill_circle(Point::new(5.0, 5.0), 3.0, color);
        let once = alpha_at(&surface, 5, 5);
        surface.fill_circle(Point::new(5.0, 5.0), 3.0, color);
        let twice = alpha_at(&surface, 5, 5);
        assert_eq!(once, 128);
        assert!(twice > once);
    }

    #[test]
    fn clear_rect_erases() {
        let mut surface = RasterSurface::new(10, 10);
        surface.fill_circle(Point::new(5.0, 5.0), 5.0, RADAR_CYAN.with_alpha(1.0));
        surface.clear_rect(0.0, 0.0, 10.0, 10.0);
        assert!(surface.image().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn lines_and_arcs_leave_ink() {
        let mut surface = RasterSurface::new(50, 50);
        surface.stroke_line(Point::new(0.0, 25.0), Point::new(50.0, 25.0), Stroke::new(RADAR_CYAN.with_alpha(1.0), 2.0));
        assert!(alpha_at(&surface, 10, 25) > 200);
        assert_eq!(alpha_at(&surface, 10, 5), 0);

        surface.stroke_arc(Point::new(25.0, 25.0), 10.0, Stroke::new(RADAR_CYAN.with_alpha(1.0), 2.0));
        assert!(alpha_at(&surface, 25, 15) > 200);
        assert_eq!(alpha_at(&surface, 25, 20), 0);
    }

    #[test]
    fn gradient_line_fades_towards_tip() {
        let mut surface = RasterSurface::new(100, 10);
        let gradient = crate::scene::beam_gradient();
        surface.stroke_gradient_line(Point::new(0.0, 5.0), Point::new(100.0, 5.0), &gradient, 3.0);
        assert!(alpha_at(&surface, 2, 5) > alpha_at(&surface, 60, 5));
        assert!(alpha_at(&surface, 60, 5) > alpha_at(&surface, 98, 5));
    }

    #[test]
    fn flatten_over_background() {
        let mut surface = RasterSurface::new(4, 4);
        surface.fill_circle(Point::new(2.0, 2.0), 10.0, Color::new(255, 255, 255).with_alpha(1.0));
        let backdrop = Backdrop::solid(Color::new(2, 6, 23));
        let flat = surface.flatten(&backdrop);
        assert_eq!(flat.get_pixel(1, 1).0, [255, 255, 255]);

        let empty = RasterSurface::new(2, 2).flatten(&backdrop);
        assert_eq!(empty.get_pixel(0, 0).0, [2, 6, 23]);
    }

    #[test]
    fn glow_lights_the_center_only() {
        let backdrop = Backdrop::glowing(Color::new(2, 6, 23));
        let flat = RasterSurface::new(4, 4).flatten(&backdrop);

        // Corners lie past the 70 % stop.
        assert_eq!(flat.get_pixel(0, 0).0, [2, 6, 23]);
        assert_eq!(flat.get_pixel(3, 3).0, [2, 6, 23]);

        // A quarter of the way out: 0.15 fading towards 0.08 cyan-to-emerald.
        let glow = backdrop.glow.as_ref().and_then(|glow| glow.sample(0.25)).expect("glow stops");
        assert!((glow.alpha - 0.10625).abs() < 1e-12);
        let center = flat.get_pixel(2, 2).0;
        let expected_green = (glow.color.g as f64 * glow.alpha + 6.0 * (1.0 - glow.alpha)).round() as u8;
        assert!(center[1].abs_diff(expected_green) <= 1);
        assert!(center[2] > 23);
    }

    #[test]
    fn opaque_ink_hides_the_glow() {
        let mut surface = RasterSurface::new(4, 4);
        surface.fill_circle(Point::new(2.0, 2.0), 10.0, Color::new(255, 255, 255).with_alpha(1.0));
        let flat = surface.flatten(&Backdrop::glowing(Color::new(2, 6, 23)));
        assert_eq!(flat.get_pixel(2, 2).0, [255, 255, 255]);
    }

    #[test]
    fn resize_resets_scale_and_pixels() {
        let mut surface = RasterSurface::new(4, 4);
        surface.set_scale(3.0);
        surface.resize_backing(8, 6);
        assert_eq!(surface.image().dimensions(), (8, 6));
        assert_eq!(surface.scale(), 1.0);
    }

    #[test]
    fn save_png_writes_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("frame.png");
        let mut surface = RasterSurface::new(8, 8);
        surface.fill_circle(Point::new(4.0, 4.0), 2.0, RADAR_CYAN.with_alpha(1.0));
        surface.save_png(&path, &Backdrop::solid(Color::new(0, 0, 0))).expect("png written");
        let loaded = image::open(&path).expect("readable png");
        assert_eq!((loaded.width(), loaded.height()), (8, 8));
    }
}
