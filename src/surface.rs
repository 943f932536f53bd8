use crate::scene::{Point, Rgba};
use crate::viewport::ViewportSize;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Line color and width
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f64,
}

impl Stroke {
    pub fn new(color: Rgba, width: f64) -> Self {
        Self { color, width }
    }
}

/// A color stop within a gradient
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradientStop {
    /// Position along the gradient, in [0, 1]
    pub offset: f64,
    pub color: Rgba,
}

/// A linear gradient running from a line's start (offset 0) to its end (offset 1)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearGradient {
    stops: Vec<GradientStop>,
}

impl LinearGradient {
    /// Build a gradient; stops are sorted by offset.
    pub fn new(mut stops: Vec<GradientStop>) -> Self {
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self { stops }
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Color at position `t`, interpolating linearly between the surrounding stops
    pub fn sample(&self, t: f64) -> Option<Rgba> {
        let first = self.stops.first()?;
        let last = self.stops.last()?;
        if t <= first.offset {
            return Some(first.color);
        }
        if t >= last.offset {
            return Some(last.color);
        }
        for pair in self.stops.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            if t <= to.offset {
                let span = to.offset - from.offset;
                let local = if span > 0.0 { (t - from.offset) / span } else { 1.0 };
                return Some(from.color.lerp(to.color, local));
            }
        }
        Some(last.color)
    }
}

/// A persistent 2-D drawing context.
///
/// Coordinates are display pixels; the context maps them onto its backing store through the scale
/// set with [`DrawingContext::set_scale`].
pub trait DrawingContext {
    /// Resize the backing store, in physical pixels. This clears the surface and resets the scale
    /// to 1.
    fn resize_backing(&mut self, width: u32, height: u32);

    /// Set the display-to-backing scale factor
    fn set_scale(&mut self, ratio: f64);

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Stroke a full circle
    fn stroke_arc(&mut self, center: Point, radius: f64, stroke: Stroke);

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke);

    fn stroke_gradient_line(&mut self, from: Point, to: Point, gradient: &LinearGradient, width: f64);

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba);
}

impl<T: DrawingContext + ?Sized> DrawingContext for Box<T> {
    fn resize_backing(&mut self, width: u32, height: u32) {
        (**self).resize_backing(width, height)
    }

    fn set_scale(&mut self, ratio: f64) {
        (**self).set_scale(ratio)
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        (**self).clear_rect(x, y, width, height)
    }

    fn stroke_arc(&mut self, center: Point, radius: f64, stroke: Stroke) {
        (**self).stroke_arc(center, radius, stroke)
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        (**self).stroke_line(from, to, stroke)
    }

    fn stroke_gradient_line(&mut self, from: Point, to: Point, gradient: &LinearGradient, width: f64) {
        (**self).stroke_gradient_line(from, to, gradient, width)
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        (**self).fill_circle(center, radius, color)
    }
}

/// Lets a host keep a handle on a surface it lent to a mounted scene.
impl<T: DrawingContext> DrawingContext for Rc<RefCell<T>> {
    fn resize_backing(&mut self, width: u32, height: u32) {
        self.borrow_mut().resize_backing(width, height)
    }

    fn set_scale(&mut self, ratio: f64) {
        self.borrow_mut().set_scale(ratio)
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.borrow_mut().clear_rect(x, y, width, height)
    }

    fn stroke_arc(&mut self, center: Point, radius: f64, stroke: Stroke) {
        self.borrow_mut().stroke_arc(center, radius, stroke)
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.borrow_mut().stroke_line(from, to, stroke)
    }

    fn stroke_gradient_line(&mut self, from: Point, to: Point, gradient: &LinearGradient, width: f64) {
        self.borrow_mut().stroke_gradient_line(from, to, gradient, width)
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        self.borrow_mut().fill_circle(center, radius, color)
    }
}

/// Size the backing store for `size` and scale drawing so coordinates stay in display pixels
pub fn apply_viewport(ctx: &mut dyn DrawingContext, size: ViewportSize) {
    let (width, height) = size.backing_size();
    ctx.resize_backing(width, height);
    ctx.set_scale(size.pixel_ratio);
}

/// A single drawing call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOperation {
    ClearRect { x: f64, y: f64, width: f64, height: f64 },
    StrokeArc { center: Point, radius: f64, stroke: Stroke },
    StrokeLine { from: Point, to: Point, stroke: Stroke },
    StrokeGradientLine { from: Point, to: Point, gradient: LinearGradient, width: f64 },
    FillCircle { center: Point, radius: f64, color: Rgba },
}

/// A drawing context that records every call instead of producing pixels
#[derive(Debug)]
pub struct RecordingSurface {
    operations: Vec<DrawOperation>,
    backing_size: (u32, u32),
    scale: f64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self { operations: Vec::new(), backing_size: (0, 0), scale: 1.0 }
    }

    pub fn operations(&self) -> &[DrawOperation] {
        &self.operations
    }

    /// Drain the recorded operations
    pub fn take_operations(&mut self) -> Vec<DrawOperation> {
        std::mem::take(&mut self.operations)
    }

    pub fn backing_size(&self) -> (u32, u32) {
        self.backing_size
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingContext for RecordingSurface {
    fn resize_backing(&mut self, width: u32, height: u32) {
        self.backing_size = (width, height);
        self.scale = 1.0;
    }

    fn set_scale(&mut self, ratio: f64) {
        self.scale = ratio;
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.operations.push(DrawOperation::ClearRect { x, y, width, height });
    }

    fn stroke_arc(&mut self, center: Point, radius: f64, stroke: Stroke) {
        self.operations.push(DrawOperation::StrokeArc { center, radius, stroke });
    }

    fn stroke_line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.operations.push(DrawOperation::StrokeLine { from, to, stroke });
    }

    fn stroke_gradient_line(&mut self, from: Point, to: Point, gradient: &LinearGradient, width: f64) {
        self.operations.push(DrawOperation::StrokeGradientLine { from, to, gradient: gradient.clone(), width });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        self.operations.push(DrawOperation::FillCircle { center, radius, color });
    }
}
