//! Freehand stroke rendering.
//!
//! A stroke is painted incrementally: the start point as a dot, then one
//! capsule per pointer move joining the previous point to the new one. Fast
//! pointer movement therefore never leaves gaps between samples.

use image::Rgba;

use super::coords::Point;
use super::raster::{MaskRaster, HIGHLIGHT};

pub const MIN_BRUSH_SIZE: f32 = 5.0;
pub const MAX_BRUSH_SIZE: f32 = 100.0;
pub const DEFAULT_BRUSH_SIZE: f32 = 30.0;

/// Clamps a requested brush size into the supported range.
pub fn clamp_brush_size(size: f32) -> f32 {
    if size.is_nan() {
        return DEFAULT_BRUSH_SIZE;
    }
    size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)
}

/// Points of one pointer gesture, already in raster space.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushStroke {
    pub points: Vec<Point>,
    /// Raster-space line width.
    pub width: f32,
}

impl BrushStroke {
    pub fn new(start: Point, width: f32) -> Self {
        Self {
            points: vec![start],
            width,
        }
    }

    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }
}

/// Paints strokes onto a raster with round caps and joins.
#[derive(Debug, Clone, Copy)]
pub struct StrokeRenderer {
    color: Rgba<u8>,
}

impl Default for StrokeRenderer {
    fn default() -> Self {
        Self { color: HIGHLIGHT }
    }
}

impl StrokeRenderer {
    /// Opens a new path at `start` and paints its initial dot.
    pub fn begin(&self, raster: &mut MaskRaster, start: Point, width: f32) -> BrushStroke {
        let stroke = BrushStroke::new(start, width);
        raster.paint_segment(start, start, width * 0.5, self.color);
        stroke
    }

    /// Extends the open stroke to `next`, painting the joining segment.
    pub fn extend(&self, raster: &mut MaskRaster, stroke: &mut BrushStroke, next: Point) {
        let from = stroke.last().unwrap_or(next);
        raster.paint_segment(from, next, stroke.width * 0.5, self.color);
        stroke.points.push(next);
    }

    /// Paints a whole stroke in one go.
    pub fn paint(&self, raster: &mut MaskRaster, stroke: &BrushStroke) {
        let radius = stroke.width * 0.5;
        match stroke.points.as_slice() {
            [] => {}
            [only] => raster.paint_segment(*only, *only, radius, self.color),
            points => {
                for pair in points.windows(2) {
                    raster.paint_segment(pair[0], pair[1], radius, self.color);
                }
            }
        }
    }
}
