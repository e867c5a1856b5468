//! Display-space to raster-space coordinate mapping.
//!
//! The surface is usually shown smaller (or larger) than the bitmap it edits.
//! Pointer positions arrive relative to the viewport, so they must be shifted
//! by the surface's on-screen origin and then scaled by
//! `raster size / displayed size` on each axis independently.

/// A point in either display or raster space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The surface's on-screen bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A box at the origin, e.g. when the caller already reports local coordinates.
    pub const fn sized(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    fn has_area(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Maps between one display box and one raster size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    surface: DisplayRect,
    scale_x: f32,
    scale_y: f32,
}

impl CoordinateMapper {
    /// Returns `None` when the surface has no visible area (collapsed layout)
    /// or the raster is empty.
    pub fn new(surface: DisplayRect, raster_width: u32, raster_height: u32) -> Option<Self> {
        if !surface.has_area() || raster_width == 0 || raster_height == 0 {
            return None;
        }
        Some(Self {
            surface,
            scale_x: raster_width as f32 / surface.width,
            scale_y: raster_height as f32 / surface.height,
        })
    }

    pub fn to_raster(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.surface.left) * self.scale_x,
            y: (screen.y - self.surface.top) * self.scale_y,
        }
    }

    pub fn to_display(&self, raster: Point) -> Point {
        Point {
            x: raster.x / self.scale_x + self.surface.left,
            y: raster.y / self.scale_y + self.surface.top,
        }
    }

    /// Scales a display-space brush width into raster pixels.
    ///
    /// Uses the mean of both axis ratios so a slightly non-uniform layout
    /// does not favour one axis.
    pub fn scale_width(&self, display_width: f32) -> f32 {
        display_width * (self.scale_x + self.scale_y) * 0.5
    }

    pub fn scale(&self) -> (f32, f32) {
        (self.scale_x, self.scale_y)
    }
}
