//! The live mask bitmap.

use image::{Rgba, RgbaImage};

use super::coords::Point;

/// Colour painted onto the raster: a translucent highlight over the photo.
pub const HIGHLIGHT: Rgba<u8> = Rgba([255, 59, 48, 128]);

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Copy of the raster's pixels.
///
/// Masks are mostly long runs of one colour, so pixels are kept run-length
/// encoded unless that would be larger than the raw buffer. Never re-encoded
/// through an image codec, so restoring is pixel-exact.
#[derive(Clone, PartialEq, Eq)]
pub struct MaskSnapshot {
    width: u32,
    height: u32,
    storage: SnapshotStorage,
}

#[derive(Clone, PartialEq, Eq)]
enum SnapshotStorage {
    Runs(Vec<(Rgba<u8>, u32)>),
    Raw(Vec<u8>),
}

impl MaskSnapshot {
    fn capture(pixels: &RgbaImage) -> Self {
        let (width, height) = pixels.dimensions();
        let raw_len = pixels.as_raw().len();
        let max_runs = raw_len / RUN_BYTES;

        let mut runs: Vec<(Rgba<u8>, u32)> = Vec::new();
        for pixel in pixels.pixels() {
            match runs.last_mut() {
                Some((color, len)) if *color == *pixel => *len += 1,
                _ => {
                    if runs.len() == max_runs {
                        return Self {
                            width,
                            height,
                            storage: SnapshotStorage::Raw(pixels.as_raw().clone()),
                        };
                    }
                    runs.push((*pixel, 1));
                }
            }
        }
        runs.shrink_to_fit();
        Self {
            width,
            height,
            storage: SnapshotStorage::Runs(runs),
        }
    }

    fn write_into(&self, pixels: &mut RgbaImage) {
        match &self.storage {
            SnapshotStorage::Raw(raw) => {
                let target: &mut [u8] = pixels;
                target.copy_from_slice(raw);
            }
            SnapshotStorage::Runs(runs) => {
                let mut out = pixels.pixels_mut();
                for (color, len) in runs {
                    for pixel in out.by_ref().take(*len as usize) {
                        *pixel = *color;
                    }
                }
            }
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bytes held by the pixel storage.
    pub fn byte_len(&self) -> usize {
        match &self.storage {
            SnapshotStorage::Runs(runs) => runs.len() * RUN_BYTES,
            SnapshotStorage::Raw(raw) => raw.len(),
        }
    }
}

const RUN_BYTES: usize = std::mem::size_of::<(Rgba<u8>, u32)>();

impl std::fmt::Debug for MaskSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MaskSnapshot({}x{}, {} bytes)", self.width, self.height, self.byte_len())
    }
}

/// In-memory RGBA buffer sized to the source image, not the display.
#[derive(Clone)]
pub struct MaskRaster {
    pixels: RgbaImage,
}

impl MaskRaster {
    /// A fully transparent raster.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, TRANSPARENT),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| *p == TRANSPARENT)
    }

    pub fn snapshot(&self) -> MaskSnapshot {
        MaskSnapshot::capture(&self.pixels)
    }

    /// Replaces the contents with a snapshot taken from a raster of the same size.
    ///
    /// Returns `false` (and leaves the raster untouched) on a size mismatch.
    pub fn restore(&mut self, snapshot: &MaskSnapshot) -> bool {
        if snapshot.dimensions() != self.dimensions() {
            return false;
        }
        snapshot.write_into(&mut self.pixels);
        true
    }

    /// Paints a capsule of radius `radius` around the segment `a`–`b` in `color`.
    ///
    /// A zero-length segment paints a disc, which gives both round caps and
    /// round joins when consecutive segments share end points. Coverage is
    /// tested at pixel centres.
    pub fn paint_segment(&mut self, a: Point, b: Point, radius: f32, color: Rgba<u8>) {
        if radius <= 0.0 || !radius.is_finite() {
            return;
        }
        let (w, h) = self.dimensions();
        if w == 0 || h == 0 {
            return;
        }

        let min_x = (a.x.min(b.x) - radius).floor().max(0.0);
        let min_y = (a.y.min(b.y) - radius).floor().max(0.0);
        let max_x = (a.x.max(b.x) + radius).ceil().min(w as f32);
        let max_y = (a.y.max(b.y) + radius).ceil().min(h as f32);
        if min_x >= max_x || min_y >= max_y {
            return;
        }

        let r2 = radius * radius;
        for y in min_y as u32..max_y as u32 {
            for x in min_x as u32..max_x as u32 {
                let centre = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                if distance_sq_to_segment(centre, a, b) <= r2 {
                    self.pixels.put_pixel(x, y, color);
                }
            }
        }
    }
}

fn distance_sq_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0)
    };
    let dx = p.x - (a.x + abx * t);
    let dy = p.y - (a.y + aby * t);
    dx * dx + dy * dy
}
