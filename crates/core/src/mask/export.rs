//! Binary mask export.
//!
//! The painted raster holds a translucent highlight; the service wants a
//! strict black/white image. Any pixel with a colour channel above
//! [`PAINT_THRESHOLD`] becomes white (editable), everything else black
//! (preserved). Alpha is ignored, so partial transparency never matters.

use image::{DynamicImage, GrayImage, Luma, RgbaImage};

use super::raster::MaskRaster;
use crate::error::Result;
use crate::imaging::ImagePayload;

pub const PAINT_THRESHOLD: u8 = 32;

const WHITE: Luma<u8> = Luma([255]);
const BLACK: Luma<u8> = Luma([0]);

/// A black/white mask at the source image's pixel size, PNG-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedMask {
    pub payload: ImagePayload,
    pub width: u32,
    pub height: u32,
    /// Number of white pixels.
    pub painted_pixels: u64,
}

impl ExportedMask {
    /// True when nothing is marked for editing.
    pub fn is_empty(&self) -> bool {
        self.painted_pixels == 0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Fraction of the image marked for editing, in `0.0..=1.0`.
    pub fn coverage(&self) -> f64 {
        let total = self.width as u64 * self.height as u64;
        if total == 0 {
            return 0.0;
        }
        self.painted_pixels as f64 / total as f64
    }
}

/// Converts a raster into an [`ExportedMask`].
#[derive(Debug, Clone, Copy)]
pub struct MaskExporter {
    threshold: u8,
}

impl Default for MaskExporter {
    fn default() -> Self {
        Self {
            threshold: PAINT_THRESHOLD,
        }
    }
}

impl MaskExporter {
    pub fn with_threshold(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Applies the threshold rule, returning the binary bitmap and its white count.
    pub fn binarize(&self, raster: &MaskRaster) -> (GrayImage, u64) {
        self.binarize_pixels(raster.pixels())
    }

    fn binarize_pixels(&self, pixels: &RgbaImage) -> (GrayImage, u64) {
        let (width, height) = pixels.dimensions();
        let mut painted = 0u64;
        let mut out = GrayImage::new(width, height);
        for (src, dst) in pixels.pixels().zip(out.pixels_mut()) {
            let [r, g, b, _] = src.0;
            if r > self.threshold || g > self.threshold || b > self.threshold {
                *dst = WHITE;
                painted += 1;
            } else {
                *dst = BLACK;
            }
        }
        (out, painted)
    }

    /// Binarizes and PNG-encodes the raster. Identical rasters give identical bytes.
    pub fn export(&self, raster: &MaskRaster) -> Result<ExportedMask> {
        self.encode(self.binarize(raster))
    }

    /// Applies the same rule to an externally drawn mask image.
    pub fn import(&self, image: &DynamicImage) -> Result<ExportedMask> {
        self.encode(self.binarize_pixels(&image.to_rgba8()))
    }

    fn encode(&self, (bitmap, painted_pixels): (GrayImage, u64)) -> Result<ExportedMask> {
        let (width, height) = bitmap.dimensions();
        let payload = ImagePayload::encode_png(&DynamicImage::ImageLuma8(bitmap))?;
        Ok(ExportedMask {
            payload,
            width,
            height,
            painted_pixels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::coords::Point;
    use crate::mask::raster::HIGHLIGHT;

    #[test]
    fn translucent_paint_exports_as_pure_white() {
        let mut raster = MaskRaster::blank(20, 20);
        raster.paint_segment(Point::new(10.0, 10.0), Point::new(10.0, 10.0), 3.0, HIGHLIGHT);
        let (bitmap, painted) = MaskExporter::default().binarize(&raster);
        assert!(painted > 0);
        assert_eq!(*bitmap.get_pixel(10, 10), WHITE);
        assert_eq!(*bitmap.get_pixel(0, 0), BLACK);
        assert!(bitmap.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn faint_pixels_below_threshold_stay_black() {
        let mut raster = MaskRaster::blank(4, 4);
        raster.paint_segment(Point::new(2.0, 2.0), Point::new(2.0, 2.0), 5.0, image::Rgba([20, 20, 20, 255]));
        let (_, painted) = MaskExporter::default().binarize(&raster);
        assert_eq!(painted, 0);
    }

    #[test]
    fn imported_masks_follow_the_same_rule() {
        let mut drawn = image::GrayImage::new(8, 6);
        drawn.put_pixel(3, 2, Luma([200]));
        drawn.put_pixel(4, 2, Luma([10]));
        let mask = MaskExporter::default().import(&DynamicImage::ImageLuma8(drawn)).unwrap();
        assert_eq!(mask.dimensions(), (8, 6));
        assert_eq!(mask.painted_pixels, 1);
    }

    #[test]
    fn export_is_idempotent() {
        let mut raster = MaskRaster::blank(33, 17);
        raster.paint_segment(Point::new(2.0, 2.0), Point::new(30.0, 15.0), 2.5, HIGHLIGHT);
        let exporter = MaskExporter::default();
        let first = exporter.export(&raster).unwrap();
        let second = exporter.export(&raster).unwrap();
        assert_eq!(first.payload.bytes, second.payload.bytes);
        assert_eq!(first, second);
    }

    #[test]
    fn export_matches_raster_dimensions_and_decodes_binary() {
        let raster = MaskRaster::blank(31, 9);
        let mask = MaskExporter::default().export(&raster).unwrap();
        assert_eq!(mask.dimensions(), (31, 9));
        assert!(mask.is_empty());
        assert_eq!(mask.payload.mime_type, "image/png");

        let decoded = mask.payload.decode().unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (31, 9));
        assert!(decoded.pixels().all(|p| p.0[0] == 0));
    }
}
