//! Freehand region masks for localized edits.
//!
//! The user paints a translucent highlight over a rendering; the engine turns
//! that into a strict black/white mask at the rendering's full resolution.
//!
//! # Architecture
//!
//! - [`coords`]: display-space to raster-space mapping
//! - [`raster`]: the live RGBA buffer and its snapshots
//! - [`stroke`]: round-capped stroke painting
//! - [`history`]: snapshot undo/redo
//! - [`export`]: threshold export to a binary PNG
//! - [`canvas`]: the engine composing all of the above

pub mod canvas;
pub mod coords;
pub mod export;
pub mod history;
pub mod raster;
pub mod stroke;

pub use canvas::MaskCanvas;
pub use coords::{CoordinateMapper, DisplayRect, Point};
pub use export::{ExportedMask, MaskExporter};
pub use history::MaskHistory;
pub use raster::{MaskRaster, MaskSnapshot};
pub use stroke::{BrushStroke, StrokeRenderer, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};
