//! The mask canvas engine used by the edit view.
//!
//! One canvas owns at most one editing session at a time: a raster sized to
//! the current source image, its undo history and the mask last exported
//! from it. Loading another source discards the session wholesale.
//!
//! Pointer gestures follow a begin / extend / end protocol. Only `end_stroke`,
//! `undo`, `redo` and `clear` produce a new [`ExportedMask`]; intermediate
//! pointer moves only touch the raster, which keeps export work and
//! subscriber traffic proportional to user actions rather than to pointer
//! sampling rate.

use std::sync::mpsc::{channel, Receiver, Sender};

use super::coords::{CoordinateMapper, DisplayRect, Point};
use super::export::{ExportedMask, MaskExporter};
use super::history::{MaskHistory, DEFAULT_HISTORY_DEPTH};
use super::raster::MaskRaster;
use super::stroke::{clamp_brush_size, BrushStroke, StrokeRenderer, DEFAULT_BRUSH_SIZE};
use crate::error::Result;
use crate::imaging::SourceImage;

struct Session {
    raster: MaskRaster,
    history: MaskHistory,
    open: Option<BrushStroke>,
    mask: ExportedMask,
}

/// Freehand mask painting surface.
pub struct MaskCanvas {
    session: Option<Session>,
    renderer: StrokeRenderer,
    exporter: MaskExporter,
    /// Display-space brush width.
    brush_size: f32,
    history_depth: usize,
    enabled: bool,
    subscribers: Vec<Sender<ExportedMask>>,
}

impl Default for MaskCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskCanvas {
    pub fn new() -> Self {
        Self {
            session: None,
            renderer: StrokeRenderer::default(),
            exporter: MaskExporter::default(),
            brush_size: DEFAULT_BRUSH_SIZE,
            history_depth: DEFAULT_HISTORY_DEPTH,
            enabled: true,
            subscribers: Vec::new(),
        }
    }

    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    /// Starts a fresh session for `source`, discarding any previous mask.
    ///
    /// The raster takes the decoded bitmap's true pixel size, and subscribers
    /// receive the new blank mask.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AppError::InvalidSource`] if the image cannot be
    /// decoded. The canvas is then closed and ignores input.
    pub fn load_source(&mut self, source: &SourceImage) -> Result<(u32, u32)> {
        self.session = None;

        let decoded = match source.decode() {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!("mask surface unavailable: {}", e);
                self.close();
                return Err(e);
            }
        };
        let (width, height) = (decoded.width(), decoded.height());

        let raster = MaskRaster::blank(width, height);
        let history = MaskHistory::with_depth(&raster, self.history_depth);
        let mask = self.exporter.export(&raster)?;
        self.session = Some(Session {
            raster,
            history,
            open: None,
            mask: mask.clone(),
        });
        self.publish(mask);

        log::debug!("mask session started at {}x{}", width, height);
        Ok((width, height))
    }

    /// Ends the session (edit applied or cancelled).
    ///
    /// Every subscription ends with it; receivers see a disconnect rather
    /// than keep a mask for an image that is gone.
    pub fn close(&mut self) {
        self.session = None;
        self.subscribers.clear();
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.session.as_ref().map(|s| s.raster.dimensions())
    }

    /// The live raster, for drawing the highlight overlay.
    pub fn raster(&self) -> Option<&MaskRaster> {
        self.session.as_ref().map(|s| &s.raster)
    }

    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    /// Sets the display-space brush size, clamped to 5..=100. Returns the value applied.
    pub fn set_brush_size(&mut self, size: f32) -> f32 {
        self.brush_size = clamp_brush_size(size);
        self.brush_size
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables input, e.g. while an edit request is in flight.
    ///
    /// Disabling finishes a gesture that is still open.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        if !enabled {
            self.end_stroke()?;
        }
        self.enabled = enabled;
        Ok(())
    }

    /// Starts a stroke at a display-space pointer position.
    ///
    /// Returns `false` if the canvas is disabled, has no session, or the
    /// surface has no visible area. A stroke left open by a lost pointer-up
    /// is committed first.
    pub fn begin_stroke(&mut self, screen: Point, surface: DisplayRect) -> Result<bool> {
        if !self.enabled || self.session.is_none() {
            return Ok(false);
        }
        self.end_stroke()?;

        let brush_size = self.brush_size;
        let renderer = self.renderer;
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };
        let (width, height) = session.raster.dimensions();
        let Some(mapper) = CoordinateMapper::new(surface, width, height) else {
            return Ok(false);
        };

        let start = mapper.to_raster(screen);
        let stroke = renderer.begin(&mut session.raster, start, mapper.scale_width(brush_size));
        session.open = Some(stroke);
        Ok(true)
    }

    /// Continues the open stroke. Ignored when no stroke is open.
    pub fn extend_stroke(&mut self, screen: Point, surface: DisplayRect) {
        if !self.enabled {
            return;
        }
        let renderer = self.renderer;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let (width, height) = session.raster.dimensions();
        let (Some(stroke), Some(mapper)) = (session.open.as_mut(), CoordinateMapper::new(surface, width, height)) else {
            return;
        };
        renderer.extend(&mut session.raster, stroke, mapper.to_raster(screen));
    }

    /// Finishes the open stroke, commits it and publishes the new mask.
    ///
    /// Returns `None` when no stroke was open.
    pub fn end_stroke(&mut self) -> Result<Option<ExportedMask>> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        let Some(stroke) = session.open.take() else {
            return Ok(None);
        };
        session.history.commit(&session.raster);
        log::debug!("stroke committed ({} points)", stroke.points.len());
        self.refresh().map(Some)
    }

    /// Paints a complete stroke given in display space, as one history entry.
    pub fn paint_stroke(&mut self, points: &[Point], surface: DisplayRect) -> Result<Option<ExportedMask>> {
        let Some((first, rest)) = points.split_first() else {
            return Ok(None);
        };
        if !self.begin_stroke(*first, surface)? {
            return Ok(None);
        }
        for point in rest {
            self.extend_stroke(*point, surface);
        }
        self.end_stroke()
    }

    /// Steps back one history entry. Returns `None` if there was nothing to undo.
    pub fn undo(&mut self) -> Result<Option<ExportedMask>> {
        self.step(|history, raster| history.undo(raster))
    }

    /// Steps forward one history entry. Returns `None` if there was nothing to redo.
    pub fn redo(&mut self) -> Result<Option<ExportedMask>> {
        self.step(|history, raster| history.redo(raster))
    }

    /// Blanks the mask as an undoable history entry.
    pub fn clear(&mut self) -> Result<Option<ExportedMask>> {
        self.step(|history, raster| {
            history.clear(raster);
            true
        })
    }

    pub fn can_undo(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.history.can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.history.can_redo())
    }

    /// The mask matching the last committed state.
    pub fn current_mask(&self) -> Option<&ExportedMask> {
        self.session.as_ref().map(|s| &s.mask)
    }

    /// Subscribes to mask changes.
    ///
    /// The receiver first gets the current mask (if a session exists), then
    /// one mask per commit, undo, redo or clear. Subscribing again restarts
    /// the sequence from the current state.
    pub fn subscribe(&mut self) -> Receiver<ExportedMask> {
        let (tx, rx) = channel();
        if let Some(mask) = self.current_mask() {
            let _ = tx.send(mask.clone());
        }
        self.subscribers.push(tx);
        rx
    }

    fn step(&mut self, op: impl FnOnce(&mut MaskHistory, &mut MaskRaster) -> bool) -> Result<Option<ExportedMask>> {
        if !self.enabled {
            return Ok(None);
        }
        // An open gesture belongs to the entry being stepped away from.
        self.end_stroke()?;
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        if !op(&mut session.history, &mut session.raster) {
            return Ok(None);
        }
        self.refresh().map(Some)
    }

    fn refresh(&mut self) -> Result<ExportedMask> {
        let Some(session) = self.session.as_mut() else {
            return Err(crate::AppError::Unknown("mask session vanished".into()));
        };
        let mask = self.exporter.export(&session.raster)?;
        session.mask = mask.clone();
        self.publish(mask.clone());
        Ok(mask)
    }

    fn publish(&mut self, mask: ExportedMask) {
        self.subscribers.retain(|tx| tx.send(mask.clone()).is_ok());
    }
}
