//! Snapshot-based undo/redo for the mask raster.

use super::raster::{MaskRaster, MaskSnapshot};

/// Default number of snapshots kept, including the blank initial state.
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// Default cap on bytes held by all snapshots.
pub const DEFAULT_HISTORY_MEMORY: usize = 256 * 1024 * 1024;

/// Linear undo history over raster snapshots.
///
/// Index 0 is always the blank state the session started with, and the
/// cursor always points at the snapshot matching the live raster. Both the
/// entry count and the total snapshot bytes are bounded.
#[derive(Debug, Clone)]
pub struct MaskHistory {
    snapshots: Vec<MaskSnapshot>,
    cursor: usize,
    max_depth: usize,
    max_memory: usize,
    total_memory: usize,
}

impl MaskHistory {
    /// Starts a history whose base entry is the raster's current (blank) state.
    pub fn new(raster: &MaskRaster) -> Self {
        Self::with_depth(raster, DEFAULT_HISTORY_DEPTH)
    }

    pub fn with_depth(raster: &MaskRaster, max_depth: usize) -> Self {
        let base = raster.snapshot();
        Self {
            total_memory: base.byte_len(),
            snapshots: vec![base],
            cursor: 0,
            max_depth: max_depth.max(2),
            max_memory: DEFAULT_HISTORY_MEMORY,
        }
    }

    /// Sets the byte budget. The base and the newest entry are always kept.
    pub fn with_memory_limit(mut self, max_memory: usize) -> Self {
        self.max_memory = max_memory;
        self
    }

    /// Records the raster as a new tip, dropping any redo branch.
    ///
    /// When either limit is exceeded the oldest entries after the base are
    /// discarded, so the blank state stays reachable.
    pub fn commit(&mut self, raster: &MaskRaster) {
        for dropped in self.snapshots.drain(self.cursor + 1..) {
            self.total_memory = self.total_memory.saturating_sub(dropped.byte_len());
        }
        let snapshot = raster.snapshot();
        self.total_memory += snapshot.byte_len();
        self.snapshots.push(snapshot);

        while self.snapshots.len() > 2
            && (self.snapshots.len() > self.max_depth || self.total_memory > self.max_memory)
        {
            let evicted = self.snapshots.remove(1);
            self.total_memory = self.total_memory.saturating_sub(evicted.byte_len());
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Steps back one entry. Returns `false` at the base.
    pub fn undo(&mut self, raster: &mut MaskRaster) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        raster.restore(&self.snapshots[self.cursor])
    }

    /// Steps forward one entry. Returns `false` at the tip.
    pub fn redo(&mut self, raster: &mut MaskRaster) -> bool {
        if self.cursor + 1 >= self.snapshots.len() {
            return false;
        }
        self.cursor += 1;
        raster.restore(&self.snapshots[self.cursor])
    }

    /// Blanks the raster and records it as an ordinary, undoable entry.
    pub fn clear(&mut self, raster: &mut MaskRaster) {
        raster.clear();
        self.commit(raster);
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Bytes held by all snapshots.
    pub fn memory_size(&self) -> usize {
        self.total_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::coords::Point;
    use crate::mask::raster::HIGHLIGHT;

    fn dab(raster: &mut MaskRaster, x: f32) {
        raster.paint_segment(Point::new(x, 8.0), Point::new(x, 8.0), 3.0, HIGHLIGHT);
    }

    #[test]
    fn undo_after_commit_restores_previous_pixels() {
        let mut raster = MaskRaster::blank(64, 16);
        let mut history = MaskHistory::new(&raster);
        dab(&mut raster, 8.0);
        history.commit(&raster);
        let before = raster.snapshot();

        dab(&mut raster, 40.0);
        history.commit(&raster);
        let after = raster.snapshot();

        assert!(history.undo(&mut raster));
        assert_eq!(raster.snapshot(), before);
        assert!(history.redo(&mut raster));
        assert_eq!(raster.snapshot(), after);
    }

    #[test]
    fn undo_and_redo_stop_at_the_ends() {
        let mut raster = MaskRaster::blank(8, 8);
        let mut history = MaskHistory::new(&raster);
        assert!(!history.undo(&mut raster));
        assert!(!history.redo(&mut raster));
        assert_eq!(history.cursor(), 0);

        dab(&mut raster, 4.0);
        history.commit(&raster);
        assert!(!history.redo(&mut raster));
        assert!(history.undo(&mut raster));
        assert!(raster.is_blank());
        assert!(!history.undo(&mut raster));
    }

    #[test]
    fn committing_after_undo_discards_the_redo_branch() {
        let mut raster = MaskRaster::blank(64, 16);
        let mut history = MaskHistory::new(&raster);
        for x in [8.0, 24.0, 40.0] {
            dab(&mut raster, x);
            history.commit(&raster);
        }
        history.undo(&mut raster);
        history.undo(&mut raster);
        assert!(history.can_redo());

        dab(&mut raster, 56.0);
        history.commit(&raster);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
    }

    #[test]
    fn clear_is_undoable() {
        let mut raster = MaskRaster::blank(32, 16);
        let mut history = MaskHistory::new(&raster);
        dab(&mut raster, 10.0);
        history.commit(&raster);
        let painted = raster.snapshot();

        history.clear(&mut raster);
        assert!(raster.is_blank());
        assert!(history.undo(&mut raster));
        assert_eq!(raster.snapshot(), painted);
    }

    #[test]
    fn depth_limit_keeps_the_blank_base() {
        let mut raster = MaskRaster::blank(64, 16);
        let mut history = MaskHistory::with_depth(&raster, 3);
        for x in [8.0, 24.0, 40.0, 56.0] {
            dab(&mut raster, x);
            history.commit(&raster);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
        while history.undo(&mut raster) {}
        assert!(raster.is_blank());
    }

    #[test]
    fn memory_limit_evicts_old_entries_but_keeps_base_and_tip() {
        let mut raster = MaskRaster::blank(64, 16);
        let mut sizing = MaskHistory::new(&raster);
        dab(&mut raster, 8.0);
        sizing.commit(&raster);
        let one_entry = sizing.memory_size();

        let mut raster = MaskRaster::blank(64, 16);
        let mut history = MaskHistory::new(&raster).with_memory_limit(one_entry);
        for x in [8.0, 24.0, 40.0, 56.0] {
            dab(&mut raster, x);
            history.commit(&raster);
            assert!(history.len() >= 2);
        }
        assert!(history.len() < 5);
        let tip = raster.snapshot();
        let total: usize = history.snapshots.iter().map(MaskSnapshot::byte_len).sum();
        assert_eq!(history.memory_size(), total);

        while history.undo(&mut raster) {}
        assert!(raster.is_blank());
        while history.redo(&mut raster) {}
        assert_eq!(raster.snapshot(), tip);
    }
}
