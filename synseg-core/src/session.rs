//! Review session state.
//!
//! A [`ReviewSession`] is the single owner of everything mutable in the
//! core: the authoritative status array, the published status grid, and
//! the pending edit batch. Every mutation flows through one of its
//! methods, which keeps the status bit-field invariant intact and
//! publishes the change to the display surface in the same call.

use std::collections::BTreeSet;

use crate::{
    classify, DataRange, Levels, Result, SegmentBatch, SegmentIdCodec, SegmentStatus, StatusGrid,
    Verdict,
};

/// Interactive review state over one immutable segment batch.
#[derive(Debug)]
pub struct ReviewSession {
    batch: SegmentBatch,
    codec: SegmentIdCodec,
    statuses: Vec<SegmentStatus>,
    grid: StatusGrid,
    pending: BTreeSet<usize>,
    levels: Levels,
    range: DataRange,
}

impl ReviewSession {
    /// Creates a session over a segment batch, with every status at
    /// default and startup levels derived from the batch statistics.
    ///
    /// # Errors
    /// Returns [`crate::Error::CapacityExceeded`] when the batch is too
    /// large for the identity encoding.
    pub fn new(batch: SegmentBatch, range: DataRange) -> Result<Self> {
        let codec = SegmentIdCodec::for_count(batch.len())?;
        let levels = Levels::reset(&batch, range);
        let grid = StatusGrid::new(&codec);
        let statuses = vec![SegmentStatus::Default; batch.len()];
        Ok(Self {
            batch,
            codec,
            statuses,
            grid,
            pending: BTreeSet::new(),
            levels,
            range,
        })
    }

    /// Replaces the startup levels.
    #[must_use]
    pub fn with_levels(mut self, levels: Levels) -> Self {
        self.levels = levels;
        self
    }

    /// Returns the number of segments under review.
    #[must_use]
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    /// Returns true if the session holds no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Returns the immutable segment batch.
    #[must_use]
    pub fn batch(&self) -> &SegmentBatch {
        &self.batch
    }

    /// Returns the identity codec sized to this session.
    #[must_use]
    pub fn codec(&self) -> SegmentIdCodec {
        self.codec
    }

    /// Returns the status of segment `index` (0-based).
    #[must_use]
    pub fn status(&self, index: usize) -> SegmentStatus {
        self.statuses[index]
    }

    /// Returns the full authoritative status array.
    #[must_use]
    pub fn statuses(&self) -> &[SegmentStatus] {
        &self.statuses
    }

    /// Returns the published status surface the display stage reads.
    #[must_use]
    pub fn status_grid(&self) -> &StatusGrid {
        &self.grid
    }

    /// Returns the current threshold levels.
    #[must_use]
    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    /// Returns the threshold levels for adjustment.
    pub fn levels_mut(&mut self) -> &mut Levels {
        &mut self.levels
    }

    /// Returns the normalization range shared with the display volume.
    #[must_use]
    pub fn range(&self) -> DataRange {
        self.range
    }

    /// Returns the 0-based indices edited since the last retirement.
    pub fn pending(&self) -> impl Iterator<Item = usize> + '_ {
        self.pending.iter().copied()
    }

    /// Returns the size of the pending edit batch.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Applies the click-cycle transition to segment `index` and adds it
    /// to the pending batch. Returns the new status, or `None` when the
    /// click is a no-op (retired override or out-of-range index); a
    /// no-op writes nothing.
    pub fn click(&mut self, index: usize) -> Option<SegmentStatus> {
        let current = *self.statuses.get(index)?;
        let next = current.clicked();
        if next == current {
            return None;
        }
        self.set_status(index, next);
        self.pending.insert(index);
        Some(next)
    }

    /// Retires every pending edit, making its override non-clickable,
    /// then clears the batch. Returns the number of statuses changed;
    /// retiring an empty or already-retired batch changes none.
    pub fn retire(&mut self) -> usize {
        let mut changed = 0;
        for index in std::mem::take(&mut self.pending) {
            let current = self.statuses[index];
            let next = current.retired();
            if next != current {
                self.set_status(index, next);
                changed += 1;
            }
        }
        changed
    }

    /// Applies a fully-matched set of imported overrides. Statuses are
    /// expected in reloaded (clickable) form; each touched segment joins
    /// the pending batch so a later retirement can commit it.
    pub fn apply_overrides(&mut self, matches: &[(usize, SegmentStatus)]) {
        for &(index, status) in matches {
            self.set_status(index, status);
            self.pending.insert(index);
        }
    }

    /// Runs the automatic threshold chain on segment `index` under the
    /// current levels.
    #[must_use]
    pub fn classify_auto(&self, index: usize) -> Verdict {
        let core = self.range.normalize(self.batch.core(index));
        let hollow = self.range.normalize(self.batch.hollow(index));
        let red = self.batch.red(index).map(|v| self.range.normalize(v));
        classify(core, hollow, red, &self.levels)
    }

    /// Returns the displayed decision for segment `index`: a present
    /// override wins, otherwise the automatic classification.
    #[must_use]
    pub fn effective(&self, index: usize) -> Verdict {
        let status = self.statuses[index];
        if status.has_override() {
            if status.is_target() {
                Verdict::Included
            } else {
                Verdict::Excluded
            }
        } else {
            self.classify_auto(index)
        }
    }

    /// One status write plus its publication to the read surface.
    fn set_status(&mut self, index: usize, status: SegmentStatus) {
        self.statuses[index] = status;
        self.grid.set(index as u32 + 1, status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MeasureColumns, VoxelCoord};

    fn session(n: usize) -> ReviewSession {
        let mut batch = SegmentBatch::with_capacity(MeasureColumns::Two, n);
        for i in 0..n {
            let v = i as f32 + 1.0;
            batch
                .push(VoxelCoord::new(i as i32, 2 * i as i32, 3 * i as i32), &[10.0 * v, v])
                .unwrap();
        }
        ReviewSession::new(batch, DataRange::new(0.0, 100.0)).unwrap()
    }

    #[test]
    fn test_initial_state_is_default() {
        let s = session(5);
        assert!(s.statuses().iter().all(|&st| st == SegmentStatus::Default));
        assert_eq!(s.pending_len(), 0);
        assert_eq!(s.status_grid().get(3), 0);
    }

    #[test]
    fn test_click_publishes_and_batches() {
        let mut s = session(5);
        assert_eq!(s.click(2), Some(SegmentStatus::OverrideOffClickable));
        assert_eq!(s.status(2), SegmentStatus::OverrideOffClickable);
        // Identity 3 = index 2 on the published surface.
        assert_eq!(s.status_grid().get(3), 5);
        assert_eq!(s.pending().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_three_clicks_cycle_back() {
        let mut s = session(5);
        s.click(0);
        s.click(0);
        assert_eq!(s.status(0), SegmentStatus::OverrideOnClickable);
        s.click(0);
        assert_eq!(s.status(0), SegmentStatus::Default);
        assert_eq!(s.status_grid().get(1), 0);
    }

    #[test]
    fn test_out_of_range_click_is_noop() {
        let mut s = session(3);
        assert_eq!(s.click(7), None);
        assert_eq!(s.pending_len(), 0);
    }

    #[test]
    fn test_retirement_commits_and_clears() {
        let mut s = session(5);
        s.click(1);
        s.click(3);
        s.click(3);
        assert_eq!(s.pending_len(), 2);

        assert_eq!(s.retire(), 2);
        assert_eq!(s.status(1), SegmentStatus::OverrideOff);
        assert_eq!(s.status(3), SegmentStatus::OverrideOn);
        assert_eq!(s.status_grid().get(2), 1);
        assert_eq!(s.status_grid().get(4), 3);
        assert_eq!(s.pending_len(), 0);

        // Second retirement with no intervening picks changes nothing.
        assert_eq!(s.retire(), 0);
    }

    #[test]
    fn test_retired_override_ignores_clicks() {
        let mut s = session(5);
        s.click(1);
        s.retire();
        assert_eq!(s.click(1), None);
        assert_eq!(s.status(1), SegmentStatus::OverrideOff);
        assert_eq!(s.pending_len(), 0);
    }

    #[test]
    fn test_click_cycling_back_to_default_then_retiring() {
        let mut s = session(5);
        s.click(2);
        s.click(2);
        s.click(2);
        // Back at default; retirement of a default entry is a no-op.
        assert_eq!(s.status(2), SegmentStatus::Default);
        assert_eq!(s.retire(), 0);
        assert_eq!(s.status(2), SegmentStatus::Default);
    }

    #[test]
    fn test_effective_override_wins() {
        let mut s = session(5);
        // Levels that exclude everything automatically.
        s.levels_mut().floor = 1.0;
        assert_eq!(s.effective(4), Verdict::Excluded);

        s.click(4);
        s.click(4);
        assert_eq!(s.status(4), SegmentStatus::OverrideOnClickable);
        assert_eq!(s.effective(4), Verdict::Included);

        s.retire();
        // A retired include-override still wins over the classifier.
        assert_eq!(s.effective(4), Verdict::Included);
    }

    #[test]
    fn test_apply_overrides_joins_batch() {
        let mut s = session(5);
        s.apply_overrides(&[
            (0, SegmentStatus::OverrideOffClickable),
            (4, SegmentStatus::OverrideOnClickable),
        ]);
        assert_eq!(s.status(0), SegmentStatus::OverrideOffClickable);
        assert_eq!(s.status(4), SegmentStatus::OverrideOnClickable);
        assert_eq!(s.pending().collect::<Vec<_>>(), vec![0, 4]);
        assert_eq!(s.status_grid().get(5), 7);
    }

    #[test]
    fn test_status_bytes_stay_legal_under_mixed_edits() {
        let mut s = session(8);
        for round in 0..3 {
            for i in 0..8 {
                if (i + round) % 2 == 0 {
                    s.click(i);
                }
            }
            if round == 1 {
                s.retire();
            }
        }
        for &st in s.statuses() {
            assert!(matches!(st.as_byte(), 0 | 1 | 3 | 5 | 7));
        }
    }
}
