//! Threshold classification.
//!
//! Levels and measurements are compared on the display-normalized scale;
//! a level maps back to physical units as
//! `physical = normalized * (max - min) + min`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::SegmentBatch;

/// Physical value range backing the normalized display scale.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DataRange {
    /// Smallest value in the packed display volume.
    pub min: f32,
    /// Largest value in the packed display volume.
    pub max: f32,
}

impl DataRange {
    /// Creates a range from explicit bounds.
    #[must_use]
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Derives the range from a segment batch. Background voxels are
    /// zero, so 0.0 is always folded into the extent.
    #[must_use]
    pub fn from_batch(batch: &SegmentBatch) -> Self {
        if batch.is_empty() {
            return Self::new(0.0, 1.0);
        }
        let (lo, hi) = batch.value_extent();
        Self::new(lo.min(0.0), hi.max(0.0))
    }

    /// Maps a physical value onto the normalized display scale.
    #[must_use]
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        (value - self.min) / span
    }

    /// Maps a normalized level back to physical units.
    #[must_use]
    pub fn denormalize(&self, level: f32) -> f32 {
        level * (self.max - self.min) + self.min
    }
}

/// Which threshold level a nudge targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    /// Small-feature (core) floor.
    Floor,
    /// Nuclei-scale (hollow) ceiling.
    Nuclear,
    /// Red-channel mask ceiling.
    Mask,
    /// Transparency zero-crossing.
    Zero,
    /// Upper clipping level.
    Top,
    /// Opacity factor.
    Transparency,
}

/// Classification and display threshold levels, all normalized to the
/// display scale.
///
/// One snapshot of this struct drives both the per-voxel display
/// decision and the export filter, so the two always agree.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Levels {
    /// Segments with a core value below this are excluded.
    pub floor: f32,
    /// Segments with a hollow value above this are excluded.
    pub nuclear: f32,
    /// Segments with a red-mask value above this are excluded.
    pub mask: f32,
    /// Transparency zero-crossing level (display only).
    pub zero: f32,
    /// Upper clipping level (display only).
    pub top: f32,
    /// Opacity factor (display only, not normalized).
    pub transparency: f32,
}

impl Default for Levels {
    fn default() -> Self {
        Self {
            floor: 0.0,
            nuclear: 1.0,
            mask: 1.0,
            zero: 0.28,
            top: 0.4,
            transparency: 0.8,
        }
    }
}

impl Levels {
    /// Coarse adjustment step for threshold levels.
    pub const STEP: f32 = 0.0005;
    /// Coarse adjustment step for the opacity factor.
    pub const TRANSPARENCY_STEP: f32 = 0.005;

    /// Startup levels derived from the batch statistics: the nuclear
    /// ceiling sits at 1.2x the mean hollow value, the floor at 0.9x
    /// the mean core value, and the mask ceiling at the largest red
    /// value (or fully open when the red channel is absent or empty).
    #[must_use]
    pub fn reset(batch: &SegmentBatch, range: DataRange) -> Self {
        let mask = range.normalize(batch.red_max());
        Self {
            floor: range.normalize(0.9 * batch.core_mean()),
            nuclear: range.normalize(1.2 * batch.hollow_mean()),
            mask: if mask > 0.0 { mask } else { 1.0 },
            ..Self::default()
        }
    }

    /// Adjusts one level by a single step and returns the new value.
    /// `fine` shrinks the step to a tenth.
    pub fn nudge(&mut self, kind: LevelKind, raise: bool, fine: bool) -> f32 {
        let step = match kind {
            LevelKind::Transparency => Self::TRANSPARENCY_STEP,
            _ => Self::STEP,
        };
        let step = if fine { 0.1 * step } else { step };
        let delta = if raise { step } else { -step };
        let slot = match kind {
            LevelKind::Floor => &mut self.floor,
            LevelKind::Nuclear => &mut self.nuclear,
            LevelKind::Mask => &mut self.mask,
            LevelKind::Zero => &mut self.zero,
            LevelKind::Top => &mut self.top,
            LevelKind::Transparency => &mut self.transparency,
        };
        *slot += delta;
        *slot
    }

    /// Renders every level in physical units for operator feedback.
    /// The opacity factor is a bare ratio and stays unconverted.
    #[must_use]
    pub fn report(&self, range: DataRange) -> String {
        format!(
            "small feature threshold: {}\n\
             nuclear feature threshold: {}\n\
             red mask threshold: {}\n\
             zero crossing threshold: {}\n\
             upper clipping threshold: {}\n\
             transparency factor: {}",
            range.denormalize(self.floor),
            range.denormalize(self.nuclear),
            range.denormalize(self.mask),
            range.denormalize(self.zero),
            range.denormalize(self.top),
            self.transparency,
        )
    }
}

/// Classification verdict for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Verdict {
    /// Segment passes the threshold chain.
    Included,
    /// Segment fails at least one threshold.
    Excluded,
}

impl Verdict {
    /// Returns true for [`Verdict::Included`].
    #[must_use]
    pub fn is_included(self) -> bool {
        matches!(self, Self::Included)
    }
}

/// Applies the threshold rule chain to one normalized measurement sample.
///
/// The rules are ordered and the first match wins:
/// 1. hollow above the nuclear ceiling excludes;
/// 2. core below the floor excludes;
/// 3. a present red-mask value above the mask ceiling excludes;
/// 4. otherwise the segment is included.
///
/// # Panics
/// Panics on NaN or infinite inputs; a degenerate measurement reaching
/// the classifier is a fault upstream, not a classifiable sample.
#[must_use]
pub fn classify(core: f32, hollow: f32, red: Option<f32>, levels: &Levels) -> Verdict {
    assert!(
        core.is_finite() && hollow.is_finite() && red.is_none_or(f32::is_finite),
        "non-finite measurement reached the classifier"
    );
    if hollow > levels.nuclear {
        return Verdict::Excluded;
    }
    if core < levels.floor {
        return Verdict::Excluded;
    }
    if let Some(red) = red {
        if red > levels.mask {
            return Verdict::Excluded;
        }
    }
    Verdict::Included
}
