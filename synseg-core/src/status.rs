//! Per-segment override status.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result, SegmentIdCodec};

/// Manual-override state attached to each segment.
///
/// The discriminants mirror the interchange format's status byte: bit 0
/// marks an override, bit 1 the overridden verdict, bit 2 click
/// eligibility. Only the five values below are legal; the enum makes the
/// remaining bit patterns (2, 4, 6) unrepresentable.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SegmentStatus {
    /// No override; the automatic classification is displayed.
    #[default]
    Default = 0,
    /// Retired override: excluded, no longer selectable.
    OverrideOff = 1,
    /// Retired override: included, no longer selectable.
    OverrideOn = 3,
    /// Live override: excluded, still selectable.
    OverrideOffClickable = 5,
    /// Live override: included, still selectable.
    OverrideOnClickable = 7,
}

impl SegmentStatus {
    /// Parses a status byte.
    ///
    /// # Errors
    /// Returns [`Error::InvalidStatusByte`] for any value outside
    /// {0, 1, 3, 5, 7}; such a value is a fault, never coerced.
    pub fn from_byte(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Default),
            1 => Ok(Self::OverrideOff),
            3 => Ok(Self::OverrideOn),
            5 => Ok(Self::OverrideOffClickable),
            7 => Ok(Self::OverrideOnClickable),
            value => Err(Error::InvalidStatusByte { value }),
        }
    }

    /// Returns the raw status byte.
    #[inline]
    #[must_use]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Returns true if a manual override is present.
    #[inline]
    #[must_use]
    pub fn has_override(self) -> bool {
        self.as_byte() & 1 != 0
    }

    /// Returns true if the override classifies the segment as a target.
    #[inline]
    #[must_use]
    pub fn is_target(self) -> bool {
        self.as_byte() & 2 != 0
    }

    /// Returns true if the segment still responds to clicks.
    #[inline]
    #[must_use]
    pub fn is_clickable(self) -> bool {
        self.as_byte() & 4 != 0
    }

    /// Click-cycle transition: default → excluded → included → default.
    ///
    /// Retired overrides are not selectable; the UI filters them before
    /// the pick reaches this table, so they map to themselves.
    #[must_use]
    pub fn clicked(self) -> Self {
        match self {
            Self::Default => Self::OverrideOffClickable,
            Self::OverrideOffClickable => Self::OverrideOnClickable,
            Self::OverrideOnClickable => Self::Default,
            Self::OverrideOff | Self::OverrideOn => self,
        }
    }

    /// Batch-retirement transition: live overrides become permanent,
    /// everything else is untouched. Idempotent.
    #[must_use]
    pub fn retired(self) -> Self {
        match self {
            Self::OverrideOffClickable => Self::OverrideOff,
            Self::OverrideOnClickable => Self::OverrideOn,
            Self::Default | Self::OverrideOff | Self::OverrideOn => self,
        }
    }

    /// Import normalization: overrides always reload in clickable form,
    /// discarding a previously-retired distinction.
    #[must_use]
    pub fn reloaded(self) -> Self {
        match self {
            Self::OverrideOff | Self::OverrideOffClickable => Self::OverrideOffClickable,
            Self::OverrideOn | Self::OverrideOnClickable => Self::OverrideOnClickable,
            Self::Default => Self::Default,
        }
    }
}

/// Dense status lookup surface addressed by the encoded identity.
///
/// Sized to the full encoding capacity so the display stage can index it
/// with the same byte-tuple key as the label volume. Slot 0 and every
/// slot past the live segment count stay 0. The grid has a single owner;
/// each [`StatusGrid::set`] publishes one whole entry, so a concurrent
/// reader never observes a torn value.
#[derive(Debug, Clone)]
pub struct StatusGrid {
    dims: [usize; 3],
    data: Vec<u8>,
}

impl StatusGrid {
    /// Creates a zeroed grid sized to the codec's capacity.
    #[must_use]
    pub fn new(codec: &SegmentIdCodec) -> Self {
        Self {
            dims: codec.grid_dims(),
            data: vec![0; codec.table_len()],
        }
    }

    /// Publishes the status of one identity.
    pub fn set(&mut self, id: u32, status: SegmentStatus) {
        self.data[id as usize] = status.as_byte();
    }

    /// Returns the published status byte of an identity.
    #[must_use]
    pub fn get(&self, id: u32) -> u8 {
        self.data[id as usize]
    }

    /// Returns the grid shape as `[dz, dy, dx]`.
    #[must_use]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Returns the flat backing store, index = decoded identity.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_byte_round_trip() {
        for byte in [0u8, 1, 3, 5, 7] {
            assert_eq!(SegmentStatus::from_byte(byte).unwrap().as_byte(), byte);
        }
    }

    #[test]
    fn test_illegal_bytes_rejected() {
        for byte in [2u8, 4, 6, 8, 255] {
            assert!(matches!(
                SegmentStatus::from_byte(byte),
                Err(Error::InvalidStatusByte { value }) if value == byte
            ));
        }
    }

    #[test]
    fn test_click_cycle_returns_to_default() {
        let mut status = SegmentStatus::Default;
        status = status.clicked();
        assert_eq!(status, SegmentStatus::OverrideOffClickable);
        status = status.clicked();
        assert_eq!(status, SegmentStatus::OverrideOnClickable);
        status = status.clicked();
        assert_eq!(status, SegmentStatus::Default);
        // A fourth click repeats the same cycle.
        assert_eq!(status.clicked(), SegmentStatus::OverrideOffClickable);
    }

    #[test]
    fn test_retired_overrides_ignore_clicks() {
        assert_eq!(SegmentStatus::OverrideOff.clicked(), SegmentStatus::OverrideOff);
        assert_eq!(SegmentStatus::OverrideOn.clicked(), SegmentStatus::OverrideOn);
    }

    #[test]
    fn test_retirement_table() {
        assert_eq!(SegmentStatus::Default.retired(), SegmentStatus::Default);
        assert_eq!(
            SegmentStatus::OverrideOffClickable.retired(),
            SegmentStatus::OverrideOff
        );
        assert_eq!(
            SegmentStatus::OverrideOnClickable.retired(),
            SegmentStatus::OverrideOn
        );
        // Idempotent on already-retired values.
        assert_eq!(SegmentStatus::OverrideOff.retired(), SegmentStatus::OverrideOff);
    }

    #[test]
    fn test_reload_normalizes_to_clickable() {
        assert_eq!(
            SegmentStatus::OverrideOff.reloaded(),
            SegmentStatus::OverrideOffClickable
        );
        assert_eq!(
            SegmentStatus::OverrideOn.reloaded(),
            SegmentStatus::OverrideOnClickable
        );
        assert_eq!(
            SegmentStatus::OverrideOffClickable.reloaded(),
            SegmentStatus::OverrideOffClickable
        );
        assert_eq!(
            SegmentStatus::OverrideOnClickable.reloaded(),
            SegmentStatus::OverrideOnClickable
        );
        assert_eq!(SegmentStatus::Default.reloaded(), SegmentStatus::Default);
    }

    #[test]
    fn test_status_bits() {
        let status = SegmentStatus::OverrideOnClickable;
        assert!(status.has_override());
        assert!(status.is_target());
        assert!(status.is_clickable());

        let status = SegmentStatus::OverrideOff;
        assert!(status.has_override());
        assert!(!status.is_target());
        assert!(!status.is_clickable());

        assert!(!SegmentStatus::Default.has_override());
    }

    #[test]
    fn test_grid_publication() {
        let codec = SegmentIdCodec::for_count(10).unwrap();
        let mut grid = StatusGrid::new(&codec);
        assert_eq!(grid.dims(), [1, 1, 256]);
        assert_eq!(grid.as_bytes().len(), 256);
        assert_eq!(grid.get(3), 0);

        grid.set(3, SegmentStatus::OverrideOnClickable);
        assert_eq!(grid.get(3), 7);
        // Slot 0 stays the background sentinel.
        assert_eq!(grid.get(0), 0);
    }
}
