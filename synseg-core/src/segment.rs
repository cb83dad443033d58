//! Segment table types.
//!
//! This module defines the `SegmentBatch` structure which stores the
//! immutable per-segment inputs (centroids and measurements) in parallel
//! vectors (`SoA` layout). Row `i` holds the segment with identity
//! `i + 1`; identity 0 is reserved for background.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Integer centroid position in raw-volume voxel coordinates (Z, Y, X).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoxelCoord {
    /// Z coordinate (slice).
    pub z: i32,
    /// Y coordinate (row).
    pub y: i32,
    /// X coordinate (column).
    pub x: i32,
}

impl VoxelCoord {
    /// Creates a new voxel coordinate.
    #[inline]
    #[must_use]
    pub fn new(z: i32, y: i32, x: i32) -> Self {
        Self { z, y, x }
    }

    /// Coordinate divided by a per-axis spatial reduction factor.
    #[inline]
    #[must_use]
    pub fn reduced(self, reduction: [i32; 3]) -> Self {
        Self {
            z: self.z / reduction[0],
            y: self.y / reduction[1],
            x: self.x / reduction[2],
        }
    }
}

/// Supported measurement-vector layouts.
///
/// Columns are ordered `[core, hollow, filtered-core, filtered-hollow,
/// red]`; the filtered pair and the red-mask channel are optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeasureColumns {
    /// Raw core and hollow intensities only.
    Two,
    /// Raw pair plus the filtered (DoG) pair.
    Four,
    /// Filtered pair plus the red-mask channel.
    Five,
}

impl MeasureColumns {
    /// Maps a measurement row length to its layout.
    ///
    /// # Errors
    /// Returns [`Error::BadMeasureColumns`] for unsupported widths.
    pub fn from_len(len: usize) -> Result<Self> {
        match len {
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            5 => Ok(Self::Five),
            found => Err(Error::BadMeasureColumns { found }),
        }
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Four => 4,
            Self::Five => 5,
        }
    }

    /// Returns true if the filtered (DoG) pair is present.
    #[must_use]
    pub fn has_filtered(self) -> bool {
        !matches!(self, Self::Two)
    }

    /// Returns true if the red-mask channel is present.
    #[must_use]
    pub fn has_red(self) -> bool {
        matches!(self, Self::Five)
    }
}

/// A batch of segments stored in Structure of Arrays (`SoA`) format.
///
/// Built once per load from the upstream detector output and read-only
/// for the rest of the session.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentBatch {
    /// Columnar storage for centroid Z coordinates.
    z: Vec<i32>,
    /// Columnar storage for centroid Y coordinates.
    y: Vec<i32>,
    /// Columnar storage for centroid X coordinates.
    x: Vec<i32>,
    /// Row-major measurement values, `columns.len()` per segment.
    measures: Vec<f32>,
    columns: MeasureColumns,
}

impl SegmentBatch {
    /// Creates a new empty batch with the given measurement layout.
    #[must_use]
    pub fn new(columns: MeasureColumns) -> Self {
        Self::with_capacity(columns, 0)
    }

    /// Creates a new empty batch with specified capacity.
    #[must_use]
    pub fn with_capacity(columns: MeasureColumns, capacity: usize) -> Self {
        Self {
            z: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            x: Vec::with_capacity(capacity),
            measures: Vec::with_capacity(capacity * columns.len()),
            columns,
        }
    }

    /// Pushes one segment row, validating arity and finiteness.
    ///
    /// # Errors
    /// Returns [`Error::BadMeasureColumns`] when the row width disagrees
    /// with the batch layout, or [`Error::NonFiniteMeasure`] when a
    /// value is NaN or infinite.
    pub fn push(&mut self, centroid: VoxelCoord, row: &[f32]) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::BadMeasureColumns { found: row.len() });
        }
        let segment = self.len() as u32 + 1;
        for (column, value) in row.iter().enumerate() {
            if !value.is_finite() {
                return Err(Error::NonFiniteMeasure { segment, column });
            }
        }
        self.z.push(centroid.z);
        self.y.push(centroid.y);
        self.x.push(centroid.x);
        self.measures.extend_from_slice(row);
        Ok(())
    }

    /// Returns the number of segments in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.z.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Returns the measurement layout.
    #[must_use]
    pub fn columns(&self) -> MeasureColumns {
        self.columns
    }

    /// Returns the centroid of row `index`.
    #[must_use]
    pub fn centroid(&self, index: usize) -> VoxelCoord {
        VoxelCoord::new(self.z[index], self.y[index], self.x[index])
    }

    /// Returns the full measurement row of segment `index`.
    #[must_use]
    pub fn measures_row(&self, index: usize) -> &[f32] {
        let width = self.columns.len();
        &self.measures[index * width..(index + 1) * width]
    }

    /// Returns the core intensity of segment `index`.
    #[inline]
    #[must_use]
    pub fn core(&self, index: usize) -> f32 {
        self.measures[index * self.columns.len()]
    }

    /// Returns the hollow (vicinity) intensity of segment `index`.
    #[inline]
    #[must_use]
    pub fn hollow(&self, index: usize) -> f32 {
        self.measures[index * self.columns.len() + 1]
    }

    /// Returns the red-mask intensity of segment `index`, when present.
    #[inline]
    #[must_use]
    pub fn red(&self, index: usize) -> Option<f32> {
        self.columns
            .has_red()
            .then(|| self.measures[index * self.columns.len() + 4])
    }

    /// Returns the mean core intensity, 0.0 for an empty batch.
    #[must_use]
    pub fn core_mean(&self) -> f32 {
        self.column_mean(0)
    }

    /// Returns the mean hollow intensity, 0.0 for an empty batch.
    #[must_use]
    pub fn hollow_mean(&self) -> f32 {
        self.column_mean(1)
    }

    /// Returns the largest red-mask intensity, 0.0 when absent.
    #[must_use]
    pub fn red_max(&self) -> f32 {
        if !self.columns.has_red() {
            return 0.0;
        }
        (0..self.len())
            .map(|i| self.measures[i * self.columns.len() + 4])
            .fold(0.0, f32::max)
    }

    /// Returns the min and max over every measurement value.
    #[must_use]
    pub fn value_extent(&self) -> (f32, f32) {
        self.measures
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    fn column_mean(&self, column: usize) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let width = self.columns.len();
        let sum: f32 = (0..self.len()).map(|i| self.measures[i * width + column]).sum();
        sum / self.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_batch_push_and_access() {
        let mut batch = SegmentBatch::with_capacity(MeasureColumns::Two, 4);
        assert!(batch.is_empty());

        batch.push(VoxelCoord::new(1, 2, 3), &[10.0, 4.0]).unwrap();
        batch.push(VoxelCoord::new(4, 5, 6), &[20.0, 8.0]).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.centroid(1), VoxelCoord::new(4, 5, 6));
        assert_abs_diff_eq!(batch.core(0), 10.0);
        assert_abs_diff_eq!(batch.hollow(1), 8.0);
        assert_eq!(batch.red(0), None);
        assert_abs_diff_eq!(batch.core_mean(), 15.0);
        assert_abs_diff_eq!(batch.hollow_mean(), 6.0);
    }

    #[test]
    fn test_five_column_red_channel() {
        let mut batch = SegmentBatch::new(MeasureColumns::Five);
        batch
            .push(VoxelCoord::new(0, 0, 0), &[1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap();
        assert_eq!(batch.red(0), Some(5.0));
        assert_abs_diff_eq!(batch.red_max(), 5.0);
        assert_eq!(batch.measures_row(0), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_row_width_mismatch_rejected() {
        let mut batch = SegmentBatch::new(MeasureColumns::Four);
        let err = batch.push(VoxelCoord::new(0, 0, 0), &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::BadMeasureColumns { found: 2 }));
    }

    #[test]
    fn test_non_finite_measure_rejected() {
        let mut batch = SegmentBatch::new(MeasureColumns::Two);
        let err = batch
            .push(VoxelCoord::new(0, 0, 0), &[1.0, f32::NAN])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NonFiniteMeasure { segment: 1, column: 1 }
        ));
    }

    #[test]
    fn test_unsupported_column_count() {
        assert!(matches!(
            MeasureColumns::from_len(3),
            Err(Error::BadMeasureColumns { found: 3 })
        ));
        assert_eq!(MeasureColumns::from_len(5).unwrap(), MeasureColumns::Five);
    }

    #[test]
    fn test_reduced_coordinate() {
        let c = VoxelCoord::new(10, 21, 33).reduced([2, 2, 4]);
        assert_eq!(c, VoxelCoord::new(5, 10, 8));
    }
}
