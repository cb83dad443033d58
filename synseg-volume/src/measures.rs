//! Measures lookup grid.
//!
//! Packs per-segment measurement vectors into a dense, capacity-sized
//! lookup table addressed by the same byte-tuple key as the label
//! volume, so the display stage can fetch a segment's normalized
//! measurements from the key it already sampled.

use log::debug;
use ndarray::{Array4, ArrayView1, ArrayView4};
use synseg_core::{DataRange, SegmentBatch, SegmentIdCodec};

/// Dense identity-to-measurements lookup table, entries in [0, 1].
///
/// The backing store is sized to the full encoding capacity regardless
/// of the live segment count; slot 0 and every slot past the live count
/// hold the zero vector. Read-only after packing.
#[derive(Debug, Clone)]
pub struct MeasuresGrid {
    data: Array4<f32>,
    codec: SegmentIdCodec,
}

impl MeasuresGrid {
    /// Packs a segment batch into the lookup table, normalizing every
    /// value onto the display scale shared with the raw volume.
    #[must_use]
    pub fn pack(batch: &SegmentBatch, range: DataRange, codec: SegmentIdCodec) -> Self {
        let [dz, dy, dx] = codec.grid_dims();
        let channels = batch.columns().len();
        let mut data = Array4::<f32>::zeros((dz, dy, dx, channels));
        for i in 0..batch.len() {
            let key = codec.encode(i as u32 + 1);
            let slot = [key[2] as usize, key[1] as usize, key[0] as usize];
            for (channel, &value) in batch.measures_row(i).iter().enumerate() {
                data[[slot[0], slot[1], slot[2], channel]] =
                    range.normalize(value).clamp(0.0, 1.0);
            }
        }
        debug!(
            "measures grid: {} live rows in a {dz}x{dy}x{dx}x{channels} table",
            batch.len()
        );
        Self { data, codec }
    }

    /// Returns the normalized measurement vector of an identity;
    /// identity 0 is always the zero vector.
    #[must_use]
    pub fn get(&self, id: u32) -> ArrayView1<'_, f32> {
        let key = self.codec.encode(id);
        self.data
            .slice(ndarray::s![key[2] as usize, key[1] as usize, key[0] as usize, ..])
    }

    /// Returns the full table, shaped `[dz, dy, dx, channels]`.
    #[must_use]
    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// Returns the grid shape as `[dz, dy, dx]`.
    #[must_use]
    pub fn dims(&self) -> [usize; 3] {
        let (dz, dy, dx, _) = self.data.dim();
        [dz, dy, dx]
    }

    /// Returns the number of measurement channels per entry.
    #[must_use]
    pub fn channels(&self) -> usize {
        self.data.dim().3
    }
}
