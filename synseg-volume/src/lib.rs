//! synseg-volume: Dense lookup-volume construction for segment review.
//!
//! This crate rasterizes detected segments into the three read-only
//! lookup surfaces the display stage samples:
//! - **label volume** - voxel to owning identity, byte-tuple encoded
//! - **measures grid** - identity to normalized measurement vector
//! - **display volume** - raw signal composed with per-segment samples
//!
#![warn(missing_docs)]

mod compose;
mod kernel;
mod label;
mod measures;

pub use compose::compose_view_channels;
pub use kernel::{compose_3d, gaussian_taps, splat_kernel};
pub use label::{assign_voxels, LabelVolume};
pub use measures::MeasuresGrid;

use synseg_core::{SegmentBatch, VoxelCoord};

/// Reduces raw-coordinate centroids to the display resolution by
/// per-axis integer division.
#[must_use]
pub fn reduce_centroids(batch: &SegmentBatch, reduction: [usize; 3]) -> Vec<VoxelCoord> {
    let reduction = [
        reduction[0] as i32,
        reduction[1] as i32,
        reduction[2] as i32,
    ];
    (0..batch.len())
        .map(|i| batch.centroid(i).reduced(reduction))
        .collect()
}
