//! Display-volume assembly.
//!
//! Fills the segmented channels of the 4-channel display volume by
//! looking each voxel's owner up in the label volume: raw signal, the
//! owner's core and hollow samples, and the red mask with the raw
//! autofluorescence signal filling background voxels.

use log::debug;
use ndarray::{Array4, ArrayView4, Axis, Zip};
use synseg_core::SegmentBatch;

use crate::LabelVolume;

/// Composes the 4-channel display volume from the reduced view image,
/// the label volume, and the per-segment measurements.
///
/// Channel 0 carries the raw signal through unchanged; channels 1 and 2
/// hold the owning segment's core and hollow values (0 on background);
/// channel 3 holds the red-mask value where a 5-column layout provides
/// one, plus the view's autofluorescence channel on background voxels.
///
/// # Panics
/// Panics when the view and label volumes disagree in spatial shape or
/// the view has no channels.
#[must_use]
pub fn compose_view_channels(
    view: ArrayView4<'_, f32>,
    labels: &LabelVolume,
    batch: &SegmentBatch,
) -> Array4<f32> {
    let (nz, ny, nx, view_channels) = view.dim();
    assert_eq!(
        [nz, ny, nx],
        labels.shape(),
        "view and label volumes must share a shape"
    );
    assert!(view_channels >= 1, "view volume has no channels");

    // Identity-indexed value tables, slot 0 = background.
    let n = batch.len();
    let mut core = vec![0.0f32; n + 1];
    let mut hollow = vec![0.0f32; n + 1];
    let mut red = vec![0.0f32; n + 1];
    for i in 0..n {
        core[i + 1] = batch.core(i);
        hollow[i + 1] = batch.hollow(i);
        red[i + 1] = batch.red(i).unwrap_or(0.0);
    }
    let has_red = batch.columns().has_red();
    let has_autofluor = view_channels >= 2;

    let mut out = Array4::<f32>::zeros((nz, ny, nx, 4));
    Zip::from(out.lanes_mut(Axis(3)))
        .and(view.lanes(Axis(3)))
        .and(labels.ids())
        .par_for_each(|mut lane, sample, &id| {
            let slot = id as usize;
            lane[0] = sample[0];
            lane[1] = core[slot];
            lane[2] = hollow[slot];
            if has_red {
                let fill = if id == 0 && has_autofluor { sample[1] } else { 0.0 };
                lane[3] = red[slot] + fill;
            }
        });
    debug!("composed {nz}x{ny}x{nx} display volume, red channel: {has_red}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign_voxels;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr3, Array4};
    use synseg_core::{MeasureColumns, VoxelCoord};

    fn labels_1d(n_vox: usize, centroids: &[VoxelCoord], weights: &[f32]) -> LabelVolume {
        let kernel = arr3(&[[[1.0f32]]]);
        assign_voxels(weights, centroids, [1, 1, n_vox], kernel.view()).unwrap()
    }

    #[test]
    fn test_segment_channels_follow_ownership() {
        let mut batch = SegmentBatch::new(MeasureColumns::Two);
        batch.push(VoxelCoord::new(0, 0, 1), &[10.0, 3.0]).unwrap();
        let labels = labels_1d(3, &[VoxelCoord::new(0, 0, 1)], &[10.0]);

        let mut view = Array4::<f32>::zeros((1, 1, 3, 1));
        view[[0, 0, 0, 0]] = 7.0;
        view[[0, 0, 1, 0]] = 8.0;

        let out = compose_view_channels(view.view(), &labels, &batch);
        assert_eq!(out.dim(), (1, 1, 3, 4));
        // Raw passes through.
        assert_abs_diff_eq!(out[[0, 0, 0, 0]], 7.0);
        // Owned voxel carries the segment's measurements.
        assert_abs_diff_eq!(out[[0, 0, 1, 1]], 10.0);
        assert_abs_diff_eq!(out[[0, 0, 1, 2]], 3.0);
        // Background voxels stay zero in the segment channels.
        assert_abs_diff_eq!(out[[0, 0, 0, 1]], 0.0);
        // No red layout: channel 3 stays empty.
        assert_abs_diff_eq!(out[[0, 0, 1, 3]], 0.0);
    }

    #[test]
    fn test_red_channel_with_autofluorescence_fill() {
        let mut batch = SegmentBatch::new(MeasureColumns::Five);
        batch
            .push(VoxelCoord::new(0, 0, 0), &[10.0, 3.0, 9.0, 2.0, 4.0])
            .unwrap();
        let labels = labels_1d(2, &[VoxelCoord::new(0, 0, 0)], &[10.0]);

        let mut view = Array4::<f32>::zeros((1, 1, 2, 2));
        view[[0, 0, 0, 1]] = 5.0;
        view[[0, 0, 1, 1]] = 6.0;

        let out = compose_view_channels(view.view(), &labels, &batch);
        // Owned voxel: red measurement only.
        assert_abs_diff_eq!(out[[0, 0, 0, 3]], 4.0);
        // Background voxel: autofluorescence fill.
        assert_abs_diff_eq!(out[[0, 0, 1, 3]], 6.0);
    }

    #[test]
    #[should_panic(expected = "share a shape")]
    fn test_shape_mismatch_is_a_fault() {
        let batch = SegmentBatch::new(MeasureColumns::Two);
        let labels = labels_1d(3, &[], &[]);
        let view = Array4::<f32>::zeros((1, 1, 2, 1));
        let _ = compose_view_channels(view.view(), &labels, &batch);
    }
}
