//! Label-volume construction.
//!
//! Rasterizes detected segment centroids into a dense voxel-to-identity
//! map at the reduced display resolution, then repacks the identities
//! into the byte-tuple encoding the rendering stage samples.

use std::time::Instant;

use log::{debug, info};
use ndarray::{Array3, Array4, ArrayView3, Axis, Zip};
use synseg_core::{Result, SegmentIdCodec, VoxelCoord};

/// Dense voxel-to-identity map plus the codec that sized it.
///
/// Built once per load and read-only afterwards; the display stage may
/// sample it concurrently with input handling.
#[derive(Debug, Clone)]
pub struct LabelVolume {
    ids: Array3<u32>,
    codec: SegmentIdCodec,
}

impl LabelVolume {
    /// Returns the identity of each voxel, 0 for background.
    #[must_use]
    pub fn ids(&self) -> ArrayView3<'_, u32> {
        self.ids.view()
    }

    /// Returns the identity codec sized to the rasterized batch.
    #[must_use]
    pub fn codec(&self) -> SegmentIdCodec {
        self.codec
    }

    /// Returns the volume shape as `[nz, ny, nx]`.
    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        let (nz, ny, nx) = self.ids.dim();
        [nz, ny, nx]
    }

    /// Returns the number of voxels claimed by some segment.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.ids.iter().filter(|&&id| id != 0).count()
    }

    /// Repacks the identity volume into its byte-tuple encoding for
    /// dense storage, one 3-byte key per voxel.
    #[must_use]
    pub fn encoded(&self) -> Array4<u8> {
        let (nz, ny, nx) = self.ids.dim();
        let mut out = Array4::<u8>::zeros((nz, ny, nx, 3));
        let codec = self.codec;
        Zip::from(&self.ids)
            .and(out.lanes_mut(Axis(3)))
            .par_for_each(|&id, mut lane| {
                let bytes = codec.encode(id);
                lane[0] = bytes[0];
                lane[1] = bytes[1];
                lane[2] = bytes[2];
            });
        out
    }
}

/// Rasterizes segment ownership into a dense identity volume.
///
/// Each segment splats `weight * kernel` over the kernel support around
/// its (already reduced) centroid; every destination voxel keeps the
/// identity whose contribution is highest. Segments are processed in
/// ascending identity order and only a strictly greater weight displaces
/// an earlier claim, so exact ties resolve to the first encountered.
/// Kernel support falling outside the volume is clipped; a voxel that
/// no positive contribution reaches stays background.
///
/// # Errors
/// Returns [`synseg_core::Error::CapacityExceeded`] when the segment
/// count overflows the identity encoding, or
/// [`synseg_core::Error::LengthMismatch`] when weights and centroids
/// disagree in length.
pub fn assign_voxels(
    weights: &[f32],
    centroids: &[VoxelCoord],
    shape: [usize; 3],
    kernel: ArrayView3<'_, f32>,
) -> Result<LabelVolume> {
    if weights.len() != centroids.len() {
        return Err(synseg_core::Error::LengthMismatch {
            centroids: centroids.len(),
            measures: weights.len(),
        });
    }
    let codec = SegmentIdCodec::for_count(weights.len())?;
    let started = Instant::now();

    let mut ids = Array3::<u32>::zeros(shape);
    let mut best = Array3::<f32>::zeros(shape);
    let (kz, ky, kx) = kernel.dim();
    let center = [kz as i64 / 2, ky as i64 / 2, kx as i64 / 2];

    for (i, (&weight, centroid)) in weights.iter().zip(centroids).enumerate() {
        let id = i as u32 + 1;
        let origin = [
            i64::from(centroid.z) - center[0],
            i64::from(centroid.y) - center[1],
            i64::from(centroid.x) - center[2],
        ];
        for oz in 0..kz {
            let z = origin[0] + oz as i64;
            if z < 0 || z >= shape[0] as i64 {
                continue;
            }
            for oy in 0..ky {
                let y = origin[1] + oy as i64;
                if y < 0 || y >= shape[1] as i64 {
                    continue;
                }
                for ox in 0..kx {
                    let x = origin[2] + ox as i64;
                    if x < 0 || x >= shape[2] as i64 {
                        continue;
                    }
                    let contribution = weight * kernel[[oz, oy, ox]];
                    if contribution <= 0.0 {
                        continue;
                    }
                    let slot = [z as usize, y as usize, x as usize];
                    if contribution > best[slot] {
                        best[slot] = contribution;
                        ids[slot] = id;
                    }
                }
            }
        }
    }

    let volume = LabelVolume { ids, codec };
    info!(
        "label volume: {} segments claimed {} of {} voxels in {:.2?}",
        weights.len(),
        volume.occupied(),
        shape.iter().product::<usize>(),
        started.elapsed()
    );
    debug!(
        "label volume: kernel support {kz}x{ky}x{kx}, encoding width {}",
        codec.width()
    );
    Ok(volume)
}
