//! Splat-kernel helpers.
//!
//! The label-volume builder accepts any supplied kernel; these helpers
//! build the separable Gaussian used by the default pipeline, sized from
//! the physical segment diameter, the voxel spacing, and the display
//! reduction.

use ndarray::Array3;

/// Samples an unnormalized 1D Gaussian over a 3-sigma support on each
/// side (at least one tap).
#[must_use]
pub fn gaussian_taps(sigma: f32) -> Vec<f32> {
    let sigma = sigma.max(1e-3);
    let radius = (3.0 * sigma).ceil() as i64;
    (-radius..=radius)
        .map(|i| (-0.5 * (i as f32 / sigma).powi(2)).exp())
        .collect()
}

/// Composes three 1D kernels into a dense 3D kernel by outer product,
/// axes ordered (Z, Y, X).
#[must_use]
pub fn compose_3d(kz: &[f32], ky: &[f32], kx: &[f32]) -> Array3<f32> {
    let mut kernel = Array3::<f32>::zeros((kz.len(), ky.len(), kx.len()));
    for (iz, &vz) in kz.iter().enumerate() {
        for (iy, &vy) in ky.iter().enumerate() {
            for (ix, &vx) in kx.iter().enumerate() {
                kernel[[iz, iy, ix]] = vz * vy * vx;
            }
        }
    }
    kernel
}

/// Builds the normalized splat kernel for segments of physical diameter
/// `diam` (per-axis, same units as `spacing`) at the given per-axis
/// display reduction. Per axis, sigma = diameter / spacing / 6 /
/// reduction; the composed kernel sums to 1.
#[must_use]
pub fn splat_kernel(diam: [f32; 3], spacing: [f32; 3], reduction: [usize; 3]) -> Array3<f32> {
    let taps: Vec<Vec<f32>> = (0..3)
        .map(|axis| gaussian_taps(diam[axis] / spacing[axis] / 6.0 / reduction[axis] as f32))
        .collect();
    let mut kernel = compose_3d(&taps[0], &taps[1], &taps[2]);
    let sum: f32 = kernel.iter().sum();
    kernel.mapv_inplace(|v| v / sum);
    kernel
}
