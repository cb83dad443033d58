//! Debug artifacts.
//!
//! Read-only export conveniences: a centroid-annotated projection of
//! the raw signal and a 2D histogram of the measurement distribution
//! under the current thresholds. Neither participates in the override
//! round-trip contract.

use std::path::Path;

use image::{Rgb, RgbImage};
use log::info;
use ndarray::ArrayView2;
use synseg_core::{classify, DataRange, Levels, SegmentBatch};

use crate::Result;

/// Heatmap edge length in bins.
const HEATMAP_SIZE: usize = 1024;
/// Per-count brightness gain before clamping to 8 bits.
const HEATMAP_GAIN: u32 = 64;
/// Upper bound of the logarithmic measurement axes.
const HEATMAP_MAX_VALUE: f32 = 80_000.0;

/// Writes a centroid-annotated projection of the raw signal.
///
/// The projection lands in the blue channel, square-root scaled to lift
/// dim structure; each centroid inside the frame gets a full-intensity
/// green marker.
///
/// # Errors
/// Returns an error if the image cannot be encoded or written.
pub fn write_centroid_overlay<P: AsRef<Path>>(
    path: P,
    raw: ArrayView2<'_, f32>,
    batch: &SegmentBatch,
) -> Result<()> {
    let (ny, nx) = raw.dim();
    let peak = raw.iter().fold(0.0f32, |a, &v| a.max(v)).max(1e-6);

    let mut img = RgbImage::new(nx as u32, ny as u32);
    for ((y, x), &value) in raw.indexed_iter() {
        let blue = ((value / peak).max(0.0).sqrt() * 255.0) as u8;
        img.put_pixel(x as u32, y as u32, Rgb([0, 0, blue]));
    }

    let mut marked = 0usize;
    for index in 0..batch.len() {
        let c = batch.centroid(index);
        if c.y >= 0 && (c.y as usize) < ny && c.x >= 0 && (c.x as usize) < nx {
            let pixel = img.get_pixel_mut(c.x as u32, c.y as u32);
            pixel[1] = 255;
            marked += 1;
        }
    }

    img.save(&path)?;
    info!(
        "{}: overlay dumped, {marked} of {} centroids in frame",
        path.as_ref().display(),
        batch.len()
    );
    Ok(())
}

/// Writes the core/hollow distribution heatmap under the current
/// thresholds.
///
/// Both axes are logarithmic up to a fixed ceiling; each segment adds
/// one count to its (core, hollow) bin. The red channel shows every
/// segment, the green channel only those the threshold chain includes,
/// so threshold moves are visible as the green cloud growing or
/// shrinking inside the red one.
///
/// # Errors
/// Returns an error if the image cannot be encoded or written.
pub fn write_segment_heatmap<P: AsRef<Path>>(
    path: P,
    batch: &SegmentBatch,
    levels: &Levels,
    range: DataRange,
) -> Result<()> {
    let mut counts = vec![[0u32; 2]; HEATMAP_SIZE * HEATMAP_SIZE];
    let mut included = 0usize;

    for index in 0..batch.len() {
        let core = batch.core(index);
        if core <= 0.0 {
            continue;
        }
        let x = log_bin(core);
        let hollow = batch.hollow(index);
        let y = if hollow > 0.0 { log_bin(hollow) } else { 0 };
        counts[y * HEATMAP_SIZE + x][0] += 1;

        let verdict = classify(
            range.normalize(core),
            range.normalize(hollow),
            batch.red(index).map(|v| range.normalize(v)),
            levels,
        );
        if verdict.is_included() {
            counts[y * HEATMAP_SIZE + x][1] += 1;
            included += 1;
        }
    }

    let mut img = RgbImage::new(HEATMAP_SIZE as u32, HEATMAP_SIZE as u32);
    for (slot, bin) in counts.iter().enumerate() {
        let red = (bin[0] * HEATMAP_GAIN).min(255) as u8;
        let green = (bin[1] * HEATMAP_GAIN).min(255) as u8;
        if red > 0 || green > 0 {
            let x = (slot % HEATMAP_SIZE) as u32;
            let y = (slot / HEATMAP_SIZE) as u32;
            img.put_pixel(x, y, Rgb([red, green, 0]));
        }
    }

    img.save(&path)?;
    info!(
        "{}: heatmap dumped, {included} of {} segments included",
        path.as_ref().display(),
        batch.len()
    );
    Ok(())
}

fn log_bin(value: f32) -> usize {
    let scaled = value.ln().max(0.0) * HEATMAP_SIZE as f32 / HEATMAP_MAX_VALUE.ln();
    (scaled as usize).min(HEATMAP_SIZE - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use synseg_core::{MeasureColumns, VoxelCoord};
    use tempfile::tempdir;

    #[test]
    fn test_overlay_marks_centroids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("overlay.png");

        let mut raw = Array2::<f32>::zeros((8, 8));
        raw[[2, 2]] = 4.0;
        let mut batch = SegmentBatch::new(MeasureColumns::Two);
        batch.push(VoxelCoord::new(0, 2, 2), &[4.0, 1.0]).unwrap();
        // Out-of-frame centroid is skipped, not an error.
        batch.push(VoxelCoord::new(0, 50, 50), &[4.0, 1.0]).unwrap();

        write_centroid_overlay(&path, raw.view(), &batch).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (8, 8));
        assert_eq!(img.get_pixel(2, 2)[1], 255);
        // Brightest raw voxel saturates the blue channel.
        assert_eq!(img.get_pixel(2, 2)[2], 255);
        assert_eq!(img.get_pixel(0, 0)[1], 0);
    }

    #[test]
    fn test_heatmap_separates_included_counts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("heatmap.png");

        let mut batch = SegmentBatch::new(MeasureColumns::Two);
        batch
            .push(VoxelCoord::new(0, 0, 0), &[1000.0, 10.0])
            .unwrap();
        batch.push(VoxelCoord::new(1, 0, 0), &[2.0, 10.0]).unwrap();
        let range = DataRange::new(0.0, 1000.0);
        // Floor at 0.5 normalized = 500: only the first segment passes.
        let levels = Levels {
            floor: 0.5,
            ..Levels::default()
        };

        write_segment_heatmap(&path, &batch, &levels, range).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (HEATMAP_SIZE as u32, HEATMAP_SIZE as u32));
        let strong = img.get_pixel(log_bin(1000.0) as u32, log_bin(10.0) as u32);
        assert_eq!(strong[0], HEATMAP_GAIN as u8);
        assert_eq!(strong[1], HEATMAP_GAIN as u8);
        let weak = img.get_pixel(log_bin(2.0) as u32, log_bin(10.0) as u32);
        assert_eq!(weak[0], HEATMAP_GAIN as u8);
        assert_eq!(weak[1], 0);
    }
}
