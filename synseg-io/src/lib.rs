//! synseg-io: Interchange-file persistence for synseg.
//!
//! This crate reads and writes the row-oriented interchange format that
//! carries segment centroids, measurements, and manual overrides, and
//! renders the debug artifacts (centroid overlay, threshold heatmap).
//!

mod artifacts;
mod error;
mod interchange;

pub use artifacts::{write_centroid_overlay, write_segment_heatmap};
pub use error::{Error, Result};
pub use interchange::{read_overrides, read_segment_table, SegmentTableWriter};
