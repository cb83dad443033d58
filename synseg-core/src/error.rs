//! Error types for synseg-core.

use thiserror::Error;

/// Result type alias for synseg operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for synseg operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Segment count exceeds the largest supported identity encoding.
    #[error("segment count {count} exceeds the {max} identities addressable by a 3-byte encoding")]
    CapacityExceeded { count: usize, max: u32 },

    /// Centroid list and measurement table disagree in length.
    #[error("centroid count {centroids} does not match measurement row count {measures}")]
    LengthMismatch { centroids: usize, measures: usize },

    /// Measurement table has an unsupported column layout.
    #[error("measurement table has {found} columns, expected 2, 4, or 5")]
    BadMeasureColumns { found: usize },

    /// A measurement value is NaN or infinite.
    #[error("non-finite measurement in column {column} of segment {segment}")]
    NonFiniteMeasure { segment: u32, column: usize },

    /// A status byte outside the legal set {0, 1, 3, 5, 7}.
    #[error("invalid status byte {value}, expected one of 0, 1, 3, 5, 7")]
    InvalidStatusByte { value: u8 },
}
