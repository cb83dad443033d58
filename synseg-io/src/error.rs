//! I/O error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed cell or row in an interchange file.
    #[error("{}: line {line}: {reason}", path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// What failed to parse.
        reason: String,
    },

    /// Interchange header does not describe a supported table layout.
    #[error("{}: unrecognized header: {reason}", path.display())]
    BadHeader {
        /// Offending file.
        path: PathBuf,
        /// What was wrong with the header.
        reason: String,
    },

    /// An interchange row's centroid matches no remaining live segment;
    /// the file was produced from a different analysis run.
    #[error(
        "{}: line {line}: centroid ({z}, {y}, {x}) matches no remaining segment; \
         the file belongs to a different analysis run",
        path.display()
    )]
    CoordinateMismatch {
        /// Offending file.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Row centroid Z.
        z: i32,
        /// Row centroid Y.
        y: i32,
        /// Row centroid X.
        x: i32,
    },

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] synseg_core::Error),

    /// Debug-artifact image error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
