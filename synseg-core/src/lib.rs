//! synseg-core: Core types and state logic for interactive segment review.
//!
//! This crate provides the foundational abstractions for identity
//! encoding, status state transitions, threshold classification, and
//! pick resolution over a detected segment batch.
//!

pub mod classify;
pub mod codec;
pub mod error;
pub mod pick;
pub mod segment;
pub mod session;
pub mod status;

pub use classify::{classify, DataRange, LevelKind, Levels, Verdict};
pub use codec::{SegmentIdCodec, MAX_SEGMENTS};
pub use error::{Error, Result};
pub use pick::{PickOutcome, PickResolver, ScreenPos};
pub use segment::{MeasureColumns, SegmentBatch, VoxelCoord};
pub use session::ReviewSession;
pub use status::{SegmentStatus, StatusGrid};
