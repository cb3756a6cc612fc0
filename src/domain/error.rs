use thiserror::Error;

use super::metadata::Timestamp;

/// Violations of the metadata record invariants
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata has no tracks")]
    NoTracks,

    #[error("track {track} has no segments")]
    EmptyTrack { track: usize },

    #[error("segmentCount is {declared} but tracks hold {counted} segments")]
    SegmentCountMismatch { declared: usize, counted: usize },

    #[error("release window ends at {end} which is not after its start {start}")]
    InvalidWindow { start: Timestamp, end: Timestamp },
}
