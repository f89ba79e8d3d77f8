//! Error types for the metafile recorder
//!
//! Every recording call is fallible; a failed call leaves the record
//! stream, handle table and bounds exactly as they were before it.

use crate::types::ObjectRef;
use thiserror::Error;

/// Custom error type for recorder operations
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Allocation failed while growing {0}")]
    Allocation(&'static str),

    #[error("Degenerate shape: zero width or height")]
    DegenerateShape,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid restore level {level} (save depth {depth})")]
    InvalidRestoreLevel { level: i32, depth: i32 },

    #[error("Could not query object {0:?}")]
    ObjectQuery(ObjectRef),

    #[error("Object {0:?} cannot be recorded")]
    UnsupportedObject(ObjectRef),

    #[error("No path is available for this operation")]
    NoPath,

    #[error("Handle table is full")]
    HandleTableFull,

    #[error("Record of {0} bytes exceeds the format limit")]
    RecordTooLarge(usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(String),

    #[error("Invalid metafile: {0}")]
    InvalidMetafile(String),
}

/// Result type alias for recorder operations
pub type RecorderResult<T> = Result<T, RecorderError>;

/// Helper to convert serde_json errors
impl From<serde_json::Error> for RecorderError {
    fn from(err: serde_json::Error) -> Self {
        RecorderError::JsonError(err.to_string())
    }
}
