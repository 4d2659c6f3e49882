//! Error types for annotations, serialization and detection-log parsing.

use std::path::PathBuf;

use thiserror::Error;

use crate::annotation::TrackId;
use crate::segment::Segment;

/// Result type alias for annotation operations
pub type AnnotationResult<T> = Result<T, AnnotationError>;

/// Errors surfaced to callers of the annotation API.
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("invalid segment [{start}, {end}): start must be finite, non-negative and before end")]
    InvalidSegment { start: f64, end: f64 },

    #[error("no label for {segment} / track {track}")]
    NotFound { segment: Segment, track: TrackId },

    #[error("malformed annotation file {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed annotation: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnnotationError {
    /// Attach a file path to a bare serialization error.
    pub(crate) fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            AnnotationError::Json(source) => AnnotationError::Format {
                path: path.into(),
                source,
            },
            other => other,
        }
    }
}

/// Local failures of the detection-log parser. These are reported through
/// [`crate::talking_face::SequenceOutcome`] and logged, never returned as a failed parse.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("sequence log {} unavailable: {source}", path.display())]
    MissingSequenceLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed detection record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("malformed sequence descriptor at line {line}: {reason}")]
    MalformedDescriptor { line: usize, reason: String },
}
