//! Error types for workflow wiring and execution.

use std::path::PathBuf;

use thiserror::Error;
use tvd_annotation::AnnotationError;

/// Result type alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors that stop a workflow (or a single stage) from completing.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    #[error("stage {0:?} is already part of the workflow")]
    DuplicateStage(String),

    #[error("unknown stage {0:?}")]
    UnknownStage(String),

    #[error("stage {stage:?} has no input slot {slot:?}")]
    UnknownSlot { stage: String, slot: String },

    #[error("input {slot:?} of stage {stage:?} is not connected")]
    UnboundInput { stage: String, slot: String },

    #[error("workflow graph has a cycle through: {}", .0.join(", "))]
    Cycle(Vec<String>),

    #[error("external input for stage {stage:?} not found at {}", path.display())]
    MissingExternal { stage: String, path: PathBuf },

    #[error("stage {stage:?} failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<WorkflowError>,
    },
}
