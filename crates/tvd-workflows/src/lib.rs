//! # tvd-workflows: TV-series talking-face workflows
//!
//! Stage graph, path templates and configuration around `tvd-annotation`:
//! sequence lists and detection logs are turned into talking-face annotations,
//! labeled with externally produced face clusters, and those labels are transferred
//! onto reference speech turns.

pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod paths;
pub mod stages;
pub mod workflow;

pub use config::{TalkingFaceConfig, WorkflowConfig};
pub use error::{WorkflowError, WorkflowResult};
pub use graph::{RunSummary, Stage, StageInputs, StageRun, WorkflowGraph};
pub use paths::EpisodePaths;
pub use stages::{ExternalFile, LabelPropagation, TalkingFace};
pub use workflow::{
    one_face_workflow, talking_face_workflow, ONE_FACE_WORKFLOW, SPEECH_TAGGING_STAGE,
    TALKING_FACE_WORKFLOW,
};
