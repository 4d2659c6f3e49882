//! Ready-made workflow graphs.

use crate::config::WorkflowConfig;
use crate::error::WorkflowResult;
use crate::graph::WorkflowGraph;
use crate::paths::EpisodePaths;
use crate::stages::{ExternalFile, LabelPropagation, TalkingFace};

pub const TALKING_FACE_WORKFLOW: &str = "talking_face";
pub const ONE_FACE_WORKFLOW: &str = "one_face";

/// Stage that labels reference speech turns; last stage of both workflows.
pub const SPEECH_TAGGING_STAGE: &str = "conservative_direct_tagging";

/// Talking faces labeled with face clusters, then transferred onto speech turns:
///
/// ```text
/// sequences (external) ──► talking_face ──► talking_face_clustering ──► conservative_direct_tagging
///                                                ▲ source                        ▲ target
/// face_clusters (external) ──────────────────────┘                               │
/// speech_reference (external) ───────────────────────────────────────────────────┘
/// ```
pub fn talking_face_workflow(config: &WorkflowConfig) -> WorkflowResult<WorkflowGraph> {
    let paths = EpisodePaths::new(config);
    let output = |stage: &str| paths.stage_output(TALKING_FACE_WORKFLOW, stage);

    let mut graph = WorkflowGraph::new(TALKING_FACE_WORKFLOW);
    graph.add(ExternalFile::new("sequences", paths.sequence_list()))?;
    graph.add(ExternalFile::new("face_clusters", paths.face_clusters()))?;
    graph.add(ExternalFile::new("speech_reference", paths.speech_reference()))?;
    graph.add(TalkingFace::new(
        "talking_face",
        paths.clone(),
        config.talking_face.label.as_str(),
        output("talking_face"),
    ))?;
    graph.add(LabelPropagation::new(
        "talking_face_clustering",
        output("talking_face_clustering"),
    ))?;
    graph.add(LabelPropagation::new(
        SPEECH_TAGGING_STAGE,
        output(SPEECH_TAGGING_STAGE),
    ))?;

    graph.connect("sequences", "talking_face", TalkingFace::SEQUENCES)?;
    graph.connect("talking_face", "talking_face_clustering", LabelPropagation::TARGET)?;
    graph.connect("face_clusters", "talking_face_clustering", LabelPropagation::SOURCE)?;
    graph.connect("talking_face_clustering", SPEECH_TAGGING_STAGE, LabelPropagation::SOURCE)?;
    graph.connect("speech_reference", SPEECH_TAGGING_STAGE, LabelPropagation::TARGET)?;
    Ok(graph)
}

/// Speech turns labeled straight from face clusters, without talking-face detection:
///
/// ```text
/// face_clusters (external) ──► conservative_direct_tagging
///                                   ▲ target
/// speech_reference (external) ──────┘
/// ```
pub fn one_face_workflow(config: &WorkflowConfig) -> WorkflowResult<WorkflowGraph> {
    let paths = EpisodePaths::new(config);

    let mut graph = WorkflowGraph::new(ONE_FACE_WORKFLOW);
    graph.add(ExternalFile::new("face_clusters", paths.face_clusters()))?;
    graph.add(ExternalFile::new("speech_reference", paths.speech_reference()))?;
    graph.add(LabelPropagation::new(
        SPEECH_TAGGING_STAGE,
        paths.stage_output(ONE_FACE_WORKFLOW, SPEECH_TAGGING_STAGE),
    ))?;

    graph.connect("face_clusters", SPEECH_TAGGING_STAGE, LabelPropagation::SOURCE)?;
    graph.connect("speech_reference", SPEECH_TAGGING_STAGE, LabelPropagation::TARGET)?;
    Ok(graph)
}
