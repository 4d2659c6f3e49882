//! Built-in workflow stages.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use tvd_annotation::{json, ConservativeTagger, SequenceDescriptor, TalkingFaceParser};

use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::{Stage, StageInputs};
use crate::paths::EpisodePaths;

/// File produced outside this workflow (sequence lists, face clustering, references).
/// Running it only checks that the file is there.
pub struct ExternalFile {
    name: String,
    path: PathBuf,
}

impl ExternalFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl Stage for ExternalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn output(&self) -> &Path {
        &self.path
    }

    fn run(&self, _inputs: &StageInputs) -> WorkflowResult<()> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(WorkflowError::MissingExternal {
                stage: self.name.clone(),
                path: self.path.clone(),
            })
        }
    }
}

/// Sequence list + per-sequence logs → talking-face annotation.
///
/// Input slot `sequences`: the sequence list. Per-sequence logs are located through
/// the episode path templates.
pub struct TalkingFace {
    name: String,
    paths: EpisodePaths,
    label: String,
    output: PathBuf,
}

impl TalkingFace {
    pub const SEQUENCES: &'static str = "sequences";

    pub fn new(
        name: impl Into<String>,
        paths: EpisodePaths,
        label: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            paths,
            label: label.into(),
            output: output.into(),
        }
    }
}

impl Stage for TalkingFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[&'static str] {
        &[Self::SEQUENCES]
    }

    fn output(&self) -> &Path {
        &self.output
    }

    fn run(&self, inputs: &StageInputs) -> WorkflowResult<()> {
        let list = inputs.get(Self::SEQUENCES)?;
        let paths = &self.paths;
        let parser = TalkingFaceParser::new(|d: &SequenceDescriptor| {
            paths.sequence_log(d.identifier, d.index)
        })
        .with_label(self.label.as_str());

        let (annotation, report) = parser.parse_list(list)?;
        if report.skipped > 0 {
            warn!(
                stage = %self.name,
                skipped = report.skipped,
                of = report.sequences,
                "some sequences contributed nothing"
            );
        }
        let annotation = annotation.with_uri(paths.episode());
        json::dump_to_path(&annotation, &self.output)?;
        info!(stage = %self.name, entries = annotation.len(), output = %self.output.display(), "talking faces written");
        Ok(())
    }
}

/// Conservative propagation of `source` labels onto `target` entries with the same track.
pub struct LabelPropagation {
    name: String,
    output: PathBuf,
}

impl LabelPropagation {
    pub const SOURCE: &'static str = "source";
    pub const TARGET: &'static str = "target";

    pub fn new(name: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
        }
    }
}

impl Stage for LabelPropagation {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[&'static str] {
        &[Self::SOURCE, Self::TARGET]
    }

    fn output(&self) -> &Path {
        &self.output
    }

    fn run(&self, inputs: &StageInputs) -> WorkflowResult<()> {
        let source = json::load_from_path(inputs.get(Self::SOURCE)?)?;
        let target = json::load_from_path(inputs.get(Self::TARGET)?)?;

        let result = ConservativeTagger::new().tag(&target, &source);
        if result.report.conflicts > 0 {
            warn!(
                stage = %self.name,
                conflicts = result.report.conflicts,
                "target keys matched several source labels; the latest source entry was kept"
            );
        }
        json::dump_to_path(&result.annotation, &self.output)?;
        info!(
            stage = %self.name,
            labeled = result.annotation.len(),
            dropped = result.report.dropped,
            output = %self.output.display(),
            "propagation written"
        );
        Ok(())
    }
}
