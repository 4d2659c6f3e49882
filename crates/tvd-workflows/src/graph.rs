//! Workflow graph: stages with named input slots, explicit edges, topological run.
//!
//! Each stage writes exactly one output file. Connecting `from → to.slot` hands the
//! output path of `from` to `to` under `slot` when `to` runs. The execution order is
//! resolved (and every slot checked) before the first stage starts.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{WorkflowError, WorkflowResult};

/// One node of a workflow.
pub trait Stage: Send {
    fn name(&self) -> &str;

    /// Named input slots; each must be connected before the workflow runs.
    fn inputs(&self) -> &[&'static str] {
        &[]
    }

    /// File this stage produces (or, for external stages, expects to exist).
    fn output(&self) -> &Path;

    fn run(&self, inputs: &StageInputs) -> WorkflowResult<()>;
}

/// Output paths of upstream stages, keyed by slot name.
#[derive(Debug, Default, Clone)]
pub struct StageInputs {
    stage: String,
    paths: BTreeMap<String, PathBuf>,
}

impl StageInputs {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            paths: BTreeMap::new(),
        }
    }

    pub fn with(mut self, slot: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(slot.into(), path.into());
        self
    }

    pub fn get(&self, slot: &str) -> WorkflowResult<&Path> {
        self.paths
            .get(slot)
            .map(PathBuf::as_path)
            .ok_or_else(|| WorkflowError::UnboundInput {
                stage: self.stage.clone(),
                slot: slot.to_string(),
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageRun {
    pub stage: String,
    pub output: PathBuf,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub workflow: String,
    pub stages: Vec<StageRun>,
}

impl RunSummary {
    /// Output of the last stage to run.
    pub fn final_output(&self) -> Option<&Path> {
        self.stages.last().map(|s| s.output.as_path())
    }
}

pub struct WorkflowGraph {
    name: String,
    stages: Vec<Box<dyn Stage>>,
    index: HashMap<String, usize>,
    /// (to, slot) → from
    bindings: BTreeMap<(usize, String), usize>,
}

impl WorkflowGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            index: HashMap::new(),
            bindings: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, stage: impl Stage + 'static) -> WorkflowResult<()> {
        self.add_boxed(Box::new(stage))
    }

    pub fn add_boxed(&mut self, stage: Box<dyn Stage>) -> WorkflowResult<()> {
        let name = stage.name().to_string();
        if self.index.contains_key(&name) {
            return Err(WorkflowError::DuplicateStage(name));
        }
        self.index.insert(name, self.stages.len());
        self.stages.push(stage);
        Ok(())
    }

    fn position(&self, name: &str) -> WorkflowResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| WorkflowError::UnknownStage(name.to_string()))
    }

    /// Feed the output of `from` into input `slot` of `to`. Rebinding a slot replaces it.
    pub fn connect(&mut self, from: &str, to: &str, slot: &str) -> WorkflowResult<()> {
        let from_pos = self.position(from)?;
        let to_pos = self.position(to)?;
        if !self.stages[to_pos].inputs().iter().any(|s| *s == slot) {
            return Err(WorkflowError::UnknownSlot {
                stage: to.to_string(),
                slot: slot.to_string(),
            });
        }
        if let Some(previous) = self.bindings.insert((to_pos, slot.to_string()), from_pos) {
            debug!(
                stage = to,
                slot,
                previous = self.stages[previous].name(),
                "input rebound"
            );
        }
        Ok(())
    }

    /// Stage names in a valid execution order. Ties keep insertion order.
    pub fn execution_order(&self) -> WorkflowResult<Vec<&str>> {
        Ok(self
            .order()?
            .into_iter()
            .map(|i| self.stages[i].name())
            .collect())
    }

    fn order(&self) -> WorkflowResult<Vec<usize>> {
        for (pos, stage) in self.stages.iter().enumerate() {
            for slot in stage.inputs() {
                if !self.bindings.contains_key(&(pos, slot.to_string())) {
                    return Err(WorkflowError::UnboundInput {
                        stage: stage.name().to_string(),
                        slot: slot.to_string(),
                    });
                }
            }
        }

        let n = self.stages.len();
        let mut in_degree = vec![0usize; n];
        let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (&(to, _), &from) in &self.bindings {
            in_degree[to] += 1;
            downstream[from].push(to);
        }

        // Kahn's algorithm; the lowest insertion index goes first
        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &to in &downstream[next] {
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    ready.insert(to);
                }
            }
        }

        if order.len() < n {
            let stuck = (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.stages[i].name().to_string())
                .collect();
            return Err(WorkflowError::Cycle(stuck));
        }
        Ok(order)
    }

    fn inputs_for(&self, pos: usize) -> StageInputs {
        let stage = &self.stages[pos];
        self.bindings
            .iter()
            .filter(|((to, _), _)| *to == pos)
            .fold(StageInputs::new(stage.name()), |inputs, ((_, slot), &from)| {
                inputs.with(slot.clone(), self.stages[from].output())
            })
    }

    /// Run every stage in dependency order, stopping at the first failure.
    pub fn run(&self) -> WorkflowResult<RunSummary> {
        let order = self.order()?;
        info!(workflow = %self.name, stages = order.len(), "workflow starting");

        let mut runs = Vec::with_capacity(order.len());
        for pos in order {
            let stage = &self.stages[pos];
            let inputs = self.inputs_for(pos);
            let started = Instant::now();
            stage.run(&inputs).map_err(|e| WorkflowError::Stage {
                stage: stage.name().to_string(),
                source: Box::new(e),
            })?;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            debug!(stage = stage.name(), elapsed_ms, "stage done");
            runs.push(StageRun {
                stage: stage.name().to_string(),
                output: stage.output().to_path_buf(),
                elapsed_ms,
            });
        }

        info!(workflow = %self.name, "workflow finished");
        Ok(RunSummary {
            workflow: self.name.clone(),
            stages: runs,
        })
    }
}
