//! Reconstructed history chains.

use crate::step::{ChangeKind, NbStep};
use nbtrace_core::{CellId, CoreError, CoreResult, EntryId};
use nbtrace_notebook::NotebookSnapshot;
use serde::{Deserialize, Serialize};

/// Ordered chain of steps, oldest first. The first step is always the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    steps: Vec<NbStep>,
}

impl Progress {
    /// Chain holding only its root
    #[must_use]
    pub fn new(root: NotebookSnapshot) -> Self {
        Self {
            steps: vec![NbStep::root(root)],
        }
    }

    pub(crate) fn push(&mut self, step: NbStep) {
        self.steps.push(step);
    }

    /// Number of steps, root included
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false; a chain has at least its root
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at a position
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&NbStep> {
        self.steps.get(index)
    }

    /// Iterate steps oldest first
    pub fn iter(&self) -> std::slice::Iter<'_, NbStep> {
        self.steps.iter()
    }

    /// Root step
    #[must_use]
    pub fn first(&self) -> Option<&NbStep> {
        self.steps.first()
    }

    /// Newest step
    #[must_use]
    pub fn last(&self) -> Option<&NbStep> {
        self.steps.last()
    }

    /// Snapshot of every step, oldest first
    pub fn states(&self) -> impl Iterator<Item = &NotebookSnapshot> {
        self.steps.iter().map(NbStep::snapshot)
    }

    /// Total number of entries over all steps
    #[must_use]
    pub fn unrolled_len(&self) -> usize {
        self.steps.iter().map(NbStep::len).sum()
    }

    /// Check that each step differs from its predecessor in exactly one cell.
    ///
    /// # Errors
    ///
    /// Returns `Validation` naming the first step that breaks the rule
    pub fn verify(&self) -> CoreResult<()> {
        for (index, pair) in self.steps.windows(2).enumerate() {
            let diffs = pair[0].snapshot().get_diff(pair[1].snapshot())?;
            if diffs.len() != 1 {
                return Err(CoreError::Validation {
                    field: format!("step {}", index + 1),
                    reason: format!("expected 1 changed cell, found {}", diffs.len()),
                });
            }
        }
        Ok(())
    }

    /// Serializable overview of the chain
    #[must_use]
    pub fn summary(&self) -> ProgressSummary {
        let notebook = self
            .first()
            .map(|step| step.snapshot().label().to_string())
            .unwrap_or_default();
        ProgressSummary {
            notebook,
            steps: self.len(),
            unrolled: self.unrolled_len(),
            changes: self
                .steps
                .iter()
                .enumerate()
                .skip(1)
                .map(|(index, step)| StepSummary {
                    index,
                    cell_id: step.cell_id(),
                    change: step.change(),
                    entries: step.entries().iter().map(|e| e.id).collect(),
                    line_counts: step
                        .entries()
                        .iter()
                        .map(|e| e.content.as_ref().map_or(0, |c| c.line_count()))
                        .collect(),
                })
                .collect(),
        }
    }
}

impl std::ops::Index<usize> for Progress {
    type Output = NbStep;

    fn index(&self, index: usize) -> &Self::Output {
        &self.steps[index]
    }
}

impl<'a> IntoIterator for &'a Progress {
    type Item = &'a NbStep;
    type IntoIter = std::slice::Iter<'a, NbStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Overview of a chain, one record per non-root step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Label of the notebook the chain belongs to
    pub notebook: String,
    /// Number of steps, root included
    pub steps: usize,
    /// Total number of entries
    pub unrolled: usize,
    /// Per-step records
    pub changes: Vec<StepSummary>,
}

/// Overview of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    /// Position in the chain
    pub index: usize,
    /// Cell the step touched
    pub cell_id: Option<CellId>,
    /// Change classification
    pub change: Option<ChangeKind>,
    /// Ids of the entries behind the step
    pub entries: Vec<EntryId>,
    /// Line count of each entry's content
    pub line_counts: Vec<usize>,
}
