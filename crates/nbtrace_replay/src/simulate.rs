//! Simulated reconstruction for notebooks without a log.
//!
//! The history is made up: code cells are emptied one at a time from the
//! bottom of the notebook up, and the chain is read in the other direction
//! so it starts from an empty notebook and ends at the real one.

use crate::progress::Progress;
use crate::step::{ChangeKind, NbStep};
use nbtrace_core::{CellType, CoreError, CoreResult, EntryId};
use nbtrace_log::{CellContent, EntryType, LogEntry};
use nbtrace_notebook::NotebookSnapshot;
use serde::{Deserialize, Serialize};

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulateConfig {
    /// Keep each cell's leading `#` comment lines instead of emptying it
    pub keep_header_comments: bool,
    /// Treat a chain with no step beyond the root as a failure
    pub require_progress: bool,
}

impl Default for SimulateConfig {
    fn default() -> Self {
        Self {
            keep_header_comments: false,
            require_progress: true,
        }
    }
}

/// Builds a history chain from a final notebook alone
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    config: SimulateConfig,
}

impl Simulator {
    /// Create a new simulator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    #[must_use]
    pub fn with_config(mut self, config: SimulateConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &SimulateConfig {
        &self.config
    }

    /// Simulate the history of `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `NoProgress` when no code cell contributes a step and progress
    /// is required
    pub fn simulate(&self, snapshot: &NotebookSnapshot) -> CoreResult<Progress> {
        let mut steps = Vec::new();
        let mut current = snapshot.clone();

        for cell in snapshot.iter().rev().filter(|cell| cell.is_code()) {
            if cell.is_empty() {
                continue;
            }
            let predecessor = if self.config.keep_header_comments {
                current.drop_code(cell)?
            } else {
                current.drop_content(cell)?
            };
            if predecessor == current {
                tracing::trace!(cell = %cell.cell_id, "only header comments, skipped");
                continue;
            }

            let entry = LogEntry::synthetic(
                EntryId::new(steps.len()),
                EntryType::CellExecutionBegin,
                snapshot.label(),
                CellContent::new(cell.to_escaped(), CellType::Code),
            );
            tracing::debug!(cell = %cell.cell_id, entry = %entry.id, "synthesized execution");
            steps.push(NbStep::new(current, entry, cell.cell_id, ChangeKind::Insert));
            current = predecessor;
        }

        let mut progress = Progress::new(current);
        for step in steps.into_iter().rev() {
            progress.push(step);
        }

        if progress.len() == 1 && self.config.require_progress {
            return Err(CoreError::NoProgress {
                label: snapshot.label().to_string(),
            });
        }

        tracing::info!(
            notebook = %snapshot.label(),
            steps = progress.len(),
            "simulated notebook history"
        );
        Ok(progress)
    }
}
