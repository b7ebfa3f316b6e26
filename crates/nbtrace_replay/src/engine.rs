//! Log-driven reconstruction.
//!
//! The given notebook is the oldest known state and the root of the chain.
//! The engine walks one notebook's log partition forward from its first
//! entry. Every `CELL_EXECUTION_END` is a checkpoint: from there
//! the scanner looks back for the matching `CELL_EXECUTION_BEGIN` and the
//! `CELL_SELECTED` before it. When the selected content differs from the
//! executed content, the cell holding the selected content is located in the
//! newest snapshot and rewritten with the executed content.

use crate::progress::Progress;
use crate::step::{ChangeKind, NbStep};
use nbtrace_core::{CoreError, CoreResult, EntryId};
use nbtrace_log::{Cursor, EntryType, LogEntry, LogParser};
use nbtrace_notebook::{NotebookSnapshot, Scan};
use serde::{Deserialize, Serialize};

/// Replay engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Direction in which cells are searched for selected content
    pub scan: Scan,
    /// Treat a chain with no step beyond the root as a failure
    pub require_progress: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            scan: Scan::FromTop,
            require_progress: true,
        }
    }
}

/// Structural log problems found while scanning
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// An execution end for something other than a code cell
    #[error("non-code CELL_EXECUTION_END at {end}")]
    NonCodeEnd {
        /// Offending entry
        end: EntryId,
    },
    /// No execution begin before a checkpoint
    #[error("no CELL_EXECUTION_BEGIN before CELL_EXECUTION_END at {end}")]
    MissingBegin {
        /// Checkpoint entry
        end: EntryId,
    },
    /// An execution begin for something other than a code cell
    #[error("non-code CELL_EXECUTION_BEGIN at {begin}")]
    NonCodeBegin {
        /// Offending entry
        begin: EntryId,
    },
    /// Begin and end of one execution recorded different content
    #[error("CELL_EXECUTION_BEGIN at {begin} and CELL_EXECUTION_END at {end} differ")]
    ExecutionMismatch {
        /// Begin entry
        begin: EntryId,
        /// End entry
        end: EntryId,
    },
    /// No selection before an execution begin
    #[error("no CELL_SELECTED before CELL_EXECUTION_BEGIN at {begin}")]
    MissingSelected {
        /// Begin entry
        begin: EntryId,
    },
    /// Selection and execution disagree on the cell type
    #[error("CELL_SELECTED at {selected} and CELL_EXECUTION_BEGIN at {begin} have different cell types")]
    CellTypeMismatch {
        /// Selected entry
        selected: EntryId,
        /// Begin entry
        begin: EntryId,
    },
}

impl From<ScanError> for CoreError {
    fn from(err: ScanError) -> Self {
        CoreError::invalid_log(err.to_string())
    }
}

/// Position of the scanner. Positions index the log partition, not the
/// original file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Looking forward for the next `CELL_EXECUTION_END`
    SeekEnd,
    /// Looking back from a checkpoint for its `CELL_EXECUTION_BEGIN`
    SeekBegin {
        /// Position of the `CELL_EXECUTION_END`
        checkpoint: usize,
    },
    /// Looking back from the begin for the `CELL_SELECTED`
    SeekSelected {
        /// Position of the `CELL_EXECUTION_END`
        checkpoint: usize,
        /// Position of the `CELL_EXECUTION_BEGIN`
        begin: usize,
    },
    /// An edit was found and has to be placed in the newest snapshot
    Resolve {
        /// Position of the `CELL_EXECUTION_END`
        checkpoint: usize,
        /// Position of the `CELL_EXECUTION_BEGIN`
        begin: usize,
        /// Position of the `CELL_SELECTED`
        selected: usize,
    },
    /// The log is exhausted
    Done,
}

/// Replay engine for rebuilding a notebook's history from its log
#[derive(Debug, Clone, Default)]
pub struct ReplayEngine {
    config: ReplayConfig,
}

impl ReplayEngine {
    /// Create a new replay engine
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    #[must_use]
    pub fn with_config(mut self, config: ReplayConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Rebuild the history of `snapshot` from a single-notebook log.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLog` for a structurally broken log, `StateLogMismatch`
    /// when selected content cannot be found, and `NoProgress` when the log
    /// yields no edits and progress is required
    pub fn reconstruct(&self, snapshot: &NotebookSnapshot, log: &LogParser) -> CoreResult<Progress> {
        let mut progress = Progress::new(snapshot.clone());
        let mut cursor = Cursor::new(log);
        let mut state = ScanState::SeekEnd;

        while state != ScanState::Done {
            state = self.advance(state, &mut cursor, &mut progress)?;
        }

        if progress.len() == 1 && self.config.require_progress {
            return Err(CoreError::NoProgress {
                label: log.label().to_string(),
            });
        }

        tracing::info!(
            notebook = %snapshot.label(),
            log = %log.label(),
            steps = progress.len(),
            "reconstructed notebook history"
        );
        Ok(progress)
    }

    /// Run one transition of the scanner
    ///
    /// # Errors
    ///
    /// Returns the error that aborts the scan, if any
    pub fn advance(
        &self,
        state: ScanState,
        cursor: &mut Cursor<'_>,
        progress: &mut Progress,
    ) -> CoreResult<ScanState> {
        let next = match state {
            ScanState::SeekEnd => match cursor.seek_forward_to(&EntryType::CellExecutionEnd) {
                None => ScanState::Done,
                Some(end) if !end.is_code() => {
                    return Err(ScanError::NonCodeEnd { end: end.id }.into());
                }
                Some(end) => {
                    tracing::debug!(checkpoint = %end.id, "found CELL_EXECUTION_END");
                    ScanState::SeekBegin {
                        checkpoint: cursor.pos(),
                    }
                }
            },
            ScanState::SeekBegin { checkpoint } => {
                let end = entry_at(cursor, checkpoint)?;
                let begin = cursor
                    .seek_backward_to(&EntryType::CellExecutionBegin)
                    .ok_or(ScanError::MissingBegin { end: end.id })?;
                if !begin.is_code() {
                    return Err(ScanError::NonCodeBegin { begin: begin.id }.into());
                }
                if begin.content != end.content {
                    return Err(ScanError::ExecutionMismatch {
                        begin: begin.id,
                        end: end.id,
                    }
                    .into());
                }
                tracing::trace!(begin = %begin.id, "found CELL_EXECUTION_BEGIN");
                ScanState::SeekSelected {
                    checkpoint,
                    begin: cursor.pos(),
                }
            }
            ScanState::SeekSelected { checkpoint, begin } => {
                let begin_entry = entry_at(cursor, begin)?;
                let selected = cursor
                    .seek_backward_to(&EntryType::CellSelected)
                    .ok_or(ScanError::MissingSelected { begin: begin_entry.id })?;
                if selected.cell_type() != begin_entry.cell_type() {
                    return Err(ScanError::CellTypeMismatch {
                        selected: selected.id,
                        begin: begin_entry.id,
                    }
                    .into());
                }
                tracing::trace!(selected = %selected.id, "found CELL_SELECTED");

                if selected.raw_content() == begin_entry.raw_content() {
                    tracing::trace!(checkpoint = %begin_entry.id, "no edit before execution");
                    cursor.seek(checkpoint + 1);
                    ScanState::SeekEnd
                } else {
                    ScanState::Resolve {
                        checkpoint,
                        begin,
                        selected: cursor.pos(),
                    }
                }
            }
            ScanState::Resolve {
                checkpoint,
                begin,
                selected,
            } => {
                let begin = entry_at(cursor, begin)?;
                let selected = entry_at(cursor, selected)?;
                let tip = progress.last().map(NbStep::snapshot).ok_or_else(|| {
                    CoreError::Consistency {
                        reason: "chain has no root".to_string(),
                    }
                })?;
                if let Some(step) = self.resolve(tip, selected, begin)? {
                    progress.push(step);
                }
                cursor.seek(checkpoint + 1);
                ScanState::SeekEnd
            }
            ScanState::Done => ScanState::Done,
        };
        Ok(next)
    }

    /// Place one edit in the newest snapshot. `None` when the rewrite leaves
    /// the notebook unchanged.
    fn resolve(
        &self,
        tip: &NotebookSnapshot,
        selected: &LogEntry,
        begin: &LogEntry,
    ) -> CoreResult<Option<NbStep>> {
        let (Some(before_raw), Some(after)) = (selected.raw_content(), begin.content.as_ref()) else {
            return Err(ScanError::CellTypeMismatch {
                selected: selected.id,
                begin: begin.id,
            }
            .into());
        };

        let cell = tip
            .find_cell_by_content(before_raw, self.config.scan)
            .ok_or_else(|| CoreError::StateLogMismatch {
                unresolved: 1,
                reason: format!(
                    "content of CELL_SELECTED at {} not found in {}",
                    selected.id,
                    tip.label()
                ),
            })?;

        let next = tip.replace_cell_content(cell, &after.raw)?;
        if next == *tip {
            tracing::trace!(cell = %cell.cell_id, entry = %begin.id, "edit leaves cell unchanged");
            return Ok(None);
        }

        let change = ChangeKind::classify(cell.line_count(), after.line_count());
        tracing::debug!(cell = %cell.cell_id, entry = %begin.id, %change, "edit resolved");
        Ok(Some(NbStep::new(next, begin.clone(), cell.cell_id, change)))
    }
}

fn entry_at<'a>(cursor: &Cursor<'a>, position: usize) -> CoreResult<&'a LogEntry> {
    let mut probe = *cursor;
    probe.seek(position);
    probe.current().ok_or_else(|| CoreError::NotFound {
        kind: "Log position".to_string(),
        id: position.to_string(),
    })
}
