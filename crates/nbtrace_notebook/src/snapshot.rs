//! Notebook snapshots.
//!
//! A snapshot is an immutable value: every mutation returns a new snapshot
//! and leaves the receiver untouched, so a chain of snapshots can be kept
//! side by side. The `*_in_place` variants exist for callers that own the
//! only copy.

use crate::cell::CellEntry;
use crate::diff::CellDiff;
use crate::document::{read_document, write_document, DocumentWrapper};
use nbtrace_core::{CellId, CoreError, CoreResult, ESCAPED_NEWLINE};
use nbtrace_log::{split_escaped_lines, LogEntry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Direction in which cells are searched for matching content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scan {
    /// First cell to last
    #[default]
    FromTop,
    /// Last cell to first
    FromBottom,
}

/// State of a notebook at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookSnapshot {
    label: String,
    wrapper: DocumentWrapper,
    cells: Vec<CellEntry>,
}

impl NotebookSnapshot {
    /// Parse a notebook document.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the document is not a notebook
    pub fn parse_str(label: impl Into<String>, json: &str) -> CoreResult<Self> {
        let label = label.into();
        let (wrapper, cells) = read_document(json)?;
        tracing::debug!(notebook = %label, cells = cells.len(), "parsed notebook");
        Ok(Self {
            label,
            wrapper,
            cells,
        })
    }

    /// Read and parse a notebook file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `ParseError` if it is not a notebook
    pub fn from_path(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, &e))?;
        Self::parse_str(path.display().to_string(), &json)
    }

    /// Build a snapshot from cells. Ids are reassigned by position.
    #[must_use]
    pub fn from_cells(label: impl Into<String>, cells: Vec<CellEntry>) -> Self {
        let cells = cells
            .into_iter()
            .enumerate()
            .map(|(position, mut cell)| {
                cell.cell_id = CellId::new(position);
                cell
            })
            .collect();
        Self {
            label: label.into(),
            wrapper: DocumentWrapper::default(),
            cells,
        }
    }

    /// Label of the source (usually the file path)
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Same snapshot under another label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Document-level fields
    #[must_use]
    pub const fn wrapper(&self) -> &DocumentWrapper {
        &self.wrapper
    }

    /// Cells in document order
    #[must_use]
    pub fn cells(&self) -> &[CellEntry] {
        &self.cells
    }

    /// Number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when the notebook has no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell with a given id
    #[must_use]
    pub fn get(&self, id: CellId) -> Option<&CellEntry> {
        self.cells.get(id.index())
    }

    /// Iterate cells in document order
    pub fn iter(&self) -> std::slice::Iter<'_, CellEntry> {
        self.cells.iter()
    }

    /// Find the first cell, in `scan` order, whose source matches escaped
    /// log content line by line after normalization.
    #[must_use]
    pub fn find_cell_by_content(&self, content: &str, scan: Scan) -> Option<&CellEntry> {
        match scan {
            Scan::FromTop => self.cells.iter().find(|c| c.matches_content(content)),
            Scan::FromBottom => self.cells.iter().rev().find(|c| c.matches_content(content)),
        }
    }

    /// New snapshot with `cell`'s source replaced by escaped content.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the snapshot has no cell with that id
    pub fn replace_cell_content(&self, cell: &CellEntry, raw: &str) -> CoreResult<Self> {
        let mut next = self.clone();
        next.replace_cell_content_in_place(cell, raw)?;
        Ok(next)
    }

    /// In-place form of [`Self::replace_cell_content`]
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the snapshot has no cell with that id
    pub fn replace_cell_content_in_place(&mut self, cell: &CellEntry, raw: &str) -> CoreResult<()> {
        let slot = self.slot_mut(cell.cell_id)?;
        slot.source = split_escaped_lines(raw).into_iter().map(str::to_string).collect();
        Ok(())
    }

    /// New snapshot with `cell`'s source cleared.
    ///
    /// # Errors
    ///
    /// Returns `Consistency` if `cell` is not the snapshot's current cell with that id
    pub fn drop_content(&self, cell: &CellEntry) -> CoreResult<Self> {
        let mut next = self.clone();
        next.drop_content_in_place(cell)?;
        Ok(next)
    }

    /// In-place form of [`Self::drop_content`]
    ///
    /// # Errors
    ///
    /// Returns `Consistency` if `cell` is not the snapshot's current cell with that id
    pub fn drop_content_in_place(&mut self, cell: &CellEntry) -> CoreResult<()> {
        self.ensure_on_record(cell)?;
        self.slot_mut(cell.cell_id)?.source.clear();
        Ok(())
    }

    /// New snapshot where `cell` keeps only its leading `#` comment lines.
    ///
    /// # Errors
    ///
    /// Returns `Consistency` if `cell` is not the snapshot's current cell with that id
    pub fn drop_code(&self, cell: &CellEntry) -> CoreResult<Self> {
        let mut next = self.clone();
        next.drop_code_in_place(cell)?;
        Ok(next)
    }

    /// In-place form of [`Self::drop_code`]
    ///
    /// # Errors
    ///
    /// Returns `Consistency` if `cell` is not the snapshot's current cell with that id
    pub fn drop_code_in_place(&mut self, cell: &CellEntry) -> CoreResult<()> {
        self.ensure_on_record(cell)?;
        let header = cell.header_comments().to_vec();
        self.slot_mut(cell.cell_id)?.source = header;
        Ok(())
    }

    /// New snapshot with a log entry's content written into a cell.
    ///
    /// An entry without content leaves the snapshot as is.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the snapshot has no cell with that id
    pub fn apply_log_entry(&self, cell_id: CellId, entry: &LogEntry) -> CoreResult<Self> {
        let mut next = self.clone();
        next.apply_log_entry_in_place(cell_id, entry)?;
        Ok(next)
    }

    /// In-place form of [`Self::apply_log_entry`]
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the snapshot has no cell with that id
    pub fn apply_log_entry_in_place(&mut self, cell_id: CellId, entry: &LogEntry) -> CoreResult<()> {
        let Some(raw) = entry.raw_content() else {
            return Ok(());
        };
        let pieces = split_escaped_lines(raw);

        // Content synthesized from notebook source keeps real newlines, so a
        // marker inside a line split it in two. Glue those pieces back.
        let source = if pieces.first().is_some_and(|first| first.ends_with('\n')) {
            let mut lines: Vec<String> = Vec::with_capacity(pieces.len());
            for piece in pieces {
                match lines.last_mut() {
                    Some(last) if !last.ends_with('\n') => {
                        last.push_str(ESCAPED_NEWLINE);
                        last.push_str(piece);
                    }
                    _ => lines.push(piece.to_string()),
                }
            }
            lines
        } else {
            pieces.into_iter().map(str::to_string).collect()
        };

        self.slot_mut(cell_id)?.source = source;
        Ok(())
    }

    /// Cells that differ between `self` and a later snapshot, in id order.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the snapshots have different cell counts
    pub fn get_diff(&self, other: &Self) -> CoreResult<Vec<CellDiff>> {
        if self.len() != other.len() {
            return Err(CoreError::Validation {
                field: "cells".to_string(),
                reason: format!(
                    "cannot diff {} cells against {} cells",
                    self.len(),
                    other.len()
                ),
            });
        }
        Ok(self
            .cells
            .iter()
            .zip(&other.cells)
            .filter(|(before, after)| before != after)
            .map(|(before, after)| CellDiff {
                before: before.clone(),
                after: after.clone(),
            })
            .collect())
    }

    /// Notebook document for this snapshot
    ///
    /// # Errors
    ///
    /// Returns `Validation` if a cell has a type nbformat does not define
    pub fn to_document(&self) -> CoreResult<serde_json::Value> {
        write_document(&self.wrapper, &self.cells)
    }

    /// Notebook document as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns `Validation` if a cell has a type nbformat does not define
    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_document()?)?)
    }

    /// Write the notebook document to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `Io` on write failure, `Validation` for unsupported cell types
    pub fn write_to(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        let path = path.as_ref();
        let json = self.to_json_pretty()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, &e))?;
        }
        std::fs::write(path, json).map_err(|e| CoreError::io(path, &e))?;
        tracing::debug!(path = %path.display(), cells = self.len(), "wrote notebook state");
        Ok(())
    }

    fn slot_mut(&mut self, id: CellId) -> CoreResult<&mut CellEntry> {
        self.cells.get_mut(id.index()).ok_or_else(|| CoreError::NotFound {
            kind: "Cell".to_string(),
            id: id.to_string(),
        })
    }

    fn ensure_on_record(&self, cell: &CellEntry) -> CoreResult<()> {
        match self.get(cell.cell_id) {
            Some(current) if current == cell => Ok(()),
            Some(_) => Err(CoreError::Consistency {
                reason: format!("{} does not match the snapshot's cell", cell.cell_id),
            }),
            None => Err(CoreError::NotFound {
                kind: "Cell".to_string(),
                id: cell.cell_id.to_string(),
            }),
        }
    }
}

impl std::ops::Index<usize> for NotebookSnapshot {
    type Output = CellEntry;

    fn index(&self, index: usize) -> &Self::Output {
        &self.cells[index]
    }
}

impl<'a> IntoIterator for &'a NotebookSnapshot {
    type Item = &'a CellEntry;
    type IntoIter = std::slice::Iter<'a, CellEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

impl std::fmt::Display for NotebookSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} ({} cells)", self.label, self.len())?;
        for cell in &self.cells {
            write!(f, "{cell}")?;
        }
        Ok(())
    }
}
