//! One link of a reconstructed notebook history.

use nbtrace_core::{CellId, CoreResult};
use nbtrace_log::LogEntry;
use nbtrace_notebook::NotebookSnapshot;
use serde::{Deserialize, Serialize};

/// How a step changed its cell, judged by line count alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    /// The cell gained lines
    Insert,
    /// The cell kept its line count
    Update,
    /// The cell lost lines
    Delete,
}

impl ChangeKind {
    /// Classify an edit from the line counts before and after it
    #[must_use]
    pub const fn classify(before_lines: usize, after_lines: usize) -> Self {
        if before_lines < after_lines {
            Self::Insert
        } else if before_lines > after_lines {
            Self::Delete
        } else {
            Self::Update
        }
    }

    /// Textual tag
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot together with the log entries that produced it.
///
/// The root step of a chain has no entries, no cell and no change. Every
/// other step has at least one entry and names the cell it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NbStep {
    snapshot: NotebookSnapshot,
    entries: Vec<LogEntry>,
    cell_id: Option<CellId>,
    change: Option<ChangeKind>,
}

impl NbStep {
    /// Root of a chain
    #[must_use]
    pub fn root(snapshot: NotebookSnapshot) -> Self {
        Self {
            snapshot,
            entries: Vec::new(),
            cell_id: None,
            change: None,
        }
    }

    /// Step produced by one entry
    #[must_use]
    pub fn new(snapshot: NotebookSnapshot, entry: LogEntry, cell_id: CellId, change: ChangeKind) -> Self {
        Self {
            snapshot,
            entries: vec![entry],
            cell_id: Some(cell_id),
            change: Some(change),
        }
    }

    /// Snapshot after the step
    #[must_use]
    pub const fn snapshot(&self) -> &NotebookSnapshot {
        &self.snapshot
    }

    /// Entries that produced the step
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Cell the step touched
    #[must_use]
    pub const fn cell_id(&self) -> Option<CellId> {
        self.cell_id
    }

    /// Change classification
    #[must_use]
    pub const fn change(&self) -> Option<ChangeKind> {
        self.change
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for the root step
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Intermediate notebooks: the step's entries applied one at a time to
    /// its cell
    #[must_use]
    pub fn states(&self) -> States<'_> {
        States {
            step: self,
            next: 0,
        }
    }
}

impl std::fmt::Display for NbStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = "=".repeat(80);
        writeln!(f, "{rule}")?;
        match (self.cell_id, self.entries.last()) {
            (Some(cell_id), Some(entry)) => {
                let change = self.change.map_or("-", |c| c.as_str());
                writeln!(f, "{change} @ {cell_id} from {}:", entry.id)?;
                for line in entry.content_lines() {
                    writeln!(f, "    {line}")?;
                }
            }
            _ => writeln!(f, "root")?,
        }
        writeln!(f)?;
        write!(f, "{}", self.snapshot)?;
        writeln!(f, "{rule}")
    }
}

/// Iterator over the intermediate notebooks of a step
#[derive(Debug, Clone)]
pub struct States<'a> {
    step: &'a NbStep,
    next: usize,
}

impl Iterator for States<'_> {
    type Item = CoreResult<NotebookSnapshot>;

    fn next(&mut self) -> Option<Self::Item> {
        let cell_id = self.step.cell_id?;
        let entry = self.step.entries.get(self.next)?;
        self.next += 1;
        Some(self.step.snapshot.apply_log_entry(cell_id, entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.step.cell_id.is_some() {
            self.step.entries.len().saturating_sub(self.next)
        } else {
            0
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for States<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use nbtrace_core::{CellType, EntryId};
    use nbtrace_log::{CellContent, EntryType};
    use nbtrace_notebook::CellEntry;
    use proptest::prelude::*;

    fn snapshot(lines: &[&str]) -> NotebookSnapshot {
        NotebookSnapshot::from_cells(
            "A-subject-1.ipynb",
            vec![CellEntry::new(
                CellId::new(0),
                CellType::Code,
                lines.iter().map(|l| (*l).to_string()).collect(),
            )],
        )
    }

    fn begin(raw: &str) -> LogEntry {
        LogEntry::synthetic(
            EntryId::new(7),
            EntryType::CellExecutionBegin,
            "A-subject-1.ipynb",
            CellContent::new(raw, CellType::Code),
        )
    }

    #[test]
    fn test_classify() {
        assert_eq!(ChangeKind::classify(1, 2), ChangeKind::Insert);
        assert_eq!(ChangeKind::classify(3, 2), ChangeKind::Delete);
        assert_eq!(ChangeKind::classify(2, 2), ChangeKind::Update);
    }

    #[test]
    fn test_change_kind_serde_tag() {
        let json = serde_json::to_string(&ChangeKind::Insert).unwrap();
        assert_eq!(json, "\"INSERT\"");
    }

    #[test]
    fn test_root_has_no_states() {
        let root = NbStep::root(snapshot(&["x"]));
        assert!(root.is_empty());
        assert_eq!(root.cell_id(), None);
        assert_eq!(root.change(), None);
        assert_eq!(root.states().count(), 0);
    }

    #[test]
    fn test_step_states_apply_entry() {
        let step = NbStep::new(
            snapshot(&["x = 2"]),
            begin("x = 2\\ny = 3"),
            CellId::new(0),
            ChangeKind::Insert,
        );
        let states: Vec<_> = step.states().collect::<CoreResult<_>>().unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0][0].source, vec!["x = 2", "y = 3"]);
        assert_eq!(step.states().len(), 1);
    }

    #[test]
    fn test_display_names_change_and_cell() {
        let step = NbStep::new(snapshot(&["x"]), begin("x"), CellId::new(0), ChangeKind::Update);
        let out = step.to_string();
        assert!(out.contains("UPDATE @ cell#0 from entry#7"));
        assert!(NbStep::root(snapshot(&["x"])).to_string().contains("root"));
    }

    proptest! {
        #[test]
        fn prop_classification_is_line_count_only(
            before in proptest::collection::vec("[a-z ]{0,8}", 0..8),
            after in proptest::collection::vec("[a-z ]{0,8}", 0..8),
        ) {
            let kind = ChangeKind::classify(before.len(), after.len());
            let expected = match before.len().cmp(&after.len()) {
                std::cmp::Ordering::Less => ChangeKind::Insert,
                std::cmp::Ordering::Greater => ChangeKind::Delete,
                std::cmp::Ordering::Equal => ChangeKind::Update,
            };
            prop_assert_eq!(kind, expected);
        }
    }
}
