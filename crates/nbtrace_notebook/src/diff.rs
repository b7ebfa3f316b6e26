//! Cell-level diff between two snapshots of the same notebook.

use crate::cell::CellEntry;
use nbtrace_core::CellId;
use serde::{Deserialize, Serialize};

/// A cell whose value differs between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDiff {
    /// The cell in the earlier snapshot
    pub before: CellEntry,
    /// The cell in the later snapshot
    pub after: CellEntry,
}

/// Line change in a cell diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineChange {
    /// Line was added
    Added(String),
    /// Line was removed
    Removed(String),
    /// Line was modified
    Modified {
        /// Line before
        old: String,
        /// Line after
        new: String,
    },
    /// Line was unchanged
    Unchanged(String),
}

impl LineChange {
    /// True unless the line is unchanged
    #[must_use]
    pub const fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged(_))
    }
}

impl CellDiff {
    /// Id of the differing cell
    #[must_use]
    pub const fn cell_id(&self) -> CellId {
        self.after.cell_id
    }

    /// Positional line diff of the two sources. Line terminators are not
    /// part of the comparison.
    #[must_use]
    pub fn line_changes(&self) -> Vec<LineChange> {
        let old_lines: Vec<&str> = self.before.source.iter().map(|l| strip_newline(l)).collect();
        let new_lines: Vec<&str> = self.after.source.iter().map(|l| strip_newline(l)).collect();

        let max_len = old_lines.len().max(new_lines.len());
        let mut line_diff = Vec::with_capacity(max_len);

        for i in 0..max_len {
            match (old_lines.get(i), new_lines.get(i)) {
                (Some(o), Some(n)) if o == n => line_diff.push(LineChange::Unchanged((*o).to_string())),
                (Some(o), Some(n)) => line_diff.push(LineChange::Modified {
                    old: (*o).to_string(),
                    new: (*n).to_string(),
                }),
                (Some(o), None) => line_diff.push(LineChange::Removed((*o).to_string())),
                (None, Some(n)) => line_diff.push(LineChange::Added((*n).to_string())),
                (None, None) => {}
            }
        }

        line_diff
    }

    /// Before/after rendering of the cell pair
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "**Before Modification**\n{}**After Modification**\n{}",
            self.before, self.after
        )
    }
}

fn strip_newline(line: &str) -> &str {
    line.strip_suffix('\n').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbtrace_core::CellType;

    fn cell(lines: &[&str]) -> CellEntry {
        CellEntry::new(
            CellId::new(2),
            CellType::Code,
            lines.iter().map(|l| (*l).to_string()).collect(),
        )
    }

    #[test]
    fn test_line_changes() {
        let diff = CellDiff {
            before: cell(&["a\n", "b\n", "c"]),
            after: cell(&["a", "B"]),
        };
        assert_eq!(
            diff.line_changes(),
            vec![
                LineChange::Unchanged("a".to_string()),
                LineChange::Modified {
                    old: "b".to_string(),
                    new: "B".to_string()
                },
                LineChange::Removed("c".to_string()),
            ]
        );
        assert_eq!(diff.cell_id(), CellId::new(2));
    }

    #[test]
    fn test_line_changes_added() {
        let diff = CellDiff {
            before: cell(&[]),
            after: cell(&["x"]),
        };
        let changes = diff.line_changes();
        assert_eq!(changes, vec![LineChange::Added("x".to_string())]);
        assert!(changes[0].is_change());
    }

    #[test]
    fn test_render_has_both_sides() {
        let diff = CellDiff {
            before: cell(&["a"]),
            after: cell(&["b"]),
        };
        let out = diff.render();
        assert!(out.starts_with("**Before Modification**\ncell#2"));
        assert!(out.contains("**After Modification**"));
    }
}
