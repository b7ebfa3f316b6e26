//! Notebook cell model.

use crate::normalize::lines_match;
use nbtrace_core::{CellId, CellType, ESCAPED_NEWLINE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One cell of a notebook snapshot.
///
/// `cell_id` is the cell's position in the document it was parsed from. The
/// remaining nbformat fields are carried verbatim so a snapshot can be
/// written back out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellEntry {
    /// Cell type
    pub cell_type: CellType,
    /// Position in the notebook
    pub cell_id: CellId,
    /// Source lines, each keeping its own terminator if it had one
    pub source: Vec<String>,
    /// Execution counter of a code cell
    pub execution_count: Option<u64>,
    /// Recorded outputs
    pub outputs: Option<Value>,
    /// Cell metadata
    pub metadata: Option<Value>,
    /// The document's own `id` field
    pub document_id: Option<Value>,
}

impl CellEntry {
    /// Create a cell with no execution record or metadata
    #[must_use]
    pub fn new(cell_id: CellId, cell_type: CellType, source: Vec<String>) -> Self {
        Self {
            cell_type,
            cell_id,
            source,
            execution_count: None,
            outputs: None,
            metadata: None,
            document_id: None,
        }
    }

    /// Number of source lines
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.source.len()
    }

    /// True when the cell has no source lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// True for code cells
    #[must_use]
    pub fn is_code(&self) -> bool {
        self.cell_type.is_code()
    }

    /// Source as one text, the way an editor would show it
    #[must_use]
    pub fn text(&self) -> String {
        self.source.concat()
    }

    /// Source lines packed into one log field with the escaped newline marker
    #[must_use]
    pub fn to_escaped(&self) -> String {
        self.source.join(ESCAPED_NEWLINE)
    }

    /// Whether escaped log content describes this cell's source
    #[must_use]
    pub fn matches_content(&self, raw: &str) -> bool {
        let candidate: Vec<&str> = raw.split(ESCAPED_NEWLINE).collect();
        lines_match(&candidate, &self.source)
    }

    /// Leading run of `#` comment lines
    #[must_use]
    pub fn header_comments(&self) -> &[String] {
        let end = self
            .source
            .iter()
            .position(|line| !line.starts_with('#'))
            .unwrap_or(self.source.len());
        &self.source[..end]
    }
}

impl std::fmt::Display for CellEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} [{}]", self.cell_id, self.cell_type)?;
        for (number, line) in self.source.iter().enumerate() {
            writeln!(f, "{:>4} | {}", number + 1, line.trim_end_matches('\n'))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(lines: &[&str]) -> CellEntry {
        CellEntry::new(
            CellId::new(0),
            CellType::Code,
            lines.iter().map(|l| (*l).to_string()).collect(),
        )
    }

    #[test]
    fn test_matches_content_ignores_terminators() {
        let cell = code(&["x = 1\n", "y = 2"]);
        assert!(cell.matches_content("x = 1\\ny = 2"));
        assert!(cell.matches_content("x = 1  \\n  y = 2"));
        assert!(!cell.matches_content("x = 1"));
    }

    #[test]
    fn test_header_comments() {
        let cell = code(&["# setup\n", "#!x\n", "import os\n", "# trailing"]);
        assert_eq!(cell.header_comments(), &cell.source[..2]);
        assert!(code(&["x"]).header_comments().is_empty());
        let all = code(&["# a", "# b"]);
        assert_eq!(all.header_comments().len(), 2);
    }

    #[test]
    fn test_text_and_escaped() {
        let cell = code(&["a\n", "b"]);
        assert_eq!(cell.text(), "a\nb");
        assert_eq!(cell.to_escaped(), "a\n\\nb");
    }

    #[test]
    fn test_display() {
        let cell = code(&["a\n", "b"]);
        assert_eq!(cell.to_string(), "cell#0 [code]\n   1 | a\n   2 | b\n");
    }
}
