//! Log entry types.
//!
//! One entry per line of a notebook event log. Entries are immutable once
//! parsed; the only way to get one is through the parser or `LogEntry::synthetic`.

use nbtrace_core::{CellType, EntryId, Timestamp, ESCAPED_NEWLINE};
use serde::{Deserialize, Serialize};

/// Field delimiter of the event log
pub const FIELD_DELIMITER: &str = ":::";

/// Entry type - what the editor recorded
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntryType {
    /// A cell received focus
    CellSelected,
    /// A cell was submitted for execution
    CellExecutionBegin,
    /// A cell finished executing
    CellExecutionEnd,
    /// Any other recorded action, passed through untouched
    Other(String),
}

impl EntryType {
    /// Parse the textual tag used in the log
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "CELL_SELECTED" => Self::CellSelected,
            "CELL_EXECUTION_BEGIN" => Self::CellExecutionBegin,
            "CELL_EXECUTION_END" => Self::CellExecutionEnd,
            other => Self::Other(other.to_string()),
        }
    }

    /// Textual tag
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CellSelected => "CELL_SELECTED",
            Self::CellExecutionBegin => "CELL_EXECUTION_BEGIN",
            Self::CellExecutionEnd => "CELL_EXECUTION_END",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw cell content carried by an entry, together with the cell's type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellContent {
    /// Content with newlines packed as the two-character marker `\n`
    pub raw: String,
    /// Type of the cell the content belongs to
    pub cell_type: CellType,
}

impl CellContent {
    /// Create content for a cell
    #[must_use]
    pub fn new(raw: impl Into<String>, cell_type: CellType) -> Self {
        Self {
            raw: raw.into(),
            cell_type,
        }
    }

    /// Content split back into lines
    #[must_use]
    pub fn lines(&self) -> Vec<&str> {
        split_escaped_lines(&self.raw)
    }

    /// Number of lines the content unpacks to
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.raw.matches(ESCAPED_NEWLINE).count() + 1
    }
}

/// Split text on the escaped newline marker.
#[must_use]
pub fn split_escaped_lines(raw: &str) -> Vec<&str> {
    raw.split(ESCAPED_NEWLINE).collect()
}

/// A single event log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Line position in the original file
    pub id: EntryId,
    /// What was recorded
    pub entry_type: EntryType,
    /// Course subject
    pub subject: String,
    /// Who was editing
    pub user: String,
    /// Editor context
    pub context: String,
    /// Notebook file name
    pub notebook: String,
    /// Kind of editing session
    pub session_type: String,
    /// When it was recorded
    pub timestamp: Timestamp,
    /// Cell content and type, when recorded
    pub content: Option<CellContent>,
}

impl LogEntry {
    /// An entry that was never written to a log file. Used by the simulated
    /// reconstruction to stand in for a real execution.
    #[must_use]
    pub fn synthetic(
        id: EntryId,
        entry_type: EntryType,
        notebook: impl Into<String>,
        content: CellContent,
    ) -> Self {
        Self {
            id,
            entry_type,
            subject: String::new(),
            user: String::new(),
            context: String::new(),
            notebook: notebook.into(),
            session_type: String::new(),
            timestamp: Timestamp::unrecorded(),
            content: Some(content),
        }
    }

    /// Raw content text, if any
    #[must_use]
    pub fn raw_content(&self) -> Option<&str> {
        self.content.as_ref().map(|c| c.raw.as_str())
    }

    /// Cell type of the content, if any
    #[must_use]
    pub fn cell_type(&self) -> Option<&CellType> {
        self.content.as_ref().map(|c| &c.cell_type)
    }

    /// True when the entry carries content for a code cell
    #[must_use]
    pub fn is_code(&self) -> bool {
        self.cell_type().is_some_and(CellType::is_code)
    }

    /// Content lines; empty when the entry has no content
    #[must_use]
    pub fn content_lines(&self) -> Vec<&str> {
        self.content.as_ref().map(|c| c.lines()).unwrap_or_default()
    }

    /// Content lines hard-wrapped at `width` characters, for display
    #[must_use]
    pub fn wrapped_content(&self, width: usize) -> Vec<String> {
        let width = width.max(1);
        let mut out = Vec::new();
        for line in self.content_lines() {
            let chars: Vec<char> = line.chars().collect();
            if chars.len() <= width {
                out.push(line.to_string());
                continue;
            }
            out.extend(chars.chunks(width).map(|chunk| chunk.iter().collect::<String>()));
        }
        out
    }

    /// Value of a filterable field
    #[must_use]
    pub fn field(&self, field: LogField) -> Option<&str> {
        match field {
            LogField::EntryType => Some(self.entry_type.as_str()),
            LogField::Subject => Some(self.subject.as_str()),
            LogField::User => Some(self.user.as_str()),
            LogField::Context => Some(self.context.as_str()),
            LogField::Notebook => Some(self.notebook.as_str()),
            LogField::SessionType => Some(self.session_type.as_str()),
            LogField::CellType => self.cell_type().map(CellType::as_str),
        }
    }

    /// Render back into the `:::` record layout
    #[must_use]
    pub fn to_record(&self) -> String {
        let mut fields = vec![
            self.entry_type.as_str(),
            self.subject.as_str(),
            self.user.as_str(),
            self.context.as_str(),
            self.notebook.as_str(),
            self.session_type.as_str(),
            self.timestamp.raw(),
        ];
        if let Some(content) = &self.content {
            fields.push(content.raw.as_str());
            fields.push(content.cell_type.as_str());
        }
        fields.join(FIELD_DELIMITER)
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.id, self.to_record())
    }
}

/// Fields an entry can be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum LogField {
    EntryType,
    Subject,
    User,
    Context,
    Notebook,
    SessionType,
    CellType,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(raw: &str) -> LogEntry {
        LogEntry::synthetic(
            EntryId::new(0),
            EntryType::CellExecutionBegin,
            "A-subject-1.ipynb",
            CellContent::new(raw, CellType::Code),
        )
    }

    #[test]
    fn test_entry_type_parse() {
        assert_eq!(EntryType::parse("CELL_SELECTED"), EntryType::CellSelected);
        assert_eq!(EntryType::parse("CELL_EXECUTION_END"), EntryType::CellExecutionEnd);
        let other = EntryType::parse("TGM_QUESTION_ASKED");
        assert_eq!(other.as_str(), "TGM_QUESTION_ASKED");
    }

    #[test]
    fn test_content_lines_split_on_marker() {
        let entry = entry_with("x = 1\\ny = 2");
        assert_eq!(entry.content_lines(), vec!["x = 1", "y = 2"]);
        assert_eq!(entry.content.as_ref().unwrap().line_count(), 2);
    }

    #[test]
    fn test_content_lines_empty_without_content() {
        let mut entry = entry_with("x");
        entry.content = None;
        assert!(entry.content_lines().is_empty());
        assert!(!entry.is_code());
    }

    #[test]
    fn test_wrapped_content() {
        let entry = entry_with("abcdefgh\\nxy");
        assert_eq!(entry.wrapped_content(3), vec!["abc", "def", "gh", "xy"]);
    }

    #[test]
    fn test_to_record() {
        let entry = entry_with("print(1)");
        assert_eq!(
            entry.to_record(),
            "CELL_EXECUTION_BEGIN::::::::::::A-subject-1.ipynb:::::::::print(1):::code"
        );
    }

    #[test]
    fn test_field_access() {
        let entry = entry_with("x");
        assert_eq!(entry.field(LogField::CellType), Some("code"));
        assert_eq!(entry.field(LogField::Notebook), Some("A-subject-1.ipynb"));
    }
}
