//! Log parser and read-only queries over a parsed log.

use crate::entry::{CellContent, EntryType, LogEntry, LogField, FIELD_DELIMITER};
use indexmap::IndexMap;
use nbtrace_core::{CellType, CoreError, CoreResult, EntryId, Timestamp};
use std::collections::BTreeSet;
use std::path::Path;

/// Minimum number of `:::` fields a record must have
pub const MIN_FIELDS: usize = 7;

/// Filter on a single entry field: an entry matches when the field has one
/// of the accepted values. Entries without the field never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    field: LogField,
    values: BTreeSet<String>,
}

impl LogFilter {
    /// Create a filter accepting any of `values`
    pub fn new<I, S>(field: LogField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a filter on the entry type
    pub fn entry_types<I>(types: I) -> Self
    where
        I: IntoIterator<Item = EntryType>,
    {
        Self::new(
            LogField::EntryType,
            types.into_iter().map(|t| t.as_str().to_string()),
        )
    }

    /// Whether an entry matches
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        entry
            .field(self.field)
            .is_some_and(|value| self.values.contains(value))
    }
}

/// Ordered sequence of entries from one log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogParser {
    label: String,
    entries: Vec<LogEntry>,
}

impl LogParser {
    /// Parse a whole log. Any malformed record rejects the log.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLog` if a record has fewer than seven fields
    pub fn parse_str(label: impl Into<String>, text: &str) -> CoreResult<Self> {
        let label = label.into();
        let entries = text
            .lines()
            .enumerate()
            .map(|(position, line)| parse_record(position, line))
            .collect::<CoreResult<Vec<_>>>()
            .map_err(|err| match err {
                CoreError::InvalidLog { reason } => {
                    CoreError::invalid_log(format!("{label}: {reason}"))
                }
                other => other,
            })?;

        tracing::debug!(log = %label, entries = entries.len(), "parsed event log");
        Ok(Self { label, entries })
    }

    /// Read and parse a log file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `InvalidLog` if it is malformed
    pub fn from_path(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, &e))?;
        Self::parse_str(path.display().to_string(), &text)
    }

    /// Build from already-parsed entries
    #[must_use]
    pub fn from_entries(label: impl Into<String>, entries: Vec<LogEntry>) -> Self {
        Self {
            label: label.into(),
            entries,
        }
    }

    /// Label of the source (usually the file path)
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// All entries in file order
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the log has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at a position of this (possibly partitioned) log
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LogEntry> {
        self.entries.get(index)
    }

    /// Entry with a given original-file id
    #[must_use]
    pub fn get_by_id(&self, id: EntryId) -> Option<&LogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Iterate entries in order
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    /// Entries matching the filter
    #[must_use]
    pub fn only(&self, filter: &LogFilter) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| filter.matches(e)).collect()
    }

    /// Entries matching every filter
    #[must_use]
    pub fn only_all(&self, filters: &[LogFilter]) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| filters.iter().all(|f| f.matches(e)))
            .collect()
    }

    /// Entries not matching the filter
    #[must_use]
    pub fn excluding(&self, filter: &LogFilter) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| !filter.matches(e)).collect()
    }

    /// Entries matching none of the filters
    #[must_use]
    pub fn excluding_all(&self, filters: &[LogFilter]) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| !filters.iter().any(|f| f.matches(e)))
            .collect()
    }

    /// Entries that carry cell content
    #[must_use]
    pub fn entries_with_content(&self) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.content.is_some()).collect()
    }

    /// First entry whose raw content equals `raw`
    #[must_use]
    pub fn find_first_by_content(&self, raw: &str) -> Option<&LogEntry> {
        self.entries.iter().find(|e| e.raw_content() == Some(raw))
    }

    /// Distinct entry types
    #[must_use]
    pub fn entry_types(&self) -> BTreeSet<EntryType> {
        self.entries.iter().map(|e| e.entry_type.clone()).collect()
    }

    /// Distinct cell types among entries with content
    #[must_use]
    pub fn cell_types(&self) -> BTreeSet<CellType> {
        self.entries
            .iter()
            .filter_map(|e| e.cell_type().cloned())
            .collect()
    }

    /// Distinct users
    #[must_use]
    pub fn users(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.user.clone()).collect()
    }

    /// Distinct notebook identifiers
    #[must_use]
    pub fn notebooks(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.notebook.clone()).collect()
    }

    /// Split into one log per notebook, in order of first appearance.
    /// Entry order and ids are preserved.
    #[must_use]
    pub fn partition_by_notebook(&self) -> IndexMap<String, LogParser> {
        let mut parts: IndexMap<String, LogParser> = IndexMap::new();
        for entry in &self.entries {
            parts
                .entry(entry.notebook.clone())
                .or_insert_with(|| LogParser::from_entries(self.label.clone(), Vec::new()))
                .entries
                .push(entry.clone());
        }
        parts
    }

    /// Restrict to the named notebooks, one log each, in the order given.
    /// A name with no entries maps to an empty log.
    #[must_use]
    pub fn restrict_to_notebooks<S: AsRef<str>>(&self, names: &[S]) -> IndexMap<String, LogParser> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                let entries = self
                    .entries
                    .iter()
                    .filter(|e| e.notebook == name)
                    .cloned()
                    .collect();
                (
                    name.to_string(),
                    LogParser::from_entries(self.label.clone(), entries),
                )
            })
            .collect()
    }

    /// True when every entry refers to the same notebook
    #[must_use]
    pub fn is_single_notebook(&self) -> bool {
        self.notebooks().len() == 1
    }

    /// Adjacent entries whose original-file ids are not consecutive. A gap
    /// means the session was interrupted by activity on another notebook.
    #[must_use]
    pub fn discontinuities(&self) -> Vec<(EntryId, EntryId)> {
        self.entries
            .windows(2)
            .filter(|pair| pair[0].id.distance(&pair[1].id) != 1)
            .map(|pair| (pair[0].id, pair[1].id))
            .collect()
    }

    /// Single notebook with no gaps in the original file
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.is_single_notebook() && self.discontinuities().is_empty()
    }
}

impl std::ops::Index<usize> for LogParser {
    type Output = LogEntry;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}

impl<'a> IntoIterator for &'a LogParser {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn parse_record(position: usize, line: &str) -> CoreResult<LogEntry> {
    let parts: Vec<&str> = line.trim().split(FIELD_DELIMITER).collect();
    if parts.len() < MIN_FIELDS {
        return Err(CoreError::invalid_log(format!(
            "line {position} has {} fields, expected at least {MIN_FIELDS}: {line}",
            parts.len()
        )));
    }

    let content = parts.get(7).map(|raw| {
        let cell_type = parts
            .get(8)
            .map_or_else(|| CellType::Other(String::new()), |t| CellType::parse(t));
        CellContent::new(*raw, cell_type)
    });

    Ok(LogEntry {
        id: EntryId::new(position),
        entry_type: EntryType::parse(parts[0]),
        subject: parts[1].to_string(),
        user: parts[2].to_string(),
        context: parts[3].to_string(),
        notebook: parts[4].to_string(),
        session_type: parts[5].to_string(),
        timestamp: Timestamp::parse(parts[6]),
        content,
    })
}
