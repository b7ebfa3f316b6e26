//! Positional identifiers.
//!
//! Both ids are ordinals, not random keys: a log entry's id is its line
//! number in the original file and a cell's id is its position in the
//! notebook it was parsed from. Neither is ever renumbered.

use serde::{Deserialize, Serialize};

/// Log entry identifier - 0-based line position in the original log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(usize);

impl EntryId {
    /// Create from a line position
    #[must_use]
    pub const fn new(position: usize) -> Self {
        Self(position)
    }

    /// Get the raw position
    #[must_use]
    pub const fn as_usize(&self) -> usize {
        self.0
    }

    /// Distance in the original file between two entries
    #[must_use]
    pub const fn distance(&self, later: &EntryId) -> usize {
        later.0.abs_diff(self.0)
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entry#{}", self.0)
    }
}

impl From<usize> for EntryId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// Cell identifier - 0-based position in the parsed notebook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(usize);

impl CellId {
    /// Create from a cell position
    #[must_use]
    pub const fn new(position: usize) -> Self {
        Self(position)
    }

    /// Get the raw position
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

impl From<usize> for CellId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}
