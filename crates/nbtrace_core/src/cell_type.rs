//! Cell type shared by log entries and notebook cells.

use serde::{Deserialize, Serialize};

/// Type of a notebook cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CellType {
    /// Executable code cell
    Code,
    /// Markdown text cell
    Markdown,
    /// Raw (unrendered) cell
    Raw,
    /// Anything else, kept verbatim
    Other(String),
}

impl CellType {
    /// Parse the textual form used by both the log and nbformat
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "code" => Self::Code,
            "markdown" => Self::Markdown,
            "raw" => Self::Raw,
            other => Self::Other(other.to_string()),
        }
    }

    /// Textual form
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Code => "code",
            Self::Markdown => "markdown",
            Self::Raw => "raw",
            Self::Other(s) => s,
        }
    }

    /// True for code cells
    #[must_use]
    pub const fn is_code(&self) -> bool {
        matches!(self, Self::Code)
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known() {
        assert_eq!(CellType::parse("code"), CellType::Code);
        assert_eq!(CellType::parse("markdown\n"), CellType::Markdown);
        assert_eq!(CellType::parse("raw"), CellType::Raw);
    }

    #[test]
    fn test_parse_other_roundtrips_text() {
        let t = CellType::parse("heading");
        assert_eq!(t, CellType::Other("heading".to_string()));
        assert_eq!(t.as_str(), "heading");
        assert!(!t.is_code());
    }
}
