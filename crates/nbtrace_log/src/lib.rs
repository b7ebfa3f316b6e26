//! NBTRACE Event Log
//!
//! Parses `:::`-delimited notebook event logs into typed, ordered entries and
//! answers read-only queries over them, including per-notebook partitioning.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod entry;
pub mod parser;

pub use cursor::{Cursor, Direction};
pub use entry::{split_escaped_lines, CellContent, EntryType, LogEntry, LogField, FIELD_DELIMITER};
pub use parser::{LogFilter, LogParser, MIN_FIELDS};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_text_is_an_empty_log() {
        let log = LogParser::parse_str("p", "").unwrap();
        assert_eq!(log.len(), 0);
        assert!(log.is_empty());
    }

    proptest! {
        #[test]
        fn prop_short_records_always_rejected(fields in proptest::collection::vec("[a-z0-9 ]{1,6}", 1..MIN_FIELDS)) {
            let line = fields.join(FIELD_DELIMITER);
            prop_assert!(LogParser::parse_str("p", &line).is_err());
        }

        #[test]
        fn prop_record_roundtrip(
            user in "[a-z]{1,8}",
            notebook in "[A-Z]-subject-[0-9]{1,3}\\.ipynb",
            content in "[a-z =0-9]{1,12}(\\\\n[a-z =0-9]{1,12}){0,3}",
        ) {
            let line = ["CELL_SELECTED", "s", user.as_str(), "ctx", notebook.as_str(), "lab", "2023-10-05T14:30:00", content.as_str(), "code"]
                .join(FIELD_DELIMITER);
            let log = LogParser::parse_str("p", &line).unwrap();
            prop_assert_eq!(log.len(), 1);
            prop_assert_eq!(log[0].to_record(), line.trim());
        }
    }
}
