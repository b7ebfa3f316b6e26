//! Log timestamps.
//!
//! The event log records wall-clock ISO-8601 strings. They are kept verbatim
//! and converted to epoch milliseconds once at parse time; a string that does
//! not convert yields `None` rather than an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Accepted naive layouts, tried in order after RFC 3339.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Timestamp as recorded in the log plus its millisecond conversion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    raw: String,
    millis: Option<i64>,
}

impl Timestamp {
    /// Parse a recorded timestamp. Naive timestamps are read as UTC.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            millis: to_epoch_millis(raw),
        }
    }

    /// A timestamp with no recorded value (synthesized entries)
    #[must_use]
    pub fn unrecorded() -> Self {
        Self {
            raw: String::new(),
            millis: None,
        }
    }

    /// Raw text as it appeared in the log
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Epoch milliseconds, if the raw text converted
    #[must_use]
    pub const fn as_millis(&self) -> Option<i64> {
        self.millis
    }

    /// Milliseconds elapsed from `earlier` to `self`, if both converted
    #[must_use]
    pub fn millis_since(&self, earlier: &Timestamp) -> Option<i64> {
        Some(self.millis? - earlier.millis?)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn to_epoch_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_naive_fractional() {
        let ts = Timestamp::parse("2023-10-05T14:30:00.250000");
        assert_eq!(ts.as_millis(), Some(1_696_516_200_250));
        assert_eq!(ts.raw(), "2023-10-05T14:30:00.250000");
    }

    #[test]
    fn test_parse_with_offset() {
        let ts = Timestamp::parse("2023-10-05T16:30:00+02:00");
        assert_eq!(ts.as_millis(), Some(1_696_516_200_000));
    }

    #[test]
    fn test_parse_space_separator_and_date_only() {
        assert_eq!(
            Timestamp::parse("2023-10-05 14:30:00").as_millis(),
            Some(1_696_516_200_000)
        );
        assert_eq!(
            Timestamp::parse("1970-01-02").as_millis(),
            Some(86_400_000)
        );
    }

    #[test]
    fn test_unparseable_is_none_not_error() {
        let ts = Timestamp::parse("yesterday at noon");
        assert_eq!(ts.as_millis(), None);
        assert_eq!(ts.to_string(), "yesterday at noon");
    }

    #[test]
    fn test_millis_since() {
        let a = Timestamp::parse("2023-10-05T14:30:00");
        let b = Timestamp::parse("2023-10-05T14:30:01.5");
        assert_eq!(b.millis_since(&a), Some(1500));
        assert_eq!(b.millis_since(&Timestamp::unrecorded()), None);
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(raw in ".{0,40}") {
            let ts = Timestamp::parse(&raw);
            prop_assert_eq!(ts.raw(), raw.as_str());
        }
    }
}
