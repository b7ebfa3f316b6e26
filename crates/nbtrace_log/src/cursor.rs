//! Cursor for navigating a parsed log in either direction.

use crate::entry::{EntryType, LogEntry};
use crate::parser::LogParser;

/// Direction for cursor movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards later entries
    Forward,
    /// Towards earlier entries
    Backward,
}

/// Position in a log. Backward seeks are bounded re-reads; they never
/// move the cursor past the start of the log.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    log: &'a LogParser,
    position: usize,
    direction: Direction,
}

impl<'a> Cursor<'a> {
    /// Cursor at the start of a log
    #[must_use]
    pub fn new(log: &'a LogParser) -> Self {
        Self {
            log,
            position: 0,
            direction: Direction::Forward,
        }
    }

    /// Cursor at a given position
    #[must_use]
    pub fn at(log: &'a LogParser, position: usize) -> Self {
        Self {
            log,
            position,
            direction: Direction::Forward,
        }
    }

    /// Entry under the cursor, `None` past the end
    #[must_use]
    pub fn current(&self) -> Option<&'a LogEntry> {
        self.log.get(self.position)
    }

    /// Move forward by `count` entries
    pub fn move_forward(&mut self, count: usize) {
        self.position = self.position.saturating_add(count);
        self.direction = Direction::Forward;
    }

    /// Move backward by `count` entries, stopping at the start
    pub fn move_backward(&mut self, count: usize) {
        self.position = self.position.saturating_sub(count);
        self.direction = Direction::Backward;
    }

    /// Jump to a position
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Current position
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.position
    }

    /// Direction of the last move
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Past the last entry
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.position >= self.log.len()
    }

    /// Walk forward from the current position (inclusive) to the next entry
    /// of `kind`. The cursor stays on the hit, or at the end if none.
    pub fn seek_forward_to(&mut self, kind: &EntryType) -> Option<&'a LogEntry> {
        self.direction = Direction::Forward;
        while let Some(entry) = self.current() {
            if &entry.entry_type == kind {
                return Some(entry);
            }
            self.position += 1;
        }
        None
    }

    /// Walk backward from the current position (inclusive) to the nearest
    /// entry of `kind`. On a miss the cursor is left at position 0.
    pub fn seek_backward_to(&mut self, kind: &EntryType) -> Option<&'a LogEntry> {
        self.direction = Direction::Backward;
        if self.is_end() {
            self.position = self.log.len().saturating_sub(1);
        }
        loop {
            let entry = self.current()?;
            if &entry.entry_type == kind {
                return Some(entry);
            }
            if self.position == 0 {
                return None;
            }
            self.position -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> LogParser {
        let text = "\
CELL_SELECTED:::s:::u:::c:::A.ipynb:::lab:::t:::a:::code
CELL_EXECUTION_BEGIN:::s:::u:::c:::A.ipynb:::lab:::t:::b:::code
OTHER:::s:::u:::c:::A.ipynb:::lab:::t
CELL_EXECUTION_END:::s:::u:::c:::A.ipynb:::lab:::t:::b:::code
";
        LogParser::parse_str("l", text).unwrap()
    }

    #[test]
    fn test_cursor_new() {
        let log = log();
        let cursor = Cursor::new(&log);
        assert_eq!(cursor.pos(), 0);
        assert_eq!(cursor.direction(), Direction::Forward);
    }

    #[test]
    fn test_cursor_move() {
        let log = log();
        let mut cursor = Cursor::at(&log, 2);
        cursor.move_forward(1);
        assert_eq!(cursor.pos(), 3);
        cursor.move_backward(10);
        assert_eq!(cursor.pos(), 0);
        assert_eq!(cursor.direction(), Direction::Backward);
    }

    #[test]
    fn test_seek_forward() {
        let log = log();
        let mut cursor = Cursor::new(&log);
        let hit = cursor.seek_forward_to(&EntryType::CellExecutionEnd).unwrap();
        assert_eq!(hit.id.as_usize(), 3);
        assert_eq!(cursor.pos(), 3);

        cursor.move_forward(1);
        assert!(cursor.seek_forward_to(&EntryType::CellExecutionEnd).is_none());
        assert!(cursor.is_end());
    }

    #[test]
    fn test_seek_backward_inclusive() {
        let log = log();
        let mut cursor = Cursor::at(&log, 3);
        let begin = cursor.seek_backward_to(&EntryType::CellExecutionBegin).unwrap();
        assert_eq!(begin.id.as_usize(), 1);
        let selected = cursor.seek_backward_to(&EntryType::CellSelected).unwrap();
        assert_eq!(selected.id.as_usize(), 0);
        // Already on a hit: stays put
        assert!(cursor.seek_backward_to(&EntryType::CellSelected).is_some());
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn test_seek_backward_miss() {
        let log = log();
        let mut cursor = Cursor::at(&log, 2);
        assert!(cursor.seek_backward_to(&EntryType::CellExecutionEnd).is_none());
        assert_eq!(cursor.pos(), 0);
    }
}
