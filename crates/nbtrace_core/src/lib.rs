//! NBTRACE Core Types
//!
//! This crate contains pure types and logic with no I/O.
//! Everything here is shared by the log model, the notebook model and the
//! reconstruction engines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cell_type;
pub mod error;
pub mod id;
pub mod time;

// Re-exports
pub use cell_type::CellType;
pub use error::{CoreError, CoreResult};
pub use id::{CellId, EntryId};
pub use time::Timestamp;

/// Two-character marker the event log uses to pack a multi-line cell into one field.
pub const ESCAPED_NEWLINE: &str = "\\n";
