//! NBTRACE Notebook Model
//!
//! Immutable snapshots of a Jupyter notebook, content matching against log
//! entries, and cell-level diffs between snapshots.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cell;
pub mod diff;
pub mod document;
pub mod normalize;
pub mod snapshot;

pub use cell::CellEntry;
pub use diff::{CellDiff, LineChange};
pub use document::DocumentWrapper;
pub use normalize::{lines_match, normalize_line};
pub use snapshot::{NotebookSnapshot, Scan};
