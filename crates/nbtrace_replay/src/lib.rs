//! NBTRACE Replay Engine
//!
//! Rebuilds the edit history of a notebook as a chain of snapshots, either
//! from its event log or, when no log exists, by simulation.
//! Sessions pair notebooks on disk with log partitions in batch.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod progress;
pub mod session;
pub mod simulate;
pub mod step;

pub use engine::{ReplayConfig, ReplayEngine, ScanError, ScanState};
pub use progress::{Progress, ProgressSummary, StepSummary};
pub use session::{NotebookSession, SessionBuilder, SessionConfig, SessionFailure, SessionSet};
pub use simulate::{SimulateConfig, Simulator};
pub use step::{ChangeKind, NbStep, States};

#[cfg(test)]
mod tests {
    use super::*;
    use nbtrace_core::{CellId, CellType};
    use nbtrace_notebook::{CellEntry, NotebookSnapshot};
    use proptest::prelude::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_chain_types_are_shareable() {
        assert_send_sync::<NotebookSnapshot>();
        assert_send_sync::<NbStep>();
        assert_send_sync::<Progress>();
    }

    fn arb_cell() -> impl Strategy<Value = CellEntry> {
        (
            prop_oneof![Just(CellType::Code), Just(CellType::Markdown)],
            proptest::collection::vec("(# )?[a-z][a-z0-9 =]{0,10}\n?", 0..4),
        )
            .prop_map(|(cell_type, source)| CellEntry::new(CellId::new(0), cell_type, source))
    }

    proptest! {
        #[test]
        fn prop_simulated_chain_changes_one_cell_per_step(
            cells in proptest::collection::vec(arb_cell(), 1..8),
            keep_header_comments in any::<bool>(),
        ) {
            let snapshot = NotebookSnapshot::from_cells("P-subject-1.ipynb", cells);
            let simulator = Simulator::new().with_config(SimulateConfig {
                keep_header_comments,
                require_progress: false,
            });
            let progress = simulator.simulate(&snapshot).unwrap();

            prop_assert!(progress.verify().is_ok());
            prop_assert_eq!(progress.last().unwrap().snapshot(), &snapshot);
            for pair in progress.iter().collect::<Vec<_>>().windows(2) {
                let diffs = pair[0].snapshot().get_diff(pair[1].snapshot()).unwrap();
                prop_assert_eq!(diffs.len(), 1);
                prop_assert_eq!(Some(diffs[0].cell_id()), pair[1].cell_id());
            }
        }
    }
}
