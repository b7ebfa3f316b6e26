//! Notebook sessions.
//!
//! A session is one notebook file paired with its reconstructed history.
//! Notebooks are discovered under a directory, filtered by file name, and
//! paired with the log partition that carries the same file name. A pair
//! that fails to reconstruct is recorded and the batch carries on.

use crate::engine::ReplayEngine;
use crate::progress::Progress;
use crate::simulate::Simulator;
use nbtrace_core::{CoreError, CoreResult};
use nbtrace_log::LogParser;
use nbtrace_notebook::NotebookSnapshot;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default notebook file name filter
pub const DEFAULT_NOTEBOOK_FILTER: &str = r"^[A-Z]-subject-.+\.ipynb$";

/// Directory name Jupyter uses for autosave copies
const CHECKPOINT_DIR: &str = ".ipynb_checkpoints";

/// Session selection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Regex a notebook file name must match
    pub notebook_filter: String,
    /// Minimum number of states, root included, for a session to be kept
    pub min_steps: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            notebook_filter: DEFAULT_NOTEBOOK_FILTER.to_string(),
            min_steps: 4,
        }
    }
}

/// A notebook file and its reconstructed history
#[derive(Debug, Clone)]
pub struct NotebookSession {
    /// Path of the notebook file the session was built from
    pub notebook: PathBuf,
    /// Reconstructed history
    pub progress: Progress,
}

impl NotebookSession {
    /// File stem of the notebook, used to name written artifacts
    #[must_use]
    pub fn name(&self) -> String {
        self.notebook
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Oldest reconstructed state
    #[must_use]
    pub fn first_state(&self) -> &NotebookSnapshot {
        self.progress[0].snapshot()
    }

    /// Newest reconstructed state
    #[must_use]
    pub fn last_state(&self) -> &NotebookSnapshot {
        self.progress[self.progress.len() - 1].snapshot()
    }

    /// Write the first and last states as `<name>_first.ipynb` and
    /// `<name>_last.ipynb` under `dir`.
    ///
    /// # Errors
    ///
    /// Returns `Io` on write failure
    pub fn write_first_last_states(&self, dir: impl AsRef<Path>) -> CoreResult<(PathBuf, PathBuf)> {
        let dir = dir.as_ref();
        let first = dir.join(format!("{}_first.ipynb", self.name()));
        let last = dir.join(format!("{}_last.ipynb", self.name()));
        self.first_state().write_to(&first)?;
        self.last_state().write_to(&last)?;
        Ok((first, last))
    }

    /// Write every state as `<name>_<index>.ipynb` under `dir`
    ///
    /// # Errors
    ///
    /// Returns `Io` on write failure
    pub fn write_states(&self, dir: impl AsRef<Path>) -> CoreResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        self.progress
            .states()
            .enumerate()
            .map(|(index, state)| -> CoreResult<PathBuf> {
                let path = dir.join(format!("{}_{index:03}.ipynb", self.name()));
                state.write_to(&path)?;
                Ok(path)
            })
            .collect()
    }

    /// Write the chain summary as `<name>_progress.json` under `dir`
    ///
    /// # Errors
    ///
    /// Returns `Io` on write failure
    pub fn write_summary(&self, dir: impl AsRef<Path>) -> CoreResult<PathBuf> {
        let dir = dir.as_ref();
        let path = dir.join(format!("{}_progress.json", self.name()));
        let json = serde_json::to_string_pretty(&self.progress.summary())?;
        std::fs::create_dir_all(dir).map_err(|e| CoreError::io(dir, &e))?;
        std::fs::write(&path, json).map_err(|e| CoreError::io(&path, &e))?;
        Ok(path)
    }
}

/// A notebook whose history could not be reconstructed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    /// Notebook path
    pub notebook: PathBuf,
    /// Why it failed
    pub error: CoreError,
}

/// Outcome of a batch of reconstructions
#[derive(Debug, Clone, Default)]
pub struct SessionSet {
    /// Sessions long enough to keep
    pub sessions: Vec<NotebookSession>,
    /// Notebooks whose reconstruction failed
    pub failures: Vec<SessionFailure>,
    /// Notebooks that reconstructed to fewer than `min_steps` states, with
    /// their state count
    pub too_short: Vec<(PathBuf, usize)>,
}

impl SessionSet {
    /// Number of kept sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session was kept
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Iterate kept sessions
    pub fn iter(&self) -> std::slice::Iter<'_, NotebookSession> {
        self.sessions.iter()
    }
}

/// Discovers notebooks and builds their sessions
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    config: SessionConfig,
    filter: Regex,
}

impl SessionBuilder {
    /// Create a builder.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the notebook filter is not a valid regex
    pub fn new(config: SessionConfig) -> CoreResult<Self> {
        let filter = Regex::new(&config.notebook_filter).map_err(|e| CoreError::Validation {
            field: "notebook_filter".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { config, filter })
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Notebook files under `dir`, recursively, whose file name matches the
    /// filter. Sorted by path.
    ///
    /// # Errors
    ///
    /// Returns `Io` if a directory cannot be read
    pub fn discover(&self, dir: impl AsRef<Path>) -> CoreResult<Vec<PathBuf>> {
        let mut found = Vec::new();
        self.walk(dir.as_ref(), &mut found)?;
        found.sort();
        tracing::debug!(dir = %dir.as_ref().display(), notebooks = found.len(), "discovered notebooks");
        Ok(found)
    }

    fn walk(&self, dir: &Path, found: &mut Vec<PathBuf>) -> CoreResult<()> {
        let entries = std::fs::read_dir(dir).map_err(|e| CoreError::io(dir, &e))?;
        for entry in entries {
            let path = entry.map_err(|e| CoreError::io(dir, &e))?.path();
            if path.is_dir() {
                if path.file_name().is_some_and(|n| n == CHECKPOINT_DIR) {
                    continue;
                }
                self.walk(&path, found)?;
            } else if self.accepts(&path) {
                found.push(path);
            }
        }
        Ok(())
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "ipynb")
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| self.filter.is_match(n))
    }

    /// Reconstruct every discovered notebook from its log partition.
    ///
    /// # Errors
    ///
    /// Returns `Io` if `dir` cannot be walked; per-notebook failures are
    /// collected in the returned set
    pub fn logged_sessions(
        &self,
        dir: impl AsRef<Path>,
        log: &LogParser,
        engine: &ReplayEngine,
    ) -> CoreResult<SessionSet> {
        let partitions = log.partition_by_notebook();
        let mut set = SessionSet::default();

        for notebook in self.discover(dir)? {
            let result = NotebookSnapshot::from_path(&notebook).and_then(|snapshot| {
                let partition = partitions
                    .iter()
                    .find(|(name, _)| same_file_name(name, &notebook))
                    .map(|(_, partition)| partition)
                    .ok_or_else(|| CoreError::NotFound {
                        kind: "Log partition".to_string(),
                        id: notebook.display().to_string(),
                    })?;
                engine.reconstruct(&snapshot, partition)
            });
            self.collect(&mut set, notebook, result);
        }

        tracing::info!(
            sessions = set.len(),
            failures = set.failures.len(),
            too_short = set.too_short.len(),
            "built logged sessions"
        );
        Ok(set)
    }

    /// Simulate every discovered notebook.
    ///
    /// # Errors
    ///
    /// Returns `Io` if `dir` cannot be walked; per-notebook failures are
    /// collected in the returned set
    pub fn simulated_sessions(
        &self,
        dir: impl AsRef<Path>,
        simulator: &Simulator,
    ) -> CoreResult<SessionSet> {
        let mut set = SessionSet::default();

        for notebook in self.discover(dir)? {
            let result = NotebookSnapshot::from_path(&notebook)
                .and_then(|snapshot| simulator.simulate(&snapshot));
            self.collect(&mut set, notebook, result);
        }

        tracing::info!(
            sessions = set.len(),
            failures = set.failures.len(),
            too_short = set.too_short.len(),
            "built simulated sessions"
        );
        Ok(set)
    }

    fn collect(&self, set: &mut SessionSet, notebook: PathBuf, result: CoreResult<Progress>) {
        match result {
            Ok(progress) if progress.len() >= self.config.min_steps => {
                set.sessions.push(NotebookSession { notebook, progress });
            }
            Ok(progress) => {
                tracing::debug!(notebook = %notebook.display(), steps = progress.len(), "session too short");
                set.too_short.push((notebook, progress.len()));
            }
            Err(error) => {
                tracing::debug!(notebook = %notebook.display(), %error, "reconstruction failed");
                set.failures.push(SessionFailure { notebook, error });
            }
        }
    }
}

fn same_file_name(logged: &str, notebook: &Path) -> bool {
    Path::new(logged).file_name() == notebook.file_name()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ReplayConfig;
    use crate::simulate::SimulateConfig;

    fn notebook_json(cells: &[&str]) -> String {
        let cells: Vec<serde_json::Value> = cells
            .iter()
            .map(|source| {
                serde_json::json!({
                    "cell_type": "code",
                    "execution_count": null,
                    "metadata": {},
                    "outputs": [],
                    "source": source,
                })
            })
            .collect();
        serde_json::json!({
            "cells": cells,
            "metadata": {},
            "nbformat": 4,
            "nbformat_minor": 5,
        })
        .to_string()
    }

    fn record(kind: &str, notebook: &str, content: &str) -> String {
        format!("{kind}:::s:::u:::ctx:::{notebook}:::lab:::2023-10-05T14:30:00:::{content}:::code")
    }

    fn edit(notebook: &str, before: &str, after: &str) -> Vec<String> {
        vec![
            record("CELL_SELECTED", notebook, before),
            record("CELL_EXECUTION_BEGIN", notebook, after),
            record("CELL_EXECUTION_END", notebook, after),
        ]
    }

    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("week1");
        std::fs::create_dir_all(nested.join(CHECKPOINT_DIR)).unwrap();
        std::fs::write(
            nested.join("A-subject-1.ipynb"),
            notebook_json(&["x = 3", "print(x)"]),
        )
        .unwrap();
        std::fs::write(dir.path().join("B-subject-2.ipynb"), notebook_json(&["y = 1"])).unwrap();
        std::fs::write(dir.path().join("scratch.ipynb"), notebook_json(&["z = 1"])).unwrap();
        std::fs::write(
            nested.join(CHECKPOINT_DIR).join("A-subject-1-checkpoint.ipynb"),
            notebook_json(&["x = 3"]),
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_discover_filters_names() {
        let dir = workspace();
        let builder = SessionBuilder::new(SessionConfig::default()).unwrap();
        let found = builder.discover(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["B-subject-2.ipynb", "A-subject-1.ipynb"]);
    }

    #[test]
    fn test_invalid_filter() {
        let config = SessionConfig {
            notebook_filter: "([".to_string(),
            ..SessionConfig::default()
        };
        assert!(matches!(
            SessionBuilder::new(config),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn test_logged_sessions_pair_by_file_name() {
        let dir = workspace();
        let mut lines = edit("A-subject-1.ipynb", "x = 1", "x = 2");
        lines.extend(edit("B-subject-2.ipynb", "y = 0", "y = 5"));
        lines.extend(edit("A-subject-1.ipynb", "x = 2", "x = 3"));
        let log = LogParser::parse_str("all.log", &lines.join("\n")).unwrap();

        let builder = SessionBuilder::new(SessionConfig {
            min_steps: 2,
            ..SessionConfig::default()
        })
        .unwrap();
        let engine = ReplayEngine::new().with_config(ReplayConfig::default());
        let set = builder.logged_sessions(dir.path(), &log, &engine).unwrap();

        // Neither notebook holds the content its log selected first
        assert_eq!(set.failures.len(), 2);
        assert!(set.failures.iter().all(|f| f.error.is_log_rejection()));
        assert!(set.is_empty());
    }

    #[test]
    fn test_logged_session_kept() {
        let dir = workspace();
        let lines = edit("A-subject-1.ipynb", "x = 3", "x = 3\\ny = 4");
        let log = LogParser::parse_str("a.log", &lines.join("\n")).unwrap();

        let builder = SessionBuilder::new(SessionConfig {
            min_steps: 2,
            ..SessionConfig::default()
        })
        .unwrap();
        let set = builder
            .logged_sessions(dir.path(), &log, &ReplayEngine::new())
            .unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.sessions[0].name(), "A-subject-1");
        // B has no log partition
        assert_eq!(set.failures.len(), 1);
        assert!(matches!(set.failures[0].error, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_simulated_sessions_and_min_steps() {
        let dir = workspace();
        let builder = SessionBuilder::new(SessionConfig {
            min_steps: 3,
            ..SessionConfig::default()
        })
        .unwrap();
        let simulator = Simulator::new().with_config(SimulateConfig::default());
        let set = builder.simulated_sessions(dir.path(), &simulator).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.sessions[0].progress.len(), 3);
        assert_eq!(set.too_short.len(), 1);
        assert_eq!(set.too_short[0].1, 2);
        assert!(set.failures.is_empty());
    }

    #[test]
    fn test_write_first_last_states() {
        let dir = workspace();
        let out = tempfile::tempdir().unwrap();
        let builder = SessionBuilder::new(SessionConfig {
            min_steps: 1,
            ..SessionConfig::default()
        })
        .unwrap();
        let set = builder.simulated_sessions(dir.path(), &Simulator::new()).unwrap();
        let session = set
            .iter()
            .find(|s| s.name() == "A-subject-1")
            .unwrap();

        let (first, last) = session.write_first_last_states(out.path()).unwrap();
        assert!(first.ends_with("A-subject-1_first.ipynb"));
        let first = NotebookSnapshot::from_path(&first).unwrap();
        let last = NotebookSnapshot::from_path(&last).unwrap();
        assert!(first[0].is_empty());
        assert_eq!(last[0].source, vec!["x = 3"]);

        let states = session.write_states(out.path()).unwrap();
        assert_eq!(states.len(), 3);
        let summary = session.write_summary(out.path()).unwrap();
        let text = std::fs::read_to_string(summary).unwrap();
        assert!(text.contains("\"INSERT\""));
    }
}
