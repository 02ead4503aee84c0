// Monitor persistence module
// Saves and loads the full tracking state as one JSON snapshot

use crate::monitor::types::{Agent, AgentId, AgentTask, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Error types for persistence operations
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The persisted form of the whole tracking state
///
/// One document, overwritten wholesale after every mutation: the durability
/// contract is "last successful full-state write wins". No append log, no
/// schema versioning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    /// All registered agents, by id
    pub agents: HashMap<AgentId, Agent>,
    /// All assigned tasks, by id
    pub tasks: HashMap<TaskId, AgentTask>,
    /// When this snapshot was written
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

// Borrowed mirror of MonitorSnapshot so a save never clones the maps
#[derive(Serialize)]
struct SnapshotRef<'a> {
    agents: &'a HashMap<AgentId, Agent>,
    tasks: &'a HashMap<TaskId, AgentTask>,
    saved_at: DateTime<Utc>,
}

/// Write the full state to `path` as pretty-printed JSON
///
/// The document is written to a sibling temp file and renamed into place, so
/// a crash mid-write leaves the previous snapshot intact. Parent directories
/// are created as needed.
pub fn save_to_file(
    path: &Path,
    agents: &HashMap<AgentId, Agent>,
    tasks: &HashMap<TaskId, AgentTask>,
) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let snapshot = SnapshotRef {
        agents,
        tasks,
        saved_at: Utc::now(),
    };
    let json = serde_json::to_string_pretty(&snapshot)?;

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Load a snapshot from `path`
///
/// A missing file is a normal first-run condition and yields an empty
/// snapshot. Read or parse failures are returned to the caller, which is
/// expected to log and start empty.
pub fn load_from_file(path: &Path) -> Result<MonitorSnapshot, PersistenceError> {
    if !path.exists() {
        return Ok(MonitorSnapshot::default());
    }

    let json = fs::read_to_string(path)?;
    let snapshot: MonitorSnapshot = serde_json::from_str(&json)?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::types::{AgentTask, Metadata, TaskPriority};
    use tempfile::TempDir;

    fn sample_state() -> (HashMap<AgentId, Agent>, HashMap<TaskId, AgentTask>) {
        let mut agents = HashMap::new();
        let agent = Agent::new("Extractor".to_string(), "extractor".to_string(), Metadata::new());
        let agent_id = agent.id.clone();
        agents.insert(agent_id.clone(), agent);

        let mut tasks = HashMap::new();
        let task = AgentTask::new(
            agent_id,
            "Extract pages 1-10".to_string(),
            "page_extraction".to_string(),
            TaskPriority::High,
            (1..=10).collect(),
            Metadata::new(),
        );
        tasks.insert(task.id.clone(), task);

        (agents, tasks)
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitor_state.json");
        let (agents, tasks) = sample_state();

        save_to_file(&path, &agents, &tasks).unwrap();
        let loaded = load_from_file(&path).unwrap();

        assert_eq!(loaded.agents, agents);
        assert_eq!(loaded.tasks, tasks);
    }

    #[test]
    fn test_load_missing_file_yields_empty_snapshot() {
        let dir = TempDir::new().unwrap();
        let snapshot = load_from_file(&dir.path().join("does_not_exist.json")).unwrap();
        assert!(snapshot.agents.is_empty());
        assert!(snapshot.tasks.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitor_state.json");
        fs::write(&path, "not json {").unwrap();

        assert!(matches!(
            load_from_file(&path),
            Err(PersistenceError::Json(_))
        ));
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/data/monitor_state.json");
        let (agents, tasks) = sample_state();

        save_to_file(&path, &agents, &tasks).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitor_state.json");
        let (agents, tasks) = sample_state();

        save_to_file(&path, &agents, &tasks).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monitor_state.json");
        let (agents, tasks) = sample_state();

        save_to_file(&path, &agents, &tasks).unwrap();
        save_to_file(&path, &HashMap::new(), &HashMap::new()).unwrap();

        let loaded = load_from_file(&path).unwrap();
        assert!(loaded.agents.is_empty());
        assert!(loaded.tasks.is_empty());
    }
}
