// Monitor data model
// Defines the status vocabulary, agent/task records, and derived summary types

use crate::error::MonitorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an agent
pub type AgentId = String;

/// Unique identifier for a task
pub type TaskId = String;

/// Lifecycle status shared by agents and tasks
///
/// One vocabulary covers both entity kinds: the persisted snapshot and the
/// HTTP API use the same lowercase strings for agent and task status, even
/// though a couple of values only make sense for one of the two (a task is
/// never `Initializing`, an agent has no use for `Paused` pages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Registered or assigned, no work started yet
    Pending,
    /// Starting up (loading models, opening documents)
    Initializing,
    /// Actively working
    Running,
    /// Temporarily suspended
    Paused,
    /// Finished successfully (terminal)
    Completed,
    /// Finished with an error (terminal)
    Failed,
    /// Aborted by the caller (terminal)
    Cancelled,
}

impl AgentStatus {
    /// All status values, in lifecycle order
    pub fn all() -> [AgentStatus; 7] {
        [
            AgentStatus::Pending,
            AgentStatus::Initializing,
            AgentStatus::Running,
            AgentStatus::Paused,
            AgentStatus::Completed,
            AgentStatus::Failed,
            AgentStatus::Cancelled,
        ]
    }

    /// Whether this status ends the lifecycle (no further transitions modeled)
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AgentStatus::Completed | AgentStatus::Failed | AgentStatus::Cancelled
        )
    }

    /// Whether a task in this status still has work outstanding
    pub fn is_incomplete(self) -> bool {
        matches!(
            self,
            AgentStatus::Pending
                | AgentStatus::Initializing
                | AgentStatus::Running
                | AgentStatus::Paused
        )
    }

    /// The lowercase wire name of this status
    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Pending => "pending",
            AgentStatus::Initializing => "initializing",
            AgentStatus::Running => "running",
            AgentStatus::Paused => "paused",
            AgentStatus::Completed => "completed",
            AgentStatus::Failed => "failed",
            AgentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = MonitorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(AgentStatus::Pending),
            "initializing" => Ok(AgentStatus::Initializing),
            "running" => Ok(AgentStatus::Running),
            "paused" => Ok(AgentStatus::Paused),
            "completed" => Ok(AgentStatus::Completed),
            "failed" => Ok(AgentStatus::Failed),
            "cancelled" => Ok(AgentStatus::Cancelled),
            other => Err(MonitorError::InvalidStatus(other.to_string())),
        }
    }
}

/// Priority level for agent tasks
///
/// Informational only: the monitor records it but never orders work by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Background work
    Low,
    /// Default priority
    #[default]
    Normal,
    /// Should be picked up ahead of normal work
    High,
    /// Drop everything else
    Critical,
}

impl TaskPriority {
    /// The lowercase wire name of this priority
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Normal => "normal",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = MonitorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(TaskPriority::Low),
            "normal" => Ok(TaskPriority::Normal),
            "high" => Ok(TaskPriority::High),
            "critical" => Ok(TaskPriority::Critical),
            other => Err(MonitorError::InvalidPriority(other.to_string())),
        }
    }
}

/// Caller-supplied metadata attached to agents and tasks, opaque to the monitor
pub type Metadata = HashMap<String, serde_json::Value>;

/// A tracked long-running worker identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    /// Unique identifier, generated at registration
    pub id: AgentId,
    /// Human-readable name, caller-supplied and not unique
    pub name: String,
    /// Free-form category (e.g. "extractor", "validator")
    pub agent_type: String,
    /// Current lifecycle status
    pub status: AgentStatus,
    /// Task the agent last reported working on, if any
    pub current_task_id: Option<TaskId>,
    /// Number of tasks this agent has completed
    pub tasks_completed: u64,
    /// Number of tasks this agent has failed
    pub tasks_failed: u64,
    /// When the agent was registered
    pub created_at: DateTime<Utc>,
    /// Last time the agent was heard from
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Last human-readable activity note
    pub last_activity: Option<String>,
    /// Caller-supplied metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl Agent {
    /// Create a new agent in `Pending` status with a fresh id
    pub fn new(name: String, agent_type: String, metadata: Metadata) -> Self {
        Self {
            id: Self::generate_id(),
            name,
            agent_type,
            status: AgentStatus::Pending,
            current_task_id: None,
            tasks_completed: 0,
            tasks_failed: 0,
            created_at: Utc::now(),
            last_heartbeat: None,
            last_activity: None,
            metadata,
        }
    }

    /// Generate a new unique ID for an agent
    /// Uses UUID v4 for uniqueness
    pub fn generate_id() -> AgentId {
        Uuid::new_v4().to_string()
    }
}

/// A unit of work assigned to exactly one agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentTask {
    /// Unique identifier, generated at assignment
    pub id: TaskId,
    /// The agent this task belongs to; resolves to a registered agent at
    /// assignment time and agents are never deleted, so it cannot dangle
    pub agent_id: AgentId,
    /// What the task is about
    pub description: String,
    /// Free-form kind (e.g. "page_extraction", "validation")
    pub task_type: String,
    /// Informational priority
    pub priority: TaskPriority,
    /// Current lifecycle status
    pub status: AgentStatus,
    /// When the task was assigned
    pub created_at: DateTime<Utc>,
    /// Set once, the first time the task enters `Running`
    pub started_at: Option<DateTime<Utc>>,
    /// Stamped when the task reaches a terminal status
    pub completed_at: Option<DateTime<Utc>>,
    /// Completion fraction, always within [0.0, 1.0]
    pub progress: f64,
    /// Page numbers this task covers, if applicable
    pub pages_assigned: Vec<u32>,
    /// Page numbers reported done; not validated against `pages_assigned`
    pub pages_completed: Vec<u32>,
    /// Set by failure reporting
    pub error_message: Option<String>,
    /// Caller-supplied metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl AgentTask {
    /// Create a new task in `Pending` status with a fresh id
    pub fn new(
        agent_id: AgentId,
        description: String,
        task_type: String,
        priority: TaskPriority,
        pages_assigned: Vec<u32>,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id,
            description,
            task_type,
            priority,
            status: AgentStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            progress: 0.0,
            pages_assigned,
            pages_completed: Vec::new(),
            error_message: None,
            metadata,
        }
    }
}

/// Per-status record counts, with every status present (zero when absent)
pub type StatusCounts = BTreeMap<AgentStatus, usize>;

/// Build a [`StatusCounts`] over the statuses of `items`
pub(crate) fn count_by_status<'a>(
    statuses: impl Iterator<Item = &'a AgentStatus>,
) -> StatusCounts {
    let mut counts: StatusCounts = AgentStatus::all().iter().map(|s| (*s, 0)).collect();
    for status in statuses {
        *counts.entry(*status).or_default() += 1;
    }
    counts
}

/// Snapshot of one agent's standing: its record plus derived task figures
#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    /// The agent record
    pub agent: Agent,
    /// How many tasks have ever been assigned to this agent
    pub total_tasks: usize,
    /// Task counts per status, all statuses present
    pub tasks_by_status: StatusCounts,
    /// The task matching the agent's `current_task_id`, if it belongs to this agent
    pub current_task: Option<AgentTask>,
    /// The five most recently created tasks, newest first
    pub recent_tasks: Vec<AgentTask>,
}

/// Snapshot of the whole ledger for dashboard rendering
#[derive(Debug, Clone, Serialize)]
pub struct OverallSummary {
    /// Number of registered agents
    pub total_agents: usize,
    /// Agent counts per status, all statuses present
    pub agents_by_status: StatusCounts,
    /// Number of tasks ever assigned
    pub total_tasks: usize,
    /// Task counts per status, all statuses present
    pub tasks_by_status: StatusCounts,
    /// Arithmetic mean of every task's progress; 0.0 when no tasks exist
    pub overall_progress: f64,
    /// Every registered agent
    pub agents: Vec<Agent>,
    /// The ten most recent activity events, newest first
    pub recent_activity: Vec<ActivityEvent>,
}

/// Kind of a derived activity-feed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// A task entered `Running`
    TaskStarted,
    /// A task finished in `Completed`
    TaskCompleted,
    /// A task finished in any other terminal status
    TaskFailed,
}

/// One entry of the derived activity feed
///
/// Not stored: rebuilt from task timestamps on every query.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    /// When the underlying transition happened
    pub timestamp: DateTime<Utc>,
    /// What happened
    pub event: ActivityKind,
    /// Name of the owning agent ("Unknown" if it cannot be resolved)
    pub agent: String,
    /// Description of the task involved
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display_round_trip() {
        for status in AgentStatus::all() {
            let parsed: AgentStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown_value() {
        let err = "sleeping".parse::<AgentStatus>().unwrap_err();
        match err {
            MonitorError::InvalidStatus(value) => assert_eq!(value, "sleeping"),
            other => panic!("Expected InvalidStatus, got: {:?}", other),
        }
    }

    #[test]
    fn test_status_terminal_and_incomplete_partition() {
        for status in AgentStatus::all() {
            // Every status is exactly one of terminal or incomplete
            assert_ne!(status.is_terminal(), status.is_incomplete());
        }
        assert!(AgentStatus::Completed.is_terminal());
        assert!(AgentStatus::Failed.is_terminal());
        assert!(AgentStatus::Cancelled.is_terminal());
        assert!(AgentStatus::Paused.is_incomplete());
    }

    #[test]
    fn test_priority_parse_rejects_unknown_value() {
        assert!("urgent".parse::<TaskPriority>().is_err());
        assert_eq!("critical".parse::<TaskPriority>().unwrap(), TaskPriority::Critical);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&AgentStatus::Initializing).unwrap();
        assert_eq!(json, "\"initializing\"");
        let json = serde_json::to_string(&TaskPriority::High).unwrap();
        assert_eq!(json, "\"high\"");
    }

    #[test]
    fn test_agent_new_defaults() {
        let agent = Agent::new("Extractor".to_string(), "extractor".to_string(), Metadata::new());
        assert_eq!(agent.status, AgentStatus::Pending);
        assert_eq!(agent.tasks_completed, 0);
        assert_eq!(agent.tasks_failed, 0);
        assert!(agent.last_heartbeat.is_none());
        assert!(!agent.id.is_empty());
    }

    #[test]
    fn test_count_by_status_includes_every_status() {
        let statuses = [AgentStatus::Running, AgentStatus::Running, AgentStatus::Failed];
        let counts = count_by_status(statuses.iter());
        assert_eq!(counts.len(), 7);
        assert_eq!(counts[&AgentStatus::Running], 2);
        assert_eq!(counts[&AgentStatus::Failed], 1);
        assert_eq!(counts[&AgentStatus::Pending], 0);
    }
}
