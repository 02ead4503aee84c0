// Agent monitoring module
// Tracks extraction agents and their tasks, with snapshot persistence

pub mod agent_monitor;
pub mod events;
pub mod persistence;
pub mod types;

pub use agent_monitor::{AgentMonitor, DEFAULT_STALL_TIMEOUT_SECS};
pub use events::{EventCallback, MonitorEvent};
pub use persistence::{MonitorSnapshot, PersistenceError};
pub use types::{
    ActivityEvent, ActivityKind, Agent, AgentId, AgentStatus, AgentSummary, AgentTask, Metadata,
    OverallSummary, StatusCounts, TaskId, TaskPriority,
};
