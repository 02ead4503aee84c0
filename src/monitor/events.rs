// Monitor event vocabulary
// Emitted to registered callbacks after every mutating operation

use crate::monitor::types::{Agent, AgentStatus, AgentTask};
use serde::Serialize;

/// Observer invoked after every mutating operation, while the store lock is
/// held. Observers must be fast and must not call back into the monitor.
pub type EventCallback = Box<dyn Fn(&MonitorEvent) + Send + Sync>;

/// A state-changing event, carrying a copy of the affected record(s)
///
/// Serializes with an `"event"` tag so it can be pushed to WebSocket clients
/// as-is. Heartbeats are deliberately absent: routine liveness pings are not
/// state-changing events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// A new agent joined the ledger
    AgentRegistered {
        /// The freshly created agent record
        agent: Agent,
    },
    /// A new task was assigned to an agent
    TaskAssigned {
        /// The freshly created task record
        task: AgentTask,
    },
    /// An agent's status (and possibly activity note) changed
    AgentStatusUpdated {
        /// The agent record after the update
        agent: Agent,
    },
    /// A task's status changed
    TaskStatusUpdated {
        /// The task record after the update
        task: AgentTask,
        /// The status the task held before this update
        old_status: AgentStatus,
    },
    /// A task reported progress
    TaskProgressUpdated {
        /// The task record after the update
        task: AgentTask,
    },
}

impl MonitorEvent {
    /// The wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            MonitorEvent::AgentRegistered { .. } => "agent_registered",
            MonitorEvent::TaskAssigned { .. } => "task_assigned",
            MonitorEvent::AgentStatusUpdated { .. } => "agent_status_updated",
            MonitorEvent::TaskStatusUpdated { .. } => "task_status_updated",
            MonitorEvent::TaskProgressUpdated { .. } => "task_progress_updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::types::Metadata;

    #[test]
    fn test_event_serializes_with_tag() {
        let agent = Agent::new("Extractor".to_string(), "extractor".to_string(), Metadata::new());
        let event = MonitorEvent::AgentRegistered { agent };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "agent_registered");
        assert!(json["agent"]["id"].is_string());
    }

    #[test]
    fn test_event_name_matches_tag() {
        let agent = Agent::new("A".to_string(), "extractor".to_string(), Metadata::new());
        let event = MonitorEvent::AgentStatusUpdated { agent };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
    }
}
