// Central tracking engine for extraction agents and their tasks
//
// One mutex guards the agent map, the task map, and the callback list; every
// public operation is a single critical section, so callers always observe
// the store in a consistent state. Persistence and event notification happen
// inside the critical section as well, keeping the on-disk snapshot in step
// with memory at the cost of serializing callers behind the disk write.

use crate::monitor::events::{EventCallback, MonitorEvent};
use crate::monitor::persistence;
use crate::monitor::types::{
    count_by_status, ActivityEvent, ActivityKind, Agent, AgentId, AgentStatus, AgentSummary,
    AgentTask, Metadata, OverallSummary, TaskId, TaskPriority,
};
use crate::error::MonitorError;
use chrono::Utc;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

/// Stall timeout applied when the caller does not supply one
pub const DEFAULT_STALL_TIMEOUT_SECS: f64 = 300.0;

/// How many activity events the overall summary carries
const DEFAULT_ACTIVITY_LIMIT: usize = 10;

/// How many recent tasks an agent summary carries
const RECENT_TASKS_LIMIT: usize = 5;

// Everything behind the lock. Records are owned exclusively by the store;
// callers only ever receive clones.
#[derive(Default)]
struct MonitorState {
    agents: HashMap<AgentId, Agent>,
    tasks: HashMap<TaskId, AgentTask>,
    callbacks: Vec<EventCallback>,
}

impl MonitorState {
    // Invoke every callback in registration order. A panicking callback is
    // caught and logged; it never unwinds into the mutating operation.
    fn notify(&self, event: &MonitorEvent) {
        for callback in &self.callbacks {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                warn!("Monitor callback panicked while handling '{}'", event.name());
            }
        }
    }

    fn recent_activity(&self, limit: usize) -> Vec<ActivityEvent> {
        let mut activities = Vec::new();

        for task in self.tasks.values() {
            let agent_name = self
                .agents
                .get(&task.agent_id)
                .map(|agent| agent.name.clone())
                .unwrap_or_else(|| "Unknown".to_string());

            if let Some(started_at) = task.started_at {
                activities.push(ActivityEvent {
                    timestamp: started_at,
                    event: ActivityKind::TaskStarted,
                    agent: agent_name.clone(),
                    description: task.description.clone(),
                });
            }

            if let Some(completed_at) = task.completed_at {
                let kind = if task.status == AgentStatus::Completed {
                    ActivityKind::TaskCompleted
                } else {
                    ActivityKind::TaskFailed
                };
                activities.push(ActivityEvent {
                    timestamp: completed_at,
                    event: kind,
                    agent: agent_name,
                    description: task.description.clone(),
                });
            }
        }

        // Most recent first
        activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activities.truncate(limit);
        activities
    }

    fn overall_progress(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        let total: f64 = self.tasks.values().map(|task| task.progress).sum();
        total / self.tasks.len() as f64
    }
}

/// Central monitoring system for all extraction agents
///
/// Tracks agent registrations, task assignments, progress, and liveness, and
/// snapshots the whole state to disk after every mutation. Construct one
/// instance at process start and hand it to every collaborator behind an
/// `Arc`; all operations take `&self`.
pub struct AgentMonitor {
    inner: Mutex<MonitorState>,
    persistence_path: Option<PathBuf>,
}

impl AgentMonitor {
    /// Create a monitor, repopulating the store from `persistence_path` when
    /// a previous snapshot exists there
    ///
    /// A missing snapshot starts the store empty; an unreadable one is
    /// logged and ignored, so a corrupt file degrades durability without
    /// blocking tracking. Pass `None` for a purely in-memory monitor.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        let mut state = MonitorState::default();

        if let Some(path) = &persistence_path {
            match persistence::load_from_file(path) {
                Ok(snapshot) => {
                    if !snapshot.agents.is_empty() || !snapshot.tasks.is_empty() {
                        info!(
                            "Restored {} agents and {} tasks from {}",
                            snapshot.agents.len(),
                            snapshot.tasks.len(),
                            path.display()
                        );
                    }
                    state.agents = snapshot.agents;
                    state.tasks = snapshot.tasks;
                }
                Err(e) => {
                    warn!("Failed to load monitor state from {}: {}", path.display(), e);
                }
            }
        }

        Self {
            inner: Mutex::new(state),
            persistence_path,
        }
    }

    // Recover the guard if a previous holder panicked; the store data itself
    // is only ever mutated through complete critical sections.
    fn lock_state(&self) -> MutexGuard<'_, MonitorState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // Snapshot the store to disk. Failures are logged and swallowed: a bad
    // disk must never fail the mutating operation.
    fn persist_locked(&self, state: &MonitorState) {
        let Some(path) = &self.persistence_path else {
            return;
        };
        if let Err(e) = persistence::save_to_file(path, &state.agents, &state.tasks) {
            warn!("Failed to persist monitor state to {}: {}", path.display(), e);
        }
    }

    /// Register a new agent and return its generated id
    ///
    /// Always succeeds: names and types carry no uniqueness constraint.
    pub fn register_agent(
        &self,
        name: String,
        agent_type: String,
        metadata: Option<Metadata>,
    ) -> AgentId {
        let mut state = self.lock_state();

        let agent = Agent::new(name, agent_type, metadata.unwrap_or_default());
        let agent_id = agent.id.clone();
        state.agents.insert(agent_id.clone(), agent.clone());

        self.persist_locked(&state);
        state.notify(&MonitorEvent::AgentRegistered { agent });
        agent_id
    }

    /// Assign a new task to a registered agent and return the task id
    ///
    /// Fails with [`MonitorError::AgentNotFound`] when `agent_id` does not
    /// resolve; in that case the store is left untouched.
    pub fn assign_task(
        &self,
        agent_id: &str,
        description: String,
        task_type: String,
        priority: TaskPriority,
        pages: Option<Vec<u32>>,
        metadata: Option<Metadata>,
    ) -> Result<TaskId, MonitorError> {
        let mut state = self.lock_state();

        if !state.agents.contains_key(agent_id) {
            return Err(MonitorError::AgentNotFound(agent_id.to_string()));
        }

        let task = AgentTask::new(
            agent_id.to_string(),
            description,
            task_type,
            priority,
            pages.unwrap_or_default(),
            metadata.unwrap_or_default(),
        );
        let task_id = task.id.clone();
        state.tasks.insert(task_id.clone(), task.clone());

        self.persist_locked(&state);
        state.notify(&MonitorEvent::TaskAssigned { task });
        Ok(task_id)
    }

    /// Overwrite an agent's status, refreshing its heartbeat
    ///
    /// `activity` replaces the agent's last activity note when supplied.
    pub fn update_agent_status(
        &self,
        agent_id: &str,
        status: AgentStatus,
        activity: Option<String>,
    ) -> Result<(), MonitorError> {
        let mut state = self.lock_state();

        let agent = state
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| MonitorError::AgentNotFound(agent_id.to_string()))?;

        agent.status = status;
        agent.last_heartbeat = Some(Utc::now());
        if let Some(activity) = activity {
            agent.last_activity = Some(activity);
        }
        let agent = agent.clone();

        self.persist_locked(&state);
        state.notify(&MonitorEvent::AgentStatusUpdated { agent });
        Ok(())
    }

    /// Update a task's status, maintaining lifecycle timestamps and the
    /// owning agent's completion counters
    ///
    /// `started_at` is stamped only on the first transition to `Running`.
    /// Every terminal transition stamps `completed_at` and bumps the owning
    /// agent's counter; a repeated terminal call counts again.
    pub fn update_task_status(
        &self,
        task_id: &str,
        status: AgentStatus,
        error: Option<String>,
    ) -> Result<(), MonitorError> {
        let mut state = self.lock_state();
        let now = Utc::now();

        let task = state
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| MonitorError::TaskNotFound(task_id.to_string()))?;

        let old_status = task.status;
        task.status = status;

        if status == AgentStatus::Running && task.started_at.is_none() {
            task.started_at = Some(now);
        } else if status.is_terminal() {
            task.completed_at = Some(now);
        }

        if let Some(message) = error {
            task.error_message = Some(message);
        }

        let agent_id = task.agent_id.clone();
        let task = task.clone();

        if status.is_terminal() {
            if let Some(agent) = state.agents.get_mut(&agent_id) {
                match status {
                    AgentStatus::Completed => agent.tasks_completed += 1,
                    AgentStatus::Failed => agent.tasks_failed += 1,
                    _ => {}
                }
            }
        }

        self.persist_locked(&state);
        state.notify(&MonitorEvent::TaskStatusUpdated { task, old_status });
        Ok(())
    }

    /// Report task progress, clamped into [0.0, 1.0]
    ///
    /// `pages_completed` overwrites the task's completed-page list when
    /// supplied. A `Running` task reaching progress 1.0 flips straight to
    /// `Completed` with `completed_at` stamped; this shortcut does NOT bump
    /// the owning agent's `tasks_completed` counter, only
    /// [`update_task_status`](Self::update_task_status) does.
    pub fn update_task_progress(
        &self,
        task_id: &str,
        progress: f64,
        pages_completed: Option<Vec<u32>>,
    ) -> Result<(), MonitorError> {
        let mut state = self.lock_state();

        let task = state
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| MonitorError::TaskNotFound(task_id.to_string()))?;

        task.progress = progress.clamp(0.0, 1.0);

        if let Some(pages) = pages_completed {
            task.pages_completed = pages;
        }

        if task.progress >= 1.0 && task.status == AgentStatus::Running {
            task.status = AgentStatus::Completed;
            task.completed_at = Some(Utc::now());
        }

        let task = task.clone();

        self.persist_locked(&state);
        state.notify(&MonitorEvent::TaskProgressUpdated { task });
        Ok(())
    }

    /// Record an agent heartbeat to show it is still alive
    ///
    /// Refreshes `last_heartbeat` and, when supplied, the agent's current
    /// task. Deliberately lightweight: no snapshot write, no event - a
    /// routine liveness ping is not a state-changing operation.
    pub fn heartbeat(
        &self,
        agent_id: &str,
        current_task_id: Option<TaskId>,
    ) -> Result<(), MonitorError> {
        let mut state = self.lock_state();

        let agent = state
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| MonitorError::AgentNotFound(agent_id.to_string()))?;

        agent.last_heartbeat = Some(Utc::now());
        if let Some(task_id) = current_task_id {
            agent.current_task_id = Some(task_id);
        }
        Ok(())
    }

    /// Get a copy of an agent record; absence is a normal outcome
    pub fn get_agent(&self, agent_id: &str) -> Option<Agent> {
        self.lock_state().agents.get(agent_id).cloned()
    }

    /// Get a copy of a task record; absence is a normal outcome
    pub fn get_task(&self, task_id: &str) -> Option<AgentTask> {
        self.lock_state().tasks.get(task_id).cloned()
    }

    /// Get all registered agents
    pub fn get_all_agents(&self) -> Vec<Agent> {
        self.lock_state().agents.values().cloned().collect()
    }

    /// Get tasks, optionally filtered by owning agent and/or status
    ///
    /// Both filters are independent; supplying both intersects them.
    pub fn get_all_tasks(
        &self,
        agent_id: Option<&str>,
        status: Option<AgentStatus>,
    ) -> Vec<AgentTask> {
        let state = self.lock_state();
        state
            .tasks
            .values()
            .filter(|task| agent_id.is_none_or(|id| task.agent_id == id))
            .filter(|task| status.is_none_or(|s| task.status == s))
            .cloned()
            .collect()
    }

    /// Get every task whose status still has work outstanding
    pub fn get_incomplete_tasks(&self) -> Vec<AgentTask> {
        let state = self.lock_state();
        state
            .tasks
            .values()
            .filter(|task| task.status.is_incomplete())
            .cloned()
            .collect()
    }

    /// Summarize one agent's standing, or `None` for an unknown agent
    pub fn get_agent_summary(&self, agent_id: &str) -> Option<AgentSummary> {
        let state = self.lock_state();
        let agent = state.agents.get(agent_id)?.clone();

        let mut agent_tasks: Vec<&AgentTask> = state
            .tasks
            .values()
            .filter(|task| task.agent_id == agent_id)
            .collect();

        let tasks_by_status = count_by_status(agent_tasks.iter().map(|task| &task.status));

        let current_task = agent
            .current_task_id
            .as_ref()
            .and_then(|task_id| agent_tasks.iter().find(|task| &task.id == task_id))
            .map(|task| (*task).clone());

        agent_tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let recent_tasks = agent_tasks
            .iter()
            .take(RECENT_TASKS_LIMIT)
            .map(|task| (*task).clone())
            .collect();

        Some(AgentSummary {
            total_tasks: agent_tasks.len(),
            tasks_by_status,
            current_task,
            recent_tasks,
            agent,
        })
    }

    /// Summarize the whole ledger for dashboard rendering
    pub fn get_overall_summary(&self) -> OverallSummary {
        let state = self.lock_state();

        OverallSummary {
            total_agents: state.agents.len(),
            agents_by_status: count_by_status(state.agents.values().map(|agent| &agent.status)),
            total_tasks: state.tasks.len(),
            tasks_by_status: count_by_status(state.tasks.values().map(|task| &task.status)),
            overall_progress: state.overall_progress(),
            agents: state.agents.values().cloned().collect(),
            recent_activity: state.recent_activity(DEFAULT_ACTIVITY_LIMIT),
        }
    }

    /// Derive the most recent activity events across all tasks, newest first
    pub fn recent_activity(&self, limit: usize) -> Vec<ActivityEvent> {
        self.lock_state().recent_activity(limit)
    }

    /// Find `Running` agents whose last heartbeat is older than
    /// `timeout_seconds`
    ///
    /// A pure query: agent status is never mutated here. Agents that never
    /// sent a heartbeat are not flagged regardless of the timeout; the
    /// caller decides what to do with the result.
    pub fn check_stalled_agents(&self, timeout_seconds: f64) -> Vec<AgentId> {
        let state = self.lock_state();
        let now = Utc::now();

        state
            .agents
            .iter()
            .filter(|(_, agent)| {
                agent.status == AgentStatus::Running
                    && agent.last_heartbeat.is_some_and(|heartbeat| {
                        (now - heartbeat).num_milliseconds() as f64 > timeout_seconds * 1000.0
                    })
            })
            .map(|(agent_id, _)| agent_id.clone())
            .collect()
    }

    /// Register an observer invoked after every mutating operation
    ///
    /// Callbacks run synchronously while the store lock is held, in
    /// registration order, so they must be fast and must not call back into
    /// the monitor.
    pub fn register_callback(&self, callback: impl Fn(&MonitorEvent) + Send + Sync + 'static) {
        self.lock_state().callbacks.push(Box::new(callback));
    }
}
