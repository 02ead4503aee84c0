//! Task monitoring API handlers
//!
//! Contains HTTP request handlers for task assignment, status and progress
//! updates, and task queries.

use crate::api::{AppContext, MessageResponse};
use crate::error::MonitorError;
use crate::monitor::{AgentStatus, AgentTask, Metadata, TaskId, TaskPriority};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tasks list response
#[derive(Serialize)]
pub struct TasksListResponse {
    /// Matching tasks
    pub tasks: Vec<AgentTask>,
    /// Number of matching tasks
    pub total: usize,
}

/// Incomplete tasks response
#[derive(Serialize)]
pub struct IncompleteTasksResponse {
    /// Tasks that still have work outstanding
    pub incomplete_tasks: Vec<AgentTask>,
    /// Number of such tasks
    pub total: usize,
}

/// Query filters for the task list
#[derive(Deserialize, Default)]
pub struct TasksQuery {
    /// Only tasks owned by this agent
    pub agent_id: Option<String>,
    /// Only tasks in this status (lowercase wire name)
    pub status: Option<String>,
}

/// Assign task request
#[derive(Deserialize)]
pub struct AssignTaskRequest {
    /// Agent to assign the task to
    pub agent_id: String,
    /// Task description
    pub description: String,
    /// Free-form task kind (e.g. "page_extraction")
    pub task_type: String,
    /// Priority as its lowercase wire name; defaults to "normal"
    #[serde(default)]
    pub priority: Option<String>,
    /// Page numbers this task covers
    #[serde(default)]
    pub pages: Option<Vec<u32>>,
    /// Optional caller-supplied metadata
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Assign task response
#[derive(Serialize)]
pub struct AssignTaskResponse {
    /// Generated identifier for the new task
    pub task_id: TaskId,
    /// Human-readable message
    pub message: String,
}

/// Update task status request
#[derive(Deserialize)]
pub struct UpdateTaskStatusRequest {
    /// New status, as its lowercase wire name
    pub status: String,
    /// Optional error message (overwrites the task's previous one)
    #[serde(default)]
    pub error: Option<String>,
}

/// Update task progress request
#[derive(Deserialize)]
pub struct UpdateTaskProgressRequest {
    /// Completion fraction; clamped into [0.0, 1.0] by the monitor
    pub progress: f64,
    /// Page numbers reported done
    #[serde(default)]
    pub pages_completed: Option<Vec<u32>>,
}

/// GET /api/monitor/tasks - List tasks, optionally filtered
pub async fn list_tasks(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<TasksQuery>,
) -> Result<Json<TasksListResponse>, MonitorError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<AgentStatus>)
        .transpose()?;

    let tasks = ctx.monitor.get_all_tasks(query.agent_id.as_deref(), status);
    Ok(Json(TasksListResponse {
        total: tasks.len(),
        tasks,
    }))
}

/// GET /api/monitor/tasks/:id - Get a single task record
pub async fn get_task(
    State(ctx): State<Arc<AppContext>>,
    Path(task_id): Path<TaskId>,
) -> Result<Json<AgentTask>, MonitorError> {
    ctx.monitor
        .get_task(&task_id)
        .map(Json)
        .ok_or_else(|| MonitorError::TaskNotFound(task_id.clone()))
}

/// POST /api/monitor/tasks/assign - Assign a new task to an agent
pub async fn assign_task(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<AssignTaskRequest>,
) -> Result<(StatusCode, Json<AssignTaskResponse>), MonitorError> {
    let priority: TaskPriority = request.priority.as_deref().unwrap_or("normal").parse()?;

    let task_id = ctx.monitor.assign_task(
        &request.agent_id,
        request.description,
        request.task_type,
        priority,
        request.pages,
        request.metadata,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(AssignTaskResponse {
            task_id,
            message: format!("Task assigned to agent {}", request.agent_id),
        }),
    ))
}

/// PUT /api/monitor/tasks/:id/status - Update a task's status
pub async fn update_task_status(
    State(ctx): State<Arc<AppContext>>,
    Path(task_id): Path<TaskId>,
    Json(request): Json<UpdateTaskStatusRequest>,
) -> Result<Json<MessageResponse>, MonitorError> {
    let status: AgentStatus = request.status.parse()?;
    ctx.monitor
        .update_task_status(&task_id, status, request.error)?;

    Ok(Json(MessageResponse {
        message: format!("Task {task_id} status updated to {status}"),
    }))
}

/// PUT /api/monitor/tasks/:id/progress - Update a task's progress
pub async fn update_task_progress(
    State(ctx): State<Arc<AppContext>>,
    Path(task_id): Path<TaskId>,
    Json(request): Json<UpdateTaskProgressRequest>,
) -> Result<Json<MessageResponse>, MonitorError> {
    ctx.monitor
        .update_task_progress(&task_id, request.progress, request.pages_completed)?;

    let task = ctx
        .monitor
        .get_task(&task_id)
        .ok_or_else(|| MonitorError::TaskNotFound(task_id.clone()))?;

    Ok(Json(MessageResponse {
        message: format!(
            "Task {task_id} progress updated to {:.0}%",
            task.progress * 100.0
        ),
    }))
}

/// GET /api/monitor/incomplete - List every task with work outstanding
pub async fn list_incomplete_tasks(
    State(ctx): State<Arc<AppContext>>,
) -> Json<IncompleteTasksResponse> {
    let incomplete_tasks = ctx.monitor.get_incomplete_tasks();
    Json(IncompleteTasksResponse {
        total: incomplete_tasks.len(),
        incomplete_tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_context;
    use crate::monitor::AgentId;

    fn register(ctx: &Arc<AppContext>) -> AgentId {
        ctx.monitor
            .register_agent("Extractor".to_string(), "extractor".to_string(), None)
    }

    async fn assign(ctx: &Arc<AppContext>, agent_id: &str) -> TaskId {
        let (status, Json(response)) = assign_task(
            State(ctx.clone()),
            Json(AssignTaskRequest {
                agent_id: agent_id.to_string(),
                description: "Extract pages 1-10".to_string(),
                task_type: "page_extraction".to_string(),
                priority: Some("high".to_string()),
                pages: Some((1..=10).collect()),
                metadata: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        response.task_id
    }

    #[tokio::test]
    async fn test_assign_task_unknown_agent_is_404() {
        let ctx = test_context();
        let result = assign_task(
            State(ctx),
            Json(AssignTaskRequest {
                agent_id: "unknown-agent".to_string(),
                description: "Extract".to_string(),
                task_type: "page_extraction".to_string(),
                priority: None,
                pages: None,
                metadata: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(MonitorError::AgentNotFound(_))));
    }

    #[tokio::test]
    async fn test_assign_task_rejects_unknown_priority() {
        let ctx = test_context();
        let agent_id = register(&ctx);
        let result = assign_task(
            State(ctx),
            Json(AssignTaskRequest {
                agent_id,
                description: "Extract".to_string(),
                task_type: "page_extraction".to_string(),
                priority: Some("urgent".to_string()),
                pages: None,
                metadata: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(MonitorError::InvalidPriority(_))));
    }

    #[tokio::test]
    async fn test_assign_and_drive_task_to_completion() {
        let ctx = test_context();
        let agent_id = register(&ctx);
        let task_id = assign(&ctx, &agent_id).await;

        update_task_status(
            State(ctx.clone()),
            Path(task_id.clone()),
            Json(UpdateTaskStatusRequest {
                status: "running".to_string(),
                error: None,
            }),
        )
        .await
        .unwrap();

        update_task_progress(
            State(ctx.clone()),
            Path(task_id.clone()),
            Json(UpdateTaskProgressRequest {
                progress: 0.5,
                pages_completed: Some((1..=5).collect()),
            }),
        )
        .await
        .unwrap();

        update_task_status(
            State(ctx.clone()),
            Path(task_id.clone()),
            Json(UpdateTaskStatusRequest {
                status: "completed".to_string(),
                error: None,
            }),
        )
        .await
        .unwrap();

        let Json(task) = get_task(State(ctx.clone()), Path(task_id)).await.unwrap();
        assert_eq!(task.status, AgentStatus::Completed);
        assert_eq!(task.progress, 0.5);
        assert!(task.completed_at.is_some());
        assert_eq!(ctx.monitor.get_agent(&agent_id).unwrap().tasks_completed, 1);
    }

    #[tokio::test]
    async fn test_list_tasks_filters_and_validation() {
        let ctx = test_context();
        let agent_id = register(&ctx);
        let task_id = assign(&ctx, &agent_id).await;
        ctx.monitor
            .update_task_status(&task_id, AgentStatus::Running, None)
            .unwrap();

        let Json(response) = list_tasks(
            State(ctx.clone()),
            Query(TasksQuery {
                agent_id: Some(agent_id.clone()),
                status: Some("running".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.total, 1);

        let Json(response) = list_tasks(
            State(ctx.clone()),
            Query(TasksQuery {
                agent_id: None,
                status: Some("pending".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(response.total, 0);

        let result = list_tasks(
            State(ctx),
            Query(TasksQuery {
                agent_id: None,
                status: Some("bogus".to_string()),
            }),
        )
        .await;
        assert!(matches!(result, Err(MonitorError::InvalidStatus(_))));
    }

    #[tokio::test]
    async fn test_get_task_not_found() {
        let ctx = test_context();
        let result = get_task(State(ctx), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(MonitorError::TaskNotFound(_))));
    }

    #[tokio::test]
    async fn test_incomplete_tasks_endpoint() {
        let ctx = test_context();
        let agent_id = register(&ctx);
        let open = assign(&ctx, &agent_id).await;
        let done = assign(&ctx, &agent_id).await;
        ctx.monitor
            .update_task_status(&done, AgentStatus::Completed, None)
            .unwrap();

        let Json(response) = list_incomplete_tasks(State(ctx)).await;
        assert_eq!(response.total, 1);
        assert_eq!(response.incomplete_tasks[0].id, open);
    }
}
