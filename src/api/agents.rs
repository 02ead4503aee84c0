//! Agent monitoring API handlers
//!
//! Contains HTTP request handlers for agent registration, status updates,
//! heartbeats, and per-agent summaries.

use crate::api::{AppContext, MessageResponse};
use crate::error::MonitorError;
use crate::monitor::{Agent, AgentId, AgentStatus, AgentSummary, Metadata, TaskId};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Agents list response
#[derive(Serialize)]
pub struct AgentsListResponse {
    /// List of all registered agents
    pub agents: Vec<Agent>,
    /// Total number of agents
    pub total: usize,
}

/// Register agent request
#[derive(Deserialize)]
pub struct RegisterAgentRequest {
    /// Human-readable name for the new agent
    pub name: String,
    /// Free-form agent category (e.g. "extractor")
    pub agent_type: String,
    /// Optional caller-supplied metadata
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Register agent response
#[derive(Serialize)]
pub struct RegisterAgentResponse {
    /// Generated identifier for the new agent
    pub agent_id: AgentId,
    /// Human-readable message
    pub message: String,
}

/// Update agent status request
#[derive(Deserialize)]
pub struct UpdateAgentStatusRequest {
    /// New status, as its lowercase wire name
    pub status: String,
    /// Optional activity note
    #[serde(default)]
    pub activity: Option<String>,
}

/// Heartbeat request
#[derive(Deserialize, Default)]
pub struct HeartbeatRequest {
    /// Task the agent is currently working on, if it wants to report one
    #[serde(default)]
    pub current_task_id: Option<TaskId>,
}

/// GET /api/monitor/agents - List all registered agents
pub async fn list_agents(State(ctx): State<Arc<AppContext>>) -> Json<AgentsListResponse> {
    let agents = ctx.monitor.get_all_agents();
    Json(AgentsListResponse {
        total: agents.len(),
        agents,
    })
}

/// POST /api/monitor/agents/register - Register a new agent
pub async fn register_agent(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<RegisterAgentRequest>,
) -> (StatusCode, Json<RegisterAgentResponse>) {
    let message = format!("Agent '{}' registered successfully", request.name);
    let agent_id = ctx
        .monitor
        .register_agent(request.name, request.agent_type, request.metadata);

    (
        StatusCode::CREATED,
        Json(RegisterAgentResponse { agent_id, message }),
    )
}

/// GET /api/monitor/agents/:id - Get a summary of one agent's standing
pub async fn get_agent_summary(
    State(ctx): State<Arc<AppContext>>,
    Path(agent_id): Path<AgentId>,
) -> Result<Json<AgentSummary>, MonitorError> {
    ctx.monitor
        .get_agent_summary(&agent_id)
        .map(Json)
        .ok_or_else(|| MonitorError::AgentNotFound(agent_id.clone()))
}

/// PUT /api/monitor/agents/:id/status - Update an agent's status
pub async fn update_agent_status(
    State(ctx): State<Arc<AppContext>>,
    Path(agent_id): Path<AgentId>,
    Json(request): Json<UpdateAgentStatusRequest>,
) -> Result<Json<MessageResponse>, MonitorError> {
    let status: AgentStatus = request.status.parse()?;
    ctx.monitor
        .update_agent_status(&agent_id, status, request.activity)?;

    Ok(Json(MessageResponse {
        message: format!("Agent {agent_id} status updated to {status}"),
    }))
}

/// POST /api/monitor/agents/:id/heartbeat - Record an agent heartbeat
///
/// The body is optional; `{"current_task_id": ...}` also updates the agent's
/// current task back-reference.
pub async fn record_heartbeat(
    State(ctx): State<Arc<AppContext>>,
    Path(agent_id): Path<AgentId>,
    request: Option<Json<HeartbeatRequest>>,
) -> Result<Json<MessageResponse>, MonitorError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    ctx.monitor.heartbeat(&agent_id, request.current_task_id)?;

    Ok(Json(MessageResponse {
        message: "Heartbeat recorded".to_string(),
    }))
}
