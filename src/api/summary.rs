//! Dashboard summary API handlers
//!
//! Read-only views over the whole ledger: the overall summary the dashboard
//! polls, and the stalled-agent check.

use crate::api::AppContext;
use crate::monitor::{AgentId, OverallSummary};
use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query parameters for the stalled-agent check
#[derive(Deserialize, Default)]
pub struct StalledQuery {
    /// Heartbeat age in seconds beyond which a Running agent counts as
    /// stalled; falls back to the configured default
    pub timeout_seconds: Option<f64>,
}

/// Stalled-agent check response
#[derive(Serialize)]
pub struct StalledResponse {
    /// IDs of agents considered stalled
    pub stalled_agents: Vec<AgentId>,
    /// Number of stalled agents
    pub total: usize,
    /// The timeout that was applied
    pub timeout_seconds: f64,
}

/// GET /api/monitor/summary - Overall summary of all agents and tasks
pub async fn overall_summary(State(ctx): State<Arc<AppContext>>) -> Json<OverallSummary> {
    Json(ctx.monitor.get_overall_summary())
}

/// GET /api/monitor/stalled - Find Running agents with stale heartbeats
///
/// Pure query: flagged agents keep their status; it is up to the caller to
/// force-fail them through the status update endpoint if desired.
pub async fn check_stalled_agents(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<StalledQuery>,
) -> Json<StalledResponse> {
    let timeout_seconds = query
        .timeout_seconds
        .unwrap_or(ctx.config.monitoring.stall_timeout_secs);
    let stalled_agents = ctx.monitor.check_stalled_agents(timeout_seconds);

    Json(StalledResponse {
        total: stalled_agents.len(),
        stalled_agents,
        timeout_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_context;
    use crate::monitor::AgentStatus;

    #[tokio::test]
    async fn test_overall_summary_empty_store() {
        let ctx = test_context();
        let Json(summary) = overall_summary(State(ctx)).await;
        assert_eq!(summary.total_agents, 0);
        assert_eq!(summary.total_tasks, 0);
        assert_eq!(summary.overall_progress, 0.0);
        assert!(summary.recent_activity.is_empty());
    }

    #[tokio::test]
    async fn test_overall_summary_reflects_store() {
        let ctx = test_context();
        let agent_id = ctx
            .monitor
            .register_agent("Extractor".to_string(), "extractor".to_string(), None);
        ctx.monitor
            .update_agent_status(&agent_id, AgentStatus::Running, None)
            .unwrap();

        let Json(summary) = overall_summary(State(ctx)).await;
        assert_eq!(summary.total_agents, 1);
        assert_eq!(summary.agents_by_status[&AgentStatus::Running], 1);
    }

    #[tokio::test]
    async fn test_stalled_check_uses_configured_default() {
        let ctx = test_context();
        let Json(response) =
            check_stalled_agents(State(ctx.clone()), Query(StalledQuery::default())).await;
        assert_eq!(
            response.timeout_seconds,
            ctx.config.monitoring.stall_timeout_secs
        );
        assert!(response.stalled_agents.is_empty());

        let Json(response) = check_stalled_agents(
            State(ctx),
            Query(StalledQuery {
                timeout_seconds: Some(42.0),
            }),
        )
        .await;
        assert_eq!(response.timeout_seconds, 42.0);
    }
}
