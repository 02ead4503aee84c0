//! API module
//!
//! Contains HTTP request handlers for the agent monitoring endpoints and the
//! shared state handed to every handler.

pub mod agents;
pub mod summary;
pub mod tasks;

use crate::config::Config;
use crate::monitor::AgentMonitor;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shared state injected into every handler
///
/// Built once in `main` and passed around behind an `Arc`: the monitor is
/// the single store instance, `events` fans monitor events out to WebSocket
/// clients.
pub struct AppContext {
    /// The one tracking ledger for this process
    pub monitor: Arc<AgentMonitor>,
    /// Application configuration loaded at startup
    pub config: Config,
    /// Broadcast channel carrying serialized monitor events
    pub events: broadcast::Sender<String>,
}

/// Message response
#[derive(Serialize)]
pub struct MessageResponse {
    /// Human-readable message
    pub message: String,
}

#[cfg(test)]
pub(crate) fn test_context() -> Arc<AppContext> {
    let (events, _) = broadcast::channel(16);
    Arc::new(AppContext {
        monitor: Arc::new(AgentMonitor::new(None)),
        config: Config::from_env(),
        events,
    })
}
