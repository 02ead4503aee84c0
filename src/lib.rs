//! Agent Monitor Backend Library
//!
//! Tracking ledger for long-running extraction/validation agents and their
//! tasks: registration, status and progress reporting, heartbeat liveness,
//! stall detection, and crash-safe snapshot persistence. The main binary is
//! in `src/main.rs`; this library exposes the modules for tests and the
//! auxiliary binaries.

pub mod api;
pub mod config;
pub mod error;
/// Agent and task tracking
///
/// The in-memory ledger, its mutation/query operations, event callbacks,
/// and JSON snapshot persistence.
pub mod monitor;
pub mod websocket;
