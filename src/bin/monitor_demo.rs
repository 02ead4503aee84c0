//! Example workflow driving the agent monitoring system
//!
//! Simulates a multi-agent schematic extraction run: registers extractor and
//! validator agents, assigns page-ranged tasks, and drives them through
//! running, progress updates and completion with interleaved heartbeats.
//! This is a utility binary, not part of the main application.

use agent_monitor_backend::monitor::{AgentMonitor, AgentStatus, Metadata, TaskPriority};
use std::collections::HashMap;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

fn metadata(entries: &[(&str, serde_json::Value)]) -> Metadata {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect::<HashMap<_, _>>()
}

fn main() -> anyhow::Result<()> {
    println!("{}", "=".repeat(70));
    println!("Agent Monitoring System - Example Workflow");
    println!("{}", "=".repeat(70));

    let monitor = AgentMonitor::new(Some(PathBuf::from("data/monitor_state.json")));

    println!("\n1. Registering extraction agents...");

    let primary_id = monitor.register_agent(
        "Extractor-Primary".to_string(),
        "extractor".to_string(),
        Some(metadata(&[
            ("model", serde_json::json!("gemini-2.5-pro")),
            ("priority", serde_json::json!("high")),
        ])),
    );
    println!("   ✓ Primary extractor registered: {}", &primary_id[..8]);

    let secondary_id = monitor.register_agent(
        "Extractor-Secondary".to_string(),
        "extractor".to_string(),
        Some(metadata(&[(
            "model",
            serde_json::json!("gemini-2.5-flash"),
        )])),
    );
    println!("   ✓ Secondary extractor registered: {}", &secondary_id[..8]);

    let validator_id = monitor.register_agent(
        "Validator".to_string(),
        "validator".to_string(),
        Some(metadata(&[(
            "checks",
            serde_json::json!(["completeness", "accuracy"]),
        )])),
    );
    println!("   ✓ Validator registered: {}", &validator_id[..8]);

    println!("\n2. Assigning extraction tasks...");

    let primary_task = monitor.assign_task(
        &primary_id,
        "Extract pages 6-50 (primary schematics)".to_string(),
        "page_extraction".to_string(),
        TaskPriority::High,
        Some((6..=50).collect()),
        None,
    )?;
    println!("   ✓ Task assigned to Primary: pages 6-50");

    let secondary_task = monitor.assign_task(
        &secondary_id,
        "Extract pages 51-100 (secondary circuits)".to_string(),
        "page_extraction".to_string(),
        TaskPriority::Normal,
        Some((51..=100).collect()),
        None,
    )?;
    println!("   ✓ Task assigned to Secondary: pages 51-100");

    let validation_task = monitor.assign_task(
        &validator_id,
        "Validate extracted data".to_string(),
        "validation".to_string(),
        TaskPriority::Normal,
        None,
        None,
    )?;
    println!("   ✓ Task assigned to Validator: data validation");

    println!("\n3. Running extraction workflow...");

    monitor.update_agent_status(
        &primary_id,
        AgentStatus::Running,
        Some("Initializing extraction client".to_string()),
    )?;
    monitor.update_task_status(&primary_task, AgentStatus::Running, None)?;

    for progress in [0.2, 0.4, 0.6, 0.8, 1.0] {
        thread::sleep(Duration::from_millis(500));
        let pages_done = 6 + (45.0 * progress) as u32;
        monitor.update_task_progress(&primary_task, progress, Some((6..pages_done).collect()))?;
        monitor.heartbeat(&primary_id, Some(primary_task.clone()))?;
        println!("   Primary progress: {:.0}%", progress * 100.0);
    }

    monitor.update_task_status(&primary_task, AgentStatus::Completed, None)?;
    monitor.update_agent_status(
        &primary_id,
        AgentStatus::Completed,
        Some("Extraction finished".to_string()),
    )?;
    println!("   ✓ Primary extractor completed");

    monitor.update_agent_status(
        &secondary_id,
        AgentStatus::Running,
        Some("Processing secondary pages".to_string()),
    )?;
    monitor.update_task_status(&secondary_task, AgentStatus::Running, None)?;

    for progress in [0.3, 0.7, 1.0] {
        thread::sleep(Duration::from_millis(500));
        let pages_done = 51 + (50.0 * progress) as u32;
        monitor.update_task_progress(
            &secondary_task,
            progress,
            Some((51..pages_done).collect()),
        )?;
        monitor.heartbeat(&secondary_id, Some(secondary_task.clone()))?;
        println!("   Secondary progress: {:.0}%", progress * 100.0);
    }

    monitor.update_task_status(&secondary_task, AgentStatus::Completed, None)?;
    monitor.update_agent_status(
        &secondary_id,
        AgentStatus::Completed,
        Some("Extraction finished".to_string()),
    )?;
    println!("   ✓ Secondary extractor completed");

    monitor.update_agent_status(
        &validator_id,
        AgentStatus::Running,
        Some("Validating extracted data".to_string()),
    )?;
    monitor.update_task_status(&validation_task, AgentStatus::Running, None)?;
    thread::sleep(Duration::from_secs(1));
    monitor.update_task_progress(&validation_task, 1.0, None)?;
    monitor.update_task_status(&validation_task, AgentStatus::Completed, None)?;
    monitor.update_agent_status(
        &validator_id,
        AgentStatus::Completed,
        Some("Validation passed".to_string()),
    )?;
    println!("   ✓ Validator completed");

    println!("\n4. Final summary");
    let summary = monitor.get_overall_summary();
    println!("   Total agents: {}", summary.total_agents);
    println!("   Total tasks: {}", summary.total_tasks);
    println!(
        "   Completed tasks: {}",
        summary.tasks_by_status[&AgentStatus::Completed]
    );
    println!(
        "   Overall progress: {:.1}%",
        summary.overall_progress * 100.0
    );

    println!("\n5. Checking for incomplete work...");
    let incomplete = monitor.get_incomplete_tasks();
    if incomplete.is_empty() {
        println!("   ✓ All tasks completed");
    } else {
        println!("   ⚠ {} tasks still in progress", incomplete.len());
        for task in &incomplete {
            println!("      - {}: {}", task.description, task.status);
        }
    }

    println!("\n{}", "=".repeat(70));
    println!("Workflow complete. Dashboard: http://localhost:8080/api/monitor/summary");
    println!("{}", "=".repeat(70));

    Ok(())
}
