//! `nestctl routine ...` handlers.

use nest_core::{NestEngine, Result, RoutineItem};

/// Routines live on the server; locally only the action count matters.
fn routine_with_actions(routine_id: &str, actions: usize) -> RoutineItem {
    RoutineItem::new(
        routine_id,
        routine_id,
        "cli",
        (0..actions).map(|i| format!("action {}", i)).collect(),
    )
}

pub fn check(engine: &NestEngine, routine_id: &str, index: usize) -> bool {
    engine.completions().is_completed(routine_id, index)
}

pub fn set(engine: &NestEngine, routine_id: &str, index: usize, completed: bool) -> Result<()> {
    engine
        .completions()
        .set_completed(routine_id, index, completed)?;
    tracing::info!(routine_id, index, completed, "Set action completion");
    Ok(())
}

pub fn toggle(engine: &NestEngine, routine_id: &str, index: usize) -> Result<bool> {
    let completed = engine.completions().toggle_completed(routine_id, index)?;
    tracing::info!(routine_id, index, completed, "Toggled action completion");
    Ok(completed)
}

pub fn progress(engine: &NestEngine, routine_id: &str, actions: usize) -> serde_json::Value {
    let routine = routine_with_actions(routine_id, actions);
    let progress = engine.completions().routine_progress(&routine);
    serde_json::json!({
        "routineId": routine_id,
        "completed": progress.completed,
        "total": progress.total,
        "percentage": progress.percentage(),
        "isComplete": progress.is_complete(),
    })
}

pub fn reset(engine: &NestEngine, routine_id: &str, actions: usize) -> Result<()> {
    engine
        .completions()
        .reset_routine(&routine_with_actions(routine_id, actions))
}
