use taskpulse_core::Validated;

use super::{print_json, SnapshotArgs};

pub fn metrics(input: &SnapshotArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (engine, snapshot) = input.load()?;
    let metrics = engine.compute_metrics(&snapshot.tasks, &snapshot.time_entries);
    print_json(&metrics)
}

pub fn insights(input: &SnapshotArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (engine, snapshot) = input.load()?;
    let insights = engine.generate_insights(
        &snapshot.tasks,
        &snapshot.time_entries,
        &snapshot.preferences,
        snapshot.advisory.as_ref(),
    );
    print_json(&insights)
}

pub fn team(input: &SnapshotArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (engine, snapshot) = input.load()?;
    if snapshot.members.is_empty() {
        return Err("snapshot lists no team members".into());
    }
    let team = engine.aggregate_team(&snapshot.tasks, &snapshot.time_entries, &snapshot.members);
    print_json(&team)
}

pub fn predict(input: &SnapshotArgs, task_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (engine, snapshot) = input.load()?;
    let task = snapshot
        .tasks
        .iter()
        .find(|t| t.id == task_id)
        .ok_or_else(|| format!("task not found: {task_id}"))?;
    let prediction = engine.predict(task, &snapshot.tasks, snapshot.advisory.as_ref());
    print_json(&prediction)
}

pub fn recommend(input: &SnapshotArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (engine, snapshot) = input.load()?;
    let report = engine.report(&snapshot);
    print_json(&Validated::new(report.recommendations, report.warnings))
}

pub fn report(input: &SnapshotArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (engine, snapshot) = input.load()?;
    print_json(&engine.report(&snapshot))
}
