pub mod analyze;
pub mod config;

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;
use taskpulse_core::{AnalyticsEngine, EngineConfig, Snapshot};

/// Input shared by every analysis command.
#[derive(Args)]
pub struct SnapshotArgs {
    /// Snapshot JSON file, or "-" for stdin
    #[arg(long, default_value = "-")]
    pub snapshot: PathBuf,
    /// Engine config TOML; defaults apply when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl SnapshotArgs {
    pub fn load(&self) -> Result<(AnalyticsEngine, Snapshot), Box<dyn std::error::Error>> {
        let config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        let engine = AnalyticsEngine::new(config)?;
        let snapshot = read_snapshot(&self.snapshot)?;
        tracing::debug!(
            tasks = snapshot.tasks.len(),
            entries = snapshot.time_entries.len(),
            members = snapshot.members.len(),
            "loaded snapshot"
        );
        Ok((engine, snapshot))
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot, Box<dyn std::error::Error>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read snapshot {}: {e}", path.display()))?
    };
    Ok(serde_json::from_str(&content)?)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
