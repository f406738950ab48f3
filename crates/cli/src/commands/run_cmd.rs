//! `capforge run` — Run a target's worker in the foreground until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use capforge_assembly::assemble_target;
use capforge_config::AppConfig;
use capforge_runtime::StartOutcome;
use tracing::info;

use crate::project::ProjectFile;

pub async fn run(project: PathBuf, target: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let (store, identity) = ProjectFile::load(&project)?.hydrate().await?;
    let store = Arc::new(store);

    let source = assemble_target(store.as_ref(), &target).await?;
    let orchestrator = super::orchestrator(&config, store);

    match orchestrator.start(&target, &source, &identity).await? {
        StartOutcome::Started { pid } => {
            info!(target_id = %target, pid, "Worker started");
            println!("🚀 Worker for '{target}' running (pid {pid}). Press Ctrl-C to stop.");
        }
        StartOutcome::SpawnFailed { exit_code, diagnostics } => {
            println!("❌ Worker exited during the crash window (exit code {exit_code:?})");
            if !diagnostics.is_empty() {
                println!("{diagnostics}");
            }
            return Err(format!("target '{target}' failed to start").into());
        }
    }

    tokio::signal::ctrl_c().await?;
    println!("\nStopping '{target}'...");
    orchestrator.stop(&target).await?;
    println!("Stopped.");
    Ok(())
}
