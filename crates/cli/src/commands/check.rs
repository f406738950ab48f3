//! `capforge check` — Smoke-test a target: start its worker, report the
//! crash-window verdict, and stop it again.

use std::path::PathBuf;
use std::sync::Arc;

use capforge_assembly::assemble_target;
use capforge_config::AppConfig;
use capforge_runtime::{StartOutcome, StopOutcome};

use crate::project::ProjectFile;

pub async fn run(project: PathBuf, target: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let (store, identity) = ProjectFile::load(&project)?.hydrate().await?;
    let store = Arc::new(store);

    let source = assemble_target(store.as_ref(), &target).await?;
    let orchestrator = super::orchestrator(&config, store);

    println!("🔎 Checking target '{target}' ({}s crash window)...", config.runtime.crash_window_secs);
    match orchestrator.start(&target, &source, &identity).await? {
        StartOutcome::Started { pid } => {
            println!("  ✅ Worker survived the crash window (pid {pid})");
            match orchestrator.stop(&target).await? {
                StopOutcome::Stopped { env_cleaned, .. } => {
                    println!("  Stopped; environment cleaned: {env_cleaned}");
                }
                StopOutcome::AlreadyInactive { state } => {
                    println!("  Worker already inactive ({state})");
                }
            }
            Ok(())
        }
        StartOutcome::SpawnFailed { exit_code, diagnostics } => {
            println!("  ❌ Worker exited during the crash window (exit code {exit_code:?})");
            if !diagnostics.is_empty() {
                println!("  Diagnostics:");
                for line in diagnostics.lines() {
                    println!("    {line}");
                }
            }
            Err(format!("target '{target}' failed its start check").into())
        }
    }
}
