//! `capforge export` — Assemble a build target and write its worker source.

use std::path::PathBuf;

use capforge_assembly::assemble_target;
use capforge_config::AppConfig;
use capforge_runtime::Workdir;

use crate::project::ProjectFile;

pub async fn run(project: PathBuf, target: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let (store, _identity) = ProjectFile::load(&project)?.hydrate().await?;

    let source = assemble_target(&store, &target).await?;
    let workdir = Workdir::new(config.workers_dir.clone());
    let dir = workdir.materialize(&target, &source).await?;

    println!("📦 Exported target '{target}'");
    println!("  Directory: {}", dir.display());
    println!("  Source:    {} lines", source.lines().count());
    Ok(())
}
