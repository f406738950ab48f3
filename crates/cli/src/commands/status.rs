//! `capforge status` — Show exported targets under the workers directory.

use capforge_config::AppConfig;
use capforge_core::workspace::WorkspaceLayout;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let layout = WorkspaceLayout::new(config.workers_dir.clone());

    println!("🛠  CapForge Status");
    println!("==================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Workers dir:  {}", config.workers_dir.display());
    println!("  Worker cmd:   {}", config.worker_command.join(" "));
    println!("  Crash window: {}s", config.runtime.crash_window_secs);
    println!();

    if !config.workers_dir.exists() {
        println!("  No workers directory yet — run `capforge export` first");
        return Ok(());
    }

    let mut found = false;
    for entry in std::fs::read_dir(&config.workers_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(target_id) = name.to_string_lossy().strip_prefix("worker_").map(String::from)
        else {
            continue;
        };
        found = true;
        let exported = layout.source_file(&target_id).exists();
        let marker = if exported { "✅ exported" } else { "⚠️  missing source" };
        println!("  {target_id}: {marker}");
    }
    if !found {
        println!("  No exported targets");
    }
    Ok(())
}
