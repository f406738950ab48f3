pub mod capability;
pub mod check;
pub mod export;
pub mod run_cmd;
pub mod status;

use std::sync::Arc;

use capforge_config::AppConfig;
use capforge_runtime::{LifecycleOrchestrator, RuntimeOptions, UvProvisioner};
use capforge_store::InMemoryStore;

/// Build an orchestrator from the app config and a hydrated store.
pub(crate) fn orchestrator(config: &AppConfig, store: Arc<InMemoryStore>) -> LifecycleOrchestrator {
    let options = RuntimeOptions {
        workers_dir: config.workers_dir.clone(),
        worker_command: config.worker_command.clone(),
        crash_window: config.crash_window(),
        bootstrap_packages: config.runtime.bootstrap_packages.clone(),
    };
    LifecycleOrchestrator::new(options, store, Arc::new(UvProvisioner::new()))
}
