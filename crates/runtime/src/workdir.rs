//! Per-target working directory materialization and cleanup.

use std::path::PathBuf;

use capforge_core::error::RuntimeError;
use capforge_core::workspace::WorkspaceLayout;
use tracing::{debug, warn};

/// Minimal project manifest written into every worker directory so `uv`
/// treats it as an isolated project.
const PYPROJECT: &str = "[project]\nname = \"capforge_worker\"\nversion = \"0.1.0\"\n";

/// Filesystem side of the orchestrator: owns a workers root and materializes
/// one directory per target.
#[derive(Debug, Clone)]
pub struct Workdir {
    layout: WorkspaceLayout,
}

impl Workdir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { layout: WorkspaceLayout::new(root) }
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    /// Create the target directory, write the assembled source, and ensure
    /// a `pyproject.toml` exists. Returns the target directory path.
    pub async fn materialize(&self, target_id: &str, source: &str) -> Result<PathBuf, RuntimeError> {
        let dir = self.layout.target_dir(target_id);
        let to_workspace_err = |reason: String| RuntimeError::Workspace {
            target_id: target_id.to_string(),
            reason,
        };

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| to_workspace_err(format!("create {}: {e}", dir.display())))?;

        let source_path = self.layout.source_file(target_id);
        tokio::fs::write(&source_path, source)
            .await
            .map_err(|e| to_workspace_err(format!("write {}: {e}", source_path.display())))?;

        let pyproject = dir.join("pyproject.toml");
        if !pyproject.exists() {
            tokio::fs::write(&pyproject, PYPROJECT)
                .await
                .map_err(|e| to_workspace_err(format!("write {}: {e}", pyproject.display())))?;
        }

        debug!(target_id = %target_id, path = %source_path.display(), "Worker source written");
        Ok(dir)
    }

    /// Delete the target directory. Best-effort: failures are logged, never
    /// escalated. Returns whether the directory is absent afterwards.
    pub async fn remove(&self, target_id: &str) -> bool {
        let dir = self.layout.target_dir(target_id);
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(target_id = %target_id, error = %e, "Worker directory cleanup failed");
            }
        }
        !dir.exists()
    }

    /// Whether the generated source for this target exists on disk.
    pub fn is_exported(&self, target_id: &str) -> bool {
        self.layout.source_file(target_id).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn materialize_writes_source_and_manifest() {
        let root = tempfile::tempdir().unwrap();
        let workdir = Workdir::new(root.path());

        let dir = workdir.materialize("t1", "print('hi')\n").await.unwrap();
        assert!(dir.join("worker_t1.py").exists());
        assert!(dir.join("pyproject.toml").exists());
        assert!(workdir.is_exported("t1"));
    }

    #[tokio::test]
    async fn materialize_preserves_existing_manifest() {
        let root = tempfile::tempdir().unwrap();
        let workdir = Workdir::new(root.path());
        let dir = workdir.materialize("t1", "a\n").await.unwrap();

        tokio::fs::write(dir.join("pyproject.toml"), "custom").await.unwrap();
        workdir.materialize("t1", "b\n").await.unwrap();

        let manifest = tokio::fs::read_to_string(dir.join("pyproject.toml")).await.unwrap();
        assert_eq!(manifest, "custom");
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let workdir = Workdir::new(root.path());
        workdir.materialize("t1", "x\n").await.unwrap();

        assert!(workdir.remove("t1").await);
        assert!(!workdir.is_exported("t1"));
        // Second removal of an absent directory still reports clean.
        assert!(workdir.remove("t1").await);
    }
}
