//! On-disk layout for per-target worker directories.
//!
//! Pure path math; all filesystem side effects live in `capforge-runtime`.
//! The runtime and the bridge must agree on these paths, so they are defined
//! once here.

use std::path::{Path, PathBuf};

/// Resolves per-target paths under a single workers root.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The working directory for one build target.
    pub fn target_dir(&self, target_id: &str) -> PathBuf {
        self.root.join(format!("worker_{target_id}"))
    }

    /// The generated worker source inside the target directory.
    pub fn source_file(&self, target_id: &str) -> PathBuf {
        self.target_dir(target_id).join(format!("worker_{target_id}.py"))
    }

    /// File name of the generated source, relative to the target directory.
    pub fn source_file_name(&self, target_id: &str) -> String {
        format!("worker_{target_id}.py")
    }
}
