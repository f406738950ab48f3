//! Dependency provisioning via `uv`.
//!
//! Each worker directory is an isolated uv project; `ensure` creates its
//! virtual environment on first use and installs one package at a time.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use capforge_core::error::RuntimeError;
use capforge_core::store::Provisioner;

/// Installs packages into a per-target environment with `uv`.
pub struct UvProvisioner {
    program: String,
}

impl UvProvisioner {
    pub fn new() -> Self {
        Self { program: "uv".into() }
    }

    /// Override the uv binary (e.g. an absolute path).
    pub fn with_program(program: &str) -> Self {
        Self { program: program.into() }
    }

    async fn run(&self, env_path: &Path, args: &[&str], package: &str) -> Result<(), RuntimeError> {
        let to_provision_err = |reason: String| RuntimeError::Provision {
            package: package.to_string(),
            reason,
        };

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(env_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| to_provision_err(format!("{} failed to launch: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(package = %package, exit = ?output.status.code(), "Provisioning command failed");
            return Err(to_provision_err(stderr.trim().to_string()));
        }
        Ok(())
    }
}

impl Default for UvProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provisioner for UvProvisioner {
    async fn ensure(&self, env_path: &Path, package: &str) -> Result<(), RuntimeError> {
        if !env_path.join(".venv").exists() {
            debug!(path = %env_path.display(), "Creating worker virtual environment");
            self.run(env_path, &["venv"], package).await?;
        }

        debug!(package = %package, "Installing package into worker environment");
        self.run(env_path, &["pip", "install", package], package).await
    }
}
