//! Collaborator traits: the fragment store and the dependency provisioner.
//!
//! The core never touches storage or package tooling directly; it consumes
//! these seams. Implementations live in `capforge-store` and
//! `capforge-runtime`, or in test stubs.

use async_trait::async_trait;
use std::path::Path;

use crate::error::{RuntimeError, StoreError};
use crate::fragment::{Fragment, FragmentKind};
use crate::target::BuildTarget;

/// Supplies ordered fragment records per kind for a build target.
///
/// `fetch_linked` must return fragments in stable insertion order; the
/// assembly engine concatenates them exactly as returned.
#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Fetch the target's metadata.
    async fn get_target(&self, target_id: &str) -> Result<BuildTarget, StoreError>;

    /// Fetch all fragments of one kind linked to the target, in insertion
    /// order.
    async fn fetch_linked(
        &self,
        target_id: &str,
        kind: FragmentKind,
    ) -> Result<Vec<Fragment>, StoreError>;

    /// Packages the given identity has previously installed, to be
    /// re-provisioned into each worker environment.
    async fn installed_packages(&self, username: &str) -> Result<Vec<String>, StoreError>;
}

/// Installs named packages into an isolated environment.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Ensure the environment at `env_path` exists and contains `package`.
    async fn ensure(&self, env_path: &Path, package: &str) -> Result<(), RuntimeError>;
}
