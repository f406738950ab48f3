//! In-memory backend — fragments and build targets in Vecs, preserving
//! insertion order, which is also the assembly order within a kind.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use capforge_core::error::StoreError;
use capforge_core::fragment::{Fragment, FragmentKind, Param};
use capforge_core::identity::Identity;
use capforge_core::store::FragmentStore;
use capforge_core::target::BuildTarget;

use crate::registry::PackageRegistry;

/// Input for creating a fragment. The id, owner, and timestamps are filled
/// in by the store.
///
/// The body is stored verbatim. Callers synthesizing it themselves must keep
/// the header in step with `is_async` (see `capforge_assembly::skeleton`).
#[derive(Debug, Clone, Deserialize)]
pub struct NewFragment {
    pub kind: FragmentKind,
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    pub body: String,
    #[serde(default)]
    pub is_async: bool,
}

/// Partial update of a fragment. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FragmentPatch {
    pub name: Option<String>,
    pub params: Option<Vec<Param>>,
    pub body: Option<String>,
    pub is_async: Option<bool>,
}

/// Partial update of a build target. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub imports: Option<Vec<String>>,
    pub globals: Option<BTreeMap<String, serde_json::Value>>,
}

/// Input for creating a build target.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTarget {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub globals: BTreeMap<String, serde_json::Value>,
}

/// An in-memory store holding fragments, targets, and the per-user package
/// registry. Useful for testing and single-process deployments.
#[derive(Debug)]
pub struct InMemoryStore {
    fragments: RwLock<Vec<Fragment>>,
    targets: RwLock<Vec<BuildTarget>>,
    packages: PackageRegistry,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            fragments: RwLock::new(Vec::new()),
            targets: RwLock::new(Vec::new()),
            packages: PackageRegistry::new(),
        }
    }

    pub fn packages(&self) -> &PackageRegistry {
        &self.packages
    }

    /// Hydrate a fully-formed fragment (id and owner already assigned), as
    /// when loading a project file.
    pub async fn insert_fragment(&self, fragment: Fragment) {
        self.fragments.write().await.push(fragment);
    }

    /// Hydrate a fully-formed build target.
    pub async fn insert_target(&self, target: BuildTarget) {
        self.targets.write().await.push(target);
    }

    // ---- fragments ----

    pub async fn create_fragment(
        &self,
        identity: &Identity,
        new: NewFragment,
    ) -> Result<Fragment, StoreError> {
        let fragment = Fragment {
            id: Uuid::new_v4().to_string(),
            kind: new.kind,
            name: new.name,
            params: new.params,
            body: new.body,
            is_async: new.is_async,
            linked_targets: Vec::new(),
            owner: identity.username.clone(),
            created_at: Utc::now(),
        };
        self.fragments.write().await.push(fragment.clone());
        Ok(fragment)
    }

    pub async fn get_fragment(&self, id: &str) -> Result<Fragment, StoreError> {
        self.fragments
            .read()
            .await
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { entity: "fragment".into(), id: id.into() })
    }

    /// Fragments visible to the caller: their own, or everything for admins.
    pub async fn list_fragments(&self, identity: &Identity) -> Vec<Fragment> {
        self.fragments
            .read()
            .await
            .iter()
            .filter(|f| identity.may_act_on(&f.owner))
            .cloned()
            .collect()
    }

    pub async fn update_fragment(
        &self,
        identity: &Identity,
        id: &str,
        patch: FragmentPatch,
    ) -> Result<Fragment, StoreError> {
        let mut fragments = self.fragments.write().await;
        let fragment = fragments
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| StoreError::NotFound { entity: "fragment".into(), id: id.into() })?;
        if !identity.may_act_on(&fragment.owner) {
            return Err(StoreError::Forbidden(format!(
                "fragment {id} is owned by {}",
                fragment.owner
            )));
        }
        if let Some(name) = patch.name {
            fragment.name = name;
        }
        if let Some(params) = patch.params {
            fragment.params = params;
        }
        if let Some(body) = patch.body {
            fragment.body = body;
        }
        if let Some(is_async) = patch.is_async {
            fragment.is_async = is_async;
        }
        Ok(fragment.clone())
    }

    pub async fn delete_fragment(&self, identity: &Identity, id: &str) -> Result<(), StoreError> {
        let mut fragments = self.fragments.write().await;
        let index = fragments
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| StoreError::NotFound { entity: "fragment".into(), id: id.into() })?;
        if !identity.may_act_on(&fragments[index].owner) {
            return Err(StoreError::Forbidden(format!(
                "fragment {id} is owned by {}",
                fragments[index].owner
            )));
        }
        fragments.remove(index);
        Ok(())
    }

    /// Link a fragment into a build target. Within one target, fragment
    /// names must be unique per kind.
    pub async fn link(
        &self,
        identity: &Identity,
        fragment_id: &str,
        target_id: &str,
    ) -> Result<(), StoreError> {
        // Target must exist before anything is mutated.
        let _ = self.find_target(target_id).await?;

        let mut fragments = self.fragments.write().await;
        let (kind, name) = {
            let fragment = fragments
                .iter()
                .find(|f| f.id == fragment_id)
                .ok_or_else(|| StoreError::NotFound {
                    entity: "fragment".into(),
                    id: fragment_id.into(),
                })?;
            if !identity.may_act_on(&fragment.owner) {
                return Err(StoreError::Forbidden(format!(
                    "fragment {fragment_id} is owned by {}",
                    fragment.owner
                )));
            }
            (fragment.kind, fragment.name.clone())
        };

        let conflict = fragments.iter().any(|f| {
            f.id != fragment_id
                && f.kind == kind
                && f.name == name
                && f.is_linked_to(target_id)
        });
        if conflict {
            return Err(StoreError::Storage(format!(
                "a {kind} named '{name}' is already linked to target {target_id}"
            )));
        }

        let fragment = fragments
            .iter_mut()
            .find(|f| f.id == fragment_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "fragment".into(),
                id: fragment_id.into(),
            })?;
        if !fragment.is_linked_to(target_id) {
            fragment.linked_targets.push(target_id.to_string());
        }
        Ok(())
    }

    pub async fn unlink(
        &self,
        identity: &Identity,
        fragment_id: &str,
        target_id: &str,
    ) -> Result<(), StoreError> {
        let mut fragments = self.fragments.write().await;
        let fragment = fragments
            .iter_mut()
            .find(|f| f.id == fragment_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "fragment".into(),
                id: fragment_id.into(),
            })?;
        if !identity.may_act_on(&fragment.owner) {
            return Err(StoreError::Forbidden(format!(
                "fragment {fragment_id} is owned by {}",
                fragment.owner
            )));
        }
        fragment.linked_targets.retain(|t| t != target_id);
        Ok(())
    }

    // ---- build targets ----

    pub async fn create_target(
        &self,
        identity: &Identity,
        new: NewTarget,
    ) -> Result<BuildTarget, StoreError> {
        let target = BuildTarget {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            description: new.description,
            imports: new.imports,
            globals: new.globals,
            owner: identity.username.clone(),
            created_at: Utc::now(),
        };
        self.targets.write().await.push(target.clone());
        Ok(target)
    }

    pub async fn list_targets(&self, identity: &Identity) -> Vec<BuildTarget> {
        self.targets
            .read()
            .await
            .iter()
            .filter(|t| identity.may_act_on(&t.owner))
            .cloned()
            .collect()
    }

    pub async fn update_target(
        &self,
        identity: &Identity,
        id: &str,
        patch: TargetPatch,
    ) -> Result<BuildTarget, StoreError> {
        let mut targets = self.targets.write().await;
        let target = targets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound { entity: "target".into(), id: id.into() })?;
        if !identity.may_act_on(&target.owner) {
            return Err(StoreError::Forbidden(format!(
                "target {id} is owned by {}",
                target.owner
            )));
        }
        if let Some(name) = patch.name {
            target.name = name;
        }
        if let Some(description) = patch.description {
            target.description = description;
        }
        if let Some(imports) = patch.imports {
            target.imports = imports;
        }
        if let Some(globals) = patch.globals {
            target.globals = globals;
        }
        Ok(target.clone())
    }

    /// Delete a target and unlink every fragment that referenced it.
    pub async fn delete_target(&self, identity: &Identity, id: &str) -> Result<(), StoreError> {
        let mut targets = self.targets.write().await;
        let index = targets
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound { entity: "target".into(), id: id.into() })?;
        if !identity.may_act_on(&targets[index].owner) {
            return Err(StoreError::Forbidden(format!(
                "target {id} is owned by {}",
                targets[index].owner
            )));
        }
        targets.remove(index);
        drop(targets);

        let mut fragments = self.fragments.write().await;
        for fragment in fragments.iter_mut() {
            fragment.linked_targets.retain(|t| t != id);
        }
        Ok(())
    }

    async fn find_target(&self, id: &str) -> Result<BuildTarget, StoreError> {
        self.targets
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound { entity: "target".into(), id: id.into() })
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FragmentStore for InMemoryStore {
    async fn get_target(&self, target_id: &str) -> Result<BuildTarget, StoreError> {
        self.find_target(target_id).await
    }

    async fn fetch_linked(
        &self,
        target_id: &str,
        kind: FragmentKind,
    ) -> Result<Vec<Fragment>, StoreError> {
        Ok(self
            .fragments
            .read()
            .await
            .iter()
            .filter(|f| f.kind == kind && f.is_linked_to(target_id))
            .cloned()
            .collect())
    }

    async fn installed_packages(&self, username: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.packages.list(username).await)
    }
}
