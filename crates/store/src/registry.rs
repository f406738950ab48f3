//! Per-user package registry.
//!
//! Every package a user installs is remembered here and re-provisioned into
//! each worker environment they start, so a target never loses a dependency
//! between restarts.

use std::collections::HashMap;

use tokio::sync::RwLock;

/// Username -> installed packages, in install order.
#[derive(Debug)]
pub struct PackageRegistry {
    packages: RwLock<HashMap<String, Vec<String>>>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self { packages: RwLock::new(HashMap::new()) }
    }

    /// Record a package for the user. Recording the same package twice is a
    /// no-op; order of first installs is preserved.
    pub async fn record(&self, username: &str, package: &str) {
        let mut packages = self.packages.write().await;
        let list = packages.entry(username.to_string()).or_default();
        if !list.iter().any(|p| p == package) {
            list.push(package.to_string());
        }
    }

    /// Packages the user has installed, in install order.
    pub async fn list(&self, username: &str) -> Vec<String> {
        self.packages
            .read()
            .await
            .get(username)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget a package. Returns whether it was present.
    pub async fn remove(&self, username: &str, package: &str) -> bool {
        let mut packages = self.packages.write().await;
        match packages.get_mut(username) {
            Some(list) => {
                let before = list.len();
                list.retain(|p| p != package);
                list.len() < before
            }
            None => false,
        }
    }
}

impl Default for PackageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_dedupe_and_keep_order() {
        let registry = PackageRegistry::new();
        registry.record("alice", "httpx").await;
        registry.record("alice", "rich").await;
        registry.record("alice", "httpx").await;

        assert_eq!(registry.list("alice").await, ["httpx", "rich"]);
        assert!(registry.list("bob").await.is_empty());
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let registry = PackageRegistry::new();
        registry.record("alice", "httpx").await;

        assert!(registry.remove("alice", "httpx").await);
        assert!(!registry.remove("alice", "httpx").await);
        assert!(!registry.remove("bob", "httpx").await);
    }
}
