//! Project files — declarative JSON descriptions of fragments, build
//! targets, and packages, loaded into an in-memory store for one CLI run.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use capforge_assembly::{render_skeleton, SkeletonSpec};
use capforge_core::fragment::{Fragment, FragmentKind, Param};
use capforge_core::identity::Identity;
use capforge_core::target::BuildTarget;
use capforge_store::InMemoryStore;

#[derive(Debug, Deserialize)]
pub struct ProjectFile {
    /// Identity that owns everything in the file.
    pub owner: String,

    /// Packages provisioned into every worker environment, on top of the
    /// bootstrap set.
    #[serde(default)]
    pub packages: Vec<String>,

    #[serde(default)]
    pub targets: Vec<ProjectTarget>,

    #[serde(default)]
    pub fragments: Vec<ProjectFragment>,
}

/// Targets carry explicit ids so worker directories stay stable across runs.
#[derive(Debug, Deserialize)]
pub struct ProjectTarget {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub globals: BTreeMap<String, Value>,
}

/// A fragment is authored either as a full `body` (decorator, header, code)
/// or as a bare `snippet`, in which case the skeleton is synthesized and the
/// header honors `is_async`.
#[derive(Debug, Deserialize)]
pub struct ProjectFragment {
    pub kind: FragmentKind,
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub is_async: bool,
    /// Decorator URI for resources authored as snippets.
    #[serde(default)]
    pub resource_uri: Option<String>,
    /// Target ids this fragment is linked into.
    #[serde(default)]
    pub targets: Vec<String>,
}

impl ProjectFile {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read project file {}: {e}", path.display()))?;
        let project: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse project file {}: {e}", path.display()))?;
        Ok(project)
    }

    /// Build a store holding the file's contents plus the owning identity.
    pub async fn hydrate(
        self,
    ) -> Result<(InMemoryStore, Identity), Box<dyn std::error::Error>> {
        let identity = Identity::user(&self.owner);
        let store = InMemoryStore::new();
        let now = Utc::now();

        for target in self.targets {
            store
                .insert_target(BuildTarget {
                    id: target.id,
                    name: target.name,
                    description: target.description,
                    imports: target.imports,
                    globals: target.globals,
                    owner: identity.username.clone(),
                    created_at: now,
                })
                .await;
        }

        for fragment in self.fragments {
            let body = match (fragment.body, fragment.snippet) {
                (Some(body), _) => body,
                (None, Some(snippet)) => render_skeleton(&SkeletonSpec {
                    kind: fragment.kind,
                    name: &fragment.name,
                    params: &fragment.params,
                    snippet: &snippet,
                    is_async: fragment.is_async,
                    resource_uri: fragment.resource_uri.as_deref(),
                }),
                (None, None) => {
                    return Err(format!(
                        "fragment '{}' needs either a body or a snippet",
                        fragment.name
                    )
                    .into());
                }
            };
            store
                .insert_fragment(Fragment {
                    id: Uuid::new_v4().to_string(),
                    kind: fragment.kind,
                    name: fragment.name,
                    params: fragment.params,
                    body,
                    is_async: fragment.is_async,
                    linked_targets: fragment.targets,
                    owner: identity.username.clone(),
                    created_at: now,
                })
                .await;
        }

        for package in &self.packages {
            store.packages().record(&identity.username, package).await;
        }

        Ok((store, identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capforge_core::store::FragmentStore;

    const PROJECT: &str = r#"{
        "owner": "alice",
        "packages": ["httpx"],
        "targets": [
            {"id": "calc", "name": "calculator", "imports": ["import math"]}
        ],
        "fragments": [
            {
                "kind": "tool",
                "name": "add_numbers",
                "params": [{"name": "a", "type": "int"}, {"name": "b", "type": "int"}],
                "body": "@mcp.tool()\ndef add_numbers(a: int, b: int):\n    return a + b\n",
                "targets": ["calc"]
            }
        ]
    }"#;

    #[tokio::test]
    async fn project_hydrates_into_a_store() {
        let project: ProjectFile = serde_json::from_str(PROJECT).unwrap();
        let (store, identity) = project.hydrate().await.unwrap();

        assert_eq!(identity.username, "alice");
        let target = store.get_target("calc").await.unwrap();
        assert_eq!(target.name, "calculator");

        let tools = store.fetch_linked("calc", FragmentKind::Tool).await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "add_numbers");

        assert_eq!(store.installed_packages("alice").await.unwrap(), ["httpx"]);
    }

    #[tokio::test]
    async fn snippet_fragments_get_a_synthesized_skeleton() {
        let project: ProjectFile = serde_json::from_str(
            r#"{
                "owner": "alice",
                "targets": [{"id": "calc", "name": "calculator"}],
                "fragments": [
                    {
                        "kind": "tool",
                        "name": "fetch_page",
                        "params": [{"name": "url", "type": "str"}],
                        "snippet": "return await client.get(url)",
                        "is_async": true,
                        "targets": ["calc"]
                    }
                ]
            }"#,
        )
        .unwrap();
        let (store, _identity) = project.hydrate().await.unwrap();

        let tools = store.fetch_linked("calc", FragmentKind::Tool).await.unwrap();
        assert!(tools[0].body.contains("async def fetch_page(url: str)"));
        assert!(tools[0].body.starts_with("@mcp.tool()\n"));
    }

    #[tokio::test]
    async fn fragment_without_body_or_snippet_is_rejected() {
        let project: ProjectFile = serde_json::from_str(
            r#"{
                "owner": "alice",
                "fragments": [{"kind": "tool", "name": "empty"}]
            }"#,
        )
        .unwrap();
        let err = project.hydrate().await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
