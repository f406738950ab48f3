//! Capability fragments — the user-authored building blocks of a worker.
//!
//! A fragment is a named tool, resource, or prompt definition: a parameter
//! list plus a stored body (decorator, function header, and code). Fragments
//! can be linked into any number of build targets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::target::TargetId;

/// Unique fragment identifier.
pub type FragmentId = String;

/// The three capability kinds a worker can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Tool,
    Resource,
    Prompt,
}

impl FragmentKind {
    /// All kinds, in the order they are assembled into a worker source.
    pub const ASSEMBLY_ORDER: [FragmentKind; 3] =
        [FragmentKind::Resource, FragmentKind::Tool, FragmentKind::Prompt];

    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Tool => "tool",
            FragmentKind::Resource => "resource",
            FragmentKind::Prompt => "prompt",
        }
    }
}

impl std::fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FragmentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tool" => Ok(FragmentKind::Tool),
            "resource" => Ok(FragmentKind::Resource),
            "prompt" => Ok(FragmentKind::Prompt),
            other => Err(format!("unknown capability kind: {other}")),
        }
    }
}

/// A single declared parameter of a fragment's function.
///
/// Order matters: parameters are rendered exactly as declared, never
/// re-sorted (fragment authors control call-site compatibility).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name as it appears in the signature.
    pub name: String,

    /// Declared type annotation (e.g. "int", "str").
    #[serde(rename = "type")]
    pub ty: String,

    /// Optional default literal. Strings are re-quoted when rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl Param {
    pub fn new(name: &str, ty: &str) -> Self {
        Self { name: name.into(), ty: ty.into(), default: None }
    }

    pub fn with_default(name: &str, ty: &str, default: serde_json::Value) -> Self {
        Self { name: name.into(), ty: ty.into(), default: Some(default) }
    }
}

/// A user-authored capability fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    /// Unique fragment ID.
    pub id: FragmentId,

    /// Capability kind (tool, resource, prompt).
    pub kind: FragmentKind,

    /// Name, unique within a build target and kind.
    pub name: String,

    /// Ordered parameter list.
    #[serde(default)]
    pub params: Vec<Param>,

    /// Stored skeleton body: decorator line(s), function header, and code.
    /// Assembly rewrites only the header's parameter list.
    pub body: String,

    /// Whether the function is declared `async def` (tools only).
    #[serde(default)]
    pub is_async: bool,

    /// Build targets this fragment is linked into.
    #[serde(default)]
    pub linked_targets: Vec<TargetId>,

    /// Authoring identity. Owners (and admins) may patch/link/delete.
    pub owner: String,

    pub created_at: DateTime<Utc>,
}

impl Fragment {
    /// Whether this fragment is linked to the given build target.
    pub fn is_linked_to(&self, target_id: &str) -> bool {
        self.linked_targets.iter().any(|t| t == target_id)
    }
}
