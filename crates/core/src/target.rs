//! Build targets — named compositions of fragments.
//!
//! A target's generated source is a pure function of (target metadata,
//! linked fragments' current state). It is never stored as independent
//! mutable truth; caching it is an optimization only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique build-target identifier.
pub type TargetId = String;

/// A named composition of capability fragments, compiled into one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildTarget {
    /// Unique target ID.
    pub id: TargetId,

    /// Worker name, passed to the capability-server initializer.
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Custom import statements emitted at the top of the worker source.
    #[serde(default)]
    pub imports: Vec<String>,

    /// Global variable name -> literal value. BTreeMap keeps assembly output
    /// byte-identical across runs.
    #[serde(default)]
    pub globals: BTreeMap<String, serde_json::Value>,

    /// Owning identity.
    pub owner: String,

    pub created_at: DateTime<Utc>,
}

impl BuildTarget {
    pub fn new(name: &str, owner: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            imports: Vec::new(),
            globals: BTreeMap::new(),
            owner: owner.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_target_has_unique_id() {
        let a = BuildTarget::new("weather", "alice");
        let b = BuildTarget::new("weather", "alice");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn globals_are_ordered() {
        let mut target = BuildTarget::new("t", "alice");
        target.globals.insert("zulu".into(), serde_json::json!(1));
        target.globals.insert("alpha".into(), serde_json::json!("x"));

        let keys: Vec<&String> = target.globals.keys().collect();
        assert_eq!(keys, vec!["alpha", "zulu"]);
    }

    #[test]
    fn serde_roundtrip() {
        let mut target = BuildTarget::new("demo", "bob");
        target.imports.push("import httpx".into());
        let json = serde_json::to_string(&target).unwrap();
        let back: BuildTarget = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "demo");
        assert_eq!(back.imports, vec!["import httpx"]);
    }
}
