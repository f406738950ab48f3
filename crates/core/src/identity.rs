//! Caller identity, resolved by the authentication gate before the core is
//! entered. The core trusts it without re-verifying.

use serde::{Deserialize, Serialize};

/// The identity attached to every core call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,

    /// Admins may act on any fragment or target.
    #[serde(default)]
    pub is_admin: bool,
}

impl Identity {
    pub fn user(username: &str) -> Self {
        Self { username: username.into(), is_admin: false }
    }

    pub fn admin(username: &str) -> Self {
        Self { username: username.into(), is_admin: true }
    }

    /// Ownership check: admins pass unconditionally.
    pub fn may_act_on(&self, owner: &str) -> bool {
        self.is_admin || self.username == owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_may_act() {
        let alice = Identity::user("alice");
        assert!(alice.may_act_on("alice"));
        assert!(!alice.may_act_on("bob"));
    }

    #[test]
    fn admin_may_act_on_anyone() {
        let root = Identity::admin("root");
        assert!(root.may_act_on("alice"));
        assert!(root.may_act_on("bob"));
    }
}
