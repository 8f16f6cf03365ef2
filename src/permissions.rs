//! In-memory permission store.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::host::PermissionStore;
use crate::models::PlayerId;

#[derive(Debug, Default)]
pub struct Permissions {
    registered: RwLock<HashSet<String>>,
    grants: RwLock<HashMap<PlayerId, HashSet<String>>>,
}

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registered
            .read()
            .expect("permission lock poisoned")
            .contains(name)
    }

    /// Grants a registered permission. Unknown names are refused.
    pub fn grant(&self, player: PlayerId, name: &str) -> bool {
        if !self.is_registered(name) {
            tracing::warn!("Refusing to grant unregistered permission '{}'", name);
            return false;
        }
        self.grants
            .write()
            .expect("permission lock poisoned")
            .entry(player)
            .or_default()
            .insert(name.to_string())
    }

    pub fn revoke(&self, player: PlayerId, name: &str) -> bool {
        self.grants
            .write()
            .expect("permission lock poisoned")
            .get_mut(&player)
            .is_some_and(|set| set.remove(name))
    }
}

impl PermissionStore for Permissions {
    fn register_permission(&self, name: &str) {
        self.registered
            .write()
            .expect("permission lock poisoned")
            .insert(name.to_string());
    }

    fn has_permission(&self, player: PlayerId, name: &str) -> bool {
        self.grants
            .read()
            .expect("permission lock poisoned")
            .get(&player)
            .is_some_and(|set| set.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_requires_registration() {
        let perms = Permissions::new();
        assert!(!perms.grant(PlayerId(1), "quarrylock.admin"));
        perms.register_permission("quarrylock.admin");
        assert!(perms.grant(PlayerId(1), "quarrylock.admin"));
        assert!(perms.has_permission(PlayerId(1), "quarrylock.admin"));
        assert!(!perms.has_permission(PlayerId(2), "quarrylock.admin"));
    }

    #[test]
    fn revoke_removes_grant() {
        let perms = Permissions::new();
        perms.register_permission("quarrylock.admin");
        perms.grant(PlayerId(1), "quarrylock.admin");
        assert!(perms.revoke(PlayerId(1), "quarrylock.admin"));
        assert!(!perms.has_permission(PlayerId(1), "quarrylock.admin"));
    }
}
