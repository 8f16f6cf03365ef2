use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PlayerId;
use crate::geometry::Transform;

/// Prefab spawned for every gate.
pub const GATE_PREFAB: &str = "assets/prefabs/locks/keypad/lock.code.prefab";

/// A code lock attached to exactly one sub-component.
///
/// The gate's identity, code, whitelist and locked flag are preserved when it
/// is migrated to a recreated sub-component; only `parent` and `local` change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gate {
    pub id: Uuid,
    pub owner: Option<PlayerId>,
    /// Empty until a code is set.
    pub code: String,
    pub whitelist: BTreeSet<PlayerId>,
    pub locked: bool,
    pub parent: Option<Uuid>,
    /// Transform relative to the parent's rig.
    pub local: Transform,
    pub created_at: DateTime<Utc>,
}

impl Gate {
    pub fn new(id: Uuid, local: Transform) -> Self {
        Self {
            id,
            owner: None,
            code: String::new(),
            whitelist: BTreeSet::new(),
            locked: false,
            parent: None,
            local,
            created_at: Utc::now(),
        }
    }

    /// Adds a player to the whitelist. Returns `false` if already present.
    pub fn authorize(&mut self, player: PlayerId) -> bool {
        self.whitelist.insert(player)
    }

    pub fn is_authorized(&self, player: PlayerId) -> bool {
        self.whitelist.contains(&player)
    }

    /// Keypad entry. A correct code whitelists the player.
    pub fn enter_code(&mut self, player: PlayerId, code: &str) -> bool {
        if self.code.is_empty() || self.code != code {
            return false;
        }
        self.authorize(player);
        true
    }

    /// The lock's own open check: unlocked, whitelisted, or a correct code.
    pub fn attempt_open(&mut self, player: PlayerId, code: Option<&str>) -> bool {
        if !self.locked || self.is_authorized(player) {
            return true;
        }
        code.is_some_and(|code| self.enter_code(player, code))
    }
}
