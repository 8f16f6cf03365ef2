//! Contracts with the host server.
//!
//! The host owns entity creation, parenting, persistence, permissions and
//! chat. Everything here is consumed, never implemented, by the lock logic;
//! [`crate::world::World`] and [`crate::permissions::Permissions`] are the
//! in-process implementations used by the binary and the tests.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use uuid::Uuid;

use crate::geometry::{Transform, Vec3};
use crate::models::{Gate, PlayerId, Rig, SubComponent};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("entity {0} not found")]
    NotFound(Uuid),

    #[error("sub-component {0} already has a lock")]
    SlotOccupied(Uuid),
}

/// Entity lifecycle as exposed by the host.
///
/// Calls never suspend. Holding the host lock across a call sequence makes
/// that sequence atomic with respect to every other host event.
pub trait EntityHost: Send {
    fn rig(&self, id: Uuid) -> Option<&Rig>;

    fn sub_component(&self, id: Uuid) -> Option<&SubComponent>;

    fn gate(&self, id: Uuid) -> Option<&Gate>;

    fn gate_mut(&mut self, id: Uuid) -> Option<&mut Gate>;

    /// Every gate currently instantiated, in no particular order.
    fn gate_ids(&self) -> Vec<Uuid>;

    /// Spawns a gate at a world transform. `None` if the host refused.
    fn create_gate_at(&mut self, world: Transform) -> Option<Uuid>;

    /// Places a gate in a sub-component's lock slot at `local`.
    fn set_parent(&mut self, gate: Uuid, parent: Uuid, local: Transform) -> Result<(), HostError>;

    /// Empties the lock slot holding `gate` and resets its transform.
    fn clear_parent(&mut self, gate: Uuid) -> Result<(), HostError>;

    /// Permanently removes an entity. Returns `false` if it did not exist.
    fn destroy(&mut self, entity: Uuid) -> bool;

    fn mark_persistent(&mut self, entity: Uuid) -> Result<(), HostError>;

    fn send_to_actor(&mut self, player: PlayerId, text: &str);

    fn run_effect(&mut self, prefab: &str, position: Vec3);
}

/// The host handle shared between hooks and the reconciliation task.
pub type SharedHost = Arc<Mutex<dyn EntityHost>>;

/// Permission strings granted to players.
pub trait PermissionStore: Send + Sync {
    fn register_permission(&self, name: &str);

    fn has_permission(&self, player: PlayerId, name: &str) -> bool;
}
