//! Reference host: an in-process entity arena.
//!
//! Mirrors the host behaviours the lock logic has to survive. Most
//! importantly, [`World::restore`] recreates every rig's sub-components with
//! fresh identities and loads the persisted old ones as stubs, which is
//! exactly what a server restart does.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Transform, Vec3};
use crate::host::{EntityHost, HostError};
use crate::models::*;

/// A chat line delivered to a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub player: PlayerId,
    pub text: String,
}

/// A visual/audio effect played in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRecord {
    pub prefab: String,
    pub position: Vec3,
}

/// Everything the host saves across a restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub rigs: Vec<Rig>,
    /// Only sub-components marked persistent.
    pub components: Vec<SubComponent>,
    pub gates: Vec<Gate>,
}

#[derive(Debug, Default)]
pub struct World {
    rigs: HashMap<Uuid, Rig>,
    components: HashMap<Uuid, SubComponent>,
    gates: HashMap<Uuid, Gate>,
    outbox: Vec<ChatMessage>,
    effects: Vec<EffectRecord>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================
    // Rigs
    // ============================================================

    /// Spawns a rig together with a fresh sub-component for every role.
    pub fn spawn_rig(&mut self, input: CreateRigInput) -> Rig {
        let mut rig = Rig {
            id: Uuid::new_v4(),
            variant: input.variant,
            owner: input.owner,
            transform: input.transform,
            slots: BTreeMap::new(),
        };
        self.populate_slots(&mut rig);
        self.rigs.insert(rig.id, rig.clone());
        rig
    }

    fn populate_slots(&mut self, rig: &mut Rig) {
        rig.slots.clear();
        for role in Role::ALL {
            let component = SubComponent {
                id: Uuid::new_v4(),
                rig_id: Some(rig.id),
                role,
                prefab: role.prefab(rig.variant).to_string(),
                lock: None,
                persistent: false,
            };
            rig.slots.insert(role, component.id);
            self.components.insert(component.id, component);
        }
    }

    pub fn rigs(&self) -> impl Iterator<Item = &Rig> {
        self.rigs.values()
    }

    /// Changes a rig's placement mode. Takes effect for sub-components spawned
    /// after the next restart.
    pub fn set_variant(&mut self, rig: Uuid, variant: Variant) -> Result<(), HostError> {
        let rig = self.rigs.get_mut(&rig).ok_or(HostError::NotFound(rig))?;
        rig.variant = variant;
        Ok(())
    }

    /// The sub-component currently occupying `role` on `rig`.
    pub fn component_for(&self, rig: Uuid, role: Role) -> Option<&SubComponent> {
        let id = self.rigs.get(&rig)?.slot(role)?;
        self.components.get(&id)
    }

    pub fn components(&self) -> impl Iterator<Item = &SubComponent> {
        self.components.values()
    }

    // ============================================================
    // Gates
    // ============================================================

    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.gates.values()
    }

    /// World-space transform of a gate: its rig's transform composed with the
    /// gate's local transform. Unparented gates keep their spawn transform.
    pub fn gate_world_transform(&self, gate: Uuid) -> Option<Transform> {
        let gate = self.gates.get(&gate)?;
        let rig = gate
            .parent
            .and_then(|p| self.components.get(&p))
            .and_then(|c| c.rig_id)
            .and_then(|r| self.rigs.get(&r));

        Some(match rig {
            Some(rig) => rig.transform.compose(&gate.local),
            None => gate.local,
        })
    }

    // ============================================================
    // Chat and effects
    // ============================================================

    pub fn messages_for(&self, player: PlayerId) -> Vec<String> {
        self.outbox
            .iter()
            .filter(|m| m.player == player)
            .map(|m| m.text.clone())
            .collect()
    }

    pub fn take_messages(&mut self) -> Vec<ChatMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Removes and returns the pending chat lines for one player.
    pub fn take_messages_for(&mut self, player: PlayerId) -> Vec<String> {
        let (mine, rest) = std::mem::take(&mut self.outbox)
            .into_iter()
            .partition(|m| m.player == player);
        self.outbox = rest;
        mine.into_iter().map(|m: ChatMessage| m.text).collect()
    }

    pub fn effects(&self) -> &[EffectRecord] {
        &self.effects
    }

    // ============================================================
    // Persistence
    // ============================================================

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            rigs: self.rigs.values().cloned().collect(),
            components: self
                .components
                .values()
                .filter(|c| c.persistent)
                .cloned()
                .collect(),
            gates: self.gates.values().cloned().collect(),
        }
    }

    /// Rebuilds a world from a snapshot the way the host does on startup.
    ///
    /// Each rig gets brand-new sub-components in its slots. Persisted
    /// sub-components come back as stubs: still parented to their rig and
    /// still holding their gate, but no longer in any slot.
    pub fn restore(snapshot: WorldSnapshot) -> Self {
        let mut world = Self::new();

        for mut rig in snapshot.rigs {
            world.populate_slots(&mut rig);
            world.rigs.insert(rig.id, rig);
        }
        for component in snapshot.components {
            world.components.insert(component.id, component);
        }
        for gate in snapshot.gates {
            world.gates.insert(gate.id, gate);
        }

        tracing::debug!(
            "Restored world: {} rigs, {} components, {} gates",
            world.rigs.len(),
            world.components.len(),
            world.gates.len()
        );
        world
    }

    /// Saves and immediately restores, as a server restart would.
    pub fn restart(&self) -> Self {
        Self::restore(self.snapshot())
    }
}

impl EntityHost for World {
    fn rig(&self, id: Uuid) -> Option<&Rig> {
        self.rigs.get(&id)
    }

    fn sub_component(&self, id: Uuid) -> Option<&SubComponent> {
        self.components.get(&id)
    }

    fn gate(&self, id: Uuid) -> Option<&Gate> {
        self.gates.get(&id)
    }

    fn gate_mut(&mut self, id: Uuid) -> Option<&mut Gate> {
        self.gates.get_mut(&id)
    }

    fn gate_ids(&self) -> Vec<Uuid> {
        self.gates.keys().copied().collect()
    }

    fn create_gate_at(&mut self, world: Transform) -> Option<Uuid> {
        let id = Uuid::new_v4();
        self.gates.insert(id, Gate::new(id, world));
        Some(id)
    }

    fn set_parent(&mut self, gate: Uuid, parent: Uuid, local: Transform) -> Result<(), HostError> {
        if !self.gates.contains_key(&gate) {
            return Err(HostError::NotFound(gate));
        }
        let component = self
            .components
            .get_mut(&parent)
            .ok_or(HostError::NotFound(parent))?;
        if component.lock.is_some_and(|existing| existing != gate) {
            return Err(HostError::SlotOccupied(parent));
        }
        component.lock = Some(gate);

        let gate = self.gates.get_mut(&gate).ok_or(HostError::NotFound(gate))?;
        gate.parent = Some(parent);
        gate.local = local;
        Ok(())
    }

    fn clear_parent(&mut self, gate: Uuid) -> Result<(), HostError> {
        let entry = self.gates.get_mut(&gate).ok_or(HostError::NotFound(gate))?;
        if let Some(parent) = entry.parent.take() {
            if let Some(component) = self.components.get_mut(&parent) {
                if component.lock == Some(gate) {
                    component.lock = None;
                }
            }
        }
        entry.local = Transform::IDENTITY;
        Ok(())
    }

    fn destroy(&mut self, entity: Uuid) -> bool {
        if let Some(gate) = self.gates.remove(&entity) {
            if let Some(component) = gate.parent.and_then(|p| self.components.get_mut(&p)) {
                if component.lock == Some(entity) {
                    component.lock = None;
                }
            }
            return true;
        }

        if let Some(component) = self.components.remove(&entity) {
            // Children die with their parent.
            if let Some(gate) = component.lock {
                self.gates.remove(&gate);
            }
            if let Some(rig) = component.rig_id.and_then(|r| self.rigs.get_mut(&r)) {
                rig.slots.retain(|_, id| *id != entity);
            }
            return true;
        }

        if self.rigs.remove(&entity).is_some() {
            let children: Vec<Uuid> = self
                .components
                .values()
                .filter(|c| c.rig_id == Some(entity))
                .map(|c| c.id)
                .collect();
            for child in children {
                self.destroy(child);
            }
            return true;
        }

        false
    }

    fn mark_persistent(&mut self, entity: Uuid) -> Result<(), HostError> {
        let component = self
            .components
            .get_mut(&entity)
            .ok_or(HostError::NotFound(entity))?;
        component.persistent = true;
        Ok(())
    }

    fn send_to_actor(&mut self, player: PlayerId, text: &str) {
        self.outbox.push(ChatMessage {
            player,
            text: text.to_string(),
        });
    }

    fn run_effect(&mut self, prefab: &str, position: Vec3) {
        self.effects.push(EffectRecord {
            prefab: prefab.to_string(),
            position,
        });
    }
}
