//! Restart reconciliation.
//!
//! After a restart every rig has brand-new sub-components, while gates still
//! hang off the persisted stubs of the old ones. The sweep walks every gate,
//! finds the live sub-component with the same role on the same rig, and moves
//! the gate across, keeping its code, whitelist and lock state.
//!
//! The sweep pauses between gates to spread host load. Other host events run
//! during each pause, so every gate is looked up afresh after waking and
//! nothing is carried across a pause except its id.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::host::{EntityHost, SharedHost};
use crate::placement::PlacementRegistry;

/// Why a gate was left where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Destroyed while the sweep was paused.
    GateGone,
    /// Not attached to anything.
    NoParent,
    /// Parent is not a sub-component (or no longer exists).
    ParentGone,
    /// Parent sub-component belongs to no rig that still exists.
    RigGone,
    /// The rig has no live sub-component for the role yet.
    NoReplacement,
    /// The replacement already carries a different gate.
    ReplacementOccupied,
    /// No placement for the rig's current variant and the role.
    NoPlacement,
    /// The host refused the re-attach; the gate was put back.
    AttachFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Migrated { from: Uuid, to: Uuid },
    /// Already on the live sub-component for its role.
    AlreadyAttached,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub migrated: usize,
    pub already_attached: usize,
    pub skipped: usize,
}

impl ReconcileReport {
    fn record(&mut self, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Migrated { .. } => self.migrated += 1,
            ReconcileOutcome::AlreadyAttached => self.already_attached += 1,
            ReconcileOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Moves one gate from its stale parent onto the live replacement.
///
/// Runs entirely under the caller's host lock, so it observes a consistent
/// world and never suspends.
pub fn reconcile_gate(
    host: &mut dyn EntityHost,
    placements: &PlacementRegistry,
    gate_id: Uuid,
) -> ReconcileOutcome {
    use ReconcileOutcome::Skipped;

    let Some(gate) = host.gate(gate_id) else {
        return Skipped(SkipReason::GateGone);
    };
    let Some(stale_id) = gate.parent else {
        return Skipped(SkipReason::NoParent);
    };
    let stale_local = gate.local;
    let Some(stale) = host.sub_component(stale_id) else {
        return Skipped(SkipReason::ParentGone);
    };
    let role = stale.role;
    let Some(rig) = stale.rig_id.and_then(|id| host.rig(id)) else {
        return Skipped(SkipReason::RigGone);
    };
    // The variant may have changed across the restart; only the current one counts.
    let variant = rig.variant;
    let Some(replacement_id) = rig.slot(role) else {
        return Skipped(SkipReason::NoReplacement);
    };
    if replacement_id == stale_id {
        return ReconcileOutcome::AlreadyAttached;
    }
    let Some(replacement) = host.sub_component(replacement_id) else {
        return Skipped(SkipReason::NoReplacement);
    };
    if replacement.lock.is_some_and(|other| other != gate_id) {
        return Skipped(SkipReason::ReplacementOccupied);
    }
    let Some(local) = placements.resolve(variant, role) else {
        return Skipped(SkipReason::NoPlacement);
    };

    if let Err(e) = host.clear_parent(gate_id) {
        tracing::warn!("Could not detach gate {}: {}", gate_id, e);
        return Skipped(SkipReason::GateGone);
    }
    if let Err(e) = host.set_parent(gate_id, replacement_id, local) {
        tracing::warn!("Could not re-attach gate {}: {}", gate_id, e);
        // Put it back exactly as it was.
        if let Err(e) = host.set_parent(gate_id, stale_id, stale_local) {
            tracing::warn!("Gate {} left detached from {}: {}", gate_id, stale_id, e);
        }
        return Skipped(SkipReason::AttachFailed);
    }
    if let Err(e) = host.mark_persistent(replacement_id) {
        tracing::warn!("Could not persist {}: {}", replacement_id, e);
    }
    host.destroy(stale_id);

    ReconcileOutcome::Migrated {
        from: stale_id,
        to: replacement_id,
    }
}

/// One run of the restart sweep.
pub struct Reconciler {
    host: SharedHost,
    placements: PlacementRegistry,
    delay: Duration,
}

impl Reconciler {
    pub fn new(host: SharedHost, placements: PlacementRegistry, delay: Duration) -> Self {
        Self {
            host,
            placements,
            delay,
        }
    }

    /// Processes one gate under the host lock.
    pub fn reconcile_one(&self, gate_id: Uuid) -> ReconcileOutcome {
        let mut host = self.host.lock().expect("host lock poisoned");
        reconcile_gate(&mut *host, &self.placements, gate_id)
    }

    /// Walks every gate once, pausing before each. Never reschedules itself.
    pub async fn run(self) -> ReconcileReport {
        let gate_ids = self.host.lock().expect("host lock poisoned").gate_ids();
        tracing::info!("Reconciling {} gates", gate_ids.len());

        let mut report = ReconcileReport::default();
        for gate_id in gate_ids {
            tokio::time::sleep(self.delay).await;

            let outcome = self.reconcile_one(gate_id);
            match outcome {
                ReconcileOutcome::Migrated { from, to } => {
                    tracing::debug!("Moved gate {} from {} to {}", gate_id, from, to);
                }
                ReconcileOutcome::AlreadyAttached => {}
                ReconcileOutcome::Skipped(
                    reason @ (SkipReason::GateGone | SkipReason::NoParent | SkipReason::ParentGone),
                ) => {
                    tracing::debug!("Skipping gate {}: {:?}", gate_id, reason);
                }
                ReconcileOutcome::Skipped(reason) => {
                    tracing::warn!("Skipping gate {}: {:?}", gate_id, reason);
                }
            }
            report.record(outcome);
        }

        tracing::info!(
            "Reconciliation finished: {} migrated, {} already attached, {} skipped",
            report.migrated,
            report.already_attached,
            report.skipped
        );
        report
    }
}
