//! Placing a gate on a sub-component.
//!
//! Checks run in a fixed order and the first failure wins. An unknown
//! placement is not a failure: the sub-component simply cannot be gated and
//! the host's default behaviour proceeds.

use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::groups::GroupResolver;
use crate::host::EntityHost;
use crate::lang::{Lang, Msg};
use crate::models::{Actor, PlayerId, Variant};
use crate::placement::PlacementRegistry;

/// Effect played where a gate appears.
pub const DEPLOY_EFFECT: &str = "assets/prefabs/locks/keypad/effects/lock-code-deploy.prefab";

/// Business rules that refuse a deploy. Shown to the player.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DeployRejection {
    #[error("static extractor locking blocked")]
    StaticBlocked,

    #[error("only owner may place locks")]
    NotOwner,
}

impl DeployRejection {
    pub fn message(&self) -> Msg {
        match self {
            Self::StaticBlocked => Msg::StaticLockingBlocked,
            Self::NotOwner => Msg::OwnerOnly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// A gate now occupies the sub-component. The caller consumes one code lock.
    Deployed(Uuid),
    /// Refused by policy; the player has been told why.
    Rejected(DeployRejection),
    /// Not ours to handle: already gated, unknown placement, or the host
    /// refused to spawn. Nothing is consumed.
    NotApplicable,
}

impl DeployOutcome {
    pub fn gate(&self) -> Option<Uuid> {
        match self {
            Self::Deployed(id) => Some(*id),
            _ => None,
        }
    }
}

/// A uniformly random four-digit code.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}

pub struct DeployController<'a> {
    pub config: &'a Config,
    pub placements: &'a PlacementRegistry,
    pub groups: &'a GroupResolver,
    pub lang: &'a Lang,
}

impl DeployController<'_> {
    pub fn attempt_deploy(
        &self,
        host: &mut dyn EntityHost,
        actor: &Actor,
        sub_component: Uuid,
        rig: Uuid,
    ) -> DeployOutcome {
        let Some(component) = host.sub_component(sub_component) else {
            return DeployOutcome::NotApplicable;
        };
        if component.lock.is_some() {
            return DeployOutcome::NotApplicable;
        }
        let role = component.role;

        let Some(rig) = host.rig(rig) else {
            return DeployOutcome::NotApplicable;
        };
        let (variant, owner, rig_transform) = (rig.variant, rig.owner, rig.transform);

        if let Err(rejection) = self.check_policy(actor, variant, owner) {
            tracing::debug!("Deploy by {} refused: {}", actor.id, rejection);
            let text = self.lang.format(rejection.message(), &actor.locale, &[]);
            host.send_to_actor(actor.id, &text);
            return DeployOutcome::Rejected(rejection);
        }

        let Some(local) = self.placements.resolve(variant, role) else {
            return DeployOutcome::NotApplicable;
        };

        let world = rig_transform.compose(&local);
        let Some(gate_id) = host.create_gate_at(world) else {
            tracing::warn!("Host refused to spawn a gate for {}", sub_component);
            return DeployOutcome::NotApplicable;
        };

        if let Err(e) = host.set_parent(gate_id, sub_component, local) {
            tracing::warn!("Could not attach gate {}: {}", gate_id, e);
            host.destroy(gate_id);
            return DeployOutcome::NotApplicable;
        }
        if let Err(e) = host.mark_persistent(sub_component) {
            tracing::warn!("Could not persist {}: {}", sub_component, e);
        }
        if let Some(gate) = host.gate_mut(gate_id) {
            gate.owner = Some(actor.id);
        }

        if self.config.auto_lock_on_placement {
            self.auto_lock(host, actor, gate_id);
        }

        let text = self.lang.format(Msg::CodeLockDeployed, &actor.locale, &[]);
        host.send_to_actor(actor.id, &text);
        host.run_effect(DEPLOY_EFFECT, world.position);

        tracing::info!(
            "{} deployed gate {} on the {} slot of a {} rig",
            actor.id,
            gate_id,
            role.as_str(),
            variant.as_str()
        );
        DeployOutcome::Deployed(gate_id)
    }

    fn check_policy(
        &self,
        actor: &Actor,
        variant: Variant,
        owner: Option<PlayerId>,
    ) -> Result<(), DeployRejection> {
        if variant == Variant::Static && !self.config.allow_static_gating {
            return Err(DeployRejection::StaticBlocked);
        }
        if self.config.owner_only_placement && owner.is_some_and(|owner| owner != actor.id) {
            return Err(DeployRejection::NotOwner);
        }
        Ok(())
    }

    fn auto_lock(&self, host: &mut dyn EntityHost, actor: &Actor, gate_id: Uuid) {
        let code = generate_code();
        let grants = self.groups.resolve(actor.id, self.config);

        let Some(gate) = host.gate_mut(gate_id) else {
            return;
        };
        gate.code = code.clone();
        gate.authorize(actor.id);
        gate.locked = true;
        for grant in &grants {
            gate.whitelist.extend(grant.members.iter().copied());
        }

        let text = self.lang.format(Msg::AutoLocked, &actor.locale, &[&code]);
        host.send_to_actor(actor.id, &text);

        for grant in grants {
            tracing::debug!(
                "Authorized {} {} members on gate {}",
                grant.members.len(),
                grant.source.as_str(),
                gate_id
            );
            let text = self.lang.format(grant.source.message(), &actor.locale, &[]);
            host.send_to_actor(actor.id, &text);
        }
    }
}
