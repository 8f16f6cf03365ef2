//! Use-attempts on gated sub-components.
//!
//! This is a policy wrapper around the gate's own open check. It owns no state
//! of its own: the gate's locked flag and whitelist are the only state, and
//! they live on the gate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::host::{EntityHost, PermissionStore};
use crate::lang::{Lang, Msg};
use crate::models::Actor;

/// Permission that bypasses every gate.
pub const ADMIN_PERMISSION: &str = "quarrylock.admin";

/// What the host should do with the intercepted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookResult {
    /// Not involved; the host runs its default behaviour.
    PassThrough,
    /// The action is denied.
    Blocked,
    /// The plugin performed the action itself (a gate was deployed). The
    /// host consumes one code lock and skips its default behaviour.
    Handled,
}

impl HookResult {
    /// Whether the host's default behaviour runs.
    pub fn proceeds(&self) -> bool {
        matches!(self, Self::PassThrough)
    }
}

pub struct Interceptor<'a> {
    pub permissions: &'a dyn PermissionStore,
    pub lang: &'a Lang,
}

impl Interceptor<'_> {
    /// Decides whether `actor` may use `sub_component`.
    ///
    /// Administrators always pass and are added to the whitelist as a side
    /// effect, so this check mutates the gate even though it reads like a
    /// query.
    pub fn attempt_use(
        &self,
        host: &mut dyn EntityHost,
        actor: &Actor,
        sub_component: Uuid,
    ) -> HookResult {
        let Some(gate_id) = host.sub_component(sub_component).and_then(|c| c.lock) else {
            return HookResult::PassThrough;
        };

        let is_admin = self.permissions.has_permission(actor.id, ADMIN_PERMISSION);

        let Some(gate) = host.gate_mut(gate_id) else {
            return HookResult::PassThrough;
        };

        if is_admin {
            if gate.authorize(actor.id) {
                tracing::info!("Admin {} enrolled on gate {}", actor.id, gate_id);
            }
            return HookResult::PassThrough;
        }

        if gate.attempt_open(actor.id, actor.entered_code.as_deref()) {
            return HookResult::PassThrough;
        }

        tracing::debug!("{} blocked by gate {}", actor.id, gate_id);
        let text = self.lang.format(Msg::Locked, &actor.locale, &[]);
        host.send_to_actor(actor.id, &text);
        HookResult::Blocked
    }
}
