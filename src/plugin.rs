//! The plugin object and its host-facing hooks.
//!
//! All shared state lives in an explicit [`PluginContext`] handed over at load
//! time and dropped at unload.

use std::sync::Arc;

use tokio::sync::oneshot;
use uuid::Uuid;

use crate::config::Config;
use crate::deploy::{DeployController, DeployOutcome};
use crate::groups::GroupResolver;
use crate::host::{PermissionStore, SharedHost};
use crate::intercept::{HookResult, Interceptor, ADMIN_PERMISSION};
use crate::lang::Lang;
use crate::models::{Actor, Role};
use crate::placement::PlacementRegistry;
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::tasks::TaskRegistry;

/// Registry name of the restart sweep.
pub const RECONCILE_TASK: &str = "quarrylock.reconcile";

/// Collaborators and settings for one plugin lifetime.
pub struct PluginContext {
    pub config: Config,
    pub host: SharedHost,
    pub permissions: Arc<dyn PermissionStore>,
    pub lang: Lang,
    pub groups: GroupResolver,
    pub tasks: Arc<TaskRegistry>,
}

/// How the server came up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStart {
    /// Fresh process; sub-components were recreated from disk.
    Cold,
    /// Plugin reloaded into a running server; nothing was recreated.
    Reload,
}

pub struct QuarryLock {
    ctx: PluginContext,
    placements: PlacementRegistry,
}

impl QuarryLock {
    pub fn load(ctx: PluginContext) -> Self {
        ctx.permissions.register_permission(ADMIN_PERMISSION);
        tracing::info!(
            "Quarry Lock loaded (auto lock: {}, owner only: {}, static: {})",
            ctx.config.auto_lock_on_placement,
            ctx.config.owner_only_placement,
            ctx.config.allow_static_gating
        );
        Self {
            ctx,
            placements: PlacementRegistry::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.ctx.config
    }

    pub fn host(&self) -> &SharedHost {
        &self.ctx.host
    }

    pub fn placements(&self) -> &PlacementRegistry {
        &self.placements
    }

    /// Starts the restart sweep on a cold start. The receiver yields the
    /// sweep's report, or errors if the sweep was stopped first.
    pub fn on_server_initialized(
        &self,
        start: ServerStart,
    ) -> Option<oneshot::Receiver<ReconcileReport>> {
        if start != ServerStart::Cold {
            return None;
        }

        let reconciler = Reconciler::new(
            self.ctx.host.clone(),
            self.placements,
            self.ctx.config.reconcile_delay(),
        );
        let (tx, rx) = oneshot::channel();
        self.ctx.tasks.spawn(RECONCILE_TASK, async move {
            let report = reconciler.run().await;
            let _ = tx.send(report);
        });
        Some(rx)
    }

    pub fn unload(&self) {
        if self.ctx.tasks.stop(RECONCILE_TASK) {
            tracing::info!("Stopped reconciliation on unload");
        }
    }

    /// A player opens a fuel bay or output hopper.
    pub fn on_loot_entity(&self, actor: &Actor, container: Uuid) -> HookResult {
        let rig = {
            let host = self.ctx.host.lock().expect("host lock poisoned");
            match host.sub_component(container) {
                Some(c) if matches!(c.role, Role::Fuel | Role::Hopper) => c.rig_id,
                _ => None,
            }
        };
        match rig {
            Some(rig) => self.on_gated_use(actor, container, rig),
            None => HookResult::PassThrough,
        }
    }

    /// A player flips a rig's engine switch.
    pub fn on_engine_toggle(&self, actor: &Actor, rig: Uuid) -> HookResult {
        let engine = {
            let host = self.ctx.host.lock().expect("host lock poisoned");
            host.rig(rig).and_then(|r| r.slot(Role::Engine))
        };
        match engine {
            Some(engine) => self.on_gated_use(actor, engine, rig),
            None => HookResult::PassThrough,
        }
    }

    /// Deploys a gate if the player is holding one and the slot is free,
    /// otherwise runs the use-attempt through the existing gate.
    fn on_gated_use(&self, actor: &Actor, sub_component: Uuid, rig: Uuid) -> HookResult {
        let mut host = self.ctx.host.lock().expect("host lock poisoned");
        let Some(component) = host.sub_component(sub_component) else {
            return HookResult::PassThrough;
        };

        if component.lock.is_none() {
            if !actor.is_holding_code_lock() {
                return HookResult::PassThrough;
            }
            let controller = DeployController {
                config: &self.ctx.config,
                placements: &self.placements,
                groups: &self.ctx.groups,
                lang: &self.ctx.lang,
            };
            return match controller.attempt_deploy(&mut *host, actor, sub_component, rig) {
                DeployOutcome::Deployed(_) => HookResult::Handled,
                DeployOutcome::Rejected(_) => HookResult::Blocked,
                DeployOutcome::NotApplicable => HookResult::PassThrough,
            };
        }

        let interceptor = Interceptor {
            permissions: self.ctx.permissions.as_ref(),
            lang: &self.ctx.lang,
        };
        interceptor.attempt_use(&mut *host, actor, sub_component)
    }
}

impl Drop for QuarryLock {
    fn drop(&mut self) {
        self.unload();
    }
}
