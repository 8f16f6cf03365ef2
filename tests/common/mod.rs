#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use quarry_lock::config::Config;
use quarry_lock::geometry::{Quat, Transform, Vec3};
use quarry_lock::groups::{GroupResolver, GroupSource, MemoryGroups};
use quarry_lock::host::{EntityHost, SharedHost};
use quarry_lock::intercept::ADMIN_PERMISSION;
use quarry_lock::lang::Lang;
use quarry_lock::models::*;
use quarry_lock::permissions::Permissions;
use quarry_lock::plugin::{PluginContext, QuarryLock};
use quarry_lock::tasks::TaskRegistry;
use quarry_lock::world::World;
use uuid::Uuid;

pub const OWNER: u64 = 76561198000000001;
pub const TEAMMATE: u64 = 76561198000000002;
pub const CLANMATE: u64 = 76561198000000003;
pub const FRIEND: u64 = 76561198000000004;
pub const STRANGER: u64 = 76561198000000005;
pub const ADMIN: u64 = 76561198000000006;

pub struct Fixture {
    pub world: Arc<Mutex<World>>,
    pub permissions: Arc<Permissions>,
    pub team: Arc<MemoryGroups>,
    pub clans: Arc<MemoryGroups>,
    pub friends: Arc<MemoryGroups>,
    pub tasks: Arc<TaskRegistry>,
    pub plugin: QuarryLock,
}

impl Fixture {
    pub fn new(config: Config) -> Self {
        Self::with_world(config, World::new())
    }

    pub fn with_world(config: Config, world: World) -> Self {
        let world = Arc::new(Mutex::new(world));
        let host: SharedHost = world.clone();
        let permissions = Arc::new(Permissions::new());
        let tasks = Arc::new(TaskRegistry::new());

        let team = Arc::new(MemoryGroups::new());
        team.add_group(&[PlayerId(OWNER), PlayerId(TEAMMATE)]);
        let clans = Arc::new(MemoryGroups::new());
        clans.add_clan("QRY", &[PlayerId(OWNER), PlayerId(CLANMATE)]);
        let friends = Arc::new(MemoryGroups::new());
        friends.add_group(&[PlayerId(OWNER), PlayerId(FRIEND), PlayerId(TEAMMATE)]);

        let groups = GroupResolver::new()
            .with_provider(GroupSource::Team, team.clone())
            .with_provider(GroupSource::Clan, clans.clone())
            .with_provider(GroupSource::Friends, friends.clone());

        let plugin = QuarryLock::load(PluginContext {
            config,
            host,
            permissions: permissions.clone(),
            lang: Lang::new(),
            groups,
            tasks: tasks.clone(),
        });
        permissions.grant(PlayerId(ADMIN), ADMIN_PERMISSION);

        Self {
            world,
            permissions,
            team,
            clans,
            friends,
            tasks,
            plugin,
        }
    }

    pub fn spawn_rig(&self, variant: Variant, owner: Option<u64>) -> Rig {
        self.world.lock().unwrap().spawn_rig(CreateRigInput {
            variant,
            owner: owner.map(PlayerId),
            transform: Transform::new(Vec3::new(100.0, 5.0, -40.0), Quat::from_yaw(30.0)),
        })
    }

    pub fn component(&self, rig: Uuid, role: Role) -> Uuid {
        self.world
            .lock()
            .unwrap()
            .component_for(rig, role)
            .expect("rig has role")
            .id
    }

    pub fn gate_on(&self, sub_component: Uuid) -> Option<Gate> {
        let world = self.world.lock().unwrap();
        let gate = world.sub_component(sub_component)?.lock?;
        world.gate(gate).cloned()
    }

    pub fn gate(&self, id: Uuid) -> Option<Gate> {
        self.world.lock().unwrap().gate(id).cloned()
    }

    pub fn gate_count(&self) -> usize {
        self.world.lock().unwrap().gates().count()
    }

    pub fn messages(&self, player: u64) -> Vec<String> {
        self.world.lock().unwrap().messages_for(PlayerId(player))
    }

    /// Deploys a locked gate on `role` through the hooks.
    pub fn deploy(&self, rig: &Rig, role: Role, actor: u64) -> Gate {
        let actor = Actor::new(actor).holding(HeldItem::code_lock(1));
        match role {
            Role::Engine => self.plugin.on_engine_toggle(&actor, rig.id),
            _ => self
                .plugin
                .on_loot_entity(&actor, self.component(rig.id, role)),
        };
        self.gate_on(self.component(rig.id, role))
            .expect("gate deployed")
    }
}

pub fn auto_lock_config() -> Config {
    Config {
        auto_lock_on_placement: true,
        auto_authorize_team: false,
        ..Config::default()
    }
}

pub fn holding_lock(id: u64) -> Actor {
    Actor::new(id).holding(HeldItem::code_lock(1))
}
