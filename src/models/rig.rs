use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PlayerId;
use crate::geometry::Transform;

/// A production rig with attachable sub-components.
///
/// `slots` maps each role to the sub-component instance the rig currently
/// uses for it. After a restart the slots point at freshly created instances,
/// never at the stubs loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rig {
    pub id: Uuid,
    pub variant: Variant,
    /// `None` for rigs spawned by the world (monument extractors).
    pub owner: Option<PlayerId>,
    pub transform: Transform,
    pub slots: BTreeMap<Role, Uuid>,
}

impl Rig {
    pub fn slot(&self, role: Role) -> Option<Uuid> {
        self.slots.get(&role).copied()
    }
}

/// Placement mode of a rig. Affects where sub-components sit on the model.
///
/// - `Mobile`: player-deployed quarry
/// - `Static`: fixed extractor at a monument
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Mobile,
    Static,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Static => "static",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mobile" => Some(Self::Mobile),
            "static" => Some(Self::Static),
            _ => None,
        }
    }
}

/// The logical role of a sub-component. Stable across restarts even though
/// the instance identity is not.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Fuel,
    Hopper,
    Engine,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Fuel, Role::Hopper, Role::Engine];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fuel => "fuel",
            Self::Hopper => "hopper",
            Self::Engine => "engine",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fuel" => Some(Self::Fuel),
            "hopper" => Some(Self::Hopper),
            "engine" => Some(Self::Engine),
            _ => None,
        }
    }

    /// Prefab the host spawns for this role on a rig of the given variant.
    pub fn prefab(&self, variant: Variant) -> &'static str {
        match (variant, self) {
            (Variant::Mobile, Self::Fuel) => "assets/prefabs/deployable/quarry/fuelstorage.prefab",
            (Variant::Mobile, Self::Hopper) => {
                "assets/prefabs/deployable/quarry/hopperoutput.prefab"
            }
            (Variant::Mobile, Self::Engine) => {
                "assets/prefabs/deployable/quarry/engineswitch.prefab"
            }
            (Variant::Static, Self::Fuel) => {
                "assets/bundled/prefabs/static/quarry/fuelstorage_static.prefab"
            }
            (Variant::Static, Self::Hopper) => {
                "assets/bundled/prefabs/static/quarry/hopperoutput_static.prefab"
            }
            (Variant::Static, Self::Engine) => {
                "assets/bundled/prefabs/static/quarry/engineswitch_static.prefab"
            }
        }
    }
}

/// One attachment point of a rig.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubComponent {
    pub id: Uuid,
    /// Owning rig. Stubs loaded after a restart keep this even though the rig
    /// no longer lists them in its slots.
    pub rig_id: Option<Uuid>,
    pub role: Role,
    pub prefab: String,
    /// The gate occupying this component's lock slot.
    pub lock: Option<Uuid>,
    /// Whether the host saves this instance across restarts.
    pub persistent: bool,
}

/// Input for spawning a rig in the reference host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRigInput {
    pub variant: Variant,
    pub owner: Option<PlayerId>,
    #[serde(default)]
    pub transform: Transform,
}
