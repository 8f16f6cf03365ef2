//! Where a gate sits on each sub-component.
//!
//! Offsets are local to the rig's transform. A missing entry means the
//! sub-component cannot carry a gate; callers treat that as "not applicable".

use serde::Serialize;

use crate::geometry::{Quat, Transform, Vec3};
use crate::models::{Role, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacementEntry {
    pub variant: Variant,
    pub role: Role,
    pub offset: Vec3,
    /// Euler angles in degrees (pitch, yaw, roll).
    pub euler: Vec3,
}

impl PlacementEntry {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler_degrees(self.euler.x, self.euler.y, self.euler.z)
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.offset, self.rotation())
    }
}

const fn entry(variant: Variant, role: Role, offset: [f32; 3], yaw: f32) -> PlacementEntry {
    PlacementEntry {
        variant,
        role,
        offset: Vec3::new(offset[0], offset[1], offset[2]),
        euler: Vec3::new(0.0, yaw, 0.0),
    }
}

const PLACEMENTS: &[PlacementEntry] = &[
    entry(Variant::Mobile, Role::Fuel, [0.45, 0.65, 0.50], 90.0),
    entry(Variant::Mobile, Role::Hopper, [-0.03, 1.90, 1.30], 90.0),
    entry(Variant::Mobile, Role::Engine, [0.07, 0.91, -0.70], 90.0),
    entry(Variant::Static, Role::Fuel, [-0.70, 0.56, 0.49], 90.0),
    entry(Variant::Static, Role::Hopper, [0.29, 0.60, 0.001], 0.0),
    entry(Variant::Static, Role::Engine, [0.29, 0.82, 0.07], 0.0),
];

/// Static lookup table of gate placements.
#[derive(Debug, Clone, Copy)]
pub struct PlacementRegistry {
    entries: &'static [PlacementEntry],
}

impl Default for PlacementRegistry {
    fn default() -> Self {
        Self {
            entries: PLACEMENTS,
        }
    }
}

impl PlacementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &'static [PlacementEntry] {
        self.entries
    }

    pub fn lookup(&self, variant: Variant, role: Role) -> Option<&'static PlacementEntry> {
        self.entries
            .iter()
            .find(|e| e.variant == variant && e.role == role)
    }

    /// Local transform for a gate on `role` of a rig in `variant` mode.
    pub fn resolve(&self, variant: Variant, role: Role) -> Option<Transform> {
        self.lookup(variant, role).map(PlacementEntry::transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_configured_pair_resolves_deterministically() {
        let registry = PlacementRegistry::new();
        for variant in [Variant::Mobile, Variant::Static] {
            for role in Role::ALL {
                let a = registry.resolve(variant, role).expect("configured");
                let b = registry.resolve(variant, role).expect("configured");
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn pairs_are_unique() {
        let registry = PlacementRegistry::new();
        for (i, a) in registry.entries().iter().enumerate() {
            for b in &registry.entries()[i + 1..] {
                assert!(!(a.variant == b.variant && a.role == b.role));
            }
        }
    }

    #[test]
    fn mobile_engine_is_yawed() {
        let t = PlacementRegistry::new()
            .resolve(Variant::Mobile, Role::Engine)
            .unwrap();
        assert_eq!(t.position, Vec3::new(0.07, 0.91, -0.70));
        assert!(t.rotation.approx_eq(Quat::from_yaw(90.0), 1e-6));
    }

    #[test]
    fn static_engine_has_identity_rotation() {
        let t = PlacementRegistry::new()
            .resolve(Variant::Static, Role::Engine)
            .unwrap();
        assert_eq!(t.position, Vec3::new(0.29, 0.82, 0.07));
        assert!(t.rotation.approx_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn empty_registry_resolves_nothing() {
        let registry = PlacementRegistry { entries: &[] };
        assert!(registry.resolve(Variant::Mobile, Role::Fuel).is_none());
    }
}
