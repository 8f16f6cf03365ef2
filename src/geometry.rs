//! Minimal rigid-body math for placing gates relative to their rig.
//!
//! Left-handed, Y-up, matching the host engine. Euler angles are in degrees
//! and applied Z, then X, then Y.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn scale(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn distance(self, other: Self) -> f32 {
        let d = self.add(other.scale(-1.0));
        (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
    }
}

/// Unit quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Builds a rotation from Euler angles in degrees.
    pub fn from_euler_degrees(pitch: f32, yaw: f32, roll: f32) -> Self {
        let (sx, cx) = (pitch.to_radians() * 0.5).sin_cos();
        let (sy, cy) = (yaw.to_radians() * 0.5).sin_cos();
        let (sz, cz) = (roll.to_radians() * 0.5).sin_cos();

        Self {
            x: cy * sx * cz + sy * cx * sz,
            y: sy * cx * cz - cy * sx * sz,
            z: cy * cx * sz - sy * sx * cz,
            w: cy * cx * cz + sy * sx * sz,
        }
    }

    pub fn from_yaw(degrees: f32) -> Self {
        Self::from_euler_degrees(0.0, degrees, 0.0)
    }

    /// Hamilton product `self * rhs`: applies `rhs` first, then `self`.
    pub fn mul(self, rhs: Self) -> Self {
        Self {
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        }
    }

    pub fn rotate(self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v).scale(2.0);
        v.add(t.scale(self.w)).add(u.cross(t))
    }

    /// Approximate equality up to sign, since `q` and `-q` are the same rotation.
    pub fn approx_eq(self, other: Self, epsilon: f32) -> bool {
        let dot = self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w;
        (1.0 - dot.abs()) <= epsilon
    }
}

/// Position plus rotation, either in world space or relative to a parent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Composes `self` (a parent's world transform) with a child's local
    /// transform, yielding the child's world transform.
    pub fn compose(&self, local: &Transform) -> Transform {
        Transform {
            position: self.position.add(self.rotation.rotate(local.position)),
            rotation: self.rotation.mul(local.rotation),
        }
    }

    pub fn approx_eq(&self, other: &Transform, epsilon: f32) -> bool {
        self.position.distance(other.position) <= epsilon
            && self.rotation.approx_eq(other.rotation, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaw_90_rotates_forward_to_right() {
        let q = Quat::from_yaw(90.0);
        let v = q.rotate(Vec3::new(0.0, 0.0, 1.0));
        assert!(v.distance(Vec3::new(1.0, 0.0, 0.0)) < 1e-5);
    }

    #[test]
    fn compose_with_identity_is_noop() {
        let t = Transform::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_yaw(45.0));
        assert!(t.compose(&Transform::IDENTITY).approx_eq(&t, 1e-5));
        assert!(Transform::IDENTITY.compose(&t).approx_eq(&t, 1e-5));
    }

    #[test]
    fn compose_rotates_local_offset_by_parent() {
        let parent = Transform::new(Vec3::new(10.0, 0.0, 0.0), Quat::from_yaw(90.0));
        let local = Transform::new(Vec3::new(0.0, 1.0, 2.0), Quat::IDENTITY);
        let world = parent.compose(&local);
        assert!(world.position.distance(Vec3::new(12.0, 1.0, 0.0)) < 1e-5);
        assert!(world.rotation.approx_eq(Quat::from_yaw(90.0), 1e-5));
    }
}
