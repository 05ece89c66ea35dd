// SPDX-License-Identifier: Apache-2.0
//! Double-precision unit quaternion.
//!
//! Structurally the same representation as `rmg_core::math::quat::Quat`
//! (scalar-first `w, x, y, z`), promoted to `f64` per this crate's
//! determinism requirements.

use super::Vec3;
use core::ops::Mul;

/// A unit quaternion representing a rotation of three-dimensional space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quat {
    /// Scalar (real) component.
    pub w: f64,
    /// X component of the vector part.
    pub x: f64,
    /// Y component of the vector part.
    pub y: f64,
    /// Z component of the vector part.
    pub z: f64,
}

impl Quat {
    /// The identity rotation.
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Builds a rotation of `angle_radians` about `axis` (need not be
    /// pre-normalized).
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, angle_radians: f64) -> Self {
        let axis = axis.normalize();
        let half = angle_radians * 0.5;
        let (sin_half, cos_half) = half.sin_cos();
        Self {
            w: cos_half,
            x: axis.x * sin_half,
            y: axis.y * sin_half,
            z: axis.z * sin_half,
        }
    }

    /// Quaternion conjugate, equal to the inverse for a unit quaternion.
    #[must_use]
    pub const fn conjugate(self) -> Self {
        Self {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// Returns this quaternion rescaled to unit norm.
    #[must_use]
    pub fn normalize(self) -> Self {
        let norm = (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if norm == 0.0 {
            Self::IDENTITY
        } else {
            Self {
                w: self.w / norm,
                x: self.x / norm,
                y: self.y / norm,
                z: self.z / norm,
            }
        }
    }

    /// Rotates `v` by this quaternion.
    #[must_use]
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let qv = Vec3::new(self.x, self.y, self.z);
        let t = qv.cross(v) * 2.0;
        v + t * self.w + qv.cross(t)
    }

    /// Decomposes this rotation into `(axis, angle_radians)`. Returns
    /// `Vec3::ZERO` axis with zero angle for the identity rotation (the axis
    /// is undefined there and conventionally reported as the zero vector).
    #[must_use]
    pub fn to_axis_angle(self) -> (Vec3, f64) {
        let q = if self.w < 0.0 {
            Self {
                w: -self.w,
                x: -self.x,
                y: -self.y,
                z: -self.z,
            }
        } else {
            self
        };
        let sin_half = (1.0 - q.w * q.w).max(0.0).sqrt();
        if sin_half < 1e-12 {
            return (Vec3::ZERO, 0.0);
        }
        let axis = Vec3::new(q.x / sin_half, q.y / sin_half, q.z / sin_half);
        (axis, 2.0 * q.w.clamp(-1.0, 1.0).acos())
    }

    /// Returns the rotation angle, in radians, between `self` and `other`,
    /// computed via quaternion differencing (§4.4's finite-rotation method
    /// for deriving angular velocity).
    #[must_use]
    pub fn angle_to(self, other: Self) -> f64 {
        let relative = self.conjugate() * other;
        2.0 * relative.w.clamp(-1.0, 1.0).acos()
    }
}

impl Mul for Quat {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn to_axis_angle_round_trips_from_axis_angle() {
        let axis = Vec3::new(0.0, 0.0, 1.0).normalize();
        let q = Quat::from_axis_angle(axis, 1.3);
        let (recovered_axis, recovered_angle) = q.to_axis_angle();
        assert!((recovered_angle - 1.3).abs() < 1e-9);
        assert!((recovered_axis.z - 1.0).abs() < 1e-9);
    }

    #[test]
    fn to_axis_angle_of_identity_is_zero_angle() {
        let (_, angle) = Quat::IDENTITY.to_axis_angle();
        assert!(angle.abs() < 1e-12);
    }

    #[test]
    fn identity_rotates_nothing() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let rotated = Quat::IDENTITY.rotate(v);
        assert!((rotated.x - v.x).abs() < 1e-12);
        assert!((rotated.y - v.y).abs() < 1e-12);
        assert!((rotated.z - v.z).abs() < 1e-12);
    }

    #[test]
    fn ninety_degree_z_rotation_maps_x_to_y() {
        let q = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), core::f64::consts::FRAC_PI_2);
        let rotated = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!((rotated.x).abs() < 1e-10);
        assert!((rotated.y - 1.0).abs() < 1e-10);
    }

    #[test]
    fn angle_to_self_is_zero() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0), 0.7);
        assert!(q.angle_to(q).abs() < 1e-9);
    }

    #[test]
    fn angle_to_matches_construction_angle() {
        let angle = 1.1_f64;
        let q = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), angle);
        assert!((Quat::IDENTITY.angle_to(q) - angle).abs() < 1e-9);
    }
}
