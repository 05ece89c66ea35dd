// SPDX-License-Identifier: Apache-2.0
//! Quantized Euler-pole stage rotation.

use super::fixed::microdegrees_to_radians;
use super::{Quat, Vec3};

/// A finite rotation expressed as an Euler pole and angle, the wire
/// representation a motion segment event carries (§4.4).
///
/// Pole coordinates and the rotation angle are stored as integer
/// microdegrees so that every consumer parses the identical `f64`
/// quaternion regardless of platform (see [`super::fixed`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageRotation {
    /// Euler pole latitude, in microdegrees, in `[-90_000_000, 90_000_000]`.
    pub pole_lat_microdeg: i64,
    /// Euler pole longitude, in microdegrees, in `(-180_000_000, 180_000_000]`.
    pub pole_lon_microdeg: i64,
    /// Rotation angle about the pole, in microdegrees.
    pub angle_microdeg: i64,
}

impl StageRotation {
    /// The zero rotation (angle 0, pole at the north pole by convention).
    pub const IDENTITY: Self = Self {
        pole_lat_microdeg: 90_000_000,
        pole_lon_microdeg: 0,
        angle_microdeg: 0,
    };

    /// Constructs a stage rotation from quantized microdegree fields.
    #[must_use]
    pub const fn new(pole_lat_microdeg: i64, pole_lon_microdeg: i64, angle_microdeg: i64) -> Self {
        Self {
            pole_lat_microdeg,
            pole_lon_microdeg,
            angle_microdeg,
        }
    }

    /// Expands this stage rotation into the `f64` quaternion it represents.
    ///
    /// The pole and angle are each converted from microdegrees to radians
    /// through the single fixed sequence in [`microdegrees_to_radians`], so
    /// two builds on different platforms produce a bit-identical quaternion
    /// for the same `StageRotation`.
    #[must_use]
    pub fn to_quaternion(self) -> Quat {
        let pole_lat = microdegrees_to_radians(self.pole_lat_microdeg);
        let pole_lon = microdegrees_to_radians(self.pole_lon_microdeg);
        let angle = microdegrees_to_radians(self.angle_microdeg);
        let axis = Vec3::from_lat_lon_radians(pole_lat, pole_lon);
        Quat::from_axis_angle(axis, angle)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn identity_stage_rotation_is_no_op() {
        let q = StageRotation::IDENTITY.to_quaternion();
        let v = Vec3::new(1.0, 0.0, 0.0);
        let rotated = q.rotate(v);
        assert!((rotated.x - v.x).abs() < 1e-9);
        assert!((rotated.y - v.y).abs() < 1e-9);
        assert!((rotated.z - v.z).abs() < 1e-9);
    }

    #[test]
    fn to_quaternion_is_deterministic() {
        let sr = StageRotation::new(12_345_678, -45_000_000, 3_210_000);
        let a = sr.to_quaternion();
        let b = sr.to_quaternion();
        assert_eq!(a.w.to_bits(), b.w.to_bits());
        assert_eq!(a.x.to_bits(), b.x.to_bits());
        assert_eq!(a.y.to_bits(), b.y.to_bits());
        assert_eq!(a.z.to_bits(), b.z.to_bits());
    }

    #[test]
    fn ninety_degree_rotation_about_north_pole_matches_longitude_shift() {
        let sr = StageRotation::new(90_000_000, 0, 90_000_000);
        let q = sr.to_quaternion();
        let rotated = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!((rotated.x).abs() < 1e-9);
        assert!((rotated.y - 1.0).abs() < 1e-9);
    }
}
