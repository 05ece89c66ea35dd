// SPDX-License-Identifier: Apache-2.0
//! Three-component double-precision vector.
//!
//! Structurally the same type as `rmg_core::math::vec3::Vec3`, promoted from
//! `f32` to `f64` for the cross-platform bit-identical determinism the
//! spec's velocity and boundary analytics require (§4.4, §4.7).

use core::ops::{Add, Mul, Neg, Sub};

/// A vector (or point) in three-dimensional Euclidean space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Constructs a vector from components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Cross product.
    #[must_use]
    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Euclidean norm.
    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns this vector scaled to unit length.
    ///
    /// Returns [`Vec3::ZERO`] unchanged if the vector is already zero rather
    /// than dividing by zero; callers on the unit sphere never pass a zero
    /// vector in practice but this keeps the function total.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            self
        } else {
            self * (1.0 / len)
        }
    }

    /// Converts a geographic coordinate (latitude, longitude, both radians)
    /// on the unit sphere to a Cartesian point.
    #[must_use]
    pub fn from_lat_lon_radians(lat: f64, lon: f64) -> Self {
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();
        Self::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
    }

    /// Converts a unit-sphere Cartesian point back to (latitude, longitude)
    /// in radians.
    #[must_use]
    pub fn to_lat_lon_radians(self) -> (f64, f64) {
        let lat = self.z.clamp(-1.0, 1.0).asin();
        let lon = self.y.atan2(self.x);
        (lat, lon)
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cross_of_orthonormal_basis() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        let z = x.cross(y);
        assert!((z.x).abs() < 1e-15);
        assert!((z.y).abs() < 1e-15);
        assert!((z.z - 1.0).abs() < 1e-15);
    }

    #[test]
    fn lat_lon_round_trip() {
        let lat = 0.4_f64;
        let lon = -1.2_f64;
        let p = Vec3::from_lat_lon_radians(lat, lon);
        let (lat2, lon2) = p.to_lat_lon_radians();
        assert!((lat - lat2).abs() < 1e-12);
        assert!((lon - lon2).abs() < 1e-12);
    }

    #[test]
    fn normalize_zero_is_total() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }
}
