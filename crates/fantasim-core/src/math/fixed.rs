// SPDX-License-Identifier: Apache-2.0
//! Fixed-point quantization helpers.
//!
//! Grounded on `warp_core::math::fixed_q32_32`'s integer-first approach to
//! deterministic arithmetic: rather than parsing a decimal string straight
//! into `f64` (platform libm dependent in its last bit), angles are carried
//! as integer microdegrees end-to-end and converted to radians through a
//! single fixed sequence of integer and `f64` operations that every target
//! platform performs identically.

/// One millionth of a degree; the fixed-point unit [`StageRotation`](super::StageRotation)
/// and pole coordinates are quantized to.
pub const MICRODEGREES_PER_DEGREE: i64 = 1_000_000;

/// Converts a quantity in integer microdegrees to radians.
///
/// The division by [`MICRODEGREES_PER_DEGREE`] and multiplication by
/// `PI / 180` are both single `f64` operations performed in a fixed order,
/// so the result is bit-identical across platforms for a given input.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn microdegrees_to_radians(microdegrees: i64) -> f64 {
    let degrees = microdegrees as f64 / MICRODEGREES_PER_DEGREE as f64;
    degrees * core::f64::consts::PI / 180.0
}

/// Converts a quantity in radians to the nearest integer microdegrees.
///
/// Rounds to nearest, ties away from zero, matching the quantization a
/// producer must apply before persisting a [`StageRotation`](super::StageRotation).
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn radians_to_microdegrees(radians: f64) -> i64 {
    let degrees = radians * 180.0 / core::f64::consts::PI;
    (degrees * MICRODEGREES_PER_DEGREE as f64).round() as i64
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_round_trips() {
        assert_eq!(microdegrees_to_radians(0), 0.0);
        assert_eq!(radians_to_microdegrees(0.0), 0);
    }

    #[test]
    fn ninety_degrees_round_trips_within_quantum() {
        let microdeg = 90 * MICRODEGREES_PER_DEGREE;
        let radians = microdegrees_to_radians(microdeg);
        assert!((radians - core::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(radians_to_microdegrees(radians), microdeg);
    }

    #[test]
    fn deterministic_across_repeated_calls() {
        let a = microdegrees_to_radians(47_123_456);
        let b = microdegrees_to_radians(47_123_456);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
