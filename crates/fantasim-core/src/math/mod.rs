// SPDX-License-Identifier: Apache-2.0
//! Deterministic rotation math.
//!
//! Poles and angles are accepted and stored as quantized integer
//! microdegrees (§4.4) so that two builds on different platforms parse the
//! identical `StageRotation` into the identical `f64` quaternion: converting
//! straight from a decimal-degree `f64` would leave the last bit of the
//! mantissa to the platform's `strtod`/rounding behavior. Once quantized,
//! the hot-path quaternion algebra runs in plain IEEE-754 `f64`, which is
//! reproducible bit-for-bit across the platforms this engine targets.

mod fixed;
mod quat;
mod stage_rotation;
mod vec3;

pub use fixed::microdegrees_to_radians;
pub use quat::Quat;
pub use stage_rotation::StageRotation;
pub use vec3::Vec3;
