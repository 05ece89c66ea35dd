// SPDX-License-Identifier: Apache-2.0
//! Angular/linear velocity derivation and boundary velocity analytics
//! (§4.7).

use crate::frame::{validate_chain, Frame, FrameLink};
use crate::spherical::sample_polyline;
use fantasim_core::{BoundaryId, FantaSimError, PlateId, Tick, Vec3};
use fantasim_materialize::kinematics::KinematicsState;
use fantasim_materialize::topology::{Boundary, TopologySnapshot};
use tracing::instrument;

const VELOCITY_DELTA_TICKS: i64 = 1;

/// Computes `plate`'s instantaneous angular velocity at `tick`, in radians
/// per tick, by differencing the rotation at `tick` and `tick + 1` (§4.7).
///
/// Falls back to a zero vector if kinematics are missing for `plate`
/// (§7's local-recovery policy for missing kinematics).
#[must_use]
pub fn angular_velocity(kinematics: &KinematicsState, plate: PlateId, tick: Tick) -> Vec3 {
    let r0 = kinematics.try_get_rotation(plate, tick);
    let r1 = kinematics.try_get_rotation(plate, tick.advance(VELOCITY_DELTA_TICKS));
    let delta = r1 * r0.conjugate();
    let (axis, angle) = delta.to_axis_angle();
    axis * (angle / VELOCITY_DELTA_TICKS as f64)
}

/// Linear velocity of a material point on `plate` at `tick`:
/// `omega x point`.
#[must_use]
pub fn absolute_velocity(kinematics: &KinematicsState, plate: PlateId, point: Vec3, tick: Tick) -> Vec3 {
    angular_velocity(kinematics, plate, tick).cross(point)
}

/// Relative velocity between two plates at the same point: `v_a - v_b`.
#[must_use]
pub fn relative_velocity(kinematics: &KinematicsState, plate_a: PlateId, plate_b: PlateId, point: Vec3, tick: Tick) -> Vec3 {
    absolute_velocity(kinematics, plate_a, point, tick) - absolute_velocity(kinematics, plate_b, point, tick)
}

/// A velocity expressed in a particular reference frame, decomposed into
/// the rigid-rotation component and its magnitude/azimuth (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct FrameVelocity {
    /// Velocity vector after frame composition.
    pub rigid_rotation_component: Vec3,
    /// Euclidean magnitude of the velocity.
    pub magnitude: f64,
    /// Azimuth of the velocity's tangential component, in radians from local
    /// north, computed against the point's local east/north basis.
    pub azimuth: f64,
}

fn local_basis(point: Vec3) -> (Vec3, Vec3) {
    let north_pole = Vec3::new(0.0, 0.0, 1.0);
    let mut east = north_pole.cross(point);
    if east.length() < 1e-12 {
        east = Vec3::new(1.0, 0.0, 0.0);
    }
    let east = east.normalize();
    let north = point.cross(east).normalize();
    (east, north)
}

fn azimuth_of(point: Vec3, velocity: Vec3) -> f64 {
    let (east, north) = local_basis(point);
    velocity.dot(east).atan2(velocity.dot(north))
}

/// Computes `plate`'s velocity at `point, tick` expressed in `frame`
/// (§4.7).
///
/// # Errors
/// Returns [`FantaSimError::CyclicFrameReference`] if `frame` is a
/// [`Frame::CustomFrame`] whose chain anchors to the same plate twice.
#[instrument(skip(kinematics))]
pub fn compute_velocity_in_frame(
    point: Vec3,
    plate: PlateId,
    tick: Tick,
    frame: &Frame,
    kinematics: &KinematicsState,
) -> Result<FrameVelocity, FantaSimError> {
    let base = absolute_velocity(kinematics, plate, point, tick);

    let velocity = match frame {
        Frame::MantleFrame | Frame::AbsoluteFrame => base,
        Frame::PlateAnchor { plate_id } => {
            if *plate_id == plate {
                Vec3::ZERO
            } else {
                base - absolute_velocity(kinematics, *plate_id, point, tick)
            }
        }
        Frame::CustomFrame { chain } => {
            validate_chain(chain)?;
            chain.iter().fold(base, |v, link| match link {
                FrameLink::Mantle => v,
                FrameLink::AnchorTo(anchor) => v - absolute_velocity(kinematics, *anchor, point, tick),
            })
        }
    };

    Ok(FrameVelocity {
        rigid_rotation_component: velocity,
        magnitude: velocity.length(),
        azimuth: azimuth_of(point, velocity),
    })
}

/// Strike-slip sense of a boundary's tangential velocity component (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeSlipSense {
    /// Tangential motion right-lateral.
    RightLateral,
    /// Tangential motion left-lateral.
    LeftLateral,
    /// Tangential rate is negligible (`|tangential_rate| <= 1e-12`).
    None,
}

/// Velocity decomposition sampled at one point along a boundary.
#[derive(Debug, Clone, Copy)]
pub struct BoundarySample {
    /// Sample location.
    pub point: Vec3,
    /// Component of relative velocity along the boundary normal.
    pub normal_rate: f64,
    /// Component of relative velocity along the boundary tangent.
    pub tangential_rate: f64,
    /// Component of relative velocity out of the boundary's local plane.
    pub vertical_rate: f64,
    /// `max(-normal_rate, 0)`.
    pub convergence: f64,
    /// `max(normal_rate, 0)`.
    pub divergence: f64,
    /// `|tangential_rate|`.
    pub strike_slip: f64,
    /// Strike-slip sense.
    pub strike_slip_sense: StrikeSlipSense,
    /// `atan(|tangential| / |normal|)`, clamped to `[0, pi/2]`.
    pub obliquity: f64,
}

/// A full boundary velocity profile: per-sample decomposition plus
/// aggregate statistics (§4.7).
#[derive(Debug, Clone)]
pub struct BoundaryVelocityProfile {
    /// The profiled boundary.
    pub boundary_id: BoundaryId,
    /// Per-sample decomposition, in sample order.
    pub samples: Vec<BoundarySample>,
    /// Minimum normal rate across samples.
    pub min_normal_rate: f64,
    /// Maximum normal rate across samples.
    pub max_normal_rate: f64,
    /// Mean normal rate across samples.
    pub mean_normal_rate: f64,
    /// Minimum `|tangential_rate|` across samples.
    pub min_slip_rate: f64,
    /// Maximum `|tangential_rate|` across samples.
    pub max_slip_rate: f64,
    /// Mean `|tangential_rate|` across samples.
    pub mean_slip_rate: f64,
    /// Sum of positive normal rates across samples (net divergence).
    pub convergence_summary: f64,
}

fn strike_slip_sense(tangential_rate: f64) -> StrikeSlipSense {
    if tangential_rate.abs() <= 1e-12 {
        StrikeSlipSense::None
    } else if tangential_rate > 0.0 {
        StrikeSlipSense::RightLateral
    } else {
        StrikeSlipSense::LeftLateral
    }
}

/// Computes the velocity profile for one boundary at `tick`, sampling its
/// geometry at `sample_count` points (§4.7).
#[must_use]
pub fn boundary_velocity_profile(
    boundary_id: BoundaryId,
    boundary: &Boundary,
    kinematics: &KinematicsState,
    tick: Tick,
    sample_count: usize,
    include_endpoints: bool,
) -> BoundaryVelocityProfile {
    let points = sample_polyline(&boundary.geometry.points, sample_count, include_endpoints);
    let mut samples = Vec::with_capacity(points.len());

    for (i, &point) in points.iter().enumerate() {
        let tangent = boundary_tangent(&boundary.geometry.points, i, points.len());
        let normal = tangent.cross(point).normalize();
        let v_rel = relative_velocity(kinematics, boundary.left, boundary.right, point, tick);

        let normal_rate = v_rel.dot(normal);
        let tangential_rate = v_rel.dot(tangent);
        let vertical_rate = v_rel.dot(tangent.cross(normal));
        let obliquity = if normal_rate.abs() < 1e-15 {
            core::f64::consts::FRAC_PI_2
        } else {
            (tangential_rate.abs() / normal_rate.abs()).atan().clamp(0.0, core::f64::consts::FRAC_PI_2)
        };

        samples.push(BoundarySample {
            point,
            normal_rate,
            tangential_rate,
            vertical_rate,
            convergence: (-normal_rate).max(0.0),
            divergence: normal_rate.max(0.0),
            strike_slip: tangential_rate.abs(),
            strike_slip_sense: strike_slip_sense(tangential_rate),
            obliquity,
        });
    }

    let normal_rates: Vec<f64> = samples.iter().map(|s| s.normal_rate).collect();
    let slip_rates: Vec<f64> = samples.iter().map(|s| s.strike_slip).collect();

    BoundaryVelocityProfile {
        boundary_id,
        min_normal_rate: normal_rates.iter().copied().fold(f64::INFINITY, f64::min),
        max_normal_rate: normal_rates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean_normal_rate: mean(&normal_rates),
        min_slip_rate: slip_rates.iter().copied().fold(f64::INFINITY, f64::min),
        max_slip_rate: slip_rates.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean_slip_rate: mean(&slip_rates),
        convergence_summary: samples.iter().map(|s| s.divergence).sum(),
        samples,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn boundary_tangent(polyline: &[Vec3], index: usize, total: usize) -> Vec3 {
    if polyline.len() < 2 {
        return Vec3::new(1.0, 0.0, 0.0);
    }
    let t = if total <= 1 { 0.5 } else { index as f64 / (total - 1) as f64 };
    let arcs: Vec<crate::spherical::GreatCircleArc> = polyline.windows(2).map(|w| crate::spherical::GreatCircleArc::new(w[0], w[1])).collect();
    let total_length: f64 = arcs.iter().map(|a| a.angular_length()).sum();
    if total_length < 1e-12 {
        return Vec3::new(1.0, 0.0, 0.0);
    }
    let target = (t * total_length).clamp(0.0, total_length);
    let mut remaining = target;
    for arc in &arcs {
        let len = arc.angular_length();
        if remaining <= len || len < 1e-12 {
            let local_t = if len < 1e-12 { 0.0 } else { (remaining / len).clamp(0.0, 1.0) };
            return arc.tangent_at(local_t);
        }
        remaining -= len;
    }
    arcs.last().map_or(Vec3::new(1.0, 0.0, 0.0), |a| a.tangent_at(0.99))
}

/// Computes velocity profiles for every active (non-retired) boundary in
/// `topology`, sorted ascending by [`BoundaryId`] (§4.7 batch analysis).
#[must_use]
pub fn batch_boundary_analysis(
    topology: &TopologySnapshot,
    kinematics: &KinematicsState,
    tick: Tick,
    sample_count: usize,
) -> Vec<BoundaryVelocityProfile> {
    let mut profiles: Vec<BoundaryVelocityProfile> = topology
        .boundaries
        .iter()
        .filter(|(_, boundary)| !boundary.is_retired)
        .map(|(id, boundary)| boundary_velocity_profile(*id, boundary, kinematics, tick, sample_count, true))
        .collect();
    profiles.sort_by_key(|p| p.boundary_id);
    profiles
}
