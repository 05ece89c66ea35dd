// SPDX-License-Identifier: Apache-2.0
//! `QueryVelocity` query: resolves a point's velocity, decomposed into its
//! rigid-plate-rotation and boundary-interaction components (§4.9).

use fantasim_core::config::TolerancePolicy;
use fantasim_core::{FantaSimError, Tick, Vec3};
use fantasim_geo::velocity::{self, FrameVelocity};
use fantasim_geo::Frame;
use fantasim_materialize::kinematics::KinematicsState;
use fantasim_materialize::topology::TopologySnapshot;
use tracing::instrument;

use crate::plate_query::{find_nearest_boundary, query_plate_id, resolve_boundary_epsilon};
use crate::provenance::{frame_cache_fragment, stage_rotation_hash, topology_stream_hash, ProvenanceChain, RotationSegmentRef, QUERY_CONTRACT_VERSION, SOLVER_IMPLEMENTATION_ID};

/// Breakdown of a resolved velocity into its contributing components
/// (§4.9).
///
/// `internal_deformation` is always [`Vec3::ZERO`]: this engine models
/// rigid-plate kinematics only, so a point's velocity is fully explained by
/// its owning plate's rotation plus, near a boundary, the neighboring
/// plate's relative motion.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct VelocityDecomposition {
    /// Velocity contributed by the owning plate's rigid rotation.
    pub plate_rotation: Vec3,
    /// Relative velocity against the nearest active boundary's far side, or
    /// zero if no boundary is within the resolved epsilon.
    pub boundary_interaction: Vec3,
    /// Always zero; this engine carries no intra-plate deformation model.
    pub internal_deformation: Vec3,
}

/// Full result of a [`query_velocity`] call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VelocityResult {
    /// Total velocity expressed in the requested frame.
    pub total: FrameVelocity,
    /// Component breakdown of the total.
    pub decomposition: VelocityDecomposition,
    /// Provenance chain for this resolution.
    pub provenance: ProvenanceChain,
}

/// Resolves the velocity of a point on the unit sphere at `tick`, expressed
/// in `frame` (§4.9 `QueryVelocity`).
///
/// The owning plate is resolved the same way as [`crate::plate_query::query_plate_id`];
/// an `Uncertain` or `Boundary` resolution falls back to its
/// highest-probability candidate so a velocity can still be reported.
///
/// # Errors
/// Returns [`FantaSimError::InvalidArgument`] if `frame` is an empty
/// [`Frame::CustomFrame`] chain, or if the point is owned by no plate at
/// all (`Unassigned`). Propagates [`FantaSimError::CyclicFrameReference`]
/// from frame composition.
#[instrument(skip(topology, kinematics))]
pub fn query_velocity(
    topology: &TopologySnapshot,
    kinematics: &KinematicsState,
    point: Vec3,
    tick: Tick,
    frame: &Frame,
    tolerance: TolerancePolicy,
) -> Result<VelocityResult, FantaSimError> {
    frame_cache_fragment(frame)?;

    let assignment = query_plate_id(topology, point, tick, tolerance)?;
    let plate_id = assignment
        .plate_id
        .or_else(|| assignment.candidates.first().map(|c| c.plate_id))
        .ok_or_else(|| FantaSimError::InvalidArgument {
            field: "point",
            reason: "point is not owned by any plate; velocity cannot be resolved".to_string(),
        })?;

    let total = velocity::compute_velocity_in_frame(point, plate_id, tick, frame, kinematics)?;
    let plate_rotation = velocity::absolute_velocity(kinematics, plate_id, point, tick);

    let epsilon = resolve_boundary_epsilon(topology, tolerance);
    let (boundary_interaction, source_boundary_ids) = match find_nearest_boundary(topology, point, epsilon) {
        Some((boundary_id, boundary)) => (
            velocity::relative_velocity(kinematics, boundary.left, boundary.right, point, tick),
            vec![boundary_id],
        ),
        None => (Vec3::ZERO, Vec::new()),
    };

    let rotation_segments = kinematics
        .plate(plate_id)
        .map(|plate_kinematics| {
            plate_kinematics
                .segments()
                .iter()
                .map(|segment| RotationSegmentRef {
                    motion_segment_id: segment.segment_id,
                    euler_pole_hash: stage_rotation_hash(segment.stage_rotation),
                })
                .collect()
        })
        .unwrap_or_default();
    let kinematics_model = kinematics.plate(plate_id).and_then(fantasim_materialize::PlateKinematics::model_assignment);

    let provenance = ProvenanceChain {
        source_feature_ids: Vec::new(),
        source_boundary_ids,
        source_junction_ids: Vec::new(),
        plate_id: Some(plate_id),
        kinematics_model,
        rotation_segments,
        topology_stream_hash: topology_stream_hash(topology),
        topology_reference_tick: tick,
        query_tick: tick,
        query_contract_version: QUERY_CONTRACT_VERSION,
        solver_implementation_id: SOLVER_IMPLEMENTATION_ID.to_string(),
        reference_frame: frame.clone(),
    };

    Ok(VelocityResult {
        total,
        decomposition: VelocityDecomposition {
            plate_rotation,
            boundary_interaction,
            internal_deformation: Vec3::ZERO,
        },
        provenance,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fantasim_core::hash::ZERO_HASH;
    use fantasim_core::{MotionSegmentId, PlateId, StageRotation};
    use fantasim_events::envelope::EventRecord;
    use fantasim_events::payload::KinematicsEvent;

    fn rotating_plate_state(plate: PlateId) -> KinematicsState {
        let record = EventRecord::new(
            "stream",
            0,
            Tick::new(0),
            ZERO_HASH,
            KinematicsEvent::MotionSegmentUpserted {
                plate_id: plate,
                segment_id: MotionSegmentId::from_label("s1"),
                tick_a: Tick::new(0),
                tick_b: Tick::new(1000),
                stage_rotation: StageRotation::new(0, 0, 90_000_000),
            },
        )
        .unwrap();
        fantasim_materialize::kinematics::materialize(&[record]).unwrap()
    }

    #[test]
    fn empty_custom_frame_is_rejected_before_any_resolution() {
        let topology = TopologySnapshot::empty();
        let kinematics = KinematicsState::default();
        let result = query_velocity(
            &topology,
            &kinematics,
            Vec3::new(1.0, 0.0, 0.0),
            Tick::new(10),
            &Frame::CustomFrame { chain: Vec::new() },
            TolerancePolicy::Strict,
        );
        assert!(matches!(result, Err(FantaSimError::InvalidArgument { .. })));
    }

    #[test]
    fn unassigned_point_errors() {
        let topology = TopologySnapshot::empty();
        let kinematics = KinematicsState::default();
        let result = query_velocity(
            &topology,
            &kinematics,
            Vec3::new(1.0, 0.0, 0.0),
            Tick::new(10),
            &Frame::MantleFrame,
            TolerancePolicy::Strict,
        );
        assert!(matches!(result, Err(FantaSimError::InvalidArgument { .. })));
    }

    #[test]
    fn internal_deformation_is_always_zero() {
        use fantasim_events::payload::{BoundaryGeometry, BoundaryType};
        use fantasim_materialize::topology::{Boundary, Plate};

        let plate_a = PlateId::from_label("a");
        let plate_b = PlateId::from_label("b");
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let c = Vec3::new(0.0, 0.0, 1.0);

        let mut topology = TopologySnapshot::empty();
        topology.plates.insert(plate_a, Plate { is_retired: false, retirement_reason: None });
        topology.plates.insert(plate_b, Plate { is_retired: false, retirement_reason: None });
        for (i, (p, q)) in [(a, b), (b, c), (c, a)].iter().enumerate() {
            topology.boundaries.insert(
                fantasim_core::BoundaryId::from_label(&format!("edge{i}")),
                Boundary {
                    left: plate_a,
                    right: plate_b,
                    boundary_type: BoundaryType::Transform,
                    geometry: BoundaryGeometry { points: vec![*p, *q] },
                    is_retired: false,
                },
            );
        }
        let kinematics = rotating_plate_state(plate_a);
        let centroid = (a + b + c).normalize();
        let result = query_velocity(&topology, &kinematics, centroid, Tick::new(10), &Frame::MantleFrame, TolerancePolicy::Strict).unwrap();
        assert_eq!(result.decomposition.internal_deformation, Vec3::ZERO);
    }
}
