// SPDX-License-Identifier: Apache-2.0
//! `QueryPlateId` query: resolves which plate owns a point on the sphere at
//! a tick (§4.9).

use fantasim_core::config::TolerancePolicy;
use fantasim_core::{BoundaryId, FantaSimError, PlateId, Tick, Vec3};
use fantasim_geo::partition::{self, PartitionOptions};
use fantasim_geo::spherical::{contains_point, resolve_epsilon, GreatCircleArc};
use fantasim_geo::Frame;
use fantasim_materialize::topology::TopologySnapshot;
use tracing::instrument;

use crate::provenance::{topology_stream_hash, ProvenanceChain, QUERY_CONTRACT_VERSION, SOLVER_IMPLEMENTATION_ID};

/// How confidently a point was attributed to a plate (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum PlateAssignmentConfidence {
    /// The point falls inside exactly one plate's polygon.
    Certain,
    /// The point falls inside more than one plate's polygon (a polygon
    /// overlap in the underlying partition).
    Uncertain,
    /// The point falls within the resolved epsilon of an active boundary.
    Boundary,
    /// The point falls inside no plate's polygon.
    Unassigned,
}

/// One candidate plate for an [`PlateAssignmentResult`], with its relative
/// probability of ownership.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PlateCandidate {
    /// The candidate plate.
    pub plate_id: PlateId,
    /// Probability mass assigned to this candidate; candidates in a single
    /// result always sum to `1.0`.
    pub probability: f64,
}

/// Full result of a [`query_plate_id`] call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PlateAssignmentResult {
    /// The resolved plate, if the assignment is unambiguous.
    pub plate_id: Option<PlateId>,
    /// How confident the resolution is.
    pub confidence: PlateAssignmentConfidence,
    /// All candidates considered, in descending probability order.
    pub candidates: Vec<PlateCandidate>,
    /// Provenance chain for this resolution.
    pub provenance: ProvenanceChain,
}

/// Resolves the plate owning `point` on the unit sphere, as of `tick`
/// (§4.9 `QueryPlateId`).
///
/// The topology is partitioned into per-plate polygons under `tolerance`,
/// then tested for containment: zero matches is `Unassigned`, exactly one
/// is `Certain`, more than one (an overlap in the partition) is
/// `Uncertain` with candidate probabilities split evenly. A point within
/// the resolved epsilon of any active boundary is reported as `Boundary`
/// regardless of containment, with the boundary's two flanking plates as
/// 50/50 candidates.
///
/// # Errors
/// Propagates [`FantaSimError`] from the underlying partition solve.
#[instrument(skip(topology))]
pub fn query_plate_id(topology: &TopologySnapshot, point: Vec3, tick: Tick, tolerance: TolerancePolicy) -> Result<PlateAssignmentResult, FantaSimError> {
    let options = PartitionOptions { tolerance, ..PartitionOptions::default() };
    let partitioned = partition::partition(topology, options)?;

    let epsilon = resolve_boundary_epsilon(topology, tolerance);
    let nearest_boundary = find_nearest_boundary(topology, point, epsilon);

    let mut containing: Vec<PlateId> = partitioned
        .polygons
        .values()
        .filter(|polygon| {
            let in_loop = contains_point(&polygon.outer_loop, point);
            let inside = if polygon.is_complement { !in_loop } else { in_loop };
            inside && !polygon.holes.iter().any(|hole| contains_point(hole, point))
        })
        .map(|polygon| polygon.plate_id)
        .collect();
    containing.sort();

    let (plate_id, confidence, candidates, source_boundary_ids) = if let Some((boundary_id, boundary)) = nearest_boundary {
        (
            None,
            PlateAssignmentConfidence::Boundary,
            vec![
                PlateCandidate { plate_id: boundary.left, probability: 0.5 },
                PlateCandidate { plate_id: boundary.right, probability: 0.5 },
            ],
            vec![boundary_id],
        )
    } else {
        match containing.len() {
            0 => (None, PlateAssignmentConfidence::Unassigned, Vec::new(), Vec::new()),
            1 => (
                Some(containing[0]),
                PlateAssignmentConfidence::Certain,
                vec![PlateCandidate { plate_id: containing[0], probability: 1.0 }],
                Vec::new(),
            ),
            n => {
                let probability = 1.0 / n as f64;
                (
                    None,
                    PlateAssignmentConfidence::Uncertain,
                    containing.iter().map(|&plate_id| PlateCandidate { plate_id, probability }).collect(),
                    Vec::new(),
                )
            }
        }
    };

    let provenance = ProvenanceChain {
        source_feature_ids: Vec::new(),
        source_boundary_ids,
        source_junction_ids: Vec::new(),
        plate_id,
        kinematics_model: None,
        rotation_segments: Vec::new(),
        topology_stream_hash: topology_stream_hash(topology),
        topology_reference_tick: tick,
        query_tick: tick,
        query_contract_version: QUERY_CONTRACT_VERSION,
        solver_implementation_id: SOLVER_IMPLEMENTATION_ID.to_string(),
        reference_frame: Frame::MantleFrame,
    };

    Ok(PlateAssignmentResult {
        plate_id,
        confidence,
        candidates,
        provenance,
    })
}

pub(crate) fn resolve_boundary_epsilon(topology: &TopologySnapshot, tolerance: TolerancePolicy) -> f64 {
    match tolerance {
        TolerancePolicy::Strict => 0.0,
        TolerancePolicy::Lenient { epsilon } => epsilon,
        TolerancePolicy::Default => {
            let mut lengths = Vec::new();
            for boundary in topology.boundaries.values() {
                if boundary.is_retired {
                    continue;
                }
                for window in boundary.geometry.points.windows(2) {
                    lengths.push(window[0].dot(window[1]).clamp(-1.0, 1.0).acos());
                }
            }
            let average = if lengths.is_empty() { 0.0 } else { lengths.iter().sum::<f64>() / lengths.len() as f64 };
            resolve_epsilon(average, lengths.len())
        }
    }
}

pub(crate) fn find_nearest_boundary<'a>(
    topology: &'a TopologySnapshot,
    point: Vec3,
    epsilon: f64,
) -> Option<(BoundaryId, &'a fantasim_materialize::topology::Boundary)> {
    if epsilon <= 0.0 {
        return None;
    }
    topology
        .boundaries
        .iter()
        .filter(|(_, boundary)| !boundary.is_retired)
        .filter_map(|(id, boundary)| {
            let distance = boundary
                .geometry
                .points
                .windows(2)
                .map(|w| GreatCircleArc::new(w[0], w[1]).distance_to(point))
                .fold(f64::INFINITY, f64::min);
            (distance <= epsilon).then_some((*id, boundary, distance))
        })
        .min_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(id, boundary, _)| (id, boundary))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fantasim_events::payload::{BoundaryGeometry, BoundaryType};
    use fantasim_materialize::topology::{Boundary, Plate};

    fn octant_boundaries() -> (TopologySnapshot, PlateId, PlateId) {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let c = Vec3::new(0.0, 0.0, 1.0);
        let plate_a = PlateId::from_label("a");
        let plate_b = PlateId::from_label("b");

        let mut snapshot = TopologySnapshot::empty();
        snapshot.plates.insert(plate_a, Plate { is_retired: false, retirement_reason: None });
        snapshot.plates.insert(plate_b, Plate { is_retired: false, retirement_reason: None });

        for (i, (p, q)) in [(a, b), (b, c), (c, a)].iter().enumerate() {
            let id = BoundaryId::from_label(&format!("edge{i}"));
            snapshot.boundaries.insert(
                id,
                Boundary {
                    left: plate_a,
                    right: plate_b,
                    boundary_type: BoundaryType::Transform,
                    geometry: BoundaryGeometry { points: vec![*p, *q] },
                    is_retired: false,
                },
            );
        }
        (snapshot, plate_a, plate_b)
    }

    #[test]
    fn centroid_of_plate_a_loop_is_certain() {
        let (snapshot, plate_a, plate_b) = octant_boundaries();
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let c = Vec3::new(0.0, 0.0, 1.0);
        let centroid = (a + b + c).normalize();
        let result = query_plate_id(&snapshot, centroid, Tick::new(1), TolerancePolicy::Strict).unwrap();
        assert_eq!(result.confidence, PlateAssignmentConfidence::Certain);
        assert!(result.plate_id == Some(plate_a) || result.plate_id == Some(plate_b));
    }

    #[test]
    fn far_point_is_owned_by_the_complement_plate() {
        let (snapshot, plate_a, plate_b) = octant_boundaries();
        let far = Vec3::new(-1.0, -1.0, -1.0).normalize();
        let result = query_plate_id(&snapshot, far, Tick::new(1), TolerancePolicy::Strict).unwrap();
        assert_eq!(result.confidence, PlateAssignmentConfidence::Certain);
        assert!(result.plate_id == Some(plate_a) || result.plate_id == Some(plate_b));
    }

    #[test]
    fn point_on_boundary_edge_is_reported_as_boundary() {
        let (snapshot, plate_a, plate_b) = octant_boundaries();
        let on_edge = GreatCircleArc::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)).point_at(0.5);
        let result = query_plate_id(&snapshot, on_edge, Tick::new(1), TolerancePolicy::Lenient { epsilon: 0.2 }).unwrap();
        assert_eq!(result.confidence, PlateAssignmentConfidence::Boundary);
        let candidate_ids: Vec<PlateId> = result.candidates.iter().map(|c| c.plate_id).collect();
        assert!(candidate_ids.contains(&plate_a) || candidate_ids.contains(&plate_b));
    }
}
