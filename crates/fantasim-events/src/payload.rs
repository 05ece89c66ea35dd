// SPDX-License-Identifier: Apache-2.0
//! Topology and kinematics event payload variants.
//!
//! Modelled as a tagged sum type per §9 ("Polymorphic events... no
//! inheritance is required"), serialized by `serde`'s external tagging so
//! the CBOR-framed payload array carries a discriminator string.

use fantasim_core::{BoundaryId, JunctionId, ModelId, MotionSegmentId, PlateId, StageRotation, Tick, Vec3};
use serde::{Deserialize, Serialize};

/// Boundary classification (convergent, divergent, transform, unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryType {
    /// Plates moving apart (e.g. mid-ocean ridge).
    Divergent,
    /// Plates moving together (e.g. subduction zone).
    Convergent,
    /// Plates sliding past one another (e.g. strike-slip fault).
    Transform,
    /// Classification not yet determined.
    Unknown,
}

/// A boundary's geometry: an ordered polyline of points on the unit sphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryGeometry {
    /// Ordered vertices of the polyline, in (left, right)-consistent
    /// winding order.
    pub points: Vec<Vec3>,
}

impl BoundaryGeometry {
    /// Builds a geometry from an explicit point list.
    #[must_use]
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }
}

/// Topology event kinds (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TopologyEvent {
    /// A new plate came into existence.
    PlateCreated {
        /// Identifier of the created plate.
        plate_id: PlateId,
    },
    /// A plate was retired (no longer active).
    PlateRetired {
        /// Identifier of the retired plate.
        plate_id: PlateId,
        /// Human-readable retirement reason.
        reason: String,
    },
    /// A new boundary was created between two plates.
    BoundaryCreated {
        /// Identifier of the created boundary.
        boundary_id: BoundaryId,
        /// Plate on the boundary's left side.
        left: PlateId,
        /// Plate on the boundary's right side.
        right: PlateId,
        /// Boundary classification.
        boundary_type: BoundaryType,
        /// Initial geometry.
        geometry: BoundaryGeometry,
    },
    /// A boundary's classification changed.
    BoundaryTypeChanged {
        /// Identifier of the affected boundary.
        boundary_id: BoundaryId,
        /// New classification.
        boundary_type: BoundaryType,
    },
    /// A boundary's geometry was replaced.
    BoundaryGeometryUpdated {
        /// Identifier of the affected boundary.
        boundary_id: BoundaryId,
        /// Replacement geometry.
        new_geometry: BoundaryGeometry,
    },
    /// A boundary was retired.
    BoundaryRetired {
        /// Identifier of the retired boundary.
        boundary_id: BoundaryId,
    },
    /// A junction of several boundaries was created.
    JunctionCreated {
        /// Identifier of the created junction.
        junction_id: JunctionId,
        /// Boundaries meeting at this junction.
        boundary_ids: Vec<BoundaryId>,
        /// Junction location on the unit sphere.
        location: Vec3,
    },
    /// A junction's boundary membership or location changed.
    JunctionUpdated {
        /// Identifier of the affected junction.
        junction_id: JunctionId,
        /// Updated boundary membership.
        boundary_ids: Vec<BoundaryId>,
        /// Updated location on the unit sphere.
        location: Vec3,
    },
    /// A junction was retired.
    JunctionRetired {
        /// Identifier of the retired junction.
        junction_id: JunctionId,
    },
}

/// Kinematics event kinds (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KinematicsEvent {
    /// A motion segment was created or replaced in place.
    MotionSegmentUpserted {
        /// Plate the segment belongs to.
        plate_id: PlateId,
        /// Identifier of the segment (stable across replacement).
        segment_id: MotionSegmentId,
        /// Segment validity start, exclusive.
        tick_a: Tick,
        /// Segment validity end, inclusive. Must satisfy `tick_a < tick_b`.
        tick_b: Tick,
        /// Stage rotation applied over `(tick_a, tick_b]`.
        stage_rotation: StageRotation,
    },
    /// A motion segment was retired (removed from the plate's schedule).
    MotionSegmentRetired {
        /// Plate the segment belonged to.
        plate_id: PlateId,
        /// Identifier of the retired segment.
        segment_id: MotionSegmentId,
    },
    /// A plate was assigned to a motion model, as metadata only.
    PlateMotionModelAssigned {
        /// Plate being assigned.
        plate_id: PlateId,
        /// Model identifier.
        model_id: ModelId,
        /// Tick at which the assignment takes effect.
        tick: Tick,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn motion_segment_upserted_round_trips_through_cbor() {
        let event = KinematicsEvent::MotionSegmentUpserted {
            plate_id: PlateId::from_label("pacific"),
            segment_id: MotionSegmentId::from_label("seg-1"),
            tick_a: Tick::new(0),
            tick_b: Tick::new(100),
            stage_rotation: StageRotation::new(10_000_000, 20_000_000, 500_000),
        };
        let mut buf = Vec::new();
        ciborium::into_writer(&event, &mut buf).unwrap();
        let decoded: KinematicsEvent = ciborium::from_reader(buf.as_slice()).unwrap();
        assert_eq!(decoded, event);
    }
}
