// SPDX-License-Identifier: Apache-2.0
//! `Reconstruct` query: replays a feature set's present-day geometry to a
//! target tick under its owning plates' kinematics (§4.9).

use fantasim_core::config::ReconstructOptions;
use fantasim_core::{FantaSimError, FeatureId, FeatureSetId, PlateId, Tick, Vec3};
use fantasim_geo::Frame;
use fantasim_materialize::kinematics::KinematicsState;
use fantasim_materialize::topology::TopologySnapshot;
use tracing::instrument;

use crate::provenance::{stage_rotation_hash, topology_stream_hash, ProvenanceChain, RotationSegmentRef, QUERY_CONTRACT_VERSION, SOLVER_IMPLEMENTATION_ID};

/// One externally-supplied geometric feature belonging to a plate, present
/// at `reference_tick` in `geometry` and reconstructed to any other tick by
/// applying the owning plate's rotation delta.
///
/// A feature's geometry is caller-supplied input, not event-sourced: there
/// is no `FeatureCreated` event kind in the topology or kinematics streams,
/// the same way geographic features are externally-supplied inputs keyed to
/// a plate id in plate-reconstruction software generally.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Feature {
    /// Stable identifier of this feature.
    pub feature_id: FeatureId,
    /// Plate the feature is rigidly attached to.
    pub plate_id: PlateId,
    /// The feature's geometry (a polyline or point cloud) at `reference_tick`.
    pub geometry: Vec<Vec3>,
    /// Tick at which `geometry` is the feature's true position.
    pub reference_tick: Tick,
}

/// A named collection of features reconstructed together.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FeatureSet {
    /// Stable identifier of this feature set.
    pub feature_set_id: FeatureSetId,
    /// Member features.
    pub features: Vec<Feature>,
}

/// One feature's reconstructed geometry.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReconstructedFeature {
    /// The source feature id this entry reconstructs.
    pub source_feature_id: FeatureId,
    /// Geometry carried from its reference tick to the target tick.
    pub geometry: Vec<Vec3>,
}

/// Full result of a [`reconstruct`] call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReconstructResult {
    /// Reconstructed features, sorted ascending by `source_feature_id`
    /// (§4.9).
    pub features: Vec<ReconstructedFeature>,
    /// Provenance chain for this reconstruction.
    pub provenance: ProvenanceChain,
}

/// Reconstructs every feature in `feature_set` to `target_tick` (§4.9
/// `Reconstruct`).
///
/// Each feature's geometry is carried forward by the relative rotation
/// `R(target_tick) * R(reference_tick)^-1` of its owning plate: the
/// finite-rotation-method delta between the two ticks, applied pointwise.
///
/// `topology_reference_tick` is the tick the caller materialized `topology`
/// at; it is supplied rather than derived, since a [`TopologySnapshot`]
/// only records the event sequence it was folded from, not the tick it was
/// requested at.
///
/// # Errors
/// Propagates [`FantaSimError::InvalidArgument`] from provenance validation
/// when `options.provenance` is `Strict` and the feature set is empty.
#[instrument(skip(feature_set, topology, kinematics))]
pub fn reconstruct(
    feature_set: &FeatureSet,
    topology: &TopologySnapshot,
    topology_reference_tick: Tick,
    kinematics: &KinematicsState,
    target_tick: Tick,
    options: ReconstructOptions,
) -> Result<ReconstructResult, FantaSimError> {
    let mut features = Vec::with_capacity(feature_set.features.len());
    let mut rotation_segments = Vec::new();
    let mut plates_seen: Vec<PlateId> = Vec::new();

    for feature in &feature_set.features {
        let from = kinematics.try_get_rotation(feature.plate_id, feature.reference_tick);
        let to = kinematics.try_get_rotation(feature.plate_id, target_tick);
        let delta = (to * from.conjugate()).normalize();
        let geometry = feature.geometry.iter().map(|&p| delta.rotate(p)).collect();

        features.push(ReconstructedFeature {
            source_feature_id: feature.feature_id,
            geometry,
        });

        if !plates_seen.contains(&feature.plate_id) {
            plates_seen.push(feature.plate_id);
            if let Some(plate_kinematics) = kinematics.plate(feature.plate_id) {
                rotation_segments.extend(plate_kinematics.segments().iter().map(|segment| RotationSegmentRef {
                    motion_segment_id: segment.segment_id,
                    euler_pole_hash: stage_rotation_hash(segment.stage_rotation),
                }));
            }
        }
    }

    features.sort_by_key(|f| f.source_feature_id);

    let source_feature_ids: Vec<FeatureId> = {
        let mut ids: Vec<FeatureId> = feature_set.features.iter().map(|f| f.feature_id).collect();
        ids.sort();
        ids
    };

    let provenance = ProvenanceChain {
        source_feature_ids,
        source_boundary_ids: Vec::new(),
        source_junction_ids: Vec::new(),
        plate_id: None,
        kinematics_model: None,
        rotation_segments,
        topology_stream_hash: topology_stream_hash(topology),
        topology_reference_tick,
        query_tick: target_tick,
        query_contract_version: QUERY_CONTRACT_VERSION,
        solver_implementation_id: SOLVER_IMPLEMENTATION_ID.to_string(),
        reference_frame: Frame::MantleFrame,
    };
    provenance.validate(options.provenance)?;

    Ok(ReconstructResult { features, provenance })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fantasim_core::config::ProvenanceStrictness;
    use fantasim_core::hash::ZERO_HASH;
    use fantasim_core::StageRotation;
    use fantasim_events::envelope::EventRecord;
    use fantasim_events::payload::KinematicsEvent;
    use fantasim_materialize::kinematics;

    fn quarter_turn_about_z(plate: PlateId, segment: &str) -> KinematicsState {
        let event = KinematicsEvent::MotionSegmentUpserted {
            plate_id: plate,
            segment_id: fantasim_core::MotionSegmentId::from_label(segment),
            tick_a: Tick::GENESIS,
            tick_b: Tick::new(10),
            stage_rotation: StageRotation {
                pole_lat_microdeg: 90_000_000,
                pole_lon_microdeg: 0,
                angle_microdeg: 90_000_000,
            },
        };
        let record = EventRecord::new("stream", 1, Tick::new(10), ZERO_HASH, event).unwrap();
        kinematics::materialize(&[record]).unwrap()
    }

    #[test]
    fn single_feature_rotates_by_plate_delta() {
        let plate = PlateId::from_label("pacific");
        let kinematics = quarter_turn_about_z(plate, "seg1");
        let feature_set = FeatureSet {
            feature_set_id: FeatureSetId::from_label("coastline"),
            features: vec![Feature {
                feature_id: FeatureId::from_label("point-a"),
                plate_id: plate,
                geometry: vec![Vec3::new(1.0, 0.0, 0.0)],
                reference_tick: Tick::GENESIS,
            }],
        };
        let topology = TopologySnapshot::empty();
        let result = reconstruct(
            &feature_set,
            &topology,
            Tick::GENESIS,
            &kinematics,
            Tick::new(10),
            ReconstructOptions::default(),
        )
        .unwrap();
        assert_eq!(result.features.len(), 1);
        let rotated = result.features[0].geometry[0];
        assert!((rotated - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn features_are_returned_sorted_by_id() {
        let plate = PlateId::from_label("pacific");
        let kinematics = KinematicsState::default();
        let feature_set = FeatureSet {
            feature_set_id: FeatureSetId::from_label("set"),
            features: vec![
                Feature {
                    feature_id: FeatureId::from_label("zzz"),
                    plate_id: plate,
                    geometry: vec![Vec3::new(1.0, 0.0, 0.0)],
                    reference_tick: Tick::GENESIS,
                },
                Feature {
                    feature_id: FeatureId::from_label("aaa"),
                    plate_id: plate,
                    geometry: vec![Vec3::new(0.0, 1.0, 0.0)],
                    reference_tick: Tick::GENESIS,
                },
            ],
        };
        let topology = TopologySnapshot::empty();
        let result = reconstruct(
            &feature_set,
            &topology,
            Tick::GENESIS,
            &kinematics,
            Tick::new(5),
            ReconstructOptions::default(),
        )
        .unwrap();
        let ids: Vec<FeatureId> = result.features.iter().map(|f| f.source_feature_id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn empty_feature_set_fails_strict_provenance() {
        let kinematics = KinematicsState::default();
        let feature_set = FeatureSet {
            feature_set_id: FeatureSetId::from_label("empty"),
            features: Vec::new(),
        };
        let topology = TopologySnapshot::empty();
        let mut options = ReconstructOptions::default();
        options.provenance = ProvenanceStrictness::Strict;
        let result = reconstruct(&feature_set, &topology, Tick::GENESIS, &kinematics, Tick::new(5), options);
        assert!(matches!(result, Err(FantaSimError::InvalidArgument { .. })));
    }
}
