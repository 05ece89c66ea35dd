// SPDX-License-Identifier: Apache-2.0
//! Provenance chain assembly, validation, and digesting (§4.9).
//!
//! The digest follows `warp_core::receipt::TickReceipt`'s pattern: a format
//! version tag, an entry count, then each field folded in a fixed order.
//! Like that receipt digest, fields that describe the request rather than
//! what it resolved to (the query tick, the solver implementation id) are
//! deliberately excluded, so the digest stays stable across requests that
//! differ only in when they were asked, not in what they resolved.

use fantasim_core::config::ProvenanceStrictness;
use fantasim_core::hash::{Hash, Preimage, ZERO_HASH};
use fantasim_core::{BoundaryId, FantaSimError, FeatureId, JunctionId, ModelId, MotionSegmentId, PlateId, StageRotation, Tick};
use fantasim_geo::{Frame, FrameLink};
use fantasim_materialize::topology::TopologySnapshot;

/// Current query contract version, carried in every provenance chain.
pub const QUERY_CONTRACT_VERSION: u32 = 1;

/// Implementation id of the solver that produced a chain's result, recorded
/// so a future solver rewrite is distinguishable in historical chains.
pub const SOLVER_IMPLEMENTATION_ID: &str = "fantasim-geo/angle-sum-v1";

/// One rotation-segment reference in a provenance chain: the segment
/// consulted, plus a hash of the Euler pole/angle it carried, so two chains
/// referencing segments with identical ids but replaced poles are
/// distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RotationSegmentRef {
    /// The motion segment consulted.
    pub motion_segment_id: MotionSegmentId,
    /// `SHA-256` of the segment's quantized Euler pole and angle.
    pub euler_pole_hash: Hash,
}

/// Full provenance record for a single query result (§4.9).
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProvenanceChain {
    /// Source feature ids consulted.
    pub source_feature_ids: Vec<FeatureId>,
    /// Source boundary ids consulted.
    pub source_boundary_ids: Vec<BoundaryId>,
    /// Source junction ids consulted.
    pub source_junction_ids: Vec<JunctionId>,
    /// Plate the result was resolved against, if applicable.
    pub plate_id: Option<PlateId>,
    /// Kinematics model assigned to `plate_id`, and the tick the assignment
    /// took effect, if the plate has one.
    pub kinematics_model: Option<(ModelId, Tick)>,
    /// Rotation segments consulted while evaluating the result.
    pub rotation_segments: Vec<RotationSegmentRef>,
    /// Hash of the topology stream the result was reconstructed against.
    pub topology_stream_hash: Hash,
    /// Tick the consulted topology snapshot was materialized at.
    pub topology_reference_tick: Tick,
    /// Tick the query itself targeted.
    pub query_tick: Tick,
    /// Query contract version this chain was assembled under.
    pub query_contract_version: u32,
    /// Identifier of the solver implementation that produced the result.
    pub solver_implementation_id: String,
    /// Reference frame the result is expressed in.
    pub reference_frame: Frame,
}

impl ProvenanceChain {
    /// Validates the chain's completeness under `strictness` (§4.9).
    ///
    /// `Strict` requires at least one non-empty source list and a populated
    /// topology hash. `Lenient`/`Permissive` never reject here: a broken
    /// link under `Lenient` is recorded rather than rejected, and under
    /// `Permissive` it is expected to already have been omitted by the
    /// caller before the chain was assembled.
    ///
    /// # Errors
    /// Returns [`FantaSimError::InvalidArgument`] under `Strict` when no
    /// source list is populated, or the topology hash is all-zero.
    pub fn validate(&self, strictness: ProvenanceStrictness) -> Result<(), FantaSimError> {
        if strictness != ProvenanceStrictness::Strict {
            return Ok(());
        }
        let has_sources =
            !self.source_feature_ids.is_empty() || !self.source_boundary_ids.is_empty() || !self.source_junction_ids.is_empty();
        if !has_sources {
            return Err(FantaSimError::InvalidArgument {
                field: "provenance.sources",
                reason: "strict provenance requires at least one non-empty source list".to_string(),
            });
        }
        if self.topology_stream_hash == ZERO_HASH {
            return Err(FantaSimError::InvalidArgument {
                field: "provenance.topology_stream_hash",
                reason: "strict provenance requires a populated topology hash".to_string(),
            });
        }
        Ok(())
    }

    /// Canonical digest over this chain's resolved content (§4.9).
    #[must_use]
    pub fn digest(&self) -> Hash {
        let mut p = Preimage::new().field_u64(1); // format version tag

        p = p.field_u64(self.source_feature_ids.len() as u64);
        for id in &self.source_feature_ids {
            p = p.field(&id.raw().to_be_bytes());
        }
        p = p.field_u64(self.source_boundary_ids.len() as u64);
        for id in &self.source_boundary_ids {
            p = p.field(&id.raw().to_be_bytes());
        }
        p = p.field_u64(self.source_junction_ids.len() as u64);
        for id in &self.source_junction_ids {
            p = p.field(&id.raw().to_be_bytes());
        }

        p = match self.plate_id {
            Some(id) => p.field(&[1]).field(&id.raw().to_be_bytes()),
            None => p.field(&[0]),
        };
        p = match self.kinematics_model {
            Some((model, tick)) => p.field(&[1]).field(&model.raw().to_be_bytes()).field_i64(tick.index()),
            None => p.field(&[0]),
        };

        p = p.field_u64(self.rotation_segments.len() as u64);
        for segment in &self.rotation_segments {
            p = p.field(&segment.motion_segment_id.raw().to_be_bytes()).field(&segment.euler_pole_hash);
        }

        p.field(&self.topology_stream_hash)
            .field_i64(self.topology_reference_tick.index())
            .field_u64(u64::from(self.query_contract_version))
            .field(frame_discriminant(&self.reference_frame).as_bytes())
            .finish()
    }
}

fn frame_discriminant(frame: &Frame) -> String {
    match frame {
        Frame::MantleFrame => "Mantle".to_string(),
        Frame::AbsoluteFrame => "Absolute".to_string(),
        Frame::PlateAnchor { plate_id } => format!("Anchor:{plate_id}"),
        Frame::CustomFrame { chain } => chain
            .iter()
            .map(|link| match link {
                FrameLink::Mantle => "M".to_string(),
                FrameLink::AnchorTo(plate_id) => format!("A:{plate_id}"),
            })
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// Builds the reference-frame fragment of a reconstruction/velocity cache
/// key (§4.9's cache-key invariant: the frame is always part of the key).
///
/// # Errors
/// Returns [`FantaSimError::InvalidArgument`] if `frame` is an empty
/// [`Frame::CustomFrame`] chain: an empty custom frame is rejected outright,
/// not treated as a silent identity transform.
pub fn frame_cache_fragment(frame: &Frame) -> Result<String, FantaSimError> {
    if let Frame::CustomFrame { chain } = frame {
        if chain.is_empty() {
            return Err(FantaSimError::InvalidArgument {
                field: "frame",
                reason: "reference frame chain must not be empty".to_string(),
            });
        }
    }
    Ok(frame_discriminant(frame))
}

/// Computes the topology-stream hash carried in every provenance chain:
/// `SHA-256(last_event_sequence)`, the same construction
/// `fantasim_geo::partition::cache_key` folds into its own cache key, so a
/// provenance chain's topology hash and a partition's cache key derive from
/// the same canonical fact about the snapshot.
#[must_use]
pub fn topology_stream_hash(topology: &TopologySnapshot) -> Hash {
    Preimage::new().field_u64(topology.last_event_sequence).finish()
}

/// Hashes a stage rotation's quantized Euler pole and angle, so a
/// [`RotationSegmentRef`] changes when the segment it names is replaced in
/// place (§4.4 upsert semantics keep the segment id stable across a pole
/// change).
#[must_use]
pub(crate) fn stage_rotation_hash(stage: StageRotation) -> Hash {
    Preimage::new()
        .field_i64(stage.pole_lat_microdeg)
        .field_i64(stage.pole_lon_microdeg)
        .field_i64(stage.angle_microdeg)
        .finish()
}
