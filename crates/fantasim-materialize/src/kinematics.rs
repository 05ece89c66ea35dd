// SPDX-License-Identifier: Apache-2.0
//! Kinematics materializer: per-plate motion segment schedule and absolute
//! rotation evaluation by the finite-rotation method (§4.4).

use fantasim_core::math::microdegrees_to_radians;
use fantasim_core::{FantaSimError, ModelId, MotionSegmentId, PlateId, Quat, StageRotation, Tick, Vec3};
use fantasim_events::envelope::EventRecord;
use fantasim_events::payload::KinematicsEvent;
use std::collections::{BTreeMap, HashMap};
use tracing::instrument;

/// One plate's motion schedule entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSegment {
    /// Stable identifier of this segment.
    pub segment_id: MotionSegmentId,
    /// Validity start, exclusive.
    pub tick_a: Tick,
    /// Validity end, inclusive.
    pub tick_b: Tick,
    /// Stage rotation applied over `(tick_a, tick_b]`.
    pub stage_rotation: StageRotation,
}

/// A single plate's ordered motion schedule.
#[derive(Debug, Clone, Default)]
pub struct PlateKinematics {
    segments: Vec<MotionSegment>,
    model: Option<(ModelId, Tick)>,
}

impl PlateKinematics {
    fn upsert(&mut self, segment: MotionSegment) {
        if let Some(existing) = self.segments.iter_mut().find(|s| s.segment_id == segment.segment_id) {
            *existing = segment;
        } else {
            self.segments.push(segment);
        }
        self.resort();
    }

    fn retire(&mut self, segment_id: MotionSegmentId) {
        self.segments.retain(|s| s.segment_id != segment_id);
    }

    fn resort(&mut self) {
        self.segments
            .sort_by(|a, b| b.tick_a.cmp(&a.tick_a).then(a.tick_b.cmp(&b.tick_b)).then(a.segment_id.cmp(&b.segment_id)));
    }

    /// The segments currently scheduled, ordered `(tick_a desc, tick_b asc,
    /// segment_id asc)` as §4.4 requires for selection.
    #[must_use]
    pub fn segments(&self) -> &[MotionSegment] {
        &self.segments
    }

    /// The kinematics model most recently assigned to this plate, and the
    /// tick at which the assignment took effect, if any has been recorded.
    #[must_use]
    pub fn model_assignment(&self) -> Option<(ModelId, Tick)> {
        self.model
    }
}

/// Materialized kinematics state across all plates.
#[derive(Debug, Clone, Default)]
pub struct KinematicsState {
    plates: BTreeMap<PlateId, PlateKinematics>,
    last_event_sequence: u64,
}

impl KinematicsState {
    fn apply(&mut self, event: &KinematicsEvent) {
        match event {
            KinematicsEvent::MotionSegmentUpserted {
                plate_id,
                segment_id,
                tick_a,
                tick_b,
                stage_rotation,
            } => {
                self.plates.entry(*plate_id).or_default().upsert(MotionSegment {
                    segment_id: *segment_id,
                    tick_a: *tick_a,
                    tick_b: *tick_b,
                    stage_rotation: *stage_rotation,
                });
            }
            KinematicsEvent::MotionSegmentRetired { plate_id, segment_id } => {
                if let Some(kinematics) = self.plates.get_mut(plate_id) {
                    kinematics.retire(*segment_id);
                }
            }
            KinematicsEvent::PlateMotionModelAssigned {
                plate_id,
                model_id,
                tick,
            } => {
                self.plates.entry(*plate_id).or_default().model = Some((*model_id, *tick));
            }
        }
    }

    /// Returns the motion schedule for `plate`, or `None` if the plate has
    /// no kinematics recorded.
    #[must_use]
    pub fn plate(&self, plate: PlateId) -> Option<&PlateKinematics> {
        self.plates.get(&plate)
    }

    /// Iterates every plate with recorded kinematics, ascending by id.
    pub fn plates(&self) -> impl Iterator<Item = (PlateId, &PlateKinematics)> {
        self.plates.iter().map(|(id, k)| (*id, k))
    }

    /// Highest event sequence folded into this state.
    #[must_use]
    pub fn last_event_sequence(&self) -> u64 {
        self.last_event_sequence
    }

    /// Evaluates `plate`'s absolute rotation at `tick` by the finite
    /// rotation method (§4.4).
    ///
    /// Returns identity for `tick <= 0` or if the plate has no segments.
    /// Missing kinematics never errors — it falls back to identity, per
    /// §7's "local recovery... missing kinematics -> zero velocity" policy.
    #[must_use]
    pub fn try_get_rotation(&self, plate: PlateId, tick: Tick) -> Quat {
        let Some(kinematics) = self.plates.get(&plate) else {
            return Quat::IDENTITY;
        };
        if tick.is_genesis_or_before() {
            return Quat::IDENTITY;
        }
        let mut memo = HashMap::new();
        rotation_at(kinematics.segments(), tick, &mut memo)
    }
}

fn delta_quaternion(stage: StageRotation, fraction: f64) -> Quat {
    let pole_lat = microdegrees_to_radians(stage.pole_lat_microdeg);
    let pole_lon = microdegrees_to_radians(stage.pole_lon_microdeg);
    let full_angle = microdegrees_to_radians(stage.angle_microdeg);
    let axis = Vec3::from_lat_lon_radians(pole_lat, pole_lon);
    Quat::from_axis_angle(axis, full_angle * fraction)
}

#[allow(clippy::cast_precision_loss)]
fn rotation_at(segments: &[MotionSegment], tick: Tick, memo: &mut HashMap<Tick, Quat>) -> Quat {
    if tick.is_genesis_or_before() {
        return Quat::IDENTITY;
    }
    if let Some(cached) = memo.get(&tick) {
        return *cached;
    }

    let covering = segments
        .iter()
        .find(|s| s.tick_a < tick && tick <= s.tick_b);

    let result = if let Some(segment) = covering {
        let span = (segment.tick_b.index() - segment.tick_a.index()) as f64;
        let fraction = if span > 0.0 {
            (tick.index() - segment.tick_a.index()) as f64 / span
        } else {
            1.0
        };
        let base = rotation_at(segments, segment.tick_a, memo);
        (base * delta_quaternion(segment.stage_rotation, fraction)).normalize()
    } else {
        match segments.iter().filter(|s| s.tick_b <= tick).max_by_key(|s| s.tick_b) {
            Some(segment) => rotation_at(segments, segment.tick_b, memo),
            None => Quat::IDENTITY,
        }
    };

    memo.insert(tick, result);
    result
}

/// Folds `records` into a [`KinematicsState`].
///
/// # Errors
/// This function is currently infallible but returns a `Result` to match
/// [`crate::topology::materialize`]'s shape and leave room for future
/// validation (e.g. overlapping-segment detection) without breaking the
/// signature.
#[instrument(skip(records))]
pub fn materialize(records: &[EventRecord<KinematicsEvent>]) -> Result<KinematicsState, FantaSimError> {
    let mut state = KinematicsState::default();
    for record in records {
        state.apply(&record.payload);
        state.last_event_sequence = record.sequence;
    }
    Ok(state)
}
