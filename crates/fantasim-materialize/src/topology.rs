// SPDX-License-Identifier: Apache-2.0
//! Topology materializer: folds `TopologyEvent`s into a plate/boundary/
//! junction snapshot at a target tick (§4.3).

use fantasim_core::config::TickFilterMode;
use fantasim_core::{BoundaryId, FantaSimError, JunctionId, PlateId, Tick};
use fantasim_events::envelope::EventRecord;
use fantasim_events::payload::{BoundaryGeometry, BoundaryType, TopologyEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

/// A plate's materialized state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plate {
    /// Whether the plate has been retired.
    pub is_retired: bool,
    /// Retirement reason, if retired.
    pub retirement_reason: Option<String>,
}

/// A boundary's materialized state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    /// Plate on the boundary's left side.
    pub left: PlateId,
    /// Plate on the boundary's right side.
    pub right: PlateId,
    /// Current classification.
    pub boundary_type: BoundaryType,
    /// Current geometry.
    pub geometry: BoundaryGeometry,
    /// Whether the boundary has been retired.
    pub is_retired: bool,
}

/// A junction's materialized state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    /// Boundaries meeting at this junction.
    pub boundary_ids: Vec<BoundaryId>,
    /// Location on the unit sphere.
    pub location: fantasim_core::Vec3,
    /// Whether the junction has been retired.
    pub is_retired: bool,
}

/// Immutable topology snapshot at a tick: canonically ordered so two folds
/// of the same events yield structurally identical output (§4.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    /// Schema version of this snapshot shape.
    pub schema_version: u32,
    /// Plates, ordered by [`PlateId`] ascending.
    pub plates: BTreeMap<PlateId, Plate>,
    /// Boundaries, ordered by [`BoundaryId`] ascending.
    pub boundaries: BTreeMap<BoundaryId, Boundary>,
    /// Junctions, ordered by [`JunctionId`] ascending.
    pub junctions: BTreeMap<JunctionId, Junction>,
    /// Highest event sequence folded into this snapshot.
    pub last_event_sequence: u64,
}

impl TopologySnapshot {
    /// An empty snapshot with no plates, boundaries, or junctions.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            schema_version: 1,
            plates: BTreeMap::new(),
            boundaries: BTreeMap::new(),
            junctions: BTreeMap::new(),
            last_event_sequence: 0,
        }
    }

    fn apply(&mut self, event: &TopologyEvent) {
        match event {
            TopologyEvent::PlateCreated { plate_id } => {
                self.plates.entry(*plate_id).or_insert(Plate {
                    is_retired: false,
                    retirement_reason: None,
                });
            }
            TopologyEvent::PlateRetired { plate_id, reason } => {
                if let Some(plate) = self.plates.get_mut(plate_id) {
                    plate.is_retired = true;
                    plate.retirement_reason = Some(reason.clone());
                }
            }
            TopologyEvent::BoundaryCreated {
                boundary_id,
                left,
                right,
                boundary_type,
                geometry,
            } => {
                self.boundaries.entry(*boundary_id).or_insert(Boundary {
                    left: *left,
                    right: *right,
                    boundary_type: *boundary_type,
                    geometry: geometry.clone(),
                    is_retired: false,
                });
            }
            TopologyEvent::BoundaryTypeChanged {
                boundary_id,
                boundary_type,
            } => {
                if let Some(boundary) = self.boundaries.get_mut(boundary_id) {
                    boundary.boundary_type = *boundary_type;
                }
            }
            TopologyEvent::BoundaryGeometryUpdated {
                boundary_id,
                new_geometry,
            } => {
                if let Some(boundary) = self.boundaries.get_mut(boundary_id) {
                    boundary.geometry = new_geometry.clone();
                }
            }
            TopologyEvent::BoundaryRetired { boundary_id } => {
                if let Some(boundary) = self.boundaries.get_mut(boundary_id) {
                    boundary.is_retired = true;
                }
            }
            TopologyEvent::JunctionCreated {
                junction_id,
                boundary_ids,
                location,
            } => {
                self.junctions.entry(*junction_id).or_insert(Junction {
                    boundary_ids: boundary_ids.clone(),
                    location: *location,
                    is_retired: false,
                });
            }
            TopologyEvent::JunctionUpdated {
                junction_id,
                boundary_ids,
                location,
            } => {
                if let Some(junction) = self.junctions.get_mut(junction_id) {
                    junction.boundary_ids = boundary_ids.clone();
                    junction.location = *location;
                }
            }
            TopologyEvent::JunctionRetired { junction_id } => {
                if let Some(junction) = self.junctions.get_mut(junction_id) {
                    junction.is_retired = true;
                }
            }
        }
    }
}

/// Folds `records` into a [`TopologySnapshot`] at `target_tick`, applying
/// the tick filter named by `mode` (§4.3).
///
/// `Auto` conservatively behaves as `ScanAll`: no mechanism for a stream to
/// prove tick-monotonicity is available at this layer, so the safe choice
/// is a full scan (recorded as an open-question decision).
#[instrument(skip(records))]
pub fn materialize(
    records: &[EventRecord<TopologyEvent>],
    target_tick: Tick,
    mode: TickFilterMode,
) -> Result<TopologySnapshot, FantaSimError> {
    let mut snapshot = TopologySnapshot::empty();
    let iter = records.iter().filter(|r| r.tick <= target_tick);

    match mode {
        TickFilterMode::BreakOnFirstBeyondTick => {
            for record in records {
                if record.tick > target_tick {
                    break;
                }
                snapshot.apply(&record.payload);
                snapshot.last_event_sequence = record.sequence;
            }
        }
        TickFilterMode::ScanAll | TickFilterMode::Auto => {
            for record in iter {
                snapshot.apply(&record.payload);
                snapshot.last_event_sequence = record.sequence;
            }
        }
    }

    Ok(snapshot)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fantasim_core::hash::ZERO_HASH;

    fn record(seq: u64, tick: i64, event: TopologyEvent) -> EventRecord<TopologyEvent> {
        EventRecord::new("stream", seq, Tick::new(tick), ZERO_HASH, event).unwrap()
    }

    #[test]
    fn plate_created_then_retired() {
        let plate = PlateId::from_label("pacific");
        let records = vec![
            record(0, 1, TopologyEvent::PlateCreated { plate_id: plate }),
            record(
                1,
                2,
                TopologyEvent::PlateRetired {
                    plate_id: plate,
                    reason: "subducted".to_string(),
                },
            ),
        ];
        let snapshot = materialize(&records, Tick::new(2), TickFilterMode::ScanAll).unwrap();
        let state = snapshot.plates.get(&plate).unwrap();
        assert!(state.is_retired);
        assert_eq!(state.retirement_reason.as_deref(), Some("subducted"));
    }

    #[test]
    fn events_beyond_target_tick_are_excluded() {
        let plate = PlateId::from_label("nazca");
        let records = vec![
            record(0, 1, TopologyEvent::PlateCreated { plate_id: plate }),
            record(
                1,
                10,
                TopologyEvent::PlateRetired {
                    plate_id: plate,
                    reason: "future".to_string(),
                },
            ),
        ];
        let snapshot = materialize(&records, Tick::new(5), TickFilterMode::ScanAll).unwrap();
        assert!(!snapshot.plates.get(&plate).unwrap().is_retired);
        assert_eq!(snapshot.last_event_sequence, 0);
    }

    #[test]
    fn break_on_first_beyond_tick_matches_scan_all_on_monotone_stream() {
        let plate = PlateId::from_label("eurasia");
        let records = vec![
            record(0, 1, TopologyEvent::PlateCreated { plate_id: plate }),
            record(
                1,
                2,
                TopologyEvent::PlateRetired {
                    plate_id: plate,
                    reason: "r".to_string(),
                },
            ),
        ];
        let scan_all = materialize(&records, Tick::new(2), TickFilterMode::ScanAll).unwrap();
        let break_early = materialize(&records, Tick::new(2), TickFilterMode::BreakOnFirstBeyondTick).unwrap();
        assert_eq!(scan_all, break_early);
    }

    #[test]
    fn materializer_is_deterministic() {
        let plate = PlateId::from_label("india");
        let records = vec![record(0, 1, TopologyEvent::PlateCreated { plate_id: plate })];
        let a = materialize(&records, Tick::new(5), TickFilterMode::Auto).unwrap();
        let b = materialize(&records, Tick::new(5), TickFilterMode::Auto).unwrap();
        assert_eq!(a, b);
    }
}
