// SPDX-License-Identifier: Apache-2.0
//! Plate boundary network partitioning into plate polygons (§4.6).

use crate::spherical::{is_counter_clockwise, resolve_epsilon, spherical_polygon_area};
use fantasim_core::config::TolerancePolicy;
use fantasim_core::hash::{to_hex, Hash, Preimage};
use fantasim_core::{FantaSimError, PlateId, Tick, Vec3};
use fantasim_materialize::topology::TopologySnapshot;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::instrument;

const POLYGONIZER_VERSION: u32 = 1;

/// Options accepted by [`partition`].
#[derive(Debug, Clone, Copy)]
pub struct PartitionOptions {
    /// Numerical tolerance policy.
    pub tolerance: TolerancePolicy,
    /// Faces below this spherical area (steradians) are counted as slivers.
    pub min_polygon_area: f64,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            tolerance: TolerancePolicy::default(),
            min_polygon_area: 1e-9,
        }
    }
}

/// One plate's polygonized faces: an outer loop plus any holes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatePolygon {
    /// Owning plate.
    pub plate_id: PlateId,
    /// Outer loop, canonicalized counter-clockwise viewed from outside the
    /// sphere. When [`is_complement`](Self::is_complement) is set, this
    /// plate owns everything on the sphere *outside* this loop rather than
    /// its interior — two plates sharing a single boundary loop with no
    /// other edges divide the whole sphere between them this way, since the
    /// loop alone cannot otherwise describe the larger of the two faces it
    /// bounds.
    pub outer_loop: Vec<Vec3>,
    /// Hole loops contained within the outer loop, if any.
    pub holes: Vec<Vec<Vec3>>,
    /// `true` if this plate owns the complement of `outer_loop` rather than
    /// its interior.
    pub is_complement: bool,
    /// Spherical area owned by this plate (the outer loop's interior, or
    /// its complement, minus holes), in steradians.
    pub area: f64,
}

/// Quality metrics recorded for a partition attempt (§4.6).
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityMetrics {
    /// Minimum plate spherical area observed.
    pub min_area: f64,
    /// Maximum plate spherical area observed.
    pub max_area: f64,
    /// Variance of plate spherical areas.
    pub area_variance: f64,
    /// Count of faces below `min_polygon_area`.
    pub sliver_count: usize,
    /// Count of boundary loops that failed to close.
    pub open_boundary_count: usize,
    /// Count of junctions whose recorded degree disagrees with its boundary
    /// references.
    pub non_manifold_junction_count: usize,
    /// Count of boundaries whose two sides resolve to the same plate.
    pub ambiguous_attribution_count: usize,
    /// Number of resolved faces.
    pub face_count: usize,
    /// Number of resolved hole loops.
    pub hole_count: usize,
    /// Wall-clock time spent computing the partition.
    pub computation_time: Duration,
}

/// The full result of a partition attempt.
#[derive(Debug, Clone)]
pub struct PartitionResult {
    /// Polygonized faces, keyed by owning plate.
    pub polygons: BTreeMap<PlateId, PlatePolygon>,
    /// Quality metrics gathered during solving.
    pub quality: QualityMetrics,
    /// Cache key for this partition (topology hash, solver version, tolerance).
    pub cache_key: String,
}

/// Computes the cache key for a partition: SHA-256 over
/// `[topology_stream_hash, polygonizer_version, tolerance_policy_bytes]`,
/// truncated to the first 16 hex characters (§4.6).
#[must_use]
pub fn cache_key(topology_stream_hash: Hash, tolerance: TolerancePolicy) -> String {
    let mut tolerance_bytes = Vec::new();
    match tolerance {
        TolerancePolicy::Strict => tolerance_bytes.push(0u8),
        TolerancePolicy::Lenient { epsilon } => {
            tolerance_bytes.push(1u8);
            tolerance_bytes.extend_from_slice(&epsilon.to_le_bytes());
        }
        TolerancePolicy::Default => tolerance_bytes.push(2u8),
    }
    let digest = Preimage::new()
        .field(&topology_stream_hash)
        .field_u64(u64::from(POLYGONIZER_VERSION))
        .field(&tolerance_bytes)
        .finish();
    to_hex(&digest)[..16].to_string()
}

struct ResolvedTolerance {
    epsilon: f64,
    strict: bool,
}

fn resolve_tolerance(policy: TolerancePolicy, average_segment_length: f64, segment_count: usize) -> ResolvedTolerance {
    match policy {
        TolerancePolicy::Strict => ResolvedTolerance {
            epsilon: 0.0,
            strict: true,
        },
        TolerancePolicy::Lenient { epsilon } => ResolvedTolerance {
            epsilon,
            strict: false,
        },
        TolerancePolicy::Default => ResolvedTolerance {
            epsilon: resolve_epsilon(average_segment_length, segment_count),
            strict: false,
        },
    }
}

/// Partitions `topology`'s active boundary network into per-plate polygons
/// (§4.6).
///
/// Active (non-retired) boundaries are grouped by plate side: a boundary's
/// `left` plate owns its forward-wound polyline, its `right` plate owns the
/// reverse-wound polyline. Edges belonging to the same plate are chained
/// head-to-tail (matching endpoints within the resolved tolerance) into
/// closed loops; a loop that fails to close is an open boundary.
///
/// # Errors
/// Returns [`FantaSimError::InvalidTopology`] under `Strict` tolerance when
/// any open boundary, non-manifold junction, or disconnected plate is
/// detected. Returns [`FantaSimError::PolygonizationFailed`] under a
/// non-strict policy when overall sphere coverage is impossible (no
/// resolvable faces at all).
#[instrument(skip(topology))]
pub fn partition(topology: &TopologySnapshot, options: PartitionOptions) -> Result<PartitionResult, FantaSimError> {
    let mut edges_by_plate: BTreeMap<PlateId, Vec<(Vec3, Vec3)>> = BTreeMap::new();
    let mut ambiguous_attribution_count = 0usize;
    let mut segment_lengths = Vec::new();

    for boundary in topology.boundaries.values() {
        if boundary.is_retired {
            continue;
        }
        if boundary.left == boundary.right {
            ambiguous_attribution_count += 1;
            continue;
        }
        let points = &boundary.geometry.points;
        if points.len() < 2 {
            continue;
        }
        for window in points.windows(2) {
            segment_lengths.push(window[0].dot(window[1]).clamp(-1.0, 1.0).acos());
            edges_by_plate.entry(boundary.left).or_default().push((window[0], window[1]));
            edges_by_plate.entry(boundary.right).or_default().push((window[1], window[0]));
        }
    }

    let average_segment_length = if segment_lengths.is_empty() {
        0.0
    } else {
        segment_lengths.iter().sum::<f64>() / segment_lengths.len() as f64
    };
    let resolved = resolve_tolerance(options.tolerance, average_segment_length, segment_lengths.len());

    let mut polygons = BTreeMap::new();
    let mut areas = Vec::new();
    let mut open_boundary_count = 0usize;

    for (plate_id, edges) in edges_by_plate {
        let loops = trace_loops(&edges, resolved.epsilon);
        let Some(outer) = loops.iter().max_by(|a, b| {
            spherical_polygon_area(&a.points)
                .partial_cmp(&spherical_polygon_area(&b.points))
                .unwrap_or(std::cmp::Ordering::Equal)
        }) else {
            continue;
        };

        for lp in &loops {
            // A loop that only closed because some connection along its
            // chain was snapped shut within the resolved tolerance (rather
            // than landing exactly on the matching point) is still a
            // warned-open boundary under a lenient policy: the gap was
            // absorbed, not genuinely closed.
            if !lp.closed || lp.max_gap > MIN_EPSILON {
                open_boundary_count += 1;
            }
        }

        if resolved.strict && loops.iter().any(|lp| !lp.closed) {
            return Err(FantaSimError::InvalidTopology {
                reason: format!("open boundary loop detected for plate {plate_id}"),
            });
        }

        // Whether this plate's edges, traced in the order they were wound
        // onto this side of each boundary, come out counter-clockwise
        // *before* any canonicalizing reversal. Two plates sharing a single
        // boundary loop trace it in opposite directions; whichever comes
        // out clockwise owns the complement of the loop (the rest of the
        // sphere), since the loop alone cannot otherwise describe the
        // larger of the two faces it bounds.
        let is_complement = !is_counter_clockwise(&outer.points);

        let mut outer_points = outer.points.clone();
        if !is_counter_clockwise(&outer_points) {
            outer_points.reverse();
        }
        let loop_area = spherical_polygon_area(&outer_points);
        let outer_area = if is_complement {
            4.0 * core::f64::consts::PI - loop_area
        } else {
            loop_area
        };

        let holes: Vec<Vec<Vec3>> = loops
            .iter()
            .filter(|lp| !std::ptr::eq(*lp, outer))
            .map(|lp| lp.points.clone())
            .collect();
        let hole_area: f64 = holes.iter().map(|h| spherical_polygon_area(h)).sum();
        let area = (outer_area - hole_area).max(0.0);

        areas.push(area);
        polygons.insert(
            plate_id,
            PlatePolygon {
                plate_id,
                outer_loop: outer_points,
                holes,
                is_complement,
                area,
            },
        );
    }

    if polygons.is_empty() && !topology.boundaries.is_empty() {
        if resolved.strict {
            return Err(FantaSimError::InvalidTopology {
                reason: "no resolvable plate faces from active boundary network".to_string(),
            });
        }
        return Err(FantaSimError::PolygonizationFailed {
            plate_id: PlateId::from_raw(0).to_string(),
            tick: Tick::GENESIS,
            reason: "no plate faces could be resolved; sphere coverage impossible".to_string(),
        });
    }

    let sliver_count = areas.iter().filter(|&&a| a < options.min_polygon_area).count();
    let (min_area, max_area) = areas
        .iter()
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), &a| (lo.min(a), hi.max(a)));
    let min_area = if areas.is_empty() { 0.0 } else { min_area };
    let mean = if areas.is_empty() { 0.0 } else { areas.iter().sum::<f64>() / areas.len() as f64 };
    let area_variance = if areas.is_empty() {
        0.0
    } else {
        areas.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / areas.len() as f64
    };

    let non_manifold_junction_count = topology
        .junctions
        .values()
        .filter(|j| !j.is_retired && j.boundary_ids.len() < 3)
        .count();

    let quality = QualityMetrics {
        min_area,
        max_area,
        area_variance,
        sliver_count,
        open_boundary_count,
        non_manifold_junction_count,
        ambiguous_attribution_count,
        face_count: polygons.len(),
        hole_count: polygons.values().map(|p| p.holes.len()).sum(),
        computation_time: Duration::ZERO,
    };

    let topology_hash = Preimage::new().field_u64(topology.last_event_sequence).finish();

    Ok(PartitionResult {
        polygons,
        quality,
        cache_key: cache_key(topology_hash, options.tolerance),
    })
}

/// Floor under which two points are treated as exactly coincident,
/// regardless of the resolved tolerance — the same floor `points_within`
/// applies to every tolerance policy.
const MIN_EPSILON: f64 = 1e-12;

struct TracedLoop {
    points: Vec<Vec3>,
    closed: bool,
    /// Largest gap snapped shut while following this loop, across every
    /// edge-to-edge connection and the final closure back to the start
    /// vertex. Zero for a loop whose edges met exactly; positive when any
    /// connection only succeeded because the gap fell within the resolved
    /// tolerance rather than landing on the same point.
    max_gap: f64,
}

fn points_within(a: Vec3, b: Vec3, epsilon: f64) -> bool {
    (a - b).length() <= epsilon.max(MIN_EPSILON)
}

fn trace_loops(edges: &[(Vec3, Vec3)], epsilon: f64) -> Vec<TracedLoop> {
    let mut remaining: Vec<(Vec3, Vec3)> = edges.to_vec();
    let mut loops = Vec::new();

    while let Some((start_a, start_b)) = remaining.pop() {
        let mut points = vec![start_a, start_b];
        let mut closed = false;
        let mut max_gap = 0.0f64;

        loop {
            let tail = *points.last().unwrap_or(&start_b);
            if points.len() > 2 && points_within(tail, start_a, epsilon) {
                // `tail` duplicates the loop's start vertex; drop it before
                // closing so the loop has no repeated endpoint.
                max_gap = max_gap.max((tail - start_a).length());
                points.pop();
                closed = true;
                break;
            }
            match remaining.iter().position(|(a, _)| points_within(*a, tail, epsilon)) {
                Some(idx) => {
                    let (matched_a, next_b) = remaining.remove(idx);
                    max_gap = max_gap.max((matched_a - tail).length());
                    points.push(next_b);
                }
                None => break,
            }
        }

        loops.push(TracedLoop { points, closed, max_gap });
    }

    loops
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fantasim_materialize::topology::{Boundary, Plate};
    use fantasim_events::payload::BoundaryType;

    fn octant_boundaries() -> TopologySnapshot {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let c = Vec3::new(0.0, 0.0, 1.0);
        let plate_a = PlateId::from_label("a");
        let plate_b = PlateId::from_label("b");

        let mut snapshot = TopologySnapshot::empty();
        snapshot.plates.insert(
            plate_a,
            Plate {
                is_retired: false,
                retirement_reason: None,
            },
        );
        snapshot.plates.insert(
            plate_b,
            Plate {
                is_retired: false,
                retirement_reason: None,
            },
        );

        let edges = [(a, b), (b, c), (c, a)];
        for (i, (p, q)) in edges.iter().enumerate() {
            let id = fantasim_core::BoundaryId::from_label(&format!("edge{i}"));
            snapshot.boundaries.insert(
                id,
                Boundary {
                    left: plate_a,
                    right: plate_b,
                    boundary_type: BoundaryType::Transform,
                    geometry: fantasim_events::payload::BoundaryGeometry { points: vec![*p, *q] },
                    is_retired: false,
                },
            );
        }
        snapshot
    }

    #[test]
    fn cache_key_is_16_hex_chars() {
        let key = cache_key([0u8; 32], TolerancePolicy::Strict);
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn cache_key_differs_by_tolerance_variant() {
        let strict = cache_key([1u8; 32], TolerancePolicy::Strict);
        let lenient = cache_key([1u8; 32], TolerancePolicy::Lenient { epsilon: 1e-8 });
        assert_ne!(strict, lenient);
    }

    #[test]
    fn octant_triangle_resolves_two_complementary_plates() {
        let snapshot = octant_boundaries();
        let result = partition(&snapshot, PartitionOptions::default()).unwrap();
        assert_eq!(result.polygons.len(), 2);
        let polygons: Vec<&PlatePolygon> = result.polygons.values().collect();
        assert_ne!(polygons[0].is_complement, polygons[1].is_complement);
        let total: f64 = polygons.iter().map(|p| p.area).sum();
        assert!((total - 4.0 * core::f64::consts::PI).abs() < 1e-6);
        let small = core::f64::consts::FRAC_PI_2;
        assert!(polygons.iter().any(|p| !p.is_complement && (p.area - small).abs() < 1e-6));
    }

    fn open_loop_boundaries(gap: f64) -> TopologySnapshot {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let c = Vec3::new(0.0, 0.0, 1.0);
        let a_unclosed = Vec3::new(1.0 + gap, 0.0, 0.0);
        let plate_a = PlateId::from_label("a");
        let plate_b = PlateId::from_label("b");

        let mut snapshot = TopologySnapshot::empty();
        snapshot.plates.insert(
            plate_a,
            Plate {
                is_retired: false,
                retirement_reason: None,
            },
        );
        snapshot.plates.insert(
            plate_b,
            Plate {
                is_retired: false,
                retirement_reason: None,
            },
        );

        for (i, (p, q)) in [(a, b), (b, c), (c, a_unclosed)].iter().enumerate() {
            let id = fantasim_core::BoundaryId::from_label(&format!("edge{i}"));
            snapshot.boundaries.insert(
                id,
                Boundary {
                    left: plate_a,
                    right: plate_b,
                    boundary_type: BoundaryType::Transform,
                    geometry: fantasim_events::payload::BoundaryGeometry { points: vec![*p, *q] },
                    is_retired: false,
                },
            );
        }
        snapshot
    }

    #[test]
    fn strict_tolerance_rejects_open_boundary_loop() {
        let snapshot = open_loop_boundaries(1e-7);
        let options = PartitionOptions {
            tolerance: TolerancePolicy::Strict,
            ..PartitionOptions::default()
        };
        let result = partition(&snapshot, options);
        assert!(matches!(result, Err(FantaSimError::InvalidTopology { .. })));
    }

    #[test]
    fn lenient_tolerance_accepts_gap_within_epsilon() {
        let snapshot = open_loop_boundaries(1e-7);
        let options = PartitionOptions {
            tolerance: TolerancePolicy::Lenient { epsilon: 1e-6 },
            ..PartitionOptions::default()
        };
        let result = partition(&snapshot, options).unwrap();
        assert!(result.quality.open_boundary_count >= 1);
    }

    #[test]
    fn ambiguous_attribution_is_counted() {
        let mut snapshot = octant_boundaries();
        let plate_a = *snapshot.plates.keys().next().unwrap();
        let id = fantasim_core::BoundaryId::from_label("self-loop");
        snapshot.boundaries.insert(
            id,
            Boundary {
                left: plate_a,
                right: plate_a,
                boundary_type: BoundaryType::Transform,
                geometry: fantasim_events::payload::BoundaryGeometry {
                    points: vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
                },
                is_retired: false,
            },
        );
        let result = partition(&snapshot, PartitionOptions::default()).unwrap();
        assert_eq!(result.quality.ambiguous_attribution_count, 1);
    }
}
