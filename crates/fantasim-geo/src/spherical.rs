// SPDX-License-Identifier: Apache-2.0
//! Points and great-circle arcs on the unit sphere.

use fantasim_core::Vec3;

/// A point on the unit sphere, represented as a unit Cartesian vector.
pub type SphericalPoint = Vec3;

/// A great-circle arc between two points on the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreatCircleArc {
    /// Arc start.
    pub a: SphericalPoint,
    /// Arc end.
    pub b: SphericalPoint,
}

impl GreatCircleArc {
    /// Builds an arc between two unit-sphere points.
    #[must_use]
    pub fn new(a: SphericalPoint, b: SphericalPoint) -> Self {
        Self { a, b }
    }

    /// Angular length of the arc, in radians.
    #[must_use]
    pub fn angular_length(self) -> f64 {
        self.a.dot(self.b).clamp(-1.0, 1.0).acos()
    }

    /// Point at fraction `t` (`0.0` = `a`, `1.0` = `b`) along the arc via
    /// spherical linear interpolation.
    #[must_use]
    pub fn point_at(self, t: f64) -> SphericalPoint {
        let omega = self.angular_length();
        if omega < 1e-12 {
            return self.a;
        }
        let sin_omega = omega.sin();
        let s0 = ((1.0 - t) * omega).sin() / sin_omega;
        let s1 = (t * omega).sin() / sin_omega;
        (self.a * s0 + self.b * s1).normalize()
    }

    /// Unit tangent vector at fraction `t`, pointing from `a` toward `b`.
    #[must_use]
    pub fn tangent_at(self, t: f64) -> SphericalPoint {
        let eps = 1e-6;
        let t0 = (t - eps).max(0.0);
        let t1 = (t + eps).min(1.0);
        (self.point_at(t1) - self.point_at(t0)).normalize()
    }

    /// Angular distance (radians) from `point` to the closest of 17 evenly
    /// sampled locations along this arc: an approximation adequate for
    /// boundary-proximity classification, not exact closest-point
    /// projection.
    #[must_use]
    pub fn distance_to(self, point: SphericalPoint) -> f64 {
        self.sample(17, true)
            .into_iter()
            .map(|p| p.dot(point).clamp(-1.0, 1.0).acos())
            .fold(f64::INFINITY, f64::min)
    }

    /// Samples `n` points along the arc (`n >= 2`), evenly spaced by arc
    /// fraction. If `include_endpoints` is `false`, the two endpoints are
    /// omitted from the result.
    #[must_use]
    pub fn sample(self, n: usize, include_endpoints: bool) -> Vec<SphericalPoint> {
        if n < 2 {
            return vec![self.point_at(0.5)];
        }
        let step = 1.0 / (n - 1) as f64;
        (0..n)
            .map(|i| i as f64 * step)
            .filter(|&t| include_endpoints || (t > 1e-9 && t < 1.0 - 1e-9))
            .map(|t| self.point_at(t))
            .collect()
    }
}

/// Samples a polyline of connected great-circle arcs at `n` points total,
/// distributed proportionally to each segment's angular length.
#[must_use]
pub fn sample_polyline(points: &[SphericalPoint], n: usize, include_endpoints: bool) -> Vec<SphericalPoint> {
    if points.len() < 2 || n == 0 {
        return Vec::new();
    }
    let arcs: Vec<GreatCircleArc> = points.windows(2).map(|w| GreatCircleArc::new(w[0], w[1])).collect();
    let total_length: f64 = arcs.iter().map(|a| a.angular_length()).sum();
    if total_length < 1e-12 {
        return vec![points[0]; n];
    }

    let mut samples = Vec::with_capacity(n);
    for i in 0..n {
        let target = if n == 1 {
            0.0
        } else {
            (i as f64 / (n - 1) as f64) * total_length
        };
        let mut remaining = target;
        let mut chosen = *arcs.last().unwrap_or(&arcs[0]);
        let mut local_t = 1.0;
        for arc in &arcs {
            let len = arc.angular_length();
            if remaining <= len || len < 1e-12 {
                chosen = *arc;
                local_t = if len < 1e-12 { 0.0 } else { remaining / len };
                break;
            }
            remaining -= len;
        }
        samples.push(chosen.point_at(local_t.clamp(0.0, 1.0)));
    }
    if !include_endpoints && samples.len() > 2 {
        samples.remove(samples.len() - 1);
        samples.remove(0);
    }
    samples
}

/// Resolves the `Default` tolerance policy's epsilon heuristically from the
/// average boundary segment length and density, clamped to `[1e-12, 1e-6]`
/// (§4.6).
#[must_use]
pub fn resolve_epsilon(average_segment_length_radians: f64, segment_count: usize) -> f64 {
    if segment_count == 0 || average_segment_length_radians <= 0.0 {
        return 1e-9;
    }
    let density_factor = 1.0 / (segment_count as f64).sqrt();
    (average_segment_length_radians * density_factor * 1e-3).clamp(1e-12, 1e-6)
}

/// Computes the interior angle at `vertex`, between the incoming arc from
/// `prev` and the outgoing arc to `next`, via the angle between the two
/// great-circle planes meeting at `vertex`.
#[must_use]
pub fn interior_angle(prev: SphericalPoint, vertex: SphericalPoint, next: SphericalPoint) -> f64 {
    let n1 = vertex.cross(prev).normalize();
    let n2 = vertex.cross(next).normalize();
    n1.dot(n2).clamp(-1.0, 1.0).acos()
}

/// Spherical area (steradians) of a closed loop of unit-sphere vertices, by
/// the standard interior-angle-sum method: `area = (sum of interior
/// angles) - (n - 2) * pi` (§4.6).
#[must_use]
pub fn spherical_polygon_area(loop_points: &[SphericalPoint]) -> f64 {
    let n = loop_points.len();
    if n < 3 {
        return 0.0;
    }
    let mut angle_sum = 0.0;
    for i in 0..n {
        let prev = loop_points[(i + n - 1) % n];
        let vertex = loop_points[i];
        let next = loop_points[(i + 1) % n];
        angle_sum += interior_angle(prev, vertex, next);
    }
    (angle_sum - (n as f64 - 2.0) * core::f64::consts::PI).abs()
}

/// Returns `true` if `loop_points` winds counter-clockwise viewed from
/// outside the sphere (positive signed area about the loop's mean normal).
#[must_use]
pub fn is_counter_clockwise(loop_points: &[SphericalPoint]) -> bool {
    let n = loop_points.len();
    if n < 3 {
        return true;
    }
    let mut signed = Vec3::ZERO;
    for i in 0..n {
        let a = loop_points[i];
        let b = loop_points[(i + 1) % n];
        signed = signed + a.cross(b);
    }
    let mean_normal = loop_points.iter().fold(Vec3::ZERO, |acc, &p| acc + p).normalize();
    signed.dot(mean_normal) >= 0.0
}

/// Returns `true` if `point` lies inside the spherical polygon traced by
/// `loop_points` (closed implicitly, last vertex connecting back to the
/// first), via the winding-angle test: each vertex is projected onto the
/// tangent plane at `point`, and the net signed angle swept between
/// consecutive projections is `±2*pi` if `point` is enclosed, `~0`
/// otherwise — the spherical analogue of the planar angle-summation
/// point-in-polygon test.
#[must_use]
pub fn contains_point(loop_points: &[SphericalPoint], point: SphericalPoint) -> bool {
    if loop_points.len() < 3 {
        return false;
    }
    let tangent = |v: Vec3| -> Option<Vec3> {
        let projected = v - point * point.dot(v);
        if projected.length() < 1e-12 {
            None
        } else {
            Some(projected.normalize())
        }
    };
    let n = loop_points.len();
    let mut total = 0.0;
    for i in 0..n {
        let (Some(ua), Some(ub)) = (tangent(loop_points[i]), tangent(loop_points[(i + 1) % n])) else {
            continue;
        };
        total += point.dot(ua.cross(ub)).atan2(ua.dot(ub));
    }
    total.abs() > core::f64::consts::PI
}
