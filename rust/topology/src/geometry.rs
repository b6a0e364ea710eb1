// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric primitives for line-element repair.
//!
//! Axis-aligned boxes, point/segment projection, ray/segment closest
//! approach and segment/segment closest approach. Degenerate inputs never
//! error: they return `None` or fall back to an endpoint.
//!
//! ## Ray parameter convention
//!
//! [`ray_segment_closest`] solves for the segment parameter `t` without
//! clamping it and reports it as is. Callers filter on `t` themselves
//! (typically `t ∈ [-1e-4, 1 + 1e-4]`), so a ray that passes just beyond a
//! segment end is rejected rather than pulled onto the end.

use nalgebra::{Point3, Vector3};

/// Squared lengths below this are treated as zero.
pub const EPS_LENGTH_SQ: f64 = 1e-12;

/// Relative determinant threshold below which two lines are parallel.
pub const PARALLEL_EPS: f64 = 1e-8;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    /// Smallest box containing both points.
    pub fn from_points(a: &Point3<f64>, b: &Point3<f64>) -> Self {
        Self {
            min: a.inf(b),
            max: a.sup(b),
        }
    }

    /// Box around a segment, grown by `inflate` on every side.
    pub fn from_segment(a: &Point3<f64>, b: &Point3<f64>, inflate: f64) -> Self {
        Self::from_points(a, b).expanded(inflate)
    }

    /// Cube of half-size `radius` around `center`.
    pub fn around(center: &Point3<f64>, radius: f64) -> Self {
        Self::from_points(center, center).expanded(radius)
    }

    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vector3::repeat(margin.max(0.0));
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }
}

/// Unit vector along `v`, or the zero vector if `v` is too short.
pub fn normalize_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n < 1e-12 {
        Vector3::zeros()
    } else {
        v / n
    }
}

/// Angle between two vectors in degrees, `None` if either is zero.
pub fn angle_between_deg(u: &Vector3<f64>, v: &Vector3<f64>) -> Option<f64> {
    let nu = u.norm();
    let nv = v.norm();
    if nu < 1e-12 || nv < 1e-12 {
        return None;
    }
    let cos = (u.dot(v) / (nu * nv)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Projection of a point onto the infinite line through a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineProjection {
    /// Position along the line, 0 at the start and 1 at the end.
    pub t: f64,
    /// Foot of the perpendicular.
    pub point: Point3<f64>,
    /// Perpendicular distance.
    pub distance: f64,
}

/// Projects `p` onto the infinite line through `a` and `b`.
///
/// Returns `None` when `a` and `b` coincide.
pub fn project_point_to_line(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
) -> Option<LineProjection> {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < EPS_LENGTH_SQ {
        return None;
    }
    let t = (p - a).dot(&ab) / len_sq;
    let point = a + ab * t;
    Some(LineProjection {
        t,
        point,
        distance: (p - point).norm(),
    })
}

/// Closest point on a segment to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Unclamped line parameter, kept so callers can tell whether the foot
    /// of the perpendicular falls inside the segment.
    pub t: f64,
    /// Closest point on the segment (parameter clamped to [0, 1]).
    pub point: Point3<f64>,
    /// Distance from the query point to `point`.
    pub distance: f64,
}

/// Projects `p` onto segment `a`–`b`, clamping to the segment.
///
/// A degenerate segment projects everything onto `a` with `t = 0`.
pub fn project_point_to_segment(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
) -> SegmentProjection {
    let Some(line) = project_point_to_line(p, a, b) else {
        return SegmentProjection {
            t: 0.0,
            point: *a,
            distance: (p - a).norm(),
        };
    };
    let point = if line.t <= 0.0 {
        *a
    } else if line.t >= 1.0 {
        *b
    } else {
        line.point
    };
    SegmentProjection {
        t: line.t,
        point,
        distance: (p - point).norm(),
    }
}

/// Closest approach between a ray and a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Signed distance along the ray (the direction is a unit vector).
    pub s: f64,
    /// Unclamped segment parameter.
    pub t: f64,
    /// Point on the ray at `s`.
    pub ray_point: Point3<f64>,
    /// Point on the segment at `t` clamped to [0, 1].
    pub segment_point: Point3<f64>,
    /// Distance between the two lines at the closest approach.
    pub miss: f64,
    /// The ray runs along the segment; the hit is the nearer endpoint.
    pub collinear: bool,
}

/// Solves the closest approach of the ray `origin + s·dir` and the segment
/// `a`–`b`.
///
/// With `u = dir`, `v = b − a`, `w = origin − a` the normal equations give
/// `a = u·u`, `b = u·v`, `c = v·v`, `d = u·w`, `e = v·w` and
/// `D = a·c − b²`. Lines count as parallel when `D < 1e-8·a·c`. A parallel
/// segment lying within `coincident_tol` of the ray line is hit at its
/// nearer endpoint (`t` = 0 or 1); any other parallel segment is a miss.
pub fn ray_segment_closest(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    seg_a: &Point3<f64>,
    seg_b: &Point3<f64>,
    coincident_tol: f64,
) -> Option<RayHit> {
    let u = dir;
    let v = seg_b - seg_a;
    let w = origin - seg_a;

    let a = u.dot(u);
    let b = u.dot(&v);
    let c = v.dot(&v);
    let d = u.dot(&w);
    let e = v.dot(&w);

    if a < EPS_LENGTH_SQ || c < EPS_LENGTH_SQ {
        return None;
    }

    let denom = a * c - b * b;
    if denom < PARALLEL_EPS * a * c {
        return collinear_hit(origin, u, seg_a, seg_b, coincident_tol);
    }

    let s = (b * e - c * d) / denom;
    let t = (a * e - b * d) / denom;
    let ray_point = origin + u * s;
    let line_point = seg_a + v * t;
    let segment_point = seg_a + v * t.clamp(0.0, 1.0);

    Some(RayHit {
        s,
        t,
        ray_point,
        segment_point,
        miss: (ray_point - line_point).norm(),
        collinear: false,
    })
}

fn collinear_hit(
    origin: &Point3<f64>,
    u: &Vector3<f64>,
    seg_a: &Point3<f64>,
    seg_b: &Point3<f64>,
    coincident_tol: f64,
) -> Option<RayHit> {
    let a = u.dot(u);
    let offset = seg_a - origin;
    let along = offset.dot(u) / a;
    let miss = (offset - u * along).norm();
    if miss > coincident_tol {
        return None;
    }

    let s_a = along;
    let s_b = (seg_b - origin).dot(u) / a;
    let (s, t, end) = if s_a.abs() <= s_b.abs() {
        (s_a, 0.0, *seg_a)
    } else {
        (s_b, 1.0, *seg_b)
    };
    Some(RayHit {
        s,
        t,
        ray_point: origin + u * s,
        segment_point: end,
        miss,
        collinear: true,
    })
}

/// Closest points between two segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPairClosest {
    /// Parameter on the first segment, in [0, 1].
    pub s: f64,
    /// Parameter on the second segment, in [0, 1].
    pub t: f64,
    pub p: Point3<f64>,
    pub q: Point3<f64>,
    pub distance: f64,
}

/// Closest points between segments `p1`–`q1` and `p2`–`q2`.
///
/// Follows Ericson, *Real-Time Collision Detection*, §5.1.9. Parallel
/// segments take `s = 0` and clamp `t` from there.
pub fn segment_segment_closest(
    p1: &Point3<f64>,
    q1: &Point3<f64>,
    p2: &Point3<f64>,
    q2: &Point3<f64>,
) -> SegmentPairClosest {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(&d1);
    let e = d2.dot(&d2);
    let f = d2.dot(&r);

    let (s, t) = if a <= EPS_LENGTH_SQ && e <= EPS_LENGTH_SQ {
        (0.0, 0.0)
    } else if a <= EPS_LENGTH_SQ {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= EPS_LENGTH_SQ {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let mut s = if denom > PARALLEL_EPS * a * e {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    let p = p1 + d1 * s;
    let q = p2 + d2 * t;
    SegmentPairClosest {
        s,
        t,
        p,
        q,
        distance: (p - q).norm(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
        Point3::new(x, y, z)
    }

    #[test]
    fn bbox_from_segment_and_contains() {
        let bb = BoundingBox::from_segment(&p(10.0, 0.0, 5.0), &p(0.0, 2.0, 5.0), 1.0);
        assert_eq!(bb.min, p(-1.0, -1.0, 4.0));
        assert_eq!(bb.max, p(11.0, 3.0, 6.0));
        assert!(bb.contains(&p(11.0, 3.0, 6.0)));
        assert!(!bb.contains(&p(11.1, 0.0, 5.0)));
        assert!(bb.intersects(&BoundingBox::around(&p(12.0, 0.0, 5.0), 1.0)));
        assert!(!bb.intersects(&BoundingBox::around(&p(20.0, 0.0, 5.0), 1.0)));
    }

    #[test]
    fn normalize_short_vector_is_zero() {
        assert_eq!(normalize_or_zero(&Vector3::new(0.0, 1e-14, 0.0)), Vector3::zeros());
        assert_relative_eq!(normalize_or_zero(&Vector3::new(0.0, 3.0, 4.0)).norm(), 1.0);
    }

    #[test]
    fn angle_between() {
        let x = Vector3::x();
        assert_relative_eq!(angle_between_deg(&x, &Vector3::y()).unwrap_or_default(), 90.0);
        assert_relative_eq!(angle_between_deg(&x, &(x * 5.0)).unwrap_or(1.0), 0.0);
        assert!(angle_between_deg(&x, &Vector3::zeros()).is_none());
    }

    #[test]
    fn project_to_line_reports_unclamped_t() {
        let proj = project_point_to_line(&p(15.0, 2.0, 0.0), &p(0.0, 0.0, 0.0), &p(10.0, 0.0, 0.0))
            .unwrap();
        assert_relative_eq!(proj.t, 1.5);
        assert_relative_eq!(proj.distance, 2.0);
        assert!(project_point_to_line(&p(1.0, 1.0, 1.0), &p(0.0, 0.0, 0.0), &p(0.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn project_to_segment_clamps_point() {
        let a = p(0.0, 0.0, 0.0);
        let b = p(10.0, 0.0, 0.0);

        let inside = project_point_to_segment(&p(4.0, 3.0, 0.0), &a, &b);
        assert_relative_eq!(inside.t, 0.4);
        assert_relative_eq!(inside.distance, 3.0);

        let beyond = project_point_to_segment(&p(13.0, 4.0, 0.0), &a, &b);
        assert_relative_eq!(beyond.t, 1.3);
        assert_eq!(beyond.point, b);
        assert_relative_eq!(beyond.distance, 5.0);

        let degenerate = project_point_to_segment(&p(3.0, 4.0, 0.0), &a, &a);
        assert_eq!(degenerate.t, 0.0);
        assert_relative_eq!(degenerate.distance, 5.0);
    }

    #[test]
    fn ray_hits_crossing_segment() {
        // Ray along +x from the origin, segment crossing x = 7 slightly above.
        let hit = ray_segment_closest(
            &p(0.0, 0.0, 0.0),
            &Vector3::x(),
            &p(7.0, -5.0, 0.5),
            &p(7.0, 5.0, 0.5),
            1.0,
        )
        .unwrap();
        assert_relative_eq!(hit.s, 7.0, epsilon = 1e-12);
        assert_relative_eq!(hit.t, 0.5, epsilon = 1e-12);
        assert_relative_eq!(hit.miss, 0.5, epsilon = 1e-12);
        assert!(!hit.collinear);
    }

    #[test]
    fn ray_reports_unclamped_t_beyond_segment_end() {
        let hit = ray_segment_closest(
            &p(0.0, 0.0, 0.0),
            &Vector3::x(),
            &p(7.0, 1.0, 0.0),
            &p(7.0, 5.0, 0.0),
            1.0,
        )
        .unwrap();
        assert_relative_eq!(hit.t, -0.25, epsilon = 1e-12);
        assert_relative_eq!(hit.miss, 0.0, epsilon = 1e-12);
        assert_eq!(hit.segment_point, p(7.0, 1.0, 0.0));
    }

    #[test]
    fn ray_behind_origin_has_negative_s() {
        let hit = ray_segment_closest(
            &p(10.0, 0.0, 0.0),
            &Vector3::x(),
            &p(8.0, -1.0, 0.0),
            &p(8.0, 1.0, 0.0),
            1.0,
        )
        .unwrap();
        assert_relative_eq!(hit.s, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn collinear_ray_hits_nearer_endpoint() {
        let hit = ray_segment_closest(
            &p(50.0, 0.0, 0.0),
            &Vector3::x(),
            &p(150.0, 0.0, 0.0),
            &p(100.0, 0.0, 0.0),
            1.0,
        )
        .unwrap();
        assert!(hit.collinear);
        assert_relative_eq!(hit.s, 50.0);
        assert_eq!(hit.t, 1.0);
        assert_eq!(hit.segment_point, p(100.0, 0.0, 0.0));
    }

    #[test]
    fn offset_parallel_ray_misses() {
        let hit = ray_segment_closest(
            &p(0.0, 0.0, 0.0),
            &Vector3::x(),
            &p(10.0, 5.0, 0.0),
            &p(20.0, 5.0, 0.0),
            1.0,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn segments_crossing_in_the_middle() {
        let r = segment_segment_closest(
            &p(0.0, 0.0, 0.0),
            &p(10.0, 0.0, 0.0),
            &p(4.0, -5.0, 0.2),
            &p(4.0, 5.0, 0.2),
        );
        assert_relative_eq!(r.s, 0.4, epsilon = 1e-12);
        assert_relative_eq!(r.t, 0.5, epsilon = 1e-12);
        assert_relative_eq!(r.distance, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn segments_clamped_at_ends() {
        let r = segment_segment_closest(
            &p(0.0, 0.0, 0.0),
            &p(10.0, 0.0, 0.0),
            &p(12.0, -5.0, 0.0),
            &p(12.0, 5.0, 0.0),
        );
        assert_relative_eq!(r.s, 1.0);
        assert_relative_eq!(r.t, 0.5, epsilon = 1e-12);
        assert_relative_eq!(r.distance, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn parallel_segments() {
        let r = segment_segment_closest(
            &p(0.0, 0.0, 0.0),
            &p(10.0, 0.0, 0.0),
            &p(2.0, 3.0, 0.0),
            &p(8.0, 3.0, 0.0),
        );
        assert_relative_eq!(r.distance, 3.0, epsilon = 1e-12);
    }
}
