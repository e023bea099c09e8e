// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segments, polylines and line sets
//!
//! [`LineSet::union_of`] is the linear counterpart of a polygon union: collinear
//! overlapping pieces are merged so the reported length never counts shared
//! stretches twice.

use crate::error::{Error, Result};
use crate::polygon::EPSILON_2D;
use nalgebra::{Point2, Vector2};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Relative tolerance for parallel/collinear checks
const PARALLEL_TOLERANCE: f64 = 1e-12;

/// Offset below which two parallel lines are treated as the same line
const COLLINEAR_OFFSET: f64 = 1e-7;

/// Straight segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl Segment {
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    pub fn vector(&self) -> Vector2<f64> {
        self.end - self.start
    }

    /// Unit direction from start to end
    pub fn direction(&self) -> Result<Vector2<f64>> {
        let v = self.vector();
        let len = v.norm();
        if len <= EPSILON_2D {
            return Err(Error::DegenerateSegment(format!(
                "zero-length segment at ({:.3}, {:.3})",
                self.start.x, self.start.y
            )));
        }
        Ok(v / len)
    }

    /// Point at parameter `t` (0 = start, 1 = end)
    pub fn point_at(&self, t: f64) -> Point2<f64> {
        self.start + self.vector() * t
    }

    pub fn midpoint(&self) -> Point2<f64> {
        self.point_at(0.5)
    }

    /// Parameter of the closest point on the segment to `point`
    pub fn project(&self, point: &Point2<f64>) -> f64 {
        let v = self.vector();
        let len_sq = v.norm_squared();
        if len_sq <= EPSILON_2D * EPSILON_2D {
            return 0.0;
        }
        ((*point - self.start).dot(&v) / len_sq).clamp(0.0, 1.0)
    }

    pub fn closest_point(&self, point: &Point2<f64>) -> Point2<f64> {
        self.point_at(self.project(point))
    }

    pub fn distance_to_point(&self, point: &Point2<f64>) -> f64 {
        (*point - self.closest_point(point)).norm()
    }

    /// Parameters along `self` where it meets `other`
    ///
    /// Crossing segments yield one parameter; collinear overlaps yield the two
    /// ends of the shared stretch.
    pub fn intersection_params(&self, other: &Segment) -> SmallVec<[f64; 2]> {
        let mut params = SmallVec::new();
        let r = self.vector();
        let s = other.vector();
        let qp = other.start - self.start;
        let denom = cross(&r, &s);
        let scale = r.norm() * s.norm();

        if denom.abs() <= PARALLEL_TOLERANCE * scale.max(1.0) {
            let rr = r.norm_squared();
            if rr <= EPSILON_2D * EPSILON_2D {
                return params;
            }
            // Parallel: only collinear overlaps meet
            if cross(&qp, &r).abs() / rr.sqrt() > COLLINEAR_OFFSET {
                return params;
            }
            let t0 = qp.dot(&r) / rr;
            let t1 = t0 + s.dot(&r) / rr;
            let lo = t0.min(t1).max(0.0);
            let hi = t0.max(t1).min(1.0);
            if lo <= hi + EPSILON_2D {
                params.push(lo.min(hi));
                if hi - lo > EPSILON_2D {
                    params.push(hi);
                }
            }
            return params;
        }

        let t = cross(&qp, &s) / denom;
        let u = cross(&qp, &r) / denom;
        let tol = EPSILON_2D;
        if (-tol..=1.0 + tol).contains(&t) && (-tol..=1.0 + tol).contains(&u) {
            params.push(t.clamp(0.0, 1.0));
        }
        params
    }

    pub fn intersects(&self, other: &Segment) -> bool {
        !self.intersection_params(other).is_empty()
    }

    /// Minimum distance between two segments
    pub fn distance_to_segment(&self, other: &Segment) -> f64 {
        if self.intersects(other) {
            return 0.0;
        }
        self.distance_to_point(&other.start)
            .min(self.distance_to_point(&other.end))
            .min(other.distance_to_point(&self.start))
            .min(other.distance_to_point(&self.end))
    }
}

/// Open chain of points, e.g. a road centreline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polyline {
    pub points: Vec<Point2<f64>>,
}

impl Polyline {
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points.windows(2).map(|w| Segment::new(w[0], w[1]))
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|s| s.length()).sum()
    }
}

/// Union of segments with collinear overlaps merged
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineSet {
    pub segments: Vec<Segment>,
}

struct CollinearGroup {
    origin: Point2<f64>,
    direction: Vector2<f64>,
    intervals: Vec<(f64, f64)>,
}

impl LineSet {
    /// Merge `segments` into a line set
    ///
    /// Segments lying on the same line are projected onto it and their
    /// overlapping or touching intervals merged. Zero-length input is dropped.
    pub fn union_of(segments: &[Segment]) -> Self {
        let mut groups: Vec<CollinearGroup> = Vec::new();

        for segment in segments {
            let Ok(mut direction) = segment.direction() else {
                continue;
            };
            // Canonical orientation so reversed duplicates share a group
            if direction.x < -EPSILON_2D || (direction.x.abs() <= EPSILON_2D && direction.y < 0.0) {
                direction = -direction;
            }

            let group = groups.iter_mut().find(|g| {
                cross(&g.direction, &direction).abs() <= 1e-9
                    && cross(&g.direction, &(segment.start - g.origin)).abs() <= COLLINEAR_OFFSET
            });

            match group {
                Some(g) => {
                    let a = (segment.start - g.origin).dot(&g.direction);
                    let b = (segment.end - g.origin).dot(&g.direction);
                    g.intervals.push((a.min(b), a.max(b)));
                }
                None => {
                    let b = (segment.end - segment.start).dot(&direction);
                    groups.push(CollinearGroup {
                        origin: segment.start,
                        direction,
                        intervals: vec![(0.0f64.min(b), 0.0f64.max(b))],
                    });
                }
            }
        }

        let mut merged = Vec::new();
        for mut group in groups {
            group.intervals.sort_by(|a, b| a.0.total_cmp(&b.0));
            let mut current = group.intervals[0];
            for &(lo, hi) in group.intervals.iter().skip(1) {
                if lo <= current.1 + EPSILON_2D {
                    current.1 = current.1.max(hi);
                } else {
                    merged.push(group.segment(current));
                    current = (lo, hi);
                }
            }
            merged.push(group.segment(current));
        }

        Self { segments: merged }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn length(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }

    /// Split into connected pieces, in order of first appearance
    ///
    /// Two segments are connected when they come within `tolerance` of each
    /// other.
    pub fn components(&self, tolerance: f64) -> Vec<LineSet> {
        let n = self.segments.len();
        let mut parent: Vec<usize> = (0..n).collect();

        for i in 0..n {
            for j in (i + 1)..n {
                if self.segments[i].distance_to_segment(&self.segments[j]) <= tolerance {
                    let ri = find_root(&mut parent, i);
                    let rj = find_root(&mut parent, j);
                    if ri != rj {
                        parent[rj.max(ri)] = ri.min(rj);
                    }
                }
            }
        }

        let mut slot_of_root: FxHashMap<usize, usize> = FxHashMap::default();
        let mut components: Vec<LineSet> = Vec::new();
        for i in 0..n {
            let root = find_root(&mut parent, i);
            let slot = *slot_of_root.entry(root).or_insert_with(|| {
                components.push(LineSet::default());
                components.len() - 1
            });
            components[slot].segments.push(self.segments[i]);
        }
        components
    }

    pub fn is_connected(&self, tolerance: f64) -> bool {
        self.components(tolerance).len() <= 1
    }

    /// Longest connected piece (first one wins ties)
    pub fn longest_component(&self, tolerance: f64) -> LineSet {
        let mut best: Option<LineSet> = None;
        for component in self.components(tolerance) {
            let better = best
                .as_ref()
                .map_or(true, |b| component.length() > b.length());
            if better {
                best = Some(component);
            }
        }
        best.unwrap_or_default()
    }

    /// Distance from `segment` to the nearest member, infinite when empty
    pub fn distance_to_segment(&self, segment: &Segment) -> f64 {
        self.segments
            .iter()
            .map(|s| s.distance_to_segment(segment))
            .fold(f64::INFINITY, f64::min)
    }
}

impl CollinearGroup {
    fn segment(&self, (lo, hi): (f64, f64)) -> Segment {
        Segment::new(
            self.origin + self.direction * lo,
            self.origin + self.direction * hi,
        )
    }
}

fn find_root(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// 2D cross product (z component)
pub(crate) fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Left-hand perpendicular
pub(crate) fn perp(v: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-v.y, v.x)
}
