// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygons and polygon sets
//!
//! Rings are stored open (the closing vertex is not repeated). A [`Region`] is
//! a set of polygons and stands for both single parcels and multipolygons such
//! as unions of neighbouring plots. An empty region is a valid value: most
//! operations in the analysis layers degrade to it instead of failing.

use crate::error::{Error, Result};
use crate::line::Segment;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Epsilon for floating point comparisons in 2D operations
pub(crate) const EPSILON_2D: f64 = 1e-9;

/// Minimum area threshold - polygons smaller than this are considered degenerate
pub const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Simple polygon with optional holes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Outer boundary
    pub exterior: Vec<Point2<f64>>,
    /// Interior rings
    #[serde(default)]
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Polygon {
    /// Create a polygon from its outer ring
    pub fn new(exterior: Vec<Point2<f64>>) -> Self {
        Self {
            exterior: open_ring(exterior),
            holes: Vec::new(),
        }
    }

    /// Create a polygon with holes
    pub fn with_holes(exterior: Vec<Point2<f64>>, holes: Vec<Vec<Point2<f64>>>) -> Self {
        Self {
            exterior: open_ring(exterior),
            holes: holes.into_iter().map(open_ring).collect(),
        }
    }

    /// Create a polygon, rejecting degenerate outer rings
    pub fn try_new(exterior: Vec<Point2<f64>>) -> Result<Self> {
        let polygon = Self::new(exterior);
        if polygon.exterior.len() < 3 {
            return Err(Error::InvalidPolygon(format!(
                "outer ring needs at least 3 vertices, got {}",
                polygon.exterior.len()
            )));
        }
        if polygon.area() <= MIN_AREA_THRESHOLD {
            return Err(Error::InvalidPolygon("outer ring has no area".to_string()));
        }
        Ok(polygon)
    }

    /// Axis-aligned rectangle, counter-clockwise
    pub fn rectangle(min: Point2<f64>, max: Point2<f64>) -> Self {
        Self::new(vec![
            Point2::new(min.x, min.y),
            Point2::new(max.x, min.y),
            Point2::new(max.x, max.y),
            Point2::new(min.x, max.y),
        ])
    }

    /// Axis-aligned rectangle of `width` (x) by `length` (y) centred on `center`
    pub fn centered_rectangle(center: Point2<f64>, width: f64, length: f64) -> Self {
        let half_w = width / 2.0;
        let half_l = length / 2.0;
        Self::rectangle(
            Point2::new(center.x - half_w, center.y - half_l),
            Point2::new(center.x + half_w, center.y + half_l),
        )
    }

    /// Outer ring followed by the holes
    pub fn rings(&self) -> impl Iterator<Item = &[Point2<f64>]> {
        std::iter::once(self.exterior.as_slice()).chain(self.holes.iter().map(|h| h.as_slice()))
    }

    pub fn area(&self) -> f64 {
        let outer = signed_area(&self.exterior).abs();
        let holes: f64 = self.holes.iter().map(|h| signed_area(h).abs()).sum();
        (outer - holes).max(0.0)
    }

    /// Total length of all rings
    pub fn perimeter(&self) -> f64 {
        self.rings().map(ring_length).sum()
    }

    /// True when the outer ring winds counter-clockwise
    pub fn is_ccw(&self) -> bool {
        signed_area(&self.exterior) > 0.0
    }

    /// Edges of the outer ring in ring order
    pub fn exterior_edges(&self) -> Vec<Segment> {
        ring_edges(&self.exterior).collect()
    }

    /// Edges of every ring
    pub fn edges(&self) -> Vec<Segment> {
        self.rings().flat_map(ring_edges).collect()
    }

    /// Point-in-polygon test (inside the outer ring and outside every hole)
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        point_in_ring(point, &self.exterior) && !self.holes.iter().any(|h| point_in_ring(point, h))
    }

    pub fn bounds(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        ring_bounds(&self.exterior)
    }

    /// Area-weighted centroid, falling back to the vertex average for
    /// zero-area rings
    pub fn centroid(&self) -> Point2<f64> {
        let mut cx = 0.0;
        let mut cy = 0.0;
        let mut total = 0.0;

        for (index, ring) in self.rings().enumerate() {
            let ring_area = signed_area(ring).abs();
            if ring_area <= MIN_AREA_THRESHOLD {
                continue;
            }
            let c = ring_centroid(ring);
            let weight = if index == 0 { ring_area } else { -ring_area };
            cx += c.x * weight;
            cy += c.y * weight;
            total += weight;
        }

        if total.abs() > MIN_AREA_THRESHOLD {
            Point2::new(cx / total, cy / total)
        } else {
            vertex_average(&self.exterior)
        }
    }

    /// A point guaranteed to lie inside the polygon
    ///
    /// Scans a horizontal line through the middle of the bounding box and
    /// returns the midpoint of the widest interior interval.
    pub fn representative_point(&self) -> Point2<f64> {
        let Some((min, max)) = self.bounds() else {
            return Point2::origin();
        };
        let y = 0.5 * (min.y + max.y);

        let mut crossings: Vec<f64> = Vec::new();
        for ring in self.rings() {
            for edge in ring_edges(ring) {
                let (a, b) = (edge.start, edge.end);
                if (a.y <= y) != (b.y <= y) {
                    crossings.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
                }
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        let best = crossings
            .chunks_exact(2)
            .max_by(|a, b| (a[1] - a[0]).total_cmp(&(b[1] - b[0])));

        match best {
            Some(pair) if pair[1] - pair[0] > EPSILON_2D => {
                Point2::new(0.5 * (pair[0] + pair[1]), y)
            }
            _ => self.centroid(),
        }
    }

    /// Distance from `point` to the nearest ring edge
    pub fn boundary_distance(&self, point: &Point2<f64>) -> f64 {
        self.rings()
            .flat_map(ring_edges)
            .map(|edge| edge.distance_to_point(point))
            .fold(f64::INFINITY, f64::min)
    }

    /// Distance from `point` to the polygon area (zero inside)
    pub fn distance_to_point(&self, point: &Point2<f64>) -> f64 {
        if self.contains(point) {
            0.0
        } else {
            self.boundary_distance(point)
        }
    }

    /// Point of the polygon area closest to `point` (the point itself inside)
    pub fn nearest_point(&self, point: &Point2<f64>) -> Point2<f64> {
        if self.contains(point) {
            return *point;
        }
        self.rings()
            .flat_map(ring_edges)
            .map(|edge| edge.closest_point(point))
            .fold((*point, f64::INFINITY), |best, candidate| {
                let d = (candidate - *point).norm();
                if d < best.1 {
                    (candidate, d)
                } else {
                    best
                }
            })
            .0
    }
}

/// Set of polygons (empty, single or multipolygon)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region {
    pub polygons: Vec<Polygon>,
}

impl Region {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a region, dropping polygons whose outer ring cannot bound an area
    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        Self {
            polygons: polygons
                .into_iter()
                .filter(|p| p.exterior.len() >= 3)
                .collect(),
        }
    }

    /// A region is empty when it bounds no measurable area
    pub fn is_empty(&self) -> bool {
        self.area() <= MIN_AREA_THRESHOLD
    }

    /// `Ok(self)` if the region bounds an area, otherwise an `EmptyResult` error
    pub fn into_non_empty(self, context: &str) -> Result<Self> {
        if self.is_empty() {
            Err(Error::EmptyResult(context.to_string()))
        } else {
            Ok(self)
        }
    }

    /// `None` for empty regions
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    pub fn area(&self) -> f64 {
        self.polygons.iter().map(Polygon::area).sum()
    }

    /// Total boundary length
    pub fn perimeter(&self) -> f64 {
        self.polygons.iter().map(Polygon::perimeter).sum()
    }

    pub fn rings(&self) -> impl Iterator<Item = &[Point2<f64>]> {
        self.polygons.iter().flat_map(|p| p.rings())
    }

    /// Every boundary edge (outer rings and holes)
    pub fn edges(&self) -> Vec<Segment> {
        self.polygons.iter().flat_map(|p| p.edges()).collect()
    }

    pub fn contains(&self, point: &Point2<f64>) -> bool {
        self.polygons.iter().any(|p| p.contains(point))
    }

    pub fn bounds(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let mut result: Option<(Point2<f64>, Point2<f64>)> = None;
        for (min, max) in self.polygons.iter().filter_map(Polygon::bounds) {
            result = Some(match result {
                None => (min, max),
                Some((lo, hi)) => (
                    Point2::new(lo.x.min(min.x), lo.y.min(min.y)),
                    Point2::new(hi.x.max(max.x), hi.y.max(max.y)),
                ),
            });
        }
        result
    }

    /// Area-weighted centroid of all polygons
    pub fn centroid(&self) -> Option<Point2<f64>> {
        let total = self.area();
        if total <= MIN_AREA_THRESHOLD {
            return self.polygons.first().map(Polygon::centroid);
        }
        let (sx, sy) = self.polygons.iter().fold((0.0, 0.0), |(sx, sy), p| {
            let c = p.centroid();
            let a = p.area();
            (sx + c.x * a, sy + c.y * a)
        });
        Some(Point2::new(sx / total, sy / total))
    }

    /// Interior point of the largest polygon
    pub fn representative_point(&self) -> Option<Point2<f64>> {
        self.polygons
            .iter()
            .max_by(|a, b| a.area().total_cmp(&b.area()))
            .map(Polygon::representative_point)
    }

    /// Distance to the nearest boundary edge, infinite for an empty region
    pub fn boundary_distance(&self, point: &Point2<f64>) -> f64 {
        self.polygons
            .iter()
            .map(|p| p.boundary_distance(point))
            .fold(f64::INFINITY, f64::min)
    }

    /// Distance to the region area (zero inside), infinite for an empty region
    pub fn distance_to_point(&self, point: &Point2<f64>) -> f64 {
        if self.contains(point) {
            return 0.0;
        }
        self.boundary_distance(point)
    }
}

impl From<Polygon> for Region {
    fn from(polygon: Polygon) -> Self {
        Self::from_polygons(vec![polygon])
    }
}

/// Iterate the closed sequence of edges of a ring
pub fn ring_edges(ring: &[Point2<f64>]) -> impl Iterator<Item = Segment> + '_ {
    let n = ring.len();
    let count = if n < 2 { 0 } else { n };
    (0..count).map(move |i| Segment::new(ring[i], ring[(i + 1) % n]))
}

/// Length of a closed ring
pub fn ring_length(ring: &[Point2<f64>]) -> f64 {
    ring_edges(ring).map(|e| e.length()).sum()
}

/// Compute the signed area of a 2D ring
/// Positive = counter-clockwise, Negative = clockwise
pub fn signed_area(ring: &[Point2<f64>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = ring.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += ring[i].x * ring[j].y;
        area -= ring[j].x * ring[i].y;
    }

    area * 0.5
}

/// Ensure ring has counter-clockwise winding (positive area)
pub fn ensure_ccw(ring: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if signed_area(ring) < 0.0 {
        ring.iter().rev().cloned().collect()
    } else {
        ring.to_vec()
    }
}

/// Ensure ring has clockwise winding (for holes)
pub fn ensure_cw(ring: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if signed_area(ring) > 0.0 {
        ring.iter().rev().cloned().collect()
    } else {
        ring.to_vec()
    }
}

/// Check if a point is inside a ring using ray casting
pub fn point_in_ring(point: &Point2<f64>, ring: &[Point2<f64>]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = ring.len();

    let mut j = n - 1;
    for i in 0..n {
        let pi = &ring[i];
        let pj = &ring[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Compute bounding box of a ring
pub fn ring_bounds(ring: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = ring.first()?;
    let mut min = *first;
    let mut max = *first;

    for p in ring.iter().skip(1) {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }

    Some((min, max))
}

/// Check if two bounding boxes overlap (touching counts)
pub fn bounds_overlap(
    a: &(Point2<f64>, Point2<f64>),
    b: &(Point2<f64>, Point2<f64>),
) -> bool {
    a.0.x <= b.1.x && a.1.x >= b.0.x && a.0.y <= b.1.y && a.1.y >= b.0.y
}

fn ring_centroid(ring: &[Point2<f64>]) -> Point2<f64> {
    let area = signed_area(ring);
    let n = ring.len();
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p = &ring[i];
        let q = &ring[(i + 1) % n];
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    Point2::new(cx / (6.0 * area), cy / (6.0 * area))
}

fn vertex_average(ring: &[Point2<f64>]) -> Point2<f64> {
    if ring.is_empty() {
        return Point2::origin();
    }
    let (sx, sy) = ring.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let n = ring.len() as f64;
    Point2::new(sx / n, sy / n)
}

/// Drop a repeated closing vertex and consecutive duplicates
fn open_ring(mut ring: Vec<Point2<f64>>) -> Vec<Point2<f64>> {
    ring.dedup_by(|a, b| (a.x - b.x).abs() < EPSILON_2D && (a.y - b.y).abs() < EPSILON_2D);
    while ring.len() > 1 {
        let first = ring[0];
        let last = ring[ring.len() - 1];
        if (first.x - last.x).abs() < EPSILON_2D && (first.y - last.y).abs() < EPSILON_2D {
            ring.pop();
        } else {
            break;
        }
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Polygon {
        Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(size, size))
    }

    #[test]
    fn test_signed_area_orientation() {
        let ccw = square(1.0);
        assert!((signed_area(&ccw.exterior) - 1.0).abs() < EPSILON_2D);

        let cw: Vec<_> = ccw.exterior.iter().rev().cloned().collect();
        assert!((signed_area(&cw) + 1.0).abs() < EPSILON_2D);
        assert!(signed_area(&ensure_ccw(&cw)) > 0.0);
        assert!(signed_area(&ensure_cw(&ccw.exterior)) < 0.0);
    }

    #[test]
    fn test_closing_vertex_is_dropped() {
        let polygon = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 0.0),
        ]);
        assert_eq!(polygon.exterior.len(), 3);
    }

    #[test]
    fn test_area_and_perimeter_with_hole() {
        let polygon = Polygon::with_holes(
            square(10.0).exterior,
            vec![Polygon::rectangle(Point2::new(4.0, 4.0), Point2::new(6.0, 6.0)).exterior],
        );
        assert!((polygon.area() - 96.0).abs() < 1e-9);
        assert!((polygon.perimeter() - 48.0).abs() < 1e-9);
        assert!(!polygon.contains(&Point2::new(5.0, 5.0)));
        assert!(polygon.contains(&Point2::new(2.0, 2.0)));
    }

    #[test]
    fn test_try_new_rejects_degenerate() {
        let line = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ];
        assert!(Polygon::try_new(line).is_err());
        assert!(Polygon::try_new(vec![Point2::new(0.0, 0.0)]).is_err());
        assert!(Polygon::try_new(square(2.0).exterior).is_ok());
    }

    #[test]
    fn test_representative_point_inside_concave() {
        // U shape: the bounding-box centre lies in the notch
        let u = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(9.0, 0.0),
            Point2::new(9.0, 9.0),
            Point2::new(6.0, 9.0),
            Point2::new(6.0, 3.0),
            Point2::new(3.0, 3.0),
            Point2::new(3.0, 9.0),
            Point2::new(0.0, 9.0),
        ]);
        let p = u.representative_point();
        assert!(u.contains(&p));
        assert!(!u.contains(&u.bounds().map(|(a, b)| Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)).unwrap()));
    }

    #[test]
    fn test_distances() {
        let polygon = square(10.0);
        assert_eq!(polygon.distance_to_point(&Point2::new(5.0, 5.0)), 0.0);
        assert!((polygon.boundary_distance(&Point2::new(5.0, 5.0)) - 5.0).abs() < 1e-12);
        assert!((polygon.distance_to_point(&Point2::new(13.0, 14.0)) - 5.0).abs() < 1e-12);
        assert!(Region::empty().distance_to_point(&Point2::new(0.0, 0.0)).is_infinite());
    }

    #[test]
    fn test_nearest_point() {
        let polygon = square(10.0);
        let inside = Point2::new(2.0, 3.0);
        assert_eq!(polygon.nearest_point(&inside), inside);
        assert_eq!(polygon.nearest_point(&Point2::new(5.0, -4.0)), Point2::new(5.0, 0.0));
        assert_eq!(polygon.nearest_point(&Point2::new(13.0, 14.0)), Point2::new(10.0, 10.0));
    }

    #[test]
    fn test_region_centroid_and_bounds() {
        let region = Region::from_polygons(vec![
            square(2.0),
            Polygon::rectangle(Point2::new(10.0, 0.0), Point2::new(12.0, 2.0)),
        ]);
        let c = region.centroid().unwrap();
        assert!((c.x - 6.0).abs() < 1e-9);
        assert!((c.y - 1.0).abs() < 1e-9);
        let (min, max) = region.bounds().unwrap();
        assert_eq!(min, Point2::new(0.0, 0.0));
        assert_eq!(max, Point2::new(12.0, 2.0));
        assert!(Region::empty().is_empty());
        assert!(Region::empty().into_non_empty("test").is_err());
    }

    #[test]
    fn test_serde_roundtrip_shape() {
        let region = Region::from(square(1.0));
        let json = serde_json::to_string(&region).unwrap();
        assert!(json.starts_with("[{\"exterior\":[[0.0,0.0]"));
        let back: Region = serde_json::from_str(&json).unwrap();
        assert_eq!(back, region);
    }
}
