// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Convex hull and minimum-area bounding rectangle

use crate::line::{cross, perp};
use crate::polygon::{Polygon, EPSILON_2D};
use nalgebra::Point2;

/// Convex hull (Andrew's monotone chain), counter-clockwise without repeats
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut pts: Vec<Point2<f64>> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup_by(|a, b| (*a - *b).norm() <= EPSILON_2D);

    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Point2<f64>> = Vec::with_capacity(pts.len() * 2);
    for pass in 0..2 {
        let start = hull.len();
        let iter: Box<dyn Iterator<Item = &Point2<f64>>> = if pass == 0 {
            Box::new(pts.iter())
        } else {
            Box::new(pts.iter().rev())
        };
        for p in iter {
            while hull.len() >= start + 2 {
                let a = hull[hull.len() - 2];
                let b = hull[hull.len() - 1];
                if cross(&(b - a), &(*p - a)) <= EPSILON_2D {
                    hull.pop();
                } else {
                    break;
                }
            }
            hull.push(*p);
        }
        // Last point of each chain starts the next one
        hull.pop();
    }
    hull
}

/// Minimum-area rectangle enclosing the polygon's outer ring
///
/// Rotating calipers over the convex hull. Corners are returned
/// counter-clockwise; `None` when the hull has no area.
pub fn minimum_rotated_rectangle(polygon: &Polygon) -> Option<[Point2<f64>; 4]> {
    let hull = convex_hull(&polygon.exterior);
    if hull.len() < 3 {
        return None;
    }

    let mut best: Option<(f64, [Point2<f64>; 4])> = None;
    let n = hull.len();
    for i in 0..n {
        let edge = hull[(i + 1) % n] - hull[i];
        let len = edge.norm();
        if len <= EPSILON_2D {
            continue;
        }
        let u = edge / len;
        let v = perp(&u);

        let (mut min_u, mut max_u, mut min_v, mut max_v) =
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
        for p in &hull {
            let d = *p - hull[i];
            let pu = d.dot(&u);
            let pv = d.dot(&v);
            min_u = min_u.min(pu);
            max_u = max_u.max(pu);
            min_v = min_v.min(pv);
            max_v = max_v.max(pv);
        }

        let area = (max_u - min_u) * (max_v - min_v);
        if best.as_ref().map_or(true, |(a, _)| area < *a) {
            let o = hull[i];
            best = Some((
                area,
                [
                    o + u * min_u + v * min_v,
                    o + u * max_u + v * min_v,
                    o + u * max_u + v * max_v,
                    o + u * min_u + v * max_v,
                ],
            ));
        }
    }

    best.map(|(_, corners)| corners)
}

/// Lengths of the four rectangle edges in corner order
pub fn rectangle_edge_lengths(corners: &[Point2<f64>; 4]) -> [f64; 4] {
    let mut lengths = [0.0; 4];
    for (i, length) in lengths.iter_mut().enumerate() {
        *length = (corners[(i + 1) % 4] - corners[i]).norm();
    }
    lengths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convex_hull_drops_interior_points() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
            Point2::new(2.0, 2.0),
        ];
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);
        assert!(crate::polygon::signed_area(&hull) > 0.0);
    }

    #[test]
    fn test_rotated_rectangle_of_tilted_strip() {
        // 10 x 2 strip rotated by 45 degrees
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let strip = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0 * s, 10.0 * s),
            Point2::new(10.0 * s - 2.0 * s, 10.0 * s + 2.0 * s),
            Point2::new(-2.0 * s, 2.0 * s),
        ]);
        let rect = minimum_rotated_rectangle(&strip).unwrap();
        let mut lengths = rectangle_edge_lengths(&rect);
        lengths.sort_by(|a, b| b.total_cmp(a));
        assert!((lengths[0] - 10.0).abs() < 1e-9);
        assert!((lengths[3] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_polygon_has_no_rectangle() {
        let line = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ]);
        assert!(minimum_rotated_rectangle(&line).is_none());
    }
}
