// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buffering of segments, polylines and regions
//!
//! A buffer is built as the union of elementary convex pieces: one rectangle
//! per edge, one join piece on the outer side of every turn, and a cap piece at
//! open ends. Region buffers add (positive distance) or subtract (negative
//! distance) the band of points near the boundary, which yields the same
//! mitred or rounded corners in both directions.

use crate::boolean::{ring_to_path, union_paths, Path};
use crate::line::{cross, perp, Polyline, Segment};
use crate::polygon::{ensure_ccw, signed_area, Polygon, Region, EPSILON_2D, MIN_AREA_THRESHOLD};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// End treatment of open lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapStyle {
    Round,
    /// Ends exactly at the line end
    Flat,
    /// Extends the line end by the buffer distance
    Square,
}

/// Corner treatment where two edges meet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStyle {
    Round,
    Mitre,
    Bevel,
}

/// Buffer construction parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferStyle {
    pub cap: CapStyle,
    pub join: JoinStyle,
    /// Mitre length over buffer distance above which the join is bevelled
    pub mitre_limit: f64,
    /// Arc segments per quarter circle for round caps and joins
    pub quadrant_segments: usize,
}

impl Default for BufferStyle {
    fn default() -> Self {
        Self {
            cap: CapStyle::Round,
            join: JoinStyle::Round,
            mitre_limit: 5.0,
            quadrant_segments: 8,
        }
    }
}

impl BufferStyle {
    /// Round caps with mitred corners
    pub fn mitred() -> Self {
        Self {
            join: JoinStyle::Mitre,
            ..Self::default()
        }
    }

    /// Flat caps with mitred corners
    pub fn flat_mitred() -> Self {
        Self {
            cap: CapStyle::Flat,
            join: JoinStyle::Mitre,
            ..Self::default()
        }
    }
}

impl Segment {
    /// Buffer the segment by `width` on both sides
    pub fn buffer(&self, width: f64, style: &BufferStyle) -> Region {
        if width <= 0.0 || self.length() <= EPSILON_2D {
            return Region::empty();
        }
        if style.cap == CapStyle::Flat {
            // Single rectangle, no overlay needed
            let piece = edge_rectangle(self.start, self.end, width);
            return Region::from(Polygon::new(piece));
        }
        buffer_chain(&[self.start, self.end], false, width, style)
    }
}

impl Polyline {
    /// Buffer the polyline by `width` on both sides
    pub fn buffer(&self, width: f64, style: &BufferStyle) -> Region {
        if width <= 0.0 {
            return Region::empty();
        }
        buffer_chain(&self.points, false, width, style)
    }
}

impl Region {
    /// Offset the region outwards (`distance > 0`) or inwards (`distance < 0`)
    ///
    /// Caps do not apply to closed rings; only the join style matters.
    pub fn buffer(&self, distance: f64, style: &BufferStyle) -> Region {
        if self.polygons.is_empty() {
            return Region::empty();
        }
        if distance.abs() <= EPSILON_2D {
            return self.normalized();
        }

        let band = self.boundary_band(distance.abs(), style);
        if distance > 0.0 {
            self.union(&band)
        } else {
            let inset = self.difference(&band);
            if inset.is_empty() {
                tracing::trace!(distance, area = self.area(), "inward buffer collapsed");
            }
            inset
        }
    }

    /// Points within `width` of any ring of the region
    pub fn boundary_band(&self, width: f64, style: &BufferStyle) -> Region {
        if width <= 0.0 {
            return Region::empty();
        }
        let pieces: Vec<Path> = self
            .rings()
            .flat_map(|ring| stroke_pieces(ring, true, width, style))
            .collect();
        if pieces.is_empty() {
            return Region::empty();
        }
        union_paths(pieces)
    }
}

/// Buffer a collection of independent segments (each capped separately)
pub fn buffer_segments(segments: &[Segment], width: f64, style: &BufferStyle) -> Region {
    if width <= 0.0 {
        return Region::empty();
    }
    let pieces: Vec<Path> = segments
        .iter()
        .flat_map(|s| stroke_pieces(&[s.start, s.end], false, width, style))
        .collect();
    if pieces.is_empty() {
        return Region::empty();
    }
    union_paths(pieces)
}

/// Buffer a collection of polylines and union the result
pub fn buffer_polylines(lines: &[Polyline], width: f64, style: &BufferStyle) -> Region {
    if width <= 0.0 {
        return Region::empty();
    }
    let pieces: Vec<Path> = lines
        .iter()
        .flat_map(|l| stroke_pieces(&l.points, false, width, style))
        .collect();
    if pieces.is_empty() {
        return Region::empty();
    }
    union_paths(pieces)
}

fn buffer_chain(points: &[Point2<f64>], closed: bool, width: f64, style: &BufferStyle) -> Region {
    let pieces = stroke_pieces(points, closed, width, style);
    if pieces.is_empty() {
        return Region::empty();
    }
    union_paths(pieces)
}

/// Convex pieces whose union is the buffer of a point chain
///
/// All pieces are counter-clockwise so they can be merged under the
/// non-zero fill rule in a single overlay.
pub(crate) fn stroke_pieces(
    points: &[Point2<f64>],
    closed: bool,
    width: f64,
    style: &BufferStyle,
) -> Vec<Path> {
    let mut chain: Vec<Point2<f64>> = points.to_vec();
    chain.dedup_by(|a, b| (*a - *b).norm() <= EPSILON_2D);
    if closed && chain.len() > 1 && (chain[0] - chain[chain.len() - 1]).norm() <= EPSILON_2D {
        chain.pop();
    }

    let n = chain.len();
    let mut pieces = Vec::new();
    if n < 2 {
        return pieces;
    }

    let edge_count = if closed { n } else { n - 1 };
    for i in 0..edge_count {
        let a = chain[i];
        let b = chain[(i + 1) % n];
        pieces.push(ring_to_path(&edge_rectangle(a, b, width)));
    }

    let direction = |i: usize| -> Vector2<f64> {
        let a = chain[i % n];
        let b = chain[(i + 1) % n];
        (b - a).normalize()
    };

    // Joins: closed rings turn at every vertex, open chains at interior ones
    let join_vertices: Vec<usize> = if closed {
        (0..n).collect()
    } else {
        (1..n - 1).collect()
    };
    for i in join_vertices {
        let incoming = direction((i + n - 1) % n);
        let outgoing = direction(i);
        if let Some(piece) = join_piece(chain[i], &incoming, &outgoing, width, style) {
            pieces.push(piece);
        }
    }

    if !closed {
        let first = direction(0);
        let last = direction(n - 2);
        for (point, outward) in [(chain[0], -first), (chain[n - 1], last)] {
            if let Some(piece) = cap_piece(point, &outward, width, style) {
                pieces.push(piece);
            }
        }
    }

    pieces
}

/// Rectangle covering `width` on both sides of edge `a -> b`, counter-clockwise
fn edge_rectangle(a: Point2<f64>, b: Point2<f64>, width: f64) -> Vec<Point2<f64>> {
    let u = (b - a).normalize();
    let n = perp(&u) * width;
    vec![a - n, b - n, b + n, a + n]
}

fn join_piece(
    vertex: Point2<f64>,
    incoming: &Vector2<f64>,
    outgoing: &Vector2<f64>,
    width: f64,
    style: &BufferStyle,
) -> Option<Path> {
    let turn = cross(incoming, outgoing);
    let straight = turn.abs() <= 1e-12 && incoming.dot(outgoing) > 0.0;
    if straight {
        return None;
    }

    // The gap between the two edge rectangles opens on the outer side of the turn
    let (s1, s2) = if turn > 0.0 {
        (-perp(incoming), -perp(outgoing))
    } else {
        (perp(incoming), perp(outgoing))
    };
    let o1 = vertex + s1 * width;
    let o2 = vertex + s2 * width;

    let ring = match style.join {
        JoinStyle::Bevel => vec![vertex, o1, o2],
        JoinStyle::Mitre => {
            let bisector = s1 + s2;
            let norm = bisector.norm();
            if norm <= EPSILON_2D {
                vec![vertex, o1, o2]
            } else {
                let m = bisector / norm;
                let cos_half = m.dot(&s1);
                let mitre_length = width / cos_half.max(EPSILON_2D);
                if mitre_length > style.mitre_limit * width {
                    vec![vertex, o1, o2]
                } else {
                    vec![vertex, o1, vertex + m * mitre_length, o2]
                }
            }
        }
        JoinStyle::Round => {
            let sweep = cross(&s1, &s2).atan2(s1.dot(&s2));
            let mut ring = vec![vertex];
            ring.extend(arc(vertex, &s1, sweep, width, style.quadrant_segments));
            ring
        }
    };

    closed_piece(ring)
}

fn cap_piece(
    end: Point2<f64>,
    outward: &Vector2<f64>,
    width: f64,
    style: &BufferStyle,
) -> Option<Path> {
    let n = perp(outward);
    let ring = match style.cap {
        CapStyle::Flat => return None,
        CapStyle::Square => {
            let ext = outward * width;
            vec![end + n * width, end + n * width + ext, end - n * width + ext, end - n * width]
        }
        CapStyle::Round => {
            // Half disc from the left side, through the tip, to the right side
            arc(end, &n, -std::f64::consts::PI, width, style.quadrant_segments)
        }
    };
    closed_piece(ring)
}

/// Points on a circular arc starting at `center + start * radius`
fn arc(
    center: Point2<f64>,
    start: &Vector2<f64>,
    sweep: f64,
    radius: f64,
    quadrant_segments: usize,
) -> Vec<Point2<f64>> {
    let steps = ((sweep.abs() / FRAC_PI_2) * quadrant_segments.max(1) as f64)
        .ceil()
        .max(1.0) as usize;
    let start_angle = start.y.atan2(start.x);
    (0..=steps)
        .map(|k| {
            let angle = start_angle + sweep * (k as f64 / steps as f64);
            Point2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

fn closed_piece(ring: Vec<Point2<f64>>) -> Option<Path> {
    if ring.len() < 3 || signed_area(&ring).abs() <= MIN_AREA_THRESHOLD {
        return None;
    }
    Some(ring_to_path(&ensure_ccw(&ring)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Region {
        Region::from(Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(size, size)))
    }

    #[test]
    fn test_flat_segment_buffer_is_rectangle() {
        let seg = Segment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        let buf = seg.buffer(0.3, &BufferStyle::flat_mitred());
        assert_eq!(buf.polygons.len(), 1);
        assert!((buf.area() - 6.0).abs() < 1e-9);
        assert!(buf.contains(&Point2::new(5.0, 0.2)));
        assert!(!buf.contains(&Point2::new(10.2, 0.0)));
    }

    #[test]
    fn test_square_cap_extends_ends() {
        let seg = Segment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        let style = BufferStyle {
            cap: CapStyle::Square,
            ..BufferStyle::default()
        };
        let buf = seg.buffer(1.0, &style);
        assert!((buf.area() - 24.0).abs() < 1e-6);
    }

    #[test]
    fn test_round_cap_approximates_stadium() {
        let seg = Segment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        let buf = seg.buffer(1.0, &BufferStyle::default());
        let exact = 20.0 + std::f64::consts::PI;
        assert!((buf.area() - exact).abs() < 0.05);
    }

    #[test]
    fn test_mitred_outward_square() {
        let buf = square(10.0).buffer(1.0, &BufferStyle::mitred());
        assert_eq!(buf.polygons.len(), 1);
        assert!((buf.area() - 144.0).abs() < 1e-6);
        assert!(buf.contains(&Point2::new(-0.9, -0.9)));
    }

    #[test]
    fn test_mitred_inward_square() {
        let buf = square(10.0).buffer(-3.0, &BufferStyle::mitred());
        assert!((buf.area() - 16.0).abs() < 1e-6);
        assert!(buf.contains(&Point2::new(5.0, 5.0)));
        assert!(!buf.contains(&Point2::new(2.0, 5.0)));
    }

    #[test]
    fn test_inward_buffer_larger_than_shape_is_empty() {
        let buf = square(4.0).buffer(-3.0, &BufferStyle::mitred());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_concave_inward_buffer_keeps_mitred_reflex_corner() {
        // L shape with a reflex corner at (5, 5)
        let l = Region::from(Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 5.0),
            Point2::new(5.0, 5.0),
            Point2::new(5.0, 10.0),
            Point2::new(0.0, 10.0),
        ]));
        let inset = l.buffer(-1.0, &BufferStyle::mitred());
        // Inset L: 8x3 bottom arm plus 3x5 upright arm
        let expected = 8.0 * 3.0 + 3.0 * 5.0;
        assert!((inset.area() - expected).abs() < 1e-6);
        assert!(!inset.contains(&Point2::new(5.5, 5.5)));
    }

    #[test]
    fn test_boundary_band_of_square() {
        let band = square(10.0).boundary_band(0.5, &BufferStyle::mitred());
        // Outer 11x11 minus inner 9x9
        assert!((band.area() - 40.0).abs() < 1e-6);
        assert!(!band.contains(&Point2::new(5.0, 5.0)));
    }

    #[test]
    fn test_polyline_buffer_with_turn() {
        let line = Polyline::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
        ]);
        let buf = line.buffer(1.0, &BufferStyle::flat_mitred());
        // Two 2-wide strips of length 10 overlapping in a 1x1 inner square plus the
        // 1x1 mitre corner on the outside
        let expected = 20.0 + 20.0 - 1.0 + 1.0;
        assert!((buf.area() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_zero_distance_region_buffer_normalizes() {
        let region = square(2.0);
        let buf = region.buffer(0.0, &BufferStyle::default());
        assert!((buf.area() - 4.0).abs() < 1e-9);
    }
}
