// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Boolean Operations on polygon sets
//!
//! Intersection, union and difference of [`Region`]s using the i_overlay crate.
//! Every operand is submitted with outer rings counter-clockwise and holes
//! clockwise under the non-zero fill rule, so overlapping polygons inside a
//! single operand are merged rather than cancelled.

use crate::polygon::{bounds_overlap, ensure_ccw, ensure_cw, signed_area, Polygon, Region, MIN_AREA_THRESHOLD};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

/// i_overlay path format
pub(crate) type Path = Vec<[f64; 2]>;

impl Region {
    /// Area shared by both regions
    pub fn intersection(&self, other: &Region) -> Region {
        if self.polygons.is_empty() || other.polygons.is_empty() {
            return Region::empty();
        }
        match (self.bounds(), other.bounds()) {
            (Some(a), Some(b)) if bounds_overlap(&a, &b) => {}
            _ => return Region::empty(),
        }
        overlay_regions(self, other, OverlayRule::Intersect)
    }

    /// Area covered by either region
    pub fn union(&self, other: &Region) -> Region {
        if other.polygons.is_empty() {
            return self.normalized();
        }
        if self.polygons.is_empty() {
            return other.normalized();
        }
        overlay_regions(self, other, OverlayRule::Union)
    }

    /// Area of `self` not covered by `other`
    pub fn difference(&self, other: &Region) -> Region {
        if self.polygons.is_empty() {
            return Region::empty();
        }
        if other.polygons.is_empty() {
            return self.normalized();
        }
        overlay_regions(self, other, OverlayRule::Difference)
    }

    /// Self-union: merges overlapping members and drops degenerate rings
    pub fn normalized(&self) -> Region {
        if self.polygons.is_empty() {
            return Region::empty();
        }
        union_paths(region_to_paths(self))
    }

    /// True when the two regions share a positive area
    pub fn intersects(&self, other: &Region) -> bool {
        !self.intersection(other).is_empty()
    }
}

/// Union many regions at once
///
/// Hole-free inputs are merged in a single overlay; inputs with holes are
/// folded pairwise so that one member's hole never cancels another member's
/// coverage.
pub fn union_all(regions: &[Region]) -> Region {
    let has_holes = regions
        .iter()
        .any(|r| r.polygons.iter().any(|p| !p.holes.is_empty()));

    if has_holes {
        return regions
            .iter()
            .fold(Region::empty(), |acc, region| acc.union(region));
    }

    let paths: Vec<Path> = regions.iter().flat_map(region_to_paths).collect();
    if paths.is_empty() {
        return Region::empty();
    }
    union_paths(paths)
}

/// Union a set of hole-free contours submitted as one operand
pub(crate) fn union_paths(paths: Vec<Path>) -> Region {
    let clip: Vec<Path> = Vec::new();
    let result = paths.overlay(&clip, OverlayRule::Union, FillRule::NonZero);
    shapes_to_region(result)
}

fn overlay_regions(subject: &Region, clip: &Region, rule: OverlayRule) -> Region {
    let subject = region_to_paths(subject);
    let clip = region_to_paths(clip);

    // Result is Vec<Vec<Vec<[f64; 2]>>> - Vec of shapes, each shape is Vec of contours
    let result = subject.overlay(&clip, rule, FillRule::NonZero);
    shapes_to_region(result)
}

// ============================================================================
// Internal Helper Functions
// ============================================================================

/// Convert a region to i_overlay path format
fn region_to_paths(region: &Region) -> Vec<Path> {
    let mut paths = Vec::new();
    for polygon in &region.polygons {
        if polygon.exterior.len() < 3 {
            continue;
        }
        paths.push(ring_to_path(&ensure_ccw(&polygon.exterior)));
        for hole in polygon.holes.iter().filter(|h| h.len() >= 3) {
            paths.push(ring_to_path(&ensure_cw(hole)));
        }
    }
    paths
}

/// Convert a ring to i_overlay path format
pub(crate) fn ring_to_path(ring: &[Point2<f64>]) -> Path {
    ring.iter().map(|p| [p.x, p.y]).collect()
}

/// Convert i_overlay result shapes back to a region
///
/// i_overlay returns Vec<Vec<Vec<[f64; 2]>>> where:
/// - Outer Vec: list of shapes
/// - Middle Vec: list of contours per shape (first is outer, rest are holes)
/// - Inner Vec: list of points per contour
fn shapes_to_region(shapes: Vec<Vec<Vec<[f64; 2]>>>) -> Region {
    let mut polygons = Vec::with_capacity(shapes.len());

    for shape in shapes {
        let mut contours = shape.into_iter().map(|contour| {
            contour
                .into_iter()
                .map(|p| Point2::new(p[0], p[1]))
                .collect::<Vec<_>>()
        });

        let Some(outer) = contours.next() else {
            continue;
        };
        if signed_area(&outer).abs() <= MIN_AREA_THRESHOLD {
            continue;
        }

        let holes: Vec<Vec<Point2<f64>>> = contours
            .filter(|hole| signed_area(hole).abs() > MIN_AREA_THRESHOLD)
            .map(|hole| ensure_cw(&hole))
            .collect();

        polygons.push(Polygon::with_holes(ensure_ccw(&outer), holes));
    }

    Region::from_polygons(polygons)
}
