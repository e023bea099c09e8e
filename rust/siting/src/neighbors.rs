// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Neighbor grouping and street zone detection

use crate::config::BoundaryConfig;
use crate::types::Neighbor;
use parcela_geometry::{
    minimum_rotated_rectangle, rectangle_edge_lengths, union_all, BufferStyle, Polygon, Region,
};
use std::f64::consts::PI;

/// Neighbor geometries merged by ownership
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborGroups {
    /// Union of cadastral parcels other than the subject
    pub private: Option<Region>,
    /// Union of land without a cadastral reference
    pub public: Option<Region>,
}

/// Split neighbors into private and public land and merge each group
///
/// Neighbors carrying the subject's own reference are dropped.
pub fn classify_neighbors(neighbors: &[Neighbor], subject_id: Option<&str>) -> NeighborGroups {
    let mut private = Vec::new();
    let mut public = Vec::new();

    for neighbor in neighbors {
        match (&neighbor.cadastral_id, subject_id) {
            (Some(id), Some(subject)) if id == subject => continue,
            (Some(_), _) => private.push(neighbor.geometry.clone()),
            (None, _) => public.push(neighbor.geometry.clone()),
        }
    }

    tracing::debug!(
        private = private.len(),
        public = public.len(),
        "neighbors grouped"
    );

    NeighborGroups {
        private: merge(&private),
        public: merge(&public),
    }
}

fn merge(regions: &[Region]) -> Option<Region> {
    if regions.is_empty() {
        return None;
    }
    union_all(regions).into_option()
}

/// Isoperimetric quotient `4 pi A / P^2`, 1 for a disc, 0 without perimeter
pub fn compactness(polygon: &Polygon) -> f64 {
    let perimeter = polygon.perimeter();
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * PI * polygon.area() / (perimeter * perimeter)
}

/// Ratio of the two longest edges of the minimum rotated rectangle
///
/// Infinite when the second longest edge vanishes, 1 when no rectangle exists.
/// Opposite sides of a rectangle match, so proper rectangles score close to 1.
pub fn aspect_ratio(polygon: &Polygon) -> f64 {
    let Some(rectangle) = minimum_rotated_rectangle(polygon) else {
        return 1.0;
    };
    let mut lengths = rectangle_edge_lengths(&rectangle);
    lengths.sort_by(|a, b| b.total_cmp(a));
    let (first, second) = (lengths[0], lengths[1]);
    if second <= 1e-12 {
        f64::INFINITY
    } else {
        first / second
    }
}

/// Shape test for public land that looks like a street
pub fn is_street_like(polygon: &Polygon, config: &BoundaryConfig) -> bool {
    compactness(polygon) <= config.street_compact_max
        || aspect_ratio(polygon) >= config.street_aspect_min
}

/// Public component best matching the street in front of the parcel
///
/// Candidates are street-like components touching the parcel boundary; the
/// one sharing the most boundary wins and is returned slightly expanded.
pub fn detect_street_zone(
    public: Option<&Region>,
    parcel: &Region,
    config: &BoundaryConfig,
) -> Option<Region> {
    let public = public?;
    let round = BufferStyle::default();
    let boundary_band = parcel.boundary_band(config.boundary_band, &round);

    let mut best: Option<(f64, &Polygon)> = None;
    for component in &public.polygons {
        let component_region = Region::from(component.clone());
        if !component_region.intersects(&boundary_band) {
            continue;
        }
        if !is_street_like(component, config) {
            continue;
        }

        // Shared stretch approximated as half the perimeter of the overlap band
        let shared = boundary_band
            .intersection(&component_region.boundary_band(config.boundary_band, &round))
            .perimeter()
            / 2.0;
        if best.map_or(true, |(length, _)| shared > length) {
            best = Some((shared, component));
        }
    }

    let (shared, street) = best?;
    tracing::debug!(shared, "street zone detected");
    Region::from(street.clone())
        .buffer(config.street_expansion, &round)
        .into_option()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::rectangle(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    #[test]
    fn test_subject_is_excluded_and_groups_are_merged() {
        let neighbors = vec![
            Neighbor::private("A", rect(20.0, 0.0, 40.0, 20.0)),
            Neighbor::private("SELF", rect(0.0, 0.0, 20.0, 20.0)),
            Neighbor::private("B", rect(20.0, 20.0, 40.0, 40.0)),
            Neighbor::public(rect(0.0, -10.0, 40.0, 0.0)),
        ];
        let groups = classify_neighbors(&neighbors, Some("SELF"));
        let private = groups.private.unwrap();
        assert_eq!(private.polygons.len(), 1);
        assert!((private.area() - 800.0).abs() < 1e-6);
        assert!((groups.public.unwrap().area() - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_groups_are_none() {
        let groups = classify_neighbors(&[Neighbor::public(rect(0.0, 0.0, 1.0, 1.0))], None);
        assert!(groups.private.is_none());
        assert!(groups.public.is_some());
        assert_eq!(classify_neighbors(&[], None), NeighborGroups::default());
    }

    #[test]
    fn test_shape_measures() {
        let square = rect(0.0, 0.0, 10.0, 10.0);
        assert!((compactness(&square) - PI / 4.0).abs() < 1e-12);
        assert!((aspect_ratio(&square) - 1.0).abs() < 1e-9);

        let config = BoundaryConfig::default();
        // Compactness 0.326: too chunky, and the aspect of a rectangle stays 1
        let block = rect(0.0, 0.0, 60.0, 8.0);
        assert!((compactness(&block) - 0.326).abs() < 1e-3);
        assert!((aspect_ratio(&block) - 1.0).abs() < 1e-9);
        assert!(!is_street_like(&block, &config));

        let strip = rect(0.0, 0.0, 120.0, 6.0);
        assert!(compactness(&strip) < config.street_compact_max);
        assert!(is_street_like(&strip, &config));
        assert!(!is_street_like(&square, &config));
    }

    #[test]
    fn test_street_zone_prefers_adjacent_strip() {
        let parcel = Region::from(rect(0.0, 0.0, 20.0, 20.0));
        let public = union_all(&[
            Region::from(rect(-40.0, -8.0, 60.0, 0.0)),
            // Square plaza touching the east side: not street-like
            Region::from(rect(20.0, 5.0, 30.0, 15.0)),
            // Street-like strip far away
            Region::from(rect(100.0, 0.0, 220.0, 8.0)),
        ]);
        let config = BoundaryConfig::default();
        let zone = detect_street_zone(Some(&public), &parcel, &config).unwrap();
        assert!(zone.contains(&Point2::new(10.0, -4.0)));
        assert!(!zone.contains(&Point2::new(25.0, 10.0)));
        assert!(!zone.contains(&Point2::new(160.0, 4.0)));
        // Expanded by 0.6 m
        assert!(zone.contains(&Point2::new(10.0, 0.5)));
    }

    #[test]
    fn test_short_wide_block_is_not_a_street() {
        let parcel = Region::from(rect(0.0, 0.0, 20.0, 20.0));
        let block = Region::from(rect(-20.0, -8.0, 40.0, 0.0));
        let config = BoundaryConfig::default();
        assert!(detect_street_zone(Some(&block), &parcel, &config).is_none());
    }

    #[test]
    fn test_no_street_zone_without_candidates() {
        let parcel = Region::from(rect(0.0, 0.0, 20.0, 20.0));
        let plaza = Region::from(rect(20.0, 0.0, 40.0, 20.0));
        let config = BoundaryConfig::default();
        assert!(detect_street_zone(Some(&plaza), &parcel, &config).is_none());
        assert!(detect_street_zone(None, &parcel, &config).is_none());
    }
}
