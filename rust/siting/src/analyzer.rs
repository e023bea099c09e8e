// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary analysis pipeline
//!
//! Groups the neighbors, looks for the street, labels every perimeter edge,
//! prices the fence and derives the buildable envelope.

use crate::config::{BoundaryConfig, FenceConfig, SetbackConfig, SitingConfig};
use crate::envelope::{all_frontal_envelope, buildable_envelope};
use crate::error::{Error, Result};
use crate::neighbors::{classify_neighbors, detect_street_zone};
use crate::segments::{
    access_point, fence_cost, measure, needs_rescue, reconcile, rescue, NearZones,
    SegmentClassifier,
};
use crate::types::{Neighbor, ParcelAnalysis};
use parcela_geometry::{Polyline, Region, Segment, MIN_AREA_THRESHOLD};

/// Frontal/lateral classification and envelope for one parcel
#[derive(Debug, Clone, Default)]
pub struct BoundaryAnalyzer {
    boundary: BoundaryConfig,
    setbacks: SetbackConfig,
    fence: FenceConfig,
}

impl BoundaryAnalyzer {
    pub fn new(boundary: BoundaryConfig, setbacks: SetbackConfig, fence: FenceConfig) -> Self {
        Self {
            boundary,
            setbacks,
            fence,
        }
    }

    pub fn from_config(config: &SitingConfig) -> Self {
        Self::new(config.boundary.clone(), config.setbacks, config.fence)
    }

    pub fn boundary_config(&self) -> &BoundaryConfig {
        &self.boundary
    }

    /// Analyze `parcel` against its surroundings
    ///
    /// `subject_id` is the parcel's own cadastral reference, used to drop it
    /// from `neighbors`. Road centrelines are optional.
    pub fn analyze(
        &self,
        parcel: &Region,
        subject_id: Option<&str>,
        neighbors: &[Neighbor],
        roads: &[Polyline],
    ) -> Result<ParcelAnalysis> {
        if parcel.is_empty() || parcel.area() <= MIN_AREA_THRESHOLD {
            return Err(Error::EmptyParcel);
        }

        let total_perimeter = parcel.perimeter();
        let groups = classify_neighbors(neighbors, subject_id);

        let no_public_data = groups.public.is_none() && roads.is_empty();
        if groups.private.is_none() || no_public_data {
            return Ok(self.all_frontal(parcel, total_perimeter));
        }

        let street_zone = detect_street_zone(groups.public.as_ref(), parcel, &self.boundary);
        let zones = NearZones::build(
            parcel,
            street_zone.as_ref(),
            roads,
            groups.private.as_ref(),
            &self.boundary,
        );

        let mut segments = SegmentClassifier::new(&zones, &self.boundary).classify(parcel);
        let (mut frontal_length, lateral) = measure(&segments);
        let mut lateral_length = reconcile(
            frontal_length,
            lateral,
            total_perimeter,
            self.boundary.reconcile_ratio,
        );

        let has_public_land = zones.osm.is_some() || groups.public.is_some();
        let mut rescue_applied = false;
        if needs_rescue(frontal_length, has_public_land, &self.boundary) {
            tracing::warn!(frontal_length, "no frontage found, rescuing best stretch");
            rescue_applied = rescue(&mut segments, &self.boundary);
            if rescue_applied {
                let (frontal, lateral) = measure(&segments);
                frontal_length = frontal;
                lateral_length =
                    reconcile(frontal, lateral, total_perimeter, self.boundary.reconcile_ratio);
            }
        }

        let fence_cost = fence_cost(frontal_length, lateral_length, &self.fence);
        let access_point = access_point(parcel, &segments);

        tracing::info!(
            frontal_length,
            lateral_length,
            total_perimeter,
            fence_cost,
            rescue_applied,
            "perimeter classified"
        );

        let frontal: Vec<Segment> = segments
            .iter()
            .filter(|s| s.is_frontal())
            .map(|s| s.segment)
            .collect();
        let buildable = buildable_envelope(parcel, &frontal, &self.setbacks);

        Ok(ParcelAnalysis {
            fence_cost,
            buildable,
            frontal_length,
            lateral_length,
            total_perimeter,
            access_point,
            all_frontal: false,
            rescue_applied,
            segments,
        })
    }

    fn all_frontal(&self, parcel: &Region, total_perimeter: f64) -> ParcelAnalysis {
        tracing::info!(total_perimeter, "no private or public context, whole perimeter frontal");
        ParcelAnalysis {
            fence_cost: fence_cost(total_perimeter, 0.0, &self.fence),
            buildable: all_frontal_envelope(parcel, &self.setbacks),
            frontal_length: total_perimeter,
            lateral_length: 0.0,
            total_perimeter,
            access_point: access_point(parcel, &[]),
            all_frontal: true,
            rescue_applied: false,
            segments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;
    use parcela_geometry::Polygon;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::rectangle(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    #[test]
    fn test_empty_parcel_is_rejected() {
        let analyzer = BoundaryAnalyzer::default();
        let result = analyzer.analyze(&Region::empty(), None, &[], &[]);
        assert!(matches!(result, Err(Error::EmptyParcel)));
    }

    #[test]
    fn test_isolated_parcel_is_all_frontal() {
        let parcel = Region::from(rect(0.0, 0.0, 20.0, 20.0));
        let analysis = BoundaryAnalyzer::default()
            .analyze(&parcel, None, &[], &[])
            .unwrap();
        assert!(analysis.all_frontal);
        assert!((analysis.frontal_length - 80.0).abs() < 1e-9);
        assert!((analysis.fence_cost - 76.0 * 110.0).abs() < 1e-6);
        assert!((analysis.buildable_area() - 100.0).abs() < 1e-6);
        assert!(parcel.contains(&analysis.access_point));
        assert!(analysis.segments.is_empty());
    }

    #[test]
    fn test_private_neighbors_without_public_data_is_all_frontal() {
        let parcel = Region::from(rect(0.0, 0.0, 20.0, 20.0));
        let neighbors = vec![Neighbor::private("EAST", rect(20.0, 0.0, 40.0, 20.0))];
        let analysis = BoundaryAnalyzer::default()
            .analyze(&parcel, Some("SELF"), &neighbors, &[])
            .unwrap();
        assert!(analysis.all_frontal);
    }

    #[test]
    fn test_street_in_front_of_enclosed_parcel() {
        let parcel = Region::from(rect(0.0, 0.0, 20.0, 10.0));
        let neighbors = vec![
            Neighbor::private("W", rect(-20.0, 0.0, 0.0, 30.0)),
            Neighbor::private("N", rect(0.0, 10.0, 20.0, 30.0)),
            Neighbor::private("E", rect(20.0, 0.0, 40.0, 30.0)),
            Neighbor::public(rect(-40.0, -10.0, 60.0, 0.0)),
        ];
        let analysis = BoundaryAnalyzer::default()
            .analyze(&parcel, Some("SELF"), &neighbors, &[])
            .unwrap();

        assert!(!analysis.all_frontal);
        assert!(!analysis.rescue_applied);
        assert!((analysis.frontal_length - 20.0).abs() < 1e-6);
        assert!((analysis.lateral_length - 40.0).abs() < 1e-6);
        assert_eq!(analysis.frontal_segments().count(), 1);
        assert_eq!(analysis.access_point, Point2::new(10.0, 0.0));
    }
}
