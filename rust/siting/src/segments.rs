// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Perimeter segment classification
//!
//! Each boundary edge gets a thin catchment rectangle. Its overlap with the
//! street and neighbor zones just outside the parcel decides whether the edge
//! fronts a street. When no frontage is found although public land exists,
//! the rescue promotes the best-scoring stretch of boundary.

use crate::config::{BoundaryConfig, FenceConfig};
use crate::types::{BoundarySegment, SegmentLabel};
use nalgebra::Point2;
use parcela_geometry::{buffer_polylines, BufferStyle, LineSet, Polyline, Region, Segment};

/// Score weight of the road overlap area
const OSM_AREA_WEIGHT: f64 = 1.0;
/// Score weight of the cadastral street overlap area
const CADASTRAL_AREA_WEIGHT: f64 = 0.7;
/// Numerator of the road proximity term
const OSM_PROXIMITY_WEIGHT: f64 = 0.25;
/// Numerator of the cadastral street proximity term
const CADASTRAL_PROXIMITY_WEIGHT: f64 = 0.10;
/// Keeps proximity terms finite inside a zone
const PROXIMITY_OFFSET: f64 = 0.1;

/// Band of width `outside_ring_width` hugging the parcel from outside
pub fn outside_ring(parcel: &Region, config: &BoundaryConfig) -> Region {
    parcel
        .buffer(config.outside_ring_width, &BufferStyle::mitred())
        .difference(&parcel.normalized())
}

/// Part of `ring` within `epsilon` of `zone`, `None` when nothing remains
pub fn near_zone(ring: &Region, zone: Option<&Region>, epsilon: f64) -> Option<Region> {
    let zone = zone?;
    if zone.is_empty() {
        return None;
    }
    ring.intersection(&zone.buffer(epsilon, &BufferStyle::default()))
        .into_option()
}

/// Zones just outside the parcel against which edges are tested
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NearZones {
    /// From the cadastral street zone
    pub cadastral: Option<Region>,
    /// From mapped road centrelines
    pub osm: Option<Region>,
    /// From private neighbors
    pub private: Option<Region>,
}

impl NearZones {
    pub fn build(
        parcel: &Region,
        street_zone: Option<&Region>,
        roads: &[Polyline],
        private: Option<&Region>,
        config: &BoundaryConfig,
    ) -> Self {
        let ring = outside_ring(parcel, config);
        let eps = config.neighbor_epsilon;

        let road_zone = if roads.is_empty() {
            None
        } else {
            buffer_polylines(roads, config.road_buffer, &BufferStyle::flat_mitred()).into_option()
        };

        Self {
            cadastral: near_zone(&ring, street_zone, eps),
            osm: near_zone(&ring, road_zone.as_ref(), eps),
            private: near_zone(&ring, private, eps),
        }
    }
}

/// Classifies the edges of a parcel against a set of near zones
pub struct SegmentClassifier<'a> {
    zones: &'a NearZones,
    config: &'a BoundaryConfig,
}

impl<'a> SegmentClassifier<'a> {
    pub fn new(zones: &'a NearZones, config: &'a BoundaryConfig) -> Self {
        Self { zones, config }
    }

    /// Classify every outer-ring edge of `parcel`, in perimeter order
    pub fn classify(&self, parcel: &Region) -> Vec<BoundarySegment> {
        #[cfg(not(target_arch = "wasm32"))]
        use rayon::prelude::*;

        let edges: Vec<Segment> = parcel
            .polygons
            .iter()
            .flat_map(|p| p.exterior_edges())
            .filter(|e| e.length() > self.config.min_segment_length)
            .collect();

        // Indexed collect keeps perimeter order on both paths
        #[cfg(not(target_arch = "wasm32"))]
        let segments: Vec<BoundarySegment> = edges.par_iter().map(|e| self.classify_edge(e)).collect();

        #[cfg(target_arch = "wasm32")]
        let segments: Vec<BoundarySegment> = edges.iter().map(|e| self.classify_edge(e)).collect();

        segments
    }

    /// Label and score one edge
    pub fn classify_edge(&self, edge: &Segment) -> BoundarySegment {
        let catchment = edge.buffer(self.config.segment_buffer, &BufferStyle::flat_mitred());

        let overlap = |zone: &Option<Region>| {
            zone.as_ref()
                .map_or(0.0, |z| catchment.intersection(z).area())
        };
        let cadastral = overlap(&self.zones.cadastral);
        let osm = overlap(&self.zones.osm);
        let private = overlap(&self.zones.private);

        let probe = catchment
            .representative_point()
            .unwrap_or_else(|| edge.midpoint());
        let tol = self.config.area_tolerance;

        // Road overlap, then street overlap, then road proximity
        let frontal = osm > cadastral.max(private) + tol
            || cadastral > osm.max(private) + tol
            || self
                .zones
                .osm
                .as_ref()
                .is_some_and(|z| z.boundary_distance(&probe) <= self.config.road_distance_max);

        let distance_to = |zone: &Option<Region>| {
            zone.as_ref()
                .map_or(f64::INFINITY, |z| z.distance_to_point(&probe))
        };
        let score = OSM_AREA_WEIGHT * osm
            + CADASTRAL_AREA_WEIGHT * cadastral
            + OSM_PROXIMITY_WEIGHT / (distance_to(&self.zones.osm) + PROXIMITY_OFFSET)
            + CADASTRAL_PROXIMITY_WEIGHT / (distance_to(&self.zones.cadastral) + PROXIMITY_OFFSET);

        BoundarySegment {
            segment: *edge,
            label: if frontal {
                SegmentLabel::Frontal
            } else {
                SegmentLabel::Lateral
            },
            score,
            osm_overlap: osm,
            cadastral_overlap: cadastral,
            private_overlap: private,
        }
    }
}

/// Merged lengths of the frontal and lateral edges
pub fn measure(segments: &[BoundarySegment]) -> (f64, f64) {
    let pick = |label: SegmentLabel| -> Vec<Segment> {
        segments
            .iter()
            .filter(|s| s.label == label)
            .map(|s| s.segment)
            .collect()
    };
    let frontal = LineSet::union_of(&pick(SegmentLabel::Frontal)).length();
    let lateral = LineSet::union_of(&pick(SegmentLabel::Lateral)).length();
    (frontal, lateral)
}

/// Lateral length after closing the gap to the parcel perimeter
///
/// When the two lengths already cover more than `ratio` of the perimeter the
/// lateral share becomes the remainder, so both add up to the perimeter.
pub fn reconcile(frontal: f64, lateral: f64, total_perimeter: f64, ratio: f64) -> f64 {
    if frontal + lateral > total_perimeter * ratio {
        (total_perimeter - frontal).max(0.0)
    } else {
        lateral
    }
}

/// Whether the rescue should run on a classification
pub fn needs_rescue(frontal_length: f64, has_public_land: bool, config: &BoundaryConfig) -> bool {
    frontal_length < config.rescue_min_frontal && has_public_land
}

/// Promote the best-scoring stretch of boundary to frontage
///
/// Edges scoring at least `rescue_score_ratio` of the best score form the
/// rescued line (its longest connected piece when it falls apart). Every edge
/// touching that line becomes frontal, every other edge lateral. Returns
/// `false` when there is nothing to rank.
pub fn rescue(segments: &mut [BoundarySegment], config: &BoundaryConfig) -> bool {
    let mut ranked: Vec<&BoundarySegment> = segments.iter().collect();
    // Stable: equal scores keep perimeter order
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    let Some(top) = ranked.first() else {
        return false;
    };
    let threshold = top.score * config.rescue_score_ratio;
    let candidates: Vec<Segment> = ranked
        .iter()
        .filter(|s| s.score >= threshold)
        .map(|s| s.segment)
        .collect();

    let touch = 2.0 * config.rescue_touch;
    let rescued = if candidates.len() == 1 {
        LineSet {
            segments: candidates,
        }
    } else {
        LineSet::union_of(&candidates).longest_component(touch)
    };

    for segment in segments.iter_mut() {
        segment.label = if rescued.distance_to_segment(&segment.segment) <= touch {
            SegmentLabel::Frontal
        } else {
            SegmentLabel::Lateral
        };
    }

    tracing::debug!(
        candidates = rescued.segments.len(),
        rescued_length = rescued.length(),
        "rescued frontage"
    );
    true
}

/// Fence cost with the gate opening left unbilled
pub fn fence_cost(frontal_length: f64, lateral_length: f64, fence: &FenceConfig) -> f64 {
    (frontal_length - fence.gate_width).max(0.0) * fence.frontal_rate
        + lateral_length * fence.lateral_rate
}

/// Midpoint of the longest frontal edge, or a point inside the parcel
pub fn access_point(parcel: &Region, segments: &[BoundarySegment]) -> Point2<f64> {
    let longest = segments
        .iter()
        .filter(|s| s.is_frontal())
        .fold(None, |best: Option<&BoundarySegment>, s| match best {
            Some(b) if b.length() >= s.length() => Some(b),
            _ => Some(s),
        });

    match longest {
        Some(segment) => segment.segment.midpoint(),
        None => parcel
            .representative_point()
            .unwrap_or_else(|| Point2::origin()),
    }
}
