// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary analysis types

use nalgebra::Point2;
use parcela_geometry::{Region, Segment};
use serde::{Deserialize, Serialize};

/// Land adjoining the subject parcel
///
/// Cadastral parcels carry their reference; public land (streets, squares,
/// rights of way) has none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub geometry: Region,
    #[serde(default)]
    pub cadastral_id: Option<String>,
}

impl Neighbor {
    pub fn private(cadastral_id: impl Into<String>, geometry: impl Into<Region>) -> Self {
        Self {
            geometry: geometry.into(),
            cadastral_id: Some(cadastral_id.into()),
        }
    }

    pub fn public(geometry: impl Into<Region>) -> Self {
        Self {
            geometry: geometry.into(),
            cadastral_id: None,
        }
    }

    pub fn is_public(&self) -> bool {
        self.cadastral_id.is_none()
    }
}

/// Perimeter role of a boundary edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentLabel {
    /// Faces a street
    Frontal,
    /// Faces another parcel
    Lateral,
}

/// One classified edge of the parcel boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundarySegment {
    pub segment: Segment,
    pub label: SegmentLabel,
    /// Street relevance used to rank edges during the rescue
    pub score: f64,
    pub osm_overlap: f64,
    pub cadastral_overlap: f64,
    pub private_overlap: f64,
}

impl BoundarySegment {
    #[inline]
    pub fn length(&self) -> f64 {
        self.segment.length()
    }

    #[inline]
    pub fn is_frontal(&self) -> bool {
        self.label == SegmentLabel::Frontal
    }
}

/// Outcome of a boundary analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParcelAnalysis {
    pub fence_cost: f64,
    /// Region where building is allowed, `None` when setbacks consume the parcel
    pub buildable: Option<Region>,
    pub frontal_length: f64,
    pub lateral_length: f64,
    pub total_perimeter: f64,
    /// Where the street meets the parcel
    pub access_point: Point2<f64>,
    /// The whole perimeter was treated as street frontage
    pub all_frontal: bool,
    pub rescue_applied: bool,
    /// Classified edges in perimeter order (empty in the all-frontal case)
    pub segments: Vec<BoundarySegment>,
}

impl ParcelAnalysis {
    pub fn buildable_area(&self) -> f64 {
        self.buildable.as_ref().map_or(0.0, Region::area)
    }

    pub fn frontal_segments(&self) -> impl Iterator<Item = &BoundarySegment> {
        self.segments.iter().filter(|s| s.is_frontal())
    }

    pub fn lateral_segments(&self) -> impl Iterator<Item = &BoundarySegment> {
        self.segments.iter().filter(|s| !s.is_frontal())
    }
}
