// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration values
//!
//! Every struct deserializes with `#[serde(default)]`, so a scenario file only
//! needs to name the values it overrides.

use crate::error::{Error, Result};
use parcela_terrain::WallSizingConfig;
use serde::{Deserialize, Serialize};

/// Boundary classification constants (metres, square metres)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Half width of the catchment rectangle around each edge
    pub segment_buffer: f64,
    /// Width of the band just outside the parcel
    pub outside_ring_width: f64,
    /// Growth applied to a zone before clipping it to the outside ring
    pub neighbor_epsilon: f64,
    /// Overlap areas must differ by more than this to decide
    pub area_tolerance: f64,
    /// Public polygons at or below this compactness are street-like
    pub street_compact_max: f64,
    /// Public polygons at or above this elongation are street-like
    pub street_aspect_min: f64,
    /// Catchments this close to the road zone boundary are frontal
    pub road_distance_max: f64,
    /// Half width given to road centrelines
    pub road_buffer: f64,
    /// Half width of the parcel boundary band used for street detection
    pub boundary_band: f64,
    /// Growth applied to the detected street zone
    pub street_expansion: f64,
    /// Edges at or below this length are ignored
    pub min_segment_length: f64,
    /// Lateral length is recomputed when the sum exceeds this share of the perimeter
    pub reconcile_ratio: f64,
    /// Frontal length below which the rescue runs
    pub rescue_min_frontal: f64,
    /// Share of the top score a segment needs to join the rescue
    pub rescue_score_ratio: f64,
    /// Buffer applied to both sides when matching edges to the rescued line
    pub rescue_touch: f64,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            segment_buffer: 0.30,
            outside_ring_width: 1.20,
            neighbor_epsilon: 0.20,
            area_tolerance: 1e-4,
            street_compact_max: 0.30,
            street_aspect_min: 2.20,
            road_distance_max: 4.0,
            road_buffer: 6.0,
            boundary_band: 0.10,
            street_expansion: 0.60,
            min_segment_length: 1e-6,
            reconcile_ratio: 0.995,
            rescue_min_frontal: 0.05,
            rescue_score_ratio: 0.50,
            rescue_touch: 1e-6,
        }
    }
}

/// Legal distances from the parcel boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetbackConfig {
    /// Distance from street-facing boundary
    pub frontal: f64,
    /// Distance from every other boundary
    pub lateral: f64,
}

impl Default for SetbackConfig {
    fn default() -> Self {
        Self {
            frontal: 5.0,
            lateral: 3.0,
        }
    }
}

/// Fencing rates per linear metre
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FenceConfig {
    pub frontal_rate: f64,
    pub lateral_rate: f64,
    /// Frontal length left open for the gate
    pub gate_width: f64,
}

impl Default for FenceConfig {
    fn default() -> Self {
        Self {
            frontal_rate: 110.0,
            lateral_rate: 60.0,
            gate_width: 4.0,
        }
    }
}

/// Step of a tiered surcharge: applies while the measured value is `<= up_to`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostTier {
    pub up_to: f64,
    pub cost: f64,
}

/// First tier whose bound covers `value`, zero beyond the last one
pub fn tier_cost(tiers: &[CostTier], value: f64) -> f64 {
    tiers
        .iter()
        .find(|tier| value <= tier.up_to)
        .map_or(0.0, |tier| tier.cost)
}

/// Fixed professional fees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub architecture: f64,
    pub structural_design: f64,
    pub geotechnical_study: f64,
    pub topographic_survey: f64,
    pub permits: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            architecture: 23450.0,
            structural_design: 2600.0,
            geotechnical_study: 700.0,
            topographic_survey: 500.0,
            permits: 1200.0,
        }
    }
}

impl FeeSchedule {
    pub fn total(&self) -> f64 {
        self.architecture
            + self.structural_design
            + self.geotechnical_study
            + self.topographic_survey
            + self.permits
    }
}

/// Unit prices of site works
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostTable {
    pub slab_per_m2: f64,
    pub cut_per_m3: f64,
    pub fill_per_m3: f64,
    /// Disposal of surplus excavated material
    pub surplus_per_m3: f64,
    pub access_gate: f64,
    pub pedestrian_paving_per_m: f64,
    pub vehicle_paving_per_m: f64,
    pub utility_connections: f64,
    pub fees: FeeSchedule,
    /// Foundation surcharge by terrain slope (%)
    pub slope_surcharge: Vec<CostTier>,
    /// Access adaptation by elevation difference between street and pad (m)
    pub vertical_access: Vec<CostTier>,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            slab_per_m2: 180.0,
            cut_per_m3: 20.50,
            fill_per_m3: 35.00,
            surplus_per_m3: 15.00,
            access_gate: 4990.0,
            pedestrian_paving_per_m: 50.0,
            vehicle_paving_per_m: 80.0,
            utility_connections: 5500.0,
            fees: FeeSchedule::default(),
            slope_surcharge: vec![
                CostTier { up_to: 5.0, cost: 0.0 },
                CostTier { up_to: 10.0, cost: 4500.0 },
                CostTier { up_to: 99.0, cost: 9000.0 },
            ],
            vertical_access: vec![
                CostTier { up_to: 0.5, cost: 0.0 },
                CostTier { up_to: 1.0, cost: 3000.0 },
                CostTier { up_to: 2.0, cost: 7500.0 },
                CostTier { up_to: 99.0, cost: 14000.0 },
            ],
        }
    }
}

/// Planning limits used to filter house models
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrbanRules {
    /// Maximum ground coverage, percent of parcel area
    pub occupancy_pct: f64,
    /// Maximum built area per unit of parcel area
    pub buildability_ratio: f64,
    pub parking_width: f64,
    pub parking_length: f64,
}

impl Default for UrbanRules {
    fn default() -> Self {
        Self {
            occupancy_pct: 30.0,
            buildability_ratio: 0.4,
            parking_width: 2.5,
            parking_length: 5.0,
        }
    }
}

impl UrbanRules {
    #[inline]
    pub fn parking_area(&self) -> f64 {
        self.parking_width * self.parking_length
    }
}

/// Mortgage defaults
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceConfig {
    /// Nominal annual rate in percent
    pub annual_rate_pct: f64,
    pub years: u32,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            annual_rate_pct: 2.5,
            years: 30,
        }
    }
}

/// Complete configuration of a siting estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitingConfig {
    pub boundary: BoundaryConfig,
    pub setbacks: SetbackConfig,
    pub fence: FenceConfig,
    pub wall: WallSizingConfig,
    pub costs: CostTable,
    pub urban: UrbanRules,
    pub finance: FinanceConfig,
    /// Margin added around the parcel bounds when querying surroundings
    pub bbox_margin: f64,
}

impl Default for SitingConfig {
    fn default() -> Self {
        Self {
            boundary: BoundaryConfig::default(),
            setbacks: SetbackConfig::default(),
            fence: FenceConfig::default(),
            wall: WallSizingConfig::default(),
            costs: CostTable::default(),
            urban: UrbanRules::default(),
            finance: FinanceConfig::default(),
            bbox_margin: 20.0,
        }
    }
}

impl SitingConfig {
    /// Reject values the algorithms cannot work with
    pub fn validate(&self) -> Result<()> {
        let b = &self.boundary;
        let non_negative = [
            ("boundary.segment_buffer", b.segment_buffer),
            ("boundary.outside_ring_width", b.outside_ring_width),
            ("boundary.neighbor_epsilon", b.neighbor_epsilon),
            ("boundary.area_tolerance", b.area_tolerance),
            ("boundary.road_distance_max", b.road_distance_max),
            ("boundary.road_buffer", b.road_buffer),
            ("boundary.boundary_band", b.boundary_band),
            ("boundary.street_expansion", b.street_expansion),
            ("boundary.rescue_touch", b.rescue_touch),
            ("setbacks.frontal", self.setbacks.frontal),
            ("setbacks.lateral", self.setbacks.lateral),
            ("fence.gate_width", self.fence.gate_width),
            ("bbox_margin", self.bbox_margin),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::config(format!("{name} must be a non-negative number, got {value}")));
            }
        }

        let positive = [
            ("boundary.segment_buffer", b.segment_buffer),
            ("boundary.outside_ring_width", b.outside_ring_width),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(Error::config(format!("{name} must be positive, got {value}")));
            }
        }

        if !(0.0..=1.0).contains(&b.reconcile_ratio) || !(0.0..=1.0).contains(&b.rescue_score_ratio) {
            return Err(Error::config("ratios must lie in [0, 1]"));
        }
        self.wall.validate()?;
        if self.wall.materials.is_empty() {
            return Err(Error::config("wall material table is empty"));
        }
        if self.finance.years == 0 {
            return Err(Error::config("finance.years must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SitingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bbox_margin, 20.0);
        assert_eq!(config.costs.fees.total(), 28450.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "setbacks": { "frontal": 6.0 }, "fence": { "lateral_rate": 75.0 } }"#;
        let config: SitingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.setbacks.frontal, 6.0);
        assert_eq!(config.setbacks.lateral, 3.0);
        assert_eq!(config.fence.lateral_rate, 75.0);
        assert_eq!(config.fence.frontal_rate, 110.0);
        assert_eq!(config.boundary.outside_ring_width, 1.20);
        assert_eq!(config.wall.materials.len(), 3);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SitingConfig::default();
        config.setbacks.lateral = -1.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = SitingConfig::default();
        config.wall.profile_spacing = 0.0;
        assert!(matches!(
            config.validate(),
            Err(Error::Terrain(parcela_terrain::Error::InvalidConfig(_)))
        ));

        let mut config = SitingConfig::default();
        config.wall.materials.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tier_lookup() {
        let tiers = CostTable::default().vertical_access;
        assert_eq!(tier_cost(&tiers, 0.0), 0.0);
        assert_eq!(tier_cost(&tiers, 0.5), 0.0);
        assert_eq!(tier_cost(&tiers, 0.75), 3000.0);
        assert_eq!(tier_cost(&tiers, 1.5), 7500.0);
        assert_eq!(tier_cost(&tiers, 50.0), 14000.0);
        assert_eq!(tier_cost(&tiers, 150.0), 0.0);
    }
}
