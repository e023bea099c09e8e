// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cost lines of a siting estimate

use crate::catalog::PricedExtra;
use crate::config::{tier_cost, CostTable};
use nalgebra::Point2;
use parcela_geometry::Polygon;
use parcela_terrain::{ElevationSource, VolumeMetrics, WallResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EarthworksCost {
    pub cut: f64,
    pub fill: f64,
    /// Disposal of the excavated surplus
    pub surplus: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ContainmentCost {
    pub wall: f64,
    pub slope_surcharge: f64,
    pub total: f64,
}

/// Paths from the street access to the house
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HorizontalAccess {
    pub distance: f64,
    pub pedestrian: f64,
    pub vehicle: f64,
    /// Where the paths meet the pad
    pub pad_point: Point2<f64>,
}

impl HorizontalAccess {
    pub fn total(&self) -> f64 {
        self.pedestrian + self.vehicle
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VerticalAccess {
    /// Height difference between street access and pad
    pub delta_z: f64,
    pub cost: f64,
}

/// Every cost line of an estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub construction: f64,
    pub slab: f64,
    pub earthworks: EarthworksCost,
    pub containment: ContainmentCost,
    pub fence: f64,
    pub access_gate: f64,
    pub horizontal_access: HorizontalAccess,
    pub vertical_access: VerticalAccess,
    pub utility_connections: f64,
    pub fees: f64,
    pub extras: Vec<PricedExtra>,
    pub total: f64,
}

impl CostBreakdown {
    pub fn extras_total(&self) -> f64 {
        self.extras.iter().map(|e| e.cost).sum()
    }

    /// Amount eligible for a mortgage (fees are paid upfront)
    pub fn financed_base(&self) -> f64 {
        (self.total - self.fees).max(0.0)
    }

    fn sum(&self) -> f64 {
        self.construction
            + self.slab
            + self.earthworks.total
            + self.containment.total
            + self.fence
            + self.access_gate
            + self.horizontal_access.total()
            + self.vertical_access.cost
            + self.utility_connections
            + self.fees
            + self.extras_total()
    }
}

pub fn construction_cost(built_area: f64, price_per_m2: f64) -> f64 {
    built_area * price_per_m2
}

pub fn slab_cost(footprint_area: f64, table: &CostTable) -> f64 {
    footprint_area * table.slab_per_m2
}

pub fn earthworks_cost(volumes: &VolumeMetrics, table: &CostTable) -> EarthworksCost {
    let cut = volumes.cut * table.cut_per_m3;
    let fill = volumes.fill * table.fill_per_m3;
    let surplus = volumes.balance.max(0.0) * table.surplus_per_m3;
    EarthworksCost {
        cut,
        fill,
        surplus,
        total: cut + fill + surplus,
    }
}

/// Wall cost plus the foundation surcharge for the terrain slope
pub fn containment_cost(wall: Option<&WallResult>, slope_pct: f64, table: &CostTable) -> ContainmentCost {
    let wall = wall.map_or(0.0, |w| w.total_cost);
    let slope_surcharge = tier_cost(&table.slope_surcharge, slope_pct);
    ContainmentCost {
        wall,
        slope_surcharge,
        total: wall + slope_surcharge,
    }
}

/// Paving from the access point to the nearest point of the pad
pub fn horizontal_access(access: &Point2<f64>, pad: &Polygon, table: &CostTable) -> HorizontalAccess {
    let pad_point = pad.nearest_point(access);
    let distance = (pad_point - *access).norm();
    HorizontalAccess {
        distance,
        pedestrian: distance * table.pedestrian_paving_per_m,
        vehicle: distance * table.vehicle_paving_per_m,
        pad_point,
    }
}

/// Level adaptation between the street access and the pad
///
/// Zero without a raster or when either point has no elevation.
pub fn vertical_access<S: ElevationSource + ?Sized>(
    raster: Option<&S>,
    access: &Point2<f64>,
    pad_point: &Point2<f64>,
    table: &CostTable,
) -> VerticalAccess {
    let Some(raster) = raster else {
        return VerticalAccess::default();
    };
    let (Some(z_street), Some(z_pad)) = (raster.sample(access), raster.sample(pad_point)) else {
        tracing::warn!("no elevation at access or pad, vertical access set to zero");
        return VerticalAccess::default();
    };
    let delta_z = (z_pad - z_street).abs();
    VerticalAccess {
        delta_z,
        cost: tier_cost(&table.vertical_access, delta_z),
    }
}

/// Inputs for assembling a [`CostBreakdown`]
pub struct CostInputs<'a> {
    pub built_area: f64,
    pub price_per_m2: f64,
    pub footprint_area: f64,
    pub volumes: &'a VolumeMetrics,
    pub wall: Option<&'a WallResult>,
    pub slope_pct: f64,
    pub fence: f64,
    pub horizontal_access: HorizontalAccess,
    pub vertical_access: VerticalAccess,
    pub extras: Vec<PricedExtra>,
}

pub fn cost_breakdown(inputs: CostInputs<'_>, table: &CostTable) -> CostBreakdown {
    let mut breakdown = CostBreakdown {
        construction: construction_cost(inputs.built_area, inputs.price_per_m2),
        slab: slab_cost(inputs.footprint_area, table),
        earthworks: earthworks_cost(inputs.volumes, table),
        containment: containment_cost(inputs.wall, inputs.slope_pct, table),
        fence: inputs.fence,
        access_gate: table.access_gate,
        horizontal_access: inputs.horizontal_access,
        vertical_access: inputs.vertical_access,
        utility_connections: table.utility_connections,
        fees: table.fees.total(),
        extras: inputs.extras,
        total: 0.0,
    };
    breakdown.total = breakdown.sum();
    breakdown
}
