// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! House models, construction prices and extras
//!
//! The catalog is plain data. [`filter_valid_models`] applies the planning
//! limits of a parcel and [`create_house_pad`] places a model footprint on the
//! buildable envelope.

use crate::config::UrbanRules;
use crate::error::{Error, Result};
use nalgebra::Point2;
use parcela_geometry::{Polygon, Region};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A standard house design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseModel {
    pub model_id: String,
    pub name: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub floors: u32,
    /// Gross floor area over all floors (m²)
    pub built_area: f64,
    /// Footprint extent along x (m)
    pub footprint_width: f64,
    /// Footprint extent along y (m)
    pub footprint_length: f64,
    pub mockup_ref: String,
}

impl HouseModel {
    #[allow(clippy::too_many_arguments)]
    fn new(
        model_id: &str,
        name: &str,
        bedrooms: u32,
        bathrooms: u32,
        floors: u32,
        built_area: f64,
        footprint_width: f64,
        footprint_length: f64,
    ) -> Self {
        Self {
            model_id: model_id.to_string(),
            name: name.to_string(),
            bedrooms,
            bathrooms,
            floors,
            built_area,
            footprint_width,
            footprint_length,
            mockup_ref: model_id.replacen("BL_", "MAQ_", 1),
        }
    }

    /// Footprint area rounded to cm² precision
    pub fn footprint_area(&self) -> f64 {
        (self.footprint_width * self.footprint_length * 100.0).round() / 100.0
    }
}

/// The six standard models
pub fn default_catalog() -> Vec<HouseModel> {
    vec![
        HouseModel::new("BL_1D1P_01", "1D Lineal 45", 1, 1, 1, 45.0, 7.5, 6.0),
        HouseModel::new("BL_2D1P_01", "2D Compacto 70", 2, 1, 1, 70.0, 9.0, 7.8),
        HouseModel::new("BL_3D1P_01", "3D Lineal 100", 3, 2, 1, 100.0, 12.0, 8.5),
        HouseModel::new("BL_3D2P_01", "3D Duplex 118", 3, 3, 2, 118.0, 8.6, 7.0),
        HouseModel::new("BL_4D1P_01", "4D Lineal 130", 4, 3, 1, 130.0, 15.0, 9.0),
        HouseModel::new("BL_5D2P_01", "5D Duplex 190", 5, 4, 2, 190.0, 11.0, 9.0),
    ]
}

/// Models with `bedrooms` that respect the planning limits of the parcel
///
/// A model passes when its built area stays within the buildability ratio,
/// and its footprint plus one parking space fits both the occupancy limit
/// and the buildable envelope.
pub fn filter_valid_models<'a>(
    catalog: &'a [HouseModel],
    bedrooms: u32,
    parcel_area: f64,
    buildable_area: f64,
    rules: &UrbanRules,
) -> Vec<&'a HouseModel> {
    let max_built = parcel_area * rules.buildability_ratio;
    let max_occupied = parcel_area * rules.occupancy_pct / 100.0;
    let parking = rules.parking_area();

    let valid: Vec<&HouseModel> = catalog
        .iter()
        .filter(|m| m.bedrooms == bedrooms)
        .filter(|m| {
            let required = m.footprint_area() + parking;
            m.built_area <= max_built && required <= max_occupied && required <= buildable_area
        })
        .collect();

    tracing::debug!(
        bedrooms,
        parcel_area,
        buildable_area,
        max_built,
        max_occupied,
        valid = valid.len(),
        "models filtered"
    );
    valid
}

/// Pick `model_id` among the valid models, or the first one
pub fn select_model<'a>(
    valid: &[&'a HouseModel],
    model_id: Option<&str>,
    bedrooms: u32,
) -> Result<&'a HouseModel> {
    match model_id {
        Some(id) => valid
            .iter()
            .copied()
            .find(|m| m.model_id == id)
            .ok_or_else(|| Error::UnknownModel(id.to_string())),
        None => valid
            .first()
            .copied()
            .ok_or(Error::NoValidModel { bedrooms }),
    }
}

/// Model footprint centred on the area centroid of the envelope
pub fn create_house_pad(buildable: &Region, model: &HouseModel) -> Option<Polygon> {
    let center: Point2<f64> = buildable.centroid()?;
    Some(Polygon::centered_rectangle(
        center,
        model.footprint_width,
        model.footprint_length,
    ))
}

/// Structural system of the house
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionSystem {
    #[default]
    SteelFrame,
    Timber,
    Concrete,
}

impl fmt::Display for ConstructionSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SteelFrame => "steel_frame",
            Self::Timber => "timber",
            Self::Concrete => "concrete",
        })
    }
}

/// Finish quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishLevel {
    #[default]
    Essential,
    Premium,
    Excellence,
}

impl fmt::Display for FinishLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Essential => "essential",
            Self::Premium => "premium",
            Self::Excellence => "excellence",
        })
    }
}

/// Construction price per m² of built area
pub fn construction_price(system: ConstructionSystem, finish: FinishLevel) -> f64 {
    use ConstructionSystem::*;
    use FinishLevel::*;

    match (system, finish) {
        (SteelFrame, Essential) => 1340.0,
        (SteelFrame, Premium) => 1530.0,
        (SteelFrame, Excellence) => 1750.0,
        (Timber, Essential) => 1450.0,
        (Timber, Premium) => 1600.0,
        (Timber, Excellence) => 1750.0,
        (Concrete, Essential) => 1650.0,
        (Concrete, Premium) => 1700.0,
        (Concrete, Excellence) => 1850.0,
    }
}

/// How an extra is charged
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtraPricing {
    Fixed { price: f64 },
    PerUnit { unit_price: f64 },
}

/// Optional item added to the estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extra {
    pub id: String,
    pub label: String,
    pub pricing: ExtraPricing,
    /// At most one extra per group is charged
    #[serde(default)]
    pub group: Option<String>,
}

/// An extra requested by the customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraSelection {
    pub id: String,
    /// Units for per-unit extras, ignored otherwise
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl ExtraSelection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            quantity: 1,
        }
    }

    pub fn units(id: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: id.into(),
            quantity,
        }
    }
}

/// A charged extra line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedExtra {
    pub id: String,
    pub label: String,
    pub cost: f64,
}

/// Extras indexed by identifier, in presentation order
#[derive(Debug, Clone)]
pub struct ExtrasCatalog {
    items: Vec<Extra>,
    index: FxHashMap<String, usize>,
}

impl ExtrasCatalog {
    pub fn new(items: Vec<Extra>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(i, extra)| (extra.id.clone(), i))
            .collect();
        Self { items, index }
    }

    pub fn items(&self) -> &[Extra] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Extra> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    /// Price a selection in request order
    ///
    /// A second extra from an already charged group is skipped. Unknown
    /// identifiers are an error.
    pub fn price(&self, selection: &[ExtraSelection]) -> Result<Vec<PricedExtra>> {
        let mut seen_groups: FxHashSet<&str> = FxHashSet::default();
        let mut priced = Vec::with_capacity(selection.len());

        for requested in selection {
            let extra = self
                .get(&requested.id)
                .ok_or_else(|| Error::UnknownExtra(requested.id.clone()))?;

            if let Some(group) = extra.group.as_deref() {
                if !seen_groups.insert(group) {
                    tracing::warn!(id = %extra.id, group, "extra group already charged, skipping");
                    continue;
                }
            }

            let (label, cost) = match extra.pricing {
                ExtraPricing::Fixed { price } => (extra.label.clone(), price),
                ExtraPricing::PerUnit { unit_price } => (
                    format!("{} x {}", extra.label, requested.quantity),
                    unit_price * f64::from(requested.quantity),
                ),
            };
            priced.push(PricedExtra {
                id: extra.id.clone(),
                label,
                cost,
            });
        }

        Ok(priced)
    }
}

impl Default for ExtrasCatalog {
    fn default() -> Self {
        let fixed = |id: &str, label: &str, price: f64, group: Option<&str>| Extra {
            id: id.to_string(),
            label: label.to_string(),
            pricing: ExtraPricing::Fixed { price },
            group: group.map(str::to_string),
        };

        Self::new(vec![
            fixed("pool_6x3", "Pool 6x3 m (chlorinated)", 21000.0, Some("pool")),
            fixed("pool_8x4", "Pool 8x4 m (chlorinated)", 32000.0, Some("pool")),
            fixed("pergola_2c", "Pergola for 2 cars", 4500.0, None),
            fixed("porch_20m2", "Porch 20 m²", 7800.0, None),
            fixed("pv_3kw", "Photovoltaic panels 3 kW", 5700.0, None),
            fixed("pv_5kw", "Photovoltaic panels 5 kW", 8900.0, None),
            fixed("ev_charger", "Electric vehicle charging point", 1200.0, None),
            fixed("home_automation_basic", "Basic home automation", 1500.0, None),
            Extra {
                id: "trees".to_string(),
                label: "Ornamental trees (unit)".to_string(),
                pricing: ExtraPricing::PerUnit { unit_price: 180.0 },
                group: None,
            },
        ])
    }
}
