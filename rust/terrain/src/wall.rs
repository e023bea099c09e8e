// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Perimeter retaining wall sizing
//!
//! The platform outline is walked at a fixed spacing. At every station a
//! ray is cast along the outward normal to the parcel boundary and the
//! terrain is sampled along it; the wall at that station must retain the
//! largest drop from the platform level to natural ground. Heights set the
//! wall thickness and volume, and the total volume picks the cheapest
//! material able to reach the tallest station.

use crate::error::{Error, Result};
use crate::raster::ElevationSource;
use nalgebra::{Point2, Vector2};
use parcela_geometry::{Polygon, Region, Segment};
use serde::{Deserialize, Serialize};

/// Retaining wall construction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallMaterialKind {
    Riprap,
    ConcreteBlock,
    ReinforcedConcrete,
    /// No terrain data to size against
    Undetermined,
}

impl WallMaterialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WallMaterialKind::Riprap => "riprap",
            WallMaterialKind::ConcreteBlock => "concrete_block",
            WallMaterialKind::ReinforcedConcrete => "reinforced_concrete",
            WallMaterialKind::Undetermined => "undetermined",
        }
    }
}

impl std::fmt::Display for WallMaterialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the ranked material table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallMaterial {
    pub kind: WallMaterialKind,
    /// Cost per cubic metre
    pub unit_cost: f64,
    /// Tallest wall this material can retain (m)
    pub max_height: f64,
    /// Not buildable on soft soil
    #[serde(default)]
    pub excluded_on_soft_soil: bool,
}

impl WallMaterial {
    pub fn default_table() -> Vec<WallMaterial> {
        vec![
            WallMaterial {
                kind: WallMaterialKind::Riprap,
                unit_cost: 180.0,
                max_height: 2.5,
                excluded_on_soft_soil: true,
            },
            WallMaterial {
                kind: WallMaterialKind::ConcreteBlock,
                unit_cost: 320.0,
                max_height: 3.0,
                excluded_on_soft_soil: false,
            },
            WallMaterial {
                kind: WallMaterialKind::ReinforcedConcrete,
                unit_cost: 450.0,
                max_height: 8.0,
                excluded_on_soft_soil: false,
            },
        ]
    }
}

/// Wall sizing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallSizingConfig {
    /// Distance between profile stations along each platform edge (m)
    pub profile_spacing: f64,
    /// Length of the outward ray searching for the parcel boundary (m)
    pub ray_length: f64,
    /// Stations closer than this to the boundary need no wall (m)
    pub min_clearance: f64,
    /// Terrain sampling step along the ray (m)
    pub terrain_step: f64,
    /// Heights below this get `thin_thickness`
    pub thin_below: f64,
    /// Heights below this (and not thin) get `medium_thickness`
    pub medium_below: f64,
    pub thin_thickness: f64,
    pub medium_thickness: f64,
    pub thick_thickness: f64,
    pub materials: Vec<WallMaterial>,
}

impl Default for WallSizingConfig {
    fn default() -> Self {
        Self {
            profile_spacing: 1.0,
            ray_length: 200.0,
            min_clearance: 0.2,
            terrain_step: 1.0,
            thin_below: 1.5,
            medium_below: 3.0,
            thin_thickness: 0.30,
            medium_thickness: 0.50,
            thick_thickness: 0.70,
            materials: WallMaterial::default_table(),
        }
    }
}

impl WallSizingConfig {
    /// Reject steps and lengths that would stall or void the station walk
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("profile_spacing", self.profile_spacing),
            ("ray_length", self.ray_length),
            ("terrain_step", self.terrain_step),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::config(format!("{name} must be positive, got {value}")));
            }
        }
        if !self.min_clearance.is_finite() || self.min_clearance < 0.0 {
            return Err(Error::config(format!(
                "min_clearance must be non-negative, got {}",
                self.min_clearance
            )));
        }
        Ok(())
    }

    /// Wall thickness for a retained height, zero when no wall is needed
    pub fn thickness_for(&self, height: f64) -> f64 {
        if height <= 0.0 {
            0.0
        } else if height < self.thin_below {
            self.thin_thickness
        } else if height < self.medium_below {
            self.medium_thickness
        } else {
            self.thick_thickness
        }
    }
}

/// Wall requirement at one station of the platform outline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WallProfile {
    pub position: Point2<f64>,
    pub normal: Vector2<f64>,
    /// Distance to the parcel boundary along the normal
    pub clearance: f64,
    pub height: f64,
    pub thickness: f64,
    pub volume: f64,
}

/// Sized perimeter wall
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WallResult {
    pub material: WallMaterialKind,
    pub unit_cost: f64,
    pub total_volume: f64,
    pub total_cost: f64,
    pub max_height: f64,
    /// Stations in outline order
    pub profiles: Vec<WallProfile>,
}

impl WallResult {
    pub fn undetermined() -> Self {
        Self {
            material: WallMaterialKind::Undetermined,
            unit_cost: 0.0,
            total_volume: 0.0,
            total_cost: 0.0,
            max_height: 0.0,
            profiles: Vec::new(),
        }
    }
}

/// Inputs of a wall sizing run
pub struct WallInput<'a, S: ElevationSource + ?Sized> {
    /// Levelled platform; only its outer ring carries the wall
    pub platform: &'a Polygon,
    pub parcel: &'a Region,
    pub platform_elevation: f64,
    pub soft_soil: bool,
    pub raster: Option<&'a S>,
}

#[derive(Debug, Clone, Copy)]
struct Station {
    position: Point2<f64>,
    normal: Vector2<f64>,
}

/// Sizes perimeter walls against a terrain raster
pub struct PerimeterWallSizer {
    config: WallSizingConfig,
}

impl Default for PerimeterWallSizer {
    fn default() -> Self {
        Self {
            config: WallSizingConfig::default(),
        }
    }
}

impl PerimeterWallSizer {
    pub fn new(config: WallSizingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WallSizingConfig {
        &self.config
    }

    /// Size the wall around `input.platform`
    pub fn size<S: ElevationSource + ?Sized>(&self, input: &WallInput<'_, S>) -> WallResult {
        #[cfg(not(target_arch = "wasm32"))]
        use rayon::prelude::*;

        let Some(raster) = input.raster else {
            tracing::warn!("no elevation raster, wall material undetermined");
            return WallResult::undetermined();
        };

        let stations = self.stations(input.platform);
        let boundary = input.parcel.edges();

        // Native: one task per station. WASM: sequential.
        #[cfg(not(target_arch = "wasm32"))]
        let profiles: Vec<Option<WallProfile>> = stations
            .par_iter()
            .map(|station| self.profile_at(station, &boundary, input.platform_elevation, raster))
            .collect();

        #[cfg(target_arch = "wasm32")]
        let profiles: Vec<Option<WallProfile>> = stations
            .iter()
            .map(|station| self.profile_at(station, &boundary, input.platform_elevation, raster))
            .collect();

        let profiles: Vec<WallProfile> = profiles.into_iter().flatten().collect();
        let total_volume: f64 = profiles.iter().map(|p| p.volume).sum();
        let max_height = profiles.iter().map(|p| p.height).fold(0.0, f64::max);

        let Some(material) =
            select_material(&self.config.materials, max_height, total_volume, input.soft_soil)
        else {
            tracing::warn!("empty wall material table");
            return WallResult {
                total_volume,
                max_height,
                profiles,
                ..WallResult::undetermined()
            };
        };

        let total_cost = total_volume * material.unit_cost;
        tracing::info!(
            material = %material.kind,
            stations = profiles.len(),
            max_height,
            total_volume,
            total_cost,
            "perimeter wall sized"
        );

        WallResult {
            material: material.kind,
            unit_cost: material.unit_cost,
            total_volume,
            total_cost,
            max_height,
            profiles,
        }
    }

    /// Profile stations along the outer ring, in ring order
    ///
    /// Each edge is split into `ceil(len / spacing)` steps and sampled at both
    /// ends, so shared vertices appear once per adjacent edge.
    fn stations(&self, platform: &Polygon) -> Vec<Station> {
        let sign = if platform.is_ccw() { 1.0 } else { -1.0 };
        let spacing = self.config.profile_spacing;
        let mut stations = Vec::new();

        for edge in platform.exterior_edges() {
            let Ok(direction) = edge.direction() else {
                continue;
            };
            // Right-hand normal of a counter-clockwise ring points outward
            let normal = Vector2::new(direction.y, -direction.x) * sign;
            let steps = ((edge.length() / spacing).ceil() as usize).max(1);
            for k in 0..=steps {
                let t = (k as f64 / steps as f64).min(1.0);
                stations.push(Station {
                    position: edge.point_at(t),
                    normal,
                });
            }
        }
        stations
    }

    fn profile_at<S: ElevationSource + ?Sized>(
        &self,
        station: &Station,
        boundary: &[Segment],
        platform_elevation: f64,
        raster: &S,
    ) -> Option<WallProfile> {
        let ray = Segment::new(
            station.position,
            station.position + station.normal * self.config.ray_length,
        );
        let t_min = boundary
            .iter()
            .flat_map(|edge| ray.intersection_params(edge))
            .fold(f64::INFINITY, f64::min);
        if !t_min.is_finite() {
            return None;
        }
        let clearance = t_min * self.config.ray_length;

        let height = if clearance < self.config.min_clearance {
            0.0
        } else {
            let step = self.config.terrain_step;
            let samples = ((clearance / step).ceil() as usize).max(1);
            (1..=samples)
                .filter_map(|s| raster.sample(&(station.position + station.normal * (s as f64 * step))))
                .map(|z| (platform_elevation - z).max(0.0))
                .fold(0.0, f64::max)
        };

        let thickness = self.config.thickness_for(height);
        Some(WallProfile {
            position: station.position,
            normal: station.normal,
            clearance,
            height,
            thickness,
            volume: height * thickness * self.config.profile_spacing,
        })
    }
}

/// Cheapest material able to retain `max_height`
///
/// Soft soil removes materials flagged for it. When nothing qualifies the
/// tallest-reaching soil-compatible material is used, then the tallest of the
/// whole table. `None` only for an empty table.
pub fn select_material(
    materials: &[WallMaterial],
    max_height: f64,
    total_volume: f64,
    soft_soil: bool,
) -> Option<WallMaterial> {
    let eligible: Vec<&WallMaterial> = materials
        .iter()
        .filter(|m| !(soft_soil && m.excluded_on_soft_soil))
        .collect();

    let mut best: Option<(&WallMaterial, f64)> = None;
    for material in eligible.iter().filter(|m| m.max_height >= max_height) {
        let cost = total_volume * material.unit_cost;
        if best.map_or(true, |(_, c)| cost < c) {
            best = Some((*material, cost));
        }
    }
    if let Some((material, _)) = best {
        return Some(*material);
    }

    tracing::warn!(max_height, "no wall material reaches the required height");
    tallest(eligible.into_iter()).or_else(|| tallest(materials.iter())).copied()
}

fn tallest<'a>(materials: impl Iterator<Item = &'a WallMaterial>) -> Option<&'a WallMaterial> {
    materials.fold(None, |best: Option<&WallMaterial>, m| match best {
        Some(b) if b.max_height >= m.max_height => Some(b),
        _ => Some(m),
    })
}

/// Size a wall with the default configuration
pub fn size_perimeter_wall<S: ElevationSource + ?Sized>(input: &WallInput<'_, S>) -> WallResult {
    PerimeterWallSizer::default().size(input)
}
