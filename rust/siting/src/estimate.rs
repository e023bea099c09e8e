// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end siting estimate
//!
//! [`SiteEstimator`] chains the boundary analysis, model selection, terrain
//! metrics, wall sizing and cost tables into one [`SiteEstimate`].

use crate::analyzer::BoundaryAnalyzer;
use crate::catalog::{
    construction_price, create_house_pad, default_catalog, filter_valid_models, select_model,
    ConstructionSystem, ExtraSelection, ExtrasCatalog, FinishLevel, HouseModel,
};
use crate::config::SitingConfig;
use crate::costs::{cost_breakdown, horizontal_access, vertical_access, CostBreakdown, CostInputs};
use crate::error::{Error, Result};
use crate::finance::monthly_payment;
use crate::types::{Neighbor, ParcelAnalysis};
use nalgebra::Point2;
use parcela_geometry::{Polygon, Polyline, Region};
use parcela_terrain::{
    compute_volume_metrics, slope_under_footprint, ElevationGrid, ElevationSource,
    PerimeterWallSizer, SampleMode, SlopeMetrics, VolumeMetrics, WallInput, WallResult,
};
use serde::{Deserialize, Serialize};

/// Customer choices for the house
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub bedrooms: u32,
    /// Pick a specific model, otherwise the first valid one
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub system: ConstructionSystem,
    #[serde(default)]
    pub finish: FinishLevel,
    #[serde(default)]
    pub extras: Vec<ExtraSelection>,
    #[serde(default)]
    pub soft_soil: bool,
}

impl Selection {
    pub fn bedrooms(bedrooms: u32) -> Self {
        Self {
            bedrooms,
            model_id: None,
            system: ConstructionSystem::default(),
            finish: FinishLevel::default(),
            extras: Vec::new(),
            soft_soil: false,
        }
    }
}

/// Everything known about a site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInput {
    pub parcel: Region,
    /// The parcel's own cadastral reference
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub neighbors: Vec<Neighbor>,
    /// Road centrelines
    #[serde(default)]
    pub roads: Vec<Polyline>,
    #[serde(default)]
    pub raster: Option<ElevationGrid>,
    pub selection: Selection,
}

/// Result of a siting run
#[derive(Debug, Clone, Serialize)]
pub struct SiteEstimate {
    pub analysis: ParcelAnalysis,
    pub model: HouseModel,
    pub pad: Polygon,
    pub volumes: VolumeMetrics,
    pub slope: SlopeMetrics,
    pub wall: WallResult,
    pub price_per_m2: f64,
    pub costs: CostBreakdown,
    pub financed_base: f64,
    pub monthly_payment: f64,
    /// Area around the parcel from which terrain and roads are gathered
    pub search_bbox: Option<(Point2<f64>, Point2<f64>)>,
}

/// Parcel bounds grown by `margin` on every side
pub fn search_bbox(parcel: &Region, margin: f64) -> Option<(Point2<f64>, Point2<f64>)> {
    let (min, max) = parcel.bounds()?;
    Some((
        Point2::new(min.x - margin, min.y - margin),
        Point2::new(max.x + margin, max.y + margin),
    ))
}

/// Runs complete siting estimates with one configuration
pub struct SiteEstimator {
    config: SitingConfig,
    analyzer: BoundaryAnalyzer,
    wall_sizer: PerimeterWallSizer,
    catalog: Vec<HouseModel>,
    extras: ExtrasCatalog,
}

impl SiteEstimator {
    /// Create an estimator with the standard catalogs
    pub fn new(config: SitingConfig) -> Result<Self> {
        Self::with_catalogs(config, default_catalog(), ExtrasCatalog::default())
    }

    pub fn with_catalogs(
        config: SitingConfig,
        catalog: Vec<HouseModel>,
        extras: ExtrasCatalog,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            analyzer: BoundaryAnalyzer::from_config(&config),
            wall_sizer: PerimeterWallSizer::new(config.wall.clone())?,
            config,
            catalog,
            extras,
        })
    }

    pub fn config(&self) -> &SitingConfig {
        &self.config
    }

    pub fn catalog(&self) -> &[HouseModel] {
        &self.catalog
    }

    /// Estimate using the raster carried by `input`
    pub fn estimate(&self, input: &SiteInput) -> Result<SiteEstimate> {
        self.estimate_with(input, input.raster.as_ref())
    }

    /// Estimate against any elevation source
    pub fn estimate_with<S: ElevationSource + ?Sized>(
        &self,
        input: &SiteInput,
        raster: Option<&S>,
    ) -> Result<SiteEstimate> {
        let selection = &input.selection;
        let analysis = self.analyzer.analyze(
            &input.parcel,
            input.subject_id.as_deref(),
            &input.neighbors,
            &input.roads,
        )?;

        let buildable = analysis.buildable.as_ref().ok_or(Error::NoBuildableArea)?;
        let valid = filter_valid_models(
            &self.catalog,
            selection.bedrooms,
            input.parcel.area(),
            buildable.area(),
            &self.config.urban,
        );
        let model = select_model(&valid, selection.model_id.as_deref(), selection.bedrooms)?;
        tracing::info!(model = %model.model_id, name = %model.name, "model selected");

        let pad = create_house_pad(buildable, model).ok_or(Error::NoBuildableArea)?;
        let pad_region = Region::from(pad.clone());

        let volumes = compute_volume_metrics(raster, &pad_region, SampleMode::AllTouched);
        let slope = slope_under_footprint(raster, &pad_region);
        let wall = self.wall_sizer.size(&WallInput {
            platform: &pad,
            parcel: &input.parcel,
            platform_elevation: volumes.z_optimal,
            soft_soil: selection.soft_soil,
            raster,
        });

        let table = &self.config.costs;
        let horizontal = horizontal_access(&analysis.access_point, &pad, table);
        let vertical = vertical_access(raster, &analysis.access_point, &horizontal.pad_point, table);
        let extras = self.extras.price(&selection.extras)?;
        let price_per_m2 = construction_price(selection.system, selection.finish);

        let costs = cost_breakdown(
            CostInputs {
                built_area: model.built_area,
                price_per_m2,
                footprint_area: model.footprint_area(),
                volumes: &volumes,
                wall: Some(&wall),
                slope_pct: slope.combined_pct,
                fence: analysis.fence_cost,
                horizontal_access: horizontal,
                vertical_access: vertical,
                extras,
            },
            table,
        );

        let financed_base = costs.financed_base();
        let monthly_payment = monthly_payment(financed_base, &self.config.finance);
        tracing::info!(
            total = costs.total,
            financed_base,
            monthly_payment,
            "siting estimate complete"
        );

        Ok(SiteEstimate {
            search_bbox: search_bbox(&input.parcel, self.config.bbox_margin),
            model: model.clone(),
            analysis,
            pad,
            volumes,
            slope,
            wall,
            price_per_m2,
            costs,
            financed_base,
            monthly_payment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isolated(size: f64, bedrooms: u32) -> SiteInput {
        SiteInput {
            parcel: Region::from(Polygon::rectangle(
                Point2::new(0.0, 0.0),
                Point2::new(size, size),
            )),
            subject_id: None,
            neighbors: Vec::new(),
            roads: Vec::new(),
            raster: None,
            selection: Selection::bedrooms(bedrooms),
        }
    }

    #[test]
    fn test_search_bbox_margin() {
        let parcel = Region::from(Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(10.0, 5.0)));
        let (min, max) = search_bbox(&parcel, 20.0).unwrap();
        assert_eq!(min, Point2::new(-20.0, -20.0));
        assert_eq!(max, Point2::new(30.0, 25.0));
        assert!(search_bbox(&Region::empty(), 20.0).is_none());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = SitingConfig::default();
        config.setbacks.lateral = -1.0;
        assert!(matches!(SiteEstimator::new(config), Err(Error::InvalidConfig(_))));

        let mut config = SitingConfig::default();
        config.wall.profile_spacing = 0.0;
        assert!(matches!(SiteEstimator::new(config), Err(Error::Terrain(_))));
    }

    #[test]
    fn test_small_parcel_has_no_buildable_area() {
        let estimator = SiteEstimator::new(SitingConfig::default()).unwrap();
        let result = estimator.estimate(&isolated(8.0, 1));
        assert!(matches!(result, Err(Error::NoBuildableArea)));
    }

    #[test]
    fn test_no_model_fits() {
        let estimator = SiteEstimator::new(SitingConfig::default()).unwrap();
        let result = estimator.estimate(&isolated(20.0, 5));
        assert!(matches!(result, Err(Error::NoValidModel { bedrooms: 5 })));
    }

    #[test]
    fn test_flat_site_without_raster() {
        let estimator = SiteEstimator::new(SitingConfig::default()).unwrap();
        let estimate = estimator.estimate(&isolated(30.0, 2)).unwrap();
        assert_eq!(estimate.model.model_id, "BL_2D1P_01");
        assert_eq!(estimate.volumes, VolumeMetrics::default());
        assert!(estimate.wall.profiles.is_empty());
        assert_eq!(estimate.costs.vertical_access.cost, 0.0);
        assert!(estimate.monthly_payment > 0.0);
        assert!(
            (estimate.financed_base - (estimate.costs.total - estimate.costs.fees)).abs() < 1e-9
        );
    }
}
