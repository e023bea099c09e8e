// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parcela Siting
//!
//! Parcel boundary reasoning and siting cost estimation.
//!
//! ## Overview
//!
//! - [`BoundaryAnalyzer`] groups the neighbors, detects the street, labels
//!   every perimeter edge frontal or lateral and derives the buildable
//!   envelope and fence cost
//! - [`SiteEstimator`] places a catalog house on the envelope and prices the
//!   project against an optional elevation raster
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parcela_siting::{BoundaryAnalyzer, Neighbor};
//! use parcela_geometry::{Point2, Polygon, Region};
//!
//! let parcel = Region::from(Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(20.0, 20.0)));
//! let neighbors = vec![
//!     Neighbor::private("EAST", Polygon::rectangle(Point2::new(20.0, 0.0), Point2::new(40.0, 20.0))),
//!     Neighbor::public(Polygon::rectangle(Point2::new(-20.0, -8.0), Point2::new(40.0, 0.0))),
//! ];
//!
//! let analysis = BoundaryAnalyzer::default().analyze(&parcel, Some("SELF"), &neighbors, &[])?;
//! println!("frontal {:.2} m, fence {:.2}", analysis.frontal_length, analysis.fence_cost);
//! # Ok::<(), parcela_siting::Error>(())
//! ```

pub mod analyzer;
pub mod catalog;
pub mod config;
pub mod costs;
pub mod envelope;
pub mod error;
pub mod estimate;
pub mod finance;
pub mod neighbors;
pub mod segments;
pub mod types;

pub use analyzer::BoundaryAnalyzer;
pub use catalog::{
    construction_price, create_house_pad, default_catalog, filter_valid_models, select_model,
    ConstructionSystem, Extra, ExtraPricing, ExtraSelection, ExtrasCatalog, FinishLevel,
    HouseModel, PricedExtra,
};
pub use config::{
    tier_cost, BoundaryConfig, CostTable, CostTier, FeeSchedule, FenceConfig, FinanceConfig,
    SetbackConfig, SitingConfig, UrbanRules,
};
pub use costs::{
    ContainmentCost, CostBreakdown, EarthworksCost, HorizontalAccess, VerticalAccess,
};
pub use envelope::{all_frontal_envelope, buildable_envelope};
pub use error::{Error, Result};
pub use estimate::{search_bbox, Selection, SiteEstimate, SiteEstimator, SiteInput};
pub use finance::monthly_payment;
pub use neighbors::{classify_neighbors, detect_street_zone, NeighborGroups};
pub use segments::{NearZones, SegmentClassifier};
pub use types::{BoundarySegment, Neighbor, ParcelAnalysis, SegmentLabel};
