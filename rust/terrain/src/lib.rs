// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parcela Terrain
//!
//! Terrain reasoning over an elevation raster:
//!
//! - [`raster`]: affine pixel transform, nodata handling and the
//!   [`ElevationSource`] sampling trait
//! - [`metrics`]: cut/fill volumes and plane-fit slope under a footprint
//! - [`wall`]: perimeter retaining wall heights and material choice
//!
//! Every estimator accepts an optional raster and returns zero-valued results
//! when it is missing.

pub mod error;
pub mod metrics;
pub mod raster;
pub mod wall;

pub use error::{Error, Result};
pub use metrics::{
    compute_volume_metrics, fit_slope, sample_footprint, slope_under_footprint, CellSample,
    SampleMode, SlopeMetrics, VolumeMetrics,
};
pub use raster::{CellWindow, ElevationGrid, ElevationSource, GeoTransform};
pub use wall::{
    select_material, size_perimeter_wall, PerimeterWallSizer, WallInput, WallMaterial,
    WallMaterialKind, WallProfile, WallResult, WallSizingConfig,
};
