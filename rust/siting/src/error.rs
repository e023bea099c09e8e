// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for siting operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the analyzer and estimator
#[derive(Error, Debug)]
pub enum Error {
    #[error("Geometry error: {0}")]
    Geometry(#[from] parcela_geometry::Error),

    #[error("Terrain error: {0}")]
    Terrain(#[from] parcela_terrain::Error),

    #[error("Parcel has no area")]
    EmptyParcel,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No buildable area left after setbacks")]
    NoBuildableArea,

    #[error("No catalog model with {bedrooms} bedrooms fits the parcel")]
    NoValidModel { bedrooms: u32 },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown extra: {0}")]
    UnknownExtra(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
