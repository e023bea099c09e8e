// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for terrain operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building elevation sources
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    #[error("Invalid wall sizing configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn raster(msg: impl Into<String>) -> Self {
        Self::InvalidRaster(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
