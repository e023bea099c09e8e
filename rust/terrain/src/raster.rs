// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Elevation raster access
//!
//! A raster is a row-major grid of z-values placed in the plane by a GDAL
//! style six-coefficient affine transform. Row 0 is the first row of the
//! grid (the northern edge for a north-up raster with negative pixel height).
//!
//! Sampling goes through [`ElevationSource`] so callers can back it with an
//! in-memory [`ElevationGrid`] or with their own tiled storage.

use crate::error::{Error, Result};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Affine pixel-to-world transform
///
/// `x = origin_x + col * pixel_width + row * row_rotation`
/// `y = origin_y + col * column_rotation + row * pixel_height`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    #[serde(default)]
    pub row_rotation: f64,
    pub origin_y: f64,
    #[serde(default)]
    pub column_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform with square pixels of `cell_size`
    ///
    /// `(origin_x, origin_y)` is the top-left corner of the grid.
    pub fn north_up(origin_x: f64, origin_y: f64, cell_size: f64) -> Self {
        Self {
            origin_x,
            pixel_width: cell_size,
            row_rotation: 0.0,
            origin_y,
            column_rotation: 0.0,
            pixel_height: -cell_size,
        }
    }

    /// From the GDAL coefficient order `[x0, dx, rx, y0, ry, dy]`
    pub fn from_gdal(coefficients: [f64; 6]) -> Self {
        Self {
            origin_x: coefficients[0],
            pixel_width: coefficients[1],
            row_rotation: coefficients[2],
            origin_y: coefficients[3],
            column_rotation: coefficients[4],
            pixel_height: coefficients[5],
        }
    }

    #[inline]
    fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.row_rotation * self.column_rotation
    }

    /// World position of fractional pixel coordinates
    #[inline]
    pub fn pixel_to_world(&self, col: f64, row: f64) -> Point2<f64> {
        Point2::new(
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.column_rotation + row * self.pixel_height,
        )
    }

    /// Fractional `(col, row)` of a world position, `None` for a singular transform
    pub fn world_to_pixel(&self, point: &Point2<f64>) -> Option<(f64, f64)> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON {
            return None;
        }
        let dx = point.x - self.origin_x;
        let dy = point.y - self.origin_y;
        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (self.pixel_width * dy - self.column_rotation * dx) / det;
        Some((col, row))
    }

    /// Center of cell `(row, col)`
    #[inline]
    pub fn cell_center(&self, row: usize, col: usize) -> Point2<f64> {
        self.pixel_to_world(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Corners of cell `(row, col)` in pixel order
    pub fn cell_corners(&self, row: usize, col: usize) -> [Point2<f64>; 4] {
        let (c, r) = (col as f64, row as f64);
        [
            self.pixel_to_world(c, r),
            self.pixel_to_world(c + 1.0, r),
            self.pixel_to_world(c + 1.0, r + 1.0),
            self.pixel_to_world(c, r + 1.0),
        ]
    }

    /// Ground area covered by one cell
    #[inline]
    pub fn pixel_area(&self) -> f64 {
        self.determinant().abs()
    }
}

/// Inclusive-exclusive cell ranges of a raster window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl CellWindow {
    pub fn is_empty(&self) -> bool {
        self.row_start >= self.row_end || self.col_start >= self.col_end
    }

    pub fn cell_count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.row_end - self.row_start) * (self.col_end - self.col_start)
        }
    }

    /// Iterate `(row, col)` pairs in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.row_start..self.row_end)
            .flat_map(move |row| (self.col_start..self.col_end).map(move |col| (row, col)))
    }
}

/// Read-only access to an elevation raster
pub trait ElevationSource: Sync {
    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    fn transform(&self) -> &GeoTransform;

    /// Sentinel marking cells without data
    fn nodata(&self) -> Option<f64>;

    /// Stored value of an in-grid cell, nodata included
    fn raw_value(&self, row: usize, col: usize) -> f64;

    /// Valid elevation of a cell, `None` when out of grid or nodata
    fn value(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        let z = self.raw_value(row, col);
        if !z.is_finite() || self.nodata().is_some_and(|nodata| z == nodata) {
            return None;
        }
        Some(z)
    }

    /// Cell containing a world position
    fn index(&self, point: &Point2<f64>) -> Option<(usize, usize)> {
        let (col, row) = self.transform().world_to_pixel(point)?;
        let (col, row) = (col.floor(), row.floor());
        if col < 0.0 || row < 0.0 || col >= self.cols() as f64 || row >= self.rows() as f64 {
            return None;
        }
        Some((row as usize, col as usize))
    }

    /// Elevation of the cell containing `point`
    fn sample(&self, point: &Point2<f64>) -> Option<f64> {
        let (row, col) = self.index(point)?;
        self.value(row, col)
    }

    /// Cells whose extent may intersect the world-space box `(min, max)`
    fn window(&self, min: &Point2<f64>, max: &Point2<f64>) -> CellWindow {
        let transform = self.transform();
        let corners = [
            Point2::new(min.x, min.y),
            Point2::new(max.x, min.y),
            Point2::new(max.x, max.y),
            Point2::new(min.x, max.y),
        ];

        let mut col_range = (f64::INFINITY, f64::NEG_INFINITY);
        let mut row_range = (f64::INFINITY, f64::NEG_INFINITY);
        for corner in &corners {
            let Some((col, row)) = transform.world_to_pixel(corner) else {
                return CellWindow { row_start: 0, row_end: 0, col_start: 0, col_end: 0 };
            };
            col_range = (col_range.0.min(col), col_range.1.max(col));
            row_range = (row_range.0.min(row), row_range.1.max(row));
        }

        // Cells whose edge lies on the box boundary are included
        let clamp = |v: f64, limit: usize| v.max(0.0).min(limit as f64) as usize;
        CellWindow {
            row_start: clamp(row_range.0.ceil() - 1.0, self.rows()),
            row_end: clamp(row_range.1.floor() + 1.0, self.rows()),
            col_start: clamp(col_range.0.ceil() - 1.0, self.cols()),
            col_end: clamp(col_range.1.floor() + 1.0, self.cols()),
        }
    }
}

/// In-memory row-major elevation grid
///
/// Deserialization goes through [`ElevationGrid::new`], so a decoded grid
/// always has `rows * cols` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridDocument")]
pub struct ElevationGrid {
    rows: usize,
    cols: usize,
    transform: GeoTransform,
    #[serde(default)]
    nodata: Option<f64>,
    data: Vec<f64>,
}

/// Wire form of [`ElevationGrid`] before validation
#[derive(Deserialize)]
struct GridDocument {
    rows: usize,
    cols: usize,
    transform: GeoTransform,
    #[serde(default)]
    nodata: Option<f64>,
    data: Vec<f64>,
}

impl TryFrom<GridDocument> for ElevationGrid {
    type Error = Error;

    fn try_from(doc: GridDocument) -> Result<Self> {
        Self::new(doc.rows, doc.cols, doc.transform, doc.nodata, doc.data)
    }
}

impl ElevationGrid {
    /// Build a grid, checking the data length and pixel geometry
    pub fn new(
        rows: usize,
        cols: usize,
        transform: GeoTransform,
        nodata: Option<f64>,
        data: Vec<f64>,
    ) -> Result<Self> {
        let grid = Self {
            rows,
            cols,
            transform,
            nodata,
            data,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Grid filled by evaluating `f` at every cell center
    pub fn from_fn(
        rows: usize,
        cols: usize,
        transform: GeoTransform,
        f: impl Fn(Point2<f64>) -> f64,
    ) -> Result<Self> {
        let mut data = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                data.push(f(transform.cell_center(row, col)));
            }
        }
        Self::new(rows, cols, transform, None, data)
    }

    /// Constant-elevation grid
    pub fn flat(rows: usize, cols: usize, transform: GeoTransform, z: f64) -> Result<Self> {
        Self::new(rows, cols, transform, None, vec![z; rows * cols])
    }

    /// Check the data length and pixel geometry
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::raster(format!(
                "grid has no cells ({} x {})",
                self.rows, self.cols
            )));
        }
        if self.data.len() != self.rows * self.cols {
            return Err(Error::raster(format!(
                "expected {} values for a {} x {} grid, got {}",
                self.rows * self.cols,
                self.rows,
                self.cols,
                self.data.len()
            )));
        }
        if self.transform.pixel_area() <= f64::EPSILON {
            return Err(Error::raster("pixel size is zero"));
        }
        Ok(())
    }

    /// Overwrite one cell
    pub fn set(&mut self, row: usize, col: usize, z: f64) {
        if row < self.rows && col < self.cols {
            self.data[row * self.cols + col] = z;
        }
    }
}

impl ElevationSource for ElevationGrid {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    #[inline]
    fn raw_value(&self, row: usize, col: usize) -> f64 {
        self.data
            .get(row * self.cols + col)
            .copied()
            .unwrap_or(f64::NAN)
    }
}
