// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Earthwork volumes and terrain slope under a footprint
//!
//! Both estimators degrade to zero-valued metrics when no raster is given or
//! no valid cell falls under the footprint.

use crate::raster::ElevationSource;
use nalgebra::{Matrix2, Point2, Point3, Vector2};
use parcela_geometry::{Polygon, Region, Segment};
use serde::{Deserialize, Serialize};

/// Which cells count as lying under a footprint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleMode {
    /// Cells whose center lies inside the footprint
    CellCenter,
    /// Cells that share any point with the footprint
    #[default]
    AllTouched,
}

/// A valid raster cell under a footprint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSample {
    pub row: usize,
    pub col: usize,
    pub center: Point2<f64>,
    pub z: f64,
}

impl CellSample {
    #[inline]
    pub fn point(&self) -> Point3<f64> {
        Point3::new(self.center.x, self.center.y, self.z)
    }
}

/// Cut and fill against a platform at the mean terrain elevation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeMetrics {
    pub z_optimal: f64,
    pub cut: f64,
    pub fill: f64,
    /// `cut - fill`, positive when material is left over
    pub balance: f64,
}

/// Plane-fit slope in percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlopeMetrics {
    pub east_west_pct: f64,
    pub north_south_pct: f64,
    pub combined_pct: f64,
    /// Direction of steepest ascent, degrees counter-clockwise from east
    pub direction_deg: f64,
}

/// Valid cells under `footprint`, in row-major order
pub fn sample_footprint<S: ElevationSource + ?Sized>(
    source: &S,
    footprint: &Region,
    mode: SampleMode,
) -> Vec<CellSample> {
    let Some((min, max)) = footprint.bounds() else {
        return Vec::new();
    };
    let window = source.window(&min, &max);
    let transform = source.transform();
    let footprint_edges = footprint.edges();

    window
        .cells()
        .filter_map(|(row, col)| {
            let center = transform.cell_center(row, col);
            let inside = match mode {
                SampleMode::CellCenter => footprint.contains(&center),
                SampleMode::AllTouched => {
                    footprint.contains(&center)
                        || cell_touches(&transform.cell_corners(row, col), footprint, &footprint_edges)
                }
            };
            if !inside {
                return None;
            }
            source.value(row, col).map(|z| CellSample { row, col, center, z })
        })
        .collect()
}

fn cell_touches(corners: &[Point2<f64>; 4], footprint: &Region, edges: &[Segment]) -> bool {
    if corners.iter().any(|c| footprint.contains(c)) {
        return true;
    }
    let cell = Polygon::new(corners.to_vec());
    if footprint.rings().flatten().any(|v| cell.contains(v)) {
        return true;
    }
    cell.exterior_edges()
        .iter()
        .any(|ce| edges.iter().any(|fe| ce.intersects(fe)))
}

/// Cut and fill volumes for levelling `footprint` at the mean elevation
pub fn compute_volume_metrics<S: ElevationSource + ?Sized>(
    source: Option<&S>,
    footprint: &Region,
    mode: SampleMode,
) -> VolumeMetrics {
    let Some(source) = source else {
        tracing::warn!("no elevation raster, earthwork volumes set to zero");
        return VolumeMetrics::default();
    };

    let samples = sample_footprint(source, footprint, mode);
    if samples.is_empty() {
        tracing::warn!("no valid elevation under footprint");
        return VolumeMetrics::default();
    }

    let z_optimal = samples.iter().map(|s| s.z).sum::<f64>() / samples.len() as f64;
    let cell_area = source.transform().pixel_area();

    let (mut cut, mut fill) = (0.0, 0.0);
    for sample in &samples {
        let deviation = sample.z - z_optimal;
        if deviation > 0.0 {
            cut += deviation;
        } else {
            fill -= deviation;
        }
    }
    let (cut, fill) = (cut * cell_area, fill * cell_area);

    let metrics = VolumeMetrics {
        z_optimal,
        cut,
        fill,
        balance: cut - fill,
    };
    tracing::debug!(
        cells = samples.len(),
        z_optimal,
        cut,
        fill,
        "earthwork volumes"
    );
    metrics
}

/// Least-squares plane `z = a x + b y + c` through `points`
///
/// Fewer than three points or collinear/coincident positions give zero slope.
pub fn fit_slope(points: &[Point3<f64>]) -> SlopeMetrics {
    if points.len() < 3 {
        return SlopeMetrics::default();
    }

    // Centering removes c and keeps the normal equations well conditioned
    let n = points.len() as f64;
    let (mx, my, mz) = points.iter().fold((0.0, 0.0, 0.0), |acc, p| {
        (acc.0 + p.x / n, acc.1 + p.y / n, acc.2 + p.z / n)
    });

    let (mut sxx, mut sxy, mut syy, mut sxz, mut syz) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for p in points {
        let (dx, dy, dz) = (p.x - mx, p.y - my, p.z - mz);
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
        sxz += dx * dz;
        syz += dy * dz;
    }

    let normal = Matrix2::new(sxx, sxy, sxy, syy);
    let det = normal.determinant();
    if !det.is_finite() || det.abs() <= 1e-12 * (sxx * syy).max(f64::MIN_POSITIVE) {
        return SlopeMetrics::default();
    }
    let Some(inverse) = normal.try_inverse() else {
        return SlopeMetrics::default();
    };
    let coefficients = inverse * Vector2::new(sxz, syz);

    let east_west_pct = coefficients.x * 100.0;
    let north_south_pct = coefficients.y * 100.0;
    if !east_west_pct.is_finite() || !north_south_pct.is_finite() {
        return SlopeMetrics::default();
    }

    SlopeMetrics {
        east_west_pct,
        north_south_pct,
        combined_pct: east_west_pct.hypot(north_south_pct),
        direction_deg: north_south_pct.atan2(east_west_pct).to_degrees(),
    }
}

/// Slope of the terrain under `footprint` from cell-centre samples
pub fn slope_under_footprint<S: ElevationSource + ?Sized>(
    source: Option<&S>,
    footprint: &Region,
) -> SlopeMetrics {
    let Some(source) = source else {
        return SlopeMetrics::default();
    };
    let points: Vec<Point3<f64>> = sample_footprint(source, footprint, SampleMode::CellCenter)
        .iter()
        .map(CellSample::point)
        .collect();
    if points.len() < 3 {
        tracing::warn!(samples = points.len(), "too few samples for slope, using 0%");
    }
    fit_slope(&points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{ElevationGrid, GeoTransform};

    fn pad() -> Region {
        Region::from(Polygon::rectangle(Point2::new(2.0, 2.0), Point2::new(6.0, 6.0)))
    }

    #[test]
    fn test_cell_center_vs_all_touched() {
        // 1 m cells over [0, 10] x [0, 10]
        let grid = ElevationGrid::flat(10, 10, GeoTransform::north_up(0.0, 10.0, 1.0), 3.0).unwrap();
        let footprint = Region::from(Polygon::rectangle(Point2::new(2.2, 2.2), Point2::new(5.8, 5.8)));
        // Centers at 2.5..5.5 inside: 4 x 4
        assert_eq!(sample_footprint(&grid, &footprint, SampleMode::CellCenter).len(), 16);
        // Partially covered border cells as well: still columns 2..=5
        assert_eq!(sample_footprint(&grid, &footprint, SampleMode::AllTouched).len(), 16);

        let thin = Region::from(Polygon::rectangle(Point2::new(2.1, 2.1), Point2::new(2.4, 7.9)));
        assert!(sample_footprint(&grid, &thin, SampleMode::CellCenter).is_empty());
        assert_eq!(sample_footprint(&grid, &thin, SampleMode::AllTouched).len(), 6);
    }

    #[test]
    fn test_flat_raster_has_no_earthworks() {
        let grid = ElevationGrid::flat(10, 10, GeoTransform::north_up(0.0, 10.0, 1.0), 42.0).unwrap();
        let metrics = compute_volume_metrics(Some(&grid), &pad(), SampleMode::AllTouched);
        assert!((metrics.z_optimal - 42.0).abs() < 1e-12);
        assert_eq!(metrics.cut, 0.0);
        assert_eq!(metrics.fill, 0.0);
        assert_eq!(metrics.balance, 0.0);
    }

    #[test]
    fn test_tilted_raster_balances() {
        let grid = ElevationGrid::from_fn(10, 10, GeoTransform::north_up(0.0, 10.0, 1.0), |p| p.x)
            .unwrap();
        let metrics = compute_volume_metrics(Some(&grid), &pad(), SampleMode::CellCenter);
        // Columns at x = 2.5..5.5, mean 4.0, deviations +-0.5 and +-1.5 on 4 rows
        assert!((metrics.z_optimal - 4.0).abs() < 1e-12);
        assert!((metrics.cut - 8.0).abs() < 1e-9);
        assert!((metrics.fill - 8.0).abs() < 1e-9);
        assert!(metrics.balance.abs() < 1e-9);
    }

    #[test]
    fn test_missing_raster_is_zero() {
        let metrics = compute_volume_metrics::<ElevationGrid>(None, &pad(), SampleMode::AllTouched);
        assert_eq!(metrics, VolumeMetrics::default());
        assert_eq!(slope_under_footprint::<ElevationGrid>(None, &pad()), SlopeMetrics::default());
    }

    #[test]
    fn test_fit_slope_of_plane() {
        let points: Vec<Point3<f64>> = (0..5)
            .flat_map(|i| (0..5).map(move |j| (i as f64, j as f64)))
            .map(|(x, y)| Point3::new(x, y, 2.0 * x + 3.0 * y + 10.0))
            .collect();
        let slope = fit_slope(&points);
        assert!((slope.east_west_pct - 200.0).abs() < 1e-9);
        assert!((slope.north_south_pct - 300.0).abs() < 1e-9);
        assert!((slope.combined_pct - 200.0f64.hypot(300.0)).abs() < 1e-9);
        assert!((slope.direction_deg - 300.0f64.atan2(200.0).to_degrees()).abs() < 1e-9);
    }

    #[test]
    fn test_slope_of_plane_raster() {
        let plane = |p: Point2<f64>| 2.0 * p.x + 3.0 * p.y + 10.0;
        let grid = ElevationGrid::from_fn(10, 10, GeoTransform::north_up(0.0, 10.0, 1.0), plane)
            .unwrap();
        let slope = slope_under_footprint(Some(&grid), &pad());
        assert!((slope.east_west_pct - 200.0).abs() < 1e-9);
        assert!((slope.north_south_pct - 300.0).abs() < 1e-9);
        assert!((slope.combined_pct - 200.0f64.hypot(300.0)).abs() < 1e-9);

        // Same plane at UTM-sized coordinates
        let (x0, y0) = (440_000.0, 4_470_000.0);
        let grid =
            ElevationGrid::from_fn(10, 10, GeoTransform::north_up(x0, y0 + 10.0, 1.0), plane)
                .unwrap();
        let footprint = Region::from(Polygon::rectangle(
            Point2::new(x0 + 2.0, y0 + 2.0),
            Point2::new(x0 + 6.0, y0 + 6.0),
        ));
        let slope = slope_under_footprint(Some(&grid), &footprint);
        assert!((slope.east_west_pct - 200.0).abs() < 1e-4);
        assert!((slope.north_south_pct - 300.0).abs() < 1e-4);
    }

    #[test]
    fn test_fit_slope_degenerate_inputs() {
        let two = [Point3::new(0.0, 0.0, 1.0), Point3::new(1.0, 0.0, 2.0)];
        assert_eq!(fit_slope(&two), SlopeMetrics::default());

        let collinear = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 2.0),
            Point3::new(2.0, 2.0, 3.0),
        ];
        assert_eq!(fit_slope(&collinear), SlopeMetrics::default());
    }
}
