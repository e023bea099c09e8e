// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use parcela_geometry::{Point2, Polygon, Region};
use parcela_terrain::{
    compute_volume_metrics, slope_under_footprint, ElevationGrid, GeoTransform, PerimeterWallSizer,
    SampleMode, WallInput, WallMaterialKind, WallSizingConfig,
};

/// 40 x 40 m parcel on 1 m cells rising 5% to the north
fn hillside() -> ElevationGrid {
    ElevationGrid::from_fn(40, 40, GeoTransform::north_up(0.0, 40.0, 1.0), |p| p.y / 20.0).unwrap()
}

fn parcel() -> Region {
    Region::from(Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(40.0, 40.0)))
}

fn pad() -> Polygon {
    Polygon::rectangle(Point2::new(15.0, 15.0), Point2::new(25.0, 25.0))
}

#[test]
fn test_hillside_volumes_and_slope() {
    let grid = hillside();
    let footprint = Region::from(pad());

    let volumes = compute_volume_metrics(Some(&grid), &footprint, SampleMode::AllTouched);
    assert_abs_diff_eq!(volumes.z_optimal, 1.0, epsilon = 1e-9);
    assert!(volumes.cut > 0.0);
    assert_abs_diff_eq!(volumes.cut, volumes.fill, epsilon = 1e-9);
    assert_abs_diff_eq!(volumes.balance, 0.0, epsilon = 1e-9);

    let slope = slope_under_footprint(Some(&grid), &footprint);
    assert_abs_diff_eq!(slope.east_west_pct, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(slope.north_south_pct, 5.0, epsilon = 1e-9);
    assert_abs_diff_eq!(slope.direction_deg, 90.0, epsilon = 1e-9);
}

#[test]
fn test_hillside_wall_is_downhill() {
    let grid = hillside();
    let platform = pad();
    let parcel = parcel();
    let sizer = PerimeterWallSizer::new(WallSizingConfig::default()).unwrap();

    let input = WallInput {
        platform: &platform,
        parcel: &parcel,
        platform_elevation: 1.0,
        soft_soil: false,
        raster: Some(&grid),
    };
    let result = sizer.size(&input);

    // 4 edges of 10 m, 11 stations each
    assert_eq!(result.profiles.len(), 44);
    assert!(result.profiles.iter().all(|p| p.height >= 0.0));

    // Uphill face retains nothing
    for profile in result.profiles.iter().filter(|p| p.normal.y > 0.5) {
        assert_eq!(profile.height, 0.0);
        assert_eq!(profile.thickness, 0.0);
        assert_abs_diff_eq!(profile.clearance, 15.0, epsilon = 1e-9);
    }

    // Lowest sampled cell centre sits at y = 0.5
    assert_abs_diff_eq!(result.max_height, 1.0 - 0.025, epsilon = 1e-9);
    assert_eq!(result.material, WallMaterialKind::Riprap);
    assert_abs_diff_eq!(result.total_cost, result.total_volume * 180.0, epsilon = 1e-9);

    let soft = sizer.size(&WallInput {
        soft_soil: true,
        ..input
    });
    assert_eq!(soft.material, WallMaterialKind::ConcreteBlock);
    assert_abs_diff_eq!(soft.total_volume, result.total_volume, epsilon = 1e-12);
}

#[test]
fn test_tall_retaining_requirement_falls_back() {
    let grid = hillside();
    let platform = pad();
    let parcel = parcel();
    let result = PerimeterWallSizer::default().size(&WallInput {
        platform: &platform,
        parcel: &parcel,
        platform_elevation: 12.0,
        soft_soil: false,
        raster: Some(&grid),
    });
    assert!(result.max_height > 8.0);
    assert_eq!(result.material, WallMaterialKind::ReinforcedConcrete);
    assert!(result.profiles.iter().any(|p| p.thickness == 0.70));
}
