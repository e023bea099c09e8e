// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary analysis on small synthetic blocks

use approx::assert_abs_diff_eq;
use parcela_geometry::{Point2, Polygon, Polyline, Region};
use parcela_siting::{BoundaryAnalyzer, Neighbor, ParcelAnalysis, SegmentLabel};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
    Polygon::rectangle(Point2::new(x0, y0), Point2::new(x1, y1))
}

fn square_parcel() -> Region {
    Region::from(rect(0.0, 0.0, 20.0, 20.0))
}

/// Plots west, north and east of the parcel
fn enclosing_plots() -> Vec<Neighbor> {
    vec![
        Neighbor::private("W", rect(-20.0, 0.0, 0.0, 40.0)),
        Neighbor::private("N", rect(0.0, 20.0, 20.0, 40.0)),
        Neighbor::private("E", rect(20.0, 0.0, 40.0, 40.0)),
    ]
}

fn assert_reconciled(analysis: &ParcelAnalysis) {
    let covered = analysis.frontal_length + analysis.lateral_length;
    assert!(covered <= analysis.total_perimeter * 1.005 + 1e-9);
    assert!(covered >= analysis.total_perimeter * 0.995 - 1e-9);
}

fn assert_envelope_inside(analysis: &ParcelAnalysis, parcel: &Region) {
    let envelope = analysis.buildable.as_ref().expect("buildable envelope");
    assert!(envelope.area() < parcel.area());
    assert!(envelope.difference(parcel).area() < 1e-6);
}

#[test]
fn test_square_block_with_street_and_road() {
    let parcel = square_parcel();
    let mut neighbors = enclosing_plots();
    neighbors.push(Neighbor::private("SELF", rect(0.0, 0.0, 20.0, 20.0)));
    neighbors.push(Neighbor::public(rect(-40.0, -10.0, 60.0, 0.0)));
    let roads = vec![Polyline::new(vec![Point2::new(-40.0, -5.0), Point2::new(60.0, -5.0)])];

    let analysis = BoundaryAnalyzer::default()
        .analyze(&parcel, Some("SELF"), &neighbors, &roads)
        .unwrap();

    assert!(!analysis.all_frontal);
    assert!(!analysis.rescue_applied);
    assert_abs_diff_eq!(analysis.total_perimeter, 80.0, epsilon = 1e-9);
    assert_abs_diff_eq!(analysis.frontal_length, 20.0, epsilon = 1e-6);
    assert_abs_diff_eq!(analysis.lateral_length, 60.0, epsilon = 1e-6);
    assert_reconciled(&analysis);

    let labels: Vec<SegmentLabel> = analysis.segments.iter().map(|s| s.label).collect();
    assert_eq!(
        labels,
        vec![
            SegmentLabel::Frontal,
            SegmentLabel::Lateral,
            SegmentLabel::Lateral,
            SegmentLabel::Lateral
        ]
    );
    // Front edge overlaps the road zone and the cadastral street equally
    let front = &analysis.segments[0];
    assert!(front.osm_overlap > 0.0);
    assert!(front.cadastral_overlap > 0.0);

    assert_abs_diff_eq!(analysis.fence_cost, 16.0 * 110.0 + 60.0 * 60.0, epsilon = 1e-4);
    assert_eq!(analysis.access_point, Point2::new(10.0, 0.0));

    // The 2 m street corridor falls inside the 3 m lateral inset
    assert_envelope_inside(&analysis, &parcel);
    assert_abs_diff_eq!(analysis.buildable_area(), 14.0 * 14.0, epsilon = 1e-6);
}

#[test]
fn test_shallow_plot_frontage_without_roads() {
    let parcel = Region::from(rect(0.0, 0.0, 20.0, 10.0));
    let neighbors = vec![
        Neighbor::private("W", rect(-20.0, 0.0, 0.0, 30.0)),
        Neighbor::private("N", rect(0.0, 10.0, 20.0, 30.0)),
        Neighbor::private("E", rect(20.0, 0.0, 40.0, 30.0)),
        Neighbor::public(rect(-40.0, -10.0, 60.0, 0.0)),
    ];

    let analysis = BoundaryAnalyzer::default()
        .analyze(&parcel, None, &neighbors, &[])
        .unwrap();

    assert_abs_diff_eq!(analysis.frontal_length, 20.0, epsilon = 1e-6);
    assert_abs_diff_eq!(analysis.lateral_length, 40.0, epsilon = 1e-6);
    assert_reconciled(&analysis);
    assert_envelope_inside(&analysis, &parcel);
}

#[test]
fn test_no_public_data_means_all_frontal() {
    let parcel = square_parcel();
    let analysis = BoundaryAnalyzer::default()
        .analyze(&parcel, Some("SELF"), &enclosing_plots(), &[])
        .unwrap();

    assert!(analysis.all_frontal);
    assert_abs_diff_eq!(analysis.frontal_length, 80.0, epsilon = 1e-9);
    assert_eq!(analysis.lateral_length, 0.0);
    assert!(parcel.contains(&analysis.access_point));
    // Frontal setback on every side
    assert_abs_diff_eq!(analysis.buildable_area(), 100.0, epsilon = 1e-6);
}

#[test]
fn test_rescue_promotes_edges_near_street_corner() {
    let parcel = square_parcel();
    let neighbors = vec![
        Neighbor::private("W", rect(-20.0, -20.0, 0.0, 40.0)),
        Neighbor::private("N", rect(0.0, 20.0, 20.0, 40.0)),
        Neighbor::private("E", rect(20.0, 0.0, 40.0, 40.0)),
        Neighbor::private("S", rect(0.0, -20.0, 20.0, 0.0)),
        // Street running east from the south-east corner only
        Neighbor::public(rect(20.0, -6.0, 140.0, 0.0)),
    ];

    let analysis = BoundaryAnalyzer::default()
        .analyze(&parcel, Some("SELF"), &neighbors, &[])
        .unwrap();

    assert!(analysis.rescue_applied);
    assert!(analysis.frontal_length >= 40.0 - 1e-6);
    assert_reconciled(&analysis);

    // The bottom and right edges carry the street overlap
    assert!(analysis.segments[0].is_frontal());
    assert!(analysis.segments[1].is_frontal());
    assert!(analysis.segments[0].score > analysis.segments[2].score);
}

#[test]
fn test_rescue_needs_public_land() {
    let parcel = square_parcel();
    let mut neighbors = enclosing_plots();
    neighbors.push(Neighbor::private("S", rect(0.0, -20.0, 20.0, 0.0)));
    // A road far from the parcel leaves no near zone
    let roads = vec![Polyline::new(vec![Point2::new(-40.0, -60.0), Point2::new(60.0, -60.0)])];

    let analysis = BoundaryAnalyzer::default()
        .analyze(&parcel, Some("SELF"), &neighbors, &roads)
        .unwrap();

    assert!(!analysis.all_frontal);
    assert!(!analysis.rescue_applied);
    assert_eq!(analysis.frontal_length, 0.0);
    assert_abs_diff_eq!(analysis.lateral_length, 80.0, epsilon = 1e-6);
    assert!(parcel.contains(&analysis.access_point));
    assert_envelope_inside(&analysis, &parcel);
}

#[test]
fn test_analysis_serializes() {
    let parcel = square_parcel();
    let analysis = BoundaryAnalyzer::default()
        .analyze(&parcel, None, &[], &[])
        .unwrap();
    let value = serde_json::to_value(&analysis).unwrap();
    assert_eq!(value["all_frontal"], serde_json::Value::Bool(true));
    assert!(value["buildable"].is_array());
}
