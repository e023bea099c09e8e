// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parcela Geometry
//!
//! Planar polygon-set geometry for parcel analysis: polygons and regions,
//! i_overlay-backed boolean operations, buffering with cap/join styles, line
//! sets and minimum bounding rectangles. Coordinates are metric and planar.

pub mod boolean;
pub mod buffer;
pub mod error;
pub mod hull;
pub mod line;
pub mod polygon;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2};

pub use boolean::union_all;
pub use buffer::{buffer_polylines, buffer_segments, BufferStyle, CapStyle, JoinStyle};
pub use error::{Error, Result};
pub use hull::{convex_hull, minimum_rotated_rectangle, rectangle_edge_lengths};
pub use line::{LineSet, Polyline, Segment};
pub use polygon::{ensure_ccw, ensure_cw, signed_area, Polygon, Region, MIN_AREA_THRESHOLD};
