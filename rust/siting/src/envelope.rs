// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buildable envelope from setbacks

use crate::config::SetbackConfig;
use parcela_geometry::{buffer_segments, BufferStyle, LineSet, Region, Segment};

/// Region left after applying the setbacks
///
/// The whole boundary is pulled in by the lateral setback. When the frontal
/// setback is larger, a corridor of the difference is cut along the frontal
/// edges. `None` when nothing buildable remains.
pub fn buildable_envelope(
    parcel: &Region,
    frontal: &[Segment],
    setbacks: &SetbackConfig,
) -> Option<Region> {
    let inset = parcel.buffer(-setbacks.lateral, &BufferStyle::mitred());
    let extra = (setbacks.frontal - setbacks.lateral).max(0.0);

    let envelope = if extra > 0.0 && !frontal.is_empty() {
        let frontage = LineSet::union_of(frontal);
        let corridor = buffer_segments(&frontage.segments, extra, &BufferStyle::mitred());
        inset.difference(&corridor)
    } else {
        inset
    };

    finish(envelope)
}

/// Envelope when every edge fronts a street
pub fn all_frontal_envelope(parcel: &Region, setbacks: &SetbackConfig) -> Option<Region> {
    finish(parcel.buffer(-setbacks.frontal, &BufferStyle::mitred()))
}

fn finish(envelope: Region) -> Option<Region> {
    match envelope.into_non_empty("buildable envelope") {
        Ok(region) => {
            tracing::info!(area = region.area(), "buildable envelope");
            Some(region)
        }
        Err(err) => {
            tracing::warn!(error = %err, "no buildable area");
            None
        }
    }
}
