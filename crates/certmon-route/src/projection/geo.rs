//! Map markers and polylines for the geographic view.
//!
//! Runs its own de-duplication, independent of edge consumption: a point
//! is placed once per longitude value, so a node re-reached over a second
//! path does not draw a second marker on the same spot.

use std::collections::HashSet;

use crate::edge::Coordinates;
use crate::record::Reconstruction;

/// Title of the first polyline; later ones count up from here.
const FIRST_SEGMENT_ORDER: u32 = 2;

/// A hop placed on the map.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoMarker {
    pub point: Coordinates,
    /// Hop level, shown as the marker label
    pub hop: u32,
    pub name: String,
}

/// A line from one placed hop to the next.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoSegment {
    pub from: Coordinates,
    pub to: Coordinates,
    pub order: u32,
}

/// Everything the map needs to draw a route.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoView {
    /// Map center (the origin), when it has a usable location
    pub center: Option<Coordinates>,
    pub markers: Vec<GeoMarker>,
    pub segments: Vec<GeoSegment>,
}

/// Longitudes already placed, compared bit-for-bit.
#[derive(Default)]
struct PlacedLongitudes(HashSet<u64>);

impl PlacedLongitudes {
    fn place(&mut self, point: Coordinates) -> bool {
        self.0.insert(point.long.to_bits())
    }
}

/// Build the map view from records, in record order.
pub fn geo(reconstruction: &Reconstruction) -> GeoView {
    let mut view = GeoView::default();
    let mut placed = PlacedLongitudes::default();
    let mut order = FIRST_SEGMENT_ORDER;

    for record in reconstruction {
        let Some(point) = record.coordinates.filter(Coordinates::is_plottable) else {
            continue;
        };
        if !placed.place(point) {
            continue;
        }

        if record.is_root() {
            view.center = Some(point);
        } else if let Some(from) = record.parent_coordinates.filter(Coordinates::is_plottable) {
            view.segments.push(GeoSegment { from, to: point, order });
            order += 1;
        }
        view.markers.push(GeoMarker {
            point,
            hop: record.level,
            name: record.node_name.clone(),
        });
    }

    view
}
