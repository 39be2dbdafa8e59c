//! Connection telemetry as seen by the reconstructor.
//!
//! A connection row records that two nodes were linked at some point in the
//! query window. Rows are undirected observations stored with asymmetric
//! roles: the same physical link may show up twice with the sides swapped,
//! or with only the origin side filled in.

/// Widest longitude the map projection accepts, in degrees.
///
/// Telemetry dashboards in the field bound longitude by ±90 rather than the
/// usual ±180. Points outside are dropped from the geographic view.
pub const MAX_ABS_LONGITUDE: f64 = 90.0;

/// A geographic point reported by a node's telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinates {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub long: f64,
}

impl Coordinates {
    /// Create a new point.
    pub const fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }

    /// Build a point from optional telemetry fields; both must be present.
    pub fn from_parts(lat: Option<f64>, long: Option<f64>) -> Option<Self> {
        Some(Self::new(lat?, long?))
    }

    /// Whether this point can be placed on the map.
    pub fn is_plottable(&self) -> bool {
        self.lat.is_finite() && self.long.is_finite() && self.long.abs() <= MAX_ABS_LONGITUDE
    }
}

/// One observed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConnectionEdge {
    /// Origin node identifier
    pub guid: String,
    /// Origin node display name
    pub name: String,
    /// Peer node identifier; empty when no destination is known
    pub other_guid: String,
    /// Peer node display name
    pub other_name: String,
    /// Relay host associated with the origin side
    pub relay: Option<String>,
    /// Relay host associated with the peer side
    pub other_relay: Option<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub other_lat: Option<f64>,
    pub other_long: Option<f64>,
}

impl ConnectionEdge {
    /// Create an edge between two nodes, using the guids as display names.
    pub fn new(guid: impl Into<String>, other_guid: impl Into<String>) -> Self {
        let guid = guid.into();
        let other_guid = other_guid.into();
        Self {
            name: guid.clone(),
            other_name: other_guid.clone(),
            guid,
            other_guid,
            ..Self::default()
        }
    }

    /// Set the display names of both sides.
    pub fn with_names(mut self, name: impl Into<String>, other_name: impl Into<String>) -> Self {
        self.name = name.into();
        self.other_name = other_name.into();
        self
    }

    /// Set the relay hosts of both sides.
    pub fn with_relays(mut self, relay: impl Into<String>, other_relay: impl Into<String>) -> Self {
        self.relay = Some(relay.into());
        self.other_relay = Some(other_relay.into());
        self
    }

    /// Set the coordinates of both sides.
    pub fn with_coordinates(mut self, origin: Coordinates, peer: Coordinates) -> Self {
        self.lat = Some(origin.lat);
        self.long = Some(origin.long);
        self.other_lat = Some(peer.lat);
        self.other_long = Some(peer.long);
        self
    }

    /// Whether the row names a destination at all.
    pub fn has_peer(&self) -> bool {
        !self.other_guid.is_empty()
    }

    /// Whether either side of the row is the given node.
    pub fn touches(&self, guid: &str) -> bool {
        self.guid == guid || self.other_guid == guid
    }

    /// Coordinates of the origin side, if reported.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.lat, self.long)
    }

    /// Coordinates of the peer side, if reported.
    pub fn other_coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.other_lat, self.other_long)
    }
}

/// The vote observation a route is traced from.
///
/// `links` are the voter's own connection rows for the query window. Each
/// link with a peer seeds one first-hop connection; a link without a peer is
/// a stub and seeds nothing.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OriginObservation {
    pub guid: String,
    pub name: String,
    pub relay: Option<String>,
    pub coordinates: Option<Coordinates>,
    /// Unix timestamp (seconds) of the vote, for display only
    pub timestamp: Option<u64>,
    pub links: Vec<ConnectionEdge>,
}

impl OriginObservation {
    /// An origin with nothing known downstream.
    pub fn stub(guid: impl Into<String>, name: impl Into<String>) -> Self {
        let guid = guid.into();
        let name = name.into();
        Self {
            links: vec![ConnectionEdge {
                guid: guid.clone(),
                name: name.clone(),
                ..ConnectionEdge::default()
            }],
            guid,
            name,
            ..Self::default()
        }
    }

    /// An origin with the given connection rows.
    pub fn with_links(guid: impl Into<String>, links: Vec<ConnectionEdge>) -> Self {
        let guid = guid.into();
        Self {
            name: guid.clone(),
            guid,
            links,
            ..Self::default()
        }
    }

    /// Set the origin's location.
    pub fn at(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// Links that actually name a first hop.
    pub fn seeds(&self) -> impl Iterator<Item = &ConnectionEdge> {
        self.links.iter().filter(|link| link.has_peer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longitude_bound_is_ninety() {
        assert!(Coordinates::new(10.0, 90.0).is_plottable());
        assert!(Coordinates::new(10.0, -90.0).is_plottable());
        assert!(!Coordinates::new(10.0, 95.0).is_plottable());
        assert!(!Coordinates::new(10.0, -120.5).is_plottable());
        assert!(!Coordinates::new(f64::NAN, 0.0).is_plottable());
    }

    #[test]
    fn coordinates_need_both_parts() {
        assert_eq!(Coordinates::from_parts(Some(1.0), None), None);
        assert_eq!(
            Coordinates::from_parts(Some(1.0), Some(2.0)),
            Some(Coordinates::new(1.0, 2.0))
        );
    }

    #[test]
    fn stub_origin_has_no_seeds() {
        let origin = OriginObservation::stub("n1", "node-1");
        assert_eq!(origin.links.len(), 1);
        assert_eq!(origin.seeds().count(), 0);
    }

    #[test]
    fn edge_touches_either_side() {
        let edge = ConnectionEdge::new("a", "b");
        assert!(edge.touches("a"));
        assert!(edge.touches("b"));
        assert!(!edge.touches("c"));
        assert!(edge.has_peer());
        assert!(!ConnectionEdge::new("a", "").has_peer());
    }
}
