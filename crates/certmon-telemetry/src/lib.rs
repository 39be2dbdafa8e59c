//! Certmon Telemetry
//!
//! Read-side access to the certificate monitor's telemetry: votes,
//! node and relay connection rows, and per-round certificate sightings.
//!
//! # Components
//!
//! - **Store**: [`TelemetryStore`] trait plus a JSON-backed [`MemoryStore`]
//! - **Route**: resolves a dashboard route request into the edge pool,
//!   origin and seen-relay set, then runs the reconstructor
//! - **Stats**: authenticator popularity, per-relay counts, round summaries
//!
//! # Route Resolution
//!
//! 1. Find the round's first certificate vote (from the requested sender
//!    when the source host is known)
//! 2. Collect connection rows from the hour before that vote
//! 3. Seed the origin from the source host's own connections, or a stub
//! 4. Mark relays whose certificate listed the authenticator

mod error;
mod model;
mod route;
mod store;
pub mod stats;

pub use error::{Result, TelemetryError};
pub use model::{
    AuthenticatorSighting, RoundInfo, TimeWindow, TimedConnection, Vote, CERT_VOTE_STEP,
    CONNECTION_LOOKBACK_SECS,
};
pub use route::{resolve_route, seen_relays, RouteRequest, RouteView, SourceHost};
pub use store::{MemoryStore, NodeSelector, StoreCounts, TelemetryDocument, TelemetryStore};

#[cfg(test)]
mod tests {
    use super::*;
    use certmon_route::{ConnectionEdge, GraphStyle, Projection};

    #[test]
    fn document_drives_a_full_route() {
        let json = r#"{
            "votes": [
                {"sender_telemetry_id": "tel-n1", "sender": "AUTH", "round": 100, "step": 2,
                 "timestamp": 50000, "lat": 10.0, "long": 20.0}
            ],
            "connections": [
                {"timestamp": 49000, "guid": "n1", "name": "voter", "other_guid": "n2", "other_name": "relay-2",
                 "lat": 10.0, "long": 20.0, "other_lat": 11.0, "other_long": 21.0}
            ],
            "relay_connections": [
                {"timestamp": 49500, "guid": "n2", "name": "relay-2", "other_guid": "n3", "other_name": "relay-3",
                 "relay": "r2", "other_relay": "r3", "other_lat": 12.0, "other_long": 22.0}
            ],
            "authenticators": [{"relay": "r3", "round": 100, "auth": "AUTH"}]
        }"#;
        let store = MemoryStore::from_json_str(json).unwrap();

        let request = RouteRequest::new(100)
            .auth("AUTH")
            .source_host("n1:r1")
            .style(GraphStyle::Geo);
        let view = resolve_route(&store, &request).unwrap();

        let Projection::Geo(geo) = view.projection else {
            panic!("expected geo projection");
        };
        let hops: Vec<u32> = geo.markers.iter().map(|m| m.hop).collect();
        assert_eq!(hops, vec![0, 1, 2]);
        assert_eq!(geo.segments.len(), 2);
    }

    #[test]
    fn store_is_object_safe() {
        let mut store = MemoryStore::new();
        store.push_relay_connection(1, ConnectionEdge::new("a", "b"));
        let store: Box<dyn TelemetryStore> = Box::new(store);
        assert_eq!(store.relay_connections(TimeWindow::new(0, 10)).unwrap().len(), 1);
    }
}
