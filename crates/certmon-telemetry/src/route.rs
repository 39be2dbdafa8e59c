//! Turning a dashboard route request into a reconstructed vote route.

use std::fmt;
use std::str::FromStr;

use certmon_route::{
    project, reconstruct, ConnectionEdge, GraphStyle, OriginObservation, Projection,
    ReconstructStats, SeenRelays,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, TelemetryError};
use crate::model::{TimeWindow, Vote};
use crate::store::{NodeSelector, TelemetryStore};

/// The `guid:relay` string identifying which host a vote came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHost {
    raw: String,
    guid: String,
    relay: Option<String>,
}

impl SourceHost {
    /// Parse `guid:relay`. Without a colon the whole string is the guid.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (guid, relay) = match raw.split_once(':') {
            Some((guid, relay)) => (guid, Some(relay.to_string()).filter(|r| !r.is_empty())),
            None => (raw, None),
        };
        Self {
            raw: raw.to_string(),
            guid: guid.to_string(),
            relay,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn relay(&self) -> Option<&str> {
        self.relay.as_deref()
    }

    /// How this host's own connection rows are found.
    pub fn selector(&self) -> NodeSelector {
        if self.guid.is_empty() {
            NodeSelector::Name(self.raw.clone())
        } else {
            NodeSelector::Guid(self.guid.clone())
        }
    }
}

impl FromStr for SourceHost {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(TelemetryError::InvalidInput("empty source host".to_string()));
        }
        Ok(Self::parse(s))
    }
}

impl fmt::Display for SourceHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Which vote route to draw, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub round: u64,
    /// Authenticator whose vote is traced
    pub auth: Option<String>,
    /// Host the vote left from, when known
    pub source_host: Option<SourceHost>,
    pub style: GraphStyle,
}

impl RouteRequest {
    pub fn new(round: u64) -> Self {
        Self {
            round,
            auth: None,
            source_host: None,
            style: GraphStyle::default(),
        }
    }

    pub fn auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into()).filter(|a: &String| !a.is_empty());
        self
    }

    pub fn source_host(mut self, raw: &str) -> Self {
        self.source_host = Some(SourceHost::parse(raw)).filter(|h| !h.raw().is_empty());
        self
    }

    pub fn style(mut self, style: GraphStyle) -> Self {
        self.style = style;
        self
    }
}

/// A reconstructed route ready for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct RouteView {
    pub round: u64,
    pub auth: Option<String>,
    pub source_host: Option<String>,
    /// Connection rows were taken from this window
    pub window: TimeWindow,
    pub vote_timestamp: u64,
    pub style: GraphStyle,
    pub projection: Projection,
    pub stats: ReconstructStats,
}

/// Find the seed vote for a request.
///
/// The sender filter only applies when the source host is known; otherwise
/// any certificate vote of the round seeds the route.
fn seed_vote(store: &dyn TelemetryStore, request: &RouteRequest) -> Result<Vote> {
    let sender = match (&request.source_host, &request.auth) {
        (Some(_), Some(auth)) => Some(auth.as_str()),
        _ => None,
    };
    match (store.first_vote(request.round, sender)?, sender) {
        (Some(vote), _) => Ok(vote),
        (None, Some(sender)) => Err(TelemetryError::NoVoteFrom {
            round: request.round,
            sender: sender.to_string(),
        }),
        (None, None) => Err(TelemetryError::NoVote { round: request.round }),
    }
}

/// Build the origin observation for the seed vote.
fn origin_for(
    store: &dyn TelemetryStore,
    vote: &Vote,
    window: TimeWindow,
    source: Option<&SourceHost>,
) -> Result<OriginObservation> {
    let Some(source) = source else {
        return Ok(OriginObservation {
            guid: vote.sender_telemetry_id.clone(),
            name: vote.sender_telemetry_id.clone(),
            coordinates: vote.coordinates(),
            timestamp: Some(vote.timestamp),
            ..OriginObservation::default()
        });
    };

    let mut links = store.voter_connections(window, &source.selector())?;
    if links.is_empty() {
        debug!(source = %source, "no voter connections, using stub origin");
        links.push(ConnectionEdge {
            guid: source.guid().to_string(),
            name: source.raw().to_string(),
            ..ConnectionEdge::default()
        });
    }

    let name = links
        .first()
        .map(|link| link.name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| source.raw().to_string());

    Ok(OriginObservation {
        guid: source.guid().to_string(),
        name,
        relay: source.relay().map(str::to_string),
        coordinates: vote.coordinates(),
        timestamp: Some(vote.timestamp),
        links,
    })
}

/// Relays whose certificate listed `auth` in `round`.
pub fn seen_relays(store: &dyn TelemetryStore, round: u64, auth: Option<&str>) -> Result<SeenRelays> {
    let Some(auth) = auth else {
        return Ok(SeenRelays::new());
    };
    Ok(store
        .sightings(round)?
        .into_iter()
        .filter(|s| s.auth == auth)
        .map(|s| s.relay)
        .collect())
}

/// Resolve a route request against the store and reconstruct it.
pub fn resolve_route(store: &dyn TelemetryStore, request: &RouteRequest) -> Result<RouteView> {
    let vote = seed_vote(store, request)?;
    let window = vote.lookback_window();

    let edges = store.relay_connections(window)?;
    let origin = origin_for(store, &vote, window, request.source_host.as_ref())?;
    let seen = seen_relays(store, request.round, request.auth.as_deref())?;

    let reconstruction = reconstruct(&edges, Some(&origin), &seen)?;
    info!(
        round = request.round,
        style = %request.style,
        records = reconstruction.len(),
        edges = edges.len(),
        "vote route resolved"
    );

    Ok(RouteView {
        round: request.round,
        auth: request.auth.clone(),
        source_host: request.source_host.as_ref().map(|h| h.raw().to_string()),
        window,
        vote_timestamp: vote.timestamp,
        style: request.style,
        projection: project(request.style, &reconstruction),
        stats: reconstruction.stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AuthenticatorSighting;
    use crate::store::MemoryStore;
    use certmon_route::Coordinates;

    const VOTE_AT: u64 = 1_000_000;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.push_vote(Vote {
            sender_telemetry_id: "tel-v1".into(),
            sender: "AUTH1".into(),
            round: 42,
            step: 2,
            timestamp: VOTE_AT,
            lat: Some(40.0),
            long: Some(-70.0),
            ..Vote::default()
        });
        store.push_connection(VOTE_AT - 60, ConnectionEdge::new("v1", "r1").with_names("voter-1", "relay-1"));
        store.push_relay_connection(
            VOTE_AT - 30,
            ConnectionEdge::new("r1", "r2").with_relays("r1.relay", "r2.relay"),
        );
        store.push_relay_connection(
            VOTE_AT - 20,
            ConnectionEdge::new("r2", "r3").with_relays("r2.relay", "r3.relay"),
        );
        // Outside the lookback window
        store.push_relay_connection(VOTE_AT - 7200, ConnectionEdge::new("r3", "r4"));
        store.push_sighting(AuthenticatorSighting::new("r3.relay", 42, "AUTH1"));
        store.push_sighting(AuthenticatorSighting::new("r2.relay", 42, "OTHER"));
        store
    }

    #[test]
    fn source_host_splits_on_first_colon() {
        let host = SourceHost::parse("v1:relay-a.example:4160");
        assert_eq!(host.guid(), "v1");
        assert_eq!(host.relay(), Some("relay-a.example:4160"));
        assert_eq!(host.selector(), NodeSelector::Guid("v1".into()));

        let bare = SourceHost::parse("v1");
        assert_eq!(bare.guid(), "v1");
        assert_eq!(bare.relay(), None);

        let nameless = SourceHost::parse(":relay");
        assert_eq!(nameless.selector(), NodeSelector::Name(":relay".into()));

        assert!(" ".parse::<SourceHost>().is_err());
        assert_eq!("v1:r1".parse::<SourceHost>().unwrap().relay(), Some("r1"));
    }

    #[test]
    fn route_follows_voter_into_relay_mesh() {
        let store = store();
        let request = RouteRequest::new(42).auth("AUTH1").source_host("v1:r1.relay");
        let view = resolve_route(&store, &request).unwrap();

        assert_eq!(view.window, TimeWindow::new(VOTE_AT - 3600, VOTE_AT));
        let Projection::Tree(nodes) = view.projection else {
            panic!("expected tree projection");
        };
        let ids: Vec<_> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "r1", "r2", "r3"]);
        assert_eq!(nodes[0].name, "voter-1");
        assert!(nodes[3].seen);
        assert!(!nodes[2].seen);
        assert_eq!(view.stats.pool_size, 2);
    }

    #[test]
    fn unknown_source_uses_stub_origin() {
        let store = store();
        let request = RouteRequest::new(42).auth("AUTH1").source_host("ghost:relay-x");
        let view = resolve_route(&store, &request).unwrap();

        let Projection::Tree(nodes) = view.projection else {
            panic!("expected tree projection");
        };
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, "ghost");
        assert_eq!(nodes[0].name, "ghost:relay-x");
    }

    #[test]
    fn no_source_host_is_root_only() {
        let store = store();
        let request = RouteRequest::new(42).style(GraphStyle::Geo);
        let view = resolve_route(&store, &request).unwrap();

        let Projection::Geo(geo) = view.projection else {
            panic!("expected geo projection");
        };
        assert_eq!(geo.center, Some(Coordinates::new(40.0, -70.0)));
        assert_eq!(geo.markers.len(), 1);
        assert_eq!(geo.markers[0].name, "tel-v1");
    }

    #[test]
    fn missing_vote_is_no_data() {
        let store = store();
        let err = resolve_route(&store, &RouteRequest::new(7)).unwrap_err();
        assert!(matches!(err, TelemetryError::NoVote { round: 7 }));
        assert!(err.is_no_data());

        let request = RouteRequest::new(42).auth("NOBODY").source_host("v1");
        let err = resolve_route(&store, &request).unwrap_err();
        assert!(matches!(err, TelemetryError::NoVoteFrom { .. }));
    }

    #[test]
    fn sender_filter_needs_source_host() {
        // Without a source host the auth only drives highlighting.
        let store = store();
        let request = RouteRequest::new(42).auth("NOBODY");
        assert!(resolve_route(&store, &request).is_ok());
    }

    #[test]
    fn seen_relays_need_an_authenticator() {
        let store = store();
        assert!(seen_relays(&store, 42, None).unwrap().is_empty());
        let seen = seen_relays(&store, 42, Some("AUTH1")).unwrap();
        assert!(seen.contains("r3.relay"));
        assert!(!seen.contains("r2.relay"));
    }

    #[test]
    fn flow_view_serializes_with_style_tag() {
        let store = store();
        let request = RouteRequest::new(42)
            .auth("AUTH1")
            .source_host("v1")
            .style(GraphStyle::Flow);
        let view = resolve_route(&store, &request).unwrap();
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["style"], "flow");
        assert_eq!(json["projection"]["style"], "flow");
        assert_eq!(json["projection"]["data"].as_array().unwrap().len(), 3);
    }
}
