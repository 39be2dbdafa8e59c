//! Telemetry rows as recorded by the certificate monitor.

use certmon_route::{ConnectionEdge, Coordinates};
use serde::{Deserialize, Serialize};

/// Agreement step whose votes are traced (certificate votes).
pub const CERT_VOTE_STEP: u64 = 2;

/// How far back from the vote the connection map is collected, in seconds.
pub const CONNECTION_LOOKBACK_SECS: u64 = 60 * 60;

/// A vote sent by an authenticator, as reported by the sending node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vote {
    /// Telemetry id of the node that sent the vote
    pub sender_telemetry_id: String,
    /// Unix timestamp in seconds
    pub timestamp: u64,
    /// Authenticator address that cast the vote
    pub sender: String,
    pub round: u64,
    pub period: u64,
    pub step: u64,
    pub weight: u64,
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

impl Vote {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.lat, self.long)
    }

    /// The connection window ending at this vote.
    pub fn lookback_window(&self) -> TimeWindow {
        TimeWindow::ending_at(self.timestamp, CONNECTION_LOOKBACK_SECS)
    }
}

/// A connection row with the time it was observed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimedConnection {
    /// Unix timestamp in seconds
    #[serde(default)]
    pub timestamp: u64,
    #[serde(flatten)]
    pub edge: ConnectionEdge,
}

impl TimedConnection {
    pub fn new(timestamp: u64, edge: ConnectionEdge) -> Self {
        Self { timestamp, edge }
    }
}

/// A relay's certificate for a round listed this authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthenticatorSighting {
    pub relay: String,
    pub round: u64,
    pub auth: String,
}

impl AuthenticatorSighting {
    pub fn new(relay: impl Into<String>, round: u64, auth: impl Into<String>) -> Self {
        Self {
            relay: relay.into(),
            round,
            auth: auth.into(),
        }
    }
}

/// Per-round summary row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundInfo {
    pub round: u64,
    pub relay_count: usize,
    pub auth_count: usize,
    pub period: u64,
    pub step: u64,
}

/// Inclusive time range in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: u64,
    pub end: u64,
}

impl TimeWindow {
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// The `span` seconds leading up to and including `end`.
    pub const fn ending_at(end: u64, span: u64) -> Self {
        Self {
            start: end.saturating_sub(span),
            end,
        }
    }

    pub const fn contains(&self, timestamp: u64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}
