//! Telemetry storage.
//!
//! The dashboard only ever reads. [`TelemetryStore`] is the seam a database
//! backend plugs into; [`MemoryStore`] serves a JSON telemetry document.

use std::collections::BTreeSet;
use std::path::Path;

use certmon_route::ConnectionEdge;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::model::{AuthenticatorSighting, RoundInfo, TimeWindow, TimedConnection, Vote, CERT_VOTE_STEP};

/// How a voter's own connection rows are looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelector {
    /// By node guid
    Guid(String),
    /// By node display name, when no guid is known
    Name(String),
}

impl NodeSelector {
    fn matches(&self, edge: &ConnectionEdge) -> bool {
        match self {
            NodeSelector::Guid(guid) => edge.guid == *guid,
            NodeSelector::Name(name) => edge.name == *name,
        }
    }
}

/// Read access to round, vote and connection telemetry.
pub trait TelemetryStore: Send + Sync {
    /// The earliest certificate-step vote of `round`, optionally from one sender.
    fn first_vote(&self, round: u64, sender: Option<&str>) -> Result<Option<Vote>>;

    /// Relay-to-relay connection rows observed inside `window`.
    fn relay_connections(&self, window: TimeWindow) -> Result<Vec<ConnectionEdge>>;

    /// A node's own connection rows observed inside `window`.
    fn voter_connections(&self, window: TimeWindow, node: &NodeSelector) -> Result<Vec<ConnectionEdge>>;

    /// Certificate sightings for `round`.
    fn sightings(&self, round: u64) -> Result<Vec<AuthenticatorSighting>>;

    /// Rounds that have any sightings, ascending.
    fn sighted_rounds(&self) -> Result<Vec<u64>>;

    /// Explicit round summary rows.
    fn round_info(&self) -> Result<Vec<RoundInfo>>;
}

/// On-disk shape of a telemetry document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryDocument {
    pub votes: Vec<Vote>,
    /// Node connection rows (voter side)
    pub connections: Vec<TimedConnection>,
    /// Relay mesh connection rows
    pub relay_connections: Vec<TimedConnection>,
    pub authenticators: Vec<AuthenticatorSighting>,
    pub rounds: Vec<RoundInfo>,
}

/// Row counts, for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub votes: usize,
    pub connections: usize,
    pub relay_connections: usize,
    pub sightings: usize,
    pub rounds: usize,
}

/// In-memory telemetry store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    doc: TelemetryDocument,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(doc: TelemetryDocument) -> Self {
        Self { doc }
    }

    /// Parse a telemetry document from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: TelemetryDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(doc))
    }

    /// Load a telemetry document from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&data)?;
        info!(path = %path.display(), counts = ?store.counts(), "telemetry loaded");
        Ok(store)
    }

    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            votes: self.doc.votes.len(),
            connections: self.doc.connections.len(),
            relay_connections: self.doc.relay_connections.len(),
            sightings: self.doc.authenticators.len(),
            rounds: self.doc.rounds.len(),
        }
    }

    // --- Builders ---

    pub fn push_vote(&mut self, vote: Vote) {
        self.doc.votes.push(vote);
    }

    pub fn push_connection(&mut self, timestamp: u64, edge: ConnectionEdge) {
        self.doc.connections.push(TimedConnection::new(timestamp, edge));
    }

    pub fn push_relay_connection(&mut self, timestamp: u64, edge: ConnectionEdge) {
        self.doc.relay_connections.push(TimedConnection::new(timestamp, edge));
    }

    pub fn push_sighting(&mut self, sighting: AuthenticatorSighting) {
        self.doc.authenticators.push(sighting);
    }

    pub fn push_round(&mut self, info: RoundInfo) {
        self.doc.rounds.push(info);
    }
}

fn rows_in(rows: &[TimedConnection], window: TimeWindow) -> impl Iterator<Item = &ConnectionEdge> {
    rows.iter()
        .filter(move |row| window.contains(row.timestamp))
        .map(|row| &row.edge)
}

impl TelemetryStore for MemoryStore {
    fn first_vote(&self, round: u64, sender: Option<&str>) -> Result<Option<Vote>> {
        let vote = self
            .doc
            .votes
            .iter()
            .filter(|v| v.round == round && v.step == CERT_VOTE_STEP)
            .filter(|v| sender.map_or(true, |s| v.sender == s))
            .min_by_key(|v| v.timestamp)
            .cloned();
        debug!(round, ?sender, found = vote.is_some(), "first vote lookup");
        Ok(vote)
    }

    fn relay_connections(&self, window: TimeWindow) -> Result<Vec<ConnectionEdge>> {
        Ok(rows_in(&self.doc.relay_connections, window).cloned().collect())
    }

    fn voter_connections(&self, window: TimeWindow, node: &NodeSelector) -> Result<Vec<ConnectionEdge>> {
        Ok(rows_in(&self.doc.connections, window)
            .filter(|edge| node.matches(edge))
            .cloned()
            .collect())
    }

    fn sightings(&self, round: u64) -> Result<Vec<AuthenticatorSighting>> {
        Ok(self
            .doc
            .authenticators
            .iter()
            .filter(|s| s.round == round)
            .cloned()
            .collect())
    }

    fn sighted_rounds(&self) -> Result<Vec<u64>> {
        let rounds: BTreeSet<u64> = self.doc.authenticators.iter().map(|s| s.round).collect();
        Ok(rounds.into_iter().collect())
    }

    fn round_info(&self) -> Result<Vec<RoundInfo>> {
        Ok(self.doc.rounds.clone())
    }
}
