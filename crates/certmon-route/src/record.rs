//! Output of a reconstruction: one record per node placement.

use std::collections::HashSet;

use crate::edge::{Coordinates, OriginObservation};

/// One node placement in the vote's spread graph.
///
/// The same node may appear in several records when the vote reached it
/// over more than one path.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropagationRecord {
    /// Hop distance from the origin (origin = 0)
    pub level: u32,
    /// Node this hop came from; `None` for the origin
    pub parent_guid: Option<String>,
    pub node_guid: String,
    pub node_name: String,
    /// Relay host of this node, if one could be resolved
    pub relay_name: Option<String>,
    /// Relay host of the parent side of the hop
    pub parent_relay: Option<String>,
    pub coordinates: Option<Coordinates>,
    /// Where the hop started on the map
    pub parent_coordinates: Option<Coordinates>,
    /// Relay independently reported the vote's authenticator
    pub seen: bool,
}

impl PropagationRecord {
    /// The record for the origin itself.
    pub fn root(origin: &OriginObservation) -> Self {
        Self {
            level: 0,
            parent_guid: None,
            node_guid: origin.guid.clone(),
            node_name: origin.name.clone(),
            relay_name: origin.relay.clone(),
            parent_relay: None,
            coordinates: origin.coordinates,
            parent_coordinates: None,
            seen: true,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_guid.is_none()
    }
}

/// Relay names known to have received the vote through certificate data.
///
/// Matching is by relay name, never by guid. Only used to mark records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenRelays {
    names: HashSet<String>,
}

impl SeenRelays {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relay name. Empty names are ignored.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.is_empty() {
            return false;
        }
        self.names.insert(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        !name.is_empty() && self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SeenRelays {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut seen = Self::new();
        for name in iter {
            seen.insert(name);
        }
        seen
    }
}

/// Counters collected during one reconstruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReconstructStats {
    /// Candidate edges handed in
    pub pool_size: usize,
    /// Pending connections taken off the queue
    pub dequeues: usize,
    /// Edges removed from the pool (queued or discarded)
    pub consumed: usize,
    /// Hops emitted without a relay name
    pub unresolved: usize,
    /// Number of rings expanded
    pub rings: u32,
}

/// The ordered records of one reconstruction plus its counters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reconstruction {
    pub records: Vec<PropagationRecord>,
    pub stats: ReconstructStats,
}

impl Reconstruction {
    /// The origin record. Always present.
    pub fn root(&self) -> Option<&PropagationRecord> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropagationRecord> {
        self.records.iter()
    }

    /// Deepest hop level reached.
    pub fn max_level(&self) -> u32 {
        self.records.iter().map(|r| r.level).max().unwrap_or(0)
    }

    /// Output positions of records marked as seen.
    pub fn seen_positions(&self) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.seen)
            .map(|(i, _)| i)
            .collect()
    }
}

impl<'a> IntoIterator for &'a Reconstruction {
    type Item = &'a PropagationRecord;
    type IntoIter = std::slice::Iter<'a, PropagationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seen_relays_ignore_empty_names() {
        let mut seen: SeenRelays = ["r1.example", ""].into_iter().collect();
        assert_eq!(seen.len(), 1);
        assert!(seen.contains("r1.example"));
        assert!(!seen.contains(""));
        assert!(!seen.insert(""));
        assert!(seen.insert("r2.example"));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn root_record_is_seen() {
        let origin = OriginObservation::stub("n1", "node-1");
        let root = PropagationRecord::root(&origin);
        assert!(root.is_root());
        assert!(root.seen);
        assert_eq!(root.level, 0);
        assert_eq!(root.node_name, "node-1");
    }
}
