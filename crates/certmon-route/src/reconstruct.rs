//! Breadth-first reconstruction of a vote's path through the relay mesh.
//!
//! # Edge Consumption
//!
//! There is no visited-node set. Every connection row is a one-shot token:
//! once a node is expanded, each remaining row where it is the origin side
//! is queued as the next hop, and each row where it is the peer side is
//! dropped as an already-counted backward link. Rows never return to the
//! pool, so the walk finishes after at most `seeds + |edges|` dequeues.
//!
//! A node reachable over two rows that are both still in the pool when it is
//! first expanded appears once per row. That is multi-path propagation, not
//! a cycle.
//!
//! # Ordering
//!
//! Records come out in dequeue order: ring by ring, and inside a ring in the
//! order hops were queued. A parent is always emitted in an earlier ring
//! than its children.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::edge::{ConnectionEdge, Coordinates, OriginObservation};
use crate::error::{Result, RouteError};
use crate::record::{PropagationRecord, ReconstructStats, Reconstruction, SeenRelays};

/// Relay names guessed for the two sides of a first hop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedRelays<'a> {
    /// Relay of the origin side
    pub relay: Option<&'a str>,
    /// Relay of the peer side
    pub other_relay: Option<&'a str>,
}

/// Guess relay names for a hop from `guid` to `other_guid`.
///
/// Scans `pool` front to back and stops at the first row sharing a guid with
/// either side. That row fills in exactly one of the two names; the other
/// stays empty. There is no uniqueness guarantee: when several rows match,
/// pool order decides.
pub fn resolve_relays<'a>(
    pool: &'a [ConnectionEdge],
    guid: &str,
    other_guid: &str,
) -> ResolvedRelays<'a> {
    let mut resolved = ResolvedRelays::default();
    for edge in pool {
        if !other_guid.is_empty() && edge.other_guid == other_guid {
            resolved.other_relay = edge.other_relay.as_deref();
        } else if !other_guid.is_empty() && edge.guid == other_guid {
            resolved.other_relay = edge.relay.as_deref();
        } else if !guid.is_empty() && edge.other_guid == guid {
            resolved.relay = edge.other_relay.as_deref();
        } else if !guid.is_empty() && edge.guid == guid {
            resolved.relay = edge.relay.as_deref();
        } else {
            continue;
        }
        break;
    }
    resolved
}

/// A hop waiting to be expanded.
#[derive(Debug, Clone, Copy)]
struct PendingHop<'a> {
    parent: &'a str,
    peer: &'a str,
    peer_name: &'a str,
    relay: Option<&'a str>,
    peer_relay: Option<&'a str>,
    parent_coordinates: Option<Coordinates>,
    coordinates: Option<Coordinates>,
}

impl<'a> PendingHop<'a> {
    /// A pool row reached from an already expanded hop.
    fn from_edge(edge: &'a ConnectionEdge, from: Option<Coordinates>) -> Self {
        Self {
            parent: &edge.guid,
            peer: &edge.other_guid,
            peer_name: &edge.other_name,
            relay: edge.relay.as_deref(),
            peer_relay: edge.other_relay.as_deref(),
            parent_coordinates: from.or_else(|| edge.coordinates()),
            coordinates: edge.other_coordinates(),
        }
    }

    fn into_record(self, level: u32, seen: &SeenRelays) -> PropagationRecord {
        PropagationRecord {
            level,
            parent_guid: Some(self.parent.to_string()),
            node_guid: self.peer.to_string(),
            node_name: self.peer_name.to_string(),
            relay_name: self.peer_relay.map(str::to_string),
            parent_relay: self.relay.map(str::to_string),
            coordinates: self.coordinates,
            parent_coordinates: self.parent_coordinates,
            seen: self.peer_relay.is_some_and(|relay| seen.contains(relay)),
        }
    }
}

/// Request-local pool of candidate rows.
///
/// Rows are marked consumed rather than removed so indices, and with them
/// the tie-breaking order, never shift.
struct EdgePool<'a> {
    edges: &'a [ConnectionEdge],
    consumed: Vec<bool>,
    remaining: usize,
}

impl<'a> EdgePool<'a> {
    fn new(edges: &'a [ConnectionEdge]) -> Self {
        Self {
            edges,
            consumed: vec![false; edges.len()],
            remaining: edges.len(),
        }
    }

    /// Take every live row touching `guid`, newest first.
    ///
    /// Rows where `guid` is the origin side are returned; rows where it is
    /// only the peer side are dropped.
    fn drain_touching(&mut self, guid: &str) -> Vec<&'a ConnectionEdge> {
        let mut forward = Vec::new();
        if self.remaining == 0 {
            return forward;
        }
        for idx in (0..self.edges.len()).rev() {
            if self.consumed[idx] {
                continue;
            }
            let edge = &self.edges[idx];
            if edge.guid == guid {
                forward.push(edge);
            } else if edge.other_guid != guid {
                continue;
            }
            self.consumed[idx] = true;
            self.remaining -= 1;
        }
        forward
    }

    fn consumed(&self) -> usize {
        self.edges.len() - self.remaining
    }
}

/// Reconstruct how a vote spread from `origin` across `edges`.
///
/// `edges` may hold duplicates, mirrored rows and rows unrelated to the
/// origin. The first record is always the origin at level 0. Fails only
/// when `origin` is absent.
pub fn reconstruct(
    edges: &[ConnectionEdge],
    origin: Option<&OriginObservation>,
    seen: &SeenRelays,
) -> Result<Reconstruction> {
    let origin = origin.ok_or_else(|| {
        RouteError::InvalidInput("no origin observation for this vote".to_string())
    })?;

    let mut pool = EdgePool::new(edges);
    let mut stats = ReconstructStats {
        pool_size: edges.len(),
        ..ReconstructStats::default()
    };
    let mut records = vec![PropagationRecord::root(origin)];

    let mut pending: VecDeque<PendingHop<'_>> = origin
        .seeds()
        .map(|link| {
            let resolved = resolve_relays(edges, &origin.guid, &link.other_guid);
            PendingHop {
                parent: &origin.guid,
                peer: &link.other_guid,
                peer_name: &link.other_name,
                relay: resolved.relay.or(origin.relay.as_deref()),
                peer_relay: resolved.other_relay,
                parent_coordinates: origin.coordinates.or_else(|| link.coordinates()),
                coordinates: link.other_coordinates(),
            }
        })
        .collect();

    debug!(
        origin = %origin.guid,
        seeds = pending.len(),
        pool = edges.len(),
        "reconstructing vote route"
    );

    let mut level = 0u32;
    while !pending.is_empty() {
        let ring = pending.len();
        level += 1;
        stats.rings = level;

        for _ in 0..ring {
            let Some(hop) = pending.pop_front() else {
                break;
            };
            stats.dequeues += 1;

            if hop.peer_relay.is_none() {
                stats.unresolved += 1;
                trace!(node = hop.peer, level, "no relay name for hop");
            }
            records.push(hop.into_record(level, seen));

            for edge in pool.drain_touching(hop.peer) {
                if edge.has_peer() {
                    pending.push_back(PendingHop::from_edge(edge, hop.coordinates));
                }
            }
        }
    }

    stats.consumed = pool.consumed();
    debug!(
        origin = %origin.guid,
        records = records.len(),
        rings = stats.rings,
        consumed = stats.consumed,
        "vote route reconstructed"
    );

    Ok(Reconstruction { records, stats })
}
