//! Round and authenticator statistics derived from certificate sightings.
//!
//! An authenticator's distribution in a round is the share of reporting
//! relays whose certificate included it: 1.0 means every relay saw it.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use crate::error::Result;
use crate::model::{AuthenticatorSighting, RoundInfo};
use crate::store::TelemetryStore;

/// Rounds shown on the dashboard.
pub const DASHBOARD_ROUNDS: usize = 20;

/// Rounds kept in one authenticator's history.
pub const AUTH_HISTORY_ROUNDS: usize = 256;

/// How widely one authenticator was seen in one round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthDistribution {
    pub round: u64,
    pub auth: String,
    pub dist: f64,
}

/// How many authenticators one relay's certificate listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundRelay {
    pub round: u64,
    pub relay: String,
    pub auth_count: usize,
}

/// One authenticator across recent rounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthenticatorHistory {
    pub auth: String,
    /// Newest round first
    pub rounds: Vec<AuthDistribution>,
    pub average: f64,
}

/// Relay by authenticator membership for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayAuthMatrix {
    pub round: u64,
    /// Sorted by name
    pub relays: Vec<String>,
    /// Most widely seen first
    pub auths: Vec<String>,
    /// `(relay, auth)` pairs that were sighted
    pub pairs: Vec<(String, String)>,
}

/// Sort direction for distribution listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Distribution of every authenticator sighted in `round`.
///
/// Duplicate sightings of the same (relay, auth) pair count once.
pub fn distribution(sightings: &[AuthenticatorSighting], round: u64, order: Order) -> Vec<AuthDistribution> {
    let pairs: HashSet<(&str, &str)> = sightings
        .iter()
        .filter(|s| s.round == round)
        .map(|s| (s.relay.as_str(), s.auth.as_str()))
        .collect();
    let relay_count = pairs.iter().map(|(relay, _)| *relay).collect::<HashSet<_>>().len();
    if relay_count == 0 {
        return Vec::new();
    }

    let mut per_auth: BTreeMap<&str, usize> = BTreeMap::new();
    for &(_, auth) in &pairs {
        *per_auth.entry(auth).or_default() += 1;
    }

    let mut out: Vec<AuthDistribution> = per_auth
        .into_iter()
        .map(|(auth, count)| AuthDistribution {
            round,
            auth: auth.to_string(),
            dist: count as f64 / relay_count as f64,
        })
        .collect();

    // Ties keep name order in both directions.
    out.sort_by(|a, b| {
        let by_dist = a.dist.partial_cmp(&b.dist).unwrap_or(Ordering::Equal);
        let by_dist = match order {
            Order::Ascending => by_dist,
            Order::Descending => by_dist.reverse(),
        };
        by_dist.then_with(|| a.auth.cmp(&b.auth))
    });
    out
}

/// Authenticator counts per relay for `round`, sorted by relay.
pub fn round_relays(sightings: &[AuthenticatorSighting], round: u64) -> Vec<RoundRelay> {
    let mut per_relay: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for s in sightings.iter().filter(|s| s.round == round) {
        per_relay.entry(s.relay.as_str()).or_default().insert(s.auth.as_str());
    }
    per_relay
        .into_iter()
        .map(|(relay, auths)| RoundRelay {
            round,
            relay: relay.to_string(),
            auth_count: auths.len(),
        })
        .collect()
}

/// Summary row derived from sightings alone.
pub fn derive_round_info(sightings: &[AuthenticatorSighting], round: u64) -> RoundInfo {
    let in_round = || sightings.iter().filter(move |s| s.round == round);
    RoundInfo {
        round,
        relay_count: in_round().map(|s| &s.relay).collect::<HashSet<_>>().len(),
        auth_count: in_round().map(|s| &s.auth).collect::<HashSet<_>>().len(),
        period: 0,
        step: 0,
    }
}

/// Relay/authenticator matrix for `round`.
pub fn relay_auth_matrix(sightings: &[AuthenticatorSighting], round: u64) -> RelayAuthMatrix {
    let relays: BTreeSet<&str> = sightings
        .iter()
        .filter(|s| s.round == round)
        .map(|s| s.relay.as_str())
        .collect();
    let pairs: BTreeSet<(&str, &str)> = sightings
        .iter()
        .filter(|s| s.round == round)
        .map(|s| (s.relay.as_str(), s.auth.as_str()))
        .collect();

    RelayAuthMatrix {
        round,
        relays: relays.into_iter().map(str::to_string).collect(),
        auths: distribution(sightings, round, Order::Descending)
            .into_iter()
            .map(|d| d.auth)
            .collect(),
        pairs: pairs
            .into_iter()
            .map(|(relay, auth)| (relay.to_string(), auth.to_string()))
            .collect(),
    }
}

// --- Store-backed views ---

/// Per-round authenticator listing, least seen first.
pub fn round_authenticators(store: &dyn TelemetryStore, round: u64) -> Result<Vec<AuthDistribution>> {
    Ok(distribution(&store.sightings(round)?, round, Order::Ascending))
}

/// Per-round relay listing.
pub fn round_relay_listing(store: &dyn TelemetryStore, round: u64) -> Result<Vec<RoundRelay>> {
    Ok(round_relays(&store.sightings(round)?, round))
}

/// Donut chart data for one round.
pub fn round_matrix(store: &dyn TelemetryStore, round: u64) -> Result<RelayAuthMatrix> {
    Ok(relay_auth_matrix(&store.sightings(round)?, round))
}

/// The most recent rounds, newest first.
///
/// Explicit summary rows win; rounds only known from sightings are derived.
pub fn recent_rounds(store: &dyn TelemetryStore, limit: usize) -> Result<Vec<RoundInfo>> {
    let mut rounds: BTreeMap<u64, RoundInfo> = BTreeMap::new();
    for round in store.sighted_rounds()? {
        rounds.insert(round, derive_round_info(&store.sightings(round)?, round));
    }
    for info in store.round_info()? {
        rounds.insert(info.round, info);
    }
    Ok(rounds.into_values().rev().take(limit).collect())
}

/// One authenticator's distribution over recent rounds, newest first.
pub fn authenticator_history(store: &dyn TelemetryStore, auth: &str) -> Result<AuthenticatorHistory> {
    let mut rounds = Vec::new();
    for round in store.sighted_rounds()?.into_iter().rev() {
        if rounds.len() >= AUTH_HISTORY_ROUNDS {
            break;
        }
        let sightings = store.sightings(round)?;
        if let Some(entry) = distribution(&sightings, round, Order::Ascending)
            .into_iter()
            .find(|d| d.auth == auth)
        {
            rounds.push(entry);
        }
    }

    let average = if rounds.is_empty() {
        0.0
    } else {
        rounds.iter().map(|d| d.dist).sum::<f64>() / rounds.len() as f64
    };

    Ok(AuthenticatorHistory {
        auth: auth.to_string(),
        rounds,
        average,
    })
}
