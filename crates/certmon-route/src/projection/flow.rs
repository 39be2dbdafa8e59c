//! Weighted edge list for flow (sankey) rendering.

use crate::record::Reconstruction;

/// One unit of flow from a parent to a child.
///
/// Repeated hops are kept as parallel edges; nothing is aggregated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
    pub weight: u32,
    pub from_relay: Option<String>,
    pub to_relay: Option<String>,
}

/// Map every non-root record to a weight-1 edge from its parent.
pub fn flow(reconstruction: &Reconstruction) -> Vec<FlowEdge> {
    reconstruction
        .iter()
        .filter_map(|record| {
            let from = record.parent_guid.clone()?;
            Some(FlowEdge {
                from,
                to: record.node_guid.clone(),
                weight: 1,
                from_relay: record.parent_relay.clone(),
                to_relay: record.relay_name.clone(),
            })
        })
        .collect()
}
