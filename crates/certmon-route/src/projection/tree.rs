//! Parent-pointer tree for org-chart rendering.

use crate::record::Reconstruction;

/// Tooltip shown on the origin node.
pub const ORIGIN_TOOLTIP: &str = "Vote Origin";

/// Tooltip shown on every relayed hop.
pub const FLOW_TOOLTIP: &str = "Vote Flow";

/// One org-chart row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeNode {
    pub id: String,
    /// `None` for the origin
    pub parent: Option<String>,
    pub name: String,
    pub relay: Option<String>,
    pub level: u32,
    pub tooltip: String,
    /// Highlighted: relay reported the vote's authenticator
    pub seen: bool,
}

/// Map records to org-chart rows, preserving order.
pub fn tree(reconstruction: &Reconstruction) -> Vec<TreeNode> {
    reconstruction
        .iter()
        .map(|record| TreeNode {
            id: record.node_guid.clone(),
            parent: record.parent_guid.clone(),
            name: record.node_name.clone(),
            relay: record.relay_name.clone().filter(|r| !r.is_empty()),
            level: record.level,
            tooltip: (if record.is_root() { ORIGIN_TOOLTIP } else { FLOW_TOOLTIP }).to_string(),
            seen: record.seen,
        })
        .collect()
}
