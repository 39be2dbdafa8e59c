//! Vote Route Reconstruction
//!
//! Rebuilds the path a consensus vote took through the relay mesh from
//! noisy pairwise connection telemetry, and shapes the result for three
//! kinds of chart.
//!
//! # Model
//!
//! - **ConnectionEdge**: one observed link between two nodes. The same
//!   physical link may appear mirrored, duplicated, or half-filled.
//! - **OriginObservation**: the seed vote, always hop level 0.
//! - **PropagationRecord**: one placement of a node in the spread graph.
//!
//! # Reconstruction
//!
//! A breadth-first walk that consumes connection rows as it goes. Each row
//! is used at most once, which both bounds the walk and suppresses cycles
//! without a visited set. See [`reconstruct`].
//!
//! # Projections
//!
//! - **Tree**: parent-pointer rows for an org chart
//! - **Flow**: weight-1 edges for a sankey diagram
//! - **Geo**: map markers plus hop polylines
//!
//! ```
//! use certmon_route::{reconstruct, project, ConnectionEdge, GraphStyle, OriginObservation, Projection, SeenRelays};
//!
//! let edges = vec![ConnectionEdge::new("n1", "n2"), ConnectionEdge::new("n2", "n3")];
//! let origin = OriginObservation::with_links("n1", vec![ConnectionEdge::new("n1", "n2")]);
//!
//! let route = reconstruct(&edges, Some(&origin), &SeenRelays::new()).unwrap();
//! assert_eq!(route.len(), 3);
//!
//! match project(GraphStyle::Flow, &route) {
//!     Projection::Flow(edges) => assert_eq!(edges.len(), 2),
//!     _ => unreachable!(),
//! }
//! ```

mod edge;
mod error;
mod reconstruct;
mod record;
pub mod projection;

pub use edge::{ConnectionEdge, Coordinates, OriginObservation, MAX_ABS_LONGITUDE};
pub use error::{Result, RouteError};
pub use reconstruct::{reconstruct, resolve_relays, ResolvedRelays};
pub use record::{PropagationRecord, ReconstructStats, Reconstruction, SeenRelays};
pub use projection::{project, GraphStyle, Projection};

#[cfg(test)]
mod tests {
    use super::*;
    use projection::TreeNode;

    fn tree_of(edges: &[ConnectionEdge], origin: &OriginObservation) -> Vec<TreeNode> {
        let route = reconstruct(edges, Some(origin), &SeenRelays::new()).unwrap();
        match project(GraphStyle::Tree, &route) {
            Projection::Tree(nodes) => nodes,
            other => panic!("expected tree, got {:?}", other.style()),
        }
    }

    #[test]
    fn chain_scenario_orders_root_child_grandchild() {
        let edges = vec![ConnectionEdge::new("n1", "n2"), ConnectionEdge::new("n2", "n3")];
        let origin = OriginObservation::with_links("n1", vec![ConnectionEdge::new("n1", "n2")]);
        let nodes = tree_of(&edges, &origin);

        let placed: Vec<(&str, u32)> = nodes.iter().map(|n| (n.id.as_str(), n.level)).collect();
        assert_eq!(placed, vec![("n1", 0), ("n2", 1), ("n3", 2)]);
    }

    #[test]
    fn empty_pool_and_empty_peer_is_root_only() {
        let origin = OriginObservation::stub("n1", "n1");
        let nodes = tree_of(&[], &origin);

        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id, "n1");
        assert_eq!(nodes[0].parent, None);
    }

    #[test]
    fn projection_reports_its_style() {
        let origin = OriginObservation::stub("n1", "n1");
        let route = reconstruct(&[], Some(&origin), &SeenRelays::new()).unwrap();
        for style in [GraphStyle::Tree, GraphStyle::Flow, GraphStyle::Geo] {
            assert_eq!(project(style, &route).style(), style);
        }
    }
}
