//! Output adapters that shape a reconstruction for a chart.
//!
//! Each emitter is a pure mapping over the ordered records; none of them
//! influences traversal.

mod flow;
mod geo;
mod tree;

use std::fmt;
use std::str::FromStr;

use crate::error::RouteError;
use crate::record::Reconstruction;

pub use flow::{flow, FlowEdge};
pub use geo::{geo, GeoMarker, GeoSegment, GeoView};
pub use tree::{tree, TreeNode, ORIGIN_TOOLTIP, FLOW_TOOLTIP};

/// Which chart a route is drawn as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GraphStyle {
    /// Hierarchical org chart
    #[default]
    Tree,
    /// Weighted flow diagram
    Flow,
    /// Map with hop markers and polylines
    Geo,
}

impl GraphStyle {
    /// Map the numeric selector used by dashboard links.
    pub fn from_selector(selector: u8) -> Result<Self, RouteError> {
        match selector {
            0 => Ok(GraphStyle::Tree),
            1 => Ok(GraphStyle::Flow),
            2 => Ok(GraphStyle::Geo),
            other => Err(RouteError::UnknownGraphStyle(other.to_string())),
        }
    }

    pub const fn selector(&self) -> u8 {
        match self {
            GraphStyle::Tree => 0,
            GraphStyle::Flow => 1,
            GraphStyle::Geo => 2,
        }
    }
}

impl FromStr for GraphStyle {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "0" | "tree" => Ok(GraphStyle::Tree),
            "1" | "flow" | "sankey" => Ok(GraphStyle::Flow),
            "2" | "geo" | "map" => Ok(GraphStyle::Geo),
            other => Err(RouteError::UnknownGraphStyle(other.to_string())),
        }
    }
}

impl fmt::Display for GraphStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GraphStyle::Tree => "tree",
            GraphStyle::Flow => "flow",
            GraphStyle::Geo => "geo",
        };
        f.write_str(name)
    }
}

/// A route shaped for one chart type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "style", content = "data", rename_all = "snake_case"))]
pub enum Projection {
    Tree(Vec<TreeNode>),
    Flow(Vec<FlowEdge>),
    Geo(GeoView),
}

impl Projection {
    pub fn style(&self) -> GraphStyle {
        match self {
            Projection::Tree(_) => GraphStyle::Tree,
            Projection::Flow(_) => GraphStyle::Flow,
            Projection::Geo(_) => GraphStyle::Geo,
        }
    }
}

/// Run the emitter for `style`.
pub fn project(style: GraphStyle, reconstruction: &Reconstruction) -> Projection {
    match style {
        GraphStyle::Tree => Projection::Tree(tree(reconstruction)),
        GraphStyle::Flow => Projection::Flow(flow(reconstruction)),
        GraphStyle::Geo => Projection::Geo(geo(reconstruction)),
    }
}
