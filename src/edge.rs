//! Edge types linking pipeline nodes.
//!
//! Every node declares what it consumes (*wants*) and what it emits
//! (*provides*). An edge between a parent and a child is legal only when the
//! parent's `provides` equals the child's `wants`; the single promotion from
//! [`EdgeKind::Stream`] to [`EdgeKind::Batch`] happens inside the window
//! node, never on an edge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of data carried along an edge of the pipeline graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// The node emits nothing further; it is a terminal sink.
    None,
    /// Point-at-a-time data.
    Stream,
    /// Bounded, time-grouped batches of points.
    Batch,
}

impl EdgeKind {
    /// True when a parent providing `self` can feed a child wanting `wants`.
    pub fn feeds(self, wants: EdgeKind) -> bool {
        self != EdgeKind::None && self == wants
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EdgeKind::None => "none",
            EdgeKind::Stream => "stream",
            EdgeKind::Batch => "batch",
        };
        write!(f, "{s}")
    }
}
