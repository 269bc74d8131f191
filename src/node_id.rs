//! Lightweight unique identifier for nodes within a [`Pipeline`](crate::pipeline::Pipeline).
//!
//! Each [`Node`](crate::node::Node) added to the pipeline graph is assigned a
//! sequential `NodeId` that never changes for the lifetime of the pipeline.
//! IDs are what the wire format, the DOT export, and the stats "observed"
//! relation use to refer to nodes, so they must survive a marshal/unmarshal
//! round trip intact.
//!
//! They're small, `Copy`, hashable, and ordered, so they can be used
//! efficiently as keys in maps or sets when snapshotting or traversing the
//! graph. On the wire an ID is a decimal string (safe for consumers whose
//! JSON numbers cannot carry 64 bits).

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Unique numeric identifier for a node in a pipeline graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a new `NodeId` (used internally by the pipeline and the codec).
    pub(crate) fn new(v: u64) -> Self {
        Self(v)
    }

    /// Return the underlying numeric value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(NodeId)
            .map_err(|_| Error::format(format!("invalid node id {s:?}")))
    }
}
