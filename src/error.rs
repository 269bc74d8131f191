//! Error taxonomy for pipeline construction and (de)serialization.
//!
//! All failures in this crate are fatal for the pipeline being built or
//! decoded: there is no partial pipeline, and callers are expected to abort
//! the load. The four categories mirror the ways construction can go wrong:
//!
//! - [`Error::Validation`] -- a node's configuration violates its declared
//!   rules (carries the node id, kind label, and a human sentence).
//! - [`Error::Topology`] -- cycles, dangling edges, missing parents, or
//!   arity mismatches.
//! - [`Error::Format`] -- unparseable duration strings, malformed IDs, or
//!   unknown node discriminators on the wire.
//! - [`Error::TypeMismatch`] -- a parent's provided edge type is
//!   incompatible with a child's wanted edge type, or a parent is not of the
//!   expected kind (e.g. a query filter requested on a stream source).
//!
//! The per-node `quiet` flag only affects error visibility at execution
//! time; it never masks any of these construction errors.

use crate::node_id::NodeId;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A fatal pipeline construction or codec error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A node's configuration violates its validation rules.
    #[error("invalid {kind} node {id}: {reason}")]
    Validation {
        /// ID of the offending node.
        id: NodeId,
        /// Kind label (wire discriminator) of the offending node.
        kind: &'static str,
        /// Human-readable description of the violated rule.
        reason: String,
    },

    /// The graph shape is wrong: cycle, dangling edge, or bad arity.
    #[error("invalid pipeline topology: {0}")]
    Topology(String),

    /// The wire payload cannot be understood.
    #[error("malformed pipeline payload: {0}")]
    Format(String),

    /// An edge or parent kind does not line up with what a node consumes.
    #[error("edge type mismatch: {0}")]
    TypeMismatch(String),

    /// An underlying JSON error while encoding or decoding the wire format.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn validation(id: NodeId, kind: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation {
            id,
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn topology(reason: impl Into<String>) -> Self {
        Error::Topology(reason.into())
    }

    pub(crate) fn format(reason: impl Into<String>) -> Self {
        Error::Format(reason.into())
    }

    pub(crate) fn mismatch(reason: impl Into<String>) -> Self {
        Error::TypeMismatch(reason.into())
    }
}
