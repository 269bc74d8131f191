//! Meta nodes: stats, noop, and pluggable UDFs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::chain::NodeRef;
use crate::duration::Duration;
use crate::node_id::NodeId;
use crate::value::FieldValue;

/// Periodic report of another node's internal counters.
///
/// A stats node is wired as an extra source: it has no parent in the data
/// DAG, and the node it observes is carried as a distinct reference,
/// serialized as a synthetic observed→stats edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsNode {
    /// How often counters are emitted.
    pub interval: Duration,
    /// Align emission times to the interval.
    pub align: bool,
    /// The node whose counters are reported.
    #[serde(skip)]
    pub observed: Option<NodeId>,
}

impl Default for StatsNode {
    fn default() -> Self {
        StatsNode {
            interval: Duration::ZERO,
            align: false,
            observed: None,
        }
    }
}

impl StatsNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if !self.interval.is_positive() {
            return Err("a positive interval is required".to_string());
        }
        if self.observed.is_none() {
            return Err("an observed node is required".to_string());
        }
        Ok(())
    }
}

/// Placeholder child inserted under a source that would otherwise have no
/// children, so downstream counters can be accumulated. Never serialized;
/// the decoder re-derives it where the rule demands.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NoopNode {}

/// A generic user-defined function node.
///
/// The engine knows nothing about the function beyond its name and options;
/// data passes through with the parent's edge type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UdfNode {
    /// Registered name of the function.
    pub udf_name: String,
    /// Option values passed to the function process.
    pub options: HashMap<String, Vec<FieldValue>>,
}

impl UdfNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.udf_name.is_empty() {
            return Err("a function name is required".to_string());
        }
        Ok(())
    }
}

impl NodeRef<StatsNode> {
    /// Align emission times to the interval.
    pub fn align(self) -> Self {
        self.mutate(|c| c.align = true)
    }
}

impl NodeRef<UdfNode> {
    /// Pass option `name` with `values` to the function process.
    pub fn option(self, name: &str, values: &[FieldValue]) -> Self {
        let values = values.to_vec();
        self.mutate(|c| {
            c.options.insert(name.to_string(), values);
        })
    }
}
