//! Multi-parent and self-combining nodes.
//!
//! `union` merges any number of same-typed branches, `join` pairs points
//! across branches by time and group, and `combine` pairs points from a
//! single stream with themselves. Join and combine share the prefix rules:
//! one prefix per joined side, unique, and free of the delimiter.

use serde::{Deserialize, Serialize};

use crate::chain::NodeRef;
use crate::duration::Duration;
use crate::lambda::Lambda;
use crate::value::FillKind;

/// Merge multiple same-typed branches into one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnionNode {
    /// Rename the merged data; empty keeps each point's original name.
    pub rename: String,
}

impl UnionNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Join points from multiple branches by time and group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinNode {
    /// Tag dimensions the join is performed on.
    pub on: Vec<String>,
    /// Field-name prefixes, one per joined parent.
    #[serde(rename = "as")]
    pub as_prefixes: Vec<String>,
    /// Points within this tolerance join together.
    pub tolerance: Duration,
    /// Fill behavior for missing sides.
    pub fill: Option<FillKind>,
    /// Measurement name of the joined data; empty keeps the left name.
    pub stream_name: String,
    /// Joins prefixes and field names.
    pub delimiter: String,
}

impl Default for JoinNode {
    fn default() -> Self {
        JoinNode {
            on: Vec::new(),
            as_prefixes: Vec::new(),
            tolerance: Duration::ZERO,
            fill: None,
            stream_name: String::new(),
            delimiter: ".".to_string(),
        }
    }
}

impl JoinNode {
    pub(crate) fn validate(&self, parents: usize) -> Result<(), String> {
        if self.as_prefixes.len() != parents {
            return Err(format!(
                "got {} prefixes for {} joined parents",
                self.as_prefixes.len(),
                parents
            ));
        }
        check_prefixes(&self.as_prefixes, &self.delimiter)
    }
}

/// Pair points from a single stream with themselves by time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CombineNode {
    /// One predicate per combined point; a pairing is emitted when all
    /// predicates match distinct points.
    pub lambdas: Vec<Lambda>,
    /// Field-name prefixes, one per predicate.
    #[serde(rename = "as")]
    pub as_prefixes: Vec<String>,
    /// Joins prefixes and field names. May be empty, in which case the
    /// caller is responsible for avoiding field name collisions.
    pub delimiter: String,
    /// Points within this tolerance are considered simultaneous.
    pub tolerance: Duration,
    /// Maximum number of pairings emitted per time; zero means no limit.
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub max: i64,
}

impl Default for CombineNode {
    fn default() -> Self {
        CombineNode {
            lambdas: Vec::new(),
            as_prefixes: Vec::new(),
            delimiter: ".".to_string(),
            tolerance: Duration::ZERO,
            max: 0,
        }
    }
}

impl CombineNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.lambdas.len() < 2 {
            return Err("at least two expressions are required".to_string());
        }
        if self.as_prefixes.len() != self.lambdas.len() {
            return Err(format!(
                "got {} prefixes for {} expressions",
                self.as_prefixes.len(),
                self.lambdas.len()
            ));
        }
        check_prefixes(&self.as_prefixes, &self.delimiter)
    }
}

/// Prefixes must be unique and, when a delimiter is set, free of it.
fn check_prefixes(prefixes: &[String], delimiter: &str) -> Result<(), String> {
    for (i, prefix) in prefixes.iter().enumerate() {
        if !delimiter.is_empty() && prefix.contains(delimiter) {
            return Err(format!(
                "prefix {prefix:?} must not contain the delimiter {delimiter:?}"
            ));
        }
        if prefixes[..i].contains(prefix) {
            return Err(format!("duplicate prefix {prefix:?}"));
        }
    }
    Ok(())
}

impl NodeRef<UnionNode> {
    /// Rename the merged data.
    pub fn rename(self, name: &str) -> Self {
        self.mutate(|c| c.rename = name.to_string())
    }
}

impl NodeRef<JoinNode> {
    /// Join on these tag dimensions.
    pub fn on(self, dimensions: &[&str]) -> Self {
        let dimensions: Vec<String> = dimensions.iter().map(|d| d.to_string()).collect();
        self.mutate(|c| c.on = dimensions)
    }

    /// Prefix each joined side's fields, one prefix per parent.
    pub fn as_names(self, prefixes: &[&str]) -> Self {
        let prefixes: Vec<String> = prefixes.iter().map(|p| p.to_string()).collect();
        self.mutate(|c| c.as_prefixes = prefixes)
    }

    /// Join points within this tolerance together.
    pub fn tolerance(self, tolerance: Duration) -> Self {
        self.mutate(|c| c.tolerance = tolerance)
    }

    /// Fill behavior for missing sides.
    pub fn fill(self, fill: FillKind) -> Self {
        self.mutate(|c| c.fill = Some(fill))
    }

    /// Measurement name of the joined data.
    pub fn stream_name(self, name: &str) -> Self {
        self.mutate(|c| c.stream_name = name.to_string())
    }

    /// Join prefixes and field names with `delimiter`.
    pub fn delimiter(self, delimiter: &str) -> Self {
        self.mutate(|c| c.delimiter = delimiter.to_string())
    }
}

impl NodeRef<CombineNode> {
    /// Prefix each combined point's fields, one prefix per expression.
    pub fn as_names(self, prefixes: &[&str]) -> Self {
        let prefixes: Vec<String> = prefixes.iter().map(|p| p.to_string()).collect();
        self.mutate(|c| c.as_prefixes = prefixes)
    }

    /// Join prefixes and field names with `delimiter`. May be empty; the
    /// caller then owns collision avoidance.
    pub fn delimiter(self, delimiter: &str) -> Self {
        self.mutate(|c| c.delimiter = delimiter.to_string())
    }

    /// Consider points within this tolerance simultaneous.
    pub fn tolerance(self, tolerance: Duration) -> Self {
        self.mutate(|c| c.tolerance = tolerance)
    }

    /// Limit the number of pairings emitted per time.
    pub fn max(self, max: i64) -> Self {
        self.mutate(|c| c.max = max)
    }
}
