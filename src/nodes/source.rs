//! Source nodes and their filters.
//!
//! A pipeline begins at a `stream` or `batch` source. Sources carry no
//! configuration of their own; the first meaningful selection happens in
//! their filters: `from` narrows a stream source by database, retention
//! policy, measurement, and predicate, while `query` attaches a periodic
//! query to a batch source.

use serde::{Deserialize, Serialize};

use crate::chain::NodeRef;
use crate::duration::Duration;
use crate::lambda::Lambda;
use crate::value::{self, Dimension, FillKind};

/// The point-at-a-time source. No configuration; all selection happens in
/// the `from` filters attached below it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSource {}

/// The bounded-group source. No configuration; all selection happens in the
/// `query` filters attached below it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSource {}

/// Stream filter: selects which points from the source enter this branch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FromNode {
    /// Database to select points from; empty means any.
    pub database: String,
    /// Retention policy to select points from; empty means any.
    pub retention_policy: String,
    /// Measurement to select points from; empty means any.
    pub measurement: String,
    /// Predicate applied to each point before it enters the branch.
    #[serde(rename = "where")]
    pub where_expr: Option<Lambda>,
    /// Dimensions to group incoming points by.
    pub group_by: Vec<Dimension>,
    /// Whether the measurement name participates in grouping.
    pub group_by_measurement: bool,
    /// Round point times to this duration; zero disables.
    pub round: Duration,
    /// Truncate point times to this duration; zero disables.
    pub truncate: Duration,
}

impl FromNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        value::validate_dimensions(&self.group_by)?;
        if self.round.is_positive() && self.truncate.is_positive() {
            return Err("cannot both round and truncate point times".to_string());
        }
        Ok(())
    }
}

/// Batch filter: a periodic query run against the data store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryNode {
    /// The query text to execute.
    pub query_str: String,
    /// How much data each query covers.
    pub period: Duration,
    /// How often the query runs; mutually exclusive with `cron`.
    pub every: Duration,
    /// Align query start times to the `every` boundary.
    pub align: bool,
    /// Cron schedule; mutually exclusive with `every`.
    pub cron: String,
    /// Offset applied to the queried time range.
    pub offset: Duration,
    /// Fill option applied to grouped output.
    pub fill: Option<FillKind>,
    /// Dimensions to group the queried data by.
    pub group_by: Vec<Dimension>,
    /// Whether the measurement name participates in grouping.
    pub group_by_measurement: bool,
    /// Named remote cluster to query; empty means the default.
    pub cluster: String,
}

impl QueryNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.query_str.is_empty() {
            return Err("query text is required".to_string());
        }
        if !self.period.is_positive() {
            return Err("query period must be positive".to_string());
        }
        if self.every.is_positive() && !self.cron.is_empty() {
            return Err("cannot schedule by both every and cron".to_string());
        }
        value::validate_dimensions(&self.group_by)
    }
}

impl NodeRef<FromNode> {
    /// Select points from this database.
    pub fn database(self, database: &str) -> Self {
        self.mutate(|c| c.database = database.to_string())
    }

    /// Select points from this retention policy.
    pub fn retention_policy(self, policy: &str) -> Self {
        self.mutate(|c| c.retention_policy = policy.to_string())
    }

    /// Select points from this measurement.
    pub fn measurement(self, measurement: &str) -> Self {
        self.mutate(|c| c.measurement = measurement.to_string())
    }

    /// Filter selected points by a predicate.
    pub fn where_filter(self, predicate: impl Into<Lambda>) -> Self {
        let predicate = predicate.into();
        self.mutate(|c| c.where_expr = Some(predicate))
    }

    /// Group selected points by dimensions.
    pub fn group_by(self, dimensions: &[Dimension]) -> Self {
        let dimensions = dimensions.to_vec();
        self.mutate(|c| c.group_by = dimensions)
    }

    /// Include the measurement name in the group.
    pub fn group_by_measurement(self) -> Self {
        self.mutate(|c| c.group_by_measurement = true)
    }

    /// Round point times to `duration`.
    pub fn round(self, duration: Duration) -> Self {
        self.mutate(|c| c.round = duration)
    }

    /// Truncate point times to `duration`.
    pub fn truncate(self, duration: Duration) -> Self {
        self.mutate(|c| c.truncate = duration)
    }
}

impl NodeRef<QueryNode> {
    /// How much data each query covers.
    pub fn period(self, period: Duration) -> Self {
        self.mutate(|c| c.period = period)
    }

    /// How often the query runs.
    pub fn every(self, every: Duration) -> Self {
        self.mutate(|c| c.every = every)
    }

    /// Align query start times to the `every` boundary.
    pub fn align(self) -> Self {
        self.mutate(|c| c.align = true)
    }

    /// Schedule the query with a cron expression.
    pub fn cron(self, cron: &str) -> Self {
        self.mutate(|c| c.cron = cron.to_string())
    }

    /// Offset the queried time range.
    pub fn offset(self, offset: Duration) -> Self {
        self.mutate(|c| c.offset = offset)
    }

    /// Fill missing grouped values.
    pub fn fill(self, fill: FillKind) -> Self {
        self.mutate(|c| c.fill = Some(fill))
    }

    /// Group the queried data by dimensions.
    pub fn group_by(self, dimensions: &[Dimension]) -> Self {
        let dimensions = dimensions.to_vec();
        self.mutate(|c| c.group_by = dimensions)
    }

    /// Include the measurement name in the group.
    pub fn group_by_measurement(self) -> Self {
        self.mutate(|c| c.group_by_measurement = true)
    }

    /// Query a named remote cluster.
    pub fn cluster(self, cluster: &str) -> Self {
        self.mutate(|c| c.cluster = cluster.to_string())
    }
}
