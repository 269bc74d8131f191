//! Single-parent transform nodes.
//!
//! Everything here consumes one upstream edge and, with the exception of
//! `window` (the sole stream-to-batch promoter), provides the same edge type
//! it wants. Each struct is the node's wire schema; validation rules run
//! once construction finishes, never from the property setters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::chain::NodeRef;
use crate::duration::Duration;
use crate::lambda::Lambda;
use crate::value::{self, Dimension, FieldValue};

/// Filter points or batches by a predicate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WhereNode {
    /// The predicate; points for which it is false are dropped.
    pub lambda: Lambda,
}

impl WhereNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.lambda.expression.is_empty() {
            return Err("a predicate expression is required".to_string());
        }
        Ok(())
    }
}

/// Set field and tag values where they are missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefaultNode {
    /// Default values for fields; applied when the field is absent.
    pub fields: HashMap<String, FieldValue>,
    /// Default values for tags; applied when the tag is absent.
    pub tags: HashMap<String, String>,
}

impl DefaultNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        non_empty_keys(&self.fields, &self.tags)
    }
}

/// Remove fields and tags from passing data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteNode {
    /// Field names to remove.
    pub fields: Vec<String>,
    /// Tag names to remove.
    pub tags: Vec<String>,
}

impl DeleteNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.fields.iter().chain(self.tags.iter()).any(String::is_empty) {
            return Err("field and tag names must not be empty".to_string());
        }
        Ok(())
    }
}

/// Buffer a stream into bounded batches.
///
/// The window is sized either by wall time (`period`/`every`) or by point
/// count (`period_count`/`every_count`); the two modes cannot be combined.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowNode {
    /// Wall-time span of each emitted batch.
    pub period: Duration,
    /// How often a batch is emitted.
    pub every: Duration,
    /// Align window boundaries to the `every` interval.
    pub align: bool,
    /// Wait for a whole period before the first emit.
    pub fill_period: bool,
    /// Number of points per batch; enables count mode when positive.
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub period_count: i64,
    /// Emit frequency in points for count mode.
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub every_count: i64,
}

impl WindowNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.period_count != 0 && !self.period.is_zero() {
            return Err("cannot use both period and periodCount".to_string());
        }
        if self.period_count != 0 && self.align {
            return Err("align is not supported with periodCount".to_string());
        }
        if self.period_count > 0 && self.every_count <= 0 {
            return Err("everyCount must be positive when using periodCount".to_string());
        }
        Ok(())
    }
}

/// Keep one point out of every N, or one per duration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SampleNode {
    /// Keep every Nth point; exclusive with `every`.
    #[serde(deserialize_with = "crate::value::de_i64")]
    pub count: i64,
    /// Keep one point per duration; exclusive with `count`.
    pub every: Duration,
}

impl SampleNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        let by_count = self.count > 0;
        let by_time = self.every.is_positive();
        if by_count == by_time {
            return Err("exactly one of count or every must be set".to_string());
        }
        Ok(())
    }
}

/// Shift point times by a fixed offset (possibly negative).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShiftNode {
    /// The offset added to every point time.
    pub shift: Duration,
}

impl ShiftNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.shift.is_zero() {
            return Err("shift duration must not be zero".to_string());
        }
        Ok(())
    }
}

/// Compute a rate of change of a field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DerivativeNode {
    /// The field to differentiate.
    pub field: String,
    /// Output field name; empty keeps the input field name.
    #[serde(rename = "as")]
    pub alias: String,
    /// The time unit the rate is expressed in.
    pub unit: Duration,
    /// Suppress negative results (counter resets).
    pub non_negative: bool,
}

impl Default for DerivativeNode {
    fn default() -> Self {
        DerivativeNode {
            field: String::new(),
            alias: String::new(),
            unit: Duration::seconds(1),
            non_negative: false,
        }
    }
}

impl DerivativeNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.field.is_empty() {
            return Err("a field to differentiate is required".to_string());
        }
        if !self.unit.is_positive() {
            return Err("unit must be positive".to_string());
        }
        Ok(())
    }
}

/// Emit points only when one of the watched fields changes value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangeDetectNode {
    /// The fields whose changes are watched.
    pub fields: Vec<String>,
}

impl ChangeDetectNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.fields.is_empty() {
            return Err("at least one field is required".to_string());
        }
        if self.fields.iter().any(String::is_empty) {
            return Err("field names must not be empty".to_string());
        }
        Ok(())
    }
}

/// Log passing data at a configurable level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogNode {
    /// Log level; one of DEBUG, INFO, WARN, ERROR.
    pub level: String,
    /// Optional prefix prepended to each logged line.
    pub prefix: String,
}

impl Default for LogNode {
    fn default() -> Self {
        LogNode {
            level: "INFO".to_string(),
            prefix: String::new(),
        }
    }
}

impl LogNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        match self.level.as_str() {
            "DEBUG" | "INFO" | "WARN" | "ERROR" => Ok(()),
            other => Err(format!("invalid log level {other:?}")),
        }
    }
}

/// Emit barrier markers when data goes idle or on a fixed period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BarrierNode {
    /// Emit a barrier after this much inactivity; exclusive with `period`.
    pub idle: Duration,
    /// Emit a barrier on this fixed period; exclusive with `idle`.
    pub period: Duration,
    /// Delete the group state when the barrier fires.
    pub delete: bool,
}

impl BarrierNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        let idle = self.idle.is_positive();
        let period = self.period.is_positive();
        if idle == period {
            return Err("exactly one of idle or period must be set".to_string());
        }
        Ok(())
    }
}

/// Flatten points on a set of tags into fields of a single point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlattenNode {
    /// Tags whose values are folded into field names.
    pub on: Vec<String>,
    /// Joins tag values and field names; may be empty.
    pub delimiter: String,
    /// Points within this tolerance are flattened together.
    pub tolerance: Duration,
    /// Drop the original field name from the flattened name.
    pub drop_original_field_name: bool,
}

impl Default for FlattenNode {
    fn default() -> Self {
        FlattenNode {
            on: Vec::new(),
            delimiter: ".".to_string(),
            tolerance: Duration::ZERO,
            drop_original_field_name: false,
        }
    }
}

impl FlattenNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.on.is_empty() {
            return Err("at least one tag to flatten on is required".to_string());
        }
        Ok(())
    }
}

/// Load fields and tags from an external ordered source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SideloadNode {
    /// Location of the sideload source.
    pub source: String,
    /// Ordered search path of keys within the source.
    pub order: Vec<String>,
    /// Fields to sideload with their default values.
    pub fields: HashMap<String, FieldValue>,
    /// Tags to sideload with their default values.
    pub tags: HashMap<String, String>,
}

impl SideloadNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.source.is_empty() {
            return Err("a sideload source is required".to_string());
        }
        non_empty_keys(&self.fields, &self.tags)
    }
}

/// Track how long a predicate has been true, as a field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateDurationNode {
    /// The state predicate.
    pub lambda: Lambda,
    /// Output field name.
    #[serde(rename = "as")]
    pub alias: String,
    /// The unit the duration is reported in.
    pub unit: Duration,
}

impl Default for StateDurationNode {
    fn default() -> Self {
        StateDurationNode {
            lambda: Lambda::default(),
            alias: "state_duration".to_string(),
            unit: Duration::seconds(1),
        }
    }
}

impl StateDurationNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.lambda.expression.is_empty() {
            return Err("a state predicate is required".to_string());
        }
        if self.alias.is_empty() {
            return Err("an output field name is required".to_string());
        }
        if !self.unit.is_positive() {
            return Err("unit must be positive".to_string());
        }
        Ok(())
    }
}

/// Count consecutive points for which a predicate is true.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateCountNode {
    /// The state predicate.
    pub lambda: Lambda,
    /// Output field name.
    #[serde(rename = "as")]
    pub alias: String,
}

impl Default for StateCountNode {
    fn default() -> Self {
        StateCountNode {
            lambda: Lambda::default(),
            alias: "state_count".to_string(),
        }
    }
}

impl StateCountNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.lambda.expression.is_empty() {
            return Err("a state predicate is required".to_string());
        }
        if self.alias.is_empty() {
            return Err("an output field name is required".to_string());
        }
        Ok(())
    }
}

/// Evaluate expressions over each point, producing new fields or tags.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvalNode {
    /// The expressions, evaluated in order.
    pub lambdas: Vec<Lambda>,
    /// Result names, one per expression.
    #[serde(rename = "as")]
    pub alias: Vec<String>,
    /// Result names written as tags instead of fields.
    pub tags: Vec<String>,
    /// Keep the original fields alongside the results.
    pub keep: bool,
    /// When `keep` is set, restrict kept fields to this list.
    pub keep_fields: Vec<String>,
    /// Suppress evaluation errors at execution time.
    pub quiet: bool,
}

impl EvalNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.lambdas.is_empty() {
            return Err("at least one expression is required".to_string());
        }
        if self.alias.len() != self.lambdas.len() {
            return Err(format!(
                "got {} result names for {} expressions",
                self.alias.len(),
                self.lambdas.len()
            ));
        }
        for tag in &self.tags {
            if !self.alias.contains(tag) {
                return Err(format!("tag {tag:?} is not a result name"));
            }
        }
        Ok(())
    }
}

/// Group points by a set of dimensions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupByNode {
    /// The grouping dimensions, or the star marker for all.
    pub dimensions: Vec<Dimension>,
    /// Whether the measurement name participates in grouping.
    pub by_measurement: bool,
    /// Dimensions excluded when grouping by star.
    pub exclude: Vec<String>,
}

impl GroupByNode {
    pub(crate) fn validate(&self) -> Result<(), String> {
        value::validate_dimensions(&self.dimensions)
    }
}

/// Shared check for the field/tag override maps used by `default` and
/// `sideload`.
fn non_empty_keys(
    fields: &HashMap<String, FieldValue>,
    tags: &HashMap<String, String>,
) -> Result<(), String> {
    if fields.keys().any(|k| k.is_empty()) {
        return Err("field names must not be empty".to_string());
    }
    if tags.keys().any(|k| k.is_empty()) {
        return Err("tag names must not be empty".to_string());
    }
    Ok(())
}

impl NodeRef<DefaultNode> {
    /// Default `field` to `value` when absent.
    pub fn field(self, name: &str, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        self.mutate(|c| {
            c.fields.insert(name.to_string(), value);
        })
    }

    /// Default `tag` to `value` when absent.
    pub fn tag(self, name: &str, value: &str) -> Self {
        self.mutate(|c| {
            c.tags.insert(name.to_string(), value.to_string());
        })
    }
}

impl NodeRef<DeleteNode> {
    /// Remove `field` from passing data.
    pub fn field(self, name: &str) -> Self {
        self.mutate(|c| c.fields.push(name.to_string()))
    }

    /// Remove `tag` from passing data.
    pub fn tag(self, name: &str) -> Self {
        self.mutate(|c| c.tags.push(name.to_string()))
    }
}

impl NodeRef<WindowNode> {
    /// Wall-time span of each batch.
    pub fn period(self, period: Duration) -> Self {
        self.mutate(|c| c.period = period)
    }

    /// How often a batch is emitted.
    pub fn every(self, every: Duration) -> Self {
        self.mutate(|c| c.every = every)
    }

    /// Align window boundaries to the `every` interval.
    pub fn align(self) -> Self {
        self.mutate(|c| c.align = true)
    }

    /// Wait for a whole period before the first emit.
    pub fn fill_period(self) -> Self {
        self.mutate(|c| c.fill_period = true)
    }

    /// Size batches by point count instead of time.
    pub fn period_count(self, count: i64) -> Self {
        self.mutate(|c| c.period_count = count)
    }

    /// Emit frequency in points for count mode.
    pub fn every_count(self, count: i64) -> Self {
        self.mutate(|c| c.every_count = count)
    }
}

impl NodeRef<DerivativeNode> {
    /// Name the output field.
    pub fn alias(self, name: &str) -> Self {
        self.mutate(|c| c.alias = name.to_string())
    }

    /// The time unit the rate is expressed in.
    pub fn unit(self, unit: Duration) -> Self {
        self.mutate(|c| c.unit = unit)
    }

    /// Suppress negative results.
    pub fn non_negative(self) -> Self {
        self.mutate(|c| c.non_negative = true)
    }
}

impl NodeRef<LogNode> {
    /// Log at `level` (DEBUG, INFO, WARN, or ERROR).
    pub fn level(self, level: &str) -> Self {
        self.mutate(|c| c.level = level.to_string())
    }

    /// Prefix each logged line.
    pub fn prefix(self, prefix: &str) -> Self {
        self.mutate(|c| c.prefix = prefix.to_string())
    }
}

impl NodeRef<BarrierNode> {
    /// Emit a barrier after this much inactivity.
    pub fn idle(self, idle: Duration) -> Self {
        self.mutate(|c| c.idle = idle)
    }

    /// Emit a barrier on this fixed period.
    pub fn period(self, period: Duration) -> Self {
        self.mutate(|c| c.period = period)
    }

    /// Delete the group state when the barrier fires.
    pub fn delete(self, delete: bool) -> Self {
        self.mutate(|c| c.delete = delete)
    }
}

impl NodeRef<FlattenNode> {
    /// Tags whose values are folded into field names.
    pub fn on(self, tags: &[&str]) -> Self {
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        self.mutate(|c| c.on = tags)
    }

    /// Join tag values and field names with `delimiter`.
    pub fn delimiter(self, delimiter: &str) -> Self {
        self.mutate(|c| c.delimiter = delimiter.to_string())
    }

    /// Flatten points within this tolerance together.
    pub fn tolerance(self, tolerance: Duration) -> Self {
        self.mutate(|c| c.tolerance = tolerance)
    }

    /// Drop the original field name from the flattened name.
    pub fn drop_original_field_name(self) -> Self {
        self.mutate(|c| c.drop_original_field_name = true)
    }
}

impl NodeRef<SideloadNode> {
    /// Ordered search path of keys within the source.
    pub fn order(self, order: &[&str]) -> Self {
        let order: Vec<String> = order.iter().map(|o| o.to_string()).collect();
        self.mutate(|c| c.order = order)
    }

    /// Sideload `field`, defaulting to `value`.
    pub fn field(self, name: &str, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        self.mutate(|c| {
            c.fields.insert(name.to_string(), value);
        })
    }

    /// Sideload `tag`, defaulting to `value`.
    pub fn tag(self, name: &str, value: &str) -> Self {
        self.mutate(|c| {
            c.tags.insert(name.to_string(), value.to_string());
        })
    }
}

impl NodeRef<StateDurationNode> {
    /// Name the output field.
    pub fn alias(self, name: &str) -> Self {
        self.mutate(|c| c.alias = name.to_string())
    }

    /// The unit the duration is reported in.
    pub fn unit(self, unit: Duration) -> Self {
        self.mutate(|c| c.unit = unit)
    }
}

impl NodeRef<StateCountNode> {
    /// Name the output field.
    pub fn alias(self, name: &str) -> Self {
        self.mutate(|c| c.alias = name.to_string())
    }
}

impl NodeRef<EvalNode> {
    /// Name the results, one per expression.
    pub fn alias(self, names: &[&str]) -> Self {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        self.mutate(|c| c.alias = names)
    }

    /// Write these results as tags instead of fields.
    pub fn tags(self, names: &[&str]) -> Self {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        self.mutate(|c| c.tags = names)
    }

    /// Keep the original fields alongside the results.
    pub fn keep(self) -> Self {
        self.mutate(|c| c.keep = true)
    }

    /// Keep only these original fields.
    pub fn keep_fields(self, fields: &[&str]) -> Self {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        self.mutate(|c| {
            c.keep = true;
            c.keep_fields = fields;
        })
    }

    /// Suppress evaluation errors at execution time.
    pub fn quiet(self) -> Self {
        self.mutate(|c| c.quiet = true)
    }
}

impl NodeRef<GroupByNode> {
    /// Include the measurement name in the group.
    pub fn by_measurement(self) -> Self {
        self.mutate(|c| c.by_measurement = true)
    }

    /// Exclude dimensions when grouping by star.
    pub fn exclude(self, dimensions: &[&str]) -> Self {
        let dimensions: Vec<String> = dimensions.iter().map(|d| d.to_string()).collect();
        self.mutate(|c| c.exclude = dimensions)
    }
}
