//! The InfluxQL-style aggregation family.
//!
//! All twenty-one reducers share one node shape: a target field, an optional
//! output alias, and the use-point-times flag. The parametrized members
//! (percentile, elapsed, movingAverage, holtWinters, top, bottom) carry
//! their extra parameters in the method itself, so the whole family is a
//! single [`AggregateNode`] whose wire discriminator is derived from the
//! method. Aggregations want whatever their parent provides and reduce to a
//! stream of points, except `top` and `bottom` which emit a batch of their
//! selected points.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chain::NodeRef;
use crate::duration::Duration;
use crate::edge::EdgeKind;
use crate::error::Result;

/// Which reduction an [`AggregateNode`] performs, with its parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum AggregateMethod {
    /// Number of points.
    Count,
    /// Distinct values of the field.
    Distinct,
    /// Arithmetic mean.
    Mean,
    /// Median value.
    Median,
    /// Most frequent value.
    Mode,
    /// Difference between minimum and maximum.
    Spread,
    /// Sum of values.
    Sum,
    /// First point by time.
    First,
    /// Last point by time.
    Last,
    /// Minimum value.
    Min,
    /// Maximum value.
    Max,
    /// Standard deviation.
    Stddev,
    /// Difference between consecutive points.
    Difference,
    /// Running sum of consecutive points.
    CumulativeSum,
    /// Elapsed time between points, in `unit`.
    Elapsed {
        /// The unit elapsed time is reported in.
        unit: Duration,
    },
    /// The given percentile of values.
    Percentile {
        /// Percentile to select, in (0, 100].
        percentile: f64,
    },
    /// Moving average over a point window.
    MovingAverage {
        /// Number of points averaged together.
        window: i64,
    },
    /// Holt-Winters forecast of the series.
    HoltWinters {
        /// Number of values to predict.
        h: i64,
        /// Seasonal pattern length; zero disables seasonality.
        m: i64,
        /// Sampling interval of the forecast.
        interval: Duration,
        /// Also emit the fitted values (the `holtWintersWithFit` form).
        fit: bool,
    },
    /// The largest `limit` points.
    Top {
        /// Number of points to select.
        limit: i64,
        /// Tags to partition the selection by.
        tags: Vec<String>,
    },
    /// The smallest `limit` points.
    Bottom {
        /// Number of points to select.
        limit: i64,
        /// Tags to partition the selection by.
        tags: Vec<String>,
    },
}

impl AggregateMethod {
    /// The wire discriminator for this method.
    pub fn descriptor(&self) -> &'static str {
        match self {
            AggregateMethod::Count => "count",
            AggregateMethod::Distinct => "distinct",
            AggregateMethod::Mean => "mean",
            AggregateMethod::Median => "median",
            AggregateMethod::Mode => "mode",
            AggregateMethod::Spread => "spread",
            AggregateMethod::Sum => "sum",
            AggregateMethod::First => "first",
            AggregateMethod::Last => "last",
            AggregateMethod::Min => "min",
            AggregateMethod::Max => "max",
            AggregateMethod::Stddev => "stddev",
            AggregateMethod::Difference => "difference",
            AggregateMethod::CumulativeSum => "cumulativeSum",
            AggregateMethod::Elapsed { .. } => "elapsed",
            AggregateMethod::Percentile { .. } => "percentile",
            AggregateMethod::MovingAverage { .. } => "movingAverage",
            AggregateMethod::HoltWinters { fit: false, .. } => "holtWinters",
            AggregateMethod::HoltWinters { fit: true, .. } => "holtWintersWithFit",
            AggregateMethod::Top { .. } => "top",
            AggregateMethod::Bottom { .. } => "bottom",
        }
    }
}

/// An aggregation over a single field.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateNode {
    /// The reduction performed.
    pub method: AggregateMethod,
    /// The field reduced.
    pub field: String,
    /// Output field name; empty uses the method name.
    pub alias: String,
    /// Stamp results with the time of the contributing point instead of the
    /// boundary time.
    pub use_point_times: bool,
}

impl AggregateNode {
    pub(crate) fn new(method: AggregateMethod, field: impl Into<String>) -> Self {
        AggregateNode {
            method,
            field: field.into(),
            alias: String::new(),
            use_point_times: false,
        }
    }

    /// The edge type this aggregation provides.
    pub fn provides(&self) -> EdgeKind {
        match self.method {
            AggregateMethod::Top { .. } | AggregateMethod::Bottom { .. } => EdgeKind::Batch,
            _ => EdgeKind::Stream,
        }
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.field.is_empty() {
            return Err("a field to aggregate is required".to_string());
        }
        match &self.method {
            AggregateMethod::Elapsed { unit } => {
                if !unit.is_positive() {
                    return Err("unit must be positive".to_string());
                }
            }
            AggregateMethod::Percentile { percentile } => {
                if !(*percentile > 0.0 && *percentile <= 100.0) {
                    return Err("percentile must be in (0, 100]".to_string());
                }
            }
            AggregateMethod::MovingAverage { window } => {
                if *window < 1 {
                    return Err("window must be at least one point".to_string());
                }
            }
            AggregateMethod::HoltWinters { h, m, .. } => {
                if *h <= 0 {
                    return Err("must predict at least one value".to_string());
                }
                if *m < 0 {
                    return Err("seasonal pattern length must not be negative".to_string());
                }
            }
            AggregateMethod::Top { limit, tags } | AggregateMethod::Bottom { limit, tags } => {
                if *limit <= 0 {
                    return Err("limit must be positive".to_string());
                }
                if tags.iter().any(String::is_empty) {
                    return Err("tag names must not be empty".to_string());
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// The wire object for this node, without `typeOf` and `id`.
    pub(crate) fn to_wire(&self) -> Result<Map<String, Value>> {
        let mut map = Map::new();
        map.insert("field".to_string(), Value::String(self.field.clone()));
        map.insert("as".to_string(), Value::String(self.alias.clone()));
        map.insert("usePointTimes".to_string(), Value::Bool(self.use_point_times));
        match &self.method {
            AggregateMethod::Elapsed { unit } => {
                map.insert("unit".to_string(), serde_json::to_value(unit)?);
            }
            AggregateMethod::Percentile { percentile } => {
                map.insert("percentile".to_string(), serde_json::to_value(percentile)?);
            }
            AggregateMethod::MovingAverage { window } => {
                map.insert("window".to_string(), serde_json::to_value(window)?);
            }
            AggregateMethod::HoltWinters { h, m, interval, .. } => {
                map.insert("h".to_string(), serde_json::to_value(h)?);
                map.insert("m".to_string(), serde_json::to_value(m)?);
                map.insert("interval".to_string(), serde_json::to_value(interval)?);
            }
            AggregateMethod::Top { limit, tags } | AggregateMethod::Bottom { limit, tags } => {
                map.insert("limit".to_string(), serde_json::to_value(limit)?);
                map.insert("tags".to_string(), serde_json::to_value(tags)?);
            }
            _ => {}
        }
        Ok(map)
    }

    /// Rebuild an aggregation from its wire discriminator and object.
    ///
    /// Returns `Ok(None)` when the discriminator does not name an
    /// aggregation method.
    pub(crate) fn from_wire(type_of: &str, value: &Value) -> Result<Option<AggregateNode>> {
        const NAMES: &[&str] = &[
            "count",
            "distinct",
            "mean",
            "median",
            "mode",
            "spread",
            "sum",
            "first",
            "last",
            "min",
            "max",
            "stddev",
            "difference",
            "cumulativeSum",
            "elapsed",
            "percentile",
            "movingAverage",
            "holtWinters",
            "holtWintersWithFit",
            "top",
            "bottom",
        ];
        if !NAMES.contains(&type_of) {
            return Ok(None);
        }
        let wire: AggregateWire = serde_json::from_value(value.clone())?;
        let method = match type_of {
            "count" => AggregateMethod::Count,
            "distinct" => AggregateMethod::Distinct,
            "mean" => AggregateMethod::Mean,
            "median" => AggregateMethod::Median,
            "mode" => AggregateMethod::Mode,
            "spread" => AggregateMethod::Spread,
            "sum" => AggregateMethod::Sum,
            "first" => AggregateMethod::First,
            "last" => AggregateMethod::Last,
            "min" => AggregateMethod::Min,
            "max" => AggregateMethod::Max,
            "stddev" => AggregateMethod::Stddev,
            "difference" => AggregateMethod::Difference,
            "cumulativeSum" => AggregateMethod::CumulativeSum,
            "elapsed" => AggregateMethod::Elapsed { unit: wire.unit },
            "percentile" => AggregateMethod::Percentile {
                percentile: wire.percentile,
            },
            "movingAverage" => AggregateMethod::MovingAverage {
                window: wire.window,
            },
            "holtWinters" => AggregateMethod::HoltWinters {
                h: wire.h,
                m: wire.m,
                interval: wire.interval,
                fit: false,
            },
            "holtWintersWithFit" => AggregateMethod::HoltWinters {
                h: wire.h,
                m: wire.m,
                interval: wire.interval,
                fit: true,
            },
            "top" => AggregateMethod::Top {
                limit: wire.limit,
                tags: wire.tags,
            },
            "bottom" => AggregateMethod::Bottom {
                limit: wire.limit,
                tags: wire.tags,
            },
            _ => unreachable!("membership checked above"),
        };
        Ok(Some(AggregateNode {
            method,
            field: wire.field,
            alias: wire.alias,
            use_point_times: wire.use_point_times,
        }))
    }
}

/// Flattened decode shape shared by the whole family; unused parameters
/// take their defaults.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AggregateWire {
    field: String,
    #[serde(rename = "as")]
    alias: String,
    use_point_times: bool,
    unit: Duration,
    percentile: f64,
    #[serde(deserialize_with = "crate::value::de_i64")]
    window: i64,
    #[serde(deserialize_with = "crate::value::de_i64")]
    h: i64,
    #[serde(deserialize_with = "crate::value::de_i64")]
    m: i64,
    interval: Duration,
    #[serde(deserialize_with = "crate::value::de_i64")]
    limit: i64,
    tags: Vec<String>,
}

impl Serialize for AggregateNode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::Error as _;
        let map = self.to_wire().map_err(S::Error::custom)?;
        Value::Object(map).serialize(serializer)
    }
}

impl NodeRef<AggregateNode> {
    /// Name the output field.
    pub fn alias(self, name: &str) -> Self {
        self.mutate(|c| c.alias = name.to_string())
    }

    /// Stamp results with the time of the contributing point.
    pub fn use_point_times(self) -> Self {
        self.mutate(|c| c.use_point_times = true)
    }
}
