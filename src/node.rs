//! Graph nodes and the node-kind catalogue table.
//!
//! This module defines:
//! - [`NodeKind`]: the closed sum type of node kinds, each carrying its
//!   configuration struct from [`crate::nodes`]. The planner-style
//!   exhaustive `match` over this enum *is* the catalogue table: the wire
//!   discriminator, the `(wants, provides)` signature, the decoder dispatch
//!   category, and the validation rules all live here, so adding a kind
//!   without covering every table is a compile error.
//! - [`Node`]: the per-node graph record -- stable ID, optional user name,
//!   edge types, parent/child ID lists, and the `quiet` flag. Nodes refer
//!   to each other by [`NodeId`] only; the pipeline owns all storage.

use serde_json::{Map, Value};

use crate::edge::EdgeKind;
use crate::error::{Error, Result};
use crate::node_id::NodeId;
use crate::nodes::*;

/// Decoder dispatch category of a node kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Dispatch {
    /// `stream`/`batch`: zero parents, added as a pipeline source.
    Source,
    /// `from`/`query`: exactly one parent of the matching source kind.
    SourceFilter,
    /// Single-parent kinds attached below a chain-capable parent.
    Chain,
    /// `union`/`join`: two or more parents.
    Fanin,
    /// `stats`: added as a source, with the single wire parent recorded as
    /// the observed node.
    Stats,
    /// `noop`: never emitted; tolerated on decode as a plain child.
    Noop,
}

/// A node kind together with its configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Point-at-a-time source.
    Stream(StreamSource),
    /// Bounded-group source.
    Batch(BatchSource),
    /// Stream filter.
    From(FromNode),
    /// Batch query filter.
    Query(QueryNode),
    /// Predicate filter.
    Where(WhereNode),
    /// Field/tag defaults.
    Default(DefaultNode),
    /// Field/tag removal.
    Delete(DeleteNode),
    /// Stream-to-batch window.
    Window(WindowNode),
    /// Downsampling.
    Sample(SampleNode),
    /// Time shifting.
    Shift(ShiftNode),
    /// Rate of change.
    Derivative(DerivativeNode),
    /// Change detection.
    ChangeDetect(ChangeDetectNode),
    /// Data logging.
    Log(LogNode),
    /// Idle/period barriers.
    Barrier(BarrierNode),
    /// Tag flattening.
    Flatten(FlattenNode),
    /// External enrichment.
    Sideload(SideloadNode),
    /// State duration tracking.
    StateDuration(StateDurationNode),
    /// State count tracking.
    StateCount(StateCountNode),
    /// Expression evaluation.
    Eval(EvalNode),
    /// Grouping.
    GroupBy(GroupByNode),
    /// The InfluxQL-style aggregation family.
    Aggregate(AggregateNode),
    /// Branch merging.
    Union(UnionNode),
    /// Branch joining.
    Join(JoinNode),
    /// Self-combination.
    Combine(CombineNode),
    /// Alerting.
    Alert(AlertNode),
    /// Cached HTTP output.
    HttpOut(HttpOutNode),
    /// HTTP POST output.
    HttpPost(HttpPostNode),
    /// InfluxDB output.
    InfluxdbOut(InfluxdbOutNode),
    /// Engine loopback output.
    Loopback(LoopbackNode),
    /// Kubernetes autoscaler.
    K8sAutoscale(K8sAutoscaleNode),
    /// Docker Swarm autoscaler.
    SwarmAutoscale(SwarmAutoscaleNode),
    /// EC2 autoscaler.
    Ec2Autoscale(Ec2AutoscaleNode),
    /// Telegraf output.
    TelegrafOut(TelegrafOutNode),
    /// Pluggable user-defined function.
    Udf(UdfNode),
    /// Counter reporting source.
    Stats(StatsNode),
    /// Placeholder child.
    Noop(NoopNode),
}

/// Builder methods available on every chain-capable node, enumerable so a
/// script evaluator can probe for existence before invoking.
pub const CHAIN_METHODS: &[&str] = &[
    "where",
    "default",
    "delete",
    "window",
    "sample",
    "shift",
    "derivative",
    "changeDetect",
    "log",
    "barrier",
    "flatten",
    "sideload",
    "stateDuration",
    "stateCount",
    "eval",
    "groupBy",
    "union",
    "join",
    "combine",
    "alert",
    "httpOut",
    "httpPost",
    "influxdbOut",
    "kapacitorLoopback",
    "k8sAutoscale",
    "swarmAutoscale",
    "ec2Autoscale",
    "telegrafOut",
    "udf",
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

impl NodeKind {
    /// The wire discriminator (`typeOf`) for this kind.
    pub fn descriptor(&self) -> &'static str {
        match self {
            NodeKind::Stream(_) => "stream",
            NodeKind::Batch(_) => "batch",
            NodeKind::From(_) => "from",
            NodeKind::Query(_) => "query",
            NodeKind::Where(_) => "where",
            NodeKind::Default(_) => "default",
            NodeKind::Delete(_) => "delete",
            NodeKind::Window(_) => "window",
            NodeKind::Sample(_) => "sample",
            NodeKind::Shift(_) => "shift",
            NodeKind::Derivative(_) => "derivative",
            NodeKind::ChangeDetect(_) => "changeDetect",
            NodeKind::Log(_) => "log",
            NodeKind::Barrier(_) => "barrier",
            NodeKind::Flatten(_) => "flatten",
            NodeKind::Sideload(_) => "sideload",
            NodeKind::StateDuration(_) => "stateDuration",
            NodeKind::StateCount(_) => "stateCount",
            NodeKind::Eval(_) => "eval",
            NodeKind::GroupBy(_) => "groupBy",
            NodeKind::Aggregate(a) => a.method.descriptor(),
            NodeKind::Union(_) => "union",
            NodeKind::Join(_) => "join",
            NodeKind::Combine(_) => "combine",
            NodeKind::Alert(_) => "alert",
            NodeKind::HttpOut(_) => "httpOut",
            NodeKind::HttpPost(_) => "httpPost",
            NodeKind::InfluxdbOut(_) => "influxdbOut",
            NodeKind::Loopback(_) => "kapacitorLoopback",
            NodeKind::K8sAutoscale(_) => "k8sAutoscale",
            NodeKind::SwarmAutoscale(_) => "swarmAutoscale",
            NodeKind::Ec2Autoscale(_) => "ec2Autoscale",
            NodeKind::TelegrafOut(_) => "telegrafOut",
            NodeKind::Udf(_) => "udf",
            NodeKind::Stats(_) => "stats",
            NodeKind::Noop(_) => "noop",
        }
    }

    pub(crate) fn dispatch(&self) -> Dispatch {
        match self {
            NodeKind::Stream(_) | NodeKind::Batch(_) => Dispatch::Source,
            NodeKind::From(_) | NodeKind::Query(_) => Dispatch::SourceFilter,
            NodeKind::Union(_) | NodeKind::Join(_) => Dispatch::Fanin,
            NodeKind::Stats(_) => Dispatch::Stats,
            NodeKind::Noop(_) => Dispatch::Noop,
            _ => Dispatch::Chain,
        }
    }

    /// True when further children may be chained below this kind.
    pub fn is_chain_capable(&self) -> bool {
        !matches!(
            self,
            NodeKind::Stream(_)
                | NodeKind::Batch(_)
                | NodeKind::HttpOut(_)
                | NodeKind::HttpPost(_)
                | NodeKind::InfluxdbOut(_)
                | NodeKind::Loopback(_)
                | NodeKind::K8sAutoscale(_)
                | NodeKind::SwarmAutoscale(_)
                | NodeKind::Ec2Autoscale(_)
                | NodeKind::TelegrafOut(_)
                | NodeKind::Noop(_)
        )
    }

    /// The builder methods this kind supports.
    pub fn chain_methods(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Stream(_) => &["from"],
            NodeKind::Batch(_) => &["query"],
            _ if self.is_chain_capable() => CHAIN_METHODS,
            _ => &[],
        }
    }

    /// The `(wants, provides)` pair of this kind given the upstream edge.
    ///
    /// This is the one table every wiring decision dispatches through: the
    /// fluent builders, the decoder, and source insertion all consult it.
    pub(crate) fn signature(
        &self,
        upstream: Option<EdgeKind>,
    ) -> std::result::Result<(EdgeKind, EdgeKind), String> {
        let up = match (self.dispatch(), upstream) {
            (Dispatch::Source, None) => {
                let provides = match self {
                    NodeKind::Stream(_) => EdgeKind::Stream,
                    _ => EdgeKind::Batch,
                };
                return Ok((EdgeKind::None, provides));
            }
            (Dispatch::Stats, None) => return Ok((EdgeKind::None, EdgeKind::Stream)),
            (Dispatch::Source | Dispatch::Stats, Some(_)) => {
                return Err(format!("{} nodes cannot have parents", self.descriptor()));
            }
            (_, None) => return Err(format!("{} nodes require a parent", self.descriptor())),
            (_, Some(EdgeKind::None)) => {
                return Err(format!(
                    "cannot chain a {} node below a terminal node",
                    self.descriptor()
                ));
            }
            (_, Some(up)) => up,
        };
        match self {
            NodeKind::From(_) => match up {
                EdgeKind::Stream => Ok((EdgeKind::Stream, EdgeKind::Stream)),
                other => Err(format!("from nodes consume streams, not {other}")),
            },
            NodeKind::Query(_) => match up {
                EdgeKind::Batch => Ok((EdgeKind::Batch, EdgeKind::Batch)),
                other => Err(format!("query nodes consume batches, not {other}")),
            },
            NodeKind::Window(_) => match up {
                EdgeKind::Stream => Ok((EdgeKind::Stream, EdgeKind::Batch)),
                other => Err(format!("window nodes consume streams, not {other}")),
            },
            NodeKind::Combine(_) => match up {
                EdgeKind::Stream => Ok((EdgeKind::Stream, EdgeKind::Stream)),
                other => Err(format!("combine nodes consume streams, not {other}")),
            },
            NodeKind::K8sAutoscale(_) | NodeKind::SwarmAutoscale(_) | NodeKind::Ec2Autoscale(_) => {
                match up {
                    EdgeKind::Stream => Ok((EdgeKind::Stream, EdgeKind::None)),
                    other => Err(format!(
                        "{} nodes consume streams, not {other}",
                        self.descriptor()
                    )),
                }
            }
            NodeKind::HttpOut(_)
            | NodeKind::HttpPost(_)
            | NodeKind::InfluxdbOut(_)
            | NodeKind::Loopback(_)
            | NodeKind::TelegrafOut(_) => Ok((up, EdgeKind::None)),
            NodeKind::Aggregate(a) => Ok((up, a.provides())),
            // Everything else passes its parent's edge type through.
            _ => Ok((up, up)),
        }
    }

    /// Rebuild a kind from its wire discriminator and raw node object.
    ///
    /// Returns `Ok(None)` when the discriminator is unknown.
    pub(crate) fn from_wire(type_of: &str, value: &Value) -> Result<Option<NodeKind>> {
        fn cfg<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T> {
            Ok(serde_json::from_value(value.clone())?)
        }
        let kind = match type_of {
            "stream" => NodeKind::Stream(cfg(value)?),
            "batch" => NodeKind::Batch(cfg(value)?),
            "from" => NodeKind::From(cfg(value)?),
            "query" => NodeKind::Query(cfg(value)?),
            "where" => NodeKind::Where(cfg(value)?),
            "default" => NodeKind::Default(cfg(value)?),
            "delete" => NodeKind::Delete(cfg(value)?),
            "window" => NodeKind::Window(cfg(value)?),
            "sample" => NodeKind::Sample(cfg(value)?),
            "shift" => NodeKind::Shift(cfg(value)?),
            "derivative" => NodeKind::Derivative(cfg(value)?),
            "changeDetect" => NodeKind::ChangeDetect(cfg(value)?),
            "log" => NodeKind::Log(cfg(value)?),
            "barrier" => NodeKind::Barrier(cfg(value)?),
            "flatten" => NodeKind::Flatten(cfg(value)?),
            "sideload" => NodeKind::Sideload(cfg(value)?),
            "stateDuration" => NodeKind::StateDuration(cfg(value)?),
            "stateCount" => NodeKind::StateCount(cfg(value)?),
            "eval" => NodeKind::Eval(cfg(value)?),
            "groupBy" => NodeKind::GroupBy(cfg(value)?),
            "union" => NodeKind::Union(cfg(value)?),
            "join" => NodeKind::Join(cfg(value)?),
            "combine" => NodeKind::Combine(cfg(value)?),
            "alert" => NodeKind::Alert(cfg(value)?),
            "httpOut" => NodeKind::HttpOut(cfg(value)?),
            "httpPost" => NodeKind::HttpPost(cfg(value)?),
            "influxdbOut" => NodeKind::InfluxdbOut(cfg(value)?),
            "kapacitorLoopback" => NodeKind::Loopback(cfg(value)?),
            "k8sAutoscale" => NodeKind::K8sAutoscale(cfg(value)?),
            "swarmAutoscale" => NodeKind::SwarmAutoscale(cfg(value)?),
            "ec2Autoscale" => NodeKind::Ec2Autoscale(cfg(value)?),
            "telegrafOut" => NodeKind::TelegrafOut(cfg(value)?),
            "udf" => NodeKind::Udf(cfg(value)?),
            "stats" => NodeKind::Stats(cfg(value)?),
            "noop" => NodeKind::Noop(cfg(value)?),
            other => {
                return match AggregateNode::from_wire(other, value)? {
                    Some(agg) => Ok(Some(NodeKind::Aggregate(agg))),
                    None => Ok(None),
                };
            }
        };
        Ok(Some(kind))
    }

    /// The wire object for this kind, without `typeOf` and `id`.
    pub(crate) fn to_wire(&self) -> Result<Map<String, Value>> {
        fn obj<T: serde::Serialize>(cfg: &T) -> Result<Map<String, Value>> {
            match serde_json::to_value(cfg)? {
                Value::Object(map) => Ok(map),
                other => Err(Error::format(format!(
                    "node configuration serialized to {other}, expected an object"
                ))),
            }
        }
        match self {
            NodeKind::Stream(c) => obj(c),
            NodeKind::Batch(c) => obj(c),
            NodeKind::From(c) => obj(c),
            NodeKind::Query(c) => obj(c),
            NodeKind::Where(c) => obj(c),
            NodeKind::Default(c) => obj(c),
            NodeKind::Delete(c) => obj(c),
            NodeKind::Window(c) => obj(c),
            NodeKind::Sample(c) => obj(c),
            NodeKind::Shift(c) => obj(c),
            NodeKind::Derivative(c) => obj(c),
            NodeKind::ChangeDetect(c) => obj(c),
            NodeKind::Log(c) => obj(c),
            NodeKind::Barrier(c) => obj(c),
            NodeKind::Flatten(c) => obj(c),
            NodeKind::Sideload(c) => obj(c),
            NodeKind::StateDuration(c) => obj(c),
            NodeKind::StateCount(c) => obj(c),
            NodeKind::Eval(c) => obj(c),
            NodeKind::GroupBy(c) => obj(c),
            NodeKind::Aggregate(c) => c.to_wire(),
            NodeKind::Union(c) => obj(c),
            NodeKind::Join(c) => obj(c),
            NodeKind::Combine(c) => obj(c),
            NodeKind::Alert(c) => obj(c),
            NodeKind::HttpOut(c) => obj(c),
            NodeKind::HttpPost(c) => obj(c),
            NodeKind::InfluxdbOut(c) => obj(c),
            NodeKind::Loopback(c) => obj(c),
            NodeKind::K8sAutoscale(c) => obj(c),
            NodeKind::SwarmAutoscale(c) => obj(c),
            NodeKind::Ec2Autoscale(c) => obj(c),
            NodeKind::TelegrafOut(c) => obj(c),
            NodeKind::Udf(c) => obj(c),
            NodeKind::Stats(c) => obj(c),
            NodeKind::Noop(c) => obj(c),
        }
    }
}

/// One node in the pipeline graph.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: Option<String>,
    pub(crate) wants: EdgeKind,
    pub(crate) provides: EdgeKind,
    pub(crate) parents: Vec<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) quiet: bool,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(id: NodeId, wants: EdgeKind, provides: EdgeKind, kind: NodeKind) -> Self {
        Node {
            id,
            name: None,
            wants,
            provides,
            parents: Vec::new(),
            children: Vec::new(),
            quiet: false,
            kind,
        }
    }

    /// The node's stable ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The user-assigned name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The user-assigned name, or the default `<descriptor><id>`.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}{}", self.kind.descriptor(), self.id),
        }
    }

    /// The edge type this node consumes.
    pub fn wants(&self) -> EdgeKind {
        self.wants
    }

    /// The edge type this node emits.
    pub fn provides(&self) -> EdgeKind {
        self.provides
    }

    /// IDs of this node's parents, in link order.
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// IDs of this node's children, in link order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether execution-time errors from this node are suppressed.
    pub fn quiet(&self) -> bool {
        self.quiet
    }

    /// The node's kind and configuration.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The wire discriminator of this node's kind.
    pub fn descriptor(&self) -> &'static str {
        self.kind.descriptor()
    }

    /// Check arity and configuration rules for this node.
    pub(crate) fn validate(&self) -> Result<()> {
        match self.kind.dispatch() {
            Dispatch::Source | Dispatch::Stats => {
                if !self.parents.is_empty() {
                    return Err(Error::topology(format!(
                        "{} node {} must not have parents",
                        self.descriptor(),
                        self.id
                    )));
                }
            }
            Dispatch::Fanin => {
                if self.parents.len() < 2 {
                    return Err(Error::topology(format!(
                        "{} node {} requires at least two parents",
                        self.descriptor(),
                        self.id
                    )));
                }
            }
            _ => {
                if self.parents.len() != 1 {
                    return Err(Error::topology(format!(
                        "{} node {} requires exactly one parent",
                        self.descriptor(),
                        self.id
                    )));
                }
            }
        }
        let checked = match &self.kind {
            NodeKind::Stream(_) | NodeKind::Batch(_) | NodeKind::Noop(_) => Ok(()),
            NodeKind::From(c) => c.validate(),
            NodeKind::Query(c) => c.validate(),
            NodeKind::Where(c) => c.validate(),
            NodeKind::Default(c) => c.validate(),
            NodeKind::Delete(c) => c.validate(),
            NodeKind::Window(c) => c.validate(),
            NodeKind::Sample(c) => c.validate(),
            NodeKind::Shift(c) => c.validate(),
            NodeKind::Derivative(c) => c.validate(),
            NodeKind::ChangeDetect(c) => c.validate(),
            NodeKind::Log(c) => c.validate(),
            NodeKind::Barrier(c) => c.validate(),
            NodeKind::Flatten(c) => c.validate(),
            NodeKind::Sideload(c) => c.validate(),
            NodeKind::StateDuration(c) => c.validate(),
            NodeKind::StateCount(c) => c.validate(),
            NodeKind::Eval(c) => c.validate(),
            NodeKind::GroupBy(c) => c.validate(),
            NodeKind::Aggregate(c) => c.validate(),
            NodeKind::Union(c) => c.validate(),
            NodeKind::Join(c) => c.validate(self.parents.len()),
            NodeKind::Combine(c) => c.validate(),
            NodeKind::Alert(c) => c.validate(),
            NodeKind::HttpOut(c) => c.validate(),
            NodeKind::HttpPost(c) => c.validate(),
            NodeKind::InfluxdbOut(c) => c.validate(),
            NodeKind::Loopback(c) => c.validate(),
            NodeKind::K8sAutoscale(c) => c.validate(),
            NodeKind::SwarmAutoscale(c) => c.validate(),
            NodeKind::Ec2Autoscale(c) => c.validate(),
            NodeKind::TelegrafOut(c) => c.validate(),
            NodeKind::Udf(c) => c.validate(),
            NodeKind::Stats(c) => c.validate(),
        };
        checked.map_err(|reason| Error::validation(self.id, self.descriptor(), reason))
    }
}
