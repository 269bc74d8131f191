//! Typed node handles and the fluent chain-builder surface.
//!
//! This module defines:
//! - [`NodeRef<C>`]: a cheap, cloneable handle to one node of a pipeline,
//!   typed by the node's configuration struct. Property setters are
//!   inherent methods on the concrete `NodeRef<...>` (defined next to each
//!   configuration in [`crate::nodes`]); they are pure field assignments
//!   that return the handle for chaining and never trigger validation.
//! - [`ChainLink`]: the object-safe "is a node of a pipeline" trait, used
//!   wherever a builder accepts extra parents (`union`, `join`).
//! - [`NodeExt`]: operations available on *every* node handle -- naming,
//!   the quiet flag, and the stats/deadman grafting sugar.
//! - [`Chain`]: the child-attaching builders available on chain-capable
//!   nodes. Every builder allocates a typed child with the next ID, links
//!   it below the parent, and returns its handle; edge and parent-kind
//!   mismatches surface as [`Error::TypeMismatch`](crate::Error).
//!
//! A handle does not own the node; all storage lives in the pipeline and
//! handles refer to it by ID.

use std::marker::PhantomData;

use paste::paste;

use crate::deadman::DeadmanPolicy;
use crate::duration::Duration;
use crate::error::{Error, Result};
use crate::lambda::Lambda;
use crate::node::NodeKind;
use crate::node_id::NodeId;
use crate::nodes::*;
use crate::pipeline::Pipeline;
use crate::value::Dimension;

/// A typed handle to one node in a pipeline.
pub struct NodeRef<C> {
    pub(crate) pipeline: Pipeline,
    pub(crate) id: NodeId,
    _config: PhantomData<C>,
}

impl<C> Clone for NodeRef<C> {
    fn clone(&self) -> Self {
        NodeRef {
            pipeline: self.pipeline.clone(),
            id: self.id,
            _config: PhantomData,
        }
    }
}

impl<C> std::fmt::Debug for NodeRef<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef").field("id", &self.id).finish()
    }
}

/// Maps a configuration struct to its [`NodeKind`] variant.
pub trait NodeConfig: Sized {
    /// Wrap this configuration in its kind.
    fn into_kind(self) -> NodeKind;
    /// Borrow this configuration out of a kind, if the variant matches.
    fn peek(kind: &NodeKind) -> Option<&Self>;
    /// Mutably borrow this configuration out of a kind.
    fn peek_mut(kind: &mut NodeKind) -> Option<&mut Self>;
}

macro_rules! impl_node_config {
    ($($cfg:ty => $variant:ident),* $(,)?) => {
        $(
            impl NodeConfig for $cfg {
                fn into_kind(self) -> NodeKind {
                    NodeKind::$variant(self)
                }
                fn peek(kind: &NodeKind) -> Option<&Self> {
                    match kind {
                        NodeKind::$variant(c) => Some(c),
                        _ => None,
                    }
                }
                fn peek_mut(kind: &mut NodeKind) -> Option<&mut Self> {
                    match kind {
                        NodeKind::$variant(c) => Some(c),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_node_config!(
    StreamSource => Stream,
    BatchSource => Batch,
    FromNode => From,
    QueryNode => Query,
    WhereNode => Where,
    DefaultNode => Default,
    DeleteNode => Delete,
    WindowNode => Window,
    SampleNode => Sample,
    ShiftNode => Shift,
    DerivativeNode => Derivative,
    ChangeDetectNode => ChangeDetect,
    LogNode => Log,
    BarrierNode => Barrier,
    FlattenNode => Flatten,
    SideloadNode => Sideload,
    StateDurationNode => StateDuration,
    StateCountNode => StateCount,
    EvalNode => Eval,
    GroupByNode => GroupBy,
    AggregateNode => Aggregate,
    UnionNode => Union,
    JoinNode => Join,
    CombineNode => Combine,
    AlertNode => Alert,
    HttpOutNode => HttpOut,
    HttpPostNode => HttpPost,
    InfluxdbOutNode => InfluxdbOut,
    LoopbackNode => Loopback,
    K8sAutoscaleNode => K8sAutoscale,
    SwarmAutoscaleNode => SwarmAutoscale,
    Ec2AutoscaleNode => Ec2Autoscale,
    TelegrafOutNode => TelegrafOut,
    UdfNode => Udf,
    StatsNode => Stats,
    NoopNode => Noop,
);

impl<C: NodeConfig> NodeRef<C> {
    pub(crate) fn new(pipeline: Pipeline, id: NodeId) -> Self {
        NodeRef {
            pipeline,
            id,
            _config: PhantomData,
        }
    }

    /// The ID of the node this handle refers to.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Apply a pure assignment to the node's configuration and return the
    /// handle for further chaining.
    pub(crate) fn mutate(self, f: impl FnOnce(&mut C)) -> Self {
        self.pipeline.with_node_mut(self.id, |node| {
            f(C::peek_mut(&mut node.kind).expect("node kind matches its handle"))
        });
        self
    }
}

impl<C: NodeConfig + Clone> NodeRef<C> {
    /// A clone of the node's current configuration.
    pub fn config(&self) -> C {
        self.pipeline.with_node(self.id, |node| {
            C::peek(&node.kind)
                .cloned()
                .expect("node kind matches its handle")
        })
    }
}

/// Object-safe reference to a node of a pipeline.
pub trait ChainLink {
    /// The pipeline the node belongs to.
    fn pipeline(&self) -> &Pipeline;
    /// The node's ID.
    fn node_id(&self) -> NodeId;
}

impl<C> ChainLink for NodeRef<C> {
    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn node_id(&self) -> NodeId {
        self.id
    }
}

/// Operations available on every node handle.
pub trait NodeExt: ChainLink + Sized {
    /// Assign a name to the node, replacing the default `<descriptor><id>`.
    fn named(self, name: &str) -> Self {
        self.pipeline()
            .with_node_mut(self.node_id(), |node| node.name = Some(name.to_string()));
        self
    }

    /// Suppress this node's errors at execution time.
    fn quiet(self) -> Self {
        self.pipeline()
            .with_node_mut(self.node_id(), |node| node.quiet = true);
        self
    }

    /// The node's display name: the assigned name or `<descriptor><id>`.
    fn display_name(&self) -> String {
        self.pipeline()
            .with_node(self.node_id(), |node| node.display_name())
    }

    /// Create a new stream reporting this node's internal counters every
    /// `interval`.
    ///
    /// The stats node becomes an additional source of the pipeline; its
    /// relation to this node is the "observed" reference, serialized as a
    /// synthetic edge. If this node currently has no children, a noop child
    /// is grafted below it so the source sees at least one downstream link.
    fn stats(&self, interval: Duration) -> NodeRef<StatsNode> {
        let id = self.pipeline().graft_stats(self.node_id(), interval);
        NodeRef::new(self.pipeline().clone(), id)
    }

    /// Alert when this node's emitted-point rate drops to or below
    /// `threshold` per `interval`.
    ///
    /// Expands to stats → derivative of `emitted` → alert, with the alert's
    /// identifier and message rendered from the pipeline's deadman policy
    /// templates. Extra predicates are AND-ed onto the critical condition.
    fn deadman(
        &self,
        threshold: f64,
        interval: Duration,
        extra: &[Lambda],
    ) -> Result<NodeRef<AlertNode>> {
        let name = self.display_name();
        let policy = self.pipeline().deadman_policy();
        let derivative = self
            .stats(interval)
            .align()
            .derivative("emitted")?
            .unit(interval)
            .non_negative();
        let mut expression = format!("\"emitted\" <= {threshold}");
        for lambda in extra {
            expression = format!("({expression}) AND ({})", lambda.expression);
        }
        Ok(derivative
            .alert()?
            .alert_id(&DeadmanPolicy::render(&policy.id, &name, interval))
            .message(&DeadmanPolicy::render(&policy.message, &name, interval))
            .crit(Lambda::new(expression)))
    }
}

impl<T: ChainLink + Sized> NodeExt for T {}

macro_rules! simple_aggregations {
    ($($name:ident => $variant:ident),* $(,)?) => {
        $(
            paste! {
                #[doc = "Aggregate `field` with the `" $name "` reduction."]
                fn $name(&self, field: &str) -> Result<NodeRef<AggregateNode>> {
                    self.attach(AggregateNode::new(AggregateMethod::$variant, field))
                }
            }
        )*
    };
}

/// Child-attaching builders available on chain-capable nodes.
///
/// Every method allocates a default-shaped child of the named kind, links
/// it below this node, and returns its handle for property chaining.
pub trait Chain: ChainLink + Sized {
    /// Attach an already-configured node kind below this node.
    ///
    /// The named builders below all go through here; it is also the escape
    /// hatch for script front-ends that construct configurations
    /// themselves.
    fn attach<C: NodeConfig>(&self, config: C) -> Result<NodeRef<C>> {
        let id = self
            .pipeline()
            .attach(&[self.node_id()], config.into_kind())?;
        Ok(NodeRef::new(self.pipeline().clone(), id))
    }

    /// Attach a multi-parent node below this node and `others`, which must
    /// all belong to the same pipeline.
    fn fan_in<C: NodeConfig>(&self, others: &[&dyn ChainLink], config: C) -> Result<NodeRef<C>> {
        let mut parents = vec![self.node_id()];
        for other in others {
            if !self.pipeline().same_as(other.pipeline()) {
                return Err(Error::topology(
                    "cannot combine nodes from different pipelines",
                ));
            }
            parents.push(other.node_id());
        }
        let id = self.pipeline().attach(&parents, config.into_kind())?;
        Ok(NodeRef::new(self.pipeline().clone(), id))
    }

    /// Filter data by a predicate.
    fn where_expr(&self, predicate: impl Into<Lambda>) -> Result<NodeRef<WhereNode>> {
        self.attach(WhereNode {
            lambda: predicate.into(),
        })
    }

    /// Set default field and tag values.
    fn defaults(&self) -> Result<NodeRef<DefaultNode>> {
        self.attach(DefaultNode::default())
    }

    /// Remove fields and tags.
    fn delete(&self) -> Result<NodeRef<DeleteNode>> {
        self.attach(DeleteNode::default())
    }

    /// Buffer the stream into batches. Only valid below stream edges.
    fn window(&self) -> Result<NodeRef<WindowNode>> {
        self.attach(WindowNode::default())
    }

    /// Keep every `count`-th point.
    fn sample(&self, count: i64) -> Result<NodeRef<SampleNode>> {
        self.attach(SampleNode {
            count,
            ..SampleNode::default()
        })
    }

    /// Keep one point per `every`.
    fn sample_every(&self, every: Duration) -> Result<NodeRef<SampleNode>> {
        self.attach(SampleNode {
            every,
            ..SampleNode::default()
        })
    }

    /// Shift point times by `offset`.
    fn shift(&self, offset: Duration) -> Result<NodeRef<ShiftNode>> {
        self.attach(ShiftNode { shift: offset })
    }

    /// Compute the rate of change of `field`.
    fn derivative(&self, field: &str) -> Result<NodeRef<DerivativeNode>> {
        self.attach(DerivativeNode {
            field: field.to_string(),
            ..DerivativeNode::default()
        })
    }

    /// Emit points only when one of `fields` changes.
    fn change_detect(&self, fields: &[&str]) -> Result<NodeRef<ChangeDetectNode>> {
        self.attach(ChangeDetectNode {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        })
    }

    /// Log passing data.
    fn log(&self) -> Result<NodeRef<LogNode>> {
        self.attach(LogNode::default())
    }

    /// Emit idle or periodic barrier markers.
    fn barrier(&self) -> Result<NodeRef<BarrierNode>> {
        self.attach(BarrierNode::default())
    }

    /// Flatten points on a set of tags.
    fn flatten(&self) -> Result<NodeRef<FlattenNode>> {
        self.attach(FlattenNode::default())
    }

    /// Load fields and tags from an external source.
    fn sideload(&self, source: &str) -> Result<NodeRef<SideloadNode>> {
        self.attach(SideloadNode {
            source: source.to_string(),
            ..SideloadNode::default()
        })
    }

    /// Track how long `predicate` has been true.
    fn state_duration(&self, predicate: impl Into<Lambda>) -> Result<NodeRef<StateDurationNode>> {
        self.attach(StateDurationNode {
            lambda: predicate.into(),
            ..StateDurationNode::default()
        })
    }

    /// Count consecutive points for which `predicate` is true.
    fn state_count(&self, predicate: impl Into<Lambda>) -> Result<NodeRef<StateCountNode>> {
        self.attach(StateCountNode {
            lambda: predicate.into(),
            ..StateCountNode::default()
        })
    }

    /// Evaluate expressions over each point.
    fn eval(&self, expressions: &[Lambda]) -> Result<NodeRef<EvalNode>> {
        self.attach(EvalNode {
            lambdas: expressions.to_vec(),
            ..EvalNode::default()
        })
    }

    /// Group data by dimensions.
    fn group_by(&self, dimensions: &[Dimension]) -> Result<NodeRef<GroupByNode>> {
        self.attach(GroupByNode {
            dimensions: dimensions.to_vec(),
            ..GroupByNode::default()
        })
    }

    /// Merge this node's output with `others`.
    fn union(&self, others: &[&dyn ChainLink]) -> Result<NodeRef<UnionNode>> {
        self.fan_in(others, UnionNode::default())
    }

    /// Join this node's output with `others` by time and group.
    fn join(&self, others: &[&dyn ChainLink]) -> Result<NodeRef<JoinNode>> {
        self.fan_in(others, JoinNode::default())
    }

    /// Pair points of this stream with themselves by time.
    fn combine(&self, expressions: &[Lambda]) -> Result<NodeRef<CombineNode>> {
        self.attach(CombineNode {
            lambdas: expressions.to_vec(),
            ..CombineNode::default()
        })
    }

    /// Alert on the passing data.
    fn alert(&self) -> Result<NodeRef<AlertNode>> {
        self.attach(AlertNode::default())
    }

    /// Cache the latest data on a named HTTP endpoint.
    fn http_out(&self, endpoint: &str) -> Result<NodeRef<HttpOutNode>> {
        self.attach(HttpOutNode {
            endpoint: endpoint.to_string(),
        })
    }

    /// POST passing data to `url`.
    fn http_post(&self, url: &str) -> Result<NodeRef<HttpPostNode>> {
        self.attach(HttpPostNode {
            url: url.to_string(),
            ..HttpPostNode::default()
        })
    }

    /// POST passing data to a named, preconfigured endpoint.
    fn http_post_endpoint(&self, endpoint: &str) -> Result<NodeRef<HttpPostNode>> {
        self.attach(HttpPostNode {
            endpoint: endpoint.to_string(),
            ..HttpPostNode::default()
        })
    }

    /// Write passing data to an InfluxDB database.
    fn influxdb_out(&self, database: &str) -> Result<NodeRef<InfluxdbOutNode>> {
        self.attach(InfluxdbOutNode {
            database: database.to_string(),
            ..InfluxdbOutNode::default()
        })
    }

    /// Feed passing data back into the engine.
    fn loopback(&self) -> Result<NodeRef<LoopbackNode>> {
        self.attach(LoopbackNode::default())
    }

    /// Scale a Kubernetes resource from the passing data.
    fn k8s_autoscale(&self) -> Result<NodeRef<K8sAutoscaleNode>> {
        self.attach(K8sAutoscaleNode::default())
    }

    /// Scale a Docker Swarm service from the passing data.
    fn swarm_autoscale(&self) -> Result<NodeRef<SwarmAutoscaleNode>> {
        self.attach(SwarmAutoscaleNode::default())
    }

    /// Scale an EC2 autoscale group from the passing data.
    fn ec2_autoscale(&self) -> Result<NodeRef<Ec2AutoscaleNode>> {
        self.attach(Ec2AutoscaleNode::default())
    }

    /// Forward passing data to a Telegraf listener.
    fn telegraf_out(&self, url: &str) -> Result<NodeRef<TelegrafOutNode>> {
        self.attach(TelegrafOutNode {
            url: url.to_string(),
            ..TelegrafOutNode::default()
        })
    }

    /// Pass data through a registered user-defined function.
    fn udf(&self, name: &str) -> Result<NodeRef<UdfNode>> {
        self.attach(UdfNode {
            udf_name: name.to_string(),
            ..UdfNode::default()
        })
    }

    simple_aggregations!(
        count => Count,
        distinct => Distinct,
        mean => Mean,
        median => Median,
        mode => Mode,
        spread => Spread,
        sum => Sum,
        first => First,
        last => Last,
        min => Min,
        max => Max,
        stddev => Stddev,
        difference => Difference,
        cumulative_sum => CumulativeSum,
    );

    /// Measure the elapsed time between points of `field`, in `unit`.
    fn elapsed(&self, field: &str, unit: Duration) -> Result<NodeRef<AggregateNode>> {
        self.attach(AggregateNode::new(AggregateMethod::Elapsed { unit }, field))
    }

    /// Select the given percentile of `field`.
    fn percentile(&self, field: &str, percentile: f64) -> Result<NodeRef<AggregateNode>> {
        self.attach(AggregateNode::new(
            AggregateMethod::Percentile { percentile },
            field,
        ))
    }

    /// Average `field` over a moving window of points.
    fn moving_average(&self, field: &str, window: i64) -> Result<NodeRef<AggregateNode>> {
        self.attach(AggregateNode::new(
            AggregateMethod::MovingAverage { window },
            field,
        ))
    }

    /// Forecast `field` with the Holt-Winters method.
    fn holt_winters(
        &self,
        field: &str,
        h: i64,
        m: i64,
        interval: Duration,
    ) -> Result<NodeRef<AggregateNode>> {
        self.attach(AggregateNode::new(
            AggregateMethod::HoltWinters {
                h,
                m,
                interval,
                fit: false,
            },
            field,
        ))
    }

    /// Forecast `field` with Holt-Winters, also emitting fitted values.
    fn holt_winters_with_fit(
        &self,
        field: &str,
        h: i64,
        m: i64,
        interval: Duration,
    ) -> Result<NodeRef<AggregateNode>> {
        self.attach(AggregateNode::new(
            AggregateMethod::HoltWinters {
                h,
                m,
                interval,
                fit: true,
            },
            field,
        ))
    }

    /// Select the largest `limit` points of `field`, partitioned by `tags`.
    fn top(&self, limit: i64, field: &str, tags: &[&str]) -> Result<NodeRef<AggregateNode>> {
        self.attach(AggregateNode::new(
            AggregateMethod::Top {
                limit,
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
            field,
        ))
    }

    /// Select the smallest `limit` points of `field`, partitioned by `tags`.
    fn bottom(&self, limit: i64, field: &str, tags: &[&str]) -> Result<NodeRef<AggregateNode>> {
        self.attach(AggregateNode::new(
            AggregateMethod::Bottom {
                limit,
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
            field,
        ))
    }
}

macro_rules! impl_chain {
    ($($cfg:ty),* $(,)?) => {
        $(
            impl Chain for NodeRef<$cfg> {}
        )*
    };
}

impl_chain!(
    FromNode,
    QueryNode,
    WhereNode,
    DefaultNode,
    DeleteNode,
    WindowNode,
    SampleNode,
    ShiftNode,
    DerivativeNode,
    ChangeDetectNode,
    LogNode,
    BarrierNode,
    FlattenNode,
    SideloadNode,
    StateDurationNode,
    StateCountNode,
    EvalNode,
    GroupByNode,
    AggregateNode,
    UnionNode,
    JoinNode,
    CombineNode,
    AlertNode,
    UdfNode,
    StatsNode,
);

impl NodeRef<StreamSource> {
    /// Select points from this stream source.
    pub fn from(&self) -> Result<NodeRef<FromNode>> {
        let id = self
            .pipeline
            .attach(&[self.id], NodeKind::From(FromNode::default()))?;
        Ok(NodeRef::new(self.pipeline.clone(), id))
    }
}

impl NodeRef<BatchSource> {
    /// Attach a periodic query to this batch source.
    pub fn query(&self, query: &str) -> Result<NodeRef<QueryNode>> {
        let id = self.pipeline.attach(
            &[self.id],
            NodeKind::Query(QueryNode {
                query_str: query.to_string(),
                ..QueryNode::default()
            }),
        )?;
        Ok(NodeRef::new(self.pipeline.clone(), id))
    }
}
