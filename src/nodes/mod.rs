//! The node catalogue: one configuration struct per node kind.
//!
//! Every kind in the closed catalogue declares its configuration schema as a
//! plain serde struct with a deterministic default shape, plus the
//! validation rules the pipeline enforces once construction finishes. The
//! structs here carry no graph state -- parent/child wiring, IDs, and edge
//! types live on [`Node`](crate::node::Node); these are the per-kind fields
//! that travel on the wire.
//!
//! Organization follows the catalogue groups:
//! - [`source`]: the two sources and their filters (`from`, `query`)
//! - [`transform`]: single-parent passthroughs and the window promoter
//! - [`aggregate`]: the InfluxQL-style reducer family
//! - [`fanin`]: `union`, `join`, and the self-combining `combine`
//! - [`alert`]: the alert node and its handler channels
//! - [`sink`]: terminal outputs and autoscalers
//! - [`meta`]: `stats`, `noop`, and the pluggable `udf`

pub mod aggregate;
pub mod alert;
pub mod fanin;
pub mod meta;
pub mod sink;
pub mod source;
pub mod transform;

pub use aggregate::{AggregateMethod, AggregateNode};
pub use alert::{
    AlertNode, AlertaHandler, EmailHandler, ExecHandler, HipChatHandler, KafkaHandler, LogHandler,
    MqttHandler, OpsGenieHandler, PagerDutyHandler, PostHandler, PushoverHandler, SensuHandler,
    SlackHandler, SnmpData, SnmpTrapHandler, TalkHandler, TcpHandler, TelegramHandler,
    VictorOpsHandler,
};
pub use fanin::{CombineNode, JoinNode, UnionNode};
pub use meta::{NoopNode, StatsNode, UdfNode};
pub use sink::{
    Ec2AutoscaleNode, HttpOutNode, HttpPostNode, InfluxdbOutNode, K8sAutoscaleNode, LoopbackNode,
    SwarmAutoscaleNode, TelegrafOutNode,
};
pub use source::{BatchSource, FromNode, QueryNode, StreamSource};
pub use transform::{
    BarrierNode, ChangeDetectNode, DefaultNode, DeleteNode, DerivativeNode, EvalNode, FlattenNode,
    GroupByNode, LogNode, SampleNode, ShiftNode, SideloadNode, StateCountNode, StateDurationNode,
    WhereNode, WindowNode,
};
