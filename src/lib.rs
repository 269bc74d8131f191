//! # Alertflow
//!
//! The **pipeline core** of a streaming/batch alert-and-analytics engine.
//! Alertflow represents a user's processing script as a directed acyclic
//! graph of typed nodes (filters, windows, aggregations, joins, alerts,
//! outputs, UDFs), serializes that graph to a stable JSON wire format, and
//! reconstructs it -- with IDs, parent/child wiring, and configuration
//! intact -- so an execution layer can instantiate and run it.
//!
//! ## Key Features
//!
//! - **Fluent builder API** - chain typed nodes below a stream or batch
//!   source; every builder call allocates a child with a stable ID
//! - **Strongly typed edges** - every node declares what it consumes and
//!   emits (`none`, `stream`, or `batch`); mismatches fail construction
//! - **Closed node catalogue** - sources, filters, transforms, the
//!   InfluxQL-style aggregation family, fan-in, alerting, outputs,
//!   autoscalers, and pluggable UDFs
//! - **Lossless JSON round trips** - discriminator-tagged nodes plus an
//!   explicit edge list; IDs survive, durations travel as InfluxQL strings
//! - **Deterministic topological order** - parents before children, in
//!   source declaration order, with cycle detection on both build and load
//! - **Stats & deadman sugar** - observe any node's throughput and alert
//!   when it drops, from one builder call
//!
//! ## Quick Start
//!
//! ```
//! use alertflow::*;
//!
//! # fn main() -> Result<()> {
//! let (pipeline, stream) = Pipeline::stream(DeadmanPolicy::default());
//!
//! stream
//!     .from()?
//!     .measurement("cpu")
//!     .window()?
//!     .period(Duration::seconds(10))
//!     .every(Duration::seconds(1))
//!     .mean("usage_system")?
//!     .alert()?
//!     .crit("\"mean\" > 90.0")
//!     .post("http://alerts.example.com");
//!
//! pipeline.validate()?;
//! let wire = pipeline.marshal_json()?;
//! let restored = Pipeline::unmarshal_json(wire.as_bytes(), DeadmanPolicy::default())?;
//! assert_eq!(restored.len(), pipeline.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### `Pipeline`
//!
//! A [`Pipeline`] owns every node and their links. Create one with
//! [`Pipeline::stream`] or [`Pipeline::batch`], which also hand back the
//! source handle the script chains from. The pipeline assigns node IDs
//! monotonically from 0; IDs never change and survive serialization.
//!
//! ### Node handles
//!
//! A [`NodeRef<C>`] is a cheap, cloneable, typed handle to one node.
//! Property setters are plain methods on the concrete handle type
//! (`window.period(...)`), pure field assignments that return the handle.
//! Child-attaching builders live on the [`Chain`] trait and return the new
//! child's handle; naming, the quiet flag, and stats/deadman grafting live
//! on [`NodeExt`], available on every handle.
//!
//! ### Edges
//!
//! Every node *wants* one edge type and *provides* one: `stream` is
//! point-at-a-time data, `batch` is bounded groups, and `none` marks a
//! terminal output. A child's wants must match its parent's provides; the
//! window node is the only stream→batch promoter, and aggregations reduce
//! back to streams (`top`/`bottom` emit batches). The whole table lives in
//! one place, and both the builders and the wire decoder dispatch through
//! it.
//!
//! ### Validation
//!
//! Setters never validate. Once construction finishes -- the script
//! returned, or the decoder rebuilt the graph -- [`Pipeline::validate`]
//! walks every node and enforces its rules (window period modes, barrier
//! idle-xor-period, join prefix arity, autoscaler bounds, ...). Any
//! violation aborts the pipeline as a whole; there is no partial pipeline.
//!
//! ## The Wire Format
//!
//! [`Pipeline::marshal_json`] emits one object with `nodes` and `edges`:
//! nodes in topological order, each carrying its `typeOf` discriminator,
//! its `id` as a decimal string, and its configuration fields; edges as
//! `{"parent": "0", "child": "1"}` pairs. Durations are InfluxQL strings
//! (`"1h30m"`, `"500ms"`, `"0s"`), lambdas are nested
//! `{"typeOf": "lambda", "expression": ...}` objects, and unset optional
//! lambdas are `null`. [`Pipeline::unmarshal_json`] rebuilds the graph
//! parent-first and fails loudly on unknown discriminators, dangling
//! edges, and cycles.
//!
//! `noop` placeholders never travel: the encoder skips them and the
//! decoder re-derives them where the grafting rule demands. A stats node's
//! observed relation travels as a synthetic edge from the observed node to
//! the stats node.
//!
//! ## Stats and Deadman
//!
//! ```
//! use alertflow::*;
//!
//! # fn main() -> Result<()> {
//! let (pipeline, stream) = Pipeline::stream(DeadmanPolicy::default());
//! let requests = stream.from()?.measurement("requests");
//!
//! // Alert if throughput drops to 10 points/minute or less.
//! requests.deadman(10.0, Duration::minutes(1), &[])?;
//! pipeline.validate()?;
//! # Ok(())
//! # }
//! ```
//!
//! [`NodeExt::stats`] grafts a new source that reports the observed node's
//! counters on an interval; [`NodeExt::deadman`] expands to
//! stats → derivative of `emitted` → alert, rendering the alert identifier
//! and message from the pipeline's [`DeadmanPolicy`] templates.
//!
//! ## Module Overview
//!
//! - [`pipeline`] - graph storage, ID assignment, sort, walk, DOT export
//! - [`chain`] - typed handles and the fluent builder traits
//! - [`node`] - the node record and the closed kind catalogue
//! - [`nodes`] - per-kind configuration structs and validation rules
//! - [`edge`] - edge types
//! - [`duration`] - InfluxQL-style duration quantity
//! - [`lambda`] - opaque expression carrier
//! - [`value`] - tagged unions for dynamically-typed configuration values
//! - [`deadman`] - deadman policy and template substitution
//! - [`error`] - the error taxonomy
//!
//! ## Scope
//!
//! Alertflow is a *specification* of work, not the worker: it does no I/O,
//! holds no locks across calls, and never executes a node. The script
//! front-end that produces pipelines and the execution runtime that runs
//! them are separate layers; this crate is the data model both agree on.

pub mod chain;
pub mod deadman;
pub mod duration;
pub mod edge;
pub mod error;
mod json;
pub mod lambda;
pub mod node;
pub mod node_id;
pub mod nodes;
pub mod pipeline;
pub mod value;

pub use chain::{Chain, ChainLink, NodeConfig, NodeExt, NodeRef};
pub use deadman::DeadmanPolicy;
pub use duration::Duration;
pub use edge::EdgeKind;
pub use error::{Error, Result};
pub use lambda::Lambda;
pub use node::{CHAIN_METHODS, Node, NodeKind};
pub use node_id::NodeId;
pub use nodes::*;
pub use pipeline::Pipeline;
pub use value::{Dimension, FieldValue, FillKind};
