//! In-memory representation of a pipeline graph.
//!
//! The [`Pipeline`] acts as the central registry for all nodes and their
//! directed connections. It is lightweight, cloneable, and thread-safe via
//! internal `Arc<Mutex<_>>` wrapping, allowing construction and inspection
//! from different builder handles; a single pipeline is still built and
//! serialized from one logical thread at a time, and separate pipelines are
//! fully independent.
//!
//! # Overview
//! - Each builder call on a node handle inserts a new [`Node`] and records
//!   the parent/child link; the pipeline assigns IDs monotonically from 0.
//! - Nodes reference each other by [`NodeId`] only; the pipeline owns all
//!   node storage.
//! - The topological order is computed lazily and cached; any structural
//!   change invalidates it.
//! - [`Pipeline::walk`] visits nodes parents-first and stops at the first
//!   error; [`Pipeline::validate`] is the walk every loader runs once
//!   construction finishes.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::chain::NodeRef;
use crate::deadman::DeadmanPolicy;
use crate::duration::Duration;
use crate::edge::EdgeKind;
use crate::error::{Error, Result};
use crate::json;
use crate::node::{Dispatch, Node, NodeKind};
use crate::node_id::NodeId;
use crate::nodes::{BatchSource, NoopNode, StatsNode, StreamSource};

/// Thread-safe pipeline graph structure holding all nodes and their links.
///
/// The `Pipeline` itself is cheaply cloneable; all clones share the same
/// underlying [`PipelineInner`].
pub struct Pipeline {
    pub(crate) inner: Arc<Mutex<PipelineInner>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

/// Inner mutable graph state for a [`Pipeline`].
pub(crate) struct PipelineInner {
    /// Incremental counter for node IDs.
    pub next_id: u64,
    /// All nodes, keyed by ID.
    pub nodes: HashMap<NodeId, Node>,
    /// Source node IDs in insertion order.
    pub sources: Vec<NodeId>,
    /// Cached topological order; `None` after a structural change.
    pub sorted: Option<Vec<NodeId>>,
    /// Deadman policy the `deadman` builder expands with.
    pub deadman: DeadmanPolicy,
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new(DeadmanPolicy::default())
    }
}

impl Clone for Pipeline {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Pipeline {
    /// Create an empty pipeline carrying the given deadman policy.
    pub fn new(deadman: DeadmanPolicy) -> Self {
        Pipeline {
            inner: Arc::new(Mutex::new(PipelineInner {
                next_id: 0,
                nodes: HashMap::new(),
                sources: Vec::new(),
                sorted: None,
                deadman,
            })),
        }
    }

    /// Create a pipeline with a stream source: the factory entry point for
    /// point-at-a-time data.
    pub fn stream(deadman: DeadmanPolicy) -> (Pipeline, NodeRef<StreamSource>) {
        let pipeline = Pipeline::new(deadman);
        let id = pipeline.add_source(NodeKind::Stream(StreamSource::default()));
        let source = NodeRef::new(pipeline.clone(), id);
        (pipeline, source)
    }

    /// Create a pipeline with a batch source: the factory entry point for
    /// bounded-group data.
    pub fn batch(deadman: DeadmanPolicy) -> (Pipeline, NodeRef<BatchSource>) {
        let pipeline = Pipeline::new(deadman);
        let id = pipeline.add_source(NodeKind::Batch(BatchSource::default()));
        let source = NodeRef::new(pipeline.clone(), id);
        (pipeline, source)
    }

    /// The deadman policy this pipeline was created with.
    pub fn deadman_policy(&self) -> DeadmanPolicy {
        self.inner.lock().unwrap().deadman.clone()
    }

    /// Number of nodes in the pipeline.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().nodes.len()
    }

    /// True when the pipeline has no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// IDs of the pipeline's sources, in insertion order.
    pub fn sources(&self) -> Vec<NodeId> {
        self.inner.lock().unwrap().sources.clone()
    }

    /// A clone of the node with the given ID, if present.
    pub fn node(&self, id: NodeId) -> Option<Node> {
        self.inner.lock().unwrap().nodes.get(&id).cloned()
    }

    /// Return a **snapshot** of the current graph: a deep clone of all
    /// nodes plus the `(parent, child)` edge list in ID order.
    pub fn snapshot(&self) -> (HashMap<NodeId, Node>, Vec<(NodeId, NodeId)>) {
        let g = self.inner.lock().unwrap();
        let mut ids: Vec<NodeId> = g.nodes.keys().copied().collect();
        ids.sort();
        let mut edges = Vec::new();
        for id in &ids {
            for &child in &g.nodes[id].children {
                edges.push((*id, child));
            }
        }
        (g.nodes.clone(), edges)
    }

    /// Insert a new source node and return its ID.
    pub(crate) fn add_source(&self, kind: NodeKind) -> NodeId {
        let mut g = self.inner.lock().unwrap();
        let id = NodeId::new(g.next_id);
        insert_source(&mut g, id, kind)
    }

    /// Insert a source node under an explicit ID (wire reconstruction).
    pub(crate) fn add_source_with_id(&self, id: NodeId, kind: NodeKind) -> Result<NodeId> {
        let mut g = self.inner.lock().unwrap();
        if g.nodes.contains_key(&id) {
            return Err(Error::topology(format!("duplicate node id {id}")));
        }
        Ok(insert_source(&mut g, id, kind))
    }

    /// Attach a new node below `parents`, assigning the next ID.
    pub(crate) fn attach(&self, parents: &[NodeId], kind: NodeKind) -> Result<NodeId> {
        self.attach_inner(None, parents, kind)
    }

    /// Attach a new node below `parents` under an explicit ID (wire
    /// reconstruction).
    pub(crate) fn attach_with_id(
        &self,
        id: NodeId,
        parents: &[NodeId],
        kind: NodeKind,
    ) -> Result<NodeId> {
        self.attach_inner(Some(id), parents, kind)
    }

    fn attach_inner(
        &self,
        id: Option<NodeId>,
        parents: &[NodeId],
        kind: NodeKind,
    ) -> Result<NodeId> {
        let mut g = self.inner.lock().unwrap();
        for parent in parents {
            if !g.nodes.contains_key(parent) {
                return Err(Error::topology(format!("unknown parent node {parent}")));
            }
        }
        match kind.dispatch() {
            Dispatch::Source | Dispatch::Stats => {
                return Err(Error::mismatch(format!(
                    "{} nodes cannot be attached below a parent",
                    kind.descriptor()
                )));
            }
            Dispatch::SourceFilter => {
                if parents.len() != 1 {
                    return Err(Error::topology(format!(
                        "{} node requires exactly one parent",
                        kind.descriptor()
                    )));
                }
                let parent = &g.nodes[&parents[0]];
                let ok = matches!(
                    (&kind, &parent.kind),
                    (NodeKind::From(_), NodeKind::Stream(_))
                        | (NodeKind::Query(_), NodeKind::Batch(_))
                );
                if !ok {
                    return Err(Error::mismatch(format!(
                        "{} node cannot be attached below a {} node",
                        kind.descriptor(),
                        parent.descriptor()
                    )));
                }
            }
            Dispatch::Fanin => {
                if parents.len() < 2 {
                    return Err(Error::topology(format!(
                        "{} node requires at least two parents",
                        kind.descriptor()
                    )));
                }
                let first = g.nodes[&parents[0]].provides;
                for parent in &parents[1..] {
                    let provides = g.nodes[parent].provides;
                    if provides != first {
                        return Err(Error::mismatch(format!(
                            "cannot {} a {first} edge with a {provides} edge",
                            kind.descriptor()
                        )));
                    }
                }
            }
            Dispatch::Chain => {
                if parents.len() != 1 {
                    return Err(Error::topology(format!(
                        "{} node requires exactly one parent",
                        kind.descriptor()
                    )));
                }
                let parent = &g.nodes[&parents[0]];
                if !parent.kind.is_chain_capable() {
                    return Err(Error::mismatch(format!(
                        "cannot chain a {} node below a {} node",
                        kind.descriptor(),
                        parent.descriptor()
                    )));
                }
            }
            // A noop only needs a parent that emits an edge; the signature
            // check below covers that.
            Dispatch::Noop => {
                if parents.len() != 1 {
                    return Err(Error::topology("noop node requires exactly one parent"));
                }
            }
        }
        let upstream = g.nodes[&parents[0]].provides;
        let (wants, provides) = kind.signature(Some(upstream)).map_err(Error::TypeMismatch)?;
        let id = match id {
            Some(id) => {
                if g.nodes.contains_key(&id) {
                    return Err(Error::topology(format!("duplicate node id {id}")));
                }
                id
            }
            None => NodeId::new(g.next_id),
        };
        let mut node = Node::new(id, wants, provides, kind);
        for &parent in parents {
            node.parents.push(parent);
            g.nodes
                .get_mut(&parent)
                .expect("parent checked above")
                .children
                .push(id);
        }
        insert_node(&mut g, node);
        Ok(id)
    }

    /// Add a stats node observing `observed` as an extra source, grafting a
    /// noop child under `observed` when it has no children yet.
    pub(crate) fn graft_stats(&self, observed: NodeId, interval: Duration) -> NodeId {
        let mut g = self.inner.lock().unwrap();
        let stats = StatsNode {
            interval,
            align: false,
            observed: Some(observed),
        };
        let id = NodeId::new(g.next_id);
        insert_source(&mut g, id, NodeKind::Stats(stats));
        debug!(observed = %observed, stats = %id, "grafted stats source");
        graft_noop_if_childless(&mut g, observed);
        id
    }

    /// Wire-reconstruction form of [`Self::graft_stats`]: explicit ID and a
    /// decoded configuration.
    pub(crate) fn graft_stats_with_id(
        &self,
        id: NodeId,
        observed: NodeId,
        mut stats: StatsNode,
    ) -> Result<NodeId> {
        let mut g = self.inner.lock().unwrap();
        if g.nodes.contains_key(&id) {
            return Err(Error::topology(format!("duplicate node id {id}")));
        }
        if !g.nodes.contains_key(&observed) {
            return Err(Error::topology(format!(
                "stats node {id} observes unknown node {observed}"
            )));
        }
        stats.observed = Some(observed);
        insert_source(&mut g, id, NodeKind::Stats(stats));
        graft_noop_if_childless(&mut g, observed);
        Ok(id)
    }

    /// Run `f` over a shared reference to a node. The node must exist.
    pub(crate) fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&Node) -> R) -> R {
        let g = self.inner.lock().unwrap();
        f(g.nodes.get(&id).expect("node exists in its pipeline"))
    }

    /// Run `f` over a mutable reference to a node. The node must exist.
    pub(crate) fn with_node_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut Node) -> R) -> R {
        let mut g = self.inner.lock().unwrap();
        f(g.nodes.get_mut(&id).expect("node exists in its pipeline"))
    }

    /// True when `other` shares this pipeline's storage.
    pub(crate) fn same_as(&self, other: &Pipeline) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The topological order of the pipeline, computed lazily and cached.
    ///
    /// Parents come before children, and the order follows source
    /// declaration order. Fails with [`Error::Topology`] on a cycle.
    pub fn sort(&self) -> Result<Vec<NodeId>> {
        let mut g = self.inner.lock().unwrap();
        if let Some(sorted) = &g.sorted {
            return Ok(sorted.clone());
        }
        let order = sort_graph(&g.nodes, &g.sources)?;
        debug!(nodes = order.len(), "sorted pipeline");
        g.sorted = Some(order.clone());
        Ok(order)
    }

    /// Walk the sorted order, stopping at the first error.
    pub fn walk<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&Node) -> Result<()>,
    {
        let order = self.sort()?;
        let g = self.inner.lock().unwrap();
        for id in order {
            let node = g.nodes.get(&id).expect("sorted node exists");
            f(node)?;
        }
        Ok(())
    }

    /// Validate every node once construction has finished.
    pub fn validate(&self) -> Result<()> {
        self.walk(Node::validate)?;
        let g = self.inner.lock().unwrap();
        for node in g.nodes.values() {
            if let NodeKind::Stats(stats) = &node.kind {
                let present = stats
                    .observed
                    .map(|observed| g.nodes.contains_key(&observed))
                    .unwrap_or(false);
                if !present {
                    return Err(Error::topology(format!(
                        "stats node {} observes a node outside this pipeline",
                        node.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Render the graph in Graphviz DOT form, using display names.
    pub fn dot(&self, name: &str) -> Result<String> {
        let order = self.sort()?;
        let g = self.inner.lock().unwrap();
        let mut out = format!("digraph {name} {{\n");
        for id in &order {
            let node = g.nodes.get(id).expect("sorted node exists");
            for child in &node.children {
                let child = g.nodes.get(child).expect("child node exists");
                let _ = writeln!(out, "{} -> {};", node.display_name(), child.display_name());
            }
        }
        out.push('}');
        Ok(out)
    }

    /// Serialize the pipeline to its JSON wire value.
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        json::marshal(self)
    }

    /// Serialize the pipeline to its JSON wire string.
    pub fn marshal_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&json::marshal(self)?)?)
    }

    /// Reconstruct a pipeline from its JSON wire form.
    ///
    /// Any error aborts the whole load; no partial pipeline is returned.
    pub fn unmarshal_json(data: &[u8], deadman: DeadmanPolicy) -> Result<Pipeline> {
        json::unmarshal(data, deadman)
    }
}

fn insert_source(g: &mut PipelineInner, id: NodeId, kind: NodeKind) -> NodeId {
    let (wants, provides) = kind
        .signature(None)
        .expect("source kinds have a parentless signature");
    g.sources.push(id);
    insert_node(g, Node::new(id, wants, provides, kind));
    id
}

fn insert_node(g: &mut PipelineInner, node: Node) {
    let id = node.id;
    g.next_id = g.next_id.max(id.raw() + 1);
    g.nodes.insert(id, node);
    g.sorted = None;
}

fn graft_noop_if_childless(g: &mut PipelineInner, observed: NodeId) {
    let (childless, provides) = {
        let node = g.nodes.get(&observed).expect("observed node exists");
        (node.children.is_empty(), node.provides)
    };
    if !childless || provides == EdgeKind::None {
        return;
    }
    let id = NodeId::new(g.next_id);
    let mut noop = Node::new(id, provides, provides, NodeKind::Noop(NoopNode::default()));
    noop.parents.push(observed);
    g.nodes
        .get_mut(&observed)
        .expect("observed node exists")
        .children
        .push(id);
    insert_node(g, noop);
    debug!(parent = %observed, noop = %id, "grafted noop child");
}

/// Depth-first topological sort.
///
/// Sources are visited in reverse insertion order and children in reverse
/// link order; each node is appended once its subtree completes and the
/// final order is reversed, which yields parents-before-children with
/// sources (and siblings) in declaration order. Two marker states detect
/// re-entry: hitting a temporarily-marked node is a cycle.
fn sort_graph(nodes: &HashMap<NodeId, Node>, sources: &[NodeId]) -> Result<Vec<NodeId>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Temporary,
        Permanent,
    }

    fn visit(
        nodes: &HashMap<NodeId, Node>,
        id: NodeId,
        marks: &mut HashMap<NodeId, Mark>,
        order: &mut Vec<NodeId>,
    ) -> Result<()> {
        match marks.get(&id) {
            Some(Mark::Temporary) => {
                return Err(Error::topology(format!(
                    "pipeline contains a cycle through node {id}"
                )));
            }
            Some(Mark::Permanent) => return Ok(()),
            None => {}
        }
        marks.insert(id, Mark::Temporary);
        let node = nodes
            .get(&id)
            .ok_or_else(|| Error::topology(format!("edge references unknown node {id}")))?;
        for &child in node.children.iter().rev() {
            visit(nodes, child, marks, order)?;
        }
        marks.insert(id, Mark::Permanent);
        order.push(id);
        Ok(())
    }

    let mut marks = HashMap::new();
    let mut order = Vec::with_capacity(nodes.len());
    for &source in sources.iter().rev() {
        visit(nodes, source, &mut marks, &mut order)?;
    }
    if order.len() != nodes.len() {
        return Err(Error::topology(
            "pipeline contains nodes unreachable from its sources",
        ));
    }
    order.reverse();
    Ok(order)
}
