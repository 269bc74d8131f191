//! The JSON wire codec.
//!
//! The wire shape linearizes the DAG into explicit nodes and edges:
//!
//! ```json
//! {
//!   "nodes": [ { "typeOf": "stream", "id": "0" }, ... ],
//!   "edges": [ { "parent": "0", "child": "1" }, ... ]
//! }
//! ```
//!
//! Every node object carries its `typeOf` discriminator and its `id` as a
//! decimal string (IDs stay strings on the wire so consumers without 64-bit
//! JSON numbers survive). Marshalling emits nodes in topological order,
//! skips `noop` placeholders, materializes each stats node's observed
//! relation as a synthetic edge, and normalizes away duplicate edges.
//! Unmarshalling parses the edge list, topologically sorts the IDs with an
//! independent sorter (rejecting cycles and dangling references), then
//! walks parent-first, dispatching each discriminator to the construction
//! path of its category and unmarshalling the per-kind fields into a
//! default-shaped node. Reconstruction ends with a full validation pass;
//! any error aborts the whole load.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::deadman::DeadmanPolicy;
use crate::error::{Error, Result};
use crate::node::{Dispatch, NodeKind};
use crate::node_id::NodeId;
use crate::pipeline::Pipeline;

/// A node ID as it appears on the wire: a decimal string. Legacy payloads
/// may carry bare integers; both decode.
#[derive(Clone, Copy)]
struct WireId(NodeId);

impl Serialize for WireId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

struct WireIdVisitor;

impl<'de> Visitor<'de> for WireIdVisitor {
    type Value = WireId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a node id as a decimal string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<WireId, E> {
        v.parse().map(WireId).map_err(de::Error::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<WireId, E> {
        Ok(WireId(NodeId::new(v)))
    }
}

impl<'de> Deserialize<'de> for WireId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(WireIdVisitor)
    }
}

/// One serialized edge: parent feeds child.
#[derive(Serialize, Deserialize)]
struct WireEdge {
    parent: WireId,
    child: WireId,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    nodes: Vec<Value>,
    #[serde(default)]
    edges: Vec<WireEdge>,
}

fn push_edge(
    edges: &mut Vec<WireEdge>,
    seen: &mut HashSet<(NodeId, NodeId)>,
    parent: NodeId,
    child: NodeId,
) {
    if seen.insert((parent, child)) {
        edges.push(WireEdge {
            parent: WireId(parent),
            child: WireId(child),
        });
    }
}

/// Serialize a pipeline to its wire value.
pub(crate) fn marshal(pipeline: &Pipeline) -> Result<Value> {
    let order = pipeline.sort()?;
    let g = pipeline.inner.lock().unwrap();
    let mut nodes = Vec::with_capacity(order.len());
    let mut edges = Vec::new();
    let mut seen = HashSet::new();
    for id in &order {
        let node = g.nodes.get(id).expect("sorted node exists");
        if matches!(node.kind, NodeKind::Noop(_)) {
            continue;
        }
        if let NodeKind::Stats(stats) = &node.kind {
            let observed = stats.observed.ok_or_else(|| {
                Error::topology(format!("stats node {id} has no observed node"))
            })?;
            push_edge(&mut edges, &mut seen, observed, *id);
        }
        let mut map = node.kind.to_wire()?;
        map.insert(
            "typeOf".to_string(),
            Value::String(node.descriptor().to_string()),
        );
        map.insert("id".to_string(), Value::String(id.to_string()));
        nodes.push(Value::Object(map));
        for &parent in &node.parents {
            push_edge(&mut edges, &mut seen, parent, *id);
        }
    }
    debug!(nodes = nodes.len(), edges = edges.len(), "marshalled pipeline");
    Ok(serde_json::json!({ "nodes": nodes, "edges": edges }))
}

/// Reconstruct a pipeline from its wire bytes.
pub(crate) fn unmarshal(data: &[u8], deadman: DeadmanPolicy) -> Result<Pipeline> {
    let envelope: Envelope = serde_json::from_slice(data)?;

    struct Raw {
        id: NodeId,
        type_of: String,
        value: Value,
    }

    let mut records = Vec::with_capacity(envelope.nodes.len());
    let mut listed = Vec::with_capacity(envelope.nodes.len());
    let mut known = HashSet::new();
    for value in envelope.nodes {
        let type_of = value
            .get("typeOf")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::format("node object is missing typeOf"))?
            .to_string();
        let id = parse_wire_id(value.get("id"))?;
        if !known.insert(id) {
            return Err(Error::topology(format!("duplicate node id {id}")));
        }
        listed.push(id);
        records.push(Raw { id, type_of, value });
    }

    let mut edges = Vec::with_capacity(envelope.edges.len());
    for edge in &envelope.edges {
        let (parent, child) = (edge.parent.0, edge.child.0);
        for end in [parent, child] {
            if !known.contains(&end) {
                return Err(Error::topology(format!(
                    "edge references unknown node {end}"
                )));
            }
        }
        edges.push((parent, child));
    }

    let positions = sort_ids(&listed, &edges)?;
    records.sort_by_key(|record| {
        positions
            .get(&record.id)
            .copied()
            .expect("every listed node has a position")
    });

    let mut parents_of: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut seen = HashSet::new();
    for &(parent, child) in &edges {
        if seen.insert((parent, child)) {
            parents_of.entry(child).or_default().push(parent);
        }
    }

    let pipeline = Pipeline::new(deadman);
    for record in records {
        let kind = NodeKind::from_wire(&record.type_of, &record.value)?.ok_or_else(|| {
            Error::format(format!(
                "unknown node type {} for node {}",
                record.type_of, record.id
            ))
        })?;
        let parents = parents_of.get(&record.id).cloned().unwrap_or_default();
        match kind.dispatch() {
            Dispatch::Source => {
                if !parents.is_empty() {
                    return Err(Error::topology(format!(
                        "{} node {} must not have parents",
                        kind.descriptor(),
                        record.id
                    )));
                }
                pipeline.add_source_with_id(record.id, kind)?;
            }
            Dispatch::Stats => {
                if parents.len() != 1 {
                    return Err(Error::topology(format!(
                        "stats node {} requires exactly one observed parent",
                        record.id
                    )));
                }
                let stats = match kind {
                    NodeKind::Stats(stats) => stats,
                    _ => unreachable!("stats dispatch only matches stats kinds"),
                };
                pipeline.graft_stats_with_id(record.id, parents[0], stats)?;
            }
            _ => {
                pipeline.attach_with_id(record.id, &parents, kind)?;
            }
        }
    }

    pipeline.validate()?;
    debug!(nodes = pipeline.len(), "unmarshalled pipeline");
    Ok(pipeline)
}

fn parse_wire_id(value: Option<&Value>) -> Result<NodeId> {
    match value {
        Some(Value::String(s)) => s.parse(),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(NodeId::new)
            .ok_or_else(|| Error::format(format!("invalid node id {n}"))),
        _ => Err(Error::format("node object is missing id")),
    }
}

/// Topological sort over bare IDs, mirroring the node sorter: roots are
/// nodes without incoming edges in listed order, children are visited in
/// edge-list order, and re-entering an in-progress ID is a cycle. Returns
/// each ID's final position.
fn sort_ids(listed: &[NodeId], edges: &[(NodeId, NodeId)]) -> Result<HashMap<NodeId, usize>> {
    let mut children_of: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut has_parent = HashSet::new();
    let mut seen = HashSet::new();
    for &(parent, child) in edges {
        if seen.insert((parent, child)) {
            children_of.entry(parent).or_default().push(child);
            has_parent.insert(child);
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Temporary,
        Permanent,
    }

    fn visit(
        id: NodeId,
        children_of: &HashMap<NodeId, Vec<NodeId>>,
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
        if let Some(children) = children_of.get(&id) {
            for &child in children.iter().rev() {
                visit(child, children_of, marks, order)?;
            }
        }
        marks.insert(id, Mark::Permanent);
        order.push(id);
        Ok(())
    }

    let mut marks = HashMap::new();
    let mut order = Vec::with_capacity(listed.len());
    for &root in listed.iter().rev() {
        if !has_parent.contains(&root) {
            visit(root, &children_of, &mut marks, &mut order)?;
        }
    }
    if order.len() != listed.len() {
        return Err(Error::topology("pipeline contains a cycle"));
    }
    order.reverse();
    Ok(order
        .into_iter()
        .enumerate()
        .map(|(position, id)| (id, position))
        .collect())
}
