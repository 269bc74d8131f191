//! Tests for node ID assignment and wire parsing.

use std::collections::HashSet;

use alertflow::{Chain, DeadmanPolicy, NodeId, Pipeline};

#[test]
fn test_ids_are_dense_and_monotonic() {
    let (pipeline, stream) = Pipeline::stream(DeadmanPolicy::default());
    let from = stream.from().unwrap();
    let window = from.window().unwrap();
    let mean = window.mean("value").unwrap();

    assert_eq!(stream.id().raw(), 0);
    assert_eq!(from.id().raw(), 1);
    assert_eq!(window.id().raw(), 2);
    assert_eq!(mean.id().raw(), 3);

    // IDs are exactly {0..n-1}.
    let (nodes, _) = pipeline.snapshot();
    let ids: HashSet<u64> = nodes.keys().map(|id| id.raw()).collect();
    let expected: HashSet<u64> = (0..nodes.len() as u64).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_ids_unique_across_branches() {
    let (pipeline, stream) = Pipeline::stream(DeadmanPolicy::default());
    let a = stream.from().unwrap();
    let b = stream.from().unwrap();
    let c = a.sum("x").unwrap();
    let d = b.sum("x").unwrap();

    let ids: HashSet<_> = [a.id(), b.id(), c.id(), d.id()].into_iter().collect();
    assert_eq!(ids.len(), 4);
    assert_eq!(pipeline.len(), 5);
}

#[test]
fn test_wire_parse_and_display() {
    let id: NodeId = "42".parse().unwrap();
    assert_eq!(id.raw(), 42);
    assert_eq!(id.to_string(), "42");
}

#[test]
fn test_wire_parse_rejects_garbage() {
    assert!("".parse::<NodeId>().is_err());
    assert!("-1".parse::<NodeId>().is_err());
    assert!("abc".parse::<NodeId>().is_err());
    assert!("1.5".parse::<NodeId>().is_err());
}
