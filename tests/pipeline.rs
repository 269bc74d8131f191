//! Tests for pipeline graph functionality.

use alertflow::*;

fn policy() -> DeadmanPolicy {
    DeadmanPolicy::default()
}

#[test]
fn test_stream_factory() {
    let (pipeline, stream) = Pipeline::stream(policy());
    assert_eq!(pipeline.len(), 1);
    assert_eq!(pipeline.sources(), vec![stream.id()]);

    let node = pipeline.node(stream.id()).unwrap();
    assert_eq!(node.descriptor(), "stream");
    assert_eq!(node.wants(), EdgeKind::None);
    assert_eq!(node.provides(), EdgeKind::Stream);
}

#[test]
fn test_batch_factory() {
    let (pipeline, batch) = Pipeline::batch(policy());
    let node = pipeline.node(batch.id()).unwrap();
    assert_eq!(node.descriptor(), "batch");
    assert_eq!(node.provides(), EdgeKind::Batch);
    assert!(pipeline.node("7".parse().unwrap()).is_none());
}

#[test]
fn test_links_are_recorded_both_ways() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let from = stream.from().unwrap();
    let window = from.window().unwrap();

    let from_node = pipeline.node(from.id()).unwrap();
    assert_eq!(from_node.parents(), &[stream.id()]);
    assert_eq!(from_node.children(), &[window.id()]);

    let window_node = pipeline.node(window.id()).unwrap();
    assert_eq!(window_node.parents(), &[from.id()]);
    assert!(window_node.children().is_empty());
}

#[test]
fn test_sorted_order_respects_edges() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let from = stream.from().unwrap();
    let a = from.mean("x").unwrap();
    let b = from.sum("x").unwrap();
    let joined = a.join(&[&b]).unwrap().as_names(&["m", "s"]);

    let order = pipeline.sort().unwrap();
    assert_eq!(order.len(), pipeline.len());

    let index = |id: NodeId| order.iter().position(|o| *o == id).unwrap();
    let (_, edges) = pipeline.snapshot();
    assert!(!edges.is_empty());
    for (parent, child) in edges {
        assert!(
            index(parent) < index(child),
            "edge {parent} -> {child} out of order"
        );
    }
    assert_eq!(index(joined.id()), order.len() - 1);
}

#[test]
fn test_sorted_order_is_cached_and_deterministic() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let from = stream.from().unwrap();
    from.mean("x").unwrap();
    from.sum("x").unwrap();

    let first = pipeline.sort().unwrap();
    let second = pipeline.sort().unwrap();
    assert_eq!(first, second);

    // A structural change invalidates the cached order.
    from.count("x").unwrap();
    let third = pipeline.sort().unwrap();
    assert_eq!(third.len(), first.len() + 1);
}

#[test]
fn test_sources_sort_in_declaration_order() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let from = stream.from().unwrap();
    // Stats nodes are additional sources, declared after the stream.
    let stats = from.stats(Duration::seconds(10));

    let order = pipeline.sort().unwrap();
    assert_eq!(order.first(), Some(&stream.id()));
    assert_eq!(order.last(), Some(&stats.id()));
}

#[test]
fn test_walk_visits_parents_first_and_stops_on_error() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let from = stream.from().unwrap();
    from.window().unwrap();

    let mut seen = Vec::new();
    pipeline
        .walk(|node| {
            seen.push(node.descriptor());
            Ok(())
        })
        .unwrap();
    assert_eq!(seen, vec!["stream", "from", "window"]);

    let mut visited = 0;
    let err = pipeline.walk(|node| {
        visited += 1;
        if node.descriptor() == "from" {
            Err(Error::Topology("stop".to_string()))
        } else {
            Ok(())
        }
    });
    assert!(err.is_err());
    assert_eq!(visited, 2);
}

#[test]
fn test_validate_flags_arity() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let from = stream.from().unwrap();
    // A union built through the fluent API always has two or more parents;
    // validation still proves the invariant holds after construction.
    let other = stream.from().unwrap();
    from.union(&[&other]).unwrap();
    pipeline.validate().unwrap();
}

#[test]
fn test_snapshot_is_independent() {
    let (pipeline, stream) = Pipeline::stream(policy());
    stream.from().unwrap();
    let (nodes1, edges1) = pipeline.snapshot();

    stream.from().unwrap();
    let (nodes2, edges2) = pipeline.snapshot();

    assert!(nodes2.len() > nodes1.len());
    assert!(edges2.len() > edges1.len());
}

#[test]
fn test_pipeline_clone_shares_state() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let clone = pipeline.clone();
    stream.from().unwrap();
    assert_eq!(clone.len(), pipeline.len());
}

#[test]
fn test_long_chain() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let mut tail = stream.from().unwrap().where_expr("TRUE").unwrap();
    for _ in 0..100 {
        tail = tail.where_expr("TRUE").unwrap();
    }
    let order = pipeline.sort().unwrap();
    assert_eq!(order.len(), 103);
    assert_eq!(order.last(), Some(&tail.id()));
}

#[test]
fn test_named_and_quiet() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let from = stream.from().unwrap().named("cpu_branch").quiet();
    let node = pipeline.node(from.id()).unwrap();
    assert_eq!(node.name(), Some("cpu_branch"));
    assert_eq!(node.display_name(), "cpu_branch");
    assert!(node.quiet());

    // Default names are <descriptor><id>.
    let window = from.window().unwrap();
    assert_eq!(window.display_name(), format!("window{}", window.id()));
}
