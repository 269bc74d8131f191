//! Cross-cutting graph invariants, checked over a representative pipeline.

use std::collections::HashSet;

use alertflow::*;

/// Build one pipeline exercising most of the catalogue.
fn build() -> Pipeline {
    let (pipeline, stream) = Pipeline::stream(DeadmanPolicy::default());
    let from = stream
        .from()
        .unwrap()
        .measurement("cpu")
        .group_by(&[Dimension::from("host")]);

    let windowed = from
        .window()
        .unwrap()
        .period(Duration::minutes(5))
        .every(Duration::minutes(1));
    let mean = windowed.mean("usage_system").unwrap();
    mean.alert()
        .unwrap()
        .crit("\"mean\" > 90.0")
        .slack()
        .http_out("cpu")
        .unwrap();

    let other = from.sample(10).unwrap();
    mean.join(&[&other])
        .unwrap()
        .as_names(&["m", "s"])
        .influxdb_out("telegraf")
        .unwrap();

    from.deadman(1.0, Duration::minutes(1), &[]).unwrap();
    pipeline
}

#[test]
fn test_representative_pipeline_validates() {
    build().validate().unwrap();
}

#[test]
fn test_every_edge_is_type_compatible() {
    let pipeline = build();
    let (nodes, edges) = pipeline.snapshot();
    for (parent, child) in edges {
        let provides = nodes[&parent].provides();
        let wants = nodes[&child].wants();
        assert!(
            provides.feeds(wants),
            "{} ({provides}) cannot feed {} ({wants})",
            nodes[&parent].display_name(),
            nodes[&child].display_name(),
        );
    }
}

#[test]
fn test_every_edge_respects_sort_order() {
    let pipeline = build();
    let order = pipeline.sort().unwrap();
    let position = |id: NodeId| order.iter().position(|o| *o == id).unwrap();
    let (_, edges) = pipeline.snapshot();
    for (parent, child) in edges {
        assert!(position(parent) < position(child));
    }
}

#[test]
fn test_ids_are_exactly_zero_to_n() {
    let pipeline = build();
    let (nodes, _) = pipeline.snapshot();
    let ids: HashSet<u64> = nodes.keys().map(|id| id.raw()).collect();
    let expected: HashSet<u64> = (0..nodes.len() as u64).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_arity_invariants() {
    let pipeline = build();
    let (nodes, _) = pipeline.snapshot();
    for node in nodes.values() {
        match node.descriptor() {
            "stream" | "batch" | "stats" => assert!(node.parents().is_empty()),
            "union" | "join" => assert!(node.parents().len() >= 2),
            _ => assert_eq!(node.parents().len(), 1, "{}", node.display_name()),
        }
    }
}

#[test]
fn test_stats_observed_nodes_are_present() {
    let pipeline = build();
    let (nodes, _) = pipeline.snapshot();
    for node in nodes.values() {
        if let NodeKind::Stats(stats) = node.kind() {
            let observed = stats.observed.expect("stats carries its observed node");
            assert!(nodes.contains_key(&observed));
        }
    }
}

#[test]
fn test_round_trip_preserves_shape() {
    let pipeline = build();
    let wire = pipeline.to_json_value().unwrap();
    let restored =
        Pipeline::unmarshal_json(wire.to_string().as_bytes(), DeadmanPolicy::default()).unwrap();
    assert_eq!(restored.to_json_value().unwrap(), wire);
    assert_eq!(restored.len(), pipeline.len());
    assert_eq!(restored.sort().unwrap(), pipeline.sort().unwrap());
}
