//! Tests for the fluent chain-builder surface.

use alertflow::*;

fn policy() -> DeadmanPolicy {
    DeadmanPolicy::default()
}

#[test]
fn test_window_promotes_stream_to_batch() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let window = stream.from().unwrap().window().unwrap();
    let node = pipeline.node(window.id()).unwrap();
    assert_eq!(node.wants(), EdgeKind::Stream);
    assert_eq!(node.provides(), EdgeKind::Batch);
}

#[test]
fn test_window_rejects_batch_parent() {
    let (_pipeline, batch) = Pipeline::batch(policy());
    let query = batch.query("SELECT * FROM cpu").unwrap();
    let err = query.window().unwrap_err();
    assert!(matches!(err, Error::TypeMismatch(_)), "got {err}");
}

#[test]
fn test_combine_rejects_batch_parent() {
    let (_pipeline, batch) = Pipeline::batch(policy());
    let query = batch.query("SELECT * FROM cpu").unwrap();
    let err = query
        .combine(&[Lambda::new("TRUE"), Lambda::new("TRUE")])
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch(_)));
}

#[test]
fn test_edge_compatibility() {
    assert!(EdgeKind::Stream.feeds(EdgeKind::Stream));
    assert!(EdgeKind::Batch.feeds(EdgeKind::Batch));
    assert!(!EdgeKind::Stream.feeds(EdgeKind::Batch));
    // A terminal node feeds nothing, not even another terminal.
    assert!(!EdgeKind::None.feeds(EdgeKind::None));
}

#[test]
fn test_passthrough_keeps_edge_type() {
    let (pipeline, batch) = Pipeline::batch(policy());
    let where_node = batch
        .query("SELECT * FROM cpu")
        .unwrap()
        .where_expr("\"host\" == 'a'")
        .unwrap();
    let node = pipeline.node(where_node.id()).unwrap();
    assert_eq!(node.wants(), EdgeKind::Batch);
    assert_eq!(node.provides(), EdgeKind::Batch);
}

#[test]
fn test_aggregations_reduce_to_stream() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let window = stream.from().unwrap().window().unwrap();
    let mean = window.mean("value").unwrap();
    let node = pipeline.node(mean.id()).unwrap();
    assert_eq!(node.wants(), EdgeKind::Batch);
    assert_eq!(node.provides(), EdgeKind::Stream);
    assert_eq!(node.descriptor(), "mean");
}

#[test]
fn test_top_bottom_provide_batches() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let from = stream.from().unwrap();
    let top = from.top(5, "value", &["host"]).unwrap();
    assert_eq!(pipeline.node(top.id()).unwrap().provides(), EdgeKind::Batch);

    let bottom = from.bottom(3, "value", &[]).unwrap();
    assert_eq!(
        pipeline.node(bottom.id()).unwrap().descriptor(),
        "bottom"
    );
}

#[test]
fn test_sinks_are_terminal() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let out = stream.from().unwrap().http_out("cpu").unwrap();
    let node = pipeline.node(out.id()).unwrap();
    assert_eq!(node.provides(), EdgeKind::None);
}

#[test]
fn test_failed_attach_leaves_no_node_behind() {
    let (pipeline, batch) = Pipeline::batch(policy());
    let query = batch
        .query("SELECT * FROM cpu")
        .unwrap()
        .period(Duration::minutes(1));
    assert!(query.window().is_err());
    assert_eq!(pipeline.len(), 2);
    pipeline.validate().unwrap();
}

#[test]
fn test_union_requires_same_edge_type() {
    let (_pipeline, stream) = Pipeline::stream(policy());
    let from = stream.from().unwrap();
    let batched = from.window().unwrap();
    let err = from.union(&[&batched]).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch(_)));
}

#[test]
fn test_union_requires_another_parent() {
    let (_pipeline, stream) = Pipeline::stream(policy());
    let from = stream.from().unwrap();
    let err = from.union(&[]).unwrap_err();
    assert!(matches!(err, Error::Topology(_)));
}

#[test]
fn test_union_of_three_branches() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let a = stream.from().unwrap();
    let b = stream.from().unwrap();
    let c = stream.from().unwrap();
    let union = a.union(&[&b, &c]).unwrap().rename("merged");

    let node = pipeline.node(union.id()).unwrap();
    assert_eq!(node.parents(), &[a.id(), b.id(), c.id()]);
    match node.kind() {
        NodeKind::Union(u) => assert_eq!(u.rename, "merged"),
        other => panic!("expected union, got {}", other.descriptor()),
    }
}

#[test]
fn test_join_across_pipelines_is_rejected() {
    let (_p1, stream1) = Pipeline::stream(policy());
    let (_p2, stream2) = Pipeline::stream(policy());
    let a = stream1.from().unwrap();
    let b = stream2.from().unwrap();
    let err = a.join(&[&b]).unwrap_err();
    assert!(matches!(err, Error::Topology(_)));
}

#[test]
fn test_property_setters_chain_and_stick() {
    let (_pipeline, stream) = Pipeline::stream(policy());
    let window = stream
        .from()
        .unwrap()
        .window()
        .unwrap()
        .period(Duration::minutes(5))
        .every(Duration::minutes(1))
        .align()
        .fill_period();

    let config = window.config();
    assert_eq!(config.period, Duration::minutes(5));
    assert_eq!(config.every, Duration::minutes(1));
    assert!(config.align);
    assert!(config.fill_period);
}

#[test]
fn test_from_properties() {
    let (_pipeline, stream) = Pipeline::stream(policy());
    let from = stream
        .from()
        .unwrap()
        .database("telegraf")
        .retention_policy("autogen")
        .measurement("cpu")
        .where_filter("\"cpu\" == 'cpu-total'")
        .group_by(&[Dimension::from("host"), Dimension::from("dc")])
        .truncate(Duration::seconds(1));

    let config = from.config();
    assert_eq!(config.database, "telegraf");
    assert_eq!(config.retention_policy, "autogen");
    assert_eq!(config.measurement, "cpu");
    assert_eq!(
        config.where_expr.unwrap().expression,
        "\"cpu\" == 'cpu-total'"
    );
    assert_eq!(config.group_by.len(), 2);
    assert_eq!(config.truncate, Duration::seconds(1));
}

#[test]
fn test_source_filter_rejected_below_wrong_parent() {
    // The typed API cannot express query-under-stream; the shared attach
    // path still rejects a from filter below anything but a stream source.
    let (_pipeline, batch) = Pipeline::batch(policy());
    let err = batch
        .query("SELECT 1")
        .unwrap()
        .attach(FromNode::default())
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch(_)));
}

#[test]
fn test_udf_passes_edge_through() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let udf = stream
        .from()
        .unwrap()
        .udf("myFunc")
        .unwrap()
        .option("size", &[FieldValue::Int(10)]);
    let node = pipeline.node(udf.id()).unwrap();
    assert_eq!(node.wants(), EdgeKind::Stream);
    assert_eq!(node.provides(), EdgeKind::Stream);
    assert_eq!(node.descriptor(), "udf");
}

#[test]
fn test_alert_is_chainable() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let alert = stream
        .from()
        .unwrap()
        .alert()
        .unwrap()
        .crit("\"value\" > 90.0");
    let out = alert.http_out("output").unwrap();
    let influx = alert.influxdb_out("alerts").unwrap();

    let node = pipeline.node(alert.id()).unwrap();
    assert_eq!(node.provides(), EdgeKind::Stream);
    assert_eq!(node.children(), &[out.id(), influx.id()]);
}

#[test]
fn test_chain_methods_enumeration() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let from = stream.from().unwrap();
    let out = from.http_out("x").unwrap();

    let stream_node = pipeline.node(stream.id()).unwrap();
    assert_eq!(stream_node.kind().chain_methods(), &["from"]);
    assert!(!stream_node.kind().is_chain_capable());

    let from_node = pipeline.node(from.id()).unwrap();
    assert!(from_node.kind().is_chain_capable());
    assert!(from_node.kind().chain_methods().contains(&"window"));
    assert!(from_node.kind().chain_methods().contains(&"holtWinters"));

    let out_node = pipeline.node(out.id()).unwrap();
    assert!(out_node.kind().chain_methods().is_empty());
}
