//! Tests for per-kind validation rules.

use alertflow::*;

fn stream_pipeline() -> (Pipeline, NodeRef<FromNode>) {
    let (pipeline, stream) = Pipeline::stream(DeadmanPolicy::default());
    let from = stream.from().unwrap();
    (pipeline, from)
}

fn expect_validation_error(pipeline: &Pipeline, needle: &str) {
    match pipeline.validate() {
        Err(Error::Validation { reason, .. }) => {
            assert!(reason.contains(needle), "reason {reason:?} missing {needle:?}")
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn test_barrier_requires_exactly_one_mode() {
    let (pipeline, from) = stream_pipeline();
    let barrier = from.barrier().unwrap();
    expect_validation_error(&pipeline, "exactly one of idle or period");

    let barrier = barrier.idle(Duration::minutes(1)).period(Duration::hours(1));
    expect_validation_error(&pipeline, "exactly one of idle or period");

    barrier.idle(Duration::ZERO);
    pipeline.validate().unwrap();
}

#[test]
fn test_window_period_count_rules() {
    // periodCount excludes a wall-time period.
    let (pipeline, from) = stream_pipeline();
    from.window()
        .unwrap()
        .period_count(5)
        .period(Duration::seconds(10));
    expect_validation_error(&pipeline, "periodCount");

    // periodCount excludes align.
    let (pipeline, from) = stream_pipeline();
    from.window().unwrap().period_count(5).align();
    expect_validation_error(&pipeline, "align");

    // periodCount needs a positive everyCount.
    let (pipeline, from) = stream_pipeline();
    let window = from.window().unwrap().period_count(5);
    expect_validation_error(&pipeline, "everyCount");

    window.every_count(1);
    pipeline.validate().unwrap();
}

#[test]
fn test_group_by_star_rules() {
    let (pipeline, from) = stream_pipeline();
    Chain::group_by(&from, &[Dimension::Star, Dimension::from("host")]).unwrap();
    expect_validation_error(&pipeline, "star");

    // Star alone is fine, optionally with exclusions.
    let (pipeline, from) = stream_pipeline();
    Chain::group_by(&from, &[Dimension::Star])
        .unwrap()
        .by_measurement()
        .exclude(&["host"]);
    pipeline.validate().unwrap();
}

#[test]
fn test_group_by_empty_dimension() {
    let (pipeline, from) = stream_pipeline();
    Chain::group_by(&from, &[Dimension::from("")]).unwrap();
    expect_validation_error(&pipeline, "empty");
}

#[test]
fn test_join_prefix_rules() {
    let (pipeline, from) = stream_pipeline();
    let other = from.mean("x").unwrap();
    let join = from.join(&[&other]).unwrap();

    // Prefix count must match parent count.
    expect_validation_error(&pipeline, "prefixes");

    // No prefix may contain the delimiter.
    let join = join.as_names(&["a.b", "c"]);
    expect_validation_error(&pipeline, "delimiter");

    // No duplicate prefixes.
    let join = join.as_names(&["a", "a"]);
    expect_validation_error(&pipeline, "duplicate");

    join.as_names(&["left", "right"]);
    pipeline.validate().unwrap();
}

#[test]
fn test_combine_rules_match_join() {
    let (pipeline, from) = stream_pipeline();
    let combine = from
        .combine(&[Lambda::new("TRUE"), Lambda::new("\"a\" > 1")])
        .unwrap();
    expect_validation_error(&pipeline, "prefixes");

    let combine = combine.as_names(&["x", "x"]);
    expect_validation_error(&pipeline, "duplicate");

    // An empty delimiter is allowed; collisions are the caller's concern.
    combine.as_names(&["x.y", "z"]).delimiter("");
    pipeline.validate().unwrap();
}

#[test]
fn test_eval_alias_rules() {
    let (pipeline, from) = stream_pipeline();
    let eval = from.eval(&[Lambda::new("1 + 1")]).unwrap();
    expect_validation_error(&pipeline, "result names");

    let eval = eval.alias(&["sum"]).tags(&["other"]);
    expect_validation_error(&pipeline, "not a result name");

    eval.tags(&["sum"]);
    pipeline.validate().unwrap();
}

#[test]
fn test_http_post_rules() {
    let (pipeline, from) = stream_pipeline();
    let post = from.http_post("http://example.com").unwrap();

    // url and endpoint are mutually exclusive.
    let post = post.endpoint("cached");
    expect_validation_error(&pipeline, "one of url or endpoint");

    // The authenticate header is reserved.
    let post = post.endpoint("");
    post.clone().header("Authenticate", "secret");
    expect_validation_error(&pipeline, "authenticate");
}

#[test]
fn test_alert_handler_rules() {
    // An alerta event needs a resource.
    let (pipeline, from) = stream_pipeline();
    from.alert().unwrap().crit("\"v\" > 1.0").alerta("");
    expect_validation_error(&pipeline, "resource");

    // A trap needs its OID; a configured one passes.
    let (pipeline, from) = stream_pipeline();
    from.alert()
        .unwrap()
        .crit("\"v\" > 1.0")
        .snmp_trap("1.3.6.1.4.1")
        .victor_ops()
        .kafka("alerts");
    pipeline.validate().unwrap();
}

#[test]
fn test_sample_requires_exactly_one_rate() {
    let (pipeline, from) = stream_pipeline();
    from.sample(0).unwrap();
    expect_validation_error(&pipeline, "count or every");

    let (pipeline, from) = stream_pipeline();
    from.sample_every(Duration::seconds(5)).unwrap();
    pipeline.validate().unwrap();
}

#[test]
fn test_k8s_autoscale_rules() {
    let (pipeline, from) = stream_pipeline();
    let scale = from
        .k8s_autoscale()
        .unwrap()
        .resource_name("web")
        .replicas("\"replicas\"");
    pipeline.validate().unwrap();

    // Newer three-option kind set.
    let scale = scale.kind("replicasets");
    pipeline.validate().unwrap();
    let scale = scale.kind("pods");
    expect_validation_error(&pipeline, "resource kind");
    let scale = scale.kind("deployments");

    // Exactly one name source.
    let scale = scale.resource_name_tag("name");
    expect_validation_error(&pipeline, "resourceName");
    let scale = scale.resource_name("");
    pipeline.validate().unwrap();

    // Bounds.
    scale.min(0);
    expect_validation_error(&pipeline, "min");
}

#[test]
fn test_swarm_and_ec2_autoscale_rules() {
    let (pipeline, from) = stream_pipeline();
    from.swarm_autoscale().unwrap();
    expect_validation_error(&pipeline, "serviceName");

    let (pipeline, from) = stream_pipeline();
    from.ec2_autoscale()
        .unwrap()
        .group_name("workers")
        .replicas("\"desired\"");
    pipeline.validate().unwrap();
}

#[test]
fn test_loopback_requires_database_and_rp() {
    let (pipeline, from) = stream_pipeline();
    let loopback = from.loopback().unwrap();
    expect_validation_error(&pipeline, "database");

    let loopback = loopback.database("telegraf");
    expect_validation_error(&pipeline, "retention policy");

    loopback.retention_policy("autogen");
    pipeline.validate().unwrap();
}

#[test]
fn test_state_duration_requires_predicate() {
    let (pipeline, from) = stream_pipeline();
    from.state_duration("").unwrap();
    expect_validation_error(&pipeline, "predicate");

    let (pipeline, from) = stream_pipeline();
    let configured = from.state_duration("\"cpu\" > 80").unwrap();
    assert_eq!(configured.config().alias, "state_duration");
    assert_eq!(configured.config().unit, Duration::seconds(1));
    pipeline.validate().unwrap();
}

#[test]
fn test_derivative_unit_must_be_positive() {
    let (pipeline, from) = stream_pipeline();
    from.derivative("value").unwrap().unit(Duration::ZERO);
    expect_validation_error(&pipeline, "unit");
}

#[test]
fn test_percentile_bounds() {
    let (pipeline, from) = stream_pipeline();
    from.percentile("value", 0.0).unwrap();
    expect_validation_error(&pipeline, "percentile");

    let (pipeline2, from2) = stream_pipeline();
    from2.percentile("value", 99.9).unwrap();
    pipeline2.validate().unwrap();
}

#[test]
fn test_change_detect_needs_fields() {
    let (pipeline, from) = stream_pipeline();
    from.change_detect(&[]).unwrap();
    expect_validation_error(&pipeline, "at least one field");
}

#[test]
fn test_validation_error_names_node_and_kind() {
    let (pipeline, from) = stream_pipeline();
    let barrier = from.barrier().unwrap();
    match pipeline.validate() {
        Err(Error::Validation { id, kind, .. }) => {
            assert_eq!(id, barrier.id());
            assert_eq!(kind, "barrier");
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}
