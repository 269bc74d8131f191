//! Tests for the JSON wire codec: marshal shape, reconstruction, and the
//! round-trip laws.

use alertflow::*;
use serde_json::{Value, json};

fn policy() -> DeadmanPolicy {
    DeadmanPolicy::default()
}

fn unmarshal(value: &Value) -> Result<Pipeline> {
    Pipeline::unmarshal_json(value.to_string().as_bytes(), policy())
}

#[test]
fn test_stream_from_window_marshal_shape() {
    let (pipeline, stream) = Pipeline::stream(policy());
    stream
        .from()
        .unwrap()
        .window()
        .unwrap()
        .period(Duration::seconds(10))
        .every(Duration::seconds(1));

    let value = pipeline.to_json_value().unwrap();
    let nodes = value["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);

    assert_eq!(nodes[0]["typeOf"], "stream");
    assert_eq!(nodes[0]["id"], "0");
    assert_eq!(nodes[1]["typeOf"], "from");
    assert_eq!(nodes[1]["id"], "1");
    assert_eq!(nodes[2]["typeOf"], "window");
    assert_eq!(nodes[2]["id"], "2");
    assert_eq!(nodes[2]["period"], "10s");
    assert_eq!(nodes[2]["every"], "1s");
    assert_eq!(nodes[2]["align"], false);

    assert_eq!(
        value["edges"],
        json!([
            { "parent": "0", "child": "1" },
            { "parent": "1", "child": "2" },
        ])
    );
}

#[test]
fn test_stream_from_window_round_trip() -> anyhow::Result<()> {
    let (pipeline, stream) = Pipeline::stream(policy());
    stream
        .from()?
        .window()?
        .period(Duration::seconds(10))
        .every(Duration::seconds(1));

    let wire = pipeline.marshal_json()?;
    let restored = Pipeline::unmarshal_json(wire.as_bytes(), policy())?;

    let order = restored.sort()?;
    let kinds: Vec<&str> = order
        .iter()
        .map(|id| restored.node(*id).unwrap().descriptor())
        .collect();
    assert_eq!(kinds, vec!["stream", "from", "window"]);

    // IDs survive.
    let raws: Vec<u64> = order.iter().map(|id| id.raw()).collect();
    assert_eq!(raws, vec![0, 1, 2]);

    let window = restored.node(order[2]).unwrap();
    match window.kind() {
        NodeKind::Window(w) => {
            assert_eq!(w.period, Duration::seconds(10));
            assert_eq!(w.every, Duration::seconds(1));
        }
        other => panic!("expected window, got {}", other.descriptor()),
    }
    Ok(())
}

#[test]
fn test_barrier_marshal_shape() {
    let (pipeline, stream) = Pipeline::stream(policy());
    stream
        .from()
        .unwrap()
        .barrier()
        .unwrap()
        .idle(Duration::minutes(1))
        .period(Duration::hours(1))
        .delete(true);

    let value = pipeline.to_json_value().unwrap();
    assert_eq!(
        value["nodes"][2],
        json!({
            "typeOf": "barrier",
            "id": "2",
            "delete": true,
            "period": "1h",
            "idle": "1m",
        })
    );

    // Setting both idle and period is still a validation failure.
    assert!(matches!(
        pipeline.validate(),
        Err(Error::Validation { .. })
    ));
}

#[test]
fn test_alert_with_handlers_wire_shape() -> anyhow::Result<()> {
    let (pipeline, stream) = Pipeline::stream(policy());
    let from = stream
        .from()?
        .measurement("cpu")
        .where_filter("TRUE")
        .group_by(&[Dimension::from("host")]);
    let eval = from
        .eval(&[Lambda::new("\"usage_system\"")])?
        .alias(&["value"]);
    let alert = eval
        .alert()?
        .crit("\"value\" > 90.0")
        .post("http://howdy.local")
        .state_changes_only();
    alert.http_out("output")?;
    alert
        .influxdb_out("alerts")?
        .tag("alertName", "Ruley McRuleface")
        .tag("triggerType", "threshold");

    pipeline.validate()?;
    let value = pipeline.to_json_value()?;

    let alert_value = value["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["typeOf"] == "alert")
        .unwrap();

    // The crit expression is a nested lambda object.
    assert_eq!(
        alert_value["crit"],
        json!({ "typeOf": "lambda", "expression": "\"value\" > 90.0" })
    );
    // One configured post handler, unset channels as null.
    assert_eq!(alert_value["post"][0]["url"], "http://howdy.local");
    assert_eq!(alert_value["slack"], Value::Null);
    assert_eq!(alert_value["email"], Value::Null);
    assert_eq!(alert_value["victorOps"], Value::Null);
    assert_eq!(alert_value["snmpTrap"], Value::Null);
    assert_eq!(alert_value["stateChangesOnly"], true);

    // The alert (id 3) fans out to both outputs.
    let edges = value["edges"].as_array().unwrap();
    assert!(edges.contains(&json!({ "parent": "3", "child": "4" })));
    assert!(edges.contains(&json!({ "parent": "3", "child": "5" })));

    // And the whole thing survives a round trip.
    let restored = unmarshal(&value)?;
    assert_eq!(restored.to_json_value()?, value);
    Ok(())
}

#[test]
fn test_marshal_is_deterministic_and_round_trip_stable() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let from = stream.from().unwrap().measurement("m");
    let a = from.mean("x").unwrap().alias("avg");
    let b = from.last("x").unwrap();
    a.join(&[&b]).unwrap().as_names(&["avg", "last"]);

    let first = pipeline.to_json_value().unwrap();
    let second = pipeline.to_json_value().unwrap();
    assert_eq!(first, second);

    // A decode/encode cycle reproduces the same wire value.
    let wire = first;
    let restored = unmarshal(&wire).unwrap();
    assert_eq!(restored.to_json_value().unwrap(), wire);
}

#[test]
fn test_top_round_trip() {
    let (pipeline, stream) = Pipeline::stream(policy());
    stream
        .from()
        .unwrap()
        .top(3, "x", &["host"])
        .unwrap()
        .use_point_times();

    let wire = pipeline.to_json_value().unwrap();
    let restored = unmarshal(&wire).unwrap();
    assert_eq!(restored.to_json_value().unwrap(), wire);
}

#[test]
fn test_unknown_node_type_names_id_and_type() {
    let err = unmarshal(&json!({
        "nodes": [ { "typeOf": "unknown", "id": "0" } ],
        "edges": [],
    }))
    .unwrap_err();
    match err {
        Error::Format(message) => {
            assert!(message.contains("unknown"), "{message}");
            assert!(message.contains('0'), "{message}");
        }
        other => panic!("expected a format error, got {other}"),
    }
}

#[test]
fn test_cycle_is_rejected() {
    let err = unmarshal(&json!({
        "nodes": [
            { "typeOf": "stream", "id": "0" },
            { "typeOf": "from", "id": "1" },
            { "typeOf": "where", "id": "2", "lambda": { "typeOf": "lambda", "expression": "TRUE" } },
        ],
        "edges": [
            { "parent": "0", "child": "1" },
            { "parent": "1", "child": "2" },
            { "parent": "2", "child": "0" },
        ],
    }))
    .unwrap_err();
    assert!(matches!(err, Error::Topology(_)), "got {err}");
}

#[test]
fn test_rootless_cycle_is_rejected() {
    let err = unmarshal(&json!({
        "nodes": [
            { "typeOf": "where", "id": "0", "lambda": { "typeOf": "lambda", "expression": "TRUE" } },
            { "typeOf": "where", "id": "1", "lambda": { "typeOf": "lambda", "expression": "TRUE" } },
            { "typeOf": "where", "id": "2", "lambda": { "typeOf": "lambda", "expression": "TRUE" } },
        ],
        "edges": [
            { "parent": "0", "child": "1" },
            { "parent": "1", "child": "2" },
            { "parent": "2", "child": "0" },
        ],
    }))
    .unwrap_err();
    assert!(matches!(err, Error::Topology(_)));
}

#[test]
fn test_dangling_edge_is_rejected() {
    let err = unmarshal(&json!({
        "nodes": [ { "typeOf": "stream", "id": "0" } ],
        "edges": [ { "parent": "0", "child": "9" } ],
    }))
    .unwrap_err();
    match err {
        Error::Topology(message) => assert!(message.contains('9'), "{message}"),
        other => panic!("expected a topology error, got {other}"),
    }
}

#[test]
fn test_duplicate_edges_are_tolerated_and_normalized() {
    let wire = json!({
        "nodes": [
            { "typeOf": "stream", "id": "0" },
            { "typeOf": "from", "id": "1" },
        ],
        "edges": [
            { "parent": "0", "child": "1" },
            { "parent": "0", "child": "1" },
        ],
    });
    let restored = unmarshal(&wire).unwrap();
    let value = restored.to_json_value().unwrap();
    assert_eq!(value["edges"].as_array().unwrap().len(), 1);
}

#[test]
fn test_source_with_parents_is_rejected() {
    let err = unmarshal(&json!({
        "nodes": [
            { "typeOf": "stream", "id": "0" },
            { "typeOf": "stream", "id": "1" },
        ],
        "edges": [ { "parent": "0", "child": "1" } ],
    }))
    .unwrap_err();
    assert!(matches!(err, Error::Topology(_)));
}

#[test]
fn test_wrong_parent_kind_is_rejected() {
    // A query filter cannot hang below a stream source.
    let err = unmarshal(&json!({
        "nodes": [
            { "typeOf": "stream", "id": "0" },
            { "typeOf": "query", "id": "1", "queryStr": "SELECT 1", "period": "1m" },
        ],
        "edges": [ { "parent": "0", "child": "1" } ],
    }))
    .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch(_)), "got {err}");

    // A where node cannot hang directly below a source.
    let err = unmarshal(&json!({
        "nodes": [
            { "typeOf": "stream", "id": "0" },
            { "typeOf": "where", "id": "1", "lambda": { "typeOf": "lambda", "expression": "TRUE" } },
        ],
        "edges": [ { "parent": "0", "child": "1" } ],
    }))
    .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch(_)), "got {err}");
}

#[test]
fn test_union_needs_two_parents_on_the_wire() {
    let err = unmarshal(&json!({
        "nodes": [
            { "typeOf": "stream", "id": "0" },
            { "typeOf": "from", "id": "1" },
            { "typeOf": "union", "id": "2" },
        ],
        "edges": [
            { "parent": "0", "child": "1" },
            { "parent": "1", "child": "2" },
        ],
    }))
    .unwrap_err();
    assert!(matches!(err, Error::Topology(_)));
}

#[test]
fn test_legacy_numeric_forms_decode() {
    // Durations as raw nanoseconds, counts as strings, ids as numbers.
    let wire = json!({
        "nodes": [
            { "typeOf": "stream", "id": 0 },
            { "typeOf": "from", "id": 1 },
            {
                "typeOf": "window",
                "id": 2,
                "period": 10_000_000_000u64,
                "every": "1s",
                "periodCount": "0",
            },
        ],
        "edges": [
            { "parent": 0, "child": 1 },
            { "parent": 1, "child": 2 },
        ],
    });
    let restored = unmarshal(&wire).unwrap();
    let window = restored.node("2".parse().unwrap()).unwrap();
    match window.kind() {
        NodeKind::Window(w) => {
            assert_eq!(w.period, Duration::seconds(10));
            assert_eq!(w.every, Duration::seconds(1));
            assert_eq!(w.period_count, 0);
        }
        other => panic!("expected window, got {}", other.descriptor()),
    }

    // Re-encoding normalizes to canonical string forms.
    let value = restored.to_json_value().unwrap();
    assert_eq!(value["nodes"][2]["period"], "10s");
    assert_eq!(value["nodes"][0]["id"], "0");
}

#[test]
fn test_missing_fields_take_defaults() {
    let wire = json!({
        "nodes": [
            { "typeOf": "stream", "id": "0" },
            { "typeOf": "from", "id": "1" },
            { "typeOf": "stateDuration", "id": "2",
              "lambda": { "typeOf": "lambda", "expression": "\"cpu\" > 80" } },
        ],
        "edges": [
            { "parent": "0", "child": "1" },
            { "parent": "1", "child": "2" },
        ],
    });
    let restored = unmarshal(&wire).unwrap();
    match restored.node("2".parse().unwrap()).unwrap().kind() {
        NodeKind::StateDuration(s) => {
            assert_eq!(s.alias, "state_duration");
            assert_eq!(s.unit, Duration::seconds(1));
        }
        other => panic!("expected stateDuration, got {}", other.descriptor()),
    }
}

#[test]
fn test_unset_lambda_round_trips_as_null() {
    let (pipeline, stream) = Pipeline::stream(policy());
    stream.from().unwrap().measurement("m");
    let value = pipeline.to_json_value().unwrap();
    assert_eq!(value["nodes"][1]["where"], Value::Null);

    let restored = unmarshal(&value).unwrap();
    match restored.node("1".parse().unwrap()).unwrap().kind() {
        NodeKind::From(f) => assert!(f.where_expr.is_none()),
        other => panic!("expected from, got {}", other.descriptor()),
    }
}

#[test]
fn test_aggregate_parameters_round_trip() {
    let (pipeline, stream) = Pipeline::stream(policy());
    let from = stream.from().unwrap();
    from.percentile("value", 99.0).unwrap();
    from.moving_average("value", 5).unwrap();
    from.holt_winters_with_fit("value", 10, 4, Duration::minutes(1))
        .unwrap();
    from.elapsed("value", Duration::milliseconds(100)).unwrap();

    let wire = pipeline.to_json_value().unwrap();
    let restored = unmarshal(&wire).unwrap();
    assert_eq!(restored.to_json_value().unwrap(), wire);

    let nodes = wire["nodes"].as_array().unwrap();
    let hw = nodes
        .iter()
        .find(|n| n["typeOf"] == "holtWintersWithFit")
        .unwrap();
    assert_eq!(hw["h"], 10);
    assert_eq!(hw["m"], 4);
    assert_eq!(hw["interval"], "1m");
}

#[test]
fn test_empty_pipeline_round_trips() {
    let wire = json!({ "nodes": [], "edges": [] });
    let restored = unmarshal(&wire).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.to_json_value().unwrap(), wire);
}

#[test]
fn test_duplicate_node_ids_are_rejected() {
    let err = unmarshal(&json!({
        "nodes": [
            { "typeOf": "stream", "id": "0" },
            { "typeOf": "stream", "id": "0" },
        ],
        "edges": [],
    }))
    .unwrap_err();
    assert!(matches!(err, Error::Topology(_)));
}
