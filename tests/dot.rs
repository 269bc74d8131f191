//! Tests for the Graphviz DOT export.

use alertflow::*;

#[test]
fn test_dot_uses_default_names() {
    let (pipeline, stream) = Pipeline::stream(DeadmanPolicy::default());
    stream.from().unwrap().window().unwrap();

    let dot = pipeline.dot("cpu").unwrap();
    assert_eq!(dot, "digraph cpu {\nstream0 -> from1;\nfrom1 -> window2;\n}");
}

#[test]
fn test_dot_uses_assigned_names() {
    let (pipeline, stream) = Pipeline::stream(DeadmanPolicy::default());
    stream.from().unwrap().named("selected").window().unwrap();

    let dot = pipeline.dot("named").unwrap();
    assert!(dot.contains("stream0 -> selected;"));
    assert!(dot.contains("selected -> window2;"));
}

#[test]
fn test_dot_includes_fanout() {
    let (pipeline, stream) = Pipeline::stream(DeadmanPolicy::default());
    let from = stream.from().unwrap();
    from.mean("x").unwrap();
    from.sum("x").unwrap();

    let dot = pipeline.dot("fanout").unwrap();
    assert!(dot.contains("from1 -> mean2;"));
    assert!(dot.contains("from1 -> sum3;"));
}

#[test]
fn test_dot_empty_graph() {
    let pipeline = Pipeline::default();
    assert_eq!(pipeline.dot("empty").unwrap(), "digraph empty {\n}");
}
