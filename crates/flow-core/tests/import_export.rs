//! Integration tests: JSON interchange and `import_flow`.

use flow_core::*;
use pretty_assertions::assert_eq;

fn load(json: &str) -> FlowResult<GraphStore> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut store = GraphStore::new();
    store.import_json(json)?;
    Ok(store)
}

#[test]
fn imports_fixture_with_typed_props() {
    let store = load(include_str!("fixtures/checkout_flow.json")).unwrap();
    let graph = store.graph();

    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.group_count(), 1);

    let submit = graph.node(NodeId::intern("submit")).unwrap();
    assert_eq!(submit.z_index, Some(2));
    assert_eq!(submit.group_id, Some(GroupId::intern("form")));
    match &submit.props {
        NodeProps::Button(props) => {
            assert_eq!(props.label, "提交");
            assert_eq!(props.color, "#22c55e");
            assert!(props.extra.contains_key("tooltip"));
        }
        other => panic!("expected button props, got {other:?}"),
    }

    // Props omitted entirely fall back to the type defaults.
    let done = graph.node(NodeId::intern("done")).unwrap();
    assert_eq!(done.props, NodeProps::Text(TextProps::default()));

    let summary = graph.node(NodeId::intern("summary")).unwrap();
    match &summary.props {
        NodeProps::Table(props) => assert_eq!(props.columns, "商品,数量"),
        other => panic!("expected table props, got {other:?}"),
    }

    let edge = graph.edge(EdgeId::intern("e_submit_done")).unwrap();
    assert_eq!(edge.expression.as_deref(), Some("status == 200"));
    assert_eq!(edge.edge_type.as_deref(), Some("success"));
}

#[test]
fn export_then_import_is_stable() {
    let store = load(include_str!("fixtures/checkout_flow.json")).unwrap();
    let exported = store.export_json().unwrap();

    let reloaded = load(&exported).unwrap();
    assert_eq!(reloaded.document(), store.document());
}

#[test]
fn imported_group_rectangle_is_kept() {
    let store = load(include_str!("fixtures/checkout_flow.json")).unwrap();
    let group = store.graph().group(GroupId::intern("form")).unwrap();
    assert_eq!(group.bounds, Bounds::new(16.0, 56.0, 248.0, 148.0));
    assert_eq!(group.z_index, 1);
}

#[test]
fn dangling_edge_fixture_is_rejected() {
    let mut store = GraphStore::new();
    store
        .add_node(Node::new(NodeId::intern("keep"), NodeType::Image, 0.0, 0.0))
        .unwrap();

    let err = store
        .import_json(include_str!("fixtures/dangling_edge.json"))
        .unwrap_err();

    assert!(err.is_validation());
    // The previous state survives a rejected import.
    assert!(store.graph().contains_node(NodeId::intern("keep")));
    assert!(store.can_undo());
}

#[test]
fn double_grouped_fixture_is_rejected() {
    let err = load(include_str!("fixtures/double_grouped.json")).err().unwrap();
    match err {
        FlowError::Validation(ValidationError::AlreadyGrouped { node, group }) => {
            assert_eq!(node, "b");
            assert_eq!(group, "g1");
        }
        other => panic!("expected AlreadyGrouped, got {other:?}"),
    }
}

#[test]
fn unknown_node_type_is_a_validation_error() {
    let json = r#"{ "nodes": [ { "id": "x", "type": "slider", "x": 0, "y": 0 } ] }"#;
    let err = load(json).err().unwrap();
    match err {
        FlowError::Validation(ValidationError::UnknownNodeType(token)) => {
            assert_eq!(token, "slider");
        }
        other => panic!("expected UnknownNodeType, got {other:?}"),
    }
}

#[test]
fn ill_typed_props_are_a_validation_error() {
    let mut store = load(include_str!("fixtures/checkout_flow.json")).unwrap();
    let json = r#"{ "nodes": [ { "id": "t", "type": "table", "x": 0, "y": 0, "props": { "rows": "many" } } ] }"#;
    let err = store.import_json(json).unwrap_err();
    match err {
        FlowError::Validation(ValidationError::InvalidProps { node_type, .. }) => {
            assert_eq!(node_type, NodeType::Table);
        }
        other => panic!("expected InvalidProps, got {other:?}"),
    }
    // The previous document survives a rejected import.
    assert_eq!(store.graph().node_count(), 5);
}

#[test]
fn malformed_json_is_a_serialization_error() {
    let err = load(r#"{ "nodes": [ "#).err().unwrap();
    assert!(matches!(err, FlowError::Serialization(_)));
}
