//! Integration tests: end-to-end editing scenarios through `FlowCanvas`.

use flow_core::*;
use flow_editor::{FlowCanvas, InputEvent, Modifiers};
use flow_render::{SceneSurface, ShapeTag, Surface};
use pretty_assertions::assert_eq;

fn n(id: &str) -> NodeId {
    NodeId::intern(id)
}

fn canvas() -> FlowCanvas<SceneSurface> {
    let _ = env_logger::builder().is_test(true).try_init();
    FlowCanvas::new(SceneSurface::new(1200.0, 800.0), CanvasConfig::default())
}

fn key(canvas: &mut FlowCanvas<SceneSurface>, key: &str, modifiers: Modifiers) {
    canvas
        .handle_input(InputEvent::key(key, modifiers))
        .unwrap();
}

#[test]
fn group_two_buttons() {
    let mut canvas = canvas();
    let doc = FlowDocument {
        nodes: vec![
            Node::new(n("sc_n1"), NodeType::Button, 100.0, 100.0),
            Node::new(n("sc_n2"), NodeType::Button, 300.0, 100.0),
        ],
        ..Default::default()
    };
    canvas.import_flow(doc).unwrap();
    key(&mut canvas, "a", Modifiers::CTRL);
    key(&mut canvas, "g", Modifiers::CTRL);

    let graph = canvas.store().graph();
    assert_eq!(graph.group_count(), 1);
    let group = &graph.groups()[0];
    assert_eq!(group.node_ids.to_vec(), vec![n("sc_n1"), n("sc_n2")]);
    assert_eq!(group.bounds, Bounds::new(76.0, 76.0, 368.0, 88.0));
    assert_eq!(graph.node(n("sc_n1")).unwrap().group_id, Some(group.id));
    assert_eq!(graph.node(n("sc_n2")).unwrap().group_id, Some(group.id));

    // Group shape is mounted behind the two buttons.
    let tag = ShapeTag::group(group.id);
    assert!(canvas.surface().find(&tag).is_some());
    assert_eq!(canvas.surface().hit_test(80.0, 80.0), Some(tag));
}

#[test]
fn drop_table_from_palette() {
    let mut canvas = canvas();
    canvas
        .handle_input(InputEvent::Drop {
            token: "table".into(),
            x: 200.0,
            y: 150.0,
        })
        .unwrap();

    let graph = canvas.store().graph();
    assert_eq!(graph.node_count(), 1);
    let node = graph.nodes().next().unwrap();
    assert_eq!(node.node_type(), NodeType::Table);
    assert_eq!((node.x, node.y), (200.0, 150.0));
    let NodeProps::Table(props) = &node.props else {
        panic!("expected table props, got {:?}", node.props);
    };
    assert_eq!(props.columns, "列1,列2,列3");
    assert_eq!(props.rows, 3);

    // The dropped node is selected and drawn highlighted.
    assert_eq!(canvas.store().selection().node(), Some(node.id));
    assert_eq!(canvas.surface().shape_count(), 1);
}

#[test]
fn drop_is_relative_to_surface_origin() {
    let _ = env_logger::builder().is_test(true).try_init();
    let surface = SceneSurface::new(800.0, 600.0).with_origin(40.0, 60.0);
    let mut canvas = FlowCanvas::new(surface, CanvasConfig::default());
    canvas
        .handle_input(InputEvent::Drop {
            token: "text".into(),
            x: 140.0,
            y: 90.0,
        })
        .unwrap();
    let node = canvas.store().graph().nodes().next().unwrap();
    assert_eq!((node.x, node.y), (100.0, 30.0));
}

#[test]
fn unknown_palette_token_leaves_canvas_alone() {
    let mut canvas = canvas();
    let err = canvas
        .handle_input(InputEvent::Drop {
            token: "carousel".into(),
            x: 0.0,
            y: 0.0,
        })
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(canvas.store().graph().node_count(), 0);
    assert!(!canvas.store().can_undo());
}

#[test]
fn connect_then_delete_endpoint() {
    let mut canvas = canvas();
    let doc = FlowDocument {
        nodes: vec![
            Node::new(n("sc_c1"), NodeType::Button, 0.0, 0.0),
            Node::new(n("sc_c2"), NodeType::Button, 300.0, 0.0),
        ],
        ..Default::default()
    };
    canvas.import_flow(doc).unwrap();

    canvas.begin_connect(n("sc_c1"));
    canvas
        .handle_input(InputEvent::pointer_down(310.0, 10.0))
        .unwrap();
    assert_eq!(canvas.store().graph().edge_count(), 1);
    assert_eq!(canvas.surface().shape_count(), 3);

    canvas
        .handle_input(InputEvent::pointer_down(10.0, 10.0))
        .unwrap();
    canvas
        .handle_input(InputEvent::PointerUp { x: 10.0, y: 10.0 })
        .unwrap();
    key(&mut canvas, "Delete", Modifiers::NONE);

    assert_eq!(canvas.store().graph().node_count(), 1);
    assert_eq!(canvas.store().graph().edge_count(), 0);
    assert_eq!(canvas.surface().shape_count(), 1);

    // Node and edge come back together.
    key(&mut canvas, "z", Modifiers::CTRL);
    assert_eq!(canvas.store().graph().node_count(), 2);
    assert_eq!(canvas.store().graph().edge_count(), 1);
    assert_eq!(canvas.surface().shape_count(), 3);
}

#[test]
fn export_import_preserves_document() {
    let mut canvas = canvas();
    for (token, x) in [("button", 0.0), ("input", 200.0), ("chart", 500.0)] {
        canvas
            .handle_input(InputEvent::Drop {
                token: token.into(),
                x,
                y: 40.0,
            })
            .unwrap();
    }
    key(&mut canvas, "a", Modifiers::CTRL);
    canvas.group_selection().unwrap();
    let json = canvas.export_json().unwrap();

    let mut other = self::canvas();
    other.import_json(&json).unwrap();
    assert_eq!(other.export(), canvas.export());
    assert_eq!(other.surface().shape_count(), 4);
    assert!(!other.store().can_undo());
}

#[test]
fn reconfigure_reaches_grouping_and_history() {
    let mut canvas = canvas();
    let doc = FlowDocument {
        nodes: vec![
            Node::new(n("sc_rc1"), NodeType::Button, 100.0, 100.0),
            Node::new(n("sc_rc2"), NodeType::Button, 300.0, 100.0),
        ],
        ..Default::default()
    };
    canvas.import_flow(doc).unwrap();
    canvas.reconfigure(CanvasConfig {
        group_padding: 10.0,
        history_limit: 2,
        ..CanvasConfig::default()
    });
    assert_eq!(canvas.store().group_padding(), 10.0);
    assert_eq!(canvas.store().history().max_depth(), 2);

    key(&mut canvas, "a", Modifiers::CTRL);
    let group = canvas.group_selection().unwrap().unwrap();
    assert_eq!(
        canvas.store().graph().group(group).unwrap().bounds,
        Bounds::new(90.0, 90.0, 340.0, 60.0)
    );

    canvas
        .handle_input(InputEvent::Drop {
            token: "text".into(),
            x: 600.0,
            y: 100.0,
        })
        .unwrap();
    assert_eq!(canvas.store().history().len(), 2);
    assert!(canvas.undo());
    assert!(!canvas.undo());
}
