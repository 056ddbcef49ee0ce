//! Integration tests: store → surface reconciliation and surface → store
//! gestures.

use flow_core::*;
use flow_editor::{FlowCanvas, RenderSync, SurfaceEvent, SyncStats};
use flow_render::{
    SceneSurface, Shape, ShapeHandle, ShapeTag, Surface, SurfaceError, SurfaceResult,
};
use pretty_assertions::assert_eq;

fn n(id: &str) -> NodeId {
    NodeId::intern(id)
}

fn config() -> CanvasConfig {
    CanvasConfig::default()
}

/// Two connected buttons grouped together, plus a loose text node.
fn store(prefix: &str) -> GraphStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let id = |s: &str| format!("{prefix}_{s}");
    let mut store = GraphStore::new();
    store
        .add_node(Node::new(n(&id("a")), NodeType::Button, 0.0, 0.0))
        .unwrap();
    store
        .add_node(Node::new(n(&id("b")), NodeType::Button, 200.0, 0.0))
        .unwrap();
    store
        .add_node(Node::new(n(&id("t")), NodeType::Text, 0.0, 300.0))
        .unwrap();
    store
        .add_edge(Edge::new(EdgeId::intern(&id("e")), n(&id("a")), n(&id("b"))))
        .unwrap();
    let group = GroupId::intern(&id("g"));
    store
        .add_group(Group::new(group, "Pair", Bounds::default()))
        .unwrap();
    store
        .add_nodes_to_group(group, &[n(&id("a")), n(&id("b"))])
        .unwrap();
    store
}

// ─── Store → surface ────────────────────────────────────────────────────

#[test]
fn one_shape_per_entity() {
    let store = store("rsx_one");
    let mut surface = SceneSurface::new(1200.0, 800.0);
    let mut sync = RenderSync::new(&config());

    let stats = sync.sync(&store, &mut surface);
    assert_eq!(stats.created, 5);
    assert_eq!(surface.shape_count(), 5);
    assert_eq!(sync.mounted_count(), 5);
    assert!(sync.is_synced_with(&store));

    for tag in [
        ShapeTag::node(n("rsx_one_a")),
        ShapeTag::edge(EdgeId::intern("rsx_one_e")),
        ShapeTag::group(GroupId::intern("rsx_one_g")),
    ] {
        let handle = sync.handle_of(&tag).unwrap();
        assert_eq!(surface.shape(handle).unwrap().tag, tag);
    }
}

#[test]
fn removing_node_removes_its_edge_shapes() {
    let mut store = store("rsx_rm");
    let mut surface = SceneSurface::new(1200.0, 800.0);
    let mut sync = RenderSync::new(&config());
    sync.sync(&store, &mut surface);

    store.remove_node(n("rsx_rm_b")).unwrap();
    let stats = sync.sync(&store, &mut surface);

    assert_eq!(stats.removed, 2);
    assert_eq!(surface.shape_count(), 3);
    assert!(surface.find(&ShapeTag::edge(EdgeId::intern("rsx_rm_e"))).is_none());
    assert!(surface.find(&ShapeTag::node(n("rsx_rm_b"))).is_none());
}

#[test]
fn moving_node_updates_node_and_edge() {
    let mut store = store("rsx_mv");
    let mut surface = SceneSurface::new(1200.0, 800.0);
    let mut sync = RenderSync::new(&config());
    sync.sync(&store, &mut surface);

    store
        .update_node(n("rsx_mv_b"), NodePatch::position(400.0, 0.0))
        .unwrap();
    let stats = sync.sync(&store, &mut surface);

    // The node, its edge and its group's rect all change.
    assert_eq!(
        stats,
        SyncStats {
            created: 0,
            updated: 3,
            removed: 0,
            failed: 0
        }
    );
}

#[test]
fn collapsed_group_hides_members_and_their_edges() {
    let mut store = store("rsx_col");
    let mut surface = SceneSurface::new(1200.0, 800.0);
    let mut sync = RenderSync::new(&config());
    sync.sync(&store, &mut surface);

    let group = GroupId::intern("rsx_col_g");
    let patch = GroupPatch {
        collapsed: Some(true),
        ..Default::default()
    };
    store.update_group(group, patch).unwrap();
    sync.sync(&store, &mut surface);

    let mut tags: Vec<String> = surface
        .ordered()
        .iter()
        .map(|s| s.tag.to_string())
        .collect();
    tags.sort();
    assert_eq!(tags, vec!["group:rsx_col_g", "node:rsx_col_t"]);

    store.undo();
    sync.sync(&store, &mut surface);
    assert_eq!(surface.shape_count(), 5);
}

#[test]
fn undo_redo_reconcile_the_surface() {
    let mut store = store("rsx_ur");
    let mut surface = SceneSurface::new(1200.0, 800.0);
    let mut sync = RenderSync::new(&config());

    store.remove_node(n("rsx_ur_t")).unwrap();
    sync.sync(&store, &mut surface);
    assert_eq!(surface.shape_count(), 4);

    store.undo();
    sync.sync(&store, &mut surface);
    assert_eq!(surface.shape_count(), 5);

    store.redo();
    sync.sync(&store, &mut surface);
    assert_eq!(surface.shape_count(), 4);
}

// ─── Surface → store ────────────────────────────────────────────────────

#[test]
fn selected_event_routes_by_domain_type() {
    let mut store = store("rsx_sel");
    let mut surface = SceneSurface::new(1200.0, 800.0);
    let mut sync = RenderSync::new(&config());
    sync.sync(&store, &mut surface);

    let edge = EdgeId::intern("rsx_sel_e");
    sync.handle_event(
        &mut store,
        &mut surface,
        SurfaceEvent::Selected(ShapeTag::edge(edge)),
    )
    .unwrap();
    assert_eq!(store.selection().kind(), SelectionKind::Edge);
    assert_eq!(store.selection().edge(), Some(edge));
    let highlighted = surface.find(&ShapeTag::edge(edge)).unwrap().1.stroke;
    assert_eq!(highlighted, flow_render::template::SELECTED_STROKE);

    sync.handle_event(&mut store, &mut surface, SurfaceEvent::Deselected)
        .unwrap();
    assert!(store.selection().is_empty());
}

#[test]
fn moved_node_snaps_and_commits() {
    let mut store = store("rsx_mvd");
    let mut surface = SceneSurface::new(1200.0, 800.0);
    let mut sync = RenderSync::new(&config());
    sync.sync(&store, &mut surface);
    let len = store.history().len();

    let tag = ShapeTag::node(n("rsx_mvd_t"));
    sync.handle_event(
        &mut store,
        &mut surface,
        SurfaceEvent::Moved {
            tag: tag.clone(),
            x: 147.0,
            y: 212.0,
        },
    )
    .unwrap();

    let node = store.graph().node(n("rsx_mvd_t")).unwrap();
    assert_eq!((node.x, node.y), (140.0, 220.0));
    assert_eq!(store.history().len(), len + 1);
    let rect = surface.find(&tag).unwrap().1.bounding_rect();
    assert_eq!((rect.x0, rect.y0), (140.0, 220.0));
}

#[test]
fn moved_group_carries_its_members() {
    let mut store = store("rsx_gm");
    let mut surface = SceneSurface::new(1200.0, 800.0);
    let free = CanvasConfig {
        snap_to_grid: false,
        ..config()
    };
    let mut sync = RenderSync::new(&free);
    sync.sync(&store, &mut surface);

    let group = GroupId::intern("rsx_gm_g");
    let before = store.graph().group(group).unwrap().bounds;
    sync.handle_event(
        &mut store,
        &mut surface,
        SurfaceEvent::Moved {
            tag: ShapeTag::group(group),
            x: before.x + 100.0,
            y: before.y + 40.0,
        },
    )
    .unwrap();

    let a = store.graph().node(n("rsx_gm_a")).unwrap();
    let b = store.graph().node(n("rsx_gm_b")).unwrap();
    assert_eq!((a.x, a.y), (100.0, 40.0));
    assert_eq!((b.x, b.y), (300.0, 40.0));
    let after = store.graph().group(group).unwrap().bounds;
    assert_eq!((after.x, after.y), (before.x + 100.0, before.y + 40.0));
}

#[test]
fn moving_preview_leaves_store_alone() {
    let mut store = store("rsx_pv");
    let mut surface = SceneSurface::new(1200.0, 800.0);
    let mut sync = RenderSync::new(&config());
    sync.sync(&store, &mut surface);
    let revision = store.revision();
    let tag = ShapeTag::node(n("rsx_pv_t"));

    sync.handle_event(
        &mut store,
        &mut surface,
        SurfaceEvent::Moving {
            tag: tag.clone(),
            x: 61.0,
            y: 302.0,
        },
    )
    .unwrap();

    assert_eq!(store.revision(), revision);
    let node = store.graph().node(n("rsx_pv_t")).unwrap();
    assert_eq!((node.x, node.y), (0.0, 300.0));
    let rect = surface.find(&tag).unwrap().1.bounding_rect();
    assert_eq!((rect.x0, rect.y0), (60.0, 300.0));

    // A later sync puts the surface back in line with the store.
    sync.sync(&store, &mut surface);
    let rect = surface.find(&tag).unwrap().1.bounding_rect();
    assert_eq!((rect.x0, rect.y0), (0.0, 300.0));
}

#[test]
fn preview_follows_drag_until_drop() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut canvas = FlowCanvas::new(SceneSurface::new(1200.0, 800.0), config());
    let doc = FlowDocument {
        nodes: vec![Node::new(n("rsx_cv_a"), NodeType::Image, 0.0, 0.0)],
        ..Default::default()
    };
    canvas.import_flow(doc).unwrap();
    let tag = ShapeTag::node(n("rsx_cv_a"));

    for (x, y) in [(18.0, 9.0), (41.0, 39.0)] {
        canvas
            .handle_surface_event(SurfaceEvent::Moving {
                tag: tag.clone(),
                x,
                y,
            })
            .unwrap();
    }
    let rect = canvas.surface().find(&tag).unwrap().1.bounding_rect();
    assert_eq!((rect.x0, rect.y0), (40.0, 40.0));
    let node = canvas.store().graph().node(n("rsx_cv_a")).unwrap();
    assert_eq!((node.x, node.y), (0.0, 0.0));

    canvas
        .handle_surface_event(SurfaceEvent::Moved {
            tag: tag.clone(),
            x: 41.0,
            y: 39.0,
        })
        .unwrap();
    let node = canvas.store().graph().node(n("rsx_cv_a")).unwrap();
    assert_eq!((node.x, node.y), (40.0, 40.0));
    let rect = canvas.surface().find(&tag).unwrap().1.bounding_rect();
    assert_eq!((rect.x0, rect.y0), (40.0, 40.0));
    assert!(canvas.store().can_undo());
}

// ─── Lifecycle ──────────────────────────────────────────────────────────

#[test]
fn teardown_releases_every_shape() {
    let store = store("rsx_td");
    let mut surface = SceneSurface::new(1200.0, 800.0);
    let mut sync = RenderSync::new(&config());
    sync.sync(&store, &mut surface);

    sync.teardown(&mut surface);
    assert_eq!(surface.shape_count(), 0);
    assert_eq!(sync.mounted_count(), 0);
    assert!(!sync.is_synced_with(&store));

    // Nothing leaks across a rebuild.
    sync.sync(&store, &mut surface);
    assert_eq!(surface.shape_count(), 5);
}

#[test]
fn reconfigure_resizes_and_rebuilds() {
    let store = store("rsx_rc");
    let mut surface = SceneSurface::new(1200.0, 800.0);
    let mut sync = RenderSync::new(&config());
    sync.sync(&store, &mut surface);

    let wide = CanvasConfig {
        width: 1600.0,
        height: 900.0,
        ..config()
    };
    sync.reconfigure(&wide, &mut surface);
    assert_eq!(surface.size(), (1600.0, 900.0));
    assert_eq!(surface.shape_count(), 0);

    let stats = sync.sync(&store, &mut surface);
    assert_eq!(stats.created, 5);
    assert_eq!(surface.shape_count(), 5);
}

/// Surface that refuses every new shape until told otherwise.
struct FlakySurface {
    inner: Option<SceneSurface>,
    failing: bool,
}

impl FlakySurface {
    fn failing() -> Self {
        Self {
            inner: Some(SceneSurface::new(800.0, 600.0)),
            failing: true,
        }
    }

    fn scene(&mut self) -> &mut SceneSurface {
        self.inner
            .get_or_insert_with(|| SceneSurface::new(800.0, 600.0))
    }
}

impl Surface for FlakySurface {
    fn create_shape(&mut self, shape: &Shape) -> SurfaceResult<ShapeHandle> {
        if self.failing {
            return Err(SurfaceError::Rejected {
                tag: shape.tag.clone(),
                reason: "out of slots".into(),
            });
        }
        self.scene().create_shape(shape)
    }

    fn update_shape(&mut self, handle: ShapeHandle, shape: &Shape) -> SurfaceResult<()> {
        self.scene().update_shape(handle, shape)
    }

    fn remove_shape(&mut self, handle: ShapeHandle) -> SurfaceResult<()> {
        self.scene().remove_shape(handle)
    }

    fn shape_count(&self) -> usize {
        self.inner.as_ref().map_or(0, |s| s.shape_count())
    }

    fn origin(&self) -> (f32, f32) {
        (0.0, 0.0)
    }

    fn hit_test(&self, x: f32, y: f32) -> Option<ShapeTag> {
        self.inner.as_ref().and_then(|s| s.hit_test(x, y))
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.scene().resize(width, height);
    }
}

#[test]
fn surface_failures_are_swallowed_and_retried() {
    let mut store = store("rsx_fl");
    let mut surface = FlakySurface::failing();
    let mut sync = RenderSync::new(&config());

    let stats = sync.sync(&store, &mut surface);
    assert_eq!(stats.failed, 5);
    assert_eq!(surface.shape_count(), 0);
    assert!(!sync.is_synced_with(&store));

    // The store keeps working while the surface is broken.
    store
        .add_node(Node::new(n("rsx_fl_late"), NodeType::Image, 500.0, 0.0))
        .unwrap();
    assert_eq!(store.graph().node_count(), 4);

    surface.failing = false;
    let stats = sync.sync(&store, &mut surface);
    assert_eq!(stats.created, 6);
    assert_eq!(stats.failed, 0);
    assert!(sync.is_synced_with(&store));
}
