//! Store ↔ drawing surface synchronization.
//!
//! `RenderSync` is the only owner of the domain-id ↔ shape-handle map.
//!
//! - **Store → surface**: when the store revision moves, the desired shape
//!   set is projected from the graph and selection, then diffed against
//!   what is on the surface; only changed shapes are created, updated or
//!   removed. Surface failures are logged and swallowed, and the next sync
//!   retries.
//! - **Surface → store**: typed `SurfaceEvent`s from the surface are
//!   dispatched to selection and mutation calls, with positions snapped to
//!   the grid.

use flow_core::{CanvasConfig, FlowResult, GraphStore, NodeId, NodePatch};
use flow_render::{
    DomainType, Shape, ShapeHandle, ShapeTag, Surface, edge_shape, group_shape, node_shape,
};
use std::collections::{HashMap, HashSet};

/// A gesture reported by the drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// A shape was clicked.
    Selected(ShapeTag),
    /// Empty space was clicked.
    Deselected,
    /// A shape is being dragged; `(x, y)` is its candidate top-left.
    Moving { tag: ShapeTag, x: f32, y: f32 },
    /// A shape drag ended at top-left `(x, y)`.
    Moved { tag: ShapeTag, x: f32, y: f32 },
}

/// What one reconciliation pass did to the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub failed: usize,
}

impl SyncStats {
    pub fn is_noop(&self) -> bool {
        *self == SyncStats::default()
    }
}

#[derive(Debug)]
struct Mounted {
    handle: ShapeHandle,
    shape: Shape,
}

#[derive(Debug)]
pub struct RenderSync {
    mounted: HashMap<ShapeTag, Mounted>,
    /// Store revision the surface last fully reflected.
    synced_revision: Option<u64>,
    config: CanvasConfig,
}

impl RenderSync {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            mounted: HashMap::new(),
            synced_revision: None,
            config: config.clone(),
        }
    }

    pub fn handle_of(&self, tag: &ShapeTag) -> Option<ShapeHandle> {
        self.mounted.get(tag).map(|m| m.handle)
    }

    pub fn shape_of(&self, tag: &ShapeTag) -> Option<&Shape> {
        self.mounted.get(tag).map(|m| &m.shape)
    }

    pub fn mounted_count(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_synced_with(&self, store: &GraphStore) -> bool {
        self.synced_revision == Some(store.revision())
    }

    // ─── Store → surface ─────────────────────────────────────────────────

    /// The full shape set the current state should display, keyed by tag.
    ///
    /// Members of collapsed groups are hidden, and so is any edge touching
    /// a hidden node.
    pub fn project(store: &GraphStore) -> HashMap<ShapeTag, Shape> {
        let graph = store.graph();
        let selection = store.selection();
        let mut shapes = HashMap::new();

        let hidden: HashSet<NodeId> = graph
            .groups()
            .iter()
            .filter(|g| g.collapsed)
            .flat_map(|g| g.node_ids.iter().copied())
            .collect();

        for group in graph.groups() {
            let shape = group_shape(group, selection.group() == Some(group.id));
            shapes.insert(shape.tag.clone(), shape);
        }
        for node in graph.nodes().filter(|n| !hidden.contains(&n.id)) {
            let shape = node_shape(node, selection.contains_node(node.id));
            shapes.insert(shape.tag.clone(), shape);
        }
        for edge in graph.edges() {
            if hidden.contains(&edge.from) || hidden.contains(&edge.to) {
                continue;
            }
            let (Some(from), Some(to)) = (graph.node(edge.from), graph.node(edge.to)) else {
                continue;
            };
            let shape = edge_shape(edge, from, to, selection.edge() == Some(edge.id));
            shapes.insert(shape.tag.clone(), shape);
        }
        shapes
    }

    /// Reconcile if the store changed since the last successful pass.
    pub fn sync(&mut self, store: &GraphStore, surface: &mut dyn Surface) -> SyncStats {
        if self.is_synced_with(store) {
            return SyncStats::default();
        }
        self.reconcile(store, surface)
    }

    /// Diff the projected shapes against the mounted ones and apply the
    /// difference to the surface.
    pub fn reconcile(&mut self, store: &GraphStore, surface: &mut dyn Surface) -> SyncStats {
        let mut desired = Self::project(store);
        let mut stats = SyncStats::default();

        let stale: Vec<ShapeTag> = self
            .mounted
            .keys()
            .filter(|tag| !desired.contains_key(*tag))
            .cloned()
            .collect();
        for tag in stale {
            let Some(mounted) = self.mounted.remove(&tag) else {
                continue;
            };
            match surface.remove_shape(mounted.handle) {
                Ok(()) => stats.removed += 1,
                Err(e) => {
                    log::warn!("render sync: failed to remove {tag}: {e}");
                    stats.failed += 1;
                }
            }
        }

        for (tag, shape) in desired.drain() {
            match self.mounted.get_mut(&tag) {
                Some(mounted) if mounted.shape == shape => {}
                Some(mounted) => match surface.update_shape(mounted.handle, &shape) {
                    Ok(()) => {
                        mounted.shape = shape;
                        stats.updated += 1;
                    }
                    Err(e) => {
                        log::warn!("render sync: failed to update {tag}: {e}");
                        stats.failed += 1;
                    }
                },
                None => match surface.create_shape(&shape) {
                    Ok(handle) => {
                        self.mounted.insert(tag, Mounted { handle, shape });
                        stats.created += 1;
                    }
                    Err(e) => {
                        log::warn!("render sync: failed to create {tag}: {e}");
                        stats.failed += 1;
                    }
                },
            }
        }

        self.synced_revision = (stats.failed == 0).then(|| store.revision());
        if !stats.is_noop() {
            log::debug!(
                "render sync rev {}: +{} ~{} -{} !{}",
                store.revision(),
                stats.created,
                stats.updated,
                stats.removed,
                stats.failed
            );
        }
        stats
    }

    /// Remove every mounted shape from the surface.
    pub fn teardown(&mut self, surface: &mut dyn Surface) {
        for (tag, mounted) in self.mounted.drain() {
            if let Err(e) = surface.remove_shape(mounted.handle) {
                log::warn!("render sync: failed to release {tag}: {e}");
            }
        }
        self.synced_revision = None;
    }

    /// Apply a new configuration: every shape is released and rebuilt on
    /// the next sync.
    pub fn reconfigure(&mut self, config: &CanvasConfig, surface: &mut dyn Surface) {
        self.teardown(surface);
        self.config = config.clone();
        surface.resize(config.width, config.height);
    }

    // ─── Surface → store ─────────────────────────────────────────────────

    /// Dispatch one surface gesture, then bring the surface back in sync.
    /// A `Moving` preview is left on screen until the drag ends or the
    /// next sync.
    pub fn handle_event(
        &mut self,
        store: &mut GraphStore,
        surface: &mut dyn Surface,
        event: SurfaceEvent,
    ) -> FlowResult<()> {
        let previewing = matches!(event, SurfaceEvent::Moving { .. });
        let result = self.dispatch(store, surface, event);
        if !previewing {
            self.sync(store, surface);
        }
        result
    }

    fn dispatch(
        &mut self,
        store: &mut GraphStore,
        surface: &mut dyn Surface,
        event: SurfaceEvent,
    ) -> FlowResult<()> {
        match event {
            SurfaceEvent::Selected(tag) => {
                match tag.domain_type {
                    DomainType::Node => store.select_node(tag.node_id()),
                    DomainType::Edge => store.select_edge(tag.edge_id()),
                    DomainType::Group => store.select_group(tag.group_id()),
                }
                Ok(())
            }
            SurfaceEvent::Deselected => {
                store.clear_selection();
                Ok(())
            }
            SurfaceEvent::Moving { tag, x, y } => {
                let (x, y) = self.config.snap(x, y);
                self.preview(surface, &tag, x, y);
                Ok(())
            }
            SurfaceEvent::Moved { tag, x, y } => {
                let (x, y) = self.config.snap(x, y);
                match tag.domain_type {
                    DomainType::Node => match tag.node_id() {
                        Some(id) => store.update_node(id, NodePatch::position(x, y)),
                        None => Ok(()),
                    },
                    DomainType::Group => {
                        let Some(group) = tag.group_id().and_then(|id| store.graph().group(id))
                        else {
                            return Ok(());
                        };
                        let (dx, dy) = (x - group.bounds.x, y - group.bounds.y);
                        let members = group.node_ids.to_vec();
                        store.move_nodes(&members, dx, dy)
                    }
                    DomainType::Edge => Ok(()),
                }
            }
        }
    }

    /// Move a mounted shape on the surface only. The store is untouched
    /// until the drag ends.
    fn preview(&mut self, surface: &mut dyn Surface, tag: &ShapeTag, x: f32, y: f32) {
        let Some(mounted) = self.mounted.get_mut(tag) else {
            return;
        };
        let moved = mounted.shape.moved_to(x, y);
        match surface.update_shape(mounted.handle, &moved) {
            Ok(()) => {
                mounted.shape = moved;
                // The surface now differs from the store.
                self.synced_revision = None;
                log::trace!("preview {tag} at ({x}, {y})");
            }
            Err(e) => log::warn!("render sync: failed to preview {tag}: {e}"),
        }
    }
}
