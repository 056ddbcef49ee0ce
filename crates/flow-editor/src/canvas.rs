//! The application-owned canvas.
//!
//! `FlowCanvas` holds the one `GraphStore` instance together with the
//! gesture controllers, the render sync and the drawing surface. Every input
//! or surface event goes through it, and the surface is re-synced after each
//! one, except a `Moving` preview, which stays up until the drag settles.

use crate::drag::DragController;
use crate::grouping::GroupingEngine;
use crate::input::{InputEvent, Modifiers};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::sync::{RenderSync, SurfaceEvent, SyncStats};
use flow_core::{
    CanvasConfig, EdgeId, FlowDocument, FlowResult, GraphStore, GroupId, NodeId, SelectionKind,
};
use flow_render::{DomainType, Surface};

pub struct FlowCanvas<S: Surface> {
    store: GraphStore,
    drag: DragController,
    render: RenderSync,
    surface: S,
    config: CanvasConfig,
}

impl<S: Surface> FlowCanvas<S> {
    pub fn new(mut surface: S, config: CanvasConfig) -> Self {
        surface.resize(config.width, config.height);
        Self {
            store: GraphStore::with_config(&config),
            drag: DragController::new(&config),
            render: RenderSync::new(&config),
            surface,
            config,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn render_sync(&self) -> &RenderSync {
        &self.render
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Bring the surface up to date with the store.
    pub fn sync(&mut self) -> SyncStats {
        self.render.sync(&self.store, &mut self.surface)
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Route one input event, then re-sync the surface.
    pub fn handle_input(&mut self, event: InputEvent) -> FlowResult<()> {
        let result = self.dispatch_input(event);
        self.sync();
        result
    }

    fn dispatch_input(&mut self, event: InputEvent) -> FlowResult<()> {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => {
                let (cx, cy) = self.surface.client_to_canvas(x, y);
                self.pointer_down(cx, cy, modifiers)
            }
            InputEvent::PointerMove { x, y } => {
                let (cx, cy) = self.surface.client_to_canvas(x, y);
                self.drag.pointer_move(&mut self.store, cx, cy).map(|_| ())
            }
            InputEvent::PointerUp { .. } => {
                self.drag.pointer_up(&mut self.store);
                Ok(())
            }
            InputEvent::Drop { token, x, y } => {
                let origin = self.surface.origin();
                self.drag
                    .drop_component(&mut self.store, &token, x, y, origin)
                    .map(|_| ())
            }
            InputEvent::Key { key, modifiers } => match ShortcutMap::resolve(&key, modifiers) {
                Some(action) => self.apply_shortcut(action),
                None => Ok(()),
            },
        }
    }

    fn pointer_down(&mut self, x: f32, y: f32, modifiers: Modifiers) -> FlowResult<()> {
        let hit = self.surface.hit_test(x, y);

        if self.drag.is_connecting() {
            if let Some(to) = hit.as_ref().and_then(|tag| tag.node_id()) {
                self.drag.complete_connect(&mut self.store, to)?;
            } else {
                self.drag.cancel(&mut self.store);
            }
            return Ok(());
        }

        match hit {
            Some(tag) => match tag.domain_type {
                DomainType::Node => {
                    if let Some(id) = tag.node_id() {
                        self.drag
                            .pointer_down(&mut self.store, id, x, y, modifiers.shift);
                    }
                }
                DomainType::Edge => self.store.select_edge(tag.edge_id()),
                DomainType::Group => self.store.select_group(tag.group_id()),
            },
            None => {
                if !modifiers.shift {
                    self.store.clear_selection();
                }
            }
        }
        Ok(())
    }

    /// Route one surface gesture through render sync.
    pub fn handle_surface_event(&mut self, event: SurfaceEvent) -> FlowResult<()> {
        self.render
            .handle_event(&mut self.store, &mut self.surface, event)
    }

    // ─── Commands ────────────────────────────────────────────────────────

    pub fn apply_shortcut(&mut self, action: ShortcutAction) -> FlowResult<()> {
        log::debug!("shortcut {action:?}");
        match action {
            ShortcutAction::Undo => {
                self.undo();
            }
            ShortcutAction::Redo => {
                self.redo();
            }
            ShortcutAction::Group => {
                self.group_selection()?;
            }
            ShortcutAction::Ungroup => {
                GroupingEngine::ungroup_selection(&mut self.store)?;
            }
            ShortcutAction::Delete => self.delete_selection()?,
            ShortcutAction::SelectAll => self.store.select_all_nodes(),
            ShortcutAction::Cancel => {
                if !self.drag.cancel(&mut self.store) {
                    self.store.clear_selection();
                }
            }
        }
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        if self.drag.is_dragging() {
            return false;
        }
        let undone = self.store.undo();
        self.sync();
        undone
    }

    pub fn redo(&mut self) -> bool {
        if self.drag.is_dragging() {
            return false;
        }
        let redone = self.store.redo();
        self.sync();
        redone
    }

    pub fn group_selection(&mut self) -> FlowResult<Option<GroupId>> {
        let grouped = GroupingEngine::group_selection(&mut self.store);
        self.sync();
        grouped
    }

    /// Remove whatever is selected. Several nodes go in one undo step.
    pub fn delete_selection(&mut self) -> FlowResult<()> {
        let selection = self.store.selection().clone();
        let result = match selection.kind() {
            SelectionKind::None => Ok(()),
            SelectionKind::Edge => match selection.edge() {
                Some(id) => self.store.remove_edge(id).map(|_| ()),
                None => Ok(()),
            },
            SelectionKind::Group => match selection.group() {
                Some(id) => GroupingEngine::ungroup(&mut self.store, id),
                None => Ok(()),
            },
            SelectionKind::Node | SelectionKind::Nodes => {
                self.remove_nodes(selection.nodes())
            }
        };
        self.sync();
        result
    }

    fn remove_nodes(&mut self, ids: &[NodeId]) -> FlowResult<()> {
        self.store.begin_batch();
        for &id in ids {
            if !self.store.graph().contains_node(id) {
                continue;
            }
            if let Err(err) = self.store.remove_node(id) {
                self.store.cancel_batch();
                return Err(err);
            }
        }
        self.store.end_batch();
        Ok(())
    }

    /// Start a connection from `from`'s output port; the next pointer-down
    /// on a node completes it.
    pub fn begin_connect(&mut self, from: NodeId) {
        self.drag.begin_connect(&mut self.store, from);
    }

    pub fn complete_connect(&mut self, to: NodeId) -> FlowResult<Option<EdgeId>> {
        let edge = self.drag.complete_connect(&mut self.store, to);
        self.sync();
        edge
    }

    // ─── Document ────────────────────────────────────────────────────────

    pub fn import_flow(&mut self, doc: FlowDocument) -> FlowResult<()> {
        self.drag.cancel(&mut self.store);
        let result = self.store.import_flow(doc);
        self.sync();
        result
    }

    pub fn import_json(&mut self, json: &str) -> FlowResult<()> {
        self.import_flow(FlowDocument::from_json(json)?)
    }

    pub fn export(&self) -> FlowDocument {
        self.store.document()
    }

    pub fn export_json(&self) -> FlowResult<String> {
        self.store.export_json()
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Swap in a new configuration. All shapes are released and rebuilt.
    pub fn reconfigure(&mut self, config: CanvasConfig) {
        self.drag.cancel(&mut self.store);
        self.drag.set_config(&config);
        self.store.set_config(&config);
        self.render.reconfigure(&config, &mut self.surface);
        self.config = config;
        self.sync();
    }

    /// Release every drawable resource and hand back the surface.
    pub fn dispose(mut self) -> S {
        self.drag.cancel(&mut self.store);
        self.render.teardown(&mut self.surface);
        log::debug!("canvas disposed");
        self.surface
    }
}
