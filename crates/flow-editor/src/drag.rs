//! Gesture → store mutations for nodes.
//!
//! Drop-to-create, click and shift-click selection, single and batch drag,
//! and the port-to-port connect gesture. A drag gesture runs inside one
//! store batch, so however many moves it takes it undoes as one step, and
//! cancelling it reverts to where the drag started.

use flow_core::{
    CanvasConfig, Edge, EdgeId, FlowResult, GraphStore, Node, NodeId, NodePatch, NodeType,
    ValidationError,
};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    /// A node is held. `offset` is pointer minus node origin at pointer-down.
    Dragging {
        node: NodeId,
        offset: (f32, f32),
        moved: bool,
        shift: bool,
    },
    /// A connection is being drawn out of `from`.
    Connecting { from: NodeId },
}

/// Turns pointer and drop gestures into `GraphStore` calls.
#[derive(Debug)]
pub struct DragController {
    state: DragState,
    config: CanvasConfig,
}

impl DragController {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            state: DragState::Idle,
            config: config.clone(),
        }
    }

    pub fn set_config(&mut self, config: &CanvasConfig) {
        self.config = config.clone();
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self.state, DragState::Connecting { .. })
    }

    /// The node currently held by a drag, if any.
    pub fn dragged_node(&self) -> Option<NodeId> {
        match self.state {
            DragState::Dragging { node, .. } => Some(node),
            _ => None,
        }
    }

    // ─── Drop ────────────────────────────────────────────────────────────

    /// Build a node of the palette type `token` at a canvas position with
    /// that type's default props.
    pub fn create_node(token: &str, x: f32, y: f32) -> Result<Node, ValidationError> {
        let node_type: NodeType = token.parse()?;
        Ok(Node::new(NodeId::generate(node_type.as_str()), node_type, x, y))
    }

    /// Handle a palette drop at a client position. `origin` is the surface's
    /// top-left corner in client space.
    pub fn drop_component(
        &mut self,
        store: &mut GraphStore,
        token: &str,
        client_x: f32,
        client_y: f32,
        origin: (f32, f32),
    ) -> FlowResult<NodeId> {
        let (x, y) = (client_x - origin.0, client_y - origin.1);
        let node = Self::create_node(token, x, y).inspect_err(|e| {
            log::warn!("drop rejected: {e}");
        })?;
        let id = node.id;
        store.add_node(node)?;
        log::debug!("dropped {token} as {id} at ({x}, {y})");
        Ok(id)
    }

    // ─── Drag ────────────────────────────────────────────────────────────

    /// Pointer pressed on `node` at canvas `(x, y)`.
    ///
    /// Plain press selects the node unless it is already part of the
    /// multi-selection (so the whole set can be dragged). Shift toggles it in
    /// the multi-selection. Either way a drag starts if the node ends up
    /// selected.
    pub fn pointer_down(
        &mut self,
        store: &mut GraphStore,
        node: NodeId,
        x: f32,
        y: f32,
        shift: bool,
    ) {
        if self.is_dragging() {
            self.pointer_up(store);
        }
        let Some(origin) = store.graph().node(node).map(|n| (n.x, n.y)) else {
            log::debug!("pointer_down on unknown node {node}");
            return;
        };

        if shift {
            store.toggle_node_selection(node);
        } else if !store.selection().nodes().contains(&node) {
            store.select_node(Some(node));
        }
        if !store.selection().contains_node(node) {
            // Shift-click removed it; nothing to drag.
            return;
        }

        store.begin_batch();
        self.state = DragState::Dragging {
            node,
            offset: (x - origin.0, y - origin.1),
            moved: false,
            shift,
        };
        log::trace!("drag start {node} at ({x}, {y})");
    }

    /// Pointer moved to canvas `(x, y)`. The held node goes to
    /// `pointer - offset`; with a multi-selection every selected node moves
    /// by the same delta. Returns whether anything moved.
    pub fn pointer_move(&mut self, store: &mut GraphStore, x: f32, y: f32) -> FlowResult<bool> {
        let DragState::Dragging {
            node,
            offset,
            moved,
            shift,
        } = self.state
        else {
            return Ok(false);
        };
        let Some(current) = store.graph().node(node).map(|n| (n.x, n.y)) else {
            return Ok(false);
        };

        let (tx, ty) = self.config.snap(x - offset.0, y - offset.1);
        let (dx, dy) = (tx - current.0, ty - current.1);
        if dx == 0.0 && dy == 0.0 {
            return Ok(false);
        }

        // Undo can leave removed ids selected.
        let selected: SmallVec<[NodeId; 8]> = store
            .selection()
            .nodes()
            .iter()
            .copied()
            .filter(|id| store.graph().contains_node(*id))
            .collect();
        if selected.len() > 1 && selected.contains(&node) {
            store.move_nodes(&selected, dx, dy)?;
        } else {
            store.update_node(node, NodePatch::position(tx, ty))?;
        }
        log::trace!("drag {node} -> ({tx}, {ty})");

        if !moved {
            self.state = DragState::Dragging {
                node,
                offset,
                moved: true,
                shift,
            };
        }
        Ok(true)
    }

    /// Pointer released. Ends the gesture; a plain click that never moved
    /// collapses the selection to the clicked node. Returns whether the
    /// gesture recorded a snapshot.
    pub fn pointer_up(&mut self, store: &mut GraphStore) -> bool {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        match state {
            DragState::Dragging {
                node, moved, shift, ..
            } => {
                let recorded = store.end_batch();
                if !moved && !shift {
                    store.select_node(Some(node));
                }
                log::trace!("drag end {node} (recorded: {recorded})");
                recorded
            }
            DragState::Connecting { from } => {
                log::debug!("connect from {from} abandoned");
                false
            }
            DragState::Idle => false,
        }
    }

    /// Abort the current gesture. A drag is reverted to where it started.
    pub fn cancel(&mut self, store: &mut GraphStore) -> bool {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging { node, .. } => {
                log::debug!("drag of {node} cancelled");
                store.cancel_batch()
            }
            DragState::Connecting { .. } => true,
            DragState::Idle => false,
        }
    }

    // ─── Connect ─────────────────────────────────────────────────────────

    /// Start drawing a connection out of `from`'s output port.
    pub fn begin_connect(&mut self, store: &mut GraphStore, from: NodeId) {
        if self.is_dragging() {
            self.cancel(store);
        }
        if store.graph().contains_node(from) {
            self.state = DragState::Connecting { from };
        }
    }

    /// Finish a connection on `to`'s input port. Connecting a node to
    /// itself is ignored.
    pub fn complete_connect(
        &mut self,
        store: &mut GraphStore,
        to: NodeId,
    ) -> FlowResult<Option<EdgeId>> {
        let DragState::Connecting { from } = self.state else {
            return Ok(None);
        };
        self.state = DragState::Idle;
        if from == to {
            log::debug!("ignoring self-connection on {from}");
            return Ok(None);
        }
        let id = EdgeId::generate("edge");
        store.add_edge(Edge::new(id, from, to))?;
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::NodeProps;
    use pretty_assertions::assert_eq;

    fn free_config() -> CanvasConfig {
        CanvasConfig {
            snap_to_grid: false,
            ..Default::default()
        }
    }

    #[test]
    fn create_node_uses_type_defaults() {
        let node = DragController::create_node("list", 10.0, 20.0).unwrap();
        assert_eq!(node.node_type(), NodeType::List);
        assert!(node.id.as_str().starts_with("list_"));
        assert_eq!(node.props, NodeProps::defaults_for(NodeType::List));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let mut store = GraphStore::new();
        let mut drag = DragController::new(&free_config());
        let err = drag
            .drop_component(&mut store, "carousel", 0.0, 0.0, (0.0, 0.0))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.graph().node_count(), 0);
    }

    #[test]
    fn moves_after_release_are_ignored() {
        let mut store = GraphStore::new();
        let mut drag = DragController::new(&free_config());
        let id = drag
            .drop_component(&mut store, "text", 0.0, 0.0, (0.0, 0.0))
            .unwrap();

        drag.pointer_down(&mut store, id, 5.0, 5.0, false);
        assert!(drag.pointer_move(&mut store, 25.0, 15.0).unwrap());
        drag.pointer_up(&mut store);
        assert!(!drag.pointer_move(&mut store, 500.0, 500.0).unwrap());

        let node = store.graph().node(id).unwrap();
        assert_eq!((node.x, node.y), (20.0, 10.0));
    }

    #[test]
    fn self_connection_is_ignored() {
        let mut store = GraphStore::new();
        let mut drag = DragController::new(&free_config());
        let id = drag
            .drop_component(&mut store, "button", 0.0, 0.0, (0.0, 0.0))
            .unwrap();
        drag.begin_connect(&mut store, id);
        assert_eq!(drag.complete_connect(&mut store, id).unwrap(), None);
        assert_eq!(store.graph().edge_count(), 0);
        assert!(!drag.is_connecting());
    }
}
