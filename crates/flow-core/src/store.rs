//! The authoritative graph store.
//!
//! `GraphStore` owns the working graph, the selection and the undo log.
//! Every structural mutation follows the same shape: validate against the
//! current graph without touching it, then `commit` the change, which
//! records exactly one history snapshot (cascades included) and bumps the
//! revision counter that render sync watches. An `Err` from any mutator
//! means nothing changed.
//!
//! Selection calls are pure state changes: they bump the revision so the
//! surface redraws highlights, but are never recorded in history.

use crate::config::CanvasConfig;
use crate::error::{EntityKind, FlowError, FlowResult, ValidationError};
use crate::graph::FlowGraph;
use crate::history::History;
use crate::id::{EdgeId, GroupId, NodeId};
use crate::model::{Edge, EdgePatch, FlowDocument, Group, GroupPatch, Node, NodePatch};
use crate::selection::Selection;
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Debug)]
pub struct GraphStore {
    graph: Arc<FlowGraph>,
    selection: Selection,
    history: History,
    group_padding: f32,
    revision: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::with_config(&CanvasConfig::default())
    }

    pub fn with_config(config: &CanvasConfig) -> Self {
        let graph = Arc::new(FlowGraph::new());
        Self {
            history: History::new(Arc::clone(&graph), config.history_limit),
            graph,
            selection: Selection::new(),
            group_padding: config.group_padding,
            revision: 0,
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    /// A cheap shared handle to the current graph state.
    pub fn snapshot(&self) -> Arc<FlowGraph> {
        Arc::clone(&self.graph)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Monotonic counter bumped by every visible state change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn group_padding(&self) -> f32 {
        self.group_padding
    }

    /// Adopt the padding and history limit of a new configuration. Existing
    /// group rectangles are left alone until their membership next changes.
    pub fn set_config(&mut self, config: &CanvasConfig) {
        self.group_padding = config.group_padding;
        self.history.set_max_depth(config.history_limit);
        log::debug!(
            "store config: padding {}, history limit {}",
            config.group_padding,
            config.history_limit
        );
    }

    pub fn document(&self) -> FlowDocument {
        self.graph.to_document()
    }

    fn require_node(&self, id: NodeId) -> FlowResult<&Node> {
        self.graph
            .node(id)
            .ok_or_else(|| FlowError::not_found(EntityKind::Node, id))
    }

    fn require_edge(&self, id: EdgeId) -> FlowResult<&Edge> {
        self.graph
            .edge(id)
            .ok_or_else(|| FlowError::not_found(EntityKind::Edge, id))
    }

    fn require_group(&self, id: GroupId) -> FlowResult<&Group> {
        self.graph
            .group(id)
            .ok_or_else(|| FlowError::not_found(EntityKind::Group, id))
    }

    // ─── Commit ──────────────────────────────────────────────────────────

    /// Apply an already-validated change and record one snapshot for it.
    fn commit<R>(&mut self, description: &str, apply: impl FnOnce(&mut FlowGraph) -> R) -> R {
        let out = apply(Arc::make_mut(&mut self.graph));
        self.history.record(&self.graph, description);
        self.revision += 1;
        log::debug!("commit: {description} (rev {})", self.revision);
        out
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    /// Insert a node and make it the sole selection. A node arriving with a
    /// `group_id` joins that group.
    pub fn add_node(&mut self, node: Node) -> FlowResult<()> {
        if self.graph.contains_node(node.id) {
            return Err(rejected(
                "add_node",
                ValidationError::DuplicateId {
                    kind: EntityKind::Node,
                    id: node.id.to_string(),
                },
            ));
        }
        if let Some(group) = node.group_id
            && !self.graph.contains_group(group)
        {
            return Err(rejected(
                "add_node",
                ValidationError::DanglingGroup {
                    node: node.id.to_string(),
                    group: group.to_string(),
                },
            ));
        }

        let id = node.id;
        let group = node.group_id;
        let padding = self.group_padding;
        self.commit("add node", |g| {
            g.insert_node(node);
            if let Some(gid) = group {
                if let Some(target) = g.group_mut(gid) {
                    target.node_ids.push(id);
                }
                g.refresh_group_bounds(gid, padding);
            }
        });
        self.selection.select_node(Some(id));
        Ok(())
    }

    /// Patch a node's position, props or z-index. Props must keep the
    /// node's type.
    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) -> FlowResult<()> {
        let current = self.require_node(id).map_err(|e| rejected("update_node", e))?;
        if let Some(props) = &patch.props
            && props.node_type() != current.node_type()
        {
            let err = ValidationError::PropsMismatch {
                node: id.to_string(),
                expected: current.node_type(),
                found: props.node_type(),
            };
            return Err(rejected("update_node", err));
        }

        let moves = patch.moves();
        let mut next = current.clone();
        if let Some(x) = patch.x {
            next.x = x;
        }
        if let Some(y) = patch.y {
            next.y = y;
        }
        if let Some(props) = patch.props {
            next.props = props;
        }
        if let Some(z) = patch.z_index {
            next.z_index = z;
        }
        if next == *current {
            return Ok(());
        }

        // Size follows the type, so only a move can change a group rect.
        let group = next.group_id.filter(|_| moves);
        let padding = self.group_padding;
        self.commit("update node", |g| {
            if let Some(node) = g.node_mut(id) {
                *node = next;
            }
            if let Some(gid) = group {
                g.refresh_group_bounds(gid, padding);
            }
        });
        Ok(())
    }

    /// Translate several nodes by the same delta in one snapshot.
    pub fn move_nodes(&mut self, ids: &[NodeId], dx: f32, dy: f32) -> FlowResult<()> {
        let mut targets: SmallVec<[NodeId; 8]> = SmallVec::new();
        let mut groups: SmallVec<[GroupId; 4]> = SmallVec::new();
        for &id in ids {
            let node = self.require_node(id).map_err(|e| rejected("move_nodes", e))?;
            if !targets.contains(&id) {
                targets.push(id);
            }
            if let Some(gid) = node.group_id
                && !groups.contains(&gid)
            {
                groups.push(gid);
            }
        }
        if targets.is_empty() || (dx == 0.0 && dy == 0.0) {
            return Ok(());
        }

        let padding = self.group_padding;
        self.commit("move nodes", |g| {
            for id in &targets {
                if let Some(node) = g.node_mut(*id) {
                    node.x += dx;
                    node.y += dy;
                }
            }
            for gid in groups {
                g.refresh_group_bounds(gid, padding);
            }
        });
        Ok(())
    }

    /// Remove a node, every edge touching it, and its group membership.
    pub fn remove_node(&mut self, id: NodeId) -> FlowResult<Node> {
        let group = self
            .require_node(id)
            .map_err(|e| rejected("remove_node", e))?
            .group_id;

        let padding = self.group_padding;
        let removed = self.commit("remove node", |g| {
            let removed = g.remove_node(id);
            if let Some(gid) = group {
                if let Some(owner) = g.group_mut(gid) {
                    owner.node_ids.retain(|n| *n != id);
                }
                g.refresh_group_bounds(gid, padding);
            }
            removed
        });

        let Some((node, pruned)) = removed else {
            return Err(FlowError::not_found(EntityKind::Node, id));
        };
        self.selection.forget_node(id);
        for edge in &pruned {
            self.selection.forget_edge(edge.id);
        }
        if !pruned.is_empty() {
            log::debug!("remove node {id}: pruned {} edge(s)", pruned.len());
        }
        Ok(node)
    }

    // ─── Edges ───────────────────────────────────────────────────────────

    pub fn add_edge(&mut self, edge: Edge) -> FlowResult<()> {
        if self.graph.contains_edge(edge.id) {
            return Err(rejected(
                "add_edge",
                ValidationError::DuplicateId {
                    kind: EntityKind::Edge,
                    id: edge.id.to_string(),
                },
            ));
        }
        self.check_endpoints(&edge)
            .map_err(|e| rejected("add_edge", e))?;

        self.commit("add edge", |g| g.insert_edge(edge));
        Ok(())
    }

    pub fn update_edge(&mut self, id: EdgeId, patch: EdgePatch) -> FlowResult<()> {
        let current = self.require_edge(id).map_err(|e| rejected("update_edge", e))?;

        let mut next = current.clone();
        if let Some(from) = patch.from {
            next.from = from;
        }
        if let Some(to) = patch.to {
            next.to = to;
        }
        if let Some(label) = patch.label {
            next.label = label;
        }
        if let Some(expression) = patch.expression {
            next.expression = expression;
        }
        if let Some(edge_type) = patch.edge_type {
            next.edge_type = edge_type;
        }
        if next == *current {
            return Ok(());
        }
        self.check_endpoints(&next)
            .map_err(|e| rejected("update_edge", e))?;

        self.commit("update edge", |g| g.replace_edge(next));
        Ok(())
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> FlowResult<Edge> {
        self.require_edge(id).map_err(|e| rejected("remove_edge", e))?;
        let removed = self.commit("remove edge", |g| g.remove_edge(id));
        self.selection.forget_edge(id);
        removed.ok_or_else(|| FlowError::not_found(EntityKind::Edge, id))
    }

    fn check_endpoints(&self, edge: &Edge) -> Result<(), ValidationError> {
        for endpoint in [edge.from, edge.to] {
            if !self.graph.contains_node(endpoint) {
                return Err(ValidationError::DanglingEdge {
                    edge: edge.id.to_string(),
                    node: endpoint.to_string(),
                });
            }
        }
        Ok(())
    }

    // ─── Groups ──────────────────────────────────────────────────────────

    /// Insert a group. Listed members adopt it and the rectangle is
    /// recomputed from them; a memberless group keeps the rectangle given.
    pub fn add_group(&mut self, mut group: Group) -> FlowResult<()> {
        if self.graph.contains_group(group.id) {
            return Err(rejected(
                "add_group",
                ValidationError::DuplicateId {
                    kind: EntityKind::Group,
                    id: group.id.to_string(),
                },
            ));
        }
        let mut members: SmallVec<[NodeId; 4]> = SmallVec::new();
        for &id in &group.node_ids {
            self.check_joinable(group.id, id)
                .map_err(|e| rejected("add_group", e))?;
            if !members.contains(&id) {
                members.push(id);
            }
        }
        group.node_ids = members;

        let gid = group.id;
        let padding = self.group_padding;
        self.commit("add group", |g| {
            for id in group.node_ids.clone() {
                if let Some(node) = g.node_mut(id) {
                    node.group_id = Some(gid);
                }
            }
            g.insert_group(group);
            g.refresh_group_bounds(gid, padding);
        });
        Ok(())
    }

    pub fn update_group(&mut self, id: GroupId, patch: GroupPatch) -> FlowResult<()> {
        let current = self.require_group(id).map_err(|e| rejected("update_group", e))?;

        let mut next = current.clone();
        if let Some(name) = patch.name {
            next.name = name;
        }
        if let Some(collapsed) = patch.collapsed {
            next.collapsed = collapsed;
        }
        if let Some(z) = patch.z_index {
            next.z_index = z;
        }
        if next == *current {
            return Ok(());
        }

        self.commit("update group", |g| {
            if let Some(group) = g.group_mut(id) {
                *group = next;
            }
        });
        Ok(())
    }

    /// Delete a group after clearing every member's back-reference.
    pub fn remove_group(&mut self, id: GroupId) -> FlowResult<Group> {
        let members = self
            .require_group(id)
            .map_err(|e| rejected("remove_group", e))?
            .node_ids
            .clone();

        let removed = self.commit("remove group", |g| {
            for member in &members {
                if let Some(node) = g.node_mut(*member) {
                    node.group_id = None;
                }
            }
            g.remove_group(id)
        });
        self.selection.forget_group(id);
        removed.ok_or_else(|| FlowError::not_found(EntityKind::Group, id))
    }

    /// Add nodes to a group, setting both sides of the membership in one
    /// snapshot. Nodes already in this group are skipped.
    pub fn add_nodes_to_group(&mut self, group_id: GroupId, ids: &[NodeId]) -> FlowResult<()> {
        let group = self
            .require_group(group_id)
            .map_err(|e| rejected("add_nodes_to_group", e))?;
        let mut joining: SmallVec<[NodeId; 4]> = SmallVec::new();
        for &id in ids {
            if group.contains(id) || joining.contains(&id) {
                continue;
            }
            self.check_joinable(group_id, id)
                .map_err(|e| rejected("add_nodes_to_group", e))?;
            joining.push(id);
        }
        if joining.is_empty() {
            return Ok(());
        }

        let padding = self.group_padding;
        self.commit("add nodes to group", |g| {
            for id in &joining {
                if let Some(node) = g.node_mut(*id) {
                    node.group_id = Some(group_id);
                }
            }
            if let Some(group) = g.group_mut(group_id) {
                group.node_ids.extend(joining.iter().copied());
            }
            g.refresh_group_bounds(group_id, padding);
        });
        Ok(())
    }

    /// Remove nodes from a group. Nodes that are not members are skipped.
    pub fn remove_nodes_from_group(
        &mut self,
        group_id: GroupId,
        ids: &[NodeId],
    ) -> FlowResult<()> {
        let group = self
            .require_group(group_id)
            .map_err(|e| rejected("remove_nodes_from_group", e))?;
        let mut leaving: SmallVec<[NodeId; 4]> = SmallVec::new();
        for &id in ids {
            if !self.graph.contains_node(id) {
                return Err(rejected(
                    "remove_nodes_from_group",
                    FlowError::not_found(EntityKind::Node, id),
                ));
            }
            if group.contains(id) && !leaving.contains(&id) {
                leaving.push(id);
            }
        }
        if leaving.is_empty() {
            return Ok(());
        }

        let padding = self.group_padding;
        self.commit("remove nodes from group", |g| {
            for id in &leaving {
                if let Some(node) = g.node_mut(*id) {
                    node.group_id = None;
                }
            }
            if let Some(group) = g.group_mut(group_id) {
                group.node_ids.retain(|n| !leaving.contains(n));
            }
            g.refresh_group_bounds(group_id, padding);
        });
        Ok(())
    }

    /// A node may join `group` if it exists and belongs to no other group.
    fn check_joinable(&self, group: GroupId, id: NodeId) -> FlowResult<()> {
        let node = self.require_node(id)?;
        match node.group_id {
            Some(other) if other != group => Err(ValidationError::AlreadyGrouped {
                node: id.to_string(),
                group: other.to_string(),
            }
            .into()),
            _ => Ok(()),
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Single-select a node, or clear the selection with `None`.
    /// Unknown ids are ignored.
    pub fn select_node(&mut self, id: Option<NodeId>) {
        if let Some(id) = id
            && !self.graph.contains_node(id)
        {
            log::debug!("select_node: ignoring unknown node {id}");
            return;
        }
        self.update_selection(|s| s.select_node(id));
    }

    /// Shift-click toggle within the node multi-selection.
    pub fn toggle_node_selection(&mut self, id: NodeId) {
        if !self.graph.contains_node(id) {
            log::debug!("toggle_node_selection: ignoring unknown node {id}");
            return;
        }
        self.update_selection(|s| s.toggle_node(id));
    }

    /// Replace the multi-selection. Unknown ids are dropped.
    pub fn set_selected_node_ids(&mut self, ids: &[NodeId]) {
        let graph = &self.graph;
        let known: SmallVec<[NodeId; 8]> = ids
            .iter()
            .copied()
            .filter(|id| graph.contains_node(*id))
            .collect();
        self.update_selection(|s| s.set_nodes(known));
    }

    pub fn select_edge(&mut self, id: Option<EdgeId>) {
        if let Some(id) = id
            && !self.graph.contains_edge(id)
        {
            log::debug!("select_edge: ignoring unknown edge {id}");
            return;
        }
        self.update_selection(|s| s.select_edge(id));
    }

    pub fn select_group(&mut self, id: Option<GroupId>) {
        if let Some(id) = id
            && !self.graph.contains_group(id)
        {
            log::debug!("select_group: ignoring unknown group {id}");
            return;
        }
        self.update_selection(|s| s.select_group(id));
    }

    pub fn select_all_nodes(&mut self) {
        let ids: Vec<NodeId> = self.graph.nodes().map(|n| n.id).collect();
        self.update_selection(|s| s.set_nodes(ids));
    }

    pub fn clear_selection(&mut self) {
        self.update_selection(Selection::clear);
    }

    fn update_selection(&mut self, change: impl FnOnce(&mut Selection)) {
        let before = self.selection.clone();
        change(&mut self.selection);
        if self.selection != before {
            self.revision += 1;
        }
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Restore the previous snapshot. Selection is left as it is.
    /// Returns `false` at the oldest snapshot or during a batch.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(graph) => {
                self.graph = graph;
                self.revision += 1;
                log::debug!("undo -> snapshot {}", self.history.cursor());
                true
            }
            None => {
                log::debug!("undo: nothing to undo");
                false
            }
        }
    }

    /// Re-apply the next snapshot. Returns `false` at the newest snapshot
    /// or during a batch.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(graph) => {
                self.graph = graph;
                self.revision += 1;
                log::debug!("redo -> snapshot {}", self.history.cursor());
                true
            }
            None => {
                log::debug!("redo: nothing to redo");
                false
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Open a gesture batch: mutations until the matching `end_batch` are
    /// recorded as one snapshot.
    pub fn begin_batch(&mut self) {
        self.history.begin_batch(&self.graph);
    }

    /// Close a gesture batch. Returns whether a snapshot was recorded.
    pub fn end_batch(&mut self) -> bool {
        self.history.end_batch(&self.graph)
    }

    /// Abort the open batch and revert the graph to its state when the
    /// batch opened. Returns `false` if no batch was open.
    pub fn cancel_batch(&mut self) -> bool {
        let Some(base) = self.history.cancel_batch() else {
            return false;
        };
        if !Arc::ptr_eq(&base, &self.graph) {
            self.graph = base;
            self.revision += 1;
        }
        log::debug!("batch cancelled");
        true
    }

    pub fn is_batching(&self) -> bool {
        self.history.is_batching()
    }

    // ─── Import / export ─────────────────────────────────────────────────

    /// Replace the whole graph. Clears selection and restarts history at
    /// the imported state, so it cannot be undone.
    pub fn import_flow(&mut self, doc: FlowDocument) -> FlowResult<()> {
        let graph = FlowGraph::from_document(doc).map_err(|e| rejected("import_flow", e))?;
        let graph = Arc::new(graph);
        self.history.reset(Arc::clone(&graph));
        self.graph = graph;
        self.selection.clear();
        self.revision += 1;
        log::debug!(
            "imported flow: {} nodes, {} edges, {} groups",
            self.graph.node_count(),
            self.graph.edge_count(),
            self.graph.group_count()
        );
        Ok(())
    }

    pub fn import_json(&mut self, json: &str) -> FlowResult<()> {
        let doc = FlowDocument::from_json(json).map_err(|e| rejected("import_json", e))?;
        self.import_flow(doc)
    }

    pub fn export_json(&self) -> FlowResult<String> {
        self.document().to_json()
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

fn rejected(op: &str, err: impl Into<FlowError>) -> FlowError {
    let err = err.into();
    log::warn!("{op} rejected: {err}");
    err
}
