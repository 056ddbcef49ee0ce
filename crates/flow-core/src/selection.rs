//! Selection state machine.
//!
//! States are `None`, `Node` (single), `Nodes` (multi), `Edge` and `Group`.
//! Selecting across classes fully replaces the previous selection; only
//! shift-toggling accumulates, and only within the node class. Selection is
//! never recorded in history.

use crate::id::{EdgeId, GroupId, NodeId};
use smallvec::SmallVec;

/// Which selection state is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    None,
    Node,
    Nodes,
    Edge,
    Group,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    selected_node_id: Option<NodeId>,
    selected_node_ids: SmallVec<[NodeId; 4]>,
    selected_edge_id: Option<EdgeId>,
    selected_group_id: Option<GroupId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(&self) -> SelectionKind {
        if self.selected_edge_id.is_some() {
            SelectionKind::Edge
        } else if self.selected_group_id.is_some() {
            SelectionKind::Group
        } else {
            match self.selected_node_ids.len() {
                0 if self.selected_node_id.is_none() => SelectionKind::None,
                0 | 1 => SelectionKind::Node,
                _ => SelectionKind::Nodes,
            }
        }
    }

    /// The primary (most recently singly-selected) node.
    pub fn node(&self) -> Option<NodeId> {
        self.selected_node_id
    }

    /// The ordered multi-selection set.
    pub fn nodes(&self) -> &[NodeId] {
        &self.selected_node_ids
    }

    pub fn edge(&self) -> Option<EdgeId> {
        self.selected_edge_id
    }

    pub fn group(&self) -> Option<GroupId> {
        self.selected_group_id
    }

    pub fn is_empty(&self) -> bool {
        self.kind() == SelectionKind::None
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.selected_node_id == Some(id) || self.selected_node_ids.contains(&id)
    }

    /// Single-select a node (or clear everything with `None`).
    /// The multi-set resets to exactly `[id]`.
    pub fn select_node(&mut self, id: Option<NodeId>) {
        self.clear();
        if let Some(id) = id {
            self.selected_node_id = Some(id);
            self.selected_node_ids.push(id);
        }
    }

    /// Shift-click: toggle `id` in the multi-set. Edge and group selection
    /// are dropped since they cannot coexist with nodes.
    pub fn toggle_node(&mut self, id: NodeId) {
        self.selected_edge_id = None;
        self.selected_group_id = None;

        if let Some(pos) = self.selected_node_ids.iter().position(|n| *n == id) {
            self.selected_node_ids.remove(pos);
            if self.selected_node_id == Some(id) {
                self.selected_node_id = self.selected_node_ids.first().copied();
            }
        } else {
            // A lone primary without a set entry joins the set first.
            if let Some(primary) = self.selected_node_id
                && !self.selected_node_ids.contains(&primary)
            {
                self.selected_node_ids.push(primary);
            }
            self.selected_node_ids.push(id);
            if self.selected_node_id.is_none() {
                self.selected_node_id = Some(id);
            }
        }
    }

    /// Replace the multi-set. Duplicates are dropped, order is kept.
    pub fn set_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.clear();
        for id in ids {
            if !self.selected_node_ids.contains(&id) {
                self.selected_node_ids.push(id);
            }
        }
        self.selected_node_id = self.selected_node_ids.first().copied();
    }

    pub fn select_edge(&mut self, id: Option<EdgeId>) {
        self.clear();
        self.selected_edge_id = id;
    }

    pub fn select_group(&mut self, id: Option<GroupId>) {
        self.clear();
        self.selected_group_id = id;
    }

    pub fn clear(&mut self) {
        self.selected_node_id = None;
        self.selected_node_ids.clear();
        self.selected_edge_id = None;
        self.selected_group_id = None;
    }

    /// Drop a node that no longer exists. Returns whether anything changed.
    pub(crate) fn forget_node(&mut self, id: NodeId) -> bool {
        let before = self.selected_node_ids.len();
        self.selected_node_ids.retain(|n| *n != id);
        let mut changed = before != self.selected_node_ids.len();
        if self.selected_node_id == Some(id) {
            self.selected_node_id = self.selected_node_ids.first().copied();
            changed = true;
        }
        changed
    }

    pub(crate) fn forget_edge(&mut self, id: EdgeId) -> bool {
        if self.selected_edge_id == Some(id) {
            self.selected_edge_id = None;
            return true;
        }
        false
    }

    pub(crate) fn forget_group(&mut self, id: GroupId) -> bool {
        if self.selected_group_id == Some(id) {
            self.selected_group_id = None;
            return true;
        }
        false
    }
}
