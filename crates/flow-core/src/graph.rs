//! Petgraph-backed node/edge graph plus the flat group table.
//!
//! `FlowGraph` is the value that history snapshots share. It offers read
//! access publicly; structural mutation is crate-private and only reached
//! through `GraphStore`, which validates before it touches anything here.

use crate::error::{EntityKind, ValidationError};
use crate::id::{EdgeId, GroupId, NodeId};
use crate::model::{Bounds, Edge, FlowDocument, Group, Node};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use std::collections::{HashMap, HashSet};

/// Nodes are graph vertices, edges are graph edges, groups sit beside.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    graph: StableDiGraph<Node, Edge>,
    node_index: HashMap<NodeId, NodeIndex>,
    edge_index: HashMap<EdgeId, EdgeIndex>,
    groups: Vec<Group>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an interchange document, rejecting any structural
    /// inconsistency. Group rectangles are taken as given.
    pub fn from_document(doc: FlowDocument) -> Result<Self, ValidationError> {
        validate_document(&doc)?;

        let mut flow = FlowGraph::new();
        for node in doc.nodes {
            flow.insert_node(node);
        }
        for edge in doc.edges {
            flow.insert_edge(edge);
        }
        flow.groups = doc.groups;
        Ok(flow)
    }

    pub fn to_document(&self) -> FlowDocument {
        FlowDocument {
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().cloned().collect(),
            groups: self.groups.clone(),
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_count() == 0 && self.groups.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_indices().map(|idx| &self.graph[idx])
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edge_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edge_index.contains_key(&id)
    }

    pub fn contains_group(&self, id: GroupId) -> bool {
        self.group(id).is_some()
    }

    /// Ids of every edge starting or ending at `node`.
    pub fn incident_edges(&self, node: NodeId) -> Vec<EdgeId> {
        let Some(&idx) = self.node_index.get(&node) else {
            return Vec::new();
        };
        // Self-loops show up in both directions.
        let mut seen = HashSet::new();
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.weight().id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Union of the member node bounds of `group`, unpadded.
    pub fn members_bounds(&self, group: &Group) -> Option<Bounds> {
        Bounds::enclosing(
            group
                .node_ids
                .iter()
                .filter_map(|id| self.node(*id))
                .map(Node::bounds),
        )
    }

    // ─── Crate-private mutation ──────────────────────────────────────────

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let idx = *self.node_index.get(&id)?;
        self.graph.node_weight_mut(idx)
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        let idx = *self.edge_index.get(&id)?;
        self.graph.edge_weight_mut(idx)
    }

    pub(crate) fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    pub(crate) fn insert_node(&mut self, node: Node) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
        idx
    }

    /// Insert an edge whose endpoints are known to exist.
    pub(crate) fn insert_edge(&mut self, edge: Edge) -> Option<EdgeIndex> {
        let from = *self.node_index.get(&edge.from)?;
        let to = *self.node_index.get(&edge.to)?;
        let id = edge.id;
        let idx = self.graph.add_edge(from, to, edge);
        self.edge_index.insert(id, idx);
        Some(idx)
    }

    /// Remove a node together with every edge touching it.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<(Node, Vec<Edge>)> {
        let mut pruned = Vec::new();
        for edge_id in self.incident_edges(id) {
            if let Some(edge) = self.remove_edge(edge_id) {
                pruned.push(edge);
            }
        }
        let idx = self.node_index.remove(&id)?;
        let node = self.graph.remove_node(idx)?;
        Some((node, pruned))
    }

    pub(crate) fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let idx = self.edge_index.remove(&id)?;
        self.graph.remove_edge(idx)
    }

    /// Replace an edge in place. Endpoint changes re-link it in the graph.
    pub(crate) fn replace_edge(&mut self, edge: Edge) -> Option<()> {
        let id = edge.id;
        let current = self.edge(id)?;
        if current.from == edge.from && current.to == edge.to {
            *self.edge_mut(id)? = edge;
            return Some(());
        }
        self.remove_edge(id)?;
        self.insert_edge(edge).map(|_| ())
    }

    pub(crate) fn insert_group(&mut self, group: Group) {
        self.groups.push(group);
    }

    pub(crate) fn remove_group(&mut self, id: GroupId) -> Option<Group> {
        let pos = self.groups.iter().position(|g| g.id == id)?;
        Some(self.groups.remove(pos))
    }

    /// Recompute a group's rectangle from its members plus `padding`.
    /// A group with no remaining members keeps its last rectangle.
    pub(crate) fn refresh_group_bounds(&mut self, id: GroupId, padding: f32) {
        let Some(group) = self.group(id) else {
            return;
        };
        if let Some(bounds) = self.members_bounds(group)
            && let Some(group) = self.group_mut(id)
        {
            group.bounds = bounds.inflate(padding);
        }
    }
}

impl PartialEq for FlowGraph {
    fn eq(&self, other: &Self) -> bool {
        self.groups == other.groups
            && self.node_count() == other.node_count()
            && self.edge_count() == other.edge_count()
            && self.nodes().eq(other.nodes())
            && self.edges().eq(other.edges())
    }
}

fn validate_document(doc: &FlowDocument) -> Result<(), ValidationError> {
    let mut node_ids = HashSet::new();
    for node in &doc.nodes {
        if !node_ids.insert(node.id) {
            return Err(ValidationError::DuplicateId {
                kind: EntityKind::Node,
                id: node.id.to_string(),
            });
        }
    }

    let mut edge_ids = HashSet::new();
    for edge in &doc.edges {
        if !edge_ids.insert(edge.id) {
            return Err(ValidationError::DuplicateId {
                kind: EntityKind::Edge,
                id: edge.id.to_string(),
            });
        }
        for endpoint in [edge.from, edge.to] {
            if !node_ids.contains(&endpoint) {
                return Err(ValidationError::DanglingEdge {
                    edge: edge.id.to_string(),
                    node: endpoint.to_string(),
                });
            }
        }
    }

    // node -> the group that lists it
    let mut owner: HashMap<NodeId, GroupId> = HashMap::new();
    let mut group_ids = HashSet::new();
    for group in &doc.groups {
        if !group_ids.insert(group.id) {
            return Err(ValidationError::DuplicateId {
                kind: EntityKind::Group,
                id: group.id.to_string(),
            });
        }
        for member in &group.node_ids {
            if !node_ids.contains(member) {
                return Err(ValidationError::MissingMember {
                    group: group.id.to_string(),
                    node: member.to_string(),
                });
            }
            if let Some(prev) = owner.insert(*member, group.id) {
                return Err(ValidationError::AlreadyGrouped {
                    node: member.to_string(),
                    group: prev.to_string(),
                });
            }
        }
    }

    for node in &doc.nodes {
        if let Some(group) = node.group_id
            && !group_ids.contains(&group)
        {
            return Err(ValidationError::DanglingGroup {
                node: node.id.to_string(),
                group: group.to_string(),
            });
        }
        match (node.group_id, owner.get(&node.id)) {
            (None, None) => {}
            (Some(a), Some(b)) if a == *b => {}
            (claimed, listed) => {
                let group = claimed.or(listed.copied()).map(|g| g.to_string());
                return Err(ValidationError::MembershipMismatch {
                    node: node.id.to_string(),
                    group: group.unwrap_or_default(),
                });
            }
        }
    }

    Ok(())
}
