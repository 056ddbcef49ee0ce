//! Multi-selection → persisted group.

use flow_core::{
    Bounds, FlowGraph, FlowResult, GraphStore, Group, GroupId, NodeId, ValidationError,
};

/// Converts the current node multi-selection into a `Group`.
pub struct GroupingEngine;

impl GroupingEngine {
    /// Union of the nodes' bounds grown by `padding` on every side.
    /// `None` when none of the ids exist.
    pub fn bounding_box(graph: &FlowGraph, ids: &[NodeId], padding: f32) -> Option<Bounds> {
        Bounds::enclosing(ids.iter().filter_map(|id| graph.node(*id)).map(|n| n.bounds()))
            .map(|b| b.inflate(padding))
    }

    /// Group the selected nodes. Fewer than two selected nodes is a no-op
    /// (`Ok(None)`). The group and its membership are committed together as
    /// one undo step; on failure nothing is left behind.
    pub fn group_selection(store: &mut GraphStore) -> FlowResult<Option<GroupId>> {
        let selected: Vec<NodeId> = store
            .selection()
            .nodes()
            .iter()
            .copied()
            .filter(|id| store.graph().contains_node(*id))
            .collect();
        if selected.len() < 2 {
            log::debug!("group: need at least 2 selected nodes, have {}", selected.len());
            return Ok(None);
        }
        for id in &selected {
            if let Some(node) = store.graph().node(*id)
                && let Some(existing) = node.group_id
            {
                let err = ValidationError::AlreadyGrouped {
                    node: id.to_string(),
                    group: existing.to_string(),
                };
                log::warn!("group rejected: {err}");
                return Err(err.into());
            }
        }
        let Some(bounds) = Self::bounding_box(store.graph(), &selected, store.group_padding())
        else {
            return Ok(None);
        };

        let id = GroupId::generate("group");
        let name = format!("Group {}", store.graph().group_count() + 1);

        store.begin_batch();
        let result = store
            .add_group(Group::new(id, name, bounds))
            .and_then(|()| store.add_nodes_to_group(id, &selected));
        match result {
            Ok(()) => {
                store.end_batch();
                log::debug!("grouped {} nodes as {id}", selected.len());
                Ok(Some(id))
            }
            Err(err) => {
                store.cancel_batch();
                Err(err)
            }
        }
    }

    /// Dissolve a group; its members stay where they are.
    pub fn ungroup(store: &mut GraphStore, group: GroupId) -> FlowResult<()> {
        store.remove_group(group).map(|_| ())
    }

    /// Dissolve the selected group, if a group is selected.
    pub fn ungroup_selection(store: &mut GraphStore) -> FlowResult<Option<GroupId>> {
        let Some(group) = store.selection().group() else {
            return Ok(None);
        };
        Self::ungroup(store, group)?;
        Ok(Some(group))
    }
}
