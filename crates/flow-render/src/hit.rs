//! Hit testing: point → shape lookup.
//!
//! Walks shapes front-to-back (reverse paint order) and returns the tag of
//! the first one under the point.

use crate::shape::{Shape, ShapeTag};

/// Find the topmost shape at `(px, py)` among `shapes`, which must be in
/// paint order (back to front). Returns `None` for empty canvas.
pub fn hit_test<'a>(
    shapes: impl DoubleEndedIterator<Item = &'a Shape>,
    px: f32,
    py: f32,
) -> Option<&'a ShapeTag> {
    shapes.rev().find(|s| s.contains(px, py)).map(|s| &s.tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{DomainType, group_shape, node_shape};
    use flow_core::{Bounds, Group, GroupId, Node, NodeId, NodeType};

    #[test]
    fn topmost_shape_wins() {
        let group = Group::new(GroupId::intern("hit_g"), "G", Bounds::new(0.0, 0.0, 400.0, 400.0));
        let low = Node::new(NodeId::intern("hit_low"), NodeType::Image, 10.0, 10.0);
        let high = Node::new(NodeId::intern("hit_high"), NodeType::Image, 50.0, 50.0);
        let shapes = [
            group_shape(&group, false),
            node_shape(&low, false),
            node_shape(&high, false),
        ];

        let hit = hit_test(shapes.iter(), 60.0, 60.0).unwrap();
        assert_eq!(hit.id, "hit_high");

        let hit = hit_test(shapes.iter(), 20.0, 20.0).unwrap();
        assert_eq!(hit.id, "hit_low");

        let hit = hit_test(shapes.iter(), 300.0, 300.0).unwrap();
        assert_eq!(hit.domain_type, DomainType::Group);

        assert!(hit_test(shapes.iter(), 500.0, 500.0).is_none());
    }
}
