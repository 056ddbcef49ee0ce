//! Drawable shape model.
//!
//! A `Shape` is the surface-side projection of one domain entity. Each one
//! carries a `ShapeTag` naming the entity it was built from, which is how
//! surface gestures find their way back to the graph.

use crate::template::{
    self, ARROW_SIZE, EDGE_STROKE, EDGE_STROKE_WIDTH, GROUP_FILL, GROUP_STROKE, Rgba,
    SELECTED_STROKE, SELECTED_STROKE_WIDTH,
};
use flow_core::{Bounds, Edge, EdgeId, Group, GroupId, Node, NodeId, NodeProps};
use kurbo::{Line, ParamCurveNearest, Point, Rect, Vec2};
use std::fmt;

/// Entity class behind a shape. Declaration order is paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DomainType {
    Group,
    Edge,
    Node,
}

impl DomainType {
    pub fn as_str(self) -> &'static str {
        match self {
            DomainType::Group => "group",
            DomainType::Edge => "edge",
            DomainType::Node => "node",
        }
    }
}

/// `{domainType, id}` metadata attached to every drawn shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeTag {
    pub domain_type: DomainType,
    pub id: String,
}

impl ShapeTag {
    pub fn node(id: NodeId) -> Self {
        Self {
            domain_type: DomainType::Node,
            id: id.to_string(),
        }
    }

    pub fn edge(id: EdgeId) -> Self {
        Self {
            domain_type: DomainType::Edge,
            id: id.to_string(),
        }
    }

    pub fn group(id: GroupId) -> Self {
        Self {
            domain_type: DomainType::Group,
            id: id.to_string(),
        }
    }

    pub fn node_id(&self) -> Option<NodeId> {
        (self.domain_type == DomainType::Node).then(|| NodeId::intern(&self.id))
    }

    pub fn edge_id(&self) -> Option<EdgeId> {
        (self.domain_type == DomainType::Edge).then(|| EdgeId::intern(&self.id))
    }

    pub fn group_id(&self) -> Option<GroupId> {
        (self.domain_type == DomainType::Group).then(|| GroupId::intern(&self.id))
    }
}

impl fmt::Display for ShapeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain_type.as_str(), self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    /// Rounded rectangle (nodes and groups).
    Box { rect: Rect, corner_radius: f64 },
    /// Center-to-center line with a filled arrowhead triangle.
    Connector { line: Line, arrow: [Point; 3] },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub tag: ShapeTag,
    pub geometry: ShapeGeometry,
    pub fill: Option<Rgba>,
    pub stroke: Rgba,
    pub stroke_width: f32,
    pub dashed: bool,
    pub label: Option<String>,
    /// Stacking order within the shape's layer.
    pub z: i32,
}

impl Shape {
    /// Layer-then-z paint key.
    pub fn paint_key(&self) -> (DomainType, i32) {
        (self.tag.domain_type, self.z)
    }

    /// Axis-aligned extent of the shape.
    pub fn bounding_rect(&self) -> Rect {
        match &self.geometry {
            ShapeGeometry::Box { rect, .. } => *rect,
            ShapeGeometry::Connector { line, arrow } => arrow
                .iter()
                .fold(Rect::from_points(line.p0, line.p1), |r, p| r.union_pt(*p)),
        }
    }

    /// Whether a canvas point falls on the shape.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        let p = Point::new(px as f64, py as f64);
        match &self.geometry {
            ShapeGeometry::Box { rect, .. } => rect.contains(p),
            ShapeGeometry::Connector { line, arrow } => {
                let tolerance = (self.stroke_width as f64).max(4.0);
                line.nearest(p, 1e-6).distance_sq <= tolerance * tolerance
                    || triangle_contains(arrow, p)
            }
        }
    }

    /// The same shape with its box moved to `(x, y)`. Connectors are
    /// returned unchanged.
    pub fn moved_to(&self, x: f32, y: f32) -> Shape {
        let mut moved = self.clone();
        if let ShapeGeometry::Box { rect, .. } = &mut moved.geometry {
            *rect = Rect::from_origin_size((x as f64, y as f64), rect.size());
        }
        moved
    }
}

fn to_rect(b: Bounds) -> Rect {
    Rect::new(
        b.x as f64,
        b.y as f64,
        b.right() as f64,
        b.bottom() as f64,
    )
}

fn triangle_contains(tri: &[Point; 3], p: Point) -> bool {
    let sign = |a: Point, b: Point| (b - a).cross(p - a);
    let d0 = sign(tri[0], tri[1]);
    let d1 = sign(tri[1], tri[2]);
    let d2 = sign(tri[2], tri[0]);
    let has_neg = d0 < 0.0 || d1 < 0.0 || d2 < 0.0;
    let has_pos = d0 > 0.0 || d1 > 0.0 || d2 > 0.0;
    !(has_neg && has_pos)
}

// ─── Builders ────────────────────────────────────────────────────────────

/// Project a node through its type template. Button `color` and container
/// `backgroundColor` override the template fill.
pub fn node_shape(node: &Node, selected: bool) -> Shape {
    let tpl = template::node_template(node.node_type());
    let fill_override = match &node.props {
        NodeProps::Button(p) => Rgba::from_hex(&p.color),
        NodeProps::Container(p) => Rgba::from_hex(&p.background_color),
        _ => None,
    };
    let (stroke, stroke_width) = if selected {
        (SELECTED_STROKE, SELECTED_STROKE_WIDTH)
    } else {
        (tpl.stroke, tpl.stroke_width)
    };

    Shape {
        tag: ShapeTag::node(node.id),
        geometry: ShapeGeometry::Box {
            rect: Rect::from_origin_size(
                (node.x as f64, node.y as f64),
                (tpl.width as f64, tpl.height as f64),
            ),
            corner_radius: tpl.corner_radius as f64,
        },
        fill: Some(fill_override.unwrap_or(tpl.fill)),
        stroke,
        stroke_width,
        dashed: false,
        label: node.props.label().map(str::to_string),
        z: node.z_index.unwrap_or(0),
    }
}

/// A line between the endpoint node centers, with the arrowhead tip on the
/// target's border.
pub fn edge_shape(edge: &Edge, from: &Node, to: &Node, selected: bool) -> Shape {
    let source = from.bounds();
    let target = to.bounds();
    let (sx, sy) = source.center();
    let (tx, ty) = target.center();
    let line = Line::new((sx as f64, sy as f64), (tx as f64, ty as f64));
    let tip = border_point(line, target);

    Shape {
        tag: ShapeTag::edge(edge.id),
        geometry: ShapeGeometry::Connector {
            line,
            arrow: arrowhead(line.p0, tip, ARROW_SIZE),
        },
        fill: Some(if selected { SELECTED_STROKE } else { EDGE_STROKE }),
        stroke: if selected { SELECTED_STROKE } else { EDGE_STROKE },
        stroke_width: if selected {
            SELECTED_STROKE_WIDTH.max(EDGE_STROKE_WIDTH)
        } else {
            EDGE_STROKE_WIDTH
        },
        dashed: false,
        label: edge.label.clone(),
        z: 0,
    }
}

pub fn group_shape(group: &Group, selected: bool) -> Shape {
    Shape {
        tag: ShapeTag::group(group.id),
        geometry: ShapeGeometry::Box {
            rect: to_rect(group.bounds),
            corner_radius: 8.0,
        },
        fill: Some(GROUP_FILL),
        stroke: if selected { SELECTED_STROKE } else { GROUP_STROKE },
        stroke_width: if selected { SELECTED_STROKE_WIDTH } else { 1.0 },
        dashed: true,
        label: Some(group.name.clone()),
        z: group.z_index,
    }
}

/// Triangle `[tip, left, right]` pointing from `from` towards `tip`,
/// rotated to the line's angle.
pub fn arrowhead(from: Point, tip: Point, size: f64) -> [Point; 3] {
    let angle = (tip - from).atan2();
    let dir = Vec2::from_angle(angle);
    let back = tip - dir * size;
    let perp = Vec2::new(-dir.y, dir.x) * (size * 0.5);
    [tip, back + perp, back - perp]
}

/// Where the segment from `line.p0` into the center of `target` crosses the
/// target's border. Overlapping boxes fall back to the center.
fn border_point(line: Line, target: Bounds) -> Point {
    let d = line.p1 - line.p0;
    let half_w = target.width as f64 / 2.0;
    let half_h = target.height as f64 / 2.0;
    let sx = if d.x.abs() > f64::EPSILON { half_w / d.x.abs() } else { f64::INFINITY };
    let sy = if d.y.abs() > f64::EPSILON { half_h / d.y.abs() } else { f64::INFINITY };
    let s = sx.min(sy);
    if !s.is_finite() || s >= 1.0 {
        return line.p1;
    }
    line.p1 - d * s
}
