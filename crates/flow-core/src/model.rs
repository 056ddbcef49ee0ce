//! Core data model for flow documents.
//!
//! A flow is a set of placed components (`Node`), directed connections
//! between them (`Edge`), and named collections of nodes (`Group`) that share
//! a computed bounding rectangle. The serialized field names below are the
//! interchange contract with persistence and import/export collaborators.

use crate::error::{FlowResult, ValidationError};
use crate::id::{EdgeId, GroupId, NodeId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

// ─── Node types ──────────────────────────────────────────────────────────

/// The fixed component vocabulary offered by the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Button,
    Input,
    Text,
    Image,
    Container,
    Row,
    Column,
    Table,
    Chart,
    List,
}

impl NodeType {
    pub const ALL: [NodeType; 10] = [
        NodeType::Button,
        NodeType::Input,
        NodeType::Text,
        NodeType::Image,
        NodeType::Container,
        NodeType::Row,
        NodeType::Column,
        NodeType::Table,
        NodeType::Chart,
        NodeType::List,
    ];

    /// The type token used in drop payloads and serialized documents.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Button => "button",
            NodeType::Input => "input",
            NodeType::Text => "text",
            NodeType::Image => "image",
            NodeType::Container => "container",
            NodeType::Row => "row",
            NodeType::Column => "column",
            NodeType::Table => "table",
            NodeType::Chart => "chart",
            NodeType::List => "list",
        }
    }

    /// Default on-canvas footprint. Drives group rectangles and render templates.
    pub fn default_size(self) -> Size {
        match self {
            NodeType::Button => Size::new(120.0, 40.0),
            NodeType::Input => Size::new(200.0, 40.0),
            NodeType::Text => Size::new(100.0, 30.0),
            NodeType::Container => Size::new(300.0, 200.0),
            _ => Size::new(100.0, 100.0),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = ValidationError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == token)
            .ok_or_else(|| ValidationError::UnknownNodeType(token.to_string()))
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Grow by `pad` on all four sides.
    pub fn inflate(&self, pad: f32) -> Bounds {
        Bounds::new(
            self.x - pad,
            self.y - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }

    /// Union of every rectangle in `items`, or `None` when empty.
    pub fn enclosing(items: impl IntoIterator<Item = Bounds>) -> Option<Bounds> {
        items.into_iter().reduce(|acc, b| acc.union(&b))
    }
}

// ─── Typed props ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonProps {
    pub label: String,
    pub color: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ButtonProps {
    fn default() -> Self {
        Self {
            label: "按钮".into(),
            color: "#38bdf8".into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InputProps {
    pub placeholder: String,
    pub label: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for InputProps {
    fn default() -> Self {
        Self {
            placeholder: "请输入...".into(),
            label: "输入框".into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextProps {
    pub content: String,
    pub font_size: f32,
    pub color: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            content: "文本内容".into(),
            font_size: 16.0,
            color: "#333333".into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageProps {
    pub src: String,
    pub alt: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ImageProps {
    fn default() -> Self {
        Self {
            src: String::new(),
            alt: "图片".into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerProps {
    pub background_color: String,
    pub padding: f32,
    pub border_radius: f32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ContainerProps {
    fn default() -> Self {
        Self {
            background_color: "#f8f9fa".into(),
            padding: 16.0,
            border_radius: 8.0,
            extra: Map::new(),
        }
    }
}

/// Shared by `row` and `column` layout components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StackProps {
    pub gap: f32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for StackProps {
    fn default() -> Self {
        Self {
            gap: 8.0,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableProps {
    /// Comma-separated column headers.
    pub columns: String,
    pub rows: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for TableProps {
    fn default() -> Self {
        Self {
            columns: "列1,列2,列3".into(),
            rows: 3,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartProps {
    pub chart_type: String,
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ChartProps {
    fn default() -> Self {
        Self {
            chart_type: "bar".into(),
            title: "图表".into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListProps {
    /// Comma-separated list items.
    pub items: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ListProps {
    fn default() -> Self {
        Self {
            items: "项目1,项目2,项目3".into(),
            extra: Map::new(),
        }
    }
}

/// Per-type component properties. The variant fixes the node's type.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeProps {
    Button(ButtonProps),
    Input(InputProps),
    Text(TextProps),
    Image(ImageProps),
    Container(ContainerProps),
    Row(StackProps),
    Column(StackProps),
    Table(TableProps),
    Chart(ChartProps),
    List(ListProps),
}

impl NodeProps {
    /// The palette's default props for a freshly dropped component.
    pub fn defaults_for(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Button => NodeProps::Button(ButtonProps::default()),
            NodeType::Input => NodeProps::Input(InputProps::default()),
            NodeType::Text => NodeProps::Text(TextProps::default()),
            NodeType::Image => NodeProps::Image(ImageProps::default()),
            NodeType::Container => NodeProps::Container(ContainerProps::default()),
            NodeType::Row => NodeProps::Row(StackProps::default()),
            NodeType::Column => NodeProps::Column(StackProps::default()),
            NodeType::Table => NodeProps::Table(TableProps::default()),
            NodeType::Chart => NodeProps::Chart(ChartProps::default()),
            NodeType::List => NodeProps::List(ListProps::default()),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeProps::Button(_) => NodeType::Button,
            NodeProps::Input(_) => NodeType::Input,
            NodeProps::Text(_) => NodeType::Text,
            NodeProps::Image(_) => NodeType::Image,
            NodeProps::Container(_) => NodeType::Container,
            NodeProps::Row(_) => NodeType::Row,
            NodeProps::Column(_) => NodeType::Column,
            NodeProps::Table(_) => NodeType::Table,
            NodeProps::Chart(_) => NodeType::Chart,
            NodeProps::List(_) => NodeType::List,
        }
    }

    /// Validate an open JSON props map against the typed struct for `node_type`.
    /// `null` (props omitted) yields the type defaults.
    pub fn from_value(node_type: NodeType, value: Value) -> Result<Self, ValidationError> {
        Ok(match node_type {
            NodeType::Button => NodeProps::Button(parse_props(node_type, value)?),
            NodeType::Input => NodeProps::Input(parse_props(node_type, value)?),
            NodeType::Text => NodeProps::Text(parse_props(node_type, value)?),
            NodeType::Image => NodeProps::Image(parse_props(node_type, value)?),
            NodeType::Container => NodeProps::Container(parse_props(node_type, value)?),
            NodeType::Row => NodeProps::Row(parse_props(node_type, value)?),
            NodeType::Column => NodeProps::Column(parse_props(node_type, value)?),
            NodeType::Table => NodeProps::Table(parse_props(node_type, value)?),
            NodeType::Chart => NodeProps::Chart(parse_props(node_type, value)?),
            NodeType::List => NodeProps::List(parse_props(node_type, value)?),
        })
    }

    pub fn to_value(&self) -> Value {
        let value = match self {
            NodeProps::Button(p) => serde_json::to_value(p),
            NodeProps::Input(p) => serde_json::to_value(p),
            NodeProps::Text(p) => serde_json::to_value(p),
            NodeProps::Image(p) => serde_json::to_value(p),
            NodeProps::Container(p) => serde_json::to_value(p),
            NodeProps::Row(p) | NodeProps::Column(p) => serde_json::to_value(p),
            NodeProps::Table(p) => serde_json::to_value(p),
            NodeProps::Chart(p) => serde_json::to_value(p),
            NodeProps::List(p) => serde_json::to_value(p),
        };
        value.unwrap_or_default()
    }

    /// Short human-readable caption for the drawn shape, if the type has one.
    pub fn label(&self) -> Option<&str> {
        match self {
            NodeProps::Button(p) => Some(&p.label),
            NodeProps::Input(p) => Some(&p.placeholder),
            NodeProps::Text(p) => Some(&p.content),
            NodeProps::Image(p) => Some(&p.alt),
            NodeProps::Chart(p) => Some(&p.title),
            NodeProps::Table(p) => Some(&p.columns),
            NodeProps::List(p) => Some(&p.items),
            NodeProps::Container(_) | NodeProps::Row(_) | NodeProps::Column(_) => None,
        }
    }
}

fn parse_props<T: DeserializeOwned + Default>(
    node_type: NodeType,
    value: Value,
) -> Result<T, ValidationError> {
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value).map_err(|e| ValidationError::InvalidProps {
        node_type,
        reason: e.to_string(),
    })
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A placed component instance on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct Node {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub props: NodeProps,
    pub z_index: Option<i32>,
    /// Back-reference kept consistent with `Group::node_ids` by the store.
    pub group_id: Option<GroupId>,
}

impl Node {
    /// A node of `node_type` at `(x, y)` with that type's default props.
    pub fn new(id: NodeId, node_type: NodeType, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            props: NodeProps::defaults_for(node_type),
            z_index: None,
            group_id: None,
        }
    }

    /// Replace the props (and with them, the node type).
    #[must_use]
    pub fn with_props(mut self, props: NodeProps) -> Self {
        self.props = props;
        self
    }

    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.props.node_type()
    }

    pub fn size(&self) -> Size {
        self.node_type().default_size()
    }

    pub fn bounds(&self) -> Bounds {
        let size = self.size();
        Bounds::new(self.x, self.y, size.width, size.height)
    }
}

/// Wire shape of a node: `{id, type, x, y, props, zIndex?, groupId?}`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    id: NodeId,
    #[serde(rename = "type")]
    node_type: String,
    x: f32,
    y: f32,
    #[serde(default)]
    props: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    z_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group_id: Option<GroupId>,
}

impl TryFrom<RawNode> for Node {
    type Error = ValidationError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let node_type: NodeType = raw.node_type.parse()?;
        Ok(Node {
            id: raw.id,
            x: raw.x,
            y: raw.y,
            props: NodeProps::from_value(node_type, raw.props)?,
            z_index: raw.z_index,
            group_id: raw.group_id,
        })
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        RawNode {
            id: node.id,
            node_type: node.node_type().as_str().to_string(),
            x: node.x,
            y: node.y,
            props: node.props.to_value(),
            z_index: node.z_index,
            group_id: node.group_id,
        }
    }
}

/// Partial update for `GraphStore::update_node`. `None` fields are left alone.
///
/// Group membership is not patchable here; it changes only through the
/// group membership calls so both sides stay consistent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub props: Option<NodeProps>,
    pub z_index: Option<Option<i32>>,
}

impl NodePatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn props(props: NodeProps) -> Self {
        Self {
            props: Some(props),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.props.is_none() && self.z_index.is_none()
    }

    pub fn moves(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// A directed connection between two existing nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Condition expression evaluated by the flow runtime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    /// Data-flow kind.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
}

impl Edge {
    pub fn new(id: EdgeId, from: NodeId, to: NodeId) -> Self {
        Self {
            id,
            from,
            to,
            label: None,
            expression: None,
            edge_type: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgePatch {
    pub from: Option<NodeId>,
    pub to: Option<NodeId>,
    pub label: Option<Option<String>>,
    pub expression: Option<Option<String>>,
    pub edge_type: Option<Option<String>>,
}

impl EdgePatch {
    pub fn is_empty(&self) -> bool {
        self.from.is_none()
            && self.to.is_none()
            && self.label.is_none()
            && self.expression.is_none()
            && self.edge_type.is_none()
    }
}

// ─── Groups ──────────────────────────────────────────────────────────────

/// A named, collapsible collection of nodes.
///
/// `bounds` is the union of member node bounds expanded by the store's group
/// padding, recomputed whenever membership or member geometry changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(flatten)]
    pub bounds: Bounds,
    #[serde(default)]
    pub node_ids: SmallVec<[NodeId; 4]>,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub z_index: i32,
}

impl Group {
    pub fn new(id: GroupId, name: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            id,
            name: name.into(),
            bounds,
            node_ids: SmallVec::new(),
            collapsed: false,
            z_index: 0,
        }
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.node_ids.contains(&node)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub collapsed: Option<bool>,
    pub z_index: Option<i32>,
}

impl GroupPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.collapsed.is_none() && self.z_index.is_none()
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// The `{nodes, edges, groups}` payload exchanged with persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// Parsed but unvalidated document: nodes stay raw so type and props
/// problems surface as `ValidationError`s instead of JSON errors.
#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    edges: Vec<Edge>,
    #[serde(default)]
    groups: Vec<Group>,
}

impl FlowDocument {
    pub fn from_json(json: &str) -> FlowResult<Self> {
        let raw: RawDocument = serde_json::from_str(json)?;
        let nodes = raw
            .nodes
            .into_iter()
            .map(Node::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FlowDocument {
            nodes,
            edges: raw.edges,
            groups: raw.groups,
        })
    }

    pub fn to_json(&self) -> FlowResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
