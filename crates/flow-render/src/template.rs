//! Fixed per-type visual templates.

use flow_core::NodeType;

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| -> Option<u8> { Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) };

        match bytes.len() {
            3 => Some(Self::rgb(
                hex_val(bytes[0])? * 17,
                hex_val(bytes[1])? * 17,
                hex_val(bytes[2])? * 17,
            )),
            6 => Some(Self::rgb(pair(0)?, pair(2)?, pair(4)?)),
            8 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    pub fn to_color(self) -> peniko::Color {
        peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

// ─── Palette ─────────────────────────────────────────────────────────────

pub const CANVAS_BACKGROUND: Rgba = Rgba::rgb(0xf8, 0xfa, 0xfc);
pub const SELECTED_STROKE: Rgba = Rgba::rgb(0x3b, 0x82, 0xf6);
pub const SELECTED_STROKE_WIDTH: f32 = 2.0;

pub const EDGE_STROKE: Rgba = Rgba::rgb(0x64, 0x74, 0x8b);
pub const EDGE_STROKE_WIDTH: f32 = 2.0;
pub const ARROW_SIZE: f64 = 10.0;

pub const GROUP_STROKE: Rgba = Rgba::rgb(0x94, 0xa3, 0xb8);
pub const GROUP_FILL: Rgba = Rgba::rgba(0x94, 0xa3, 0xb8, 0x1a);

/// How a node of a given type is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTemplate {
    pub width: f32,
    pub height: f32,
    pub fill: Rgba,
    pub stroke: Rgba,
    pub stroke_width: f32,
    pub corner_radius: f32,
}

pub fn node_template(node_type: NodeType) -> NodeTemplate {
    let size = node_type.default_size();
    let (fill, stroke, corner_radius) = match node_type {
        NodeType::Button => (Rgba::rgb(0x38, 0xbd, 0xf8), Rgba::rgb(0x02, 0x84, 0xc7), 6.0),
        NodeType::Input => (Rgba::rgb(0xff, 0xff, 0xff), Rgba::rgb(0xcb, 0xd5, 0xe1), 4.0),
        NodeType::Text => (Rgba::rgba(0, 0, 0, 0), Rgba::rgb(0xe2, 0xe8, 0xf0), 0.0),
        NodeType::Image => (Rgba::rgb(0xf1, 0xf5, 0xf9), Rgba::rgb(0xcb, 0xd5, 0xe1), 0.0),
        NodeType::Container => (Rgba::rgb(0xf8, 0xf9, 0xfa), Rgba::rgb(0xde, 0xe2, 0xe6), 8.0),
        NodeType::Row | NodeType::Column => {
            (Rgba::rgb(0xfe, 0xf3, 0xc7), Rgba::rgb(0xf5, 0x9e, 0x0b), 4.0)
        }
        NodeType::Table => (Rgba::rgb(0xff, 0xff, 0xff), Rgba::rgb(0x94, 0xa3, 0xb8), 2.0),
        NodeType::Chart => (Rgba::rgb(0xec, 0xfd, 0xf5), Rgba::rgb(0x10, 0xb9, 0x81), 4.0),
        NodeType::List => (Rgba::rgb(0xff, 0xff, 0xff), Rgba::rgb(0xa7, 0x8b, 0xfa), 4.0),
    };
    NodeTemplate {
        width: size.width,
        height: size.height,
        fill,
        stroke,
        stroke_width: 1.0,
        corner_radius,
    }
}
