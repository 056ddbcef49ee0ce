//! Shapes → Vello drawing commands.

use crate::shape::{Shape, ShapeGeometry};
use crate::template::Rgba;
use kurbo::{Affine, BezPath, Rect, Stroke as KurboStroke};
use peniko::Fill;
use vello::Scene;

const DASH_PATTERN: [f64; 2] = [6.0, 4.0];

/// Paint a full frame: background, then `shapes` in the order given.
///
/// Call once per frame with a freshly-cleared `Scene`.
pub fn paint_shapes<'a>(
    scene: &mut Scene,
    width: f32,
    height: f32,
    background: Rgba,
    shapes: impl IntoIterator<Item = &'a Shape>,
) {
    let canvas = Rect::new(0.0, 0.0, width as f64, height as f64);
    scene.fill(Fill::NonZero, Affine::IDENTITY, background.to_color(), None, &canvas);

    for shape in shapes {
        paint_shape(scene, shape);
    }
}

pub fn paint_shape(scene: &mut Scene, shape: &Shape) {
    let stroke = stroke_style(shape);
    match &shape.geometry {
        ShapeGeometry::Box {
            rect,
            corner_radius,
        } => {
            let rounded = rect.to_rounded_rect(*corner_radius);
            if let Some(fill) = shape.fill
                && fill.a > 0
            {
                scene.fill(Fill::NonZero, Affine::IDENTITY, fill.to_color(), None, &rounded);
            }
            scene.stroke(&stroke, Affine::IDENTITY, shape.stroke.to_color(), None, &rounded);
        }
        ShapeGeometry::Connector { line, arrow } => {
            scene.stroke(&stroke, Affine::IDENTITY, shape.stroke.to_color(), None, line);

            let mut head = BezPath::new();
            head.move_to(arrow[0]);
            head.line_to(arrow[1]);
            head.line_to(arrow[2]);
            head.close_path();
            let fill = shape.fill.unwrap_or(shape.stroke);
            scene.fill(Fill::NonZero, Affine::IDENTITY, fill.to_color(), None, &head);
        }
    }

    if let Some(label) = &shape.label {
        let origin = shape.bounding_rect().origin();
        log::trace!("label {} {:?} at ({}, {})", shape.tag, label, origin.x, origin.y);
        // Labels need a font context to rasterize; only geometry is painted.
    }
}

fn stroke_style(shape: &Shape) -> KurboStroke {
    let stroke = KurboStroke::new(shape.stroke_width as f64);
    if shape.dashed {
        stroke.with_dashes(0.0, DASH_PATTERN)
    } else {
        stroke
    }
}
