//! Drawing surface contract and the retained Vello-backed surface.
//!
//! The editor never draws directly. It creates, updates and removes tagged
//! shapes on a `Surface`, asks it to convert client pointer positions into
//! canvas space, and asks it what lies under a point.

use crate::hit;
use crate::paint;
use crate::shape::{Shape, ShapeTag};
use crate::template::{CANVAS_BACKGROUND, Rgba};
use std::collections::BTreeMap;
use thiserror::Error;
use vello::Scene;

/// Opaque handle to a shape owned by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeHandle(pub u64);

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("unknown shape handle {0:?}")]
    UnknownHandle(ShapeHandle),

    #[error("surface has been disposed")]
    Disposed,

    #[error("surface rejected shape {tag}: {reason}")]
    Rejected { tag: ShapeTag, reason: String },
}

pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// External drawing surface.
pub trait Surface {
    fn create_shape(&mut self, shape: &Shape) -> SurfaceResult<ShapeHandle>;

    fn update_shape(&mut self, handle: ShapeHandle, shape: &Shape) -> SurfaceResult<()>;

    fn remove_shape(&mut self, handle: ShapeHandle) -> SurfaceResult<()>;

    fn shape_count(&self) -> usize;

    /// Top-left corner of the surface in client coordinates.
    fn origin(&self) -> (f32, f32);

    /// Convert a client pointer position to canvas-local coordinates.
    fn client_to_canvas(&self, client_x: f32, client_y: f32) -> (f32, f32) {
        let (ox, oy) = self.origin();
        (client_x - ox, client_y - oy)
    }

    /// Tag of the topmost shape under a canvas point.
    fn hit_test(&self, x: f32, y: f32) -> Option<ShapeTag>;

    /// Apply a new surface size.
    fn resize(&mut self, width: f32, height: f32);
}

/// Retained-mode surface that keeps shapes in memory and paints them into a
/// `vello::Scene` on demand.
#[derive(Debug)]
pub struct SceneSurface {
    shapes: BTreeMap<ShapeHandle, Shape>,
    next_handle: u64,
    origin: (f32, f32),
    width: f32,
    height: f32,
    background: Rgba,
    disposed: bool,
}

impl SceneSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            shapes: BTreeMap::new(),
            next_handle: 1,
            origin: (0.0, 0.0),
            width,
            height,
            background: CANVAS_BACKGROUND,
            disposed: false,
        }
    }

    #[must_use]
    pub fn with_origin(mut self, x: f32, y: f32) -> Self {
        self.origin = (x, y);
        self
    }

    pub fn set_origin(&mut self, x: f32, y: f32) {
        self.origin = (x, y);
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn shape(&self, handle: ShapeHandle) -> Option<&Shape> {
        self.shapes.get(&handle)
    }

    /// Find the shape carrying `tag`.
    pub fn find(&self, tag: &ShapeTag) -> Option<(ShapeHandle, &Shape)> {
        self.shapes
            .iter()
            .find(|(_, s)| s.tag == *tag)
            .map(|(h, s)| (*h, s))
    }

    /// Shapes in paint order: layer, then z, then creation order.
    pub fn ordered(&self) -> Vec<&Shape> {
        let mut shapes: Vec<(&ShapeHandle, &Shape)> = self.shapes.iter().collect();
        shapes.sort_by_key(|(h, s)| (s.paint_key(), **h));
        shapes.into_iter().map(|(_, s)| s).collect()
    }

    /// Emit the current frame into `scene`.
    pub fn paint(&self, scene: &mut Scene) {
        let ordered = self.ordered();
        log::trace!("paint {} shape(s)", ordered.len());
        paint::paint_shapes(scene, self.width, self.height, self.background, ordered);
    }

    /// Release every shape and refuse further work.
    pub fn dispose(&mut self) {
        log::debug!("disposing surface with {} shape(s)", self.shapes.len());
        self.shapes.clear();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Surface for SceneSurface {
    fn create_shape(&mut self, shape: &Shape) -> SurfaceResult<ShapeHandle> {
        if self.disposed {
            return Err(SurfaceError::Disposed);
        }
        let handle = ShapeHandle(self.next_handle);
        self.next_handle += 1;
        self.shapes.insert(handle, shape.clone());
        Ok(handle)
    }

    fn update_shape(&mut self, handle: ShapeHandle, shape: &Shape) -> SurfaceResult<()> {
        if self.disposed {
            return Err(SurfaceError::Disposed);
        }
        let slot = self
            .shapes
            .get_mut(&handle)
            .ok_or(SurfaceError::UnknownHandle(handle))?;
        *slot = shape.clone();
        Ok(())
    }

    fn remove_shape(&mut self, handle: ShapeHandle) -> SurfaceResult<()> {
        self.shapes
            .remove(&handle)
            .map(|_| ())
            .ok_or(SurfaceError::UnknownHandle(handle))
    }

    fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    fn origin(&self) -> (f32, f32) {
        self.origin
    }

    fn hit_test(&self, x: f32, y: f32) -> Option<ShapeTag> {
        hit::hit_test(self.ordered().into_iter(), x, y).cloned()
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }
}
