pub mod hit;
pub mod paint;
pub mod shape;
pub mod surface;
pub mod template;

pub use shape::{DomainType, Shape, ShapeGeometry, ShapeTag, edge_shape, group_shape, node_shape};
pub use surface::{SceneSurface, ShapeHandle, Surface, SurfaceError, SurfaceResult};
pub use template::Rgba;
