pub mod diagram;
pub mod error;
pub mod geom;
pub mod hit;
pub mod id;
pub mod model;

pub use diagram::{Diagram, Link};
pub use error::DiagramError;
pub use geom::{Point, Rect, Vector};
pub use id::ShapeId;
pub use model::*;
