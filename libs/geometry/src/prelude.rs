//! An import prelude that re-exports commonly used items.

pub use crate::orientation::Orientation;
pub use crate::point::Point;
pub use crate::rect::{EmptyRectError, Rect};
pub use crate::snap::{floor_to_grid, snap_to_grid};
pub use crate::transform::Transformation;
pub use crate::Unit;
