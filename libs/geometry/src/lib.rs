//! 2-D geometric primitives for a hierarchical layout database.
//!
//! All coordinates are integer grid [`Unit`]s. The central type is
//! [`Rect`](crate::rect::Rect), an axis-aligned box that has a distinguished
//! *empty* state which absorbs every operation applied to it.
//!
//! # Examples
//!
//! ```
//! # use geometry::prelude::*;
//! let mut rect = Rect::empty();
//! rect.merge_xy(5, 5);
//! assert_eq!(rect, Rect::from_sides(5, 5, 5, 5));
//! ```
#![warn(missing_docs)]

pub mod orientation;
pub mod point;
pub mod prelude;
pub mod rect;
pub mod snap;
pub mod transform;

/// A scalar coordinate, in database grid units.
pub type Unit = i64;
