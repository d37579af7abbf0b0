//! Placement transformations.

use serde::{Deserialize, Serialize};

use crate::orientation::Orientation;
use crate::point::Point;
use crate::rect::Rect;
use crate::Unit;

/// A Manhattan rotation and/or reflection followed by a translation.
///
/// Maps a point `p` in a child's coordinates to `orientation(p) + offset`
/// in its parent's coordinates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transformation {
    /// The translation applied after orienting.
    pub offset: Point,
    /// The orientation applied about the origin.
    pub orientation: Orientation,
}

impl Transformation {
    /// Returns the identity transformation.
    #[inline]
    pub const fn identity() -> Self {
        Self {
            offset: Point::zero(),
            orientation: Orientation::R0,
        }
    }

    /// Returns a pure translation by `(dx, dy)`.
    #[inline]
    pub const fn translate(dx: Unit, dy: Unit) -> Self {
        Self {
            offset: Point::new(dx, dy),
            orientation: Orientation::R0,
        }
    }

    /// Creates a transformation from an offset and an orientation.
    #[inline]
    pub const fn new(offset: Point, orientation: Orientation) -> Self {
        Self {
            offset,
            orientation,
        }
    }

    /// Returns `true` if this transformation maps every point to itself.
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Applies the transformation to a point.
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        self.orientation.apply(p) + self.offset
    }

    /// Applies the transformation to a rectangle.
    ///
    /// An empty rectangle stays empty.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let tf = Transformation::new(Point::new(100, 0), Orientation::R90);
    /// let rect = Rect::from_sides(0, 0, 10, 20);
    /// assert_eq!(tf.apply_rect(&rect), Rect::from_sides(80, 0, 100, 10));
    /// assert!(tf.apply_rect(&Rect::empty()).is_empty());
    /// ```
    pub fn apply_rect(&self, rect: &Rect) -> Rect {
        if rect.is_empty() {
            return Rect::empty();
        }
        Rect::new(
            self.apply(rect.lower_left()),
            self.apply(rect.upper_right()),
        )
    }

    /// Shifts the translation component by `p`.
    pub fn translate_by(&mut self, p: Point) -> &mut Self {
        self.offset += p;
        self
    }

    /// Returns the transformation from `child`'s coordinates to the
    /// coordinates of `parent`'s parent, when `child` places an object
    /// inside a cell that is itself placed by `parent`.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let parent = Transformation::translate(10, 0);
    /// let child = Transformation::translate(0, 5);
    /// let tf = Transformation::cascade(parent, child);
    /// assert_eq!(tf.apply(Point::zero()), Point::new(10, 5));
    /// ```
    pub fn cascade(parent: Transformation, child: Transformation) -> Transformation {
        Self {
            offset: parent.apply(child.offset),
            orientation: child.orientation.then(parent.orientation),
        }
    }

    /// Returns the transformation that undoes `self`.
    pub fn inverse(&self) -> Self {
        let orientation = self.orientation.inverse();
        Self {
            offset: -orientation.apply(self.offset),
            orientation,
        }
    }
}

impl std::fmt::Display for Transformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} {}>", self.offset, self.orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_matches_sequential_application() {
        let parent = Transformation::new(Point::new(7, -3), Orientation::R90);
        let child = Transformation::new(Point::new(-2, 11), Orientation::MY);
        let p = Point::new(4, 9);
        assert_eq!(
            Transformation::cascade(parent, child).apply(p),
            parent.apply(child.apply(p))
        );
    }

    #[test]
    fn inverse_round_trips() {
        let p = Point::new(4, 9);
        for o in Orientation::all() {
            let tf = Transformation::new(Point::new(13, -5), o);
            assert_eq!(tf.inverse().apply(tf.apply(p)), p);
            assert!(Transformation::cascade(tf.inverse(), tf).is_identity());
        }
    }

    #[test]
    fn apply_rect_keeps_extent() {
        let rect = Rect::from_sides(0, 0, 10, 20);
        for o in Orientation::all() {
            let out = Transformation::new(Point::new(5, 5), o).apply_rect(&rect);
            assert_eq!(out.width() + out.height(), 30);
            assert_eq!(out.area(), 200);
        }
    }
}
