//! Axis-aligned rectangles with an absorbing empty state.
//!
//! A [`Rect`] is empty iff `x_max < x_min` or `y_max < y_min`. The canonical
//! empty value is `(1, 1, -1, -1)`. Every predicate is `false` when either
//! operand is empty, and every in-place operation except `merge` leaves an
//! empty rectangle untouched.

use serde::{Deserialize, Serialize};

use crate::point::Point;
use crate::snap::floor_to_grid;
use crate::Unit;

/// Indicates that a distance was requested to or from an empty [`Rect`].
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, thiserror::Error)]
#[error("can't compute distance to an empty rectangle")]
pub struct EmptyRectError;

/// An axis-aligned rectangle over integer grid coordinates.
///
/// Every empty rectangle is stored as the canonical empty value, so
/// equality is structural and all empty rectangles compare equal.
#[derive(Debug, Copy, Clone, Hash, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Bounds")]
pub struct Rect {
    x_min: Unit,
    y_min: Unit,
    x_max: Unit,
    y_max: Unit,
}

/// The serialized form of a [`Rect`], canonicalized on the way in.
#[derive(Deserialize)]
struct Bounds {
    x_min: Unit,
    y_min: Unit,
    x_max: Unit,
    y_max: Unit,
}

impl From<Bounds> for Rect {
    fn from(b: Bounds) -> Self {
        Rect::from_bounds(b.x_min, b.y_min, b.x_max, b.y_max)
    }
}

impl Default for Rect {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl Rect {
    /// Returns the canonical empty rectangle.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// assert!(Rect::empty().is_empty());
    /// assert_eq!(Rect::default(), Rect::empty());
    /// ```
    #[inline]
    pub const fn empty() -> Self {
        Self {
            x_min: 1,
            y_min: 1,
            x_max: -1,
            y_max: -1,
        }
    }

    /// Creates a rectangle from two opposite corner coordinates.
    ///
    /// The coordinates are sorted, so the result is never empty.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::from_sides(30, 40, 15, 20);
    /// assert_eq!(rect.x_min(), 15);
    /// assert_eq!(rect.y_min(), 20);
    /// assert_eq!(rect.x_max(), 30);
    /// assert_eq!(rect.y_max(), 40);
    /// ```
    #[inline]
    pub fn from_sides(x1: Unit, y1: Unit, x2: Unit, y2: Unit) -> Self {
        Self {
            x_min: x1.min(x2),
            y_min: y1.min(y2),
            x_max: x1.max(x2),
            y_max: y1.max(y2),
        }
    }

    /// Creates a rectangle from its bounds, returning the empty rectangle if
    /// `x_min > x_max` or `y_min > y_max`.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// assert_eq!(Rect::from_bounds(0, 0, 10, 5), Rect::from_sides(0, 0, 10, 5));
    /// assert!(Rect::from_bounds(10, 0, 0, 5).is_empty());
    /// ```
    pub fn from_bounds(x_min: Unit, y_min: Unit, x_max: Unit, y_max: Unit) -> Self {
        if x_min > x_max || y_min > y_max {
            Self::empty()
        } else {
            Self {
                x_min,
                y_min,
                x_max,
                y_max,
            }
        }
    }

    /// Creates a rectangle from two opposite corner points.
    #[inline]
    pub fn new(p0: Point, p1: Point) -> Self {
        Self::from_sides(p0.x, p0.y, p1.x, p1.y)
    }

    /// Creates a zero-area rectangle containing the given point.
    #[inline]
    pub const fn from_point(p: Point) -> Self {
        Self::from_xy(p.x, p.y)
    }

    /// Creates a zero-area rectangle containing the given `(x, y)` coordinates.
    #[inline]
    pub const fn from_xy(x: Unit, y: Unit) -> Self {
        Self {
            x_min: x,
            y_min: y,
            x_max: x,
            y_max: y,
        }
    }

    /// The minimum x-coordinate.
    #[inline]
    pub const fn x_min(&self) -> Unit {
        self.x_min
    }

    /// The minimum y-coordinate.
    #[inline]
    pub const fn y_min(&self) -> Unit {
        self.y_min
    }

    /// The maximum x-coordinate.
    #[inline]
    pub const fn x_max(&self) -> Unit {
        self.x_max
    }

    /// The maximum y-coordinate.
    #[inline]
    pub const fn y_max(&self) -> Unit {
        self.y_max
    }

    /// The lower-left corner.
    #[inline]
    pub const fn lower_left(&self) -> Point {
        Point::new(self.x_min, self.y_min)
    }

    /// The upper-right corner.
    #[inline]
    pub const fn upper_right(&self) -> Point {
        Point::new(self.x_max, self.y_max)
    }

    /// The width of the rectangle, or 0 if it is empty.
    #[inline]
    pub const fn width(&self) -> Unit {
        if self.is_empty() {
            0
        } else {
            self.x_max - self.x_min
        }
    }

    /// The height of the rectangle, or 0 if it is empty.
    #[inline]
    pub const fn height(&self) -> Unit {
        if self.is_empty() {
            0
        } else {
            self.y_max - self.y_min
        }
    }

    /// The sum of the width and height.
    #[inline]
    pub const fn half_perimeter(&self) -> Unit {
        self.width() + self.height()
    }

    /// The area of the rectangle, or 0 if it is empty.
    ///
    /// Flat and punctual rectangles also have zero area.
    #[inline]
    pub const fn area(&self) -> i128 {
        self.width() as i128 * self.height() as i128
    }

    /// Returns the center point of the rectangle.
    ///
    /// Coordinates are rounded towards negative infinity.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::from_sides(0, 0, 55, 45);
    /// assert_eq!(rect.center(), Point::new(27, 22));
    /// ```
    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            (self.x_min + self.x_max).div_euclid(2),
            (self.y_min + self.y_max).div_euclid(2),
        )
    }

    /// Returns `true` if `x_max < x_min` or `y_max < y_min`.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.x_max < self.x_min || self.y_max < self.y_min
    }

    /// Returns `true` if the rectangle is a non-empty segment: zero extent along
    /// exactly one axis.
    pub const fn is_flat(&self) -> bool {
        !self.is_empty()
            && ((self.x_min == self.x_max && self.y_min < self.y_max)
                || (self.x_min < self.x_max && self.y_min == self.y_max))
    }

    /// Returns `true` if the rectangle is a single point.
    pub const fn is_ponctual(&self) -> bool {
        !self.is_empty() && self.x_max == self.x_min && self.y_max == self.y_min
    }

    /// Returns `true` if the rectangle contains `(x, y)`, boundaries included.
    ///
    /// An empty rectangle contains nothing.
    pub const fn contains_xy(&self, x: Unit, y: Unit) -> bool {
        !self.is_empty() && self.x_min <= x && self.y_min <= y && x <= self.x_max && y <= self.y_max
    }

    /// Returns `true` if the rectangle contains `point`, boundaries included.
    #[inline]
    pub const fn contains_point(&self, point: Point) -> bool {
        self.contains_xy(point.x, point.y)
    }

    /// Returns `true` if `other` lies entirely within this rectangle.
    ///
    /// Returns `false` if either rectangle is empty.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let outer = Rect::from_sides(0, 0, 10, 10);
    /// assert!(outer.contains(&Rect::from_sides(0, 0, 10, 5)));
    /// assert!(!outer.contains(&Rect::from_sides(5, 5, 15, 8)));
    /// assert!(!outer.contains(&Rect::empty()));
    /// ```
    pub const fn contains(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x_min <= other.x_min
            && other.x_max <= self.x_max
            && self.y_min <= other.y_min
            && other.y_max <= self.y_max
    }

    /// Returns `true` if the two rectangles overlap on both axes.
    ///
    /// Rectangles touching along an edge or at a corner intersect.
    /// Returns `false` if either rectangle is empty.
    pub const fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && !(self.x_max < other.x_min
                || other.x_max < self.x_min
                || self.y_max < other.y_min
                || other.y_max < self.y_min)
    }

    /// Returns `true` if neither rectangle is empty and at least one of the
    /// four bounds is shared.
    ///
    /// Shrinking `other` can only change a box derived from `self` when this
    /// holds.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::from_sides(0, 0, 10, 10);
    /// assert!(rect.is_constrained_by(&Rect::from_sides(0, 5, 20, 5)));
    /// assert!(!rect.is_constrained_by(&Rect::from_sides(1, 1, 9, 9)));
    /// ```
    pub const fn is_constrained_by(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && (self.x_min == other.x_min
                || self.y_min == other.y_min
                || self.x_max == other.x_max
                || self.y_max == other.y_max)
    }

    /// Returns the smallest rectangle enclosing both rectangles.
    ///
    /// The union of two empty rectangles is empty; an empty operand is ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        let mut union = *self;
        union.merge(other);
        union
    }

    /// Returns the overlapping region, or the empty rectangle if the
    /// rectangles do not [intersect](Rect::intersects).
    pub fn intersection(&self, other: &Rect) -> Rect {
        if !self.intersects(other) {
            return Rect::empty();
        }
        Rect {
            x_min: self.x_min.max(other.x_min),
            y_min: self.y_min.max(other.y_min),
            x_max: self.x_max.min(other.x_max),
            y_max: self.y_max.min(other.y_max),
        }
    }

    /// The Manhattan distance from this rectangle to `point`.
    ///
    /// Each axis contributes its gap, or 0 if the point lies within the
    /// rectangle's span on that axis.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::from_sides(0, 0, 10, 10);
    /// assert_eq!(rect.manhattan_distance_to_point(Point::new(15, 0)), Ok(5));
    /// assert_eq!(Rect::empty().manhattan_distance_to_point(Point::zero()), Err(EmptyRectError));
    /// ```
    pub fn manhattan_distance_to_point(&self, point: Point) -> Result<Unit, EmptyRectError> {
        if self.is_empty() {
            return Err(EmptyRectError);
        }
        let dx = gap(self.x_min, self.x_max, point.x, point.x);
        let dy = gap(self.y_min, self.y_max, point.y, point.y);
        Ok(dx + dy)
    }

    /// The Manhattan distance between this rectangle and `other`.
    ///
    /// Fails if either rectangle is empty.
    pub fn manhattan_distance(&self, other: &Rect) -> Result<Unit, EmptyRectError> {
        if self.is_empty() || other.is_empty() {
            return Err(EmptyRectError);
        }
        let dx = gap(self.x_min, self.x_max, other.x_min, other.x_max);
        let dy = gap(self.y_min, self.y_max, other.y_min, other.y_max);
        Ok(dx + dy)
    }

    /// Resets this rectangle to the canonical empty value.
    pub fn make_empty(&mut self) -> &mut Self {
        *self = Self::empty();
        self
    }

    /// Grows every side by `d`. No-op on an empty rectangle.
    #[inline]
    pub fn inflate(&mut self, d: Unit) -> &mut Self {
        self.inflate_sides(d, d, d, d)
    }

    /// Grows the horizontal sides by `dx` and the vertical sides by `dy`.
    /// No-op on an empty rectangle.
    #[inline]
    pub fn inflate_xy(&mut self, dx: Unit, dy: Unit) -> &mut Self {
        self.inflate_sides(dx, dy, dx, dy)
    }

    /// Moves each bound outwards by its own amount. No-op on an empty rectangle.
    ///
    /// Negative amounts shrink the rectangle. A rectangle shrunk past a
    /// degenerate extent becomes the canonical empty rectangle.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let rect = Rect::from_sides(0, 0, 10, 10).inflated(-20);
    /// assert_eq!(rect, Rect::empty());
    /// ```
    pub fn inflate_sides(
        &mut self,
        dx_min: Unit,
        dy_min: Unit,
        dx_max: Unit,
        dy_max: Unit,
    ) -> &mut Self {
        if !self.is_empty() {
            self.x_min -= dx_min;
            self.y_min -= dy_min;
            self.x_max += dx_max;
            self.y_max += dy_max;
            if self.is_empty() {
                self.make_empty();
            }
        }
        self
    }

    /// Returns a copy of this rectangle grown by `d` on every side.
    #[inline]
    pub fn inflated(&self, d: Unit) -> Rect {
        let mut rect = *self;
        rect.inflate(d);
        rect
    }

    /// Shrinks the rectangle symmetrically about its center so that each
    /// extent becomes `factor` times its current value.
    ///
    /// The per-side delta is floored to a multiple of `grid`, so the result
    /// never inverts. A factor of 0 collapses the rectangle onto its
    /// grid-aligned center. No-op on an empty rectangle.
    ///
    /// Flooring differs from [`Point::snap_to_grid`], which rounds to the
    /// nearest grid point: a delta of 8 on a grid of 5 shrinks each side by
    /// 5, not 10.
    ///
    /// # Panics
    ///
    /// Panics if `factor` is outside `[0, 1]` or `grid` is not positive.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// let mut rect = Rect::from_sides(0, 0, 100, 40);
    /// rect.shrink_by_factor(0.5, 5);
    /// assert_eq!(rect, Rect::from_sides(25, 10, 75, 30));
    /// ```
    pub fn shrink_by_factor(&mut self, factor: f64, grid: Unit) -> &mut Self {
        assert!(
            (0.0..=1.0).contains(&factor),
            "Rect::shrink_by_factor requires 0 <= factor ({}) <= 1",
            factor
        );
        if self.is_empty() {
            return self;
        }
        let delta = |extent: Unit| -> Unit {
            let raw = (0.5 * (1.0 - factor) * extent as f64).floor() as Unit;
            floor_to_grid(raw.min(extent / 2), grid)
        };
        let dx = delta(self.x_max - self.x_min);
        let dy = delta(self.y_max - self.y_min);
        self.inflate_xy(-dx, -dy)
    }

    /// Widens the rectangle to include `(x, y)`.
    ///
    /// On an empty rectangle, the result is exactly the point.
    pub fn merge_xy(&mut self, x: Unit, y: Unit) -> &mut Self {
        if self.is_empty() {
            *self = Self::from_xy(x, y);
        } else {
            self.x_min = self.x_min.min(x);
            self.y_min = self.y_min.min(y);
            self.x_max = self.x_max.max(x);
            self.y_max = self.y_max.max(y);
        }
        self
    }

    /// Widens the rectangle to include `point`.
    #[inline]
    pub fn merge_point(&mut self, point: Point) -> &mut Self {
        self.merge_xy(point.x, point.y)
    }

    /// Widens the rectangle to include both corners `(x1, y1)` and `(x2, y2)`.
    pub fn merge_sides(&mut self, x1: Unit, y1: Unit, x2: Unit, y2: Unit) -> &mut Self {
        self.merge_xy(x1, y1);
        self.merge_xy(x2, y2)
    }

    /// Widens the rectangle to include `other`.
    ///
    /// Merging an empty rectangle is a no-op; merging into an empty rectangle
    /// yields exactly `other`.
    pub fn merge(&mut self, other: &Rect) -> &mut Self {
        if !other.is_empty() {
            self.merge_xy(other.x_min, other.y_min);
            self.merge_xy(other.x_max, other.y_max);
        }
        self
    }

    /// Shifts the rectangle by `(dx, dy)`. No-op on an empty rectangle.
    pub fn translate(&mut self, dx: Unit, dy: Unit) -> &mut Self {
        if !self.is_empty() {
            self.x_min += dx;
            self.y_min += dy;
            self.x_max += dx;
            self.y_max += dy;
        }
        self
    }

    /// Shifts the rectangle by `p`. No-op on an empty rectangle.
    #[inline]
    pub fn translate_by(&mut self, p: Point) -> &mut Self {
        self.translate(p.x, p.y)
    }

    /// Returns a copy of this rectangle shifted by `p`.
    #[inline]
    pub fn translated(&self, p: Point) -> Rect {
        let mut rect = *self;
        rect.translate_by(p);
        rect
    }
}

/// The gap between the spans `[a0, a1]` and `[b0, b1]`, or 0 if they overlap.
fn gap(a0: Unit, a1: Unit, b0: Unit, b1: Unit) -> Unit {
    if b0 > a1 {
        b0 - a1
    } else if a0 > b1 {
        a0 - b1
    } else {
        0
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "<Rect empty>")
        } else {
            write!(
                f,
                "<Rect {} {} {} {}>",
                self.x_min, self.y_min, self.x_max, self.y_max
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Rect> {
        vec![
            Rect::empty(),
            Rect::from_sides(0, 0, 10, 10),
            Rect::from_sides(5, 5, 20, 8),
            Rect::from_sides(10, 10, 12, 12),
            Rect::from_sides(-30, -4, -20, 0),
            Rect::from_xy(3, 3),
            Rect::from_sides(0, 5, 20, 5),
        ]
    }

    #[test]
    fn negative_inflation_yields_canonical_empty() {
        let rect = Rect::from_sides(0, 0, 10, 10).inflated(-20);
        assert!(rect.is_empty());
        assert_eq!(rect, Rect::empty());

        let mut rect = Rect::from_sides(0, 0, 10, 10);
        rect.inflate_sides(0, 0, -11, 0);
        assert_eq!(rect, Rect::empty());

        let rect = Rect::from_sides(0, 0, 10, 10).inflated(-5);
        assert_eq!(rect, Rect::from_sides(5, 5, 5, 5));
    }

    #[test]
    fn deserialized_empties_are_canonical() {
        let rect: Rect =
            serde_json::from_str(r#"{"x_min":20,"y_min":20,"x_max":-10,"y_max":-10}"#).unwrap();
        assert_eq!(rect, Rect::empty());
    }

    #[test]
    fn shrink_floors_the_delta_to_the_grid() {
        // Each side would move by 8; flooring to a grid of 5 moves it by 5.
        let mut rect = Rect::from_sides(0, 0, 32, 32);
        rect.shrink_by_factor(0.5, 5);
        assert_eq!(rect, Rect::from_sides(5, 5, 27, 27));
    }

    #[test]
    fn union_contains_both_operands() {
        for a in samples() {
            for b in samples() {
                let u = a.union(&b);
                if a.is_empty() && b.is_empty() {
                    assert!(u.is_empty());
                    continue;
                }
                if !a.is_empty() {
                    assert!(u.contains(&a), "{a} ∪ {b} = {u} must contain {a}");
                }
                if !b.is_empty() {
                    assert!(u.contains(&b), "{a} ∪ {b} = {u} must contain {b}");
                }
            }
        }
    }

    #[test]
    fn intersects_agrees_with_intersection() {
        for a in samples().into_iter().filter(|r| !r.is_empty()) {
            for b in samples().into_iter().filter(|r| !r.is_empty()) {
                assert_eq!(a.intersects(&b), !a.intersection(&b).is_empty());
            }
        }
    }

    #[test]
    fn touching_rects_intersect() {
        let a = Rect::from_sides(0, 0, 10, 10);
        let b = Rect::from_sides(10, 10, 20, 20);
        assert!(a.intersects(&b));
        assert_eq!(a.intersection(&b), Rect::from_xy(10, 10));
        assert!(!a.intersects(&Rect::from_sides(11, 0, 20, 10)));
    }

    #[test]
    fn empty_absorbs_predicates() {
        let e = Rect::empty();
        let r = Rect::from_sides(0, 0, 10, 10);
        assert!(!e.contains(&r));
        assert!(!r.contains(&e));
        assert!(!e.contains(&e));
        assert!(!e.intersects(&r));
        assert!(!e.is_constrained_by(&r));
        assert!(!r.is_constrained_by(&e));
        assert!(!e.contains_xy(1, 1));
        assert!(!e.is_flat());
        assert!(!e.is_ponctual());
        assert!(e.intersection(&r).is_empty());
    }

    #[test]
    fn merge_into_empty_takes_argument_extent() {
        let mut r = Rect::empty();
        r.merge_xy(5, 5);
        assert_eq!(r, Rect::from_sides(5, 5, 5, 5));

        let mut r = Rect::empty();
        r.merge(&Rect::from_sides(-3, 2, 7, 9));
        assert_eq!(r, Rect::from_sides(-3, 2, 7, 9));

        let mut r = Rect::from_sides(0, 0, 1, 1);
        r.merge(&Rect::empty());
        assert_eq!(r, Rect::from_sides(0, 0, 1, 1));
    }

    #[test]
    fn distances() {
        let r = Rect::from_sides(0, 0, 10, 10);
        assert_eq!(r.manhattan_distance_to_point(Point::new(15, 0)), Ok(5));
        assert_eq!(r.manhattan_distance_to_point(Point::new(-2, 13)), Ok(5));
        assert_eq!(r.manhattan_distance_to_point(Point::new(4, 4)), Ok(0));
        assert_eq!(r.manhattan_distance(&Rect::from_sides(12, 14, 20, 20)), Ok(6));
        assert_eq!(r.manhattan_distance(&Rect::from_sides(5, 5, 20, 20)), Ok(0));
        assert_eq!(
            Rect::empty().manhattan_distance_to_point(Point::new(15, 0)),
            Err(EmptyRectError)
        );
        assert_eq!(r.manhattan_distance(&Rect::empty()), Err(EmptyRectError));
    }

    #[test]
    fn constrained_by_shared_bound() {
        let r = Rect::from_sides(0, 0, 10, 10);
        assert!(r.is_constrained_by(&Rect::from_sides(0, 5, 20, 5)));
        assert!(r.is_constrained_by(&Rect::from_sides(3, 3, 10, 4)));
        assert!(!r.is_constrained_by(&Rect::from_sides(1, 1, 9, 9)));
    }

    #[test]
    fn in_place_ops_skip_empty() {
        let mut e = Rect::empty();
        e.inflate(5).translate(3, 3).shrink_by_factor(0.5, 1);
        assert_eq!(e, Rect::empty());

        let mut r = Rect::from_sides(0, 0, 10, 10);
        r.inflate_xy(1, 2).translate(5, -5);
        assert_eq!(r, Rect::from_sides(4, -7, 16, 7));
        assert_eq!(r.inflated(-1), Rect::from_sides(5, -6, 15, 6));
    }

    #[test]
    fn shrink_by_zero_collapses_to_center() {
        let mut r = Rect::from_sides(0, 0, 10, 20);
        r.shrink_by_factor(0.0, 1);
        assert!(r.is_ponctual());
        assert_eq!(r, Rect::from_xy(5, 10));

        let mut odd = Rect::from_sides(0, 0, 11, 11);
        odd.shrink_by_factor(0.0, 1);
        assert_eq!(odd, Rect::from_sides(5, 5, 6, 6));

        let mut unchanged = Rect::from_sides(0, 0, 11, 11);
        unchanged.shrink_by_factor(1.0, 1);
        assert_eq!(unchanged, Rect::from_sides(0, 0, 11, 11));
    }

    #[test]
    #[should_panic]
    fn shrink_rejects_out_of_range_factor() {
        Rect::from_sides(0, 0, 10, 10).shrink_by_factor(1.5, 1);
    }

    #[test]
    fn flat_and_ponctual() {
        assert!(Rect::from_sides(0, 5, 20, 5).is_flat());
        assert!(!Rect::from_sides(0, 5, 20, 6).is_flat());
        assert!(Rect::from_xy(2, 2).is_ponctual());
        assert!(!Rect::from_xy(2, 2).is_flat());
    }

    #[test]
    fn ill_formed_bounds_are_empty() {
        assert!(Rect::from_bounds(5, 0, 4, 10).is_empty());
        assert!(Rect::from_bounds(0, 5, 10, 4).is_empty());
        assert_eq!(Rect::from_bounds(0, 0, 0, 0), Rect::from_xy(0, 0));
    }

    #[test]
    fn display() {
        assert_eq!(Rect::empty().to_string(), "<Rect empty>");
        assert_eq!(Rect::from_sides(0, 1, 2, 3).to_string(), "<Rect 0 1 2 3>");
    }
}
