//! Utilities and types for orienting layout objects.

use serde::{Deserialize, Serialize};

use crate::point::Point;

/// One of the eight Manhattan orientations.
///
/// Each orientation is a unitary 2x2 matrix applied before translation.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// No rotations or reflections.
    #[default]
    #[serde(rename = "ID")]
    R0,
    /// Rotate 90 degrees counter-clockwise.
    #[serde(rename = "R1")]
    R90,
    /// Rotate 180 degrees.
    #[serde(rename = "R2")]
    R180,
    /// Rotate 270 degrees counter-clockwise.
    #[serde(rename = "R3")]
    R270,
    /// Mirror the x coordinate (ie. reflect about the y-axis).
    MX,
    /// Mirror the x coordinate, then rotate 90 degrees (ie. flip across `y = -x`).
    XR,
    /// Mirror the y coordinate (ie. reflect about the x-axis).
    MY,
    /// Mirror the y coordinate, then rotate 90 degrees (ie. flip across `y = x`).
    YR,
}

/// A unitary 2x2 integer matrix in row-major order.
type Matrix = [[i8; 2]; 2];

impl Orientation {
    /// Returns all 8 orientations.
    pub const fn all() -> [Self; 8] {
        use Orientation::*;
        [R0, R90, R180, R270, MX, XR, MY, YR]
    }

    /// The matrix representing this orientation.
    const fn matrix(self) -> Matrix {
        use Orientation::*;
        match self {
            R0 => [[1, 0], [0, 1]],
            R90 => [[0, -1], [1, 0]],
            R180 => [[-1, 0], [0, -1]],
            R270 => [[0, 1], [-1, 0]],
            MX => [[-1, 0], [0, 1]],
            XR => [[0, -1], [-1, 0]],
            MY => [[1, 0], [0, -1]],
            YR => [[0, 1], [1, 0]],
        }
    }

    fn from_matrix(m: Matrix) -> Self {
        Self::all()
            .into_iter()
            .find(|o| o.matrix() == m)
            .unwrap_or_else(|| unreachable!("Manhattan matrices are closed under multiplication"))
    }

    /// Applies the orientation to a point about the origin.
    ///
    /// # Example
    ///
    /// ```
    /// # use geometry::prelude::*;
    /// assert_eq!(Orientation::R90.apply(Point::new(2, 1)), Point::new(-1, 2));
    /// assert_eq!(Orientation::MX.apply(Point::new(2, 1)), Point::new(-2, 1));
    /// ```
    pub fn apply(self, p: Point) -> Point {
        let m = self.matrix();
        Point::new(
            m[0][0] as i64 * p.x + m[0][1] as i64 * p.y,
            m[1][0] as i64 * p.x + m[1][1] as i64 * p.y,
        )
    }

    /// Returns the orientation equivalent to applying `self` and then `next`.
    pub fn then(self, next: Orientation) -> Self {
        Self::from_matrix(matmul(&next.matrix(), &self.matrix()))
    }

    /// Returns the orientation that undoes `self`.
    pub fn inverse(self) -> Self {
        let m = self.matrix();
        // Unitary: the inverse is the transpose.
        Self::from_matrix([[m[0][0], m[1][0]], [m[0][1], m[1][1]]])
    }

    /// Returns `true` if the orientation swaps the x and y extents of a box.
    pub const fn swaps_axes(self) -> bool {
        self.matrix()[0][0] == 0
    }
}

fn matmul(a: &Matrix, b: &Matrix) -> Matrix {
    [
        [
            a[0][0] * b[0][0] + a[0][1] * b[1][0],
            a[0][0] * b[0][1] + a[0][1] * b[1][1],
        ],
        [
            a[1][0] * b[0][0] + a[1][1] * b[1][0],
            a[1][0] * b[0][1] + a[1][1] * b[1][1],
        ],
    ]
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Orientation::*;
        let name = match self {
            R0 => "ID",
            R90 => "R1",
            R180 => "R2",
            R270 => "R3",
            MX => "MX",
            XR => "XR",
            MY => "MY",
            YR => "YR",
        };
        write!(f, "{name}")
    }
}
