//! Snapping utilities (eg. snap to a grid).

use crate::Unit;

/// Snaps `pos` to the nearest multiple of `grid`.
///
/// Ties round towards negative infinity.
pub const fn snap_to_grid(pos: Unit, grid: Unit) -> Unit {
    assert!(grid > 0);

    let rem = pos.rem_euclid(grid);
    if rem <= grid / 2 {
        pos - rem
    } else {
        pos + grid - rem
    }
}

/// Snaps `pos` to the largest multiple of `grid` that is not greater than `pos`.
pub const fn floor_to_grid(pos: Unit, grid: Unit) -> Unit {
    assert!(grid > 0);
    pos - pos.rem_euclid(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_rounds_to_nearest() {
        assert_eq!(snap_to_grid(14, 5), 15);
        assert_eq!(snap_to_grid(12, 5), 10);
        assert_eq!(snap_to_grid(-3, 5), -5);
        assert_eq!(snap_to_grid(7, 1), 7);
    }

    #[test]
    fn floor_never_rounds_up() {
        assert_eq!(floor_to_grid(14, 5), 10);
        assert_eq!(floor_to_grid(-1, 5), -5);
        assert_eq!(floor_to_grid(10, 5), 10);
    }
}
