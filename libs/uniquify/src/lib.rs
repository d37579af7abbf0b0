//! Naming conventions for uniquified copies of layout cells.
//!
//! When a master cell is shared by several instances and one of them needs
//! to be modified in place, the instance is given a private copy of the
//! master. Copies are named `<trunk>_uNN`, where `NN` is a per-family
//! counter starting at 1 and printed with at least two digits.

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

/// The marker separating a trunk name from its copy number.
pub const UNIQUE_SEPARATOR: &str = "_u";

/// Returns the name of copy `n` of the cell named `trunk`.
///
/// # Example
///
/// ```
/// assert_eq!(uniquify::unique_name("nand2", 1), "nand2_u01");
/// assert_eq!(uniquify::unique_name("nand2", 123), "nand2_u123");
/// ```
pub fn unique_name(trunk: &str, n: u32) -> ArcStr {
    arcstr::format!("{}{}{:02}", trunk, UNIQUE_SEPARATOR, n)
}

/// Strips a trailing `_u<digits>` suffix from `name`, if present.
///
/// Names without such a suffix are returned unchanged.
///
/// # Example
///
/// ```
/// assert_eq!(uniquify::trunk_name("nand2_u07"), "nand2");
/// assert_eq!(uniquify::trunk_name("nand2_u"), "nand2_u");
/// assert_eq!(uniquify::trunk_name("nand2"), "nand2");
/// ```
pub fn trunk_name(name: &str) -> &str {
    if let Some(pos) = name.rfind(UNIQUE_SEPARATOR) {
        let digits = &name[pos + UNIQUE_SEPARATOR.len()..];
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return &name[..pos];
        }
    }
    name
}

/// The copy counter shared by a family of uniquified cells.
///
/// Starts at 1. Each call to [`Duplicates::next_name`] consumes one value.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Duplicates(u32);

impl Default for Duplicates {
    fn default() -> Self {
        Self(1)
    }
}

impl Duplicates {
    /// Creates a new counter starting at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a counter from its persisted value.
    ///
    /// A value of 0 is clamped to 1.
    pub fn from_raw(value: u32) -> Self {
        Self(value.max(1))
    }

    /// The number that the next copy will receive.
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Returns the next copy name for `trunk`, incrementing the counter.
    ///
    /// Names for which `taken` returns `true` are skipped.
    pub fn next_name(&mut self, trunk: &str, taken: impl Fn(&str) -> bool) -> ArcStr {
        loop {
            let name = unique_name(trunk, self.0);
            self.0 += 1;
            if !taken(&name) {
                break name;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_post_increments() {
        let mut dups = Duplicates::new();
        assert_eq!(dups.next_name("inv", |_| false), "inv_u01");
        assert_eq!(dups.next_name("inv", |_| false), "inv_u02");
        assert_eq!(dups.get(), 3);
    }

    #[test]
    fn counter_skips_taken_names() {
        let mut dups = Duplicates::new();
        let name = dups.next_name("inv", |n| n == "inv_u01");
        assert_eq!(name, "inv_u02");
        assert_eq!(dups.get(), 3);
    }

    #[test]
    fn trunk_of_unique_name() {
        for n in [1, 9, 10, 99, 100] {
            assert_eq!(trunk_name(&unique_name("dff_u_x", n)), "dff_u_x");
        }
        assert_eq!(trunk_name("a_ux1"), "a_ux1");
    }

    #[test]
    fn raw_zero_is_clamped() {
        assert_eq!(Duplicates::from_raw(0).get(), 1);
        assert_eq!(Duplicates::from_raw(4).get(), 4);
    }
}
