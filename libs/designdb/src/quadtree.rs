//! The spatial index of a cell.

use std::hash::Hash;

use geometry::prelude::*;
use indexmap::IndexMap;

/// A set of keyed rectangles with a maintained union bounding box.
///
/// The bounding box is updated eagerly: inserting merges the new rectangle,
/// and removing recomputes only when the removed rectangle touched the
/// current bounds.
#[derive(Debug, Clone)]
pub struct QuadTree<K> {
    leaves: IndexMap<K, Rect>,
    bbox: Rect,
}

impl<K> Default for QuadTree<K> {
    fn default() -> Self {
        Self {
            leaves: IndexMap::new(),
            bbox: Rect::empty(),
        }
    }
}

impl<K: Copy + Hash + Eq> QuadTree<K> {
    /// Creates a new, empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a leaf, replacing the rectangle of an existing leaf with the same key.
    pub fn insert(&mut self, key: K, rect: Rect) {
        if let Some(old) = self.leaves.insert(key, rect) {
            self.shrink(&old);
        }
        self.bbox.merge(&rect);
    }

    /// Removes a leaf, returning its rectangle.
    pub fn remove(&mut self, key: K) -> Option<Rect> {
        let rect = self.leaves.shift_remove(&key)?;
        self.shrink(&rect);
        Some(rect)
    }

    fn shrink(&mut self, removed: &Rect) {
        if self.bbox.is_constrained_by(removed) {
            self.bbox = self
                .leaves
                .values()
                .fold(Rect::empty(), |acc, r| acc.union(r));
        }
    }

    /// Returns the rectangle of a leaf.
    pub fn get(&self, key: K) -> Option<Rect> {
        self.leaves.get(&key).copied()
    }

    /// The union of every leaf's rectangle.
    #[inline]
    pub fn bounding_box(&self) -> Rect {
        self.bbox
    }

    /// The number of leaves.
    #[inline]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Returns `true` if there are no leaves.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Iterates over leaves in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (K, Rect)> + '_ {
        self.leaves.iter().map(|(k, r)| (*k, *r))
    }

    /// Iterates over leaves whose rectangle intersects `area`.
    pub fn query(&self, area: Rect) -> impl Iterator<Item = (K, Rect)> + '_ {
        self.iter().filter(move |(_, r)| r.intersects(&area))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_tracks_leaves() {
        let mut qt = QuadTree::new();
        assert!(qt.bounding_box().is_empty());
        qt.insert(1, Rect::from_sides(0, 0, 10, 10));
        qt.insert(2, Rect::from_sides(5, 5, 30, 8));
        assert_eq!(qt.bounding_box(), Rect::from_sides(0, 0, 30, 10));

        qt.remove(2);
        assert_eq!(qt.bounding_box(), Rect::from_sides(0, 0, 10, 10));
        qt.insert(1, Rect::from_sides(2, 2, 3, 3));
        assert_eq!(qt.bounding_box(), Rect::from_sides(2, 2, 3, 3));
        assert_eq!(qt.remove(1), Some(Rect::from_sides(2, 2, 3, 3)));
        assert!(qt.bounding_box().is_empty());
        assert_eq!(qt.remove(1), None);
    }

    #[test]
    fn query_returns_intersecting_leaves() {
        let mut qt = QuadTree::new();
        qt.insert('a', Rect::from_sides(0, 0, 10, 10));
        qt.insert('b', Rect::from_sides(20, 20, 30, 30));
        let hits: Vec<_> = qt.query(Rect::from_sides(10, 10, 15, 15)).map(|(k, _)| k).collect();
        assert_eq!(hits, vec!['a']);
    }
}
