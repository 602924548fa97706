use super::store::NIL;
use common::shapes::{BoundingRect, Point};
use fxhash::FxHashSet;
use std::hash::Hash;

/// Per-cell state stored densely by a grid.
pub trait GridCell: Default {
    /// Resets the cell to empty; `center` is the middle of its fixed rectangle.
    fn initialize(&mut self, center: Point);
    /// Grows whatever bound the cell tracks so it covers `bound`.
    fn expand(&mut self, bound: &BoundingRect);
    fn is_empty(&self) -> bool;
}

/// Fine-grid cell: head of an element chain plus a loose bound that only
/// ever grows.
#[derive(Clone, Copy, Debug)]
pub struct LooseCell {
    pub(crate) head: u32,
    pub(crate) rect: BoundingRect,
    bounded: bool,
}

impl LooseCell {
    pub fn head(&self) -> u32 {
        self.head
    }

    pub fn rect(&self) -> BoundingRect {
        self.rect
    }

    /// Replaces the loose bound outright, e.g. with a persisted one. A
    /// zero-size bound on an empty cell still counts as unbounded, so the next
    /// expansion adopts its bound.
    pub(crate) fn set_rect(&mut self, rect: BoundingRect) {
        self.rect = rect;
        self.bounded = self.head != NIL || rect.width() > 0.0 || rect.height() > 0.0;
    }
}

impl Default for LooseCell {
    fn default() -> Self {
        Self {
            head: NIL,
            rect: BoundingRect::default(),
            bounded: false,
        }
    }
}

impl GridCell for LooseCell {
    fn initialize(&mut self, center: Point) {
        self.head = NIL;
        self.rect = BoundingRect::from_center_size(center.x, center.y, 0.0, 0.0);
        self.bounded = false;
    }

    fn expand(&mut self, bound: &BoundingRect) {
        if self.bounded {
            self.rect.expand_to_include(bound);
        } else {
            self.rect = *bound;
            self.bounded = true;
        }
    }

    fn is_empty(&self) -> bool {
        self.head == NIL
    }
}

/// Coarse-grid cell: an unordered set of keys.
#[derive(Clone, Debug)]
pub struct PackedCell<K> {
    pub(crate) members: FxHashSet<K>,
}

impl<K> PackedCell<K> {
    pub fn members(&self) -> &FxHashSet<K> {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

impl<K> Default for PackedCell<K> {
    fn default() -> Self {
        Self {
            members: FxHashSet::default(),
        }
    }
}

impl<K: Eq + Hash> GridCell for PackedCell<K> {
    fn initialize(&mut self, _center: Point) {
        self.members.clear();
    }

    // Packed cells have no bound of their own.
    fn expand(&mut self, _bound: &BoundingRect) {}

    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
