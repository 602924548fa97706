use common::shapes::{BoundingRect, Point};
use grid::grid::{CellCoord, Spatial2D};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Persistable stand-in for an indexed object.
///
/// Two units are the same unit when their keys match; every other field is
/// payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpatialUnit {
    pub key: String,
    pub parent: Option<String>,
    pub world_pos: Point,
    pub priority: i8,
    pub bound: BoundingRect,
    /// Fine cell the unit was assigned to, `(-1, -1)` when unassigned.
    pub cell: CellCoord,
}

impl SpatialUnit {
    pub fn new(key: impl Into<String>, bound: BoundingRect) -> Self {
        SpatialUnit {
            key: key.into(),
            parent: None,
            world_pos: bound.center(),
            priority: 0,
            bound,
            cell: CellCoord::new(-1, -1),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_priority(mut self, priority: i8) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_assigned(&self) -> bool {
        self.cell.row >= 0 && self.cell.col >= 0
    }

    pub fn invalidate(&mut self) {
        self.key.clear();
        self.parent = None;
        self.cell = CellCoord::new(-1, -1);
        self.priority = 0;
        self.bound = BoundingRect::default();
    }
}

impl PartialEq for SpatialUnit {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for SpatialUnit {}

impl Hash for SpatialUnit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl Spatial2D for SpatialUnit {
    fn priority(&self) -> i32 {
        self.priority as i32
    }

    fn rect_bound(&self) -> BoundingRect {
        self.bound
    }

    fn set_rect_bound(&mut self, bound: BoundingRect) {
        self.bound = bound;
    }
}
