use super::cell::{GridCell, PackedCell};
use super::uniform::{CellCoord, CellRange, UniformGrid};
use crate::error::GridResult;
use common::shapes::BoundingRect;
use std::fmt;
use std::hash::Hash;

/// Grid whose cells hold sets of keys. A key is registered in every cell its
/// bound touches, so it may sit in many cells at once.
#[derive(Clone, Debug)]
pub struct PackedCoarseGrid<K> {
    grid: UniformGrid,
    cells: Vec<PackedCell<K>>,
}

impl<K: Copy + Eq + Hash> PackedCoarseGrid<K> {
    pub fn new(bounding_rect: BoundingRect, rows: i32, cols: i32) -> GridResult<Self> {
        let grid = UniformGrid::new(bounding_rect, rows, cols)?;
        let cells = grid.new_cells();
        Ok(Self { grid, cells })
    }

    pub fn geometry(&self) -> &UniformGrid {
        &self.grid
    }

    pub fn contact_range(&self, rect: &BoundingRect) -> CellRange {
        self.grid.contact_range(rect)
    }

    /// True for cells without members and for out-of-range cells.
    pub fn is_cell_empty(&self, row: i32, col: i32) -> bool {
        match self.grid.checked_cell_index(row, col) {
            Ok(index) => self.cells[index].is_empty(),
            Err(_) => true,
        }
    }

    /// Registers `key` in every cell `bound` touches. With `skip_center_cell`
    /// the cell holding the center of `bound` is left out.
    pub fn add_with_bound(&mut self, key: K, bound: &BoundingRect, skip_center_cell: bool) {
        let center = if skip_center_cell {
            Some(self.grid.locate_point(bound.center()))
        } else {
            None
        };
        for cell in self.grid.contact_range(bound) {
            if Some(cell) == center {
                continue;
            }
            let index = self.grid.cell_index(cell.row, cell.col);
            self.cells[index].members.insert(key);
        }
    }

    /// Adds a single member to a single cell.
    pub fn insert_member(&mut self, row: i32, col: i32, key: K) -> GridResult<bool> {
        let index = self.grid.checked_cell_index(row, col)?;
        Ok(self.cells[index].members.insert(key))
    }

    pub fn contains_member(&self, row: i32, col: i32, key: &K) -> bool {
        match self.grid.checked_cell_index(row, col) {
            Ok(index) => self.cells[index].members.contains(key),
            Err(_) => false,
        }
    }

    pub fn cell(&self, row: i32, col: i32) -> GridResult<&PackedCell<K>> {
        let index = self.grid.checked_cell_index(row, col)?;
        Ok(&self.cells[index])
    }

    #[inline(always)]
    pub(crate) fn cell_at(&self, index: usize) -> &PackedCell<K> {
        &self.cells[index]
    }

    /// Members of a cell in no particular order. Out-of-range cells yield
    /// nothing.
    pub fn members(&self, row: i32, col: i32) -> impl Iterator<Item = K> + '_ {
        let cell = self
            .grid
            .checked_cell_index(row, col)
            .ok()
            .map(|index| &self.cells[index]);
        cell.into_iter().flat_map(|cell| cell.members.iter().copied())
    }

    /// Total number of registrations across all cells.
    pub fn member_count(&self) -> usize {
        self.cells.iter().map(|cell| cell.len()).sum()
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, &PackedCell<K>)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (self.grid.cell_coord(index), cell))
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug> fmt::Display for PackedCoarseGrid<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (coord, cell) in self.cells() {
            write!(f, "{}: ", coord)?;
            for member in cell.members() {
                write!(f, " {:?},", member)?;
            }
            writeln!(f)?;
            writeln!(f, "{} elements", cell.len())?;
        }
        Ok(())
    }
}
