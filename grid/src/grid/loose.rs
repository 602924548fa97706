use super::cell::{GridCell, LooseCell};
use super::store::{IndexStore, NIL};
use super::uniform::{CellCoord, UniformGrid};
use crate::config::GridConfig;
use crate::error::GridResult;
use common::shapes::BoundingRect;
use std::fmt;

/// Grid whose cells own the elements centered in them.
///
/// Each element lives in exactly one cell, chained through a shared
/// [`IndexStore`]. A cell's loose bound grows to cover every bound ever added
/// to it and is never shrunk by removals.
#[derive(Clone, Debug)]
pub struct LooseGrid<T> {
    grid: UniformGrid,
    cells: Vec<LooseCell>,
    elements: IndexStore<T>,
}

/// Elements of one cell, most recently inserted first.
pub struct CellElements<'a, T> {
    elements: &'a IndexStore<T>,
    current: u32,
}

impl<'a, T> Iterator for CellElements<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.current == NIL {
            return None;
        }
        let index = self.current;
        self.current = self.elements.link(index);
        self.elements.get(index)
    }
}

impl<T> LooseGrid<T> {
    pub fn new(bounding_rect: BoundingRect, rows: i32, cols: i32) -> GridResult<Self> {
        Self::with_capacity(
            bounding_rect,
            rows,
            cols,
            GridConfig::default().element_capacity,
        )
    }

    pub fn with_capacity(
        bounding_rect: BoundingRect,
        rows: i32,
        cols: i32,
        element_capacity: usize,
    ) -> GridResult<Self> {
        let grid = UniformGrid::new(bounding_rect, rows, cols)?;
        let cells = grid.new_cells();
        Ok(Self {
            grid,
            cells,
            elements: IndexStore::with_capacity(element_capacity),
        })
    }

    pub fn geometry(&self) -> &UniformGrid {
        &self.grid
    }

    /// Number of elements across all cells.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// True for cells without elements and for out-of-range cells.
    pub fn is_cell_empty(&self, row: i32, col: i32) -> bool {
        match self.grid.checked_cell_index(row, col) {
            Ok(index) => self.cells[index].is_empty(),
            Err(_) => true,
        }
    }

    pub fn cell(&self, row: i32, col: i32) -> GridResult<&LooseCell> {
        let index = self.grid.checked_cell_index(row, col)?;
        Ok(&self.cells[index])
    }

    #[inline(always)]
    pub(crate) fn cell_at(&self, index: usize) -> &LooseCell {
        &self.cells[index]
    }

    /// The cell's loose bound. A cell that never held an element reports a
    /// zero-size rectangle at its center.
    pub fn cell_bound(&self, row: i32, col: i32) -> GridResult<BoundingRect> {
        Ok(self.cell(row, col)?.rect())
    }

    pub fn set_cell_bound(&mut self, row: i32, col: i32, rect: BoundingRect) -> GridResult<()> {
        let index = self.grid.checked_cell_index(row, col)?;
        self.cells[index].set_rect(rect);
        Ok(())
    }

    /// Grows a cell's loose bound without adding an element and returns the
    /// new bound.
    pub fn expand_cell(
        &mut self,
        row: i32,
        col: i32,
        bound: &BoundingRect,
    ) -> GridResult<BoundingRect> {
        let index = self.grid.checked_cell_index(row, col)?;
        self.cells[index].expand(bound);
        Ok(self.cells[index].rect())
    }

    /// Inserts into the cell containing the center of `bound` and grows that
    /// cell's loose bound.
    pub fn insert(&mut self, element: T, bound: &BoundingRect) -> GridResult<CellCoord> {
        let cell = self.grid.locate_point(bound.center());
        self.insert_into_cell_with_bound(element, cell.row, cell.col, bound)?;
        Ok(cell)
    }

    /// Links `element` into a cell directly, leaving the loose bound as is.
    pub fn insert_into_cell(&mut self, element: T, row: i32, col: i32) -> GridResult<()> {
        let index = self.grid.checked_cell_index(row, col)?;
        self.link_new(index, element);
        Ok(())
    }

    pub fn insert_into_cell_with_bound(
        &mut self,
        element: T,
        row: i32,
        col: i32,
        bound: &BoundingRect,
    ) -> GridResult<()> {
        let index = self.grid.checked_cell_index(row, col)?;
        self.link_new(index, element);
        self.cells[index].expand(bound);
        Ok(())
    }

    fn link_new(&mut self, cell_index: usize, element: T) {
        let element_index = self.elements.insert(element);
        let cell = &mut self.cells[cell_index];
        self.elements.set_link(element_index, cell.head);
        cell.head = element_index;
    }

    /// Elements of a cell, newest first. Out-of-range cells yield nothing.
    pub fn iter_cell(&self, row: i32, col: i32) -> CellElements<'_, T> {
        let head = match self.grid.checked_cell_index(row, col) {
            Ok(index) => self.cells[index].head,
            Err(_) => NIL,
        };
        self.chain(head)
    }

    #[inline(always)]
    pub(crate) fn chain(&self, head: u32) -> CellElements<'_, T> {
        CellElements {
            elements: &self.elements,
            current: head,
        }
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, &LooseCell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (self.grid.cell_coord(index), cell))
    }
}

impl<T: PartialEq> LooseGrid<T> {
    /// Unlinks the first element of the cell's chain equal to `element`.
    ///
    /// Returns `Ok(false)` if the cell holds no such element. The cell's loose
    /// bound is left untouched.
    pub fn remove(&mut self, element: &T, row: i32, col: i32) -> GridResult<bool> {
        let index = self.grid.checked_cell_index(row, col)?;
        let mut previous = NIL;
        let mut current = self.cells[index].head;
        while current != NIL {
            let next = self.elements.link(current);
            if self.elements.get(current) == Some(element) {
                if previous != NIL {
                    self.elements.set_link(previous, next);
                } else {
                    self.cells[index].head = next;
                }
                self.elements.erase(current);
                return Ok(true);
            }
            previous = current;
            current = next;
        }
        Ok(false)
    }

    pub fn find_mut(&mut self, element: &T, row: i32, col: i32) -> GridResult<Option<&mut T>> {
        let index = self.grid.checked_cell_index(row, col)?;
        let mut current = self.cells[index].head;
        while current != NIL {
            if self.elements.get(current) == Some(element) {
                return Ok(self.elements.get_mut(current));
            }
            current = self.elements.link(current);
        }
        Ok(None)
    }

    pub fn contains(&self, element: &T, row: i32, col: i32) -> bool {
        self.iter_cell(row, col).any(|candidate| candidate == element)
    }
}

impl<T: fmt::Debug> fmt::Display for LooseGrid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (coord, cell) in self.cells() {
            write!(f, "{}: rect = {}", coord, cell.rect())?;
            let mut count = 0;
            for element in self.chain(cell.head()) {
                write!(f, " {:?},", element)?;
                count += 1;
            }
            writeln!(f)?;
            writeln!(f, "{} elements", count)?;
        }
        Ok(())
    }
}
