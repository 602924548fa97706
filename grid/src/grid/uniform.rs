use super::cell::GridCell;
use crate::error::{GridError, GridResult};
use common::shapes::{BoundingRect, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub row: i32,
    pub col: i32,
}

impl CellCoord {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.row, self.col)
    }
}

/// Inclusive rectangular range of cells, iterated row by row.
///
/// The range is empty when `min` exceeds `max` on either axis, which happens
/// for rectangles that lie entirely outside the grid.
#[derive(Debug, Clone)]
pub struct CellRange {
    min: CellCoord,
    max: CellCoord,
    row: i32,
    col: i32,
    exhausted: bool,
}

impl CellRange {
    pub fn new(min: CellCoord, max: CellCoord) -> Self {
        Self {
            min,
            max,
            row: min.row,
            col: min.col,
            exhausted: min.row > max.row || min.col > max.col,
        }
    }

    pub fn min(&self) -> CellCoord {
        self.min
    }

    pub fn max(&self) -> CellCoord {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        self.min.row > self.max.row || self.min.col > self.max.col
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.row >= self.min.row
            && cell.row <= self.max.row
            && cell.col >= self.min.col
            && cell.col <= self.max.col
    }
}

impl PartialEq for CellRange {
    fn eq(&self, other: &Self) -> bool {
        self.min == other.min && self.max == other.max
    }
}

impl Iterator for CellRange {
    type Item = CellCoord;

    fn next(&mut self) -> Option<CellCoord> {
        if self.exhausted {
            return None;
        }

        let next = Some(CellCoord::new(self.row, self.col));
        if self.col == self.max.col {
            if self.row == self.max.row {
                self.exhausted = true;
            } else {
                self.col = self.min.col;
                self.row += 1;
            }
        } else {
            self.col += 1;
        }
        next
    }
}

/// Geometry shared by every grid: a bounding rectangle split into
/// `rows x cols` equally sized cells. Rows run along y, columns along x.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformGrid {
    bounding_rect: BoundingRect,
    rows: i32,
    cols: i32,
    row_spacing: f32,
    col_spacing: f32,
}

impl UniformGrid {
    pub fn new(bounding_rect: BoundingRect, rows: i32, cols: i32) -> GridResult<Self> {
        if rows <= 0 || cols <= 0 || rows.checked_mul(cols).is_none() {
            return Err(GridError::InvalidDimensions { rows, cols });
        }
        if !bounding_rect.is_valid() || !bounding_rect.has_area() {
            return Err(GridError::InvalidRect {
                min_x: bounding_rect.min_x,
                min_y: bounding_rect.min_y,
                max_x: bounding_rect.max_x,
                max_y: bounding_rect.max_y,
            });
        }
        Ok(Self {
            bounding_rect,
            rows,
            cols,
            row_spacing: bounding_rect.height() / rows as f32,
            col_spacing: bounding_rect.width() / cols as f32,
        })
    }

    pub fn bounding_rect(&self) -> BoundingRect {
        self.bounding_rect
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn row_spacing(&self) -> f32 {
        self.row_spacing
    }

    pub fn col_spacing(&self) -> f32 {
        self.col_spacing
    }

    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Cell containing `(x, y)`. Points on the max edges of the bounding
    /// rectangle belong to the last row or column. Points outside are not
    /// clamped and give an out-of-range cell.
    #[inline(always)]
    pub fn locate_cell(&self, x: f32, y: f32) -> CellCoord {
        let mut col = ((x - self.bounding_rect.min_x) / self.col_spacing).floor() as i32;
        let mut row = ((y - self.bounding_rect.min_y) / self.row_spacing).floor() as i32;
        if col >= self.cols && x <= self.bounding_rect.max_x {
            col = self.cols - 1;
        }
        if row >= self.rows && y <= self.bounding_rect.max_y {
            row = self.rows - 1;
        }
        CellCoord::new(row, col)
    }

    #[inline(always)]
    pub fn locate_point(&self, point: Point) -> CellCoord {
        self.locate_cell(point.x, point.y)
    }

    #[inline(always)]
    pub fn is_out_of_range(&self, row: i32, col: i32) -> bool {
        row < 0 || col < 0 || row >= self.rows || col >= self.cols
    }

    /// Row-major array index of an in-range cell.
    #[inline(always)]
    pub fn cell_index(&self, row: i32, col: i32) -> usize {
        debug_assert!(!self.is_out_of_range(row, col));
        (row * self.cols + col) as usize
    }

    /// Row-major array index, or `OutOfRange`.
    #[inline(always)]
    pub fn checked_cell_index(&self, row: i32, col: i32) -> GridResult<usize> {
        if self.is_out_of_range(row, col) {
            return Err(GridError::OutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.cell_index(row, col))
    }

    pub fn cell_coord(&self, index: usize) -> CellCoord {
        let index = index as i32;
        CellCoord::new(index / self.cols, index % self.cols)
    }

    /// Fixed world rectangle of a cell. Neighbouring cells share their edge
    /// coordinates exactly.
    pub fn cell_rect(&self, row: i32, col: i32) -> GridResult<BoundingRect> {
        self.checked_cell_index(row, col)?;
        Ok(self.cell_rect_unchecked(row, col))
    }

    #[inline(always)]
    pub(crate) fn cell_rect_unchecked(&self, row: i32, col: i32) -> BoundingRect {
        let origin = self.bounding_rect;
        BoundingRect::new(
            origin.min_x + col as f32 * self.col_spacing,
            origin.min_y + row as f32 * self.row_spacing,
            origin.min_x + (col + 1) as f32 * self.col_spacing,
            origin.min_y + (row + 1) as f32 * self.row_spacing,
        )
    }

    pub fn cell_center(&self, row: i32, col: i32) -> Point {
        Point::new(
            self.bounding_rect.min_x + (col as f32 + 0.5) * self.col_spacing,
            self.bounding_rect.min_y + (row as f32 + 0.5) * self.row_spacing,
        )
    }

    /// One initialized cell per grid cell, in row-major order.
    pub fn new_cells<C: GridCell>(&self) -> Vec<C> {
        (0..self.cell_count())
            .map(|index| {
                let coord = self.cell_coord(index);
                let mut cell = C::default();
                cell.initialize(self.cell_center(coord.row, coord.col));
                cell
            })
            .collect()
    }

    /// Every cell `rect` can touch: the cell of its min corner clamped up to
    /// `(0, 0)` through the cell of its max corner clamped down to the last
    /// cell.
    pub fn contact_range(&self, rect: &BoundingRect) -> CellRange {
        let min = self.locate_cell(rect.min_x, rect.min_y);
        let max = self.locate_cell(rect.max_x, rect.max_y);
        CellRange::new(
            CellCoord::new(min.row.max(0), min.col.max(0)),
            CellCoord::new(max.row.min(self.rows - 1), max.col.min(self.cols - 1)),
        )
    }
}
