use super::element::Spatial2D;
use super::loose::LooseGrid;
use super::packed::PackedCoarseGrid;
use super::uniform::{CellCoord, CellRange};
use crate::config::GridConfig;
use crate::error::{GridError, GridResult};
use common::shapes::BoundingRect;
use smallvec::SmallVec;
use tracing::{debug, trace};

const CANDIDATES_INLINE: usize = 64;

/// Per-query working memory: a visited bit per fine cell and the list of
/// candidate fine cells collected from the coarse grid.
///
/// Owned by the caller and cleared at the start of every query, so one
/// scratch can be reused across queries but not shared by two queries that
/// are in flight at the same time.
#[derive(Clone, Debug, Default)]
pub struct QueryScratch {
    marks: Vec<u64>,
    candidates: SmallVec<[u32; CANDIDATES_INLINE]>,
}

impl QueryScratch {
    pub fn new(fine_cell_count: usize) -> Self {
        let mut scratch = Self::default();
        scratch.reset(fine_cell_count);
        scratch
    }

    fn reset(&mut self, fine_cell_count: usize) {
        let words = (fine_cell_count + 63) / 64;
        self.marks.clear();
        self.marks.resize(words, 0);
        self.candidates.clear();
    }
}

/// Sets bit `index` and reports whether it was already set.
#[inline(always)]
fn test_and_set(marks: &mut [u64], index: usize) -> bool {
    let word = &mut marks[index / 64];
    let bit = 1u64 << (index % 64);
    if *word & bit != 0 {
        return true;
    }
    *word |= bit;
    false
}

/// Two-level grid: a packed coarse grid whose cells reference the fine loose
/// cells overlapping them, over a loose fine grid holding the elements.
///
/// Both grids cover the same world rectangle. The fine grid has
/// `coarse_rows * detail_row_multiplier` rows and
/// `coarse_cols * detail_col_multiplier` columns.
#[derive(Clone, Debug)]
pub struct HierarchicalIndex<T> {
    coarse: PackedCoarseGrid<CellCoord>,
    fine: LooseGrid<T>,
    config: GridConfig,
}

impl<T> HierarchicalIndex<T> {
    pub fn new(world_rect: BoundingRect, config: GridConfig) -> GridResult<Self> {
        if config.detail_row_multiplier <= 0 || config.detail_col_multiplier <= 0 {
            return Err(GridError::InvalidDimensions {
                rows: config.detail_row_multiplier,
                cols: config.detail_col_multiplier,
            });
        }
        let fine_rows = config.detail_rows()?;
        let fine_cols = config.detail_cols()?;
        let coarse = PackedCoarseGrid::new(world_rect, config.coarse_rows, config.coarse_cols)?;
        let fine =
            LooseGrid::with_capacity(world_rect, fine_rows, fine_cols, config.element_capacity)?;
        debug!(
            coarse_rows = config.coarse_rows,
            coarse_cols = config.coarse_cols,
            fine_rows,
            fine_cols,
            "built hierarchical grid index"
        );
        Ok(Self {
            coarse,
            fine,
            config,
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn world_rect(&self) -> BoundingRect {
        self.fine.geometry().bounding_rect()
    }

    pub fn coarse(&self) -> &PackedCoarseGrid<CellCoord> {
        &self.coarse
    }

    pub fn fine(&self) -> &LooseGrid<T> {
        &self.fine
    }

    pub fn len(&self) -> usize {
        self.fine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fine.is_empty()
    }

    /// Scratch sized for this index's fine grid.
    pub fn scratch(&self) -> QueryScratch {
        QueryScratch::new(self.fine.geometry().cell_count())
    }

    pub fn locate_coarse_cell(&self, x: f32, y: f32) -> CellCoord {
        self.coarse.geometry().locate_cell(x, y)
    }

    pub fn locate_fine_cell(&self, x: f32, y: f32) -> CellCoord {
        self.fine.geometry().locate_cell(x, y)
    }

    pub fn coarse_contact_range(&self, rect: &BoundingRect) -> CellRange {
        self.coarse.contact_range(rect)
    }

    pub fn coarse_cell_rect(&self, row: i32, col: i32) -> GridResult<BoundingRect> {
        self.coarse.geometry().cell_rect(row, col)
    }

    pub fn fine_cell_bound(&self, row: i32, col: i32) -> GridResult<BoundingRect> {
        self.fine.cell_bound(row, col)
    }

    /// Inserts into the fine cell holding the center of `bound`, then
    /// registers that cell's grown loose bound in the coarse grid. Returns the
    /// fine cell, which later removals and updates need.
    pub fn insert(&mut self, element: T, bound: &BoundingRect) -> GridResult<CellCoord> {
        let cell = match self.fine.insert(element, bound) {
            Ok(cell) => cell,
            Err(err) => {
                trace!(%bound, %err, "rejected element outside the fine grid");
                return Err(err);
            }
        };
        let loose_rect = self.fine.cell_bound(cell.row, cell.col)?;
        self.coarse.add_with_bound(cell, &loose_rect, false);
        Ok(cell)
    }

    /// Links an element straight into a fine cell. Neither the cell's loose
    /// bound nor the coarse grid is touched.
    pub fn insert_into_fine_cell(&mut self, element: T, cell: CellCoord) -> GridResult<()> {
        self.fine.insert_into_cell(element, cell.row, cell.col)
    }

    /// Links an element straight into a fine cell and grows the cell's loose
    /// bound. The coarse grid is not touched.
    pub fn insert_into_fine_cell_with_bound(
        &mut self,
        element: T,
        cell: CellCoord,
        bound: &BoundingRect,
    ) -> GridResult<()> {
        self.fine
            .insert_into_cell_with_bound(element, cell.row, cell.col, bound)
    }

    pub fn set_fine_cell_bound(&mut self, cell: CellCoord, rect: BoundingRect) -> GridResult<()> {
        self.fine.set_cell_bound(cell.row, cell.col, rect)
    }

    /// Adds `fine_cell` to the member set of one coarse cell.
    pub fn register_coarse_member(
        &mut self,
        coarse_cell: CellCoord,
        fine_cell: CellCoord,
    ) -> GridResult<bool> {
        self.fine
            .geometry()
            .checked_cell_index(fine_cell.row, fine_cell.col)?;
        self.coarse
            .insert_member(coarse_cell.row, coarse_cell.col, fine_cell)
    }

    /// Every element of one coarse cell.
    ///
    /// With `loose`, the union of the elements of every fine cell the coarse
    /// cell references, unfiltered. Without it, the elements of the block of
    /// fine cells the coarse cell geometrically covers.
    pub fn fetch_coarse_cell<'a>(
        &'a self,
        row: i32,
        col: i32,
        results: &mut Vec<&'a T>,
        loose: bool,
    ) -> GridResult<()> {
        let coarse_index = self.coarse.geometry().checked_cell_index(row, col)?;
        if loose {
            for fine_cell in self.coarse.cell_at(coarse_index).members() {
                results.extend(self.fine.iter_cell(fine_cell.row, fine_cell.col));
            }
        } else {
            let begin_row = row * self.config.detail_row_multiplier;
            let begin_col = col * self.config.detail_col_multiplier;
            for fine_row in begin_row..begin_row + self.config.detail_row_multiplier {
                for fine_col in begin_col..begin_col + self.config.detail_col_multiplier {
                    results.extend(self.fine.iter_cell(fine_row, fine_col));
                }
            }
        }
        Ok(())
    }
}

impl<T: Spatial2D> HierarchicalIndex<T> {
    /// Visits every element whose bound overlaps `rect`, each exactly once.
    ///
    /// Touching edges count as overlapping.
    pub fn query_with<'a, F>(&'a self, rect: &BoundingRect, scratch: &mut QueryScratch, mut visit: F)
    where
        F: FnMut(&'a T),
    {
        let coarse_geometry = self.coarse.geometry();
        let fine_geometry = self.fine.geometry();
        scratch.reset(fine_geometry.cell_count());
        let QueryScratch { marks, candidates } = scratch;

        for cell in self.coarse.contact_range(rect) {
            let coarse_cell = self
                .coarse
                .cell_at(coarse_geometry.cell_index(cell.row, cell.col));
            if coarse_cell.members().is_empty() {
                continue;
            }
            let cell_rect = coarse_geometry.cell_rect_unchecked(cell.row, cell.col);
            let fully_contained = rect.contains_rect(&cell_rect);
            for fine_cell in coarse_cell.members() {
                let fine_index = fine_geometry.cell_index(fine_cell.row, fine_cell.col);
                if fully_contained || self.fine.cell_at(fine_index).rect().overlaps(rect) {
                    candidates.push(fine_index as u32);
                }
            }
        }

        for &fine_index in candidates.iter() {
            let fine_index = fine_index as usize;
            if test_and_set(marks, fine_index) {
                continue;
            }
            let fine_cell = self.fine.cell_at(fine_index);
            let fully_contained = rect.contains_rect(&fine_cell.rect());
            for element in self.fine.chain(fine_cell.head()) {
                if fully_contained || element.rect_bound().overlaps(rect) {
                    visit(element);
                }
            }
        }
    }

    pub fn query<'a>(
        &'a self,
        rect: &BoundingRect,
        scratch: &mut QueryScratch,
        results: &mut Vec<&'a T>,
    ) {
        self.query_with(rect, scratch, |element| results.push(element));
    }
}

impl<T: PartialEq> HierarchicalIndex<T> {
    /// Removes an element from its fine cell. Coarse registrations of that
    /// cell stay in place even if the cell is now empty.
    pub fn remove(&mut self, element: &T, row: i32, col: i32) -> GridResult<bool> {
        self.fine.remove(element, row, col)
    }
}

impl<T: PartialEq + Spatial2D> HierarchicalIndex<T> {
    /// Stores a new bound on an element already in fine cell `(row, col)` and
    /// grows that cell's loose bound.
    ///
    /// Only bounds wider or taller than `large_object_size` re-register the
    /// cell in the coarse grid; smaller growth is assumed to stay within the
    /// coarse cells the cell is already registered in. Returns `Ok(false)` if
    /// the element is not in that cell.
    pub fn update_element_bound(
        &mut self,
        element: &T,
        new_bound: BoundingRect,
        row: i32,
        col: i32,
    ) -> GridResult<bool> {
        match self.fine.find_mut(element, row, col)? {
            Some(stored) => stored.set_rect_bound(new_bound),
            None => return Ok(false),
        }
        let loose_rect = self.fine.expand_cell(row, col, &new_bound)?;
        let large = self.config.large_object_size;
        if new_bound.width() > large || new_bound.height() > large {
            trace!(row, col, %loose_rect, "re-registering large object cell");
            self.coarse
                .add_with_bound(CellCoord::new(row, col), &loose_rect, false);
        }
        Ok(true)
    }
}
