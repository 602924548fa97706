use crate::error::PartitionResult;
use crate::record::PartitionRecord;
use crate::unit::SpatialUnit;
use common::shapes::{BoundingRect, Point};
use grid::grid::{CellCoord, CellRange, HierarchicalIndex, QueryScratch};
use grid::GridConfig;
use smallvec::SmallVec;
use tracing::{debug, warn};

/// A hierarchical index of [`SpatialUnit`]s that can be built from a set of
/// sources, persisted as a [`PartitionRecord`] and restored from one.
#[derive(Debug, Clone)]
pub struct SpatialPartition {
    index: HierarchicalIndex<SpatialUnit>,
}

impl SpatialPartition {
    /// Union of every source bound, or `None` without sources. With `square`
    /// the union is grown into a square around its own center.
    pub fn world_rect_of(sources: &[SpatialUnit], square: bool) -> Option<BoundingRect> {
        let (first, rest) = sources.split_first()?;
        let union = rest
            .iter()
            .fold(first.bound, |world, unit| world.union(&unit.bound));
        Some(if square { union.to_square() } else { union })
    }

    /// Indexes `sources` over the union of their bounds.
    ///
    /// Fails if the union has no area. Sources whose center lands outside the
    /// grid are skipped.
    pub fn build(sources: &[SpatialUnit], config: GridConfig, square: bool) -> PartitionResult<Self> {
        let world_rect = Self::world_rect_of(sources, square).unwrap_or_default();
        let mut index = HierarchicalIndex::new(world_rect, config)?;
        for source in sources {
            let mut unit = source.clone();
            let center = unit.bound.center();
            unit.cell = index.locate_fine_cell(center.x, center.y);
            let bound = unit.bound;
            if let Err(err) = index.insert(unit, &bound) {
                warn!(key = %source.key, %err, "dropped partition source");
            }
        }
        debug!(
            %world_rect,
            elements = index.len(),
            coarse_references = index.coarse().member_count(),
            "built partition"
        );
        debug!("loose detail grid\n{}", index.fine());
        debug!("packed coarse grid\n{}", index.coarse());
        Ok(SpatialPartition { index })
    }

    pub fn from_record(record: &PartitionRecord) -> PartitionResult<Self> {
        Ok(SpatialPartition {
            index: record.restore()?,
        })
    }

    /// Snapshot of the current state. Units are listed cell by cell in
    /// insertion order, so a restore relinks every chain as it is now.
    pub fn record(&self) -> PartitionRecord {
        let mut sources = Vec::with_capacity(self.index.len());
        for (coord, _) in self.index.fine().cells() {
            let mut chain: SmallVec<[&SpatialUnit; 8]> =
                self.index.fine().iter_cell(coord.row, coord.col).collect();
            chain.reverse();
            sources.extend(chain.into_iter().map(|unit| SpatialUnit {
                cell: coord,
                ..unit.clone()
            }));
        }
        PartitionRecord::capture(&self.index, &sources)
    }

    pub fn index(&self) -> &HierarchicalIndex<SpatialUnit> {
        &self.index
    }

    pub fn world_rect(&self) -> BoundingRect {
        self.index.world_rect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn scratch(&self) -> QueryScratch {
        self.index.scratch()
    }

    pub fn query_rect<'a>(
        &'a self,
        rect: &BoundingRect,
        scratch: &mut QueryScratch,
        results: &mut Vec<&'a SpatialUnit>,
    ) {
        self.index.query(rect, scratch, results);
    }

    pub fn fetch_coarse_cell<'a>(
        &'a self,
        row: i32,
        col: i32,
        results: &mut Vec<&'a SpatialUnit>,
        loose: bool,
    ) -> PartitionResult<()> {
        Ok(self.index.fetch_coarse_cell(row, col, results, loose)?)
    }

    pub fn find_contact_coarse_cells(&self, rect: &BoundingRect) -> CellRange {
        self.index.coarse_contact_range(rect)
    }

    pub fn locate_coarse_cell(&self, pos: Point) -> CellCoord {
        self.index.locate_coarse_cell(pos.x, pos.y)
    }

    pub fn locate_detail_cell(&self, pos: Point) -> CellCoord {
        self.index.locate_fine_cell(pos.x, pos.y)
    }

    /// Indexes `unit` by its own bound and records the fine cell it lands in.
    pub fn add_element(&mut self, mut unit: SpatialUnit) -> PartitionResult<CellCoord> {
        let center = unit.bound.center();
        unit.cell = self.index.locate_fine_cell(center.x, center.y);
        let bound = unit.bound;
        Ok(self.index.insert(unit, &bound)?)
    }

    /// Links `unit` into a fine cell without growing the cell's bound or
    /// touching the coarse grid.
    pub fn add_element_to_detail_cell(
        &mut self,
        mut unit: SpatialUnit,
        cell: CellCoord,
    ) -> PartitionResult<()> {
        unit.cell = cell;
        Ok(self.index.insert_into_fine_cell(unit, cell)?)
    }

    /// Links `unit` into a fine cell and grows the cell's bound to cover
    /// `bound`. The coarse grid is not touched.
    pub fn add_element_to_detail_cell_with_bound(
        &mut self,
        mut unit: SpatialUnit,
        bound: &BoundingRect,
        cell: CellCoord,
    ) -> PartitionResult<()> {
        unit.cell = cell;
        Ok(self
            .index
            .insert_into_fine_cell_with_bound(unit, cell, bound)?)
    }

    pub fn remove_element(&mut self, unit: &SpatialUnit, cell: CellCoord) -> PartitionResult<bool> {
        Ok(self.index.remove(unit, cell.row, cell.col)?)
    }

    /// Stores `new_bound` on the unit held in `cell`. An unassigned cell
    /// (negative row or column) is a no-op returning `Ok(false)`.
    pub fn fast_update_element_bounds(
        &mut self,
        unit: &SpatialUnit,
        new_bound: BoundingRect,
        cell: CellCoord,
    ) -> PartitionResult<bool> {
        if cell.row < 0 || cell.col < 0 {
            return Ok(false);
        }
        Ok(self
            .index
            .update_element_bound(unit, new_bound, cell.row, cell.col)?)
    }

    /// Fixed rectangle of a coarse cell.
    pub fn coarse_cell_bound(&self, row: i32, col: i32) -> PartitionResult<BoundingRect> {
        Ok(self.index.coarse_cell_rect(row, col)?)
    }

    /// Loose bound of a fine cell.
    pub fn detail_cell_bound(&self, row: i32, col: i32) -> PartitionResult<BoundingRect> {
        Ok(self.index.fine_cell_bound(row, col)?)
    }
}
