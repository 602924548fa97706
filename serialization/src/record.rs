use crate::error::{PartitionError, PartitionResult};
use crate::unit::SpatialUnit;
use common::shapes::BoundingRect;
use grid::grid::{CellCoord, HierarchicalIndex};
use grid::{GridConfig, GridError, GridResult};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::path::Path;
use tracing::{debug, warn};

/// Grid dimensions stored with a partition; enough to rebuild both grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridParams {
    pub coarse_rows: i32,
    pub coarse_cols: i32,
    pub detail_row_multiplier: i32,
    pub detail_col_multiplier: i32,
}

impl From<&GridConfig> for GridParams {
    fn from(config: &GridConfig) -> Self {
        GridParams {
            coarse_rows: config.coarse_rows,
            coarse_cols: config.coarse_cols,
            detail_row_multiplier: config.detail_row_multiplier,
            detail_col_multiplier: config.detail_col_multiplier,
        }
    }
}

impl From<GridParams> for GridConfig {
    fn from(params: GridParams) -> Self {
        GridConfig {
            coarse_rows: params.coarse_rows,
            coarse_cols: params.coarse_cols,
            detail_row_multiplier: params.detail_row_multiplier,
            detail_col_multiplier: params.detail_col_multiplier,
            ..GridConfig::default()
        }
    }
}

/// Snapshot of a built index.
///
/// `coarse_cell_element_headers` holds one offset per coarse cell in row-major
/// order. Cell `i` owns `coarse_cell_elements[headers[i]..headers[i + 1]]`; the
/// last cell runs to the end of the array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionRecord {
    pub world_rect: BoundingRect,
    pub grid_params: GridParams,
    pub sources: Vec<SpatialUnit>,
    pub detail_cells_rect: Vec<BoundingRect>,
    pub coarse_cell_element_headers: Vec<u32>,
    pub coarse_cell_elements: Vec<CellCoord>,
}

impl PartitionRecord {
    /// Records `index` together with `sources`. Sources that already carry a
    /// fine cell keep it; the rest are assigned the fine cell holding the
    /// center of their bound. A center outside the grid leaves the source
    /// unassigned.
    pub fn capture<T>(index: &HierarchicalIndex<T>, sources: &[SpatialUnit]) -> Self {
        let fine_geometry = index.fine().geometry();
        let sources: Vec<SpatialUnit> = sources
            .iter()
            .map(|source| {
                let mut unit = source.clone();
                if !unit.is_assigned() {
                    let center = unit.bound.center();
                    let cell = index.locate_fine_cell(center.x, center.y);
                    if !fine_geometry.is_out_of_range(cell.row, cell.col) {
                        unit.cell = cell;
                    }
                }
                unit
            })
            .collect();

        let detail_cells_rect = index.fine().cells().map(|(_, cell)| cell.rect()).collect();

        let coarse = index.coarse();
        let mut headers = Vec::with_capacity(coarse.geometry().cell_count());
        let mut elements = Vec::new();
        for (_, cell) in coarse.cells() {
            headers.push(elements.len() as u32);
            let mut members: SmallVec<[CellCoord; 16]> = cell.members().iter().copied().collect();
            members.sort_unstable();
            elements.extend(members);
        }

        debug!(
            sources = sources.len(),
            coarse_references = elements.len(),
            "captured partition"
        );
        PartitionRecord {
            world_rect: index.world_rect(),
            grid_params: GridParams::from(index.config()),
            sources,
            detail_cells_rect,
            coarse_cell_element_headers: headers,
            coarse_cell_elements: elements,
        }
    }

    /// Rebuilds the index, linking every source straight into its recorded
    /// fine cell. Sources without a cell inside the fine grid are skipped.
    pub fn restore(&self) -> PartitionResult<HierarchicalIndex<SpatialUnit>> {
        self.restore_with(|index, sources| {
            for unit in sources {
                let outside = !unit.is_assigned()
                    || index
                        .fine()
                        .geometry()
                        .is_out_of_range(unit.cell.row, unit.cell.col);
                if outside {
                    warn!(
                        key = %unit.key,
                        cell = %unit.cell,
                        "skipped partition source outside the grid"
                    );
                    continue;
                }
                index.insert_into_fine_cell(unit.clone(), unit.cell)?;
            }
            Ok(())
        })
    }

    /// Rebuilds the index, letting `reconstruct` fill the fine grid. The
    /// recorded loose bounds and coarse members are applied afterwards, so
    /// `reconstruct` only has to link elements.
    pub fn restore_with<T, F>(&self, reconstruct: F) -> PartitionResult<HierarchicalIndex<T>>
    where
        F: FnOnce(&mut HierarchicalIndex<T>, &[SpatialUnit]) -> PartitionResult<()>,
    {
        let mut config = GridConfig::from(self.grid_params);
        self.validate(&config)?;
        config.element_capacity = config.element_capacity.max(self.sources.len());
        let mut index = HierarchicalIndex::new(self.world_rect, config)?;

        reconstruct(&mut index, &self.sources)?;

        let fine_geometry = index.fine().geometry().clone();
        for (cell_index, rect) in self.detail_cells_rect.iter().enumerate() {
            index.set_fine_cell_bound(fine_geometry.cell_coord(cell_index), *rect)?;
        }

        let coarse_geometry = index.coarse().geometry().clone();
        let headers = &self.coarse_cell_element_headers;
        for (cell_index, &begin) in headers.iter().enumerate() {
            let end = match headers.get(cell_index + 1) {
                Some(&next) => next as usize,
                None => self.coarse_cell_elements.len(),
            };
            let coarse_cell = coarse_geometry.cell_coord(cell_index);
            for fine_cell in &self.coarse_cell_elements[begin as usize..end] {
                index.register_coarse_member(coarse_cell, *fine_cell)?;
            }
        }

        debug!(
            elements = index.len(),
            coarse_references = self.coarse_cell_elements.len(),
            "restored partition"
        );
        Ok(index)
    }

    /// Checks the array lengths against the grid dimensions in `config`
    /// before anything is allocated for them.
    fn validate(&self, config: &GridConfig) -> PartitionResult<()> {
        let fine_cells = cell_count(config.detail_rows()?, config.detail_cols()?)?;
        if self.detail_cells_rect.len() != fine_cells {
            return Err(PartitionError::LayoutMismatch {
                field: "detail_cells_rect",
                expected: fine_cells,
                found: self.detail_cells_rect.len(),
            });
        }
        let coarse_cells = cell_count(config.coarse_rows, config.coarse_cols)?;
        if self.coarse_cell_element_headers.len() != coarse_cells {
            return Err(PartitionError::LayoutMismatch {
                field: "coarse_cell_element_headers",
                expected: coarse_cells,
                found: self.coarse_cell_element_headers.len(),
            });
        }
        let mut previous = 0;
        for (cell, &header) in self.coarse_cell_element_headers.iter().enumerate() {
            let header = header as usize;
            if header < previous || header > self.coarse_cell_elements.len() {
                return Err(PartitionError::HeaderOutOfOrder { cell });
            }
            previous = header;
        }
        Ok(())
    }

    pub fn to_json(&self) -> PartitionResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> PartitionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_bytes(&self) -> PartitionResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> PartitionResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Writes the binary encoding to `path`.
    pub fn save(&self, path: &Path) -> PartitionResult<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> PartitionResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

fn cell_count(rows: i32, cols: i32) -> GridResult<usize> {
    match rows.checked_mul(cols) {
        Some(count) if rows > 0 && cols > 0 => Ok(count as usize),
        _ => Err(GridError::InvalidDimensions { rows, cols }),
    }
}
