use crate::error::{GridError, GridResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub coarse_rows: i32,
    pub coarse_cols: i32,
    pub detail_row_multiplier: i32,
    pub detail_col_multiplier: i32,
    /// Initial slot count of the fine grid's element store.
    pub element_capacity: usize,
    /// Width or height above which a bound update re-registers the owning
    /// fine cell in the coarse grid.
    pub large_object_size: f32,
}

impl GridConfig {
    /// Fine grid rows, or `InvalidDimensions` if the product overflows.
    pub fn detail_rows(&self) -> GridResult<i32> {
        self.coarse_rows
            .checked_mul(self.detail_row_multiplier)
            .ok_or(GridError::InvalidDimensions {
                rows: self.coarse_rows,
                cols: self.coarse_cols,
            })
    }

    pub fn detail_cols(&self) -> GridResult<i32> {
        self.coarse_cols
            .checked_mul(self.detail_col_multiplier)
            .ok_or(GridError::InvalidDimensions {
                rows: self.coarse_rows,
                cols: self.coarse_cols,
            })
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            coarse_rows: 4,
            coarse_cols: 4,
            detail_row_multiplier: 4,
            detail_col_multiplier: 4,
            element_capacity: 512,
            large_object_size: 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_dimensions() {
        let config = GridConfig::default();
        assert_eq!(config.detail_rows(), Ok(16));
        assert_eq!(config.detail_cols(), Ok(16));
    }

    #[test]
    fn detail_dimensions_overflow() {
        let config = GridConfig {
            coarse_rows: 1 << 16,
            detail_row_multiplier: 1 << 16,
            ..GridConfig::default()
        };
        assert_eq!(
            config.detail_rows(),
            Err(GridError::InvalidDimensions {
                rows: 1 << 16,
                cols: 4
            })
        );
        assert_eq!(config.detail_cols(), Ok(16));
    }
}
