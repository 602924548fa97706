use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GridError {
    #[error("cell (row: {row}, col: {col}) is outside a {rows}x{cols} grid")]
    OutOfRange {
        row: i32,
        col: i32,
        rows: i32,
        cols: i32,
    },
    #[error("grid dimensions must be positive and small enough to index (rows: {rows}, cols: {cols})")]
    InvalidDimensions { rows: i32, cols: i32 },
    #[error(
        "grid bounding rectangle must be finite with min < max (min_x: {min_x}, min_y: {min_y}, max_x: {max_x}, max_y: {max_y})"
    )]
    InvalidRect {
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
    },
}

pub type GridResult<T> = Result<T, GridError>;
