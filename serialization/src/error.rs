use grid::GridError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("json codec: {0}")]
    Json(#[from] serde_json::Error),
    #[error("binary codec: {0}")]
    Binary(#[from] bincode::Error),
    #[error("partition file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("{field} holds {found} entries but the grid needs {expected}")]
    LayoutMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("coarse cell {cell} has a header outside the member array or before its predecessor")]
    HeaderOutOfOrder { cell: usize },
}

pub type PartitionResult<T> = Result<T, PartitionError>;
