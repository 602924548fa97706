pub mod cell;
pub mod element;
pub mod hierarchical;
pub mod loose;
pub mod packed;
pub mod store;
pub mod uniform;

pub use cell::{GridCell, LooseCell, PackedCell};
pub use element::Spatial2D;
pub use hierarchical::{HierarchicalIndex, QueryScratch};
pub use loose::{CellElements, LooseGrid};
pub use packed::PackedCoarseGrid;
pub use store::IndexStore;
pub use uniform::{CellCoord, CellRange, UniformGrid};
