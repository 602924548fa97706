pub mod error;
pub mod partition;
pub mod record;
pub mod unit;

pub use error::{PartitionError, PartitionResult};
pub use partition::SpatialPartition;
pub use record::{GridParams, PartitionRecord};
pub use unit::SpatialUnit;
