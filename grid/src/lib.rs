pub mod config;
pub mod error;
pub mod grid;

pub use common::shapes;
pub use config::GridConfig;
pub use error::{GridError, GridResult};
