pub mod shapes;

pub use shapes::{BoundingRect, Point};
