use common::shapes::BoundingRect;

/// What the grids need from an indexed object. Identity is `PartialEq`:
/// removal and bound updates look an element up by equality within its cell.
pub trait Spatial2D {
    /// Higher values are handled first by callers; the grids ignore it.
    fn priority(&self) -> i32;
    fn rect_bound(&self) -> BoundingRect;
    fn set_rect_bound(&mut self, bound: BoundingRect);
    /// Recomputes the bound from the object's own geometry.
    fn calculate_bounds(&mut self) {}
}
