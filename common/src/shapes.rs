use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle stored by its extents.
///
/// Both `overlaps` and `contains_point` treat the rectangle as a closed set, so
/// rectangles that only touch along an edge or a corner overlap.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingRect {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_min_max(min: Point, max: Point) -> Self {
        Self::new(min.x, min.y, max.x, max.y)
    }

    pub fn from_center_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        let half_w = width * 0.5;
        let half_h = height * 0.5;
        Self::new(x - half_w, y - half_h, x + half_w, y + half_h)
    }

    pub fn min(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    pub fn max(&self) -> Point {
        Point::new(self.max_x, self.max_y)
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// True when every coordinate is finite and `min <= max` on both axes.
    pub fn is_valid(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }

    pub fn has_area(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }

    pub fn overlaps(&self, other: &BoundingRect) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Equal rectangles, or `other`'s two corners both inside `self`.
    pub fn contains_rect(&self, other: &BoundingRect) -> bool {
        self == other
            || (self.contains_point(other.min_x, other.min_y)
                && self.contains_point(other.max_x, other.max_y))
    }

    pub fn expand_to_include(&mut self, other: &BoundingRect) {
        self.min_x = f32::min(self.min_x, other.min_x);
        self.min_y = f32::min(self.min_y, other.min_y);
        self.max_x = f32::max(self.max_x, other.max_x);
        self.max_y = f32::max(self.max_y, other.max_y);
    }

    pub fn union(&self, other: &BoundingRect) -> BoundingRect {
        let mut merged = *self;
        merged.expand_to_include(other);
        merged
    }

    /// Square rectangle with the same center whose side is the longer of the
    /// two sides of `self`.
    pub fn to_square(&self) -> BoundingRect {
        let center = self.center();
        let side = f32::max(self.width(), self.height());
        BoundingRect::from_center_size(center.x, center.y, side, side)
    }

    /// Random rectangle fully inside `self` with sides in `[0, max_width]` and
    /// `[0, max_height]`.
    pub fn get_random_rect_inside<R: Rng>(
        &self,
        max_width: f32,
        max_height: f32,
        rng: &mut R,
    ) -> BoundingRect {
        let width = self._safe_randf32(rng, 0.0, f32::min(max_width, self.width()));
        let height = self._safe_randf32(rng, 0.0, f32::min(max_height, self.height()));
        let min_x = self._safe_randf32(rng, self.min_x, self.max_x - width);
        let min_y = self._safe_randf32(rng, self.min_y, self.max_y - height);
        BoundingRect::new(
            min_x,
            min_y,
            f32::min(min_x + width, self.max_x),
            f32::min(min_y + height, self.max_y),
        )
    }

    fn _safe_randf32<R: Rng>(&self, rng: &mut R, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        rng.gen_range(min..=max)
    }
}

impl fmt::Display for BoundingRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[({}, {}) - ({}, {})]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}
