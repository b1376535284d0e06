use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canvas::{OverlayCanvas, SelectionStyle};
use crate::{Point, SliceIndex};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Smallest box containing both corners, whatever the drag direction.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}

/// A region marked on one slice. Implemented once per selection shape.
pub trait SliceSelection: Clone + fmt::Debug {
    fn slice_index(&self) -> SliceIndex;

    /// Builds the shape spanned by a drag from `anchor` to `current`.
    fn from_drag(slice_index: SliceIndex, anchor: Point, current: Point) -> Self;

    fn bounds(&self) -> Bounds;

    /// A shape is valid once both of its extents reach `min_size`. Shapes
    /// with non-finite or inverted bounds never are.
    fn is_valid(&self, min_size: f64) -> bool {
        let bounds = self.bounds();
        bounds.is_finite() && bounds.width() >= min_size && bounds.height() >= min_size
    }

    fn draw(&self, canvas: &mut dyn OverlayCanvas, style: &SelectionStyle);
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct RectSelection {
    pub slice_index: SliceIndex,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectSelection {
    pub fn new(slice_index: SliceIndex, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            slice_index,
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn from_bounds(slice_index: SliceIndex, bounds: Bounds) -> Self {
        Self::new(
            slice_index,
            bounds.min_x,
            bounds.min_y,
            bounds.width(),
            bounds.height(),
        )
    }
}

impl SliceSelection for RectSelection {
    fn slice_index(&self) -> SliceIndex {
        self.slice_index
    }

    fn from_drag(slice_index: SliceIndex, anchor: Point, current: Point) -> Self {
        Self::from_bounds(slice_index, Bounds::from_corners(anchor, current))
    }

    fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.x,
            min_y: self.y,
            max_x: self.x + self.width,
            max_y: self.y + self.height,
        }
    }

    fn draw(&self, canvas: &mut dyn OverlayCanvas, style: &SelectionStyle) {
        canvas.stroke_rect(&self.bounds(), style);
    }
}
