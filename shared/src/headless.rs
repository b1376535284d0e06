//! Canvas implementations with no display behind them. They record every
//! call so the engine can be driven and inspected outside a browser.

use crate::canvas::{OverlayCanvas, RasterCanvas, SelectionStyle};
use crate::selection::Bounds;
use crate::transform::AffineTransform;

#[derive(Clone, Debug, PartialEq)]
pub enum OverlayOp {
    Clear,
    SetTransform([f64; 6]),
    StrokeRect { bounds: Bounds, color: String },
}

#[derive(Clone, Debug, Default)]
pub struct HeadlessOverlay {
    pub ops: Vec<OverlayOp>,
}

impl HeadlessOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rectangles stroked since the last clear, with their colours.
    pub fn visible_rects(&self) -> Vec<(Bounds, String)> {
        let start = self
            .ops
            .iter()
            .rposition(|op| *op == OverlayOp::Clear)
            .map(|index| index + 1)
            .unwrap_or(0);
        self.ops[start..]
            .iter()
            .filter_map(|op| match op {
                OverlayOp::StrokeRect { bounds, color } => Some((*bounds, color.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn clear_count(&self) -> usize {
        self.ops.iter().filter(|op| **op == OverlayOp::Clear).count()
    }
}

impl OverlayCanvas for HeadlessOverlay {
    fn clear(&mut self) {
        self.ops.push(OverlayOp::Clear);
    }

    fn set_transform(&mut self, transform: &AffineTransform) {
        self.ops.push(OverlayOp::SetTransform(transform.get()));
    }

    fn stroke_rect(&mut self, bounds: &Bounds, style: &SelectionStyle) {
        self.ops.push(OverlayOp::StrokeRect {
            bounds: *bounds,
            color: style.color.clone(),
        });
    }
}

/// Stand-in for a bitmap: a source name plus the transform it has been
/// rendered through so far.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessImage {
    pub source: String,
    pub transform: AffineTransform,
}

impl HeadlessImage {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            transform: AffineTransform::IDENTITY,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HeadlessRaster {
    pub width: f64,
    pub height: f64,
    pub transform: AffineTransform,
    pub shown: Option<HeadlessImage>,
    pub draw_count: usize,
}

impl HeadlessRaster {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            transform: AffineTransform::IDENTITY,
            shown: None,
            draw_count: 0,
        }
    }
}

impl RasterCanvas for HeadlessRaster {
    type Image = HeadlessImage;

    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.shown = None;
    }

    fn set_transform(&mut self, transform: &AffineTransform) {
        self.transform = *transform;
    }

    fn draw_image(&mut self, image: &HeadlessImage) {
        self.draw_count += 1;
        self.shown = Some(HeadlessImage {
            source: image.source.clone(),
            transform: self.transform.concat(&image.transform),
        });
    }

    fn snapshot(&self) -> Option<HeadlessImage> {
        self.shown.clone()
    }
}
