use crate::selection::Bounds;
use crate::transform::AffineTransform;

#[derive(Clone, Debug, PartialEq)]
pub struct SelectionStyle {
    pub color: String,
    pub line_width: f64,
}

impl SelectionStyle {
    pub fn new(color: impl Into<String>, line_width: f64) -> Self {
        Self {
            color: color.into(),
            line_width,
        }
    }
}

/// Transparent layer stacked over the slice image. Selections are stroked in
/// slice coordinates; the layer maps them through the last transform it was
/// given.
pub trait OverlayCanvas {
    /// Erases the whole layer regardless of the current transform.
    fn clear(&mut self);

    fn set_transform(&mut self, transform: &AffineTransform);

    fn stroke_rect(&mut self, bounds: &Bounds, style: &SelectionStyle);
}

/// Layer that shows slice pixels.
pub trait RasterCanvas {
    type Image: Clone;

    /// Width and height in canvas pixels.
    fn size(&self) -> (f64, f64);

    fn clear(&mut self);

    fn set_transform(&mut self, transform: &AffineTransform);

    fn draw_image(&mut self, image: &Self::Image);

    /// Copies what the canvas currently shows into a standalone image, or
    /// `None` when nothing has been drawn yet.
    fn snapshot(&self) -> Option<Self::Image>;
}
