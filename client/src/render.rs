use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use scanmark_shared::{AffineTransform, Bounds, OverlayCanvas, RasterCanvas, SelectionStyle};

pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("Invalid canvas context"))
}

fn apply_transform(ctx: &CanvasRenderingContext2d, transform: &AffineTransform) {
    let [a, b, c, d, e, f] = transform.get();
    let _ = ctx.set_transform(a, b, c, d, e, f);
}

fn clear_device(ctx: &CanvasRenderingContext2d, canvas: &HtmlCanvasElement) {
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.clear_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
}

/// Pixels shown for a slice: the decoded scan image, or a raster copy taken
/// from one of our canvases.
#[derive(Clone)]
pub enum SliceImage {
    Bitmap(HtmlImageElement),
    Raster(HtmlCanvasElement),
}

pub struct CanvasOverlay {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    transform: AffineTransform,
}

impl CanvasOverlay {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = context_2d(&canvas)?;
        Ok(Self {
            canvas,
            ctx,
            transform: AffineTransform::IDENTITY,
        })
    }
}

impl OverlayCanvas for CanvasOverlay {
    fn clear(&mut self) {
        clear_device(&self.ctx, &self.canvas);
        apply_transform(&self.ctx, &self.transform);
    }

    fn set_transform(&mut self, transform: &AffineTransform) {
        self.transform = *transform;
        apply_transform(&self.ctx, transform);
    }

    fn stroke_rect(&mut self, bounds: &Bounds, style: &SelectionStyle) {
        // Keep the outline width constant on screen whatever the zoom.
        let scale = self.transform.determinant().abs().sqrt().max(f64::EPSILON);
        self.ctx.set_stroke_style_str(&style.color);
        self.ctx.set_line_width(style.line_width / scale);
        self.ctx
            .stroke_rect(bounds.min_x, bounds.min_y, bounds.width(), bounds.height());
    }
}

pub struct CanvasRaster {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    transform: AffineTransform,
    has_content: bool,
}

impl CanvasRaster {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = context_2d(&canvas)?;
        ctx.set_image_smoothing_enabled(false);
        Ok(Self {
            canvas,
            ctx,
            transform: AffineTransform::IDENTITY,
            has_content: false,
        })
    }
}

impl RasterCanvas for CanvasRaster {
    type Image = SliceImage;

    fn size(&self) -> (f64, f64) {
        (self.canvas.width() as f64, self.canvas.height() as f64)
    }

    fn clear(&mut self) {
        clear_device(&self.ctx, &self.canvas);
        apply_transform(&self.ctx, &self.transform);
        self.has_content = false;
    }

    fn set_transform(&mut self, transform: &AffineTransform) {
        self.transform = *transform;
        apply_transform(&self.ctx, transform);
    }

    fn draw_image(&mut self, image: &SliceImage) {
        let (width, height) = self.size();
        let drawn = match image {
            SliceImage::Bitmap(bitmap) => self
                .ctx
                .draw_image_with_html_image_element_and_dw_and_dh(bitmap, 0.0, 0.0, width, height),
            SliceImage::Raster(raster) => self
                .ctx
                .draw_image_with_html_canvas_element_and_dw_and_dh(raster, 0.0, 0.0, width, height),
        };
        match drawn {
            Ok(()) => self.has_content = true,
            Err(err) => log::warn!("raster: draw_image failed: {err:?}"),
        }
    }

    fn snapshot(&self) -> Option<SliceImage> {
        if !self.has_content {
            return None;
        }
        let document = web_sys::window()?.document()?;
        let copy = document
            .create_element("canvas")
            .ok()?
            .dyn_into::<HtmlCanvasElement>()
            .ok()?;
        copy.set_width(self.canvas.width());
        copy.set_height(self.canvas.height());
        let ctx = context_2d(&copy).ok()?;
        ctx.draw_image_with_html_canvas_element(&self.canvas, 0.0, 0.0)
            .ok()?;
        Some(SliceImage::Raster(copy))
    }
}
