use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlButtonElement, HtmlCanvasElement, HtmlElement, PointerEvent};

use scanmark_shared::{normalize_point, Point, SelectionStatus, ViewerMode};

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

/// Pointer position in canvas pixels. The canvas may be scaled by CSS, so
/// the client offset is rescaled to the backing store size.
pub fn event_to_point(canvas: &HtmlCanvasElement, event: &PointerEvent) -> Option<Point> {
    let rect = canvas.get_bounding_client_rect();
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return None;
    }
    let scale_x = canvas.width() as f64 / rect.width();
    let scale_y = canvas.height() as f64 / rect.height();
    let x = (event.client_x() as f64 - rect.left()) * scale_x;
    let y = (event.client_y() as f64 - rect.top()) * scale_y;
    normalize_point(Point { x, y })
}

pub fn set_canvas_cursor(canvas: &HtmlCanvasElement, cursor: &str) {
    if let Ok(element) = canvas.clone().dyn_into::<HtmlElement>() {
        let _ = element.style().set_property("cursor", cursor);
    }
}

pub fn set_mode_ui(zoom_canvas: &HtmlCanvasElement, overlay: &HtmlCanvasElement, mode: ViewerMode) {
    let zooming = mode == ViewerMode::Zooming;
    zoom_canvas.set_hidden(!zooming);
    set_canvas_cursor(overlay, if zooming { "default" } else { "crosshair" });
    set_canvas_cursor(zoom_canvas, if zooming { "grab" } else { "default" });
}

pub fn set_slice_label(label: &Element, slice_index: u32) {
    label.set_text_content(Some(&slice_index.to_string()));
}

fn set_flag(element: &Element, on: bool) {
    let _ = element.set_attribute("data-state", if on { "on" } else { "off" });
}

/// Indicators and the buttons whose availability follows the selection
/// status.
pub struct StatusUi {
    pub valid: Element,
    pub is_2d: Element,
    pub archive: Element,
    pub send_button: HtmlButtonElement,
    pub remove_button: HtmlButtonElement,
    pub clear_archive_button: HtmlButtonElement,
}

impl StatusUi {
    pub fn render(&self, status: SelectionStatus) {
        set_flag(&self.valid, status.is_valid);
        set_flag(&self.is_2d, status.is_2d);
        set_flag(&self.archive, status.has_archive);
        self.send_button.set_disabled(!status.is_valid);
        self.remove_button.set_disabled(!status.is_2d);
        self.clear_archive_button.set_disabled(!status.has_archive);
    }
}
