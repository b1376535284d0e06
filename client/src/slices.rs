use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlImageElement;

use scanmark_shared::SliceIndex;

use crate::render::SliceImage;
use crate::state::State;

/// Expands `{index}` in a slice URL template such as `/scans/42/{index}.png`.
pub fn slice_url(template: &str, slice_index: SliceIndex) -> String {
    template.replace("{index}", &slice_index.to_string())
}

/// Shows the image for `slice_index`, fetching it on first use. A response
/// that arrives after the user has moved to another slice is cached but not
/// shown.
pub fn show_slice(state: &Rc<RefCell<State>>, slice_index: SliceIndex) -> Result<(), JsValue> {
    let mut guard = state.borrow_mut();
    if let Some(image) = guard.slice_images.get(&slice_index).cloned() {
        if image.complete() && image.natural_width() > 0 {
            guard.viewer.set_slice_image(SliceImage::Bitmap(image));
        }
        return Ok(());
    }
    let Some(template) = guard.slice_url.clone() else {
        return Ok(());
    };
    let image = HtmlImageElement::new()?;
    let onload_state = state.clone();
    let onload_image = image.clone();
    let onload = Closure::once_into_js(move || {
        let mut state = onload_state.borrow_mut();
        if state.viewer.current_slice() != slice_index {
            return;
        }
        state
            .viewer
            .set_slice_image(SliceImage::Bitmap(onload_image));
    });
    image.set_onload(Some(onload.unchecked_ref()));
    let onerror = Closure::once_into_js(move || {
        log::warn!("slices: failed to load slice {slice_index}");
    });
    image.set_onerror(Some(onerror.unchecked_ref()));
    let url = slice_url(&template, slice_index);
    log::debug!("slices: requesting {url}");
    image.set_src(&url);
    guard.slice_images.insert(slice_index, image);
    Ok(())
}
