use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::Closure;
use web_sys::{FileReader, HtmlImageElement, ProgressEvent};

use scanmark_shared::{RectSelection, SliceIndex, Viewer};

use crate::render::{CanvasOverlay, CanvasRaster};

pub type WebViewer = Viewer<CanvasOverlay, CanvasRaster>;

pub struct State {
    pub viewer: WebViewer,
    /// Set by the selector's state-change listener, cleared once the status
    /// indicators have been refreshed.
    pub status_dirty: Rc<Cell<bool>>,
    pub slice_url: Option<String>,
    pub slice_images: HashMap<SliceIndex, HtmlImageElement>,
    pub last_batch: Vec<RectSelection>,
    pub load_reader: Option<FileReader>,
    pub load_onload: Option<Closure<dyn FnMut(ProgressEvent)>>,
}

impl State {
    pub fn new(viewer: WebViewer, slice_url: Option<String>) -> Self {
        Self {
            viewer,
            status_dirty: Rc::new(Cell::new(true)),
            slice_url,
            slice_images: HashMap::new(),
            last_batch: Vec::new(),
            load_reader: None,
            load_onload: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.load_reader.is_some()
    }
}
