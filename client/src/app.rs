use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, Event, FileReader, HtmlButtonElement, HtmlCanvasElement, HtmlInputElement,
    PointerEvent, ProgressEvent,
};

use scanmark_shared::{Selector, SliceIndex, Viewer, ViewerConfig};

use crate::dom::{
    event_to_point, get_element, set_canvas_cursor, set_mode_ui, set_slice_label, StatusUi,
};
use crate::persistence::{download_archive, download_export, read_load_payload};
use crate::render::{CanvasOverlay, CanvasRaster};
use crate::slices::show_slice;
use crate::state::State;

fn document_ready_state(document: &web_sys::Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

fn load_config(window: &web_sys::Window) -> ViewerConfig {
    let search = window.location().search().ok().unwrap_or_default();
    let parsed = ViewerConfig::from_query(&search);
    let debug = parsed.as_ref().map(|config| config.debug).unwrap_or(false);
    let level = if debug {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    let _ = console_log::init_with_level(level);
    parsed.unwrap_or_else(|err| {
        log::warn!("config: {err}, using defaults");
        ViewerConfig::default()
    })
}

fn sync_status(state: &State, ui: &StatusUi) {
    if state.status_dirty.replace(false) {
        ui.render(state.viewer.selection_status());
    }
}

fn slider_value(slider: &HtmlInputElement) -> Option<SliceIndex> {
    let value = slider.value_as_number();
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value as SliceIndex)
}

fn add_click(
    button: &HtmlButtonElement,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let onclick = Closure::<dyn FnMut(Event)>::new(handler);
    button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
    onclick.forget();
    Ok(())
}

#[derive(Clone, Copy)]
enum PointerPhase {
    Down,
    Move,
    Up,
}

fn on_pointer(
    canvas: &HtmlCanvasElement,
    events: &[&str],
    phase: PointerPhase,
    mut handler: impl FnMut(PointerPhase, &PointerEvent) + 'static,
) -> Result<(), JsValue> {
    let callback = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
        handler(phase, &event);
    });
    for name in events {
        canvas.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())?;
    }
    callback.forget();
    Ok(())
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() == Some("complete") {
        started.set(true);
        return start_app();
    }

    let onload_started = started.clone();
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    window.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();

    Ok(())
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let config = load_config(&window);
    log::info!("scanmark starting");
    log::debug!("config: {config:?}");

    let slice_canvas: HtmlCanvasElement = get_element(&document, "slice")?;
    let overlay_canvas: HtmlCanvasElement = get_element(&document, "overlay")?;
    let zoom_canvas: HtmlCanvasElement = get_element(&document, "zoom")?;
    let mode_toggle: HtmlInputElement = get_element(&document, "modeToggle")?;
    let slider: HtmlInputElement = get_element(&document, "sliceSlider")?;
    let slice_label: Element = get_element(&document, "sliceValue")?;
    let zoom_in_button: HtmlButtonElement = get_element(&document, "zoomIn")?;
    let zoom_out_button: HtmlButtonElement = get_element(&document, "zoomOut")?;
    let remove_button: HtmlButtonElement = get_element(&document, "removeSelection")?;
    let send_button: HtmlButtonElement = get_element(&document, "sendSelection")?;
    let export_button: HtmlButtonElement = get_element(&document, "exportSelection")?;
    let clear_archive_button: HtmlButtonElement = get_element(&document, "clearArchive")?;
    let save_button: HtmlButtonElement = get_element(&document, "saveArchive")?;
    let load_button: HtmlButtonElement = get_element(&document, "loadArchive")?;
    let load_file: HtmlInputElement = get_element(&document, "loadFile")?;
    let new_scan_button: HtmlButtonElement = get_element(&document, "newScan")?;
    let status_ui = Rc::new(StatusUi {
        valid: get_element(&document, "statusValid")?,
        is_2d: get_element(&document, "status2d")?,
        archive: get_element(&document, "statusArchive")?,
        send_button: send_button.clone(),
        remove_button: remove_button.clone(),
        clear_archive_button: clear_archive_button.clone(),
    });

    let viewer = Viewer::new(
        config,
        CanvasOverlay::new(overlay_canvas.clone())?,
        CanvasRaster::new(slice_canvas.clone())?,
        CanvasRaster::new(zoom_canvas.clone())?,
    )
    .map_err(|err| JsValue::from_str(&err.to_string()))?;
    let slice_url = slice_canvas.get_attribute("data-slice-url");
    if slice_url.is_none() {
        log::warn!("no data-slice-url on #slice, slices will stay blank");
    }
    let state = Rc::new(RefCell::new(State::new(viewer, slice_url)));

    {
        let mut guard = state.borrow_mut();
        let dirty = guard.status_dirty.clone();
        guard
            .viewer
            .selector_mut()
            .state_change_emitter()
            .subscribe(move || dirty.set(true));
        guard.viewer.on_mode_toggle(mode_toggle.checked());
        set_mode_ui(&zoom_canvas, &overlay_canvas, guard.viewer.mode());
        let initial = slider_value(&slider).unwrap_or(0);
        guard.viewer.on_slice_change(initial);
        set_slice_label(&slice_label, initial);
        sync_status(&guard, &status_ui);
    }
    let current_slice = state.borrow().viewer.current_slice();
    show_slice(&state, current_slice)?;

    {
        let pointer_state = state.clone();
        let pointer_canvas = overlay_canvas.clone();
        let pointer_ui = status_ui.clone();
        on_pointer(
            &overlay_canvas,
            &["pointerdown"],
            PointerPhase::Down,
            move |phase, event| {
                handle_primary_pointer(&pointer_state, &pointer_canvas, &pointer_ui, phase, event)
            },
        )?;
        let pointer_state = state.clone();
        let pointer_canvas = overlay_canvas.clone();
        let pointer_ui = status_ui.clone();
        on_pointer(
            &overlay_canvas,
            &["pointermove"],
            PointerPhase::Move,
            move |phase, event| {
                handle_primary_pointer(&pointer_state, &pointer_canvas, &pointer_ui, phase, event)
            },
        )?;
        let pointer_state = state.clone();
        let pointer_canvas = overlay_canvas.clone();
        let pointer_ui = status_ui.clone();
        on_pointer(
            &overlay_canvas,
            &["pointerup", "pointercancel", "lostpointercapture"],
            PointerPhase::Up,
            move |phase, event| {
                handle_primary_pointer(&pointer_state, &pointer_canvas, &pointer_ui, phase, event)
            },
        )?;
    }

    for (events, phase) in [
        (&["pointerdown"][..], PointerPhase::Down),
        (&["pointermove"][..], PointerPhase::Move),
        (
            &["pointerup", "pointercancel", "lostpointercapture"][..],
            PointerPhase::Up,
        ),
    ] {
        let zoom_state = state.clone();
        let zoom_target = zoom_canvas.clone();
        on_pointer(&zoom_canvas, events, phase, move |phase, event| {
            handle_zoom_pointer(&zoom_state, &zoom_target, phase, event)
        })?;
    }

    {
        let toggle_state = state.clone();
        let toggle = mode_toggle.clone();
        let toggle_zoom_canvas = zoom_canvas.clone();
        let toggle_overlay = overlay_canvas.clone();
        let toggle_ui = status_ui.clone();
        let onchange = Closure::<dyn FnMut(Event)>::new(move |_| {
            let mut state = toggle_state.borrow_mut();
            if state.is_loading() {
                return;
            }
            state.viewer.on_mode_toggle(toggle.checked());
            set_mode_ui(&toggle_zoom_canvas, &toggle_overlay, state.viewer.mode());
            sync_status(&state, &toggle_ui);
        });
        mode_toggle.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    {
        let slider_state = state.clone();
        let slider_cb = slider.clone();
        let slider_label = slice_label.clone();
        let slider_ui = status_ui.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            let Some(slice_index) = slider_value(&slider_cb) else {
                return;
            };
            {
                let mut state = slider_state.borrow_mut();
                state.viewer.on_slice_change(slice_index);
                state.status_dirty.set(true);
                sync_status(&state, &slider_ui);
            }
            set_slice_label(&slider_label, slice_index);
            if let Err(err) = show_slice(&slider_state, slice_index) {
                log::error!("slices: {err:?}");
            }
        });
        slider.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let zoom_state = state.clone();
        add_click(&zoom_in_button, move |_| {
            zoom_state.borrow_mut().viewer.zoom_in();
        })?;
        let zoom_state = state.clone();
        add_click(&zoom_out_button, move |_| {
            zoom_state.borrow_mut().viewer.zoom_out();
        })?;
    }

    {
        let remove_state = state.clone();
        let remove_ui = status_ui.clone();
        add_click(&remove_button, move |_| {
            let mut state = remove_state.borrow_mut();
            state.viewer.remove_current_selection();
            sync_status(&state, &remove_ui);
        })?;
    }

    {
        let send_state = state.clone();
        let send_ui = status_ui.clone();
        add_click(&send_button, move |_| {
            let mut state = send_state.borrow_mut();
            let batch = state.viewer.take_selection_batch();
            log::info!("selection batch of {} slice(s) ready", batch.len());
            state.last_batch = batch;
            sync_status(&state, &send_ui);
        })?;
    }

    {
        let export_state = state.clone();
        let export_document = document.clone();
        add_click(&export_button, move |_| {
            let state = export_state.borrow();
            if state.last_batch.is_empty() {
                log::info!("export: nothing taken yet");
                return;
            }
            if let Err(err) = download_export(&export_document, &state.last_batch) {
                log::error!("export: {err:?}");
            }
        })?;
    }

    {
        let clear_state = state.clone();
        let clear_ui = status_ui.clone();
        add_click(&clear_archive_button, move |_| {
            let mut state = clear_state.borrow_mut();
            state.viewer.selector_mut().clear_archive();
            sync_status(&state, &clear_ui);
        })?;
    }

    {
        let save_state = state.clone();
        let save_window = window.clone();
        let save_document = document.clone();
        add_click(&save_button, move |_| {
            let state = save_state.borrow();
            let archive = state.viewer.selector().archive();
            if let Err(err) = download_archive(&save_window, &save_document, archive) {
                log::error!("save: {err:?}");
            }
        })?;
    }

    {
        let load_file_cb = load_file.clone();
        let load_state = state.clone();
        add_click(&load_button, move |_| {
            if load_state.borrow().is_loading() {
                return;
            }
            load_file_cb.set_value("");
            load_file_cb.click();
        })?;
    }

    {
        let load_file_cb = load_file.clone();
        let load_state_onchange = state.clone();
        let load_button_cb = load_button.clone();
        let load_ui = status_ui.clone();
        let onchange = Closure::<dyn FnMut(Event)>::new(move |_| {
            let Some(file) = load_file_cb.files().and_then(|list| list.get(0)) else {
                return;
            };
            if load_state_onchange.borrow().is_loading() {
                return;
            }
            let reader = match FileReader::new() {
                Ok(reader) => reader,
                Err(_) => return,
            };
            let load_state_onload = load_state_onchange.clone();
            let load_button_onload = load_button_cb.clone();
            let load_ui_onload = load_ui.clone();
            let onload = Closure::<dyn FnMut(ProgressEvent)>::new(move |event: ProgressEvent| {
                let selections = read_load_payload(&event);
                let mut state = load_state_onload.borrow_mut();
                state.load_reader = None;
                match selections {
                    Some(selections) => {
                        log::info!("load: restored {} archived selection(s)", selections.len());
                        state.viewer.selector_mut().restore_archive(selections);
                    }
                    None => log::warn!("load: file is not a selection archive"),
                }
                sync_status(&state, &load_ui_onload);
                let _ = load_button_onload.set_attribute("aria-busy", "false");
                // `load_onload` keeps this closure alive until the next load.
            });
            reader.set_onload(Some(onload.as_ref().unchecked_ref()));
            let _ = load_button_cb.set_attribute("aria-busy", "true");
            if reader.read_as_array_buffer(&file).is_err() {
                let _ = load_button_cb.set_attribute("aria-busy", "false");
                return;
            }
            let mut state = load_state_onchange.borrow_mut();
            state.load_reader = Some(reader);
            state.load_onload = Some(onload);
        });
        load_file.add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    {
        let scan_state = state.clone();
        let scan_slider = slider.clone();
        let scan_label = slice_label.clone();
        let scan_ui = status_ui.clone();
        let scan_toggle = mode_toggle.clone();
        let scan_zoom_canvas = zoom_canvas.clone();
        let scan_overlay = overlay_canvas.clone();
        add_click(&new_scan_button, move |_| {
            {
                let mut state = scan_state.borrow_mut();
                state.viewer.prepare_for_new_scan();
                state.slice_images.clear();
                state.last_batch.clear();
                scan_toggle.set_checked(true);
                set_mode_ui(&scan_zoom_canvas, &scan_overlay, state.viewer.mode());
                sync_status(&state, &scan_ui);
            }
            scan_slider.set_value("0");
            set_slice_label(&scan_label, 0);
            if let Err(err) = show_slice(&scan_state, 0) {
                log::error!("slices: {err:?}");
            }
        })?;
    }

    log::info!("scanmark ready");
    Ok(())
}

fn handle_primary_pointer(
    state: &Rc<RefCell<State>>,
    canvas: &HtmlCanvasElement,
    ui: &StatusUi,
    phase: PointerPhase,
    event: &PointerEvent,
) {
    if matches!(phase, PointerPhase::Down) && event.button() != 0 {
        return;
    }
    let Some(point) = event_to_point(canvas, event) else {
        return;
    };
    let mut state = state.borrow_mut();
    if state.is_loading() {
        return;
    }
    match phase {
        PointerPhase::Down => {
            event.prevent_default();
            let _ = canvas.set_pointer_capture(event.pointer_id());
            state.viewer.primary_pointer_down(point);
        }
        PointerPhase::Move => state.viewer.primary_pointer_move(point),
        PointerPhase::Up => {
            if canvas.has_pointer_capture(event.pointer_id()) {
                let _ = canvas.release_pointer_capture(event.pointer_id());
            }
            state.viewer.primary_pointer_up(point);
        }
    }
    sync_status(&state, ui);
}

fn handle_zoom_pointer(
    state: &Rc<RefCell<State>>,
    canvas: &HtmlCanvasElement,
    phase: PointerPhase,
    event: &PointerEvent,
) {
    if matches!(phase, PointerPhase::Down) && event.button() != 0 {
        return;
    }
    let Some(point) = event_to_point(canvas, event) else {
        return;
    };
    let mut state = state.borrow_mut();
    match phase {
        PointerPhase::Down => {
            event.prevent_default();
            let _ = canvas.set_pointer_capture(event.pointer_id());
            state.viewer.zoom_pointer_down(point);
        }
        PointerPhase::Move => state.viewer.zoom_pointer_move(point),
        PointerPhase::Up => {
            if canvas.has_pointer_capture(event.pointer_id()) {
                let _ = canvas.release_pointer_capture(event.pointer_id());
            }
            state.viewer.zoom_pointer_up(point);
        }
    }
    let cursor = if state.viewer.is_panning() { "grabbing" } else { "grab" };
    set_canvas_cursor(canvas, cursor);
}
