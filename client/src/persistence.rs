use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlAnchorElement, ProgressEvent, Window};

use scanmark_shared::{
    decode_archive_file, encode_archive_file, ArchiveFileDecodeError, RectSelection,
    SelectionArchive, SelectionExport,
};

/// Binary archive file first, then the JSON export format. A file that is
/// recognisably an archive but fails to decode is not retried as JSON.
pub fn parse_archive_payload(bytes: &[u8]) -> Option<Vec<RectSelection>> {
    match decode_archive_file(bytes) {
        Ok(archive) => return Some(archive.to_vec()),
        Err(ArchiveFileDecodeError::NotAnArchive) => {
            log::debug!("persistence: not a binary archive, trying JSON")
        }
        Err(err) => {
            log::warn!("persistence: {err}");
            return None;
        }
    }
    let text = String::from_utf8(bytes.to_vec()).ok()?;
    SelectionExport::from_json(text.trim()).map(|export| export.selections)
}

pub fn read_load_payload(event: &ProgressEvent) -> Option<Vec<RectSelection>> {
    let reader: web_sys::FileReader = event.target()?.dyn_into().ok()?;
    let buffer = reader.result().ok()?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    parse_archive_payload(&bytes)
}

fn download_href(document: &Document, href: &str, filename: &str) {
    if let Ok(element) = document.create_element("a") {
        if let Ok(anchor) = element.dyn_into::<HtmlAnchorElement>() {
            anchor.set_href(href);
            anchor.set_download(filename);
            anchor.click();
        }
    }
}

pub fn download_export(document: &Document, selections: &[RectSelection]) -> Result<(), JsValue> {
    let json = SelectionExport::new(selections.to_vec())
        .to_json()
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    let encoded = String::from(js_sys::encode_uri_component(&json));
    let href = format!("data:application/json;charset=utf-8,{encoded}");
    download_href(document, &href, "selections.json");
    Ok(())
}

pub fn download_archive(
    window: &Window,
    document: &Document,
    archive: &SelectionArchive<RectSelection>,
) -> Result<(), JsValue> {
    let bytes = encode_archive_file(archive);
    let binary: String = bytes.iter().map(|byte| char::from(*byte)).collect();
    let encoded = window.btoa(&binary)?;
    let href = format!("data:application/octet-stream;base64,{encoded}");
    download_href(document, &href, "selections.smar");
    Ok(())
}
