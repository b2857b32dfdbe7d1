//! Requests to the page's document renderer.
//!
//! The renderer (pdf.js) lives in page script. We ask it for work by
//! dispatching `CustomEvent`s on `window`; it answers through the exported
//! `document_loaded`, `document_failed`, `page_rendered` and
//! `page_render_failed` functions.

use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, CustomEventInit, File, Window};

use crate::document::RenderRequest;

/// `detail`: the selected `File`.
pub const LOAD_DOCUMENT_EVENT: &str = "focusreader:load-document";
/// `detail`: JSON `{"page": n, "scale": s}`.
pub const RENDER_PAGE_EVENT: &str = "focusreader:render-page";

fn dispatch(win: &Window, name: &str, detail: &JsValue) -> Result<(), JsValue> {
    let init = CustomEventInit::new();
    init.set_detail(detail);
    let event = CustomEvent::new_with_event_init_dict(name, &init)?;
    win.dispatch_event(&event)?;
    Ok(())
}

pub fn request_load(win: &Window, file: &File) -> Result<(), JsValue> {
    dispatch(win, LOAD_DOCUMENT_EVENT, &JsValue::from(file.clone()))
}

pub fn request_render(win: &Window, request: RenderRequest) -> Result<(), JsValue> {
    let detail = serde_json::to_string(&request)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))?;
    log::debug!("render page {} at {:.2}x", request.page, request.scale);
    dispatch(win, RENDER_PAGE_EVENT, &JsValue::from_str(&detail))
}
