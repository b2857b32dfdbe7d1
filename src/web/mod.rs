//! Browser adapter: owns the single `App`, binds DOM listeners and drives the
//! session clock from `requestAnimationFrame`.
//!
//! Every handler computes its result inside the `APP` borrow and touches the
//! DOM after the borrow ends. Dispatching a render event can call straight
//! back into `page_rendered`, which borrows `APP` again.

mod console;
mod glue;
mod storage;
mod view;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    BeforeUnloadEvent, Document, Element, Event, EventTarget, File, FileReader,
    HtmlInputElement, HtmlSelectElement, KeyboardEvent, Window, window,
};

pub use console::init as init_logging;
pub use glue::{LOAD_DOCUMENT_EVENT, RENDER_PAGE_EVENT};
pub use storage::LocalStore;

use crate::app::{App, AvatarSlot, KeyOutcome};
use crate::document::RenderRequest;
use crate::movement::{OsRandom, Viewport};

thread_local! {
    static APP: RefCell<Option<App<LocalStore>>> = const { RefCell::new(None) };
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn with_app<R>(f: impl FnOnce(&mut App<LocalStore>) -> R) -> Option<R> {
    APP.with(|cell| cell.borrow_mut().as_mut().map(f))
}

fn dom() -> Result<(Window, Document), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    Ok((win, doc))
}

/// Milliseconds from `performance.now()` as a session clock reading.
fn now() -> Duration {
    let ms = window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0);
    Duration::from_secs_f64(ms.max(0.0) / 1000.0)
}

fn viewport_of(win: &Window) -> Viewport {
    let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64());
    match (dim(win.inner_width()), dim(win.inner_height())) {
        (Some(w), Some(h)) => Viewport::new(w, h),
        _ => Viewport::default(),
    }
}

#[wasm_bindgen]
pub fn start_app() -> Result<(), JsValue> {
    if APP.with(|cell| cell.borrow().is_some()) {
        log::warn!("start_app called twice; ignoring");
        return Ok(());
    }
    let (win, doc) = dom()?;
    let app = App::new(
        LocalStore::open(&win),
        viewport_of(&win),
        Box::new(OsRandom::new()),
    );

    view::show_settings(&doc, app.settings());
    view::show_document_chrome(&doc, app.viewer());
    view::render_look(&doc, view::CHARACTER_ID, &app.character_look())?;
    view::render_look(&doc, view::COMPANION_ID, &app.companion_look())?;
    show_avatar_controls(&doc, &app);
    let onboarding = app.needs_onboarding();
    let target_secs = app.settings().target_duration_secs;
    APP.with(|cell| *cell.borrow_mut() = Some(app));

    bind_document_controls(&win, &doc)?;
    bind_focus_controls(&win, &doc)?;
    bind_avatar_controls(&win, &doc, AvatarSlot::MovingCharacter)?;
    bind_avatar_controls(&win, &doc, AvatarSlot::Companion)?;
    bind_window(&win)?;
    if onboarding {
        show_onboarding(&doc, target_secs)?;
    }

    start_frame_loop();
    log::info!("focus reader ready");
    Ok(())
}

// --- Exports for the page's document renderer ------------------------------------

/// The renderer parsed the requested file.
#[wasm_bindgen]
pub fn document_loaded(page_count: u32) -> Result<(), JsValue> {
    let (win, doc) = dom()?;
    let Some(result) = with_app(|app| app.document_loaded(page_count)) else {
        return Ok(());
    };
    match result {
        Ok(request) => {
            refresh_chrome(&doc);
            view::toast(&win, &doc, "PDF loaded!");
            glue::request_render(&win, request)
        }
        Err(err) => {
            view::alert(&win, &err);
            Ok(())
        }
    }
}

#[wasm_bindgen]
pub fn document_failed(message: &str) -> Result<(), JsValue> {
    let (win, _) = dom()?;
    if let Some(err) = with_app(|app| app.document_failed(message)) {
        view::alert(&win, &err);
    }
    Ok(())
}

#[wasm_bindgen]
pub fn page_rendered() -> Result<(), JsValue> {
    let (win, _) = dom()?;
    match with_app(|app| app.page_rendered()).flatten() {
        Some(next) => glue::request_render(&win, next),
        None => Ok(()),
    }
}

/// A failed render still frees the renderer for the queued page.
#[wasm_bindgen]
pub fn page_render_failed(message: &str) -> Result<(), JsValue> {
    log::error!("page render failed: {message}");
    page_rendered()
}

// --- Frame loop --------------------------------------------------------------------

/// Fire due timers and present what happened.
fn pump() {
    let Some(events) = with_app(|app| app.advance(now())) else {
        return;
    };
    if events.is_empty() {
        return;
    }
    let Ok((win, doc)) = dom() else {
        return;
    };
    for event in &events {
        view::present(&win, &doc, event);
    }
}

fn start_frame_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
        pump();
        if let (Some(w), Some(cb)) = (window(), f.borrow().as_ref()) {
            let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let (Some(w), Some(cb)) = (window(), g.borrow().as_ref()) {
        let _ = w.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

// --- Listeners ---------------------------------------------------------------------

fn listen(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn listen_id(
    doc: &Document,
    id: &str,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    match doc.get_element_by_id(id) {
        Some(el) => listen(&el, event, handler),
        None => {
            log::warn!("#{id} not found; {event} listener skipped");
            Ok(())
        }
    }
}

/// Forward clicks on `button` to the hidden file input `input`.
fn open_picker_on_click(doc: &Document, button: &str, input: &str) -> Result<(), JsValue> {
    let doc2 = doc.clone();
    let input = input.to_string();
    listen_id(doc, button, "click", move |_| {
        if let Some(el) = doc2
            .get_element_by_id(&input)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            el.click();
        }
    })
}

fn picked_file(evt: &Event) -> Option<(HtmlInputElement, File)> {
    let input = evt.target()?.dyn_into::<HtmlInputElement>().ok()?;
    let file = input.files()?.get(0)?;
    Some((input, file))
}

fn refresh_chrome(doc: &Document) {
    APP.with(|cell| {
        if let Some(app) = cell.borrow().as_ref() {
            view::show_document_chrome(doc, app.viewer());
        }
    });
}

/// Run a viewer action, refresh the labels and start its render.
fn viewer_action(
    win: &Window,
    doc: &Document,
    action: impl FnOnce(&mut App<LocalStore>) -> Option<RenderRequest>,
) {
    let request = with_app(action).flatten();
    refresh_chrome(doc);
    if let Some(request) = request {
        if let Err(err) = glue::request_render(win, request) {
            log::error!("render request failed: {err:?}");
        }
    }
}

fn bind_document_controls(win: &Window, doc: &Document) -> Result<(), JsValue> {
    open_picker_on_click(doc, "uploadBtn", "pdfInput")?;
    {
        let win2 = win.clone();
        listen_id(doc, "pdfInput", "change", move |evt| {
            let Some((input, file)) = picked_file(&evt) else {
                return;
            };
            let checked = with_app(|app| app.check_document_upload(&file.type_()));
            match checked {
                Some(Ok(())) => {
                    if let Err(err) = glue::request_load(&win2, &file) {
                        log::error!("load request failed: {err:?}");
                    }
                }
                Some(Err(err)) => view::alert(&win2, &err),
                None => {}
            }
            input.set_value("");
        })?;
    }

    let actions: [(&str, fn(&mut App<LocalStore>) -> Option<RenderRequest>); 4] = [
        ("prevPage", |app| app.prev_page()),
        ("nextPage", |app| app.next_page()),
        ("zoomIn", |app| app.zoom_in()),
        ("zoomOut", |app| app.zoom_out()),
    ];
    for (id, action) in actions {
        let win2 = win.clone();
        let doc2 = doc.clone();
        listen_id(doc, id, "click", move |_| viewer_action(&win2, &doc2, action))?;
    }
    Ok(())
}

fn bind_focus_controls(win: &Window, doc: &Document) -> Result<(), JsValue> {
    listen_id(doc, "toggleBtn", "click", move |_| {
        with_app(|app| app.toggle_focus(now()));
        pump();
    })?;

    listen_id(doc, view::CHARACTER_ID, "click", move |_| {
        if with_app(|app| app.click_character(now())) == Some(true) {
            pump();
        }
    })?;

    {
        let win2 = win.clone();
        let doc2 = doc.clone();
        listen_id(doc, "interval", "change", move |evt| {
            let Some(input) = evt
                .target()
                .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            else {
                return;
            };
            let raw = input.value();
            match with_app(|app| app.set_reminder_interval(now(), &raw)) {
                Some(Ok(_)) => pump(),
                Some(Err(err)) => {
                    view::alert(&win2, &err);
                    APP.with(|cell| {
                        if let Some(app) = cell.borrow().as_ref() {
                            view::show_settings(&doc2, app.settings());
                        }
                    });
                }
                None => {}
            }
        })?;
    }

    {
        let win2 = win.clone();
        let doc2 = doc.clone();
        listen_id(doc, "character", "change", move |evt| {
            let Some(select) = evt
                .target()
                .and_then(|t| t.dyn_into::<HtmlSelectElement>().ok())
            else {
                return;
            };
            let raw = select.value();
            let outcome = with_app(|app| app.set_character(&raw).map(|_| app.character_look()));
            match outcome {
                Some(Ok(look)) => {
                    let _ = view::render_look(&doc2, view::CHARACTER_ID, &look);
                }
                Some(Err(err)) => {
                    view::alert(&win2, &err);
                    APP.with(|cell| {
                        if let Some(app) = cell.borrow().as_ref() {
                            view::show_settings(&doc2, app.settings());
                        }
                    });
                }
                None => {}
            }
        })?;
    }
    Ok(())
}

fn bind_window(win: &Window) -> Result<(), JsValue> {
    {
        let win2 = win.clone();
        listen(win, "keydown", move |evt| {
            let Some(key_evt) = evt.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let in_form = evt.target().is_some_and(|t| {
                t.has_type::<HtmlInputElement>() || t.has_type::<HtmlSelectElement>()
            });
            if in_form {
                return;
            }
            let Some(outcome) = with_app(|app| app.handle_key(now(), &key_evt.key())) else {
                return;
            };
            if view::key_consumed(outcome) {
                evt.prevent_default();
            }
            match outcome {
                KeyOutcome::Render(request) => {
                    if let Ok((_, doc)) = dom() {
                        refresh_chrome(&doc);
                    }
                    if let Err(err) = glue::request_render(&win2, request) {
                        log::error!("render request failed: {err:?}");
                    }
                }
                KeyOutcome::NoChange => {
                    if let Ok((_, doc)) = dom() {
                        refresh_chrome(&doc);
                    }
                }
                KeyOutcome::FocusToggled { .. } => pump(),
                KeyOutcome::Ignored => {}
            }
        })?;
    }

    {
        let win2 = win.clone();
        listen(win, "resize", move |_| {
            let viewport = viewport_of(&win2);
            with_app(|app| app.set_viewport(viewport));
        })?;
    }

    listen(win, "beforeunload", move |evt| {
        if with_app(|app| app.confirm_before_leaving()) == Some(true) {
            evt.prevent_default();
            if let Some(unload) = evt.dyn_ref::<BeforeUnloadEvent>() {
                unload.set_return_value("");
            }
        }
    })
}

// --- Avatars -----------------------------------------------------------------------

struct AvatarIds {
    upload: &'static str,
    input: &'static str,
    remove: &'static str,
    display: &'static str,
    confirm: &'static str,
}

fn avatar_ids(slot: AvatarSlot) -> AvatarIds {
    match slot {
        AvatarSlot::MovingCharacter => AvatarIds {
            upload: "uploadAvatarBtn",
            input: "avatarInput",
            remove: "removeAvatarBtn",
            display: view::CHARACTER_ID,
            confirm: "Remove the custom avatar?",
        },
        AvatarSlot::Companion => AvatarIds {
            upload: "uploadCompanionBtn",
            input: "companionAvatarInput",
            remove: "removeCompanionBtn",
            display: view::COMPANION_ID,
            confirm: "Remove the companion's picture?",
        },
    }
}

fn show_avatar_controls(doc: &Document, app: &App<LocalStore>) {
    for slot in [AvatarSlot::MovingCharacter, AvatarSlot::Companion] {
        let ids = avatar_ids(slot);
        view::set_shown(doc, ids.remove, app.avatar(slot).is_some(), "inline-block");
    }
}

/// Redraw everything an avatar change can affect.
fn refresh_avatars(doc: &Document) {
    APP.with(|cell| {
        let guard = cell.borrow();
        let Some(app) = guard.as_ref() else {
            return;
        };
        show_avatar_controls(doc, app);
        view::show_settings(doc, app.settings());
        for slot in [AvatarSlot::MovingCharacter, AvatarSlot::Companion] {
            let look = match slot {
                AvatarSlot::MovingCharacter => app.character_look(),
                AvatarSlot::Companion => app.companion_look(),
            };
            let _ = view::render_look(doc, avatar_ids(slot).display, &look);
        }
    });
}

fn read_avatar(win: &Window, doc: &Document, slot: AvatarSlot, file: &File) -> Result<(), JsValue> {
    let reader = FileReader::new()?;
    let reader2 = reader.clone();
    let win2 = win.clone();
    let doc2 = doc.clone();
    let onload = Closure::wrap(Box::new(move |_evt: Event| {
        let Some(data_url) = reader2.result().ok().and_then(|r| r.as_string()) else {
            log::warn!("avatar read produced no data");
            return;
        };
        if with_app(|app| app.save_avatar(slot, &data_url)) == Some(true) {
            refresh_avatars(&doc2);
            view::toast(&win2, &doc2, "Avatar saved!");
        }
    }) as Box<dyn FnMut(Event)>);
    reader.set_onload(Some(onload.as_ref().unchecked_ref()));
    onload.forget();
    reader.read_as_data_url(file)
}

fn bind_avatar_controls(win: &Window, doc: &Document, slot: AvatarSlot) -> Result<(), JsValue> {
    let ids = avatar_ids(slot);
    open_picker_on_click(doc, ids.upload, ids.input)?;
    {
        let win2 = win.clone();
        let doc2 = doc.clone();
        listen_id(doc, ids.input, "change", move |evt| {
            let Some((input, file)) = picked_file(&evt) else {
                return;
            };
            let checked = with_app(|app| app.check_avatar_upload(&file.type_(), file.size() as u64));
            match checked {
                Some(Ok(())) => {
                    if let Err(err) = read_avatar(&win2, &doc2, slot, &file) {
                        log::error!("could not read avatar file: {err:?}");
                    }
                }
                Some(Err(err)) => view::alert(&win2, &err),
                None => {}
            }
            input.set_value("");
        })?;
    }
    {
        let win2 = win.clone();
        let doc2 = doc.clone();
        listen_id(doc, ids.remove, "click", move |_| {
            if !win2.confirm_with_message(ids.confirm).unwrap_or(false) {
                return;
            }
            if let Some(Some(fallback)) = with_app(|app| app.remove_avatar(slot)) {
                log::info!("custom avatar removed; character reverted to {fallback}");
            }
            refresh_avatars(&doc2);
        })?;
    }
    Ok(())
}

// --- Onboarding --------------------------------------------------------------------

fn show_onboarding(doc: &Document, current_secs: u32) -> Result<(), JsValue> {
    let modal = view::onboarding_modal(doc, current_secs)?;
    let modal2 = modal.clone();
    listen(&modal, "click", move |evt| {
        let Some(clicked) = evt.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        if clicked.id() == "confirmTarget" {
            with_app(|app| app.finish_onboarding());
            modal2.remove();
            return;
        }
        if let Some(secs) = view::pick_preset(&modal2, &clicked) {
            if let Some(Err(err)) = with_app(|app| app.set_target_duration(secs)) {
                log::warn!("{err}");
            }
        }
    })
}
