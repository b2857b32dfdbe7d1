//! DOM presentation of session events, notices and viewer state.

use std::time::Duration;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AudioContext, Document, Element, HtmlElement, HtmlInputElement, HtmlSelectElement,
    OscillatorType, Window,
};

use crate::app::KeyOutcome;
use crate::document::DocumentViewer;
use crate::error::AppError;
use crate::movement::Position;
use crate::notify::{self, CHIME_GAIN, CHIME_HZ, CHIME_SECS, Notice};
use crate::session::SessionEvent;
use crate::settings::{CharacterLook, Settings, TARGET_PRESETS};

pub const CHARACTER_ID: &str = "focusCharacter";
pub const COMPANION_ID: &str = "companionAvatar";
pub const FOCUS_ACTIVE_CLASS: &str = "focus-mode-active";
const HIDDEN_CLASS: &str = "hidden";
const MOVE_TRANSITION: &str = "all 2s ease-in-out";

fn html(doc: &Document, id: &str) -> Option<HtmlElement> {
    doc.get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
}

pub fn set_text(doc: &Document, id: &str, text: &str) {
    if let Some(el) = doc.get_element_by_id(id) {
        el.set_text_content(Some(text));
    }
}

pub fn set_shown(doc: &Document, id: &str, shown: bool, display: &str) {
    if let Some(el) = html(doc, id) {
        let _ = el
            .style()
            .set_property("display", if shown { display } else { "none" });
    }
}

pub fn set_input_value(doc: &Document, id: &str, value: &str) {
    let Some(el) = doc.get_element_by_id(id) else {
        return;
    };
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
        select.set_value(value);
    }
}

pub fn show_settings(doc: &Document, settings: &Settings) {
    set_input_value(doc, "interval", &settings.reminder_interval_secs.to_string());
    set_input_value(doc, "character", settings.character.as_str());
}

/// Draw an emoji or image into the element with `id`.
pub fn render_look(doc: &Document, id: &str, look: &CharacterLook) -> Result<(), JsValue> {
    let Some(el) = doc.get_element_by_id(id) else {
        return Ok(());
    };
    el.set_inner_html("");
    match look {
        CharacterLook::Emoji(emoji) => el.set_text_content(Some(emoji)),
        CharacterLook::Image(src) => {
            let img = doc.create_element("img")?;
            img.set_attribute("src", src)?;
            img.set_attribute("alt", "")?;
            img.set_attribute(
                "style",
                "width:60px; height:60px; border-radius:50%; object-fit:cover;",
            )?;
            el.append_child(&img)?;
        }
    }
    Ok(())
}

fn place(el: &HtmlElement, at: Position) {
    let style = el.style();
    let _ = style.set_property("left", &format!("{}px", at.x));
    let _ = style.set_property("top", &format!("{}px", at.y));
}

fn set_focus_mode(doc: &Document, active: bool) {
    if let Some(body) = doc.body() {
        let classes = body.class_list();
        let _ = if active {
            classes.add_1(FOCUS_ACTIVE_CLASS)
        } else {
            classes.remove_1(FOCUS_ACTIVE_CLASS)
        };
    }
    set_text(
        doc,
        "toggleBtn",
        if active { "Stop Focus" } else { "Start Focus" },
    );
}

pub fn present(win: &Window, doc: &Document, event: &SessionEvent) {
    let character = html(doc, CHARACTER_ID);
    match event {
        SessionEvent::Started { hit_count } => {
            set_focus_mode(doc, true);
            set_text(doc, "focusCount", &hit_count.to_string());
            set_text(doc, "readingTime", &notify::clock_text(0));
        }
        SessionEvent::Tick { elapsed_secs } => {
            set_text(doc, "readingTime", &notify::clock_text(*elapsed_secs));
        }
        SessionEvent::CharacterShown { position } => {
            if let Some(el) = character {
                let _ = el.style().set_property("transition", "none");
                let _ = el.style().set_property("transform", "rotate(0deg)");
                place(&el, *position);
                let _ = el.class_list().remove_1(HIDDEN_CLASS);
            }
        }
        SessionEvent::CharacterMoved {
            position,
            facing_deg,
        } => {
            if let Some(el) = character {
                let _ = el.style().set_property("transition", MOVE_TRANSITION);
                let _ = el
                    .style()
                    .set_property("transform", &format!("rotate({facing_deg}deg)"));
                place(&el, *position);
            }
        }
        SessionEvent::CharacterHidden => {
            if let Some(el) = character {
                let _ = el.class_list().add_1(HIDDEN_CLASS);
                let _ = el.style().set_property("transform", "rotate(0deg)");
            }
        }
        SessionEvent::Hit {
            hit_count,
            position,
        } => {
            set_text(doc, "focusCount", &hit_count.to_string());
            if let Err(err) = click_effect(win, doc, *position) {
                log::debug!("click effect failed: {err:?}");
            }
        }
        SessionEvent::Stopped { .. } => set_focus_mode(doc, false),
        SessionEvent::TargetReached { .. } | SessionEvent::Encouragement { .. } => {}
    }
    for notice in notify::notices_for(event) {
        if let Err(err) = show_notice(win, doc, &notice) {
            log::warn!("could not show notice: {err:?}");
        }
    }
}

fn click_effect(win: &Window, doc: &Document, at: Position) -> Result<(), JsValue> {
    let effect = doc.create_element("div")?;
    effect.set_text_content(Some("+1"));
    effect.set_class_name("click-effect");
    effect.set_attribute(
        "style",
        &format!(
            "position:fixed; left:{}px; top:{}px; pointer-events:none; z-index:1001;",
            at.x, at.y
        ),
    )?;
    append_to_body(doc, &effect)?;
    remove_after(win, effect, notify::CLICK_EFFECT_DISMISS);
    Ok(())
}

pub fn show_notice(win: &Window, doc: &Document, notice: &Notice) -> Result<(), JsValue> {
    let el = doc.create_element("div")?;
    match notice {
        Notice::Success(text) => {
            el.set_class_name("success-message");
            el.set_text_content(Some(text));
        }
        Notice::Encouragement(text) => {
            el.set_class_name("encouragement-message");
            el.set_text_content(Some(text));
        }
        Notice::Celebration { headline, detail } => {
            el.set_class_name("fireworks-container");
            let title = doc.create_element("h2")?;
            title.set_text_content(Some(headline));
            let body = doc.create_element("p")?;
            body.set_text_content(Some(detail));
            el.append_child(&title)?;
            el.append_child(&body)?;
            if let Err(err) = play_chime() {
                log::warn!("{err}");
            }
        }
    }
    append_to_body(doc, &el)?;
    remove_after(win, el, notice.dismiss_after());
    Ok(())
}

pub fn toast(win: &Window, doc: &Document, text: &str) {
    if let Err(err) = show_notice(win, doc, &Notice::Success(text.to_string())) {
        log::warn!("could not show toast: {err:?}");
    }
}

/// Short sine chime. Browsers may refuse audio before a user gesture.
fn play_chime() -> Result<(), AppError> {
    let audio = |err: JsValue| AppError::Audio(format!("{err:?}"));
    let ctx = AudioContext::new().map_err(audio)?;
    let osc = ctx.create_oscillator().map_err(audio)?;
    let gain = ctx.create_gain().map_err(audio)?;
    osc.set_type(OscillatorType::Sine);
    osc.frequency().set_value(CHIME_HZ);
    gain.gain().set_value(CHIME_GAIN);
    osc.connect_with_audio_node(&gain).map_err(audio)?;
    gain.connect_with_audio_node(&ctx.destination())
        .map_err(audio)?;
    let start = ctx.current_time();
    osc.start_with_when(start).map_err(audio)?;
    osc.stop_with_when(start + CHIME_SECS).map_err(audio)?;
    Ok(())
}

/// Blocking alert for errors the user must acknowledge.
pub fn alert(win: &Window, err: &AppError) {
    if err.alerts_user() {
        let _ = win.alert_with_message(&err.to_string());
    } else {
        log::warn!("{err}");
    }
}

pub fn show_document_chrome(doc: &Document, viewer: &DocumentViewer) {
    let loaded = viewer.is_loaded();
    set_shown(doc, "welcomeMessage", !loaded, "block");
    set_shown(doc, "pdfCanvas", loaded, "block");
    set_shown(doc, "pdfControls", loaded, "flex");
    if let Some(label) = viewer.page_label() {
        set_text(doc, "pageInfo", &label);
    }
    set_text(doc, "zoomLevel", &viewer.zoom_label());
}

/// Keys that were consumed must not scroll the page.
pub fn key_consumed(outcome: KeyOutcome) -> bool {
    !matches!(outcome, KeyOutcome::Ignored)
}

/// First-visit goal picker. Buttons carry `data-duration` in seconds; the
/// confirm button has id `confirmTarget`.
pub fn onboarding_modal(doc: &Document, current_secs: u32) -> Result<Element, JsValue> {
    let buttons: String = TARGET_PRESETS
        .iter()
        .map(|(secs, label, blurb)| {
            let active = if *secs == current_secs { " active" } else { "" };
            format!(
                r#"<button class="duration-btn{active}" data-duration="{secs}"><span class="duration-time">{label}</span><span class="duration-desc">{blurb}</span></button>"#
            )
        })
        .collect();
    let modal = doc.create_element("div")?;
    modal.set_class_name("modal-overlay show");
    modal.set_inner_html(&format!(
        r#"<div class="modal-content"><div class="focus-duration-modal"><h2>🎯 Set your focus goal</h2><p>How long do you want to focus? We will celebrate when you get there!</p><div class="duration-grid">{buttons}</div><div class="modal-actions"><button id="confirmTarget" class="btn btn-primary">Start focusing</button></div></div></div>"#
    ));
    append_to_body(doc, &modal)?;
    Ok(modal)
}

/// Mark the chosen preset button active and return its duration.
pub fn pick_preset(modal: &Element, clicked: &Element) -> Option<u32> {
    let button = clicked.closest(".duration-btn").ok()??;
    let secs = button.get_attribute("data-duration")?.parse().ok()?;
    if let Ok(buttons) = modal.query_selector_all(".duration-btn") {
        for i in 0..buttons.length() {
            if let Some(other) = buttons.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                let _ = other.class_list().remove_1("active");
            }
        }
    }
    let _ = button.class_list().add_1("active");
    Some(secs)
}

fn append_to_body(doc: &Document, el: &Element) -> Result<(), JsValue> {
    let body = doc
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?;
    body.append_child(el)?;
    Ok(())
}

pub fn remove_after(win: &Window, el: Element, after: Duration) {
    let closure = Closure::wrap(Box::new(move || el.remove()) as Box<dyn FnMut()>);
    let millis = i32::try_from(after.as_millis()).unwrap_or(i32::MAX);
    if win
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            millis,
        )
        .is_err()
    {
        log::warn!("setTimeout failed; element left in place");
    }
    closure.forget();
}
