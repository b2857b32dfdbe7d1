//! Focus Reader core crate.
//!
//! A PDF reading companion: while focus mode is on, a character appears after
//! each reminder interval and wanders the screen until the reader clicks it.
//! The session, timer and movement logic is plain Rust driven by an explicit
//! clock; `web` binds it to the DOM and exposes `start_app()`.

use wasm_bindgen::prelude::*;

pub mod app;
pub mod document;
pub mod error;
pub mod input;
pub mod movement;
pub mod notify;
pub mod reminder;
pub mod session;
pub mod settings;
pub mod target;
pub mod timers;
pub mod web;

pub use app::{App, AvatarSlot, KeyOutcome};
pub use document::{DocumentViewer, RenderRequest};
pub use error::{AppError, ErrorKind};
pub use movement::{Position, RandomSource, Viewport};
pub use session::{FocusSession, SessionEvent, SessionSummary};
pub use settings::{CharacterKind, KeyValueStore, MemoryStore, Settings};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    web::init_logging(log::LevelFilter::Info);
}
