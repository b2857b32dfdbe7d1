//! Application context: settings, focus session, and document viewer behind
//! one owner. The browser adapter holds exactly one `App`; tests build their
//! own with an in-memory store and a scripted clock.

use serde::Serialize;
use std::time::Duration;

use crate::document::{DocumentError, DocumentViewer, RenderRequest};
use crate::error::AppError;
use crate::input::{self, Shortcut};
use crate::movement::{RandomSource, Viewport};
use crate::session::{FocusSession, SessionEvent};
use crate::settings::{
    self, CharacterKind, CharacterLook, KeyValueStore, Settings, SettingsError, keys,
};

pub const GRADUATE_IMAGE: &str = "graduate.jpg";
/// Shown for `custom` when the stored avatar is missing.
pub const MISSING_AVATAR_EMOJI: &str = "🖼️";
pub const COMPANION_EMOJI: &str = "🐾";

/// Where an uploaded image is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AvatarSlot {
    /// The wandering character (enables [`CharacterKind::Custom`]).
    MovingCharacter,
    /// The companion mascot in the corner.
    Companion,
}

impl AvatarSlot {
    pub fn storage_key(&self) -> &'static str {
        match self {
            AvatarSlot::MovingCharacter => keys::MOVING_CHARACTER_AVATAR,
            AvatarSlot::Companion => keys::COMPANION_AVATAR,
        }
    }
}

/// What a key press did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyOutcome {
    /// Not a shortcut, or no document loaded.
    Ignored,
    /// Shortcut applied; nothing new to render (edge page, render queued).
    NoChange,
    Render(RenderRequest),
    FocusToggled { active: bool },
}

pub struct App<S: KeyValueStore> {
    store: S,
    settings: Settings,
    session: FocusSession,
    viewer: DocumentViewer,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(store: S, viewport: Viewport, rng: Box<dyn RandomSource>) -> Self {
        let settings = Settings::load(&store);
        log::debug!("loaded settings: {settings:?}");
        let session = FocusSession::new(&settings, viewport, rng);
        Self {
            store,
            settings,
            session,
            viewer: DocumentViewer::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> &FocusSession {
        &self.session
    }

    pub fn viewer(&self) -> &DocumentViewer {
        &self.viewer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.session.set_viewport(viewport);
    }

    /// Fire due timers and hand over everything that happened since the last
    /// call.
    pub fn advance(&mut self, now: Duration) -> Vec<SessionEvent> {
        self.session.advance_to(now);
        self.session.drain_events()
    }

    pub fn toggle_focus(&mut self, now: Duration) -> bool {
        self.session.toggle(now)
    }

    pub fn click_character(&mut self, now: Duration) -> bool {
        self.session.register_hit(now)
    }

    /// Leaving the page mid-session should be confirmed.
    pub fn confirm_before_leaving(&self) -> bool {
        self.session.is_active()
    }

    // --- Settings --------------------------------------------------------------

    pub fn set_reminder_interval(&mut self, now: Duration, raw: &str) -> Result<u32, AppError> {
        let secs = settings::validate_interval(settings::parse_seconds(raw)?)?;
        self.settings.reminder_interval_secs = secs;
        self.session
            .set_reminder_interval(now, self.settings.reminder_interval());
        self.persist(keys::REMINDER_INTERVAL, &secs);
        Ok(secs)
    }

    pub fn set_target_duration(&mut self, secs: u32) -> Result<u32, AppError> {
        let secs = settings::validate_target(secs)?;
        self.settings.target_duration_secs = secs;
        self.session
            .set_target_duration(self.settings.target_duration());
        self.persist(keys::FOCUS_TARGET_DURATION, &secs);
        Ok(secs)
    }

    pub fn set_character(&mut self, raw: &str) -> Result<CharacterKind, AppError> {
        let kind: CharacterKind = raw.parse()?;
        if kind == CharacterKind::Custom && self.avatar(AvatarSlot::MovingCharacter).is_none() {
            return Err(SettingsError::NoCustomAvatar.into());
        }
        self.settings.character = kind;
        self.persist(keys::CHARACTER_KIND, &kind);
        Ok(kind)
    }

    pub fn character_look(&self) -> CharacterLook {
        match self.settings.character {
            CharacterKind::Bug => CharacterLook::Emoji("🐛"),
            CharacterKind::Cat => CharacterLook::Emoji("🐱"),
            CharacterKind::Bird => CharacterLook::Emoji("🐦"),
            CharacterKind::Fish => CharacterLook::Emoji("🐠"),
            CharacterKind::Butterfly => CharacterLook::Emoji("🦋"),
            CharacterKind::Cockroach => CharacterLook::Emoji("🪳"),
            CharacterKind::Graduate => CharacterLook::Image(GRADUATE_IMAGE.to_string()),
            CharacterKind::Custom => self
                .avatar(AvatarSlot::MovingCharacter)
                .map(CharacterLook::Image)
                .unwrap_or(CharacterLook::Emoji(MISSING_AVATAR_EMOJI)),
        }
    }

    pub fn companion_look(&self) -> CharacterLook {
        self.avatar(AvatarSlot::Companion)
            .map(CharacterLook::Image)
            .unwrap_or(CharacterLook::Emoji(COMPANION_EMOJI))
    }

    // --- Onboarding --------------------------------------------------------------

    pub fn needs_onboarding(&self) -> bool {
        settings::is_first_visit(&self.store)
    }

    pub fn finish_onboarding(&mut self) {
        if let Err(err) = settings::mark_visited(&mut self.store) {
            log::warn!("{}", AppError::from(err));
        }
    }

    // --- Avatars -----------------------------------------------------------------

    pub fn check_avatar_upload(&self, mime: &str, size: u64) -> Result<(), AppError> {
        input::check_avatar(mime, size).map_err(AppError::from)
    }

    pub fn avatar(&self, slot: AvatarSlot) -> Option<String> {
        self.store
            .get(slot.storage_key())
            .filter(|url| !url.is_empty())
    }

    /// Store an already-validated image. Returns whether it was persisted.
    pub fn save_avatar(&mut self, slot: AvatarSlot, data_url: &str) -> bool {
        match self.store.set(slot.storage_key(), data_url) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("{}", AppError::from(err));
                false
            }
        }
    }

    /// Delete an avatar. Removing the character avatar while it is in use
    /// falls back to the default character, which is returned.
    pub fn remove_avatar(&mut self, slot: AvatarSlot) -> Option<CharacterKind> {
        if let Err(err) = self.store.remove(slot.storage_key()) {
            log::warn!("{}", AppError::from(err));
        }
        if slot == AvatarSlot::MovingCharacter && self.settings.character == CharacterKind::Custom
        {
            let fallback = CharacterKind::default();
            self.settings.character = fallback;
            self.persist(keys::CHARACTER_KIND, &fallback);
            return Some(fallback);
        }
        None
    }

    // --- Document ----------------------------------------------------------------

    pub fn check_document_upload(&self, mime: &str) -> Result<(), AppError> {
        input::check_document(mime).map_err(AppError::from)
    }

    pub fn document_loaded(&mut self, page_count: u32) -> Result<RenderRequest, AppError> {
        self.viewer.load(page_count).map_err(AppError::from)
    }

    pub fn document_failed(&self, reason: &str) -> AppError {
        let err = AppError::from(DocumentError::Backend(reason.to_string()));
        log::error!("{err}");
        err
    }

    pub fn page_rendered(&mut self) -> Option<RenderRequest> {
        self.viewer.render_finished()
    }

    pub fn prev_page(&mut self) -> Option<RenderRequest> {
        self.viewer.prev_page()
    }

    pub fn next_page(&mut self) -> Option<RenderRequest> {
        self.viewer.next_page()
    }

    pub fn zoom_in(&mut self) -> Option<RenderRequest> {
        self.viewer.zoom_in()
    }

    pub fn zoom_out(&mut self) -> Option<RenderRequest> {
        self.viewer.zoom_out()
    }

    /// Keyboard shortcuts only apply once a document is open.
    pub fn handle_key(&mut self, now: Duration, key: &str) -> KeyOutcome {
        if !self.viewer.is_loaded() {
            return KeyOutcome::Ignored;
        }
        let Some(shortcut) = Shortcut::from_key(key) else {
            return KeyOutcome::Ignored;
        };
        let render = match shortcut {
            Shortcut::PrevPage => self.prev_page(),
            Shortcut::NextPage => self.next_page(),
            Shortcut::ZoomIn => self.zoom_in(),
            Shortcut::ZoomOut => self.zoom_out(),
            Shortcut::ToggleFocus => {
                return KeyOutcome::FocusToggled {
                    active: self.toggle_focus(now),
                };
            }
        };
        render.map_or(KeyOutcome::NoChange, KeyOutcome::Render)
    }

    fn persist<T: Serialize>(&mut self, key: &str, value: &T) {
        if let Err(err) = settings::write_json(&mut self.store, key, value) {
            log::warn!("{}", AppError::from(err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::tests::ScriptedRandom;
    use crate::settings::MemoryStore;

    fn app_with(store: MemoryStore) -> App<MemoryStore> {
        App::new(
            store,
            Viewport::default(),
            Box::new(ScriptedRandom::new(&[0.3, 0.6])),
        )
    }

    #[test]
    fn interval_change_persists_and_validates() {
        let mut app = app_with(MemoryStore::new());
        assert_eq!(app.set_reminder_interval(Duration::ZERO, "45").unwrap(), 45);
        assert_eq!(app.store().get(keys::REMINDER_INTERVAL).as_deref(), Some("45"));
        assert!(matches!(
            app.set_reminder_interval(Duration::ZERO, "0"),
            Err(AppError::Settings(SettingsError::ZeroInterval))
        ));
        assert_eq!(app.settings().reminder_interval_secs, 45);
    }

    #[test]
    fn storage_failure_keeps_setting_in_memory() {
        let mut app = app_with(MemoryStore::read_only());
        assert_eq!(app.set_target_duration(300).unwrap(), 300);
        assert_eq!(app.settings().target_duration_secs, 300);
        assert!(app.store().is_empty());
    }

    #[test]
    fn custom_character_requires_avatar() {
        let mut app = app_with(MemoryStore::new());
        assert!(matches!(
            app.set_character("custom"),
            Err(AppError::Settings(SettingsError::NoCustomAvatar))
        ));
        assert!(app.save_avatar(AvatarSlot::MovingCharacter, "data:image/jpeg;base64,AA"));
        assert_eq!(app.set_character("custom").unwrap(), CharacterKind::Custom);
        assert_eq!(
            app.character_look(),
            CharacterLook::Image("data:image/jpeg;base64,AA".to_string())
        );

        assert_eq!(
            app.remove_avatar(AvatarSlot::MovingCharacter),
            Some(CharacterKind::Bug)
        );
        assert_eq!(app.character_look(), CharacterLook::Emoji("🐛"));
        assert_eq!(app.remove_avatar(AvatarSlot::Companion), None);
    }

    #[test]
    fn companion_falls_back_to_paw() {
        let mut app = app_with(MemoryStore::new());
        assert_eq!(app.companion_look(), CharacterLook::Emoji(COMPANION_EMOJI));
        app.save_avatar(AvatarSlot::Companion, "data:image/png;base64,BB");
        assert_eq!(
            app.companion_look(),
            CharacterLook::Image("data:image/png;base64,BB".to_string())
        );
    }

    #[test]
    fn shortcuts_need_a_document() {
        let mut app = app_with(MemoryStore::new());
        assert_eq!(app.handle_key(Duration::ZERO, " "), KeyOutcome::Ignored);
        assert!(!app.session().is_active());

        app.document_loaded(2).expect("load");
        assert_eq!(app.handle_key(Duration::ZERO, "ArrowRight"), KeyOutcome::NoChange);
        assert_eq!(
            app.page_rendered(),
            Some(RenderRequest { page: 2, scale: 1.0 })
        );
        assert_eq!(
            app.handle_key(Duration::ZERO, " "),
            KeyOutcome::FocusToggled { active: true }
        );
        assert_eq!(app.handle_key(Duration::ZERO, "q"), KeyOutcome::Ignored);
    }

    #[test]
    fn onboarding_flag() {
        let mut app = app_with(MemoryStore::new());
        assert!(app.needs_onboarding());
        app.finish_onboarding();
        assert!(!app.needs_onboarding());
    }
}
