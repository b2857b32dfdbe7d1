//! User settings and the key-value store they persist to.
//!
//! Values are stored as JSON text under fixed keys (the browser build uses
//! `localStorage`). Avatar images are stored as raw data URLs. Missing or
//! malformed entries fall back to defaults; nothing is versioned.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_REMINDER_INTERVAL_SECS: u32 = 120;
pub const DEFAULT_TARGET_DURATION_SECS: u32 = 1800;

/// Storage keys. Shared with any page script that reads the same store.
pub mod keys {
    pub const FOCUS_TARGET_DURATION: &str = "focusTargetDuration";
    pub const REMINDER_INTERVAL: &str = "reminderInterval";
    pub const CHARACTER_KIND: &str = "characterKind";
    pub const MOVING_CHARACTER_AVATAR: &str = "movingCharacterAvatar";
    pub const COMPANION_AVATAR: &str = "companionAvatar";
    pub const FIRST_VISIT: &str = "firstVisit";
}

/// Target presets offered on the first visit: (seconds, label, blurb).
pub const TARGET_PRESETS: &[(u32, &str, &str)] = &[
    (60, "1 min", "Test run"),
    (300, "5 min", "Quick focus"),
    (900, "15 min", "Short focus"),
    (1800, "30 min", "Standard goal"),
    (2700, "45 min", "Deep focus"),
    (3600, "60 min", "Focus challenge"),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("reminder interval must be at least 1 second")]
    ZeroInterval,
    #[error("target duration must be at least 1 second")]
    ZeroTarget,
    #[error("'{0}' is not a whole number of seconds")]
    NotANumber(String),
    #[error("unknown character '{0}'")]
    UnknownCharacter(String),
    #[error("upload a custom avatar before choosing it")]
    NoCustomAvatar,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("failed to write '{key}': {reason}")]
    Write { key: String, reason: String },
    #[error("failed to encode '{key}'")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-process store for native builds and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail, for exercising storage errors.
    pub fn read_only() -> Self {
        Self {
            entries: HashMap::new(),
            read_only: true,
        }
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            read_only: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "store is read-only".to_string(),
            });
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "store is read-only".to_string(),
            });
        }
        self.entries.remove(key);
        Ok(())
    }
}

pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("ignoring malformed '{key}' in storage: {err}");
            None
        }
    }
}

pub fn write_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let encoded = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &encoded)
}

/// Which character walks across the page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterKind {
    #[default]
    Bug,
    Cat,
    Bird,
    Fish,
    Butterfly,
    Cockroach,
    Graduate,
    /// The user's uploaded avatar.
    Custom,
}

impl CharacterKind {
    pub const ALL: [CharacterKind; 8] = [
        CharacterKind::Bug,
        CharacterKind::Cat,
        CharacterKind::Bird,
        CharacterKind::Fish,
        CharacterKind::Butterfly,
        CharacterKind::Cockroach,
        CharacterKind::Graduate,
        CharacterKind::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CharacterKind::Bug => "bug",
            CharacterKind::Cat => "cat",
            CharacterKind::Bird => "bird",
            CharacterKind::Fish => "fish",
            CharacterKind::Butterfly => "butterfly",
            CharacterKind::Cockroach => "cockroach",
            CharacterKind::Graduate => "graduate",
            CharacterKind::Custom => "custom",
        }
    }
}

impl fmt::Display for CharacterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharacterKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CharacterKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SettingsError::UnknownCharacter(wanted.to_string()))
    }
}

/// How the character is drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CharacterLook {
    Emoji(&'static str),
    /// Image URL or data URL.
    Image(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub reminder_interval_secs: u32,
    pub target_duration_secs: u32,
    pub character: CharacterKind,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reminder_interval_secs: DEFAULT_REMINDER_INTERVAL_SECS,
            target_duration_secs: DEFAULT_TARGET_DURATION_SECS,
            character: CharacterKind::default(),
        }
    }
}

impl Settings {
    /// Read every setting, substituting defaults for missing or invalid ones.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Settings::default();
        let reminder_interval_secs = read_json::<u32>(store, keys::REMINDER_INTERVAL)
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.reminder_interval_secs);
        let target_duration_secs = read_json::<u32>(store, keys::FOCUS_TARGET_DURATION)
            .filter(|secs| *secs > 0)
            .unwrap_or(defaults.target_duration_secs);
        let character = read_json::<CharacterKind>(store, keys::CHARACTER_KIND)
            .filter(|kind| {
                *kind != CharacterKind::Custom || store.get(keys::MOVING_CHARACTER_AVATAR).is_some()
            })
            .unwrap_or(defaults.character);
        Self {
            reminder_interval_secs,
            target_duration_secs,
            character,
        }
    }

    pub fn reminder_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.reminder_interval_secs))
    }

    pub fn target_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.target_duration_secs))
    }
}

/// Parse a positive whole number of seconds from form input.
pub fn parse_seconds(raw: &str) -> Result<u32, SettingsError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| SettingsError::NotANumber(raw.trim().to_string()))
}

pub fn validate_interval(secs: u32) -> Result<u32, SettingsError> {
    if secs == 0 {
        return Err(SettingsError::ZeroInterval);
    }
    Ok(secs)
}

pub fn validate_target(secs: u32) -> Result<u32, SettingsError> {
    if secs == 0 {
        return Err(SettingsError::ZeroTarget);
    }
    Ok(secs)
}

pub fn is_first_visit(store: &dyn KeyValueStore) -> bool {
    !read_json::<bool>(store, keys::FIRST_VISIT).unwrap_or(false)
}

pub fn mark_visited(store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
    write_json(store, keys::FIRST_VISIT, &true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_for_empty_store() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());
        assert_eq!(Settings::default().reminder_interval(), Duration::from_secs(120));
        assert_eq!(Settings::default().target_duration(), Duration::from_secs(1800));
    }

    #[test]
    fn load_reads_stored_values() {
        let store = MemoryStore::with_entries([
            (keys::REMINDER_INTERVAL, "45"),
            (keys::FOCUS_TARGET_DURATION, "300"),
            (keys::CHARACTER_KIND, "\"cat\""),
        ]);
        let settings = Settings::load(&store);
        assert_eq!(settings.reminder_interval_secs, 45);
        assert_eq!(settings.target_duration_secs, 300);
        assert_eq!(settings.character, CharacterKind::Cat);
    }

    #[test]
    fn load_rejects_zero_and_garbage() {
        let store = MemoryStore::with_entries([
            (keys::REMINDER_INTERVAL, "0"),
            (keys::FOCUS_TARGET_DURATION, "soon"),
            (keys::CHARACTER_KIND, "\"dragon\""),
        ]);
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn custom_character_needs_stored_avatar() {
        let without = MemoryStore::with_entries([(keys::CHARACTER_KIND, "\"custom\"")]);
        assert_eq!(Settings::load(&without).character, CharacterKind::Bug);

        let with = MemoryStore::with_entries([
            (keys::CHARACTER_KIND, "\"custom\""),
            (keys::MOVING_CHARACTER_AVATAR, "data:image/jpeg;base64,AAAA"),
        ]);
        assert_eq!(Settings::load(&with).character, CharacterKind::Custom);
    }

    #[test]
    fn character_kind_parses_case_insensitively() {
        assert_eq!("Butterfly".parse::<CharacterKind>(), Ok(CharacterKind::Butterfly));
        assert_eq!(
            "unicorn".parse::<CharacterKind>(),
            Err(SettingsError::UnknownCharacter("unicorn".to_string()))
        );
    }

    #[test]
    fn parse_and_validate_seconds() {
        assert_eq!(parse_seconds(" 90 "), Ok(90));
        assert_eq!(
            parse_seconds("-3"),
            Err(SettingsError::NotANumber("-3".to_string()))
        );
        assert_eq!(validate_interval(0), Err(SettingsError::ZeroInterval));
        assert_eq!(validate_target(0), Err(SettingsError::ZeroTarget));
    }

    #[test]
    fn first_visit_flag_round_trip() {
        let mut store = MemoryStore::new();
        assert!(is_first_visit(&store));
        mark_visited(&mut store).expect("mark visited");
        assert!(!is_first_visit(&store));
    }

    #[test]
    fn read_only_store_reports_write_failure() {
        let mut store = MemoryStore::read_only();
        let err = write_json(&mut store, keys::REMINDER_INTERVAL, &30u32).expect_err("read-only");
        assert!(matches!(err, StoreError::Write { .. }));
    }
}
