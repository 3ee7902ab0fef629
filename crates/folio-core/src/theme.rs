//! Light/dark theme preference.
//!
//! The preference is the only state that survives a reload. Every change is
//! written through to the [`PreferenceStore`] and mirrored onto the
//! [`DocumentRoot`] as a `dark` class marker. Storage failures never reach
//! the user: a failed read means `Light`, a failed write is logged and
//! forgotten.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::event::{EngineEvent, EventBus};
use crate::storage::PreferenceStore;

/// Class applied to the document root while the dark theme is active.
pub const DARK_CLASS: &str = "dark";

/// Theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    /// Stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The other preference.
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized stored values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown theme: {0}")]
pub struct UnknownTheme(pub String);

impl FromStr for ThemePreference {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(UnknownTheme(other.to_string())),
        }
    }
}

/// Class markers on the rendered document root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentRoot {
    classes: BTreeSet<String>,
}

impl DocumentRoot {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn set_class(&mut self, class: &str, present: bool) {
        if present {
            self.classes.insert(class.to_string());
        } else {
            self.classes.remove(class);
        }
    }
}

/// Process-wide theme preference backed by durable storage.
pub struct ThemeStore {
    store: Box<dyn PreferenceStore>,
    key: String,
    current: ThemePreference,
    root: DocumentRoot,
    events: Option<EventBus>,
}

impl ThemeStore {
    /// Opens the store, reading the persisted preference.
    ///
    /// The loaded (or default) value is written back immediately so storage
    /// and the document root agree from the start.
    pub fn open(store: impl PreferenceStore + 'static, key: impl Into<String>) -> Self {
        let key = key.into();
        let current = match store.load(&key) {
            Ok(Some(value)) => value.parse().unwrap_or_else(|err| {
                tracing::debug!("Ignoring stored theme: {}", err);
                ThemePreference::default()
            }),
            Ok(None) => ThemePreference::default(),
            Err(err) => {
                tracing::debug!("Theme storage unreadable, using default: {}", err);
                ThemePreference::default()
            }
        };

        let mut theme = Self {
            store: Box::new(store),
            key,
            current,
            root: DocumentRoot::default(),
            events: None,
        };
        theme.sync();
        theme
    }

    /// Attaches an event bus that receives `ThemeChanged` notifications.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Returns the current preference.
    pub fn get(&self) -> ThemePreference {
        self.current
    }

    /// Flips the preference and returns the new value.
    pub fn toggle(&mut self) -> ThemePreference {
        self.set(self.current.toggled());
        self.current
    }

    /// Sets the preference.
    pub fn set(&mut self, preference: ThemePreference) {
        let changed = preference != self.current;
        self.current = preference;
        self.sync();

        if changed {
            tracing::debug!("Theme changed to {}", preference);
            if let Some(events) = &self.events {
                events.emit(EngineEvent::ThemeChanged(preference));
            }
        }
    }

    /// The document root as last re-classed.
    pub fn root(&self) -> &DocumentRoot {
        &self.root
    }

    fn sync(&mut self) {
        self.root.set_class(DARK_CLASS, self.current.is_dark());
        if let Err(err) = self.store.save(&self.key, self.current.as_str()) {
            tracing::warn!("Could not persist theme preference: {}", err);
        }
    }
}

impl fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeStore")
            .field("key", &self.key)
            .field("current", &self.current)
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError, StorageResult};
    use std::sync::Arc;

    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn load(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Unavailable)
        }

        fn save(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable)
        }
    }

    #[test]
    fn test_defaults_to_light_and_persists() {
        let storage = Arc::new(MemoryStore::new());
        let theme = ThemeStore::open(Arc::clone(&storage), "theme");

        assert_eq!(theme.get(), ThemePreference::Light);
        assert!(!theme.root().has_class(DARK_CLASS));
        assert_eq!(storage.load("theme").unwrap(), Some("light".to_string()));
    }

    #[test]
    fn test_restores_stored_preference() {
        let theme = ThemeStore::open(MemoryStore::with_entry("theme", "dark"), "theme");
        assert_eq!(theme.get(), ThemePreference::Dark);
        assert!(theme.root().has_class(DARK_CLASS));
    }

    #[test]
    fn test_garbage_value_falls_back() {
        let theme = ThemeStore::open(MemoryStore::with_entry("theme", "sepia"), "theme");
        assert_eq!(theme.get(), ThemePreference::Light);
    }

    #[test]
    fn test_toggle_twice_round_trips() {
        let storage = Arc::new(MemoryStore::new());
        let mut theme = ThemeStore::open(Arc::clone(&storage), "theme");
        let original = theme.get();

        assert_eq!(theme.toggle(), ThemePreference::Dark);
        assert!(theme.root().has_class(DARK_CLASS));
        assert_eq!(storage.load("theme").unwrap(), Some("dark".to_string()));

        assert_eq!(theme.toggle(), original);
        assert!(!theme.root().has_class(DARK_CLASS));
        assert_eq!(
            storage.load("theme").unwrap(),
            Some(theme.get().as_str().to_string())
        );
    }

    #[test]
    fn test_reload_restores_last_choice() {
        let storage = Arc::new(MemoryStore::new());
        let mut theme = ThemeStore::open(Arc::clone(&storage), "theme");
        theme.toggle();
        drop(theme);

        let reloaded = ThemeStore::open(Arc::clone(&storage), "theme");
        assert_eq!(reloaded.get(), ThemePreference::Dark);
    }

    #[test]
    fn test_broken_storage_is_absorbed() {
        let mut theme = ThemeStore::open(BrokenStore, "theme");
        assert_eq!(theme.get(), ThemePreference::Light);

        assert_eq!(theme.toggle(), ThemePreference::Dark);
        assert!(theme.root().has_class(DARK_CLASS));
    }

    #[tokio::test]
    async fn test_toggle_emits_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let mut theme = ThemeStore::open(MemoryStore::new(), "theme").with_events(bus);

        theme.toggle();
        assert_eq!(
            rx.recv().await.unwrap(),
            EngineEvent::ThemeChanged(ThemePreference::Dark)
        );
    }
}
