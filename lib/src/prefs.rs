//! Preference flags kept in the browser's local storage.
//!
//! Only two keys are ever written: [`THEME_KEY`] and [`DEBUG_CONSOLE_KEY`].
//! The [`Storage`] trait stands in for `localStorage`; [`MemoryStorage`] is
//! an in-process implementation. [`Table`] records what [`Theme`] and
//! [`DebugConsole`] do for every stored value, for the page script.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;

pub const THEME_KEY: &str = "theme";
pub const DEBUG_CONSOLE_KEY: &str = "vconsole-enabled";

/// The mobile debug console script.
pub const VCONSOLE_SRC: &str = "https://unpkg.com/vconsole@latest/dist/vconsole.min.js";

/// String key/value storage.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: RwLock<FxHashMap<String, String>>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map.write().insert(key.to_owned(), value.to_owned());
    }

    fn clear(&self) {
        self.map.write().clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 2] = [Theme::Light, Theme::Dark];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// The stored theme; anything but `"dark"` is light.
    pub fn load(storage: &impl Storage) -> Theme {
        match storage.get(THEME_KEY).as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    /// Flips and stores the theme, returning the new one.
    ///
    /// ```rust
    /// use guidebook::prefs::{MemoryStorage, Storage, Theme};
    ///
    /// let storage = MemoryStorage::default();
    /// assert_eq!(Theme::toggle(&storage), Theme::Dark);
    /// assert_eq!(storage.get("theme").as_deref(), Some("dark"));
    /// assert_eq!(Theme::toggle(&storage), Theme::Light);
    /// ```
    pub fn toggle(storage: &impl Storage) -> Theme {
        let next = match Theme::load(storage) {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };

        storage.set(THEME_KEY, next.as_str());
        next
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the page must do after a debug console state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleAction {
    /// Inject [`VCONSOLE_SRC`] and create the console.
    Load,
    /// Destroy the existing console.
    Destroy,
    Nothing,
}

/// The on/off switch for the mobile debug console.
#[derive(Debug)]
pub struct DebugConsole<'s, S: Storage> {
    storage: &'s S,
    enabled: bool,
}

impl<'s, S: Storage> DebugConsole<'s, S> {
    /// Reads the stored flag. A stored `"true"` means the console should be
    /// loaded right away, which the returned action says.
    pub fn restore(storage: &'s S) -> (Self, ConsoleAction) {
        let enabled = storage.get(DEBUG_CONSOLE_KEY).as_deref() == Some(console_flag(true));
        let action = if enabled { ConsoleAction::Load } else { ConsoleAction::Nothing };
        (DebugConsole { storage, enabled }, action)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn toggle(&mut self) -> ConsoleAction {
        self.enabled = !self.enabled;
        self.storage.set(DEBUG_CONSOLE_KEY, console_flag(self.enabled));
        match self.enabled {
            true => ConsoleAction::Load,
            false => ConsoleAction::Destroy,
        }
    }

    /// Clears every stored preference, this one included.
    pub fn clear_cache(&mut self) {
        self.storage.clear();
        self.enabled = false;
    }
}

/// The stored value for the debug console flag.
fn console_flag(enabled: bool) -> &'static str {
    if enabled { "true" } else { "false" }
}

/// Actions keyed by the console's state after the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Actions {
    pub enabled: ConsoleAction,
    pub disabled: ConsoleAction,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThemeTable {
    pub key: &'static str,
    pub initial: BTreeMap<String, Theme>,
    /// Any stored value not in `initial` loads as this.
    pub fallback: Theme,
    pub next: BTreeMap<Theme, Theme>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsoleTable {
    pub key: &'static str,
    pub src: &'static str,
    /// The stored value that means "enabled".
    pub on: &'static str,
    pub off: &'static str,
    /// Run on page load.
    pub restore: Actions,
    /// Run after the switch is flipped.
    pub toggle: Actions,
}

/// Preference behavior as data, for the page script.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    pub theme: ThemeTable,
    pub console: ConsoleTable,
}

impl Table {
    /// Records the table by running [`Theme`] and [`DebugConsole`] against
    /// scratch storage.
    pub fn new() -> Table {
        let storage = MemoryStorage::default();
        let mut initial = BTreeMap::new();
        let mut next = BTreeMap::new();
        for theme in Theme::ALL {
            storage.set(THEME_KEY, theme.as_str());
            initial.insert(theme.as_str().to_owned(), Theme::load(&storage));
            next.insert(theme, Theme::toggle(&storage));
        }

        storage.clear();
        let fallback = Theme::load(&storage);

        let restore_with = |enabled: bool| {
            storage.set(DEBUG_CONSOLE_KEY, console_flag(enabled));
            DebugConsole::restore(&storage).1
        };

        let restore = Actions { enabled: restore_with(true), disabled: restore_with(false) };

        storage.clear();
        let (mut console, _) = DebugConsole::restore(&storage);
        let enabled = console.toggle();
        let disabled = console.toggle();

        Table {
            theme: ThemeTable { key: THEME_KEY, initial, fallback, next },
            console: ConsoleTable {
                key: DEBUG_CONSOLE_KEY,
                src: VCONSOLE_SRC,
                on: console_flag(true),
                off: console_flag(false),
                restore,
                toggle: Actions { enabled, disabled },
            },
        }
    }
}

impl Default for Table {
    fn default() -> Self {
        Table::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_toggle_persists() {
        let storage = MemoryStorage::default();
        let (mut console, action) = DebugConsole::restore(&storage);
        assert_eq!(action, ConsoleAction::Nothing);
        assert!(!console.is_enabled());

        assert_eq!(console.toggle(), ConsoleAction::Load);
        assert_eq!(storage.get(DEBUG_CONSOLE_KEY).as_deref(), Some("true"));

        let (_, action) = DebugConsole::restore(&storage);
        assert_eq!(action, ConsoleAction::Load);

        assert_eq!(console.toggle(), ConsoleAction::Destroy);
        assert_eq!(storage.get(DEBUG_CONSOLE_KEY).as_deref(), Some("false"));
    }

    #[test]
    fn clearing_drops_every_key() {
        let storage = MemoryStorage::default();
        Theme::toggle(&storage);
        let (mut console, _) = DebugConsole::restore(&storage);
        console.toggle();

        console.clear_cache();
        assert!(!console.is_enabled());
        assert_eq!(storage.get(THEME_KEY), None);
        assert_eq!(storage.get(DEBUG_CONSOLE_KEY), None);
        assert_eq!(Theme::load(&storage), Theme::Light);
    }

    #[test]
    fn unknown_theme_is_light() {
        let storage = MemoryStorage::default();
        storage.set(THEME_KEY, "sepia");
        assert_eq!(Theme::load(&storage), Theme::Light);
        assert_eq!(Theme::toggle(&storage).to_string(), "dark");
    }

    #[test]
    fn table_records_the_storage_rules() {
        let table = Table::new();
        assert_eq!(table.theme.next[&Theme::Light], Theme::Dark);
        assert_eq!(table.theme.next[&Theme::Dark], Theme::Light);
        assert_eq!(table.theme.initial["dark"], Theme::Dark);
        assert_eq!(table.theme.fallback, Theme::Light);
        assert_eq!(table.console.restore, Actions { enabled: ConsoleAction::Load, disabled: ConsoleAction::Nothing });
        assert_eq!(table.console.toggle, Actions { enabled: ConsoleAction::Load, disabled: ConsoleAction::Destroy });

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["theme"]["key"], "theme");
        assert_eq!(json["theme"]["next"]["light"], "dark");
        assert_eq!(json["console"]["on"], "true");
        assert_eq!(json["console"]["toggle"]["disabled"], "destroy");
    }
}
