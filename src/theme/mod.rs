//! Theme preference
//!
//! The user picks `light`, `dark` or `auto`. `auto` follows the system
//! appearance, which the host reports through [`ThemePreference::set_system_dark`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::storage::KeyValueStore;

/// Storage key of the theme preference
pub const THEME_STORAGE_KEY: &str = "user-theme";

/// Theme selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    Auto,
}

impl ThemeMode {
    /// Parse a stored theme name; unknown names yield `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Theme actually applied after resolving `auto`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveTheme {
    Light,
    Dark,
}

/// Persisted theme choice plus the current system appearance
pub struct ThemePreference {
    store: Arc<dyn KeyValueStore>,
    mode: ThemeMode,
    system_dark: bool,
}

impl ThemePreference {
    /// Load the stored mode, ignoring missing or invalid values
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mode = match store.get(THEME_STORAGE_KEY) {
            Ok(Some(raw)) => ThemeMode::from_name(raw.trim()).unwrap_or_else(|| {
                debug!(value = %raw, "Ignoring unknown stored theme");
                ThemeMode::default()
            }),
            Ok(None) => ThemeMode::default(),
            Err(e) => {
                error!(error = %e, "Failed to load theme");
                ThemeMode::default()
            }
        };

        Self {
            store,
            mode,
            system_dark: false,
        }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    /// Report whether the system prefers a dark appearance
    pub fn set_system_dark(&mut self, dark: bool) {
        self.system_dark = dark;
    }

    pub fn effective(&self) -> EffectiveTheme {
        match self.mode {
            ThemeMode::Light => EffectiveTheme::Light,
            ThemeMode::Dark => EffectiveTheme::Dark,
            ThemeMode::Auto if self.system_dark => EffectiveTheme::Dark,
            ThemeMode::Auto => EffectiveTheme::Light,
        }
    }

    pub fn set_mode(&mut self, mode: ThemeMode) {
        self.mode = mode;
        if let Err(e) = self.store.set(THEME_STORAGE_KEY, mode.as_str()) {
            error!(error = %e, "Failed to save theme");
        }
    }

    /// Switch to the opposite of the effective theme as an explicit choice
    pub fn toggle(&mut self) -> ThemeMode {
        let next = match self.effective() {
            EffectiveTheme::Light => ThemeMode::Dark,
            EffectiveTheme::Dark => ThemeMode::Light,
        };
        self.set_mode(next);
        next
    }
}
