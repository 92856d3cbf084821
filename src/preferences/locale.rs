//! Interface language selection

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::storage::KeyValueStore;

/// Storage key of the chosen locale
pub const LOCALE_STORAGE_KEY: &str = "user-locale";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "zh-TW")]
    ZhTw,
    #[serde(rename = "en")]
    En,
}

impl Locale {
    pub const SUPPORTED: [Locale; 2] = [Locale::ZhTw, Locale::En];

    pub fn tag(self) -> &'static str {
        match self {
            Locale::ZhTw => "zh-TW",
            Locale::En => "en",
        }
    }

    /// Exact tag lookup
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::SUPPORTED.into_iter().find(|l| l.tag() == tag)
    }

    /// Pick the best supported locale for a system locale string
    ///
    /// Exact match first, then a match on the language subtag
    /// (`zh-CN` picks `zh-TW`), otherwise the default.
    pub fn negotiate(system: &str) -> Self {
        let system = system.trim().replace('_', "-");
        // POSIX locales may carry an encoding suffix such as `.UTF-8`
        let system = system.split('.').next().unwrap_or_default();

        if let Some(locale) = Self::from_tag(system) {
            return locale;
        }

        let language = system.split('-').next().unwrap_or_default();
        Self::SUPPORTED
            .into_iter()
            .find(|l| l.tag().split('-').next() == Some(language))
            .unwrap_or_default()
    }

    /// Stored choice if valid, otherwise negotiated from `system`
    pub fn load(store: &dyn KeyValueStore, system: &str) -> Self {
        match store.get(LOCALE_STORAGE_KEY) {
            Ok(Some(stored)) => {
                if let Some(locale) = Self::from_tag(stored.trim()) {
                    return locale;
                }
            }
            Ok(None) => {}
            Err(e) => error!(error = %e, "Failed to load locale"),
        }
        Self::negotiate(system)
    }

    pub fn save(self, store: &dyn KeyValueStore) {
        if let Err(e) = store.set(LOCALE_STORAGE_KEY, self.tag()) {
            error!(error = %e, locale = self.tag(), "Failed to save locale");
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_negotiate() {
        assert_eq!(Locale::negotiate("en"), Locale::En);
        assert_eq!(Locale::negotiate("en-US"), Locale::En);
        assert_eq!(Locale::negotiate("en_GB.UTF-8"), Locale::En);
        assert_eq!(Locale::negotiate("zh-HK"), Locale::ZhTw);
        assert_eq!(Locale::negotiate("fr-FR"), Locale::ZhTw);
        assert_eq!(Locale::negotiate(""), Locale::ZhTw);
    }

    #[test]
    fn test_stored_locale_wins() {
        let store = MemoryStore::new();
        Locale::En.save(&store);
        assert_eq!(Locale::load(&store, "zh-TW"), Locale::En);

        store.set(LOCALE_STORAGE_KEY, "klingon").unwrap();
        assert_eq!(Locale::load(&store, "zh-CN"), Locale::ZhTw);
    }
}
