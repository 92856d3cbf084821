//! User preferences backed by a [`KeyValueStore`](crate::storage::KeyValueStore)

pub mod locale;
pub mod ringtones;
pub mod templates;

pub use locale::{Locale, LOCALE_STORAGE_KEY};
pub use ringtones::{RingtonePreferences, RingtoneSettings, RINGTONE_STORAGE_KEY};
pub use templates::{builtin_templates, AlarmTemplate, TemplateStore, TEMPLATE_STORAGE_KEY};
