//! Ringtone selection and custom ringtone library

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::UploadError;
use crate::ringtone::{
    encode_data_url, validate_upload, Ringtone, UploadFile, DEFAULT_RINGTONE_ID, PRESET_RINGTONES,
};
use crate::storage::{load_json, save_json, KeyValueStore};

/// Storage key of the ringtone settings
pub const RINGTONE_STORAGE_KEY: &str = "event-timer-ringtone-settings";

/// Persisted form of the ringtone preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RingtoneSettings {
    #[serde(default = "default_ringtone_id")]
    pub selected_ringtone_id: String,
    #[serde(default)]
    pub custom_ringtones: Vec<Ringtone>,
}

fn default_ringtone_id() -> String {
    DEFAULT_RINGTONE_ID.to_string()
}

impl Default for RingtoneSettings {
    fn default() -> Self {
        Self {
            selected_ringtone_id: default_ringtone_id(),
            custom_ringtones: Vec::new(),
        }
    }
}

/// Selected ringtone and custom ringtone list, saved after every change
pub struct RingtonePreferences {
    store: Arc<dyn KeyValueStore>,
    settings: RingtoneSettings,
}

impl RingtonePreferences {
    /// Load the stored settings, falling back to defaults
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mut settings: RingtoneSettings =
            load_json(store.as_ref(), RINGTONE_STORAGE_KEY).unwrap_or_default();

        let before = settings.custom_ringtones.len();
        settings.custom_ringtones.retain(Ringtone::is_custom);
        if settings.custom_ringtones.len() != before {
            warn!(
                dropped = before - settings.custom_ringtones.len(),
                "Ignoring stored custom ringtones without custom audio"
            );
        }
        if settings.selected_ringtone_id.is_empty() {
            settings.selected_ringtone_id = default_ringtone_id();
        }

        Self { store, settings }
    }

    pub fn settings(&self) -> &RingtoneSettings {
        &self.settings
    }

    pub fn custom_ringtones(&self) -> &[Ringtone] {
        &self.settings.custom_ringtones
    }

    /// Presets in catalog order, then custom ringtones in insertion order
    pub fn all_ringtones(&self) -> Vec<Ringtone> {
        PRESET_RINGTONES
            .iter()
            .map(Ringtone::preset)
            .chain(self.settings.custom_ringtones.iter().cloned())
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<Ringtone> {
        self.all_ringtones().into_iter().find(|r| r.id == id)
    }

    pub fn selected_id(&self) -> &str {
        &self.settings.selected_ringtone_id
    }

    /// The selected ringtone, or the default preset if the id is stale
    pub fn selected_ringtone(&self) -> Ringtone {
        self.find(&self.settings.selected_ringtone_id)
            .unwrap_or_else(Ringtone::default_preset)
    }

    /// Select a ringtone; unknown ids are ignored
    pub fn select(&mut self, id: &str) -> bool {
        if self.find(id).is_none() {
            warn!(id, "Ignoring selection of unknown ringtone");
            return false;
        }
        self.settings.selected_ringtone_id = id.to_string();
        self.save();
        true
    }

    /// Validate an upload and add it as a custom ringtone
    pub fn add_custom(&mut self, file: &UploadFile, name: &str) -> Result<Ringtone, UploadError> {
        let name = validate_upload(file, name)?;
        let ringtone = Ringtone::custom(&name, encode_data_url(&file.mime_type, &file.contents));
        info!(id = %ringtone.id, name = %ringtone.name, size = file.size, "Added custom ringtone");

        self.settings.custom_ringtones.push(ringtone.clone());
        self.save();
        Ok(ringtone)
    }

    /// Remove a custom ringtone, reselecting the default if it was selected
    pub fn remove_custom(&mut self, id: &str) -> Option<Ringtone> {
        let index = self
            .settings
            .custom_ringtones
            .iter()
            .position(|r| r.id == id)?;

        let removed = self.settings.custom_ringtones.remove(index);
        if self.settings.selected_ringtone_id == id {
            self.settings.selected_ringtone_id = default_ringtone_id();
        }
        info!(id, "Removed custom ringtone");
        self.save();
        Some(removed)
    }

    fn save(&self) {
        save_json(self.store.as_ref(), RINGTONE_STORAGE_KEY, &self.settings);
    }
}
