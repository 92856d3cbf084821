//! Shared application context
//!
//! One [`AppContext`] is built at startup and handed out as an `Arc` to
//! everything that needs the selected ringtone, the playback driver, the
//! flash indicator, the toast queue or stored preferences.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use parking_lot::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::alarm::{AlarmEngine, AlarmHandler, Trigger};
use crate::audio::{default_backend, AudioBackend};
use crate::config::Config;
use crate::error::{AlarmResult, UploadError};
use crate::flash::FlashIndicator;
use crate::playback::PlaybackDriver;
use crate::preferences::{AlarmTemplate, Locale, RingtonePreferences, TemplateStore};
use crate::ringtone::{Ringtone, UploadFile};
use crate::storage::{FileStore, KeyValueStore};
use crate::theme::ThemePreference;
use crate::toast::ToastQueue;

pub struct AppContext {
    config: Config,
    store: Arc<dyn KeyValueStore>,
    driver: Arc<PlaybackDriver>,
    flash: FlashIndicator,
    toasts: ToastQueue,
    ringtones: Arc<Mutex<RingtonePreferences>>,
    templates: Mutex<TemplateStore>,
    theme: Mutex<ThemePreference>,
    locale: Mutex<Locale>,
}

impl AppContext {
    /// Build a context over an explicit store and audio backend
    pub fn new(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn AudioBackend>,
    ) -> Arc<Self> {
        let system_locale = std::env::var("LANG").unwrap_or_default();

        Arc::new(Self {
            driver: Arc::new(PlaybackDriver::with_ring_gap(backend, config.ring_gap())),
            flash: FlashIndicator::new(config.flash_duration()),
            toasts: ToastQueue::new(config.toast_duration()),
            ringtones: Arc::new(Mutex::new(RingtonePreferences::load(store.clone()))),
            templates: Mutex::new(TemplateStore::load(store.clone())),
            theme: Mutex::new(ThemePreference::load(store.clone())),
            locale: Mutex::new(Locale::load(store.as_ref(), &system_locale)),
            store,
            config,
        })
    }

    /// Build the context from configuration, opening the on-disk store and
    /// the default audio output
    pub fn init(config: Config) -> Result<Arc<Self>> {
        let data_dir = config.data_dir().context("Failed to locate data directory")?;
        let store = FileStore::open(&data_dir)
            .with_context(|| format!("Failed to open store at {}", data_dir.display()))?;
        let backend = default_backend(&config.sound);

        info!(data_dir = %data_dir.display(), "Event timer context initialized");
        Ok(Self::new(config, Arc::new(store), backend))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn driver(&self) -> &Arc<PlaybackDriver> {
        &self.driver
    }

    pub fn flash(&self) -> &FlashIndicator {
        &self.flash
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn ringtones(&self) -> MutexGuard<'_, RingtonePreferences> {
        self.ringtones.lock()
    }

    pub fn templates(&self) -> MutexGuard<'_, TemplateStore> {
        self.templates.lock()
    }

    pub fn theme(&self) -> MutexGuard<'_, ThemePreference> {
        self.theme.lock()
    }

    pub fn locale(&self) -> Locale {
        *self.locale.lock()
    }

    pub fn set_locale(&self, locale: Locale) {
        *self.locale.lock() = locale;
        locale.save(self.store.as_ref());
    }

    /// Handler that flashes and rings the selected ringtone
    pub fn alarm_handler(&self) -> Arc<RingingHandler> {
        Arc::new(RingingHandler {
            driver: self.driver.clone(),
            ringtones: self.ringtones.clone(),
            flash: self.flash.clone(),
        })
    }

    /// New engine wired to this context's alarm handler
    pub fn alarm_engine(&self) -> AlarmEngine {
        AlarmEngine::new(self.alarm_handler())
    }

    /// Validate and store an upload, reporting the outcome as a toast
    pub fn add_custom_ringtone(&self, file: &UploadFile, name: &str) -> Result<Ringtone, UploadError> {
        match self.ringtones.lock().add_custom(file, name) {
            Ok(ringtone) => {
                self.toasts.success("toast.ringtoneAdded");
                Ok(ringtone)
            }
            Err(e) => {
                warn!(file = %file.file_name, error = %e, "Rejected custom ringtone");
                self.toasts.error(format!("toast.{}", e.key()));
                Err(e)
            }
        }
    }

    /// Remove a custom ringtone, silencing it and any of its pending rings
    pub fn remove_custom_ringtone(&self, id: &str) -> bool {
        let removed = self.ringtones.lock().remove_custom(id).is_some();
        if removed {
            self.driver.stop_ringtone(id);
        }
        removed
    }

    /// Play one ring of any ringtone outside of an alarm
    pub async fn preview_ringtone(&self, id: &str) {
        let ringtone = self.ringtones.lock().find(id);
        match ringtone {
            Some(ringtone) => self.driver.play_once(Some(&ringtone)).await,
            None => warn!(id, "Cannot preview unknown ringtone"),
        }
    }

    /// Save the engine's configuration as a user template
    pub fn save_template(&self, name: &str, engine: &AlarmEngine) -> AlarmResult<AlarmTemplate> {
        let result = AlarmTemplate::from_engine(name, engine).and_then(|template| {
            self.templates.lock().add(template.clone())?;
            Ok(template)
        });

        match &result {
            Ok(_) => self.toasts.success("toast.templateSaved"),
            Err(e) => self.toasts.error(format!("toast.{}", e.key())),
        };
        result
    }

    /// Load a stored template into `engine`
    pub fn apply_template(&self, id: &str, engine: &mut AlarmEngine) -> AlarmResult<()> {
        let template = self.templates.lock().find(id)?;
        engine.apply_template(&template)
    }
}

/// Fires alarms by flashing and playing the selected ringtone
pub struct RingingHandler {
    driver: Arc<PlaybackDriver>,
    ringtones: Arc<Mutex<RingtonePreferences>>,
    flash: FlashIndicator,
}

impl AlarmHandler for RingingHandler {
    fn fire(&self, trigger: &Trigger) {
        self.flash.flash();

        let ringtone = self.ringtones.lock().selected_ringtone();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(ringtone = %ringtone.id, "No async runtime, alarm will be silent");
            return;
        };

        let driver = self.driver.clone();
        let sequence = driver.track_sequence();
        let ring_count = trigger.ring_count;
        runtime.spawn(async move {
            let _sequence = sequence;
            driver.play(Some(&ringtone), ring_count).await;
        });
    }
}
