//! Event Timer Library
//!
//! Alarm scheduling for a stopwatch-driven event timer. Discrete time-points
//! and an optional recurring auto alarm fire against an elapsed-seconds
//! signal; each firing flashes an indicator and plays the selected ringtone,
//! either a synthesized preset or a user-uploaded clip. Preferences such as
//! the ringtone library, alarm templates, theme and locale persist in a
//! key-value store.

pub mod alarm;
pub mod audio;
pub mod config;
pub mod context;
pub mod error;
pub mod flash;
pub mod id;
pub mod playback;
pub mod preferences;
pub mod ringtone;
pub mod stopwatch;
pub mod storage;
pub mod theme;
pub mod toast;

// Re-export commonly used types
pub use alarm::{
    follow_time_signal, AlarmEngine, AlarmHandler, AutoAlarmSettings, AutoAlarmUpdate,
    SilentHandler, TimePoint, Trigger, TriggerSource, MAX_RING_COUNT, MIN_RING_COUNT,
};
pub use audio::{AudioBackend, AudioError, ClipHandle, SoundConfig, Tone, Waveform};
pub use config::Config;
pub use context::{AppContext, RingingHandler};
pub use error::{AlarmError, ConfigError, StorageError, UploadError};
pub use flash::FlashIndicator;
pub use playback::PlaybackDriver;
pub use preferences::{AlarmTemplate, Locale, RingtonePreferences, TemplateStore};
pub use ringtone::{PresetRingtone, Ringtone, RingtoneKind, UploadFile};
pub use stopwatch::{Stopwatch, TimeSource};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use theme::{EffectiveTheme, ThemeMode, ThemePreference};
pub use toast::{Toast, ToastKind, ToastQueue};
