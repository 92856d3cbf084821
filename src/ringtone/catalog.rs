//! Built-in synthesized ringtones

use std::time::Duration;

use crate::audio::{Tone, Waveform};

/// Id of the ringtone used when nothing else is selected or resolvable
pub const DEFAULT_RINGTONE_ID: &str = "preset-classic";

/// Delay between melody notes when the pattern has no usable entry
const FALLBACK_NOTE_DELAY_MS: u64 = 300;

/// Synthesis parameters for a preset ringtone
#[derive(Debug, Clone, PartialEq)]
pub struct PresetRingtone {
    pub id: &'static str,
    /// Message key resolved to a display name by the UI
    pub name_key: &'static str,
    /// Base frequency, used when there is no melody
    pub frequency: f32,
    pub waveform: Waveform,
    pub duration_ms: u64,
    /// Delays between consecutive notes, cycled when shorter than the melody
    pub pattern_ms: &'static [u64],
    pub notes: Option<&'static [f32]>,
}

impl PresetRingtone {
    /// Frequencies played for one ring, in order
    pub fn melody(&self) -> &[f32] {
        match self.notes {
            Some(notes) if !notes.is_empty() => notes,
            _ => std::slice::from_ref(&self.frequency),
        }
    }

    /// Tone for the note at `frequency`
    pub fn tone(&self, frequency: f32) -> Tone {
        Tone {
            frequency,
            duration: Duration::from_millis(self.duration_ms),
            waveform: self.waveform,
        }
    }

    /// Delay to wait after note `index` before the next one
    pub fn delay_after(&self, index: usize) -> Duration {
        let ms = match self.pattern_ms.len() {
            0 => FALLBACK_NOTE_DELAY_MS,
            len => match self.pattern_ms[index % len] {
                0 => FALLBACK_NOTE_DELAY_MS,
                ms => ms,
            },
        };
        Duration::from_millis(ms)
    }

    /// Total time one ring takes, from first note start to last note end
    pub fn ring_duration(&self) -> Duration {
        let notes = self.melody().len();
        let gaps: Duration = (0..notes.saturating_sub(1)).map(|i| self.delay_after(i)).sum();
        gaps + Duration::from_millis(self.duration_ms)
    }
}

pub static PRESET_RINGTONES: &[PresetRingtone] = &[
    PresetRingtone {
        id: "preset-classic",
        name_key: "ringtone.classic",
        frequency: 800.0,
        waveform: Waveform::Sine,
        duration_ms: 200,
        pattern_ms: &[300],
        notes: None,
    },
    PresetRingtone {
        id: "preset-gentle",
        name_key: "ringtone.gentle",
        frequency: 523.0, // C5
        waveform: Waveform::Sine,
        duration_ms: 400,
        pattern_ms: &[500],
        notes: Some(&[523.0, 659.0, 784.0]), // C5, E5, G5
    },
    PresetRingtone {
        id: "preset-alert",
        name_key: "ringtone.alert",
        frequency: 1000.0,
        waveform: Waveform::Square,
        duration_ms: 150,
        pattern_ms: &[100, 100],
        notes: None,
    },
    PresetRingtone {
        id: "preset-chime",
        name_key: "ringtone.chime",
        frequency: 880.0, // A5
        waveform: Waveform::Triangle,
        duration_ms: 500,
        pattern_ms: &[600],
        notes: Some(&[880.0, 1047.0, 1319.0, 1568.0]), // A5, C6, E6, G6
    },
    PresetRingtone {
        id: "preset-digital",
        name_key: "ringtone.digital",
        frequency: 1200.0,
        waveform: Waveform::Sawtooth,
        duration_ms: 100,
        pattern_ms: &[80, 80, 200],
        notes: None,
    },
];

/// Look up a preset by id, falling back to the first (default) preset
pub fn find_preset(id: &str) -> &'static PresetRingtone {
    PRESET_RINGTONES
        .iter()
        .find(|p| p.id == id)
        .unwrap_or(&PRESET_RINGTONES[0])
}

/// The default preset
pub fn default_preset() -> &'static PresetRingtone {
    find_preset(DEFAULT_RINGTONE_ID)
}

/// Whether `id` names a built-in preset
pub fn is_preset_id(id: &str) -> bool {
    PRESET_RINGTONES.iter().any(|p| p.id == id)
}
