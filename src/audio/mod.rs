//! Audio output for alarms
//!
//! This module is the black-box "play a tone" / "play this clip" capability
//! the playback driver builds on. With the `audio` feature enabled, sound goes
//! through rodio; otherwise a silent backend logs and does nothing.

#[cfg(feature = "audio")]
mod player;

#[cfg(feature = "audio")]
pub use player::RodioBackend;

mod stub;

pub use stub::SilentBackend;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Peak gain of a synthesized tone before volume scaling
pub const TONE_GAIN: f32 = 0.3;

/// Gain a synthesized tone decays to by the end of its duration
pub const TONE_FLOOR_GAIN: f32 = 0.01;

/// Sample rate used for synthesized tones
pub const SAMPLE_RATE: u32 = 44_100;

/// Errors that can occur during audio playback
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to create output stream: {0}")]
    StreamError(String),

    #[error("Failed to decode audio: {0}")]
    DecodeError(String),

    #[error("No audio source available")]
    NoSource,

    #[error("Failed to load audio: {0}")]
    LoadError(#[from] std::io::Error),

    #[error("Audio system not available")]
    NotAvailable,
}

/// Oscillator shape for synthesized tones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    /// Oscillator value in [-1, 1] at `phase` cycles
    pub fn sample(self, phase: f32) -> f32 {
        let frac = phase.fract();
        match self {
            Waveform::Sine => (frac * std::f32::consts::TAU).sin(),
            Waveform::Square => {
                if frac < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (frac - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * frac - 1.0,
        }
    }
}

/// One synthesized tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency: f32,
    pub duration: Duration,
    pub waveform: Waveform,
}

impl Tone {
    /// Render the tone as mono samples with an exponential decay envelope
    pub fn samples(&self, sample_rate: u32, volume: f32) -> Vec<f32> {
        let seconds = self.duration.as_secs_f32();
        let count = (sample_rate as f32 * seconds) as usize;
        let decay = (TONE_FLOOR_GAIN / TONE_GAIN).ln();

        (0..count)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                let progress = if seconds > 0.0 { t / seconds } else { 1.0 };
                let envelope = TONE_GAIN * (decay * progress).exp();
                self.waveform.sample(t * self.frequency) * envelope * volume
            })
            .collect()
    }
}

/// A clip that is currently playing
pub trait ClipHandle: Send + Sync {
    /// Whether the clip has played to the end or been stopped
    fn is_finished(&self) -> bool;

    /// Stop playback immediately
    fn stop(&self);
}

/// Low-level sound output
pub trait AudioBackend: Send + Sync {
    /// Start a tone; returns without waiting for it to finish
    fn play_tone(&self, tone: &Tone) -> Result<(), AudioError>;

    /// Start playing an encoded clip (mp3/wav/ogg)
    fn play_clip(&self, data: Vec<u8>) -> Result<Arc<dyn ClipHandle>, AudioError>;
}

/// Sound configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundConfig {
    /// Whether sound is enabled
    #[serde(default = "default_sound_enabled")]
    pub enabled: bool,

    /// Volume level (0.0 to 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_sound_enabled() -> bool {
    true
}

fn default_volume() -> f32 {
    0.8
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.8,
        }
    }
}

/// Pick the best available backend for `config`
///
/// Falls back to [`SilentBackend`] when sound is disabled or no output
/// device can be opened.
pub fn default_backend(config: &SoundConfig) -> Arc<dyn AudioBackend> {
    if !config.enabled {
        info!("Sound disabled in configuration");
        return Arc::new(SilentBackend);
    }

    #[cfg(feature = "audio")]
    {
        match RodioBackend::new(config.volume) {
            Ok(backend) => return Arc::new(backend),
            Err(e) => {
                tracing::warn!(error = %e, "Audio output unavailable, alarms will be silent");
            }
        }
    }

    Arc::new(SilentBackend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_config_default() {
        let config = SoundConfig::default();
        assert!(config.enabled);
        assert_eq!(config.volume, 0.8);
    }

    #[test]
    fn test_waveform_ranges() {
        for waveform in [
            Waveform::Sine,
            Waveform::Square,
            Waveform::Triangle,
            Waveform::Sawtooth,
        ] {
            for step in 0..100 {
                let value = waveform.sample(step as f32 / 37.0);
                assert!((-1.0..=1.0).contains(&value), "{:?} out of range", waveform);
            }
        }
        assert_eq!(Waveform::Square.sample(0.25), 1.0);
        assert_eq!(Waveform::Square.sample(0.75), -1.0);
        assert_eq!(Waveform::Triangle.sample(0.5), 1.0);
    }

    #[test]
    fn test_tone_samples_decay() {
        let tone = Tone {
            frequency: 800.0,
            duration: Duration::from_millis(200),
            waveform: Waveform::Square,
        };
        let samples = tone.samples(SAMPLE_RATE, 1.0);
        assert!((8819..=8820).contains(&samples.len()));

        let head = samples[0].abs();
        let tail = samples[samples.len() - 1].abs();
        assert!((head - TONE_GAIN).abs() < 1e-3);
        assert!(tail < 0.02);
    }

    #[test]
    fn test_disabled_sound_uses_silent_backend() {
        let config = SoundConfig {
            enabled: false,
            volume: 0.5,
        };
        let backend = default_backend(&config);
        assert!(backend.play_clip(vec![1, 2, 3]).is_err());
    }
}
