//! Silent backend used when audio is disabled or unavailable

use std::sync::Arc;

use tracing::debug;

use super::{AudioBackend, AudioError, ClipHandle, Tone};

/// Backend that produces no sound
///
/// Tones succeed silently so alarm bookkeeping is unaffected; clips report
/// [`AudioError::NotAvailable`] so custom ringtones fall back to a preset.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentBackend;

impl AudioBackend for SilentBackend {
    fn play_tone(&self, tone: &Tone) -> Result<(), AudioError> {
        debug!(
            frequency = tone.frequency,
            duration_ms = tone.duration.as_millis() as u64,
            "Audio playback skipped (no output)"
        );
        Ok(())
    }

    fn play_clip(&self, _data: Vec<u8>) -> Result<Arc<dyn ClipHandle>, AudioError> {
        Err(AudioError::NotAvailable)
    }
}
