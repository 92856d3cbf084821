//! Ringtone playback sequencing
//!
//! The driver turns "play this ringtone N times" into an awaitable sequence of
//! tones and clips with fixed spacing. Failures never propagate: an invalid
//! count is logged and ignored, and a custom clip that cannot be played falls
//! back to the default preset.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::alarm::{MAX_RING_COUNT, MIN_RING_COUNT};
use crate::audio::{AudioBackend, AudioError, ClipHandle};
use crate::ringtone::catalog::{self, PresetRingtone};
use crate::ringtone::{Ringtone, RingtoneKind};

/// Default delay between consecutive rings
pub const DEFAULT_RING_GAP: Duration = Duration::from_millis(500);

/// How often a playing clip is polled for completion
const CLIP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The single custom clip allowed to play at a time
struct ActiveClip {
    ringtone_id: String,
    handle: Arc<dyn ClipHandle>,
}

#[derive(Default)]
struct ClipState {
    active: Option<ActiveClip>,
    /// Bumped whenever a ringtone is stopped; sequences started under an
    /// older generation give up before their next ring
    stop_generations: HashMap<String, u64>,
}

impl ClipState {
    fn generation(&self, ringtone_id: &str) -> u64 {
        self.stop_generations.get(ringtone_id).copied().unwrap_or(0)
    }
}

/// Keeps a playback sequence counted as in flight until dropped
pub struct SequenceGuard {
    pending: Arc<watch::Sender<usize>>,
}

impl Drop for SequenceGuard {
    fn drop(&mut self) {
        self.pending.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Plays ringtones through an [`AudioBackend`]
pub struct PlaybackDriver {
    backend: Arc<dyn AudioBackend>,
    ring_gap: Duration,
    clips: Mutex<ClipState>,
    pending: Arc<watch::Sender<usize>>,
}

impl PlaybackDriver {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self::with_ring_gap(backend, DEFAULT_RING_GAP)
    }

    pub fn with_ring_gap(backend: Arc<dyn AudioBackend>, ring_gap: Duration) -> Self {
        let (pending, _) = watch::channel(0);
        Self {
            backend,
            ring_gap,
            clips: Mutex::new(ClipState::default()),
            pending: Arc::new(pending),
        }
    }

    /// Play `ringtone` `count` times, waiting the ring gap between rings
    ///
    /// `None` plays the default preset. Counts outside 1-5 are ignored. The
    /// sequence ends early if the ringtone is stopped with
    /// [`stop_ringtone`](Self::stop_ringtone).
    pub async fn play(&self, ringtone: Option<&Ringtone>, count: u32) {
        if !(MIN_RING_COUNT..=MAX_RING_COUNT).contains(&count) {
            warn!(
                count,
                "Invalid ring count, must be between {} and {}", MIN_RING_COUNT, MAX_RING_COUNT
            );
            return;
        }

        let generation = self.generation_of(ringtone);
        for i in 0..count {
            if self.is_stopped(ringtone, generation) {
                debug!(ring = i + 1, count, "Ringtone stopped, ending sequence");
                return;
            }

            self.play_ring(ringtone, generation).await;

            if i + 1 < count {
                tokio::time::sleep(self.ring_gap).await;
            }
        }
    }

    /// Play a single ring of `ringtone`
    pub async fn play_once(&self, ringtone: Option<&Ringtone>) {
        let generation = self.generation_of(ringtone);
        self.play_ring(ringtone, generation).await;
    }

    async fn play_ring(&self, ringtone: Option<&Ringtone>, generation: u64) {
        match ringtone {
            Some(ringtone) if ringtone.is_custom() => {
                if let Err(e) = self.play_custom(ringtone, generation).await {
                    error!(
                        ringtone = %ringtone.id,
                        error = %e,
                        "Failed to play custom ringtone, falling back to default"
                    );
                    self.play_preset(catalog::default_preset()).await;
                }
            }
            Some(ringtone) => self.play_preset(catalog::find_preset(&ringtone.id)).await,
            None => self.play_preset(catalog::default_preset()).await,
        }
    }

    /// Synthesize one ring of a preset
    pub async fn play_preset(&self, preset: &PresetRingtone) {
        let melody = preset.melody();

        for (i, &frequency) in melody.iter().enumerate() {
            if let Err(e) = self.backend.play_tone(&preset.tone(frequency)) {
                error!(ringtone = preset.id, error = %e, "Failed to play tone");
            }

            if i + 1 < melody.len() {
                tokio::time::sleep(preset.delay_after(i)).await;
            }
        }
    }

    /// Play a custom clip to completion, preempting any clip already playing
    async fn play_custom(&self, ringtone: &Ringtone, generation: u64) -> Result<(), AudioError> {
        if let RingtoneKind::Preset = ringtone.kind {
            return Err(AudioError::NoSource);
        }

        let data = ringtone.load_audio().await?;

        // Stop and start under one lock: at most one clip is ever live
        let handle = {
            let mut clips = self.clips.lock();
            if clips.generation(&ringtone.id) != generation {
                debug!(ringtone = %ringtone.id, "Ringtone stopped while loading");
                return Ok(());
            }
            if let Some(previous) = clips.active.take() {
                debug!(ringtone = %previous.ringtone_id, "Preempting custom ringtone");
                previous.handle.stop();
            }
            let handle = self.backend.play_clip(data)?;
            clips.active = Some(ActiveClip {
                ringtone_id: ringtone.id.clone(),
                handle: handle.clone(),
            });
            handle
        };
        debug!(ringtone = %ringtone.id, "Custom ringtone started");

        while !handle.is_finished() {
            tokio::time::sleep(CLIP_POLL_INTERVAL).await;
        }

        let mut clips = self.clips.lock();
        if clips
            .active
            .as_ref()
            .is_some_and(|clip| Arc::ptr_eq(&clip.handle, &handle))
        {
            clips.active = None;
        }

        Ok(())
    }

    /// Stop the custom clip currently playing, if any
    pub fn stop_current(&self) {
        if let Some(clip) = self.clips.lock().active.take() {
            debug!(ringtone = %clip.ringtone_id, "Stopping custom ringtone");
            clip.handle.stop();
        }
    }

    /// Stop every sequence of the given ringtone
    ///
    /// Sequences already running skip their remaining rings. Returns whether
    /// the ringtone was sounding at the time.
    pub fn stop_ringtone(&self, ringtone_id: &str) -> bool {
        let mut clips = self.clips.lock();
        *clips
            .stop_generations
            .entry(ringtone_id.to_string())
            .or_insert(0) += 1;

        match clips.active.take() {
            Some(clip) if clip.ringtone_id == ringtone_id => {
                debug!(ringtone = %ringtone_id, "Stopping custom ringtone");
                clip.handle.stop();
                true
            }
            other => {
                clips.active = other;
                false
            }
        }
    }

    /// Id of the custom ringtone currently playing
    pub fn current_clip(&self) -> Option<String> {
        self.clips
            .lock()
            .active
            .as_ref()
            .map(|clip| clip.ringtone_id.clone())
    }

    /// Count a sequence as in flight until the returned guard is dropped
    ///
    /// Taken before spawning a sequence so [`wait_idle`](Self::wait_idle)
    /// never misses one that has not been polled yet.
    pub fn track_sequence(&self) -> SequenceGuard {
        self.pending.send_modify(|n| *n += 1);
        SequenceGuard {
            pending: self.pending.clone(),
        }
    }

    /// Number of tracked sequences still playing
    pub fn pending_sequences(&self) -> usize {
        *self.pending.borrow()
    }

    /// Wait until every tracked sequence has finished
    pub async fn wait_idle(&self) {
        let mut idle = self.pending.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = idle.wait_for(|n| *n == 0).await;
    }

    fn generation_of(&self, ringtone: Option<&Ringtone>) -> u64 {
        ringtone.map_or(0, |r| self.clips.lock().generation(&r.id))
    }

    fn is_stopped(&self, ringtone: Option<&Ringtone>, generation: u64) -> bool {
        self.generation_of(ringtone) != generation
    }
}
