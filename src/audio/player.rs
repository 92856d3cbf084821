//! Audio backend implementation using rodio

use std::io::Cursor;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, info};

use super::{AudioBackend, AudioError, ClipHandle, Tone, SAMPLE_RATE};

/// rodio-backed audio output
///
/// rodio's `OutputStream` cannot leave the thread that created it, so a
/// dedicated thread owns the stream for as long as the backend is alive.
pub struct RodioBackend {
    stream_handle: OutputStreamHandle,
    volume: f32,
    _keepalive: mpsc::Sender<()>,
}

impl RodioBackend {
    /// Open the default output device
    pub fn new(volume: f32) -> Result<Self, AudioError> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (keepalive_tx, keepalive_rx) = mpsc::channel::<()>();

        std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    let _ = ready_tx.send(Ok(handle));
                    // Returns once the backend (and its sender) is dropped
                    let _ = keepalive_rx.recv();
                    drop(stream);
                    debug!("Audio output stream closed");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(AudioError::StreamError(e.to_string())));
                }
            })
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        let stream_handle = ready_rx.recv().map_err(|_| AudioError::NotAvailable)??;

        info!("Audio backend initialized");

        Ok(Self {
            stream_handle,
            volume: volume.clamp(0.0, 1.0),
            _keepalive: keepalive_tx,
        })
    }

    fn sink(&self) -> Result<Sink, AudioError> {
        Sink::try_new(&self.stream_handle).map_err(|e| AudioError::StreamError(e.to_string()))
    }
}

impl AudioBackend for RodioBackend {
    fn play_tone(&self, tone: &Tone) -> Result<(), AudioError> {
        debug!(
            frequency = tone.frequency,
            waveform = ?tone.waveform,
            "Playing tone"
        );

        let source = SamplesSource::new(tone.samples(SAMPLE_RATE, self.volume), SAMPLE_RATE);
        let sink = self.sink()?;
        sink.append(source);
        sink.detach();

        Ok(())
    }

    fn play_clip(&self, data: Vec<u8>) -> Result<Arc<dyn ClipHandle>, AudioError> {
        debug!(bytes = data.len(), "Playing audio clip");

        let source =
            Decoder::new(Cursor::new(data)).map_err(|e| AudioError::DecodeError(e.to_string()))?;

        let sink = self.sink()?;
        sink.set_volume(self.volume);
        sink.append(source);

        Ok(Arc::new(SinkClip(sink)))
    }
}

/// Handle to a clip playing on its own sink
struct SinkClip(Sink);

impl ClipHandle for SinkClip {
    fn is_finished(&self) -> bool {
        self.0.empty()
    }

    fn stop(&self) {
        self.0.stop();
    }
}

/// Simple samples-based audio source for generated tones
struct SamplesSource {
    samples: Vec<f32>,
    position: usize,
    sample_rate: u32,
}

impl SamplesSource {
    fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            position: 0,
            sample_rate,
        }
    }
}

impl Iterator for SamplesSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.samples.get(self.position).copied()?;
        self.position += 1;
        Some(sample)
    }
}

impl Source for SamplesSource {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.samples.len() - self.position)
    }

    fn channels(&self) -> u16 {
        1 // Mono
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        let samples_remaining = self.samples.len() - self.position;
        Some(Duration::from_secs_f32(
            samples_remaining as f32 / self.sample_rate as f32,
        ))
    }
}
