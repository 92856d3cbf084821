//! Stopwatch time source
//!
//! The stopwatch measures elapsed time while running and publishes whole
//! elapsed seconds to subscribers whenever that value changes. It is driven
//! by calling [`Stopwatch::tick`] at a regular cadence.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

/// Anything that reports elapsed seconds
pub trait TimeSource {
    /// Elapsed whole seconds; never decreases while running
    fn current_seconds(&self) -> u64;
}

/// Start/pause/reset stopwatch
pub struct Stopwatch {
    /// Set while running
    started_at: Option<Instant>,
    /// Time accumulated before the current run
    accumulated: Duration,
    seconds_tx: watch::Sender<u64>,
}

impl Stopwatch {
    pub fn new() -> Self {
        let (seconds_tx, _) = watch::channel(0);
        Self {
            started_at: None,
            accumulated: Duration::ZERO,
            seconds_tx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Start or resume; no-op while already running
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
            debug!(elapsed_ms = self.accumulated.as_millis() as u64, "Stopwatch started");
        }
    }

    /// Pause, keeping the elapsed time
    pub fn pause(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.accumulated += started.elapsed();
            debug!(elapsed_ms = self.accumulated.as_millis() as u64, "Stopwatch paused");
        }
        self.publish();
    }

    /// Stop and return to zero
    pub fn reset(&mut self) {
        self.started_at = None;
        self.accumulated = Duration::ZERO;
        self.publish();
        debug!("Stopwatch reset");
    }

    /// Total elapsed time
    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started) => self.accumulated + started.elapsed(),
            None => self.accumulated,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// Elapsed time as `MM:SS`, or `HH:MM:SS` from one hour on
    pub fn formatted_time(&self) -> String {
        format_seconds(self.current_seconds())
    }

    /// Receive elapsed seconds whenever the value changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.seconds_tx.subscribe()
    }

    /// Sample the clock and notify subscribers if the seconds value changed
    pub fn tick(&self) -> u64 {
        self.publish()
    }

    fn publish(&self) -> u64 {
        let seconds = self.current_seconds();
        self.seconds_tx.send_if_modified(|current| {
            if *current == seconds {
                false
            } else {
                *current = seconds;
                true
            }
        });
        seconds
    }
}

impl TimeSource for Stopwatch {
    fn current_seconds(&self) -> u64 {
        self.elapsed().as_secs()
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Format whole seconds as `MM:SS`, or `HH:MM:SS` from one hour on
pub fn format_seconds(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
