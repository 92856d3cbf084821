//! Transient visual flash raised whenever an alarm fires

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

/// How long the flash stays on after the most recent alarm
pub const DEFAULT_FLASH_DURATION: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct FlashState {
    flashing: AtomicBool,
    generation: AtomicU64,
}

/// Shared "is flashing" flag with a re-armable timeout
///
/// Flashing again while already flashing restarts the timeout; flashes are
/// neither queued nor counted.
#[derive(Debug, Clone)]
pub struct FlashIndicator {
    state: Arc<FlashState>,
    duration: Duration,
}

impl FlashIndicator {
    pub fn new(duration: Duration) -> Self {
        Self {
            state: Arc::new(FlashState::default()),
            duration,
        }
    }

    pub fn is_flashing(&self) -> bool {
        self.state.flashing.load(Ordering::SeqCst)
    }

    /// Turn the flash on and (re)arm its timeout
    ///
    /// Outside a tokio runtime the flag is set but never cleared automatically.
    pub fn flash(&self) {
        let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.flashing.store(true, Ordering::SeqCst);
        trace!(generation, "Flash armed");

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let state = self.state.clone();
        let duration = self.duration;
        runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            // A newer flash owns the flag now
            if state.generation.load(Ordering::SeqCst) == generation {
                state.flashing.store(false, Ordering::SeqCst);
            }
        });
    }

    /// Turn the flash off immediately
    pub fn clear(&self) {
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        self.state.flashing.store(false, Ordering::SeqCst);
    }
}

impl Default for FlashIndicator {
    fn default() -> Self {
        Self::new(DEFAULT_FLASH_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_flash_clears_after_duration() {
        let flash = FlashIndicator::default();
        assert!(!flash.is_flashing());

        flash.flash();
        assert!(flash.is_flashing());

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert!(flash.is_flashing());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!flash.is_flashing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reflash_rearms_timeout() {
        let flash = FlashIndicator::default();
        flash.flash();

        tokio::time::sleep(Duration::from_millis(700)).await;
        flash.flash();

        // The first timeout expires here but must not clear the newer flash
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(flash.is_flashing());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!flash.is_flashing());
    }

    #[test]
    fn test_flash_without_runtime() {
        let flash = FlashIndicator::default();
        flash.flash();
        assert!(flash.is_flashing());
        flash.clear();
        assert!(!flash.is_flashing());
    }
}
