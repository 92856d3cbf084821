//! Transient toast notifications

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default time a toast stays visible
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
}

#[derive(Debug, Default)]
struct ToastState {
    toasts: Mutex<Vec<Toast>>,
    next_id: AtomicU64,
}

/// Shared queue of visible toasts
///
/// Clones share the same queue.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    state: Arc<ToastState>,
    duration: Duration,
}

impl ToastQueue {
    pub fn new(duration: Duration) -> Self {
        Self {
            state: Arc::new(ToastState::default()),
            duration,
        }
    }

    /// Show a toast for the default duration and return its id
    pub fn show(&self, message: impl Into<String>, kind: ToastKind) -> u64 {
        self.show_for(message, kind, self.duration)
    }

    /// Show a toast that is removed after `duration`
    ///
    /// Outside a tokio runtime the toast stays until removed explicitly.
    pub fn show_for(&self, message: impl Into<String>, kind: ToastKind, duration: Duration) -> u64 {
        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst);
        let toast = Toast {
            id,
            message: message.into(),
            kind,
        };
        debug!(id, kind = ?toast.kind, message = %toast.message, "Toast shown");
        self.state.toasts.lock().push(toast);

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let queue = self.clone();
            runtime.spawn(async move {
                tokio::time::sleep(duration).await;
                queue.remove(id);
            });
        }

        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.show(message, ToastKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.show(message, ToastKind::Error)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.show(message, ToastKind::Info)
    }

    /// Remove a toast; unknown ids are ignored
    pub fn remove(&self, id: u64) -> bool {
        let mut toasts = self.state.toasts.lock();
        match toasts.iter().position(|t| t.id == id) {
            Some(index) => {
                toasts.remove(index);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the visible toasts, oldest first
    pub fn toasts(&self) -> Vec<Toast> {
        self.state.toasts.lock().clone()
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}
