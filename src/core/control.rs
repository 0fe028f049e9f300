use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopping,
    Done,
}

/// Cooperative cancellation shared between a session and whoever may stop it.
///
/// The session only looks at the flag between terms, so a term already in
/// progress always completes, related listings included.
#[derive(Debug, Clone)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
    state: Arc<RwLock<SessionState>>,
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StopHandle {
    pub fn new() -> Self {
        Self {
            requested: Arc::new(AtomicBool::new(false)),
            state: Arc::new(RwLock::new(SessionState::Idle)),
        }
    }

    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
        let mut state = self.state.write();
        if *state == SessionState::Running {
            *state = SessionState::Stopping;
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Moves `Idle` to `Running`, or straight to `Stopping` when a stop came
    /// in first. Returns false if the session already ran.
    pub(crate) fn begin(&self) -> bool {
        let mut state = self.state.write();
        if *state != SessionState::Idle {
            return false;
        }
        *state = if self.is_stop_requested() {
            SessionState::Stopping
        } else {
            SessionState::Running
        };
        true
    }

    pub(crate) fn finish(&self) {
        *self.state.write() = SessionState::Done;
    }
}
