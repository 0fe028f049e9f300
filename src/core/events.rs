use crate::ScraperResult;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Signals a run sends to whoever presents it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Started { total: usize },
    Progress {
        rows: usize,
        term: String,
        outcome: String,
    },
    Done { rows: usize, stopped: bool },
}

impl SessionEvent {
    /// One JSON object per event, for shells that read progress from stdout.
    pub fn to_json_line(&self) -> ScraperResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Sending half of the progress channel. A dropped receiver is not an error:
/// the run carries on without an audience.
#[derive(Debug, Clone, Default)]
pub struct EventSender(Option<UnboundedSender<SessionEvent>>);

impl EventSender {
    pub fn new(sender: UnboundedSender<SessionEvent>) -> Self {
        Self(Some(sender))
    }

    pub fn silent() -> Self {
        Self(None)
    }

    pub fn send(&self, event: SessionEvent) {
        if let Some(sender) = &self.0 {
            let _ = sender.send(event);
        }
    }
}

impl From<UnboundedSender<SessionEvent>> for EventSender {
    fn from(sender: UnboundedSender<SessionEvent>) -> Self {
        Self::new(sender)
    }
}
