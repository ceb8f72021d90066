//! Display that forwards notifications into a tokio channel.
//!
//! Several cards can share one sender; every event is stamped with the
//! emitting card so the receiver can demultiplex.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use super::DisplayAdapter;
use crate::domain::{EventKind, RunStatus, StatusEvent, Step, StepStatus};

/// Forwards every notification as a `StatusEvent`
#[derive(Debug, Clone)]
pub struct ChannelDisplay {
    card: String,
    sender: UnboundedSender<StatusEvent>,
}

impl ChannelDisplay {
    /// Create a display for `card` sending into an existing channel
    pub fn new(card: impl Into<String>, sender: UnboundedSender<StatusEvent>) -> Self {
        Self {
            card: card.into(),
            sender,
        }
    }

    /// Create a display together with the receiving end of its channel
    pub fn channel(card: impl Into<String>) -> (Self, UnboundedReceiver<StatusEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(card, sender), receiver)
    }

    fn forward(&self, kind: EventKind) {
        if self.sender.send(StatusEvent::new(self.card.clone(), kind)).is_err() {
            debug!(card = %self.card, "Display receiver dropped, discarding event");
        }
    }
}

impl DisplayAdapter for ChannelDisplay {
    fn name(&self) -> &str {
        "channel"
    }

    fn on_status_change(&self, status: &RunStatus, attempt: u32) {
        self.forward(EventKind::Status {
            status: status.clone(),
            attempt,
        });
    }

    fn on_step_change(&self, index: usize, step: &Step, status: StepStatus) {
        self.forward(EventKind::Step {
            index,
            name: step.name.clone(),
            status,
        });
    }
}
