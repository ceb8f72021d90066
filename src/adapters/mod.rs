//! Display adapters for gallery cards.
//!
//! A display receives pushed notifications from exactly one runner and
//! decides how to present them. Runners never poll displays and never
//! hand them errors other than as a terminal status value.

pub mod card;
pub mod channel;
pub mod terminal;

use crate::domain::{RunStatus, Step, StepStatus};

// Re-export the concrete displays
pub use card::Card;
pub use channel::ChannelDisplay;
pub use terminal::TerminalDisplay;

/// Presentation-side receiver of runner notifications
///
/// Callbacks run while the runner holds its state lock, which keeps them
/// in transition order. Implementations must return quickly and must not
/// call back into the runner.
pub trait DisplayAdapter: Send + Sync {
    /// Human-readable display name
    fn name(&self) -> &str;

    /// Run status or attempt changed
    fn on_status_change(&self, status: &RunStatus, attempt: u32);

    /// A step's status changed
    fn on_step_change(&self, index: usize, step: &Step, status: StepStatus) {
        let _ = (index, step, status);
    }
}

/// Display that discards every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplayAdapter for NullDisplay {
    fn name(&self) -> &str {
        "null"
    }

    fn on_status_change(&self, _status: &RunStatus, _attempt: u32) {}
}
