/// Dispatch phase definitions for tracking round progress
use std::fmt;

/// Represents where the dispatcher is within a round
///
/// `Idle -> Draining` on round start, `Draining -> Quiescent` once no queue
/// holds work and nothing is in flight. `stop()` returns to `Idle` from any
/// phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DispatchPhase {
    /// No round has been started since creation or the last stop
    #[default]
    Idle,

    /// A round is running: queues are being drained and tasks are in flight
    Draining,

    /// The round finished; terminal until the next round starts
    Quiescent,
}

impl DispatchPhase {
    /// Returns true while the admission loop may start new tasks
    pub fn is_draining(&self) -> bool {
        matches!(self, Self::Draining)
    }

    /// Returns true if the phase accepts a transition to `next`
    pub fn can_transition_to(&self, next: DispatchPhase) -> bool {
        match (self, next) {
            (_, Self::Idle) => true,
            (_, Self::Draining) => true,
            (Self::Draining, Self::Quiescent) => true,
            _ => false,
        }
    }

    /// Returns a lowercase name for logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Draining => "draining",
            Self::Quiescent => "quiescent",
        }
    }
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
