//! Server lifecycle state machine.
//!
//! `Building → Built → Starting → Serving → Terminated`, forward only. Any
//! phase other than `Terminated` may jump straight to `Terminated` (a failed
//! build, a crash while serving). Nothing ever returns to `Building`.

use std::fmt;

use serde::Serialize;

use crate::domain::error::LifecycleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Building,
    Built,
    Starting,
    Serving,
    Terminated,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Built => "built",
            Self::Starting => "starting",
            Self::Serving => "serving",
            Self::Terminated => "terminated",
        }
    }

    /// The single forward successor, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Building => Some(Self::Built),
            Self::Built => Some(Self::Starting),
            Self::Starting => Some(Self::Serving),
            Self::Serving => Some(Self::Terminated),
            Self::Terminated => None,
        }
    }

    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        self.next() == Some(to) || (to == Self::Terminated && self != Self::Terminated)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the current phase and records the path taken.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    phase: Phase,
    history: Vec<Phase>,
}

impl Lifecycle {
    /// Lifecycle of a process that builds before serving.
    #[must_use]
    pub fn building() -> Self {
        Self::starting_at(Phase::Building)
    }

    /// Lifecycle entered at `phase`, for processes that skip earlier stages
    /// (the launch stage starts at `Built`: the image already exists).
    #[must_use]
    pub fn starting_at(phase: Phase) -> Self {
        Self {
            phase,
            history: vec![phase],
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    /// Move to `to`.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::InvalidTransition` for backward, skipping, or
    /// self transitions.
    pub fn advance(&mut self, to: Phase) -> Result<(), LifecycleError> {
        if !self.phase.can_transition_to(to) {
            return Err(LifecycleError::InvalidTransition {
                from: self.phase.to_string(),
                to: to.to_string(),
            });
        }
        tracing::info!(from = %self.phase, to = %to, "lifecycle transition");
        self.phase = to;
        self.history.push(to);
        Ok(())
    }

    /// Move to `Terminated` unless already there.
    pub fn terminate(&mut self) {
        if self.phase != Phase::Terminated {
            tracing::info!(from = %self.phase, "lifecycle terminated");
            self.phase = Phase::Terminated;
            self.history.push(Phase::Terminated);
        }
    }
}
