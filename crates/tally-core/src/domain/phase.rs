//! Task lifecycle phase derived from the remote system's raw state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse lifecycle phase of a tracked task.
///
/// Phase transitions are driven entirely by the remote raw state: every
/// update recomputes the phase from the latest snapshot, so there is no
/// transition table to enforce here. The only distinction that matters to
/// callers is terminal vs. non-terminal.
///
/// Design note: Using an enum (not the raw state string) ensures exhaustive
/// matching where transitions are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Record created, no snapshot folded in yet.
    #[default]
    Pending,

    /// Remote system accepted the task (raw state "submitted").
    Assigned,

    /// Remote system is executing the task (raw state "working").
    Running,

    /// Task is blocked waiting for user input.
    InputRequired,

    /// Task is blocked waiting for authentication.
    AuthRequired,

    /// Finished successfully.
    Completed,

    /// Finished unsuccessfully (also covers remote "rejected").
    Failed,

    /// Cancelled before completion.
    Cancelled,

    /// Raw state not in the known vocabulary (including empty).
    Unknown,
}

impl Phase {
    /// Map a remote raw state to a phase. Total: any string is accepted.
    pub fn from_raw_state(raw_state: &str) -> Self {
        match raw_state {
            "submitted" => Phase::Assigned,
            "working" => Phase::Running,
            "input-required" => Phase::InputRequired,
            "auth-required" => Phase::AuthRequired,
            "completed" => Phase::Completed,
            "failed" => Phase::Failed,
            // The remote vocabulary uses the single-l spelling.
            "canceled" => Phase::Cancelled,
            "rejected" => Phase::Failed,
            _ => Phase::Unknown,
        }
    }

    /// Is this a terminal phase (no further changes expected)?
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed | Phase::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Pending => "pending",
            Phase::Assigned => "assigned",
            Phase::Running => "running",
            Phase::InputRequired => "input-required",
            Phase::AuthRequired => "auth-required",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
            Phase::Cancelled => "cancelled",
            Phase::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
