//! Tournament actor message types.

use super::state::ClockState;
use crate::structure::Level;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Operator actions accepted by a tournament clock.
///
/// This is the wire shape the server exposes; the actor maps each variant to
/// the corresponding state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperatorAction {
    /// Start the clock
    Start,
    /// Pause the countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Skip to the next level regardless of remaining time
    NextLevel,
    /// Skip the current break and resume at the next level
    SkipBreak,
    /// Reset the current level to its full duration
    ResetLevel,
    /// Register an initial entry
    AddPlayer,
    /// Register a paid re-entry
    AddReentry,
    /// Remove an eliminated player
    EliminatePlayer,
}

impl OperatorAction {
    /// Audit-log action name
    pub fn name(&self) -> &'static str {
        match self {
            OperatorAction::Start => "start",
            OperatorAction::Pause => "pause",
            OperatorAction::Resume => "resume",
            OperatorAction::NextLevel => "next_level",
            OperatorAction::SkipBreak => "skip_break",
            OperatorAction::ResetLevel => "reset_level",
            OperatorAction::AddPlayer => "add_player",
            OperatorAction::AddReentry => "add_reentry",
            OperatorAction::EliminatePlayer => "eliminate_player",
        }
    }
}

/// Messages that can be sent to a `TournamentActor`
#[derive(Debug)]
pub enum ClockMessage {
    /// Apply an operator action to the clock
    Action {
        action: OperatorAction,
        operator: String,
        response: oneshot::Sender<ClockResponse>,
    },

    /// Get a snapshot of the current state
    GetState {
        response: oneshot::Sender<ClockSnapshot>,
    },

    /// Subscribe to state change notifications
    Subscribe {
        viewer_id: Uuid,
        sender: mpsc::Sender<StateChangeNotification>,
    },

    /// Unsubscribe from state change notifications
    Unsubscribe { viewer_id: Uuid },

    /// Close the tournament (archive)
    Close {
        response: oneshot::Sender<ClockResponse>,
    },
}

/// Notification sent when the clock state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChangeNotification {
    /// Countdown or counts changed
    StateChanged,
    /// The clock moved to a different level
    LevelChanged,
    /// The tournament finished (ran past its last level)
    Finished,
}

/// Response from clock operations
#[derive(Debug, Clone)]
pub enum ClockResponse {
    /// Operation applied
    Success,

    /// Operation was a benign no-op (e.g. elimination with no players)
    Ignored(String),

    /// Operation failed
    Error(String),
}

impl ClockResponse {
    /// Whether the operation did not fail
    pub fn is_success(&self) -> bool {
        !matches!(self, ClockResponse::Error(_))
    }

    /// Error message, if the operation failed
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ClockResponse::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Snapshot of a tournament clock for viewers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockSnapshot {
    /// Tournament ID
    pub tournament_id: Uuid,
    /// Tournament name
    pub name: String,
    /// Full runtime state
    pub state: ClockState,
    /// The level the clock currently sits on
    pub level: Level,
    /// The level after the current one, if any
    pub next_level: Option<Level>,
    /// Total number of levels, breaks included
    pub total_levels: usize,
}
