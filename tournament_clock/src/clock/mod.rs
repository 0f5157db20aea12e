//! Tournament clock module: runtime state and the actors that drive it.
//!
//! This module implements:
//! - [`state`]: the mutable [`ClockState`], level transitions and prize-pool math
//! - [`engine`]: deadline-based countdown recomputation
//! - [`actor`]: a per-tournament actor with an mpsc inbox and a one-second tick
//! - [`manager`]: spawning and registry of tournament actors
//! - [`messages`]: actor message, response and notification types
//!
//! ## Architecture
//!
//! Each tournament runs in its own Tokio task. Operator actions and viewer
//! subscriptions arrive as messages; the tick interval drives the countdown.
//! Every mutation is diffed into a partial [`StateUpdate`], persisted through
//! the store, audited, and fanned out to subscribers.

pub mod actor;
pub mod engine;
pub mod manager;
pub mod messages;
pub mod state;

pub use actor::{TournamentActor, TournamentHandle};
pub use engine::TickOutcome;
pub use manager::{ManagerError, TournamentManager};
pub use messages::{
    ClockMessage, ClockResponse, ClockSnapshot, OperatorAction, StateChangeNotification,
};
pub use state::{ClockState, StateUpdate, prize_pool};
