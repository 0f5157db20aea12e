//! # Tournament Clock
//!
//! A poker tournament clock engine: blind-level progression, countdown
//! timers, break handling, player/entry counts and prize-pool math, kept
//! consistent across viewers through a persistence and realtime fan-out
//! gateway.
//!
//! ## Architecture
//!
//! Each tournament is owned by a dedicated actor task with an mpsc inbox.
//! Operator actions (start, pause, next level, add player, ...) arrive as
//! messages; a one-second tick drives the countdown. The countdown is
//! deadline-based: the state carries an absolute wall-clock deadline for the
//! current level and the remaining time is always recomputed from it, so a
//! stalled scheduler never accumulates drift.
//!
//! ## Core Modules
//!
//! - [`structure`]: immutable tournament definitions (levels, blinds, payouts)
//! - [`clock`]: runtime state, timer engine, level transitions, actors
//! - [`store`]: persistence gateway (Postgres and in-memory implementations)
//!
//! ## Example
//!
//! ```
//! use tournament_clock::{ClockState, Structure};
//!
//! let structure = Structure::standard("Friday Deepstack".to_string(), 100, 100, 1_000);
//! let state = ClockState::new(&structure);
//! assert_eq!(state.current_level, 0);
//! ```

/// Immutable tournament structure definitions.
pub mod structure;
pub use structure::{Level, PayoutStructure, Structure, StructureError};

/// Runtime clock state, timer engine and tournament actors.
pub mod clock;
pub use clock::{
    ClockState, StateUpdate,
    actor::TournamentHandle,
    engine::{self, TickOutcome},
    manager::{ManagerError, TournamentManager},
    messages::{ClockMessage, ClockResponse, ClockSnapshot, OperatorAction, StateChangeNotification},
    state::prize_pool,
};

/// Persistence and realtime synchronization gateway.
pub mod store;
pub use store::{MemoryStore, StoreError, StoreResult, TournamentListing, TournamentStore};
