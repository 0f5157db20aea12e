//! Deadline-based countdown engine.
//!
//! The tick never counts: it recomputes the remaining time from the absolute
//! level deadline stored in the state, so a suspended or throttled scheduler
//! resumes with the correct value instead of a drifted one. Expiry fires the
//! level transition exactly once — the transition itself installs the next
//! deadline (or stops the clock), so a second tick at the same instant finds
//! nothing left to expire.

use super::state::{ClockState, remaining_secs};
use crate::structure::Structure;
use chrono::{DateTime, Duration, Utc};

/// Result of a single clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Clock not counting (stopped or paused); nothing changed.
    Idle,
    /// Remaining time recomputed, level unchanged.
    Counting,
    /// The current level expired and the transition ran.
    LevelExpired,
}

/// Advance the clock by recomputing the remaining time at `now`.
///
/// A running state that has lost its deadline (e.g. freshly loaded from the
/// store) is re-armed from its frozen remaining time instead of expiring.
pub fn tick(structure: &Structure, state: &mut ClockState, now: DateTime<Utc>) -> TickOutcome {
    if !state.is_counting() {
        return TickOutcome::Idle;
    }

    let Some(deadline) = state.level_deadline else {
        state.level_deadline = Some(now + Duration::seconds(i64::from(state.time_remaining_secs)));
        return TickOutcome::Counting;
    };

    state.time_remaining_secs = remaining_secs(deadline, now);
    if state.time_remaining_secs == 0 {
        state.advance_level(structure, now);
        TickOutcome::LevelExpired
    } else {
        TickOutcome::Counting
    }
}
