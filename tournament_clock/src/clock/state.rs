//! Runtime tournament state, level transitions and prize-pool math.

use crate::structure::Structure;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Compute the prize pool from collected fees and the guaranteed minimum.
///
/// `max(entries * buy_in + reentries * reentry_fee, guaranteed)`
pub fn prize_pool(entries: u32, reentries: u32, guaranteed: i64, buy_in: i64, reentry_fee: i64) -> i64 {
    let collected = i64::from(entries) * buy_in + i64::from(reentries) * reentry_fee;
    collected.max(guaranteed)
}

/// Mutable runtime state of a tournament clock.
///
/// Owned by exactly one tournament actor and shared read-only with viewers.
/// While the clock is counting, `level_deadline` holds the absolute
/// wall-clock instant the current level expires; `time_remaining_secs` is
/// always recomputed from it so missed ticks never accumulate drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockState {
    /// Tournament ID
    pub tournament_id: Uuid,
    /// Index into the structure's level list
    pub current_level: usize,
    /// Seconds left in the current level
    pub time_remaining_secs: u32,
    /// Whether the tournament has been started and not finished
    pub is_running: bool,
    /// Whether the countdown is paused (meaningful only while running)
    pub is_paused: bool,
    /// Mirrors `structure.levels[current_level].is_break`, except in the
    /// terminal state: a finished tournament is never "on break" even when
    /// the index still points at a final break level.
    pub is_on_break: bool,
    /// Players still seated
    pub players: u32,
    /// Initial entries
    pub entries: u32,
    /// Paid re-entries
    pub reentries: u32,
    /// Current prize pool, never stale
    pub prize_pool: i64,
    /// When the tournament was first started
    pub started_at: Option<DateTime<Utc>>,
    /// Wall-clock expiry of the current level while counting
    pub level_deadline: Option<DateTime<Utc>>,
}

impl ClockState {
    /// Initial state for a freshly created tournament.
    pub fn new(structure: &Structure) -> Self {
        let first = structure.levels.first();
        Self {
            tournament_id: structure.id,
            current_level: 0,
            time_remaining_secs: first.map_or(0, |l| l.duration_secs()),
            is_running: false,
            is_paused: false,
            is_on_break: first.is_some_and(|l| l.is_break),
            players: 0,
            entries: 0,
            reentries: 0,
            prize_pool: structure.guaranteed_prize_pool,
            started_at: None,
            level_deadline: None,
        }
    }

    /// Whether the countdown is actively counting.
    pub fn is_counting(&self) -> bool {
        self.is_running && !self.is_paused
    }

    /// Start the clock. No-op when already running.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.is_running {
            return;
        }
        self.is_running = true;
        self.is_paused = false;
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.arm_deadline(now);
    }

    /// Pause the countdown, freezing the remaining time.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if !self.is_counting() {
            return;
        }
        if let Some(deadline) = self.level_deadline {
            self.time_remaining_secs = remaining_secs(deadline, now);
        }
        self.is_paused = true;
        self.level_deadline = None;
    }

    /// Resume a paused countdown from the frozen remaining time.
    pub fn resume(&mut self, now: DateTime<Utc>) {
        if !self.is_running || !self.is_paused {
            return;
        }
        self.is_paused = false;
        self.arm_deadline(now);
    }

    /// Advance to the next level.
    ///
    /// Used both for automatic advancement on expiry and for a manual "next
    /// level", which skips ahead regardless of remaining time. Past the last
    /// level the index stays put, the clock stops and no further ticks have
    /// any effect. Entering a break pauses the countdown until an operator
    /// resumes or skips it.
    pub fn advance_level(&mut self, structure: &Structure, now: DateTime<Utc>) {
        let next = self.current_level + 1;
        let Some(level) = structure.level(next) else {
            // Terminal: tournament finished.
            self.is_running = false;
            self.is_paused = false;
            self.is_on_break = false;
            self.time_remaining_secs = 0;
            self.level_deadline = None;
            return;
        };

        self.current_level = next;
        self.time_remaining_secs = level.duration_secs();
        self.is_on_break = level.is_break;
        self.is_paused = level.is_break;
        self.level_deadline = None;
        if self.is_counting() {
            self.arm_deadline(now);
        }
    }

    /// Skip the current break, resuming the countdown at the next level.
    ///
    /// Returns `false` (no state change) when not on a break, or when the
    /// following level is itself a break: adjacent breaks are refused rather
    /// than silently chained through.
    pub fn skip_break(&mut self, structure: &Structure, now: DateTime<Utc>) -> bool {
        if !self.is_on_break {
            return false;
        }
        let next = self.current_level + 1;
        if structure.level(next).is_some_and(|l| l.is_break) {
            log::warn!(
                "Tournament {}: refusing to skip into an adjacent break at level {}",
                self.tournament_id,
                next + 1
            );
            return false;
        }
        let Some(level) = structure.level(next) else {
            // Break was the last level; skipping it ends the tournament.
            self.is_running = false;
            self.is_paused = false;
            self.is_on_break = false;
            self.time_remaining_secs = 0;
            self.level_deadline = None;
            return true;
        };

        self.current_level = next;
        self.time_remaining_secs = level.duration_secs();
        self.is_on_break = false;
        // Unlike a natural advance, skipping a break auto-resumes.
        self.is_paused = false;
        self.level_deadline = None;
        if self.is_counting() {
            self.arm_deadline(now);
        }
        true
    }

    /// Reset the current level to its full duration.
    ///
    /// The level index and the running/paused flags are untouched.
    pub fn reset_level(&mut self, structure: &Structure, now: DateTime<Utc>) {
        let Some(level) = structure.level(self.current_level) else {
            return;
        };
        self.time_remaining_secs = level.duration_secs();
        self.level_deadline = None;
        if self.is_counting() {
            self.arm_deadline(now);
        }
    }

    /// Register an initial entry: one more player, one more entry, pool
    /// recomputed.
    pub fn add_player(&mut self, structure: &Structure) {
        self.entries += 1;
        self.players += 1;
        self.recompute_prize_pool(structure);
    }

    /// Register a paid re-entry: one more player, one more re-entry, pool
    /// recomputed.
    pub fn add_reentry(&mut self, structure: &Structure) {
        self.reentries += 1;
        self.players += 1;
        self.recompute_prize_pool(structure);
    }

    /// Remove an eliminated player. Eliminations never refund, so the pool
    /// is unchanged. Returns `false` (benign no-op) when nobody is seated.
    pub fn eliminate_player(&mut self) -> bool {
        if self.players == 0 {
            log::debug!(
                "Tournament {}: elimination ignored, no players seated",
                self.tournament_id
            );
            return false;
        }
        self.players -= 1;
        true
    }

    /// Recompute the prize pool from the current counts.
    pub fn recompute_prize_pool(&mut self, structure: &Structure) {
        self.prize_pool = prize_pool(
            self.entries,
            self.reentries,
            structure.guaranteed_prize_pool,
            structure.buy_in,
            structure.reentry_fee,
        );
    }

    /// Merge a partial update, overwriting exactly the fields it carries.
    pub fn merge(&mut self, update: &StateUpdate) {
        if let Some(v) = update.current_level {
            self.current_level = v;
        }
        if let Some(v) = update.time_remaining_secs {
            self.time_remaining_secs = v;
        }
        if let Some(v) = update.is_running {
            self.is_running = v;
        }
        if let Some(v) = update.is_paused {
            self.is_paused = v;
        }
        if let Some(v) = update.is_on_break {
            self.is_on_break = v;
        }
        if let Some(v) = update.players {
            self.players = v;
        }
        if let Some(v) = update.entries {
            self.entries = v;
        }
        if let Some(v) = update.reentries {
            self.reentries = v;
        }
        if let Some(v) = update.prize_pool {
            self.prize_pool = v;
        }
        if let Some(v) = update.started_at {
            self.started_at = v;
        }
        if let Some(v) = update.level_deadline {
            self.level_deadline = v;
        }
    }

    fn arm_deadline(&mut self, now: DateTime<Utc>) {
        self.level_deadline = Some(now + Duration::seconds(i64::from(self.time_remaining_secs)));
    }
}

/// Seconds remaining until `deadline`, clamped at zero.
pub(crate) fn remaining_secs(deadline: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    (deadline - now).num_seconds().max(0) as u32
}

/// Strongly-typed partial update of a [`ClockState`].
///
/// Every mutable field is optional; merge semantics are plain overwrite per
/// field. Updates are stamped with the operator identity and a timestamp
/// before they reach the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_level: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining_secs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_running: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_paused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_on_break: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reentries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize_pool: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_deadline: Option<Option<DateTime<Utc>>>,
    /// Operator identity stamped onto the update
    #[serde(default)]
    pub updated_by: String,
    /// When the update was produced
    pub updated_at: DateTime<Utc>,
}

impl StateUpdate {
    /// An empty update stamped with an operator identity and the current time.
    pub fn by(operator: &str, now: DateTime<Utc>) -> Self {
        Self {
            updated_by: operator.to_string(),
            updated_at: now,
            ..Self::default()
        }
    }

    /// Diff two states into a partial update carrying only the changed fields.
    pub fn diff(before: &ClockState, after: &ClockState, operator: &str, now: DateTime<Utc>) -> Self {
        let mut update = Self::by(operator, now);
        if before.current_level != after.current_level {
            update.current_level = Some(after.current_level);
        }
        if before.time_remaining_secs != after.time_remaining_secs {
            update.time_remaining_secs = Some(after.time_remaining_secs);
        }
        if before.is_running != after.is_running {
            update.is_running = Some(after.is_running);
        }
        if before.is_paused != after.is_paused {
            update.is_paused = Some(after.is_paused);
        }
        if before.is_on_break != after.is_on_break {
            update.is_on_break = Some(after.is_on_break);
        }
        if before.players != after.players {
            update.players = Some(after.players);
        }
        if before.entries != after.entries {
            update.entries = Some(after.entries);
        }
        if before.reentries != after.reentries {
            update.reentries = Some(after.reentries);
        }
        if before.prize_pool != after.prize_pool {
            update.prize_pool = Some(after.prize_pool);
        }
        if before.started_at != after.started_at {
            update.started_at = Some(after.started_at);
        }
        if before.level_deadline != after.level_deadline {
            update.level_deadline = Some(after.level_deadline);
        }
        update
    }

    /// Whether the update carries no field changes.
    pub fn is_empty(&self) -> bool {
        self.current_level.is_none()
            && self.time_remaining_secs.is_none()
            && self.is_running.is_none()
            && self.is_paused.is_none()
            && self.is_on_break.is_none()
            && self.players.is_none()
            && self.entries.is_none()
            && self.reentries.is_none()
            && self.prize_pool.is_none()
            && self.started_at.is_none()
            && self.level_deadline.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Level, PayoutStructure, Structure};

    fn four_level_structure() -> Structure {
        Structure::new(
            "Test".to_string(),
            100,
            100,
            1_000,
            10_000,
            vec![
                Level::new(1, 25, 50, 20),
                Level::new(2, 50, 100, 20),
                Level::break_for(3, 15),
                Level::new(4, 75, 150, 20).with_ante(25),
            ],
            2,
            PayoutStructure::standard(),
        )
    }

    #[test]
    fn test_prize_pool_formula() {
        assert_eq!(prize_pool(10, 2, 1_000, 100, 100), 1_200);
        // Guarantee dominates when collections fall short
        assert_eq!(prize_pool(3, 0, 1_000, 100, 100), 1_000);
        assert_eq!(prize_pool(0, 0, 0, 100, 100), 0);
    }

    #[test]
    fn test_new_state_defaults() {
        let structure = four_level_structure();
        let state = ClockState::new(&structure);
        assert_eq!(state.current_level, 0);
        assert_eq!(state.time_remaining_secs, 1200);
        assert!(!state.is_running);
        assert!(!state.is_on_break);
        assert_eq!(state.prize_pool, 1_000);
        assert_eq!(state.players, 0);
    }

    #[test]
    fn test_start_arms_deadline_and_stamps_start_time() {
        let structure = four_level_structure();
        let mut state = ClockState::new(&structure);
        let now = Utc::now();

        state.start(now);
        assert!(state.is_running);
        assert!(!state.is_paused);
        assert_eq!(state.started_at, Some(now));
        assert_eq!(
            state.level_deadline,
            Some(now + Duration::seconds(1200))
        );

        // Starting again is a no-op and does not restamp
        state.start(now + Duration::seconds(5));
        assert_eq!(state.started_at, Some(now));
    }

    #[test]
    fn test_pause_freezes_remaining_time() {
        let structure = four_level_structure();
        let mut state = ClockState::new(&structure);
        let now = Utc::now();
        state.start(now);

        state.pause(now + Duration::seconds(300));
        assert!(state.is_paused);
        assert_eq!(state.time_remaining_secs, 900);
        assert_eq!(state.level_deadline, None);

        // Resuming much later picks up where it left off
        let later = now + Duration::seconds(10_000);
        state.resume(later);
        assert!(!state.is_paused);
        assert_eq!(state.level_deadline, Some(later + Duration::seconds(900)));
    }

    #[test]
    fn test_natural_advance_into_break_pauses() {
        let structure = four_level_structure();
        let mut state = ClockState::new(&structure);
        let now = Utc::now();
        state.start(now);

        state.advance_level(&structure, now); // -> level 2
        assert_eq!(state.current_level, 1);
        assert!(!state.is_on_break);
        assert!(!state.is_paused);
        assert_eq!(state.time_remaining_secs, 1200);

        state.advance_level(&structure, now); // -> break
        assert_eq!(state.current_level, 2);
        assert!(state.is_on_break);
        assert!(state.is_paused);
        assert_eq!(state.time_remaining_secs, 900);
        assert_eq!(state.level_deadline, None);
    }

    #[test]
    fn test_skip_break_auto_resumes() {
        let structure = four_level_structure();
        let mut state = ClockState::new(&structure);
        let now = Utc::now();
        state.start(now);
        state.advance_level(&structure, now);
        state.advance_level(&structure, now); // on break, paused

        assert!(state.skip_break(&structure, now));
        assert_eq!(state.current_level, 3);
        assert!(!state.is_on_break);
        assert!(!state.is_paused);
        assert_eq!(state.time_remaining_secs, 1200);
        assert!(state.level_deadline.is_some());
    }

    #[test]
    fn test_skip_break_rejected_off_break() {
        let structure = four_level_structure();
        let mut state = ClockState::new(&structure);
        assert!(!state.skip_break(&structure, Utc::now()));
        assert_eq!(state.current_level, 0);
    }

    #[test]
    fn test_skip_break_refuses_adjacent_break() {
        let structure = Structure::new(
            "Adjacent".to_string(),
            100,
            100,
            0,
            10_000,
            vec![
                Level::break_for(1, 10),
                Level::break_for(2, 10),
                Level::new(3, 25, 50, 20),
            ],
            0,
            PayoutStructure::winner_takes_all(),
        );
        let mut state = ClockState::new(&structure);
        assert!(state.is_on_break);
        assert!(!state.skip_break(&structure, Utc::now()));
        assert_eq!(state.current_level, 0);
    }

    #[test]
    fn test_advance_past_last_level_is_terminal() {
        let structure = four_level_structure();
        let mut state = ClockState::new(&structure);
        let now = Utc::now();
        state.start(now);
        state.current_level = structure.levels.len() - 1;

        state.advance_level(&structure, now);
        assert_eq!(state.current_level, structure.levels.len() - 1);
        assert!(!state.is_running);
        assert_eq!(state.time_remaining_secs, 0);
        assert_eq!(state.level_deadline, None);

        // A further advance attempt changes nothing
        state.advance_level(&structure, now);
        assert_eq!(state.current_level, structure.levels.len() - 1);
        assert!(!state.is_running);
    }

    #[test]
    fn test_terminal_state_clears_break_flag() {
        let structure = Structure::new(
            "Ends on break".to_string(),
            100,
            100,
            0,
            10_000,
            vec![Level::new(1, 25, 50, 20), Level::break_for(2, 15)],
            0,
            PayoutStructure::winner_takes_all(),
        );
        let now = Utc::now();

        // Expiring past a final break
        let mut state = ClockState::new(&structure);
        state.start(now);
        state.advance_level(&structure, now); // -> final break
        assert!(state.is_on_break);
        state.advance_level(&structure, now); // -> terminal
        assert!(!state.is_running);
        assert!(!state.is_on_break);

        // Skipping a final break
        let mut state = ClockState::new(&structure);
        state.start(now);
        state.advance_level(&structure, now);
        assert!(state.skip_break(&structure, now));
        assert!(!state.is_running);
        assert!(!state.is_on_break);
        assert_eq!(state.time_remaining_secs, 0);
    }

    #[test]
    fn test_reset_level_restores_full_duration() {
        let structure = four_level_structure();
        let mut state = ClockState::new(&structure);
        let now = Utc::now();
        state.start(now);
        state.time_remaining_secs = 37;

        state.reset_level(&structure, now);
        assert_eq!(state.time_remaining_secs, 1200);
        assert_eq!(state.current_level, 0);
        assert!(state.is_running);
        assert!(!state.is_paused);
        assert_eq!(state.level_deadline, Some(now + Duration::seconds(1200)));
    }

    #[test]
    fn test_entries_recompute_pool_eliminations_dont() {
        let structure = four_level_structure();
        let mut state = ClockState::new(&structure);

        for _ in 0..10 {
            state.add_player(&structure);
        }
        state.add_reentry(&structure);
        state.add_reentry(&structure);
        assert_eq!(state.entries, 10);
        assert_eq!(state.reentries, 2);
        assert_eq!(state.players, 12);
        assert_eq!(state.prize_pool, 1_200);

        assert!(state.eliminate_player());
        assert_eq!(state.players, 11);
        assert_eq!(state.prize_pool, 1_200);
    }

    #[test]
    fn test_eliminate_with_no_players_is_noop() {
        let structure = four_level_structure();
        let mut state = ClockState::new(&structure);
        let before = state.clone();
        assert!(!state.eliminate_player());
        assert_eq!(state, before);
    }

    #[test]
    fn test_manual_next_level_three_times_passes_break() {
        let structure = four_level_structure();
        let mut state = ClockState::new(&structure);
        let now = Utc::now();
        state.start(now);
        assert_eq!(state.time_remaining_secs, 1200);

        state.advance_level(&structure, now);
        state.advance_level(&structure, now);
        assert_eq!(state.current_level, 2);
        assert!(state.is_paused); // parked at the break until resumed or skipped
        state.advance_level(&structure, now);

        assert_eq!(state.current_level, 3);
        assert!(!state.is_on_break);
        assert_eq!(state.time_remaining_secs, 1200);
    }

    #[test]
    fn test_merge_overwrites_only_present_fields() {
        let structure = four_level_structure();
        let mut state = ClockState::new(&structure);
        state.players = 7;

        let mut update = StateUpdate::by("operator", Utc::now());
        update.current_level = Some(2);
        update.is_on_break = Some(true);
        state.merge(&update);

        assert_eq!(state.current_level, 2);
        assert!(state.is_on_break);
        assert_eq!(state.players, 7); // untouched
    }

    #[test]
    fn test_diff_captures_exactly_the_changes() {
        let structure = four_level_structure();
        let before = ClockState::new(&structure);
        let mut after = before.clone();
        after.add_player(&structure);

        let update = StateUpdate::diff(&before, &after, "floor", Utc::now());
        assert_eq!(update.players, Some(1));
        assert_eq!(update.entries, Some(1));
        assert_eq!(update.prize_pool, None); // 1 entry still below the guarantee
        assert_eq!(update.current_level, None);
        assert_eq!(update.updated_by, "floor");

        let unchanged = StateUpdate::diff(&before, &before, "floor", Utc::now());
        assert!(unchanged.is_empty());
    }
}
