//! Tournament structure data models.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Longest a single level may run (24 hours).
pub const MAX_LEVEL_DURATION_MINS: u32 = 24 * 60;

/// A single blind-structure stage.
///
/// Break levels carry no blinds; their blind/ante fields are conventionally
/// zero and ignored by the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Level number (1-indexed, display only)
    pub id: u32,
    /// Small blind amount
    pub small_blind: i64,
    /// Big blind amount
    pub big_blind: i64,
    /// Ante amount (zero when none)
    pub ante: i64,
    /// Duration of this level in minutes
    pub duration_mins: u32,
    /// Whether this level is a break
    pub is_break: bool,
}

impl Level {
    /// Create a new playing level
    pub fn new(id: u32, small_blind: i64, big_blind: i64, duration_mins: u32) -> Self {
        Self {
            id,
            small_blind,
            big_blind,
            ante: 0,
            duration_mins,
            is_break: false,
        }
    }

    /// Create a playing level with an ante
    pub fn with_ante(mut self, ante: i64) -> Self {
        self.ante = ante;
        self
    }

    /// Create a break level
    pub fn break_for(id: u32, duration_mins: u32) -> Self {
        Self {
            id,
            small_blind: 0,
            big_blind: 0,
            ante: 0,
            duration_mins,
            is_break: true,
        }
    }

    /// Level duration in seconds
    pub fn duration_secs(&self) -> u32 {
        // Saturates rather than overflows on durations validation never saw.
        self.duration_mins.saturating_mul(60)
    }
}

/// Ordered payout percentage shares (1st place first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutStructure {
    /// Percentage share per finishing place
    pub shares: Vec<f64>,
}

impl PayoutStructure {
    /// Create a payout structure from percentage shares
    pub fn new(shares: Vec<f64>) -> Self {
        Self { shares }
    }

    /// Winner takes all
    pub fn winner_takes_all() -> Self {
        Self::new(vec![100.0])
    }

    /// Standard three-place 50/30/20 split
    pub fn standard() -> Self {
        Self::new(vec![50.0, 30.0, 20.0])
    }

    /// Sum of all shares
    pub fn total_percent(&self) -> f64 {
        self.shares.iter().sum()
    }

    /// Get the share for a finishing place (1-indexed)
    pub fn share_for_place(&self, place: usize) -> Option<f64> {
        if place == 0 || place > self.shares.len() {
            None
        } else {
            Some(self.shares[place - 1])
        }
    }
}

/// Structure validation errors.
///
/// Validation collects every field-level problem it finds so that a
/// malformed structure is rejected with a complete list of messages and
/// nothing is partially persisted.
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("invalid tournament structure: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl StructureError {
    /// The collected field-level messages
    pub fn messages(&self) -> &[String] {
        match self {
            StructureError::Invalid(msgs) => msgs,
        }
    }
}

/// Immutable tournament definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Tournament structure ID
    pub id: Uuid,
    /// Tournament name
    pub name: String,
    /// Buy-in fee per initial entry
    pub buy_in: i64,
    /// Fee per re-entry
    pub reentry_fee: i64,
    /// Guaranteed minimum prize pool
    pub guaranteed_prize_pool: i64,
    /// Starting chip stack per entry
    pub initial_stack: i64,
    /// Ordered blind levels, breaks included
    pub levels: Vec<Level>,
    /// Playing levels between breaks in generated structures (0 = no breaks)
    pub break_after_levels: u32,
    /// Payout percentage shares
    pub payouts: PayoutStructure,
}

impl Structure {
    /// Create a structure from explicit levels
    pub fn new(
        name: String,
        buy_in: i64,
        reentry_fee: i64,
        guaranteed_prize_pool: i64,
        initial_stack: i64,
        levels: Vec<Level>,
        break_after_levels: u32,
        payouts: PayoutStructure,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            buy_in,
            reentry_fee,
            guaranteed_prize_pool,
            initial_stack,
            levels,
            break_after_levels,
            payouts,
        }
    }

    /// Create a standard structure: ten 20-minute playing levels with a
    /// 15-minute break inserted after every four playing levels.
    pub fn standard(name: String, buy_in: i64, reentry_fee: i64, guaranteed: i64) -> Self {
        let blinds: [(i64, i64, i64); 10] = [
            (25, 50, 0),
            (50, 100, 0),
            (75, 150, 0),
            (100, 200, 0),
            (150, 300, 25),
            (200, 400, 50),
            (300, 600, 75),
            (400, 800, 100),
            (600, 1_200, 150),
            (800, 1_600, 200),
        ];

        let break_after = 4u32;
        let mut levels = Vec::new();
        let mut id = 1u32;
        for (i, (sb, bb, ante)) in blinds.iter().enumerate() {
            levels.push(Level::new(id, *sb, *bb, 20).with_ante(*ante));
            id += 1;
            let played = (i + 1) as u32;
            if played % break_after == 0 && i + 1 < blinds.len() {
                levels.push(Level::break_for(id, 15));
                id += 1;
            }
        }

        Self::new(
            name,
            buy_in,
            reentry_fee,
            guaranteed,
            buy_in * 100,
            levels,
            break_after,
            PayoutStructure::standard(),
        )
    }

    /// Create a turbo structure (10-minute playing levels, 10-minute breaks)
    pub fn turbo(name: String, buy_in: i64, reentry_fee: i64, guaranteed: i64) -> Self {
        let mut structure = Self::standard(name, buy_in, reentry_fee, guaranteed);
        for level in &mut structure.levels {
            level.duration_mins = 10;
        }
        structure
    }

    /// Get a level by index
    pub fn level(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    /// Whether the given index is the last level
    pub fn is_last_level(&self, index: usize) -> bool {
        index + 1 >= self.levels.len()
    }

    /// Validate the structure, collecting every field-level problem.
    ///
    /// A payout sum that deviates from 100% is advisory only: it is logged,
    /// not rejected.
    pub fn validate(&self) -> Result<(), StructureError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("name must not be empty".to_string());
        }
        if self.buy_in <= 0 {
            errors.push(format!("buy-in must be positive, got {}", self.buy_in));
        }
        if self.reentry_fee < 0 {
            errors.push(format!(
                "re-entry fee must not be negative, got {}",
                self.reentry_fee
            ));
        }
        if self.guaranteed_prize_pool < 0 {
            errors.push(format!(
                "guaranteed prize pool must not be negative, got {}",
                self.guaranteed_prize_pool
            ));
        }
        if self.initial_stack <= 0 {
            errors.push(format!(
                "initial stack must be positive, got {}",
                self.initial_stack
            ));
        }
        if self.levels.is_empty() {
            errors.push("at least one level is required".to_string());
        }

        for (i, level) in self.levels.iter().enumerate() {
            if level.duration_mins == 0 {
                errors.push(format!("level {} has zero duration", i + 1));
            }
            if level.duration_mins > MAX_LEVEL_DURATION_MINS {
                errors.push(format!(
                    "level {} duration ({} mins) exceeds the {} min maximum",
                    i + 1,
                    level.duration_mins,
                    MAX_LEVEL_DURATION_MINS
                ));
            }
            if !level.is_break {
                if level.small_blind <= 0 {
                    errors.push(format!("level {} is missing a small blind", i + 1));
                }
                if level.big_blind <= 0 {
                    errors.push(format!("level {} is missing a big blind", i + 1));
                }
                if level.big_blind < level.small_blind {
                    errors.push(format!(
                        "level {} big blind ({}) is below the small blind ({})",
                        i + 1,
                        level.big_blind,
                        level.small_blind
                    ));
                }
            }
            if level.ante < 0 {
                errors.push(format!("level {} has a negative ante", i + 1));
            }
        }

        let total = self.payouts.total_percent();
        if !self.payouts.shares.is_empty() && (total - 100.0).abs() > 0.01 {
            log::warn!(
                "Structure '{}': payout shares sum to {:.2}%, not 100%",
                self.name,
                total
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(StructureError::Invalid(errors))
        }
    }
}
