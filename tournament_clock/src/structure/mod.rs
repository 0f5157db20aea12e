//! Tournament structure module.
//!
//! A [`Structure`] is the immutable definition of a tournament: the ordered
//! blind levels (including breaks), buy-in and re-entry fees, the guaranteed
//! prize pool and the payout percentages. It is created once at tournament
//! setup, validated before anything is persisted, and never mutated
//! afterwards.

pub mod models;

pub use models::{Level, MAX_LEVEL_DURATION_MINS, PayoutStructure, Structure, StructureError};
