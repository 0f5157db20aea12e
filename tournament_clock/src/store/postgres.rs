//! PostgreSQL implementation of the tournament store.
//!
//! Persisted layout: a `structures` row and a `clock_states` row per
//! tournament (flattened snake_case columns, level/payout lists as jsonb),
//! plus an append-only `clock_audit_log` of actions.

use super::{StoreError, StoreResult, TournamentListing, TournamentStore};
use crate::clock::state::{ClockState, StateUpdate};
use crate::structure::{Level, PayoutStructure, Structure};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use uuid::Uuid;

/// PostgreSQL tournament store
#[derive(Clone)]
pub struct PgTournamentStore {
    pool: Arc<PgPool>,
}

impl PgTournamentStore {
    /// Create a new store backed by the given pool
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TournamentStore for PgTournamentStore {
    async fn create_tournament(
        &self,
        structure: &Structure,
        state: &ClockState,
        location_tag: Option<&str>,
    ) -> StoreResult<Uuid> {
        let levels = serde_json::to_value(&structure.levels)?;
        let payouts = serde_json::to_value(&structure.payouts)?;

        // Both rows or neither: a tournament is never partially persisted.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO structures (
                tournament_id, name, buy_in, reentry_fee, guaranteed_prize_pool,
                initial_stack, break_after_levels, levels, payouts, location_tag
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(structure.id)
        .bind(&structure.name)
        .bind(structure.buy_in)
        .bind(structure.reentry_fee)
        .bind(structure.guaranteed_prize_pool)
        .bind(structure.initial_stack)
        .bind(structure.break_after_levels as i32)
        .bind(levels)
        .bind(payouts)
        .bind(location_tag)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO clock_states (
                tournament_id, current_level, time_remaining_secs, is_running,
                is_paused, is_on_break, players, entries, reentries, prize_pool,
                started_at, level_deadline, updated_by, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(state.tournament_id)
        .bind(state.current_level as i32)
        .bind(state.time_remaining_secs as i32)
        .bind(state.is_running)
        .bind(state.is_paused)
        .bind(state.is_on_break)
        .bind(state.players as i32)
        .bind(state.entries as i32)
        .bind(state.reentries as i32)
        .bind(state.prize_pool)
        .bind(state.started_at)
        .bind(state.level_deadline)
        .bind("system")
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(structure.id)
    }

    async fn load_structure(&self, id: Uuid) -> StoreResult<Structure> {
        let row = sqlx::query(
            r#"
            SELECT tournament_id, name, buy_in, reentry_fee, guaranteed_prize_pool,
                   initial_stack, break_after_levels, levels, payouts
            FROM structures
            WHERE tournament_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(StoreError::NotFound(id))?;

        let levels: Vec<Level> = serde_json::from_value(row.get("levels"))?;
        let payouts: PayoutStructure = serde_json::from_value(row.get("payouts"))?;

        Ok(Structure {
            id: row.get("tournament_id"),
            name: row.get("name"),
            buy_in: row.get("buy_in"),
            reentry_fee: row.get("reentry_fee"),
            guaranteed_prize_pool: row.get("guaranteed_prize_pool"),
            initial_stack: row.get("initial_stack"),
            levels,
            break_after_levels: row.get::<i32, _>("break_after_levels") as u32,
            payouts,
        })
    }

    async fn load_state(&self, id: Uuid) -> StoreResult<ClockState> {
        let row = sqlx::query(
            r#"
            SELECT tournament_id, current_level, time_remaining_secs, is_running,
                   is_paused, is_on_break, players, entries, reentries, prize_pool,
                   started_at, level_deadline
            FROM clock_states
            WHERE tournament_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(StoreError::NotFound(id))?;

        Ok(ClockState {
            tournament_id: row.get("tournament_id"),
            current_level: row.get::<i32, _>("current_level") as usize,
            time_remaining_secs: row.get::<i32, _>("time_remaining_secs") as u32,
            is_running: row.get("is_running"),
            is_paused: row.get("is_paused"),
            is_on_break: row.get("is_on_break"),
            players: row.get::<i32, _>("players") as u32,
            entries: row.get::<i32, _>("entries") as u32,
            reentries: row.get::<i32, _>("reentries") as u32,
            prize_pool: row.get("prize_pool"),
            started_at: row.get::<Option<DateTime<Utc>>, _>("started_at"),
            level_deadline: row.get::<Option<DateTime<Utc>>, _>("level_deadline"),
        })
    }

    async fn update_state(&self, id: Uuid, update: &StateUpdate) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE clock_states SET
                current_level       = COALESCE($2, current_level),
                time_remaining_secs = COALESCE($3, time_remaining_secs),
                is_running          = COALESCE($4, is_running),
                is_paused           = COALESCE($5, is_paused),
                is_on_break         = COALESCE($6, is_on_break),
                players             = COALESCE($7, players),
                entries             = COALESCE($8, entries),
                reentries           = COALESCE($9, reentries),
                prize_pool          = COALESCE($10, prize_pool),
                started_at          = CASE WHEN $11 THEN $12 ELSE started_at END,
                level_deadline      = CASE WHEN $13 THEN $14 ELSE level_deadline END,
                updated_by          = $15,
                updated_at          = $16
            WHERE tournament_id = $1
            "#,
        )
        .bind(id)
        .bind(update.current_level.map(|v| v as i32))
        .bind(update.time_remaining_secs.map(|v| v as i32))
        .bind(update.is_running)
        .bind(update.is_paused)
        .bind(update.is_on_break)
        .bind(update.players.map(|v| v as i32))
        .bind(update.entries.map(|v| v as i32))
        .bind(update.reentries.map(|v| v as i32))
        .bind(update.prize_pool)
        .bind(update.started_at.is_some())
        .bind(update.started_at.flatten())
        .bind(update.level_deadline.is_some())
        .bind(update.level_deadline.flatten())
        .bind(&update.updated_by)
        .bind(update.updated_at)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }

    async fn append_audit(&self, id: Uuid, action: &str, update: &StateUpdate) -> StoreResult<()> {
        let payload = serde_json::to_value(update)?;

        sqlx::query(
            r#"
            INSERT INTO clock_audit_log (tournament_id, action, payload, recorded_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(action)
        .bind(payload)
        .bind(update.updated_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn list_tournaments(&self) -> StoreResult<Vec<TournamentListing>> {
        let rows = sqlx::query(
            r#"
            SELECT s.tournament_id, s.name, s.location_tag, s.created_at,
                   c.players, c.is_running
            FROM structures s
            JOIN clock_states c ON c.tournament_id = s.tournament_id
            ORDER BY s.created_at DESC
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TournamentListing {
                id: row.get("tournament_id"),
                name: row.get("name"),
                location_tag: row.get("location_tag"),
                players: row.get::<i32, _>("players") as u32,
                is_running: row.get("is_running"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn delete_tournament(&self, id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM clock_audit_log WHERE tournament_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM clock_states WHERE tournament_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM structures WHERE tournament_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }
}
