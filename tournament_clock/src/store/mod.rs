//! Persistence and realtime synchronization gateway.
//!
//! The clock core talks to the outside world through the [`TournamentStore`]
//! trait only: persisted structures and states, partial updates stamped with
//! an operator identity, and an append-only audit log of actions. Two
//! implementations are provided:
//!
//! - [`PgTournamentStore`]: PostgreSQL via sqlx, the production gateway
//! - [`MemoryStore`]: in-process, used by tests and offline runs

pub mod config;
pub mod memory;
pub mod postgres;

pub use config::DatabaseConfig;
pub use memory::MemoryStore;
pub use postgres::PgTournamentStore;

use crate::clock::state::{ClockState, StateUpdate};
use crate::structure::Structure;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tournament not found: {0}")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Summary row for tournament discovery
#[derive(Debug, Clone, serde::Serialize)]
pub struct TournamentListing {
    pub id: Uuid,
    pub name: String,
    pub location_tag: Option<String>,
    pub players: u32,
    pub is_running: bool,
    pub created_at: DateTime<Utc>,
}

/// Gateway contract between the clock core and persistence/fan-out.
///
/// All writes are fire-and-forget from the engine's perspective: failures
/// are surfaced to the caller, never retried by the core.
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Persist a structure and its initial state, returning the tournament id.
    async fn create_tournament(
        &self,
        structure: &Structure,
        state: &ClockState,
        location_tag: Option<&str>,
    ) -> StoreResult<Uuid>;

    /// Load a persisted structure by tournament id.
    async fn load_structure(&self, id: Uuid) -> StoreResult<Structure>;

    /// Load the persisted clock state by tournament id.
    async fn load_state(&self, id: Uuid) -> StoreResult<ClockState>;

    /// Write only the fields present in the update (last write wins).
    async fn update_state(&self, id: Uuid, update: &StateUpdate) -> StoreResult<()>;

    /// Append an action to the audit log with its full partial payload.
    async fn append_audit(&self, id: Uuid, action: &str, update: &StateUpdate) -> StoreResult<()>;

    /// List all persisted tournaments.
    async fn list_tournaments(&self) -> StoreResult<Vec<TournamentListing>>;

    /// Archive a tournament (deleted or finished).
    async fn delete_tournament(&self, id: Uuid) -> StoreResult<()>;
}

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
