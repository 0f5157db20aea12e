//! In-memory implementation of the tournament store.
//!
//! Backs integration tests and offline runs: the full actor path can be
//! exercised without a database, including the audit log.

use super::{StoreError, StoreResult, TournamentListing, TournamentStore};
use crate::clock::state::{ClockState, StateUpdate};
use crate::structure::Structure;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// A single audit log entry
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub action: String,
    pub payload: StateUpdate,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Record {
    structure: Structure,
    state: ClockState,
    location_tag: Option<String>,
    audit: Vec<AuditEntry>,
    created_at: DateTime<Utc>,
}

/// In-memory tournament store
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Uuid, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Audit entries recorded for a tournament (test helper)
    pub fn audit_log(&self, id: Uuid) -> Vec<AuditEntry> {
        self.records
            .lock()
            .expect("memory store poisoned")
            .get(&id)
            .map(|r| r.audit.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn create_tournament(
        &self,
        structure: &Structure,
        state: &ClockState,
        location_tag: Option<&str>,
    ) -> StoreResult<Uuid> {
        let mut records = self.records.lock().expect("memory store poisoned");
        records.insert(
            structure.id,
            Record {
                structure: structure.clone(),
                state: state.clone(),
                location_tag: location_tag.map(str::to_string),
                audit: Vec::new(),
                created_at: Utc::now(),
            },
        );
        Ok(structure.id)
    }

    async fn load_structure(&self, id: Uuid) -> StoreResult<Structure> {
        let records = self.records.lock().expect("memory store poisoned");
        records
            .get(&id)
            .map(|r| r.structure.clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn load_state(&self, id: Uuid) -> StoreResult<ClockState> {
        let records = self.records.lock().expect("memory store poisoned");
        records
            .get(&id)
            .map(|r| r.state.clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_state(&self, id: Uuid, update: &StateUpdate) -> StoreResult<()> {
        let mut records = self.records.lock().expect("memory store poisoned");
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.state.merge(update);
        Ok(())
    }

    async fn append_audit(&self, id: Uuid, action: &str, update: &StateUpdate) -> StoreResult<()> {
        let mut records = self.records.lock().expect("memory store poisoned");
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.audit.push(AuditEntry {
            action: action.to_string(),
            payload: update.clone(),
            recorded_at: update.updated_at,
        });
        Ok(())
    }

    async fn list_tournaments(&self) -> StoreResult<Vec<TournamentListing>> {
        let records = self.records.lock().expect("memory store poisoned");
        let mut listings: Vec<TournamentListing> = records
            .values()
            .map(|r| TournamentListing {
                id: r.structure.id,
                name: r.structure.name.clone(),
                location_tag: r.location_tag.clone(),
                players: r.state.players,
                is_running: r.state.is_running,
                created_at: r.created_at,
            })
            .collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    async fn delete_tournament(&self, id: Uuid) -> StoreResult<()> {
        let mut records = self.records.lock().expect("memory store poisoned");
        records.remove(&id).ok_or(StoreError::NotFound(id))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::state::StateUpdate;
    use crate::structure::Structure;

    #[tokio::test]
    async fn test_structure_round_trip() {
        let store = MemoryStore::new();
        let structure = Structure::standard("Round trip".to_string(), 150, 100, 5_000);
        let state = ClockState::new(&structure);

        let id = store
            .create_tournament(&structure, &state, Some("main-room"))
            .await
            .unwrap();

        let loaded = store.load_structure(id).await.unwrap();
        assert_eq!(loaded, structure);
        let loaded_state = store.load_state(id).await.unwrap();
        assert_eq!(loaded_state, state);
    }

    #[tokio::test]
    async fn test_partial_update_merges() {
        let store = MemoryStore::new();
        let structure = Structure::standard("Merge".to_string(), 100, 100, 0);
        let state = ClockState::new(&structure);
        let id = store
            .create_tournament(&structure, &state, None)
            .await
            .unwrap();

        let mut update = StateUpdate::by("floor", Utc::now());
        update.players = Some(9);
        update.is_running = Some(true);
        store.update_state(id, &update).await.unwrap();

        let loaded = store.load_state(id).await.unwrap();
        assert_eq!(loaded.players, 9);
        assert!(loaded.is_running);
        assert_eq!(loaded.current_level, state.current_level);
    }

    #[tokio::test]
    async fn test_not_found() {
        let store = MemoryStore::new();
        let missing = Uuid::new_v4();
        assert!(matches!(
            store.load_structure(missing).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store
                .update_state(missing, &StateUpdate::by("x", Utc::now()))
                .await,
            Err(StoreError::NotFound(_))
        ));
    }
}
