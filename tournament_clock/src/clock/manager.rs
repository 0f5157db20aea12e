//! Tournament manager for spawning and managing clock actors.

use super::{
    actor::{TournamentActor, TournamentHandle},
    messages::{ClockMessage, ClockResponse, ClockSnapshot, OperatorAction},
    state::ClockState,
};
use crate::store::{StoreError, TournamentListing, TournamentStore};
use crate::structure::{Structure, StructureError};
use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
};
use thiserror::Error;
use tokio::sync::{RwLock, oneshot};
use uuid::Uuid;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("tournament not found: {0}")]
    NotFound(Uuid),

    #[error("tournament {0} is closed")]
    Closed(Uuid),
}

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Registry of running tournament actors.
///
/// Each tournament runs in its own Tokio task; the manager spawns actors,
/// hands out handles, and coordinates create/join/close against the store.
/// Any number of tournaments can run in parallel per manager instance.
pub struct TournamentManager {
    /// Persistence gateway
    store: Arc<dyn TournamentStore>,

    /// Active tournament handles
    tournaments: Arc<RwLock<HashMap<Uuid, TournamentHandle>>>,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(store: Arc<dyn TournamentStore>) -> Self {
        Self {
            store,
            tournaments: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Validate a structure, persist it with its initial state, and spawn
    /// the clock actor. Nothing is persisted when validation fails.
    pub async fn create_tournament(
        &self,
        structure: Structure,
        location_tag: Option<&str>,
    ) -> ManagerResult<Uuid> {
        structure.validate()?;

        let state = ClockState::new(&structure);
        let id = self
            .store
            .create_tournament(&structure, &state, location_tag)
            .await?;

        self.spawn_actor(structure, state).await;
        log::info!("Created tournament {}", id);

        Ok(id)
    }

    /// Join a tournament: return its current snapshot and a handle for
    /// actions and subscriptions. Loads the records from the store and
    /// spawns the actor when it is not already running here.
    pub async fn join_tournament(
        &self,
        id: Uuid,
    ) -> ManagerResult<(ClockSnapshot, TournamentHandle)> {
        let handle = match self.get_tournament(id).await {
            Some(handle) => handle,
            None => {
                let structure = self.store.load_structure(id).await?;
                let state = self.store.load_state(id).await?;
                let handle = self.spawn_actor(structure, state).await;
                log::info!("Loaded tournament {}", id);
                handle
            }
        };
        let snapshot = self.get_snapshot(&handle).await?;

        Ok((snapshot, handle))
    }

    /// Load every persisted tournament and spawn its actor (server boot).
    pub async fn load_existing(&self) -> ManagerResult<usize> {
        let listings = self.store.list_tournaments().await?;
        let mut loaded = 0;

        for listing in listings {
            if self.get_tournament(listing.id).await.is_some() {
                continue;
            }
            let structure = self.store.load_structure(listing.id).await?;
            let state = self.store.load_state(listing.id).await?;
            self.spawn_actor(structure, state).await;
            log::info!("Loaded and spawned existing tournament {}", listing.id);
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Get a tournament handle
    pub async fn get_tournament(&self, id: Uuid) -> Option<TournamentHandle> {
        let tournaments = self.tournaments.read().await;
        tournaments.get(&id).cloned()
    }

    /// List all persisted tournaments
    pub async fn list_tournaments(&self) -> ManagerResult<Vec<TournamentListing>> {
        Ok(self.store.list_tournaments().await?)
    }

    /// Apply an operator action to a tournament.
    ///
    /// A missing tournament is treated as a benign no-op (logged, not an
    /// error): operator actions with no active tournament are ignored.
    pub async fn apply_action(
        &self,
        id: Uuid,
        action: OperatorAction,
        operator: &str,
    ) -> ManagerResult<ClockResponse> {
        let Some(handle) = self.get_tournament(id).await else {
            log::debug!(
                "Ignoring {} for tournament {}: no active tournament",
                action.name(),
                id
            );
            return Ok(ClockResponse::Ignored("no active tournament".to_string()));
        };

        let (tx, rx) = oneshot::channel();
        handle
            .send(ClockMessage::Action {
                action,
                operator: operator.to_string(),
                response: tx,
            })
            .await
            .map_err(|_| ManagerError::Closed(id))?;

        rx.await.map_err(|_| ManagerError::Closed(id))
    }

    /// Get a snapshot of a tournament's current state
    pub async fn get_state(&self, id: Uuid) -> ManagerResult<ClockSnapshot> {
        let handle = self
            .get_tournament(id)
            .await
            .ok_or(ManagerError::NotFound(id))?;
        self.get_snapshot(&handle).await
    }

    /// Stop a tournament actor and archive its records
    pub async fn delete_tournament(&self, id: Uuid) -> ManagerResult<()> {
        if let Some(handle) = self.get_tournament(id).await {
            let (tx, rx) = oneshot::channel();
            if handle.send(ClockMessage::Close { response: tx }).await.is_ok() {
                let _ = rx.await;
            }
        }

        let mut tournaments = self.tournaments.write().await;
        tournaments.remove(&id);
        drop(tournaments);

        self.store.delete_tournament(id).await?;
        log::info!("Deleted tournament {}", id);

        Ok(())
    }

    /// Get active tournament count
    pub async fn active_tournament_count(&self) -> usize {
        let tournaments = self.tournaments.read().await;
        tournaments.len()
    }

    /// Register and run an actor for the tournament, unless one is already
    /// running. Two callers racing to spawn the same tournament (e.g. two
    /// viewers joining right after a restart) both end up with the handle of
    /// the single actor that won; the loser's actor is dropped before it
    /// ever runs.
    async fn spawn_actor(&self, structure: Structure, state: ClockState) -> TournamentHandle {
        let (actor, handle) = TournamentActor::new(structure, state, self.store.clone());

        let mut tournaments = self.tournaments.write().await;
        match tournaments.entry(handle.tournament_id()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                slot.insert(handle.clone());
                tokio::spawn(async move {
                    actor.run().await;
                });
                handle
            }
        }
    }

    async fn get_snapshot(&self, handle: &TournamentHandle) -> ManagerResult<ClockSnapshot> {
        let (tx, rx) = oneshot::channel();
        handle
            .send(ClockMessage::GetState { response: tx })
            .await
            .map_err(|_| ManagerError::Closed(handle.tournament_id()))?;

        rx.await
            .map_err(|_| ManagerError::Closed(handle.tournament_id()))
    }
}
