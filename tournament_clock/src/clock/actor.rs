//! Tournament actor implementation with async message handling.

use super::{
    engine::{self, TickOutcome},
    messages::{
        ClockMessage, ClockResponse, ClockSnapshot, OperatorAction, StateChangeNotification,
    },
    state::{ClockState, StateUpdate},
};
use crate::store::TournamentStore;
use crate::structure::Structure;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::{
    sync::mpsc,
    time::{Duration, interval},
};
use uuid::Uuid;

/// Tournament actor handle for sending messages
#[derive(Clone)]
pub struct TournamentHandle {
    sender: mpsc::Sender<ClockMessage>,
    tournament_id: Uuid,
}

impl TournamentHandle {
    /// Create a new tournament handle
    pub fn new(sender: mpsc::Sender<ClockMessage>, tournament_id: Uuid) -> Self {
        Self {
            sender,
            tournament_id,
        }
    }

    /// Get tournament ID
    pub fn tournament_id(&self) -> Uuid {
        self.tournament_id
    }

    /// Send a message to the tournament actor
    pub async fn send(&self, message: ClockMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Tournament is closed".to_string())
    }
}

/// Actor owning a single tournament's structure and clock state.
///
/// All mutations flow through here: the operation is applied in memory, the
/// change is diffed into a partial [`StateUpdate`] stamped with the operator
/// identity, persisted through the store, audited, and fanned out to
/// subscribers. Store failures are surfaced to the caller and never retried.
pub struct TournamentActor {
    /// Tournament ID
    id: Uuid,

    /// Immutable tournament definition
    structure: Structure,

    /// Runtime clock state
    state: ClockState,

    /// Message inbox
    inbox: mpsc::Receiver<ClockMessage>,

    /// Persistence gateway
    store: Arc<dyn TournamentStore>,

    /// Subscribers for state change notifications
    subscribers: HashMap<Uuid, mpsc::Sender<StateChangeNotification>>,

    /// Is tournament closed
    is_closed: bool,
}

impl TournamentActor {
    /// Create a new tournament actor and its handle
    pub fn new(
        structure: Structure,
        state: ClockState,
        store: Arc<dyn TournamentStore>,
    ) -> (Self, TournamentHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let id = structure.id;

        let actor = Self {
            id,
            structure,
            state,
            inbox,
            store,
            subscribers: HashMap::new(),
            is_closed: false,
        };

        let handle = TournamentHandle::new(sender, id);

        (actor, handle)
    }

    /// Run the tournament actor event loop
    pub async fn run(mut self) {
        log::info!("Tournament {} '{}' starting", self.id, self.structure.name);

        let mut tick_interval = interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    // All handles dropped means nobody can reach this actor
                    // anymore; stop instead of ticking as an orphan.
                    let Some(message) = message else {
                        break;
                    };

                    self.handle_message(message).await;

                    if self.is_closed {
                        break;
                    }
                }

                _ = tick_interval.tick() => {
                    if !self.is_closed {
                        self.tick().await;
                    }
                }
            }
        }

        log::info!("Tournament {} '{}' closed", self.id, self.structure.name);
    }

    async fn handle_message(&mut self, message: ClockMessage) {
        match message {
            ClockMessage::Action {
                action,
                operator,
                response,
            } => {
                let result = self.handle_action(action, &operator).await;
                let _ = response.send(result);
            }

            ClockMessage::GetState { response } => {
                let _ = response.send(self.snapshot());
            }

            ClockMessage::Subscribe { viewer_id, sender } => {
                self.subscribers.insert(viewer_id, sender);
                log::debug!(
                    "Viewer {} subscribed to tournament {} state changes",
                    viewer_id,
                    self.id
                );
            }

            ClockMessage::Unsubscribe { viewer_id } => {
                self.subscribers.remove(&viewer_id);
                log::debug!(
                    "Viewer {} unsubscribed from tournament {} state changes",
                    viewer_id,
                    self.id
                );
            }

            ClockMessage::Close { response } => {
                self.is_closed = true;
                let _ = response.send(ClockResponse::Success);
            }
        }
    }

    /// Apply an operator action to the clock state.
    async fn handle_action(&mut self, action: OperatorAction, operator: &str) -> ClockResponse {
        let now = Utc::now();
        let before = self.state.clone();

        let ignored = match action {
            OperatorAction::Start => {
                self.state.start(now);
                None
            }
            OperatorAction::Pause => {
                self.state.pause(now);
                None
            }
            OperatorAction::Resume => {
                self.state.resume(now);
                None
            }
            OperatorAction::NextLevel => {
                self.state.advance_level(&self.structure, now);
                None
            }
            OperatorAction::SkipBreak => {
                if self.state.skip_break(&self.structure, now) {
                    None
                } else {
                    Some("not on a skippable break".to_string())
                }
            }
            OperatorAction::ResetLevel => {
                self.state.reset_level(&self.structure, now);
                None
            }
            OperatorAction::AddPlayer => {
                self.state.add_player(&self.structure);
                None
            }
            OperatorAction::AddReentry => {
                self.state.add_reentry(&self.structure);
                None
            }
            OperatorAction::EliminatePlayer => {
                if self.state.eliminate_player() {
                    None
                } else {
                    Some("no players seated".to_string())
                }
            }
        };

        if let Some(reason) = ignored {
            log::debug!(
                "Tournament {}: {} by {} ignored: {}",
                self.id,
                action.name(),
                operator,
                reason
            );
            return ClockResponse::Ignored(reason);
        }

        let update = StateUpdate::diff(&before, &self.state, operator, now);
        if update.is_empty() {
            return ClockResponse::Ignored("no change".to_string());
        }

        log::info!(
            "Tournament {}: {} by {} (level {}, {}s remaining)",
            self.id,
            action.name(),
            operator,
            self.state.current_level + 1,
            self.state.time_remaining_secs
        );

        self.push_update(action.name(), &update).await
    }

    /// Persist an update, audit it, and notify subscribers.
    async fn push_update(&mut self, action: &str, update: &StateUpdate) -> ClockResponse {
        if let Err(e) = self.store.update_state(self.id, update).await {
            log::error!("Tournament {}: failed to persist {}: {}", self.id, action, e);
            return ClockResponse::Error(format!("failed to persist update: {e}"));
        }

        if let Err(e) = self.store.append_audit(self.id, action, update).await {
            log::error!("Tournament {}: failed to audit {}: {}", self.id, action, e);
            return ClockResponse::Error(format!("failed to record audit entry: {e}"));
        }

        self.notify_state_change(self.notification_for(update));
        ClockResponse::Success
    }

    /// Advance the countdown (called by the tick interval).
    async fn tick(&mut self) {
        let now = Utc::now();
        let before = self.state.clone();

        let outcome = engine::tick(&self.structure, &mut self.state, now);
        let update = StateUpdate::diff(&before, &self.state, "clock", now);
        if update.is_empty() {
            return;
        }

        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Counting => {
                // Per-second countdown writes are not audited.
                if let Err(e) = self.store.update_state(self.id, &update).await {
                    log::error!("Tournament {}: failed to persist tick: {}", self.id, e);
                }
                self.notify_state_change(StateChangeNotification::StateChanged);
            }
            TickOutcome::LevelExpired => {
                let _ = self.push_update("auto_advance", &update).await;
            }
        }
    }

    fn notification_for(&self, update: &StateUpdate) -> StateChangeNotification {
        if !self.state.is_running
            && self.state.time_remaining_secs == 0
            && self.structure.is_last_level(self.state.current_level)
        {
            StateChangeNotification::Finished
        } else if update.current_level.is_some() {
            StateChangeNotification::LevelChanged
        } else {
            StateChangeNotification::StateChanged
        }
    }

    /// Broadcast a state change notification to all subscribers
    fn notify_state_change(&mut self, notification: StateChangeNotification) {
        self.subscribers.retain(|viewer_id, sender| {
            match sender.try_send(notification) {
                Ok(_) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("Subscriber {} channel full, dropping notification", viewer_id);
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} disconnected, removing", viewer_id);
                    false
                }
            }
        });
    }

    fn snapshot(&self) -> ClockSnapshot {
        let level = self
            .structure
            .level(self.state.current_level)
            .cloned()
            .unwrap_or_else(|| crate::structure::Level::new(0, 0, 0, 1));

        ClockSnapshot {
            tournament_id: self.id,
            name: self.structure.name.clone(),
            state: self.state.clone(),
            level,
            next_level: self.structure.level(self.state.current_level + 1).cloned(),
            total_levels: self.structure.levels.len(),
        }
    }
}
