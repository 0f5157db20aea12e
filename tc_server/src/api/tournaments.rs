//! Tournament management API handlers.
//!
//! This module provides HTTP REST endpoints for tournament clock operations:
//! - Creating tournaments from a preset or an explicit blind structure
//! - Listing tournaments with player counts and clock status
//! - Getting the live snapshot of a specific tournament
//! - Applying operator actions (start, pause, level changes, entries)
//! - Deleting tournaments
//!
//! # Examples
//!
//! Create a tournament from the standard preset:
//! ```bash
//! curl -X POST http://localhost:7070/api/tournaments \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Friday Deepstack", "buy_in": 100, "guaranteed_prize_pool": 1000}'
//! ```
//!
//! Start the clock:
//! ```bash
//! curl -X POST http://localhost:7070/api/tournaments/<id>/actions \
//!   -H "Content-Type: application/json" \
//!   -d '{"action": {"type": "start"}, "operator": "director"}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use serde::{Deserialize, Serialize};
use tournament_clock::{
    ClockResponse, ClockSnapshot, Level, ManagerError, OperatorAction, PayoutStructure, Structure,
    TournamentListing,
};
use uuid::Uuid;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub name: String,
    pub buy_in: i64,
    #[serde(default)]
    pub reentry_fee: i64,
    #[serde(default)]
    pub guaranteed_prize_pool: i64,
    #[serde(default = "default_initial_stack")]
    pub initial_stack: i64,
    /// "standard" (default) or "turbo"; ignored when `levels` is given
    pub preset: Option<String>,
    /// Explicit blind levels; overrides the preset
    pub levels: Option<Vec<LevelPayload>>,
    /// Payout percentage shares, top place first
    pub payouts: Option<Vec<f64>>,
    pub location_tag: Option<String>,
}

fn default_initial_stack() -> i64 {
    20_000
}

#[derive(Debug, Deserialize)]
pub struct LevelPayload {
    pub small_blind: i64,
    pub big_blind: i64,
    #[serde(default)]
    pub ante: i64,
    pub duration_mins: u32,
    #[serde(default)]
    pub is_break: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateTournamentResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: OperatorAction,
    #[serde(default = "default_operator")]
    pub operator: String,
}

fn default_operator() -> String {
    "operator".to_string()
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub errors: Vec<String>,
}

/// Map an internal failure to a response, masking details unless the
/// server runs with `DEBUG_ERRORS` enabled. The full error is always logged.
fn internal_error(
    state: &AppState,
    context: &str,
    err: &dyn std::fmt::Display,
) -> (StatusCode, Json<ErrorResponse>) {
    error!("{}: {}", context, err);
    let message = if state.debug_errors {
        format!("{}: {}", context, err)
    } else {
        "Internal server error".to_string()
    };
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: message }),
    )
}

impl CreateTournamentRequest {
    fn into_structure(self) -> Structure {
        match self.levels {
            Some(levels) => {
                let levels = levels
                    .into_iter()
                    .enumerate()
                    .map(|(i, l)| Level {
                        id: i as u32 + 1,
                        small_blind: l.small_blind,
                        big_blind: l.big_blind,
                        ante: l.ante,
                        duration_mins: l.duration_mins,
                        is_break: l.is_break,
                    })
                    .collect();
                let payouts = self
                    .payouts
                    .map_or_else(PayoutStructure::standard, PayoutStructure::new);
                Structure::new(
                    self.name,
                    self.buy_in,
                    self.reentry_fee,
                    self.guaranteed_prize_pool,
                    self.initial_stack,
                    levels,
                    0,
                    payouts,
                )
            }
            None => {
                let mut structure = match self.preset.as_deref() {
                    Some("turbo") => Structure::turbo(
                        self.name,
                        self.buy_in,
                        self.reentry_fee,
                        self.guaranteed_prize_pool,
                    ),
                    _ => Structure::standard(
                        self.name,
                        self.buy_in,
                        self.reentry_fee,
                        self.guaranteed_prize_pool,
                    ),
                };
                structure.initial_stack = self.initial_stack;
                if let Some(payouts) = self.payouts {
                    structure.payouts = PayoutStructure::new(payouts);
                }
                structure
            }
        }
    }
}

/// Create a new tournament.
///
/// Validates the structure before anything is persisted; every problem is
/// reported at once rather than one at a time.
///
/// # Response
///
/// Returns `201 Created` with the new tournament ID:
/// ```json
/// {"id": "550e8400-e29b-41d4-a716-446655440000"}
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Invalid structure, with the full list of problems
/// - `500 Internal Server Error`: Persistence failure
pub async fn create_tournament(
    State(state): State<AppState>,
    Json(request): Json<CreateTournamentRequest>,
) -> Response {
    let location_tag = request.location_tag.clone();
    let structure = request.into_structure();

    match state
        .manager
        .create_tournament(structure, location_tag.as_deref())
        .await
    {
        Ok(id) => {
            crate::metrics::tournaments_created_total();
            (StatusCode::CREATED, Json(CreateTournamentResponse { id })).into_response()
        }
        Err(ManagerError::Structure(e)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidationErrorResponse {
                errors: e.messages().to_vec(),
            }),
        )
            .into_response(),
        Err(e) => internal_error(&state, "Failed to create tournament", &e).into_response(),
    }
}

/// List all tournaments.
///
/// Returns every persisted tournament with player count and clock status.
pub async fn list_tournaments(
    State(state): State<AppState>,
) -> Result<Json<Vec<TournamentListing>>, (StatusCode, Json<ErrorResponse>)> {
    match state.manager.list_tournaments().await {
        Ok(listings) => Ok(Json(listings)),
        Err(e) => Err(internal_error(&state, "Failed to list tournaments", &e)),
    }
}

/// Get the live snapshot of a tournament.
///
/// Spawns the clock actor from the persisted records if it is not already
/// running, then returns the current state plus the current and next levels.
///
/// # Errors
///
/// - `404 Not Found`: Tournament doesn't exist
pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<ClockSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    match state.manager.join_tournament(tournament_id).await {
        Ok((snapshot, _handle)) => Ok(Json(snapshot)),
        Err(ManagerError::NotFound(_)) => Err(not_found(tournament_id)),
        Err(ManagerError::Store(e)) if is_not_found(&e) => Err(not_found(tournament_id)),
        Err(e) => Err(internal_error(&state, "Failed to load tournament", &e)),
    }
}

/// Apply an operator action to a tournament.
///
/// # Request Body
///
/// ```json
/// {"action": {"type": "next_level"}, "operator": "director"}
/// ```
///
/// # Response
///
/// Returns `200 OK`. Actions that change nothing (pausing a stopped clock,
/// eliminating from an empty field) are acknowledged with a `detail` note
/// rather than rejected.
///
/// # Errors
///
/// - `500 Internal Server Error`: Persistence failure while applying the action
pub async fn take_action(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, (StatusCode, Json<ErrorResponse>)> {
    crate::metrics::operator_actions_total(request.action.name());

    match state
        .manager
        .apply_action(tournament_id, request.action, &request.operator)
        .await
    {
        Ok(ClockResponse::Success) => Ok(Json(ActionResponse {
            status: "ok".to_string(),
            detail: None,
        })),
        Ok(ClockResponse::Ignored(reason)) => Ok(Json(ActionResponse {
            status: "ignored".to_string(),
            detail: Some(reason),
        })),
        Ok(ClockResponse::Error(e)) => {
            Err(internal_error(&state, "Failed to apply action", &e))
        }
        Err(e) => Err(internal_error(&state, "Failed to apply action", &e)),
    }
}

/// Delete a tournament: stop its clock actor and remove its records.
///
/// # Errors
///
/// - `404 Not Found`: Tournament doesn't exist
pub async fn delete_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    match state.manager.delete_tournament(tournament_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(ManagerError::Store(e)) if is_not_found(&e) => Err(not_found(tournament_id)),
        Err(e) => Err(internal_error(&state, "Failed to delete tournament", &e)),
    }
}

fn is_not_found(err: &tournament_clock::StoreError) -> bool {
    matches!(err, tournament_clock::StoreError::NotFound(_))
}

fn not_found(id: Uuid) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Tournament {} not found", id),
        }),
    )
}
