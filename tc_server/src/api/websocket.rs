//! WebSocket handler for real-time clock updates.
//!
//! This module implements a bidirectional WebSocket connection for live
//! tournament clock viewing and operator control.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws/:tournament_id?operator=<name>`
//! 2. Server loads the tournament (404 if it doesn't exist) and upgrades
//! 3. Server sends the full clock snapshot immediately, then again on every
//!    state change notification from the clock actor
//! 4. Clients may send operator actions as JSON commands
//! 5. On disconnect the viewer is unsubscribed
//!
//! Display-only clients simply never send anything; the `operator` query
//! parameter only matters for attribution of actions in the audit log.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:7070/ws/<id>?operator=director');
//!
//! ws.onmessage = (event) => {
//!   const data = JSON.parse(event.data);
//!   if (data.state) {
//!     // Clock snapshot
//!     updateClockUI(data);
//!   } else {
//!     // Command response
//!     handleResponse(data);
//!   }
//! };
//!
//! ws.send(JSON.stringify({ type: "action", action: { type: "next_level" } }));
//! ```

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tournament_clock::{
    ClockMessage, ClockResponse, ManagerError, OperatorAction, StateChangeNotification, StoreError,
};
use uuid::Uuid;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    operator: Option<String>,
}

/// Client messages received via WebSocket
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Apply an operator action to the tournament
    Action { action: OperatorAction },
}

/// Response messages sent to client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerResponse {
    Success { message: String },
    Error { message: String },
}

/// Upgrade HTTP connection to WebSocket for real-time clock updates.
///
/// Loads the tournament (spawning its actor from the store if needed) before
/// upgrading, so unknown IDs fail with `404` instead of a dead socket.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(tournament_id): Path<Uuid>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    match state.manager.join_tournament(tournament_id).await {
        Ok(_) => {}
        Err(ManagerError::NotFound(_)) | Err(ManagerError::Store(StoreError::NotFound(_))) => {
            return (StatusCode::NOT_FOUND, "Tournament not found").into_response();
        }
        Err(e) => {
            error!(
                "Failed to load tournament {} for WebSocket: {}",
                tournament_id, e
            );
            let body = if state.debug_errors {
                e.to_string()
            } else {
                "Internal server error".to_string()
            };
            return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        }
    }

    let operator = query.operator.unwrap_or_else(|| "viewer".to_string());
    ws.on_upgrade(move |socket| handle_socket(socket, tournament_id, operator, state))
}

/// Handle an established WebSocket connection.
///
/// Subscribes to the tournament's state change notifications, pushes a fresh
/// snapshot whenever one arrives, and forwards client commands to the clock
/// actor. Cleans up the subscription on disconnect.
async fn handle_socket(socket: WebSocket, tournament_id: Uuid, operator: String, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let viewer_id = Uuid::new_v4();

    info!(
        "WebSocket connected: tournament={}, viewer={}, operator={}",
        tournament_id, viewer_id, operator
    );
    crate::metrics::websocket_connections_total();

    // Channel for command responses from the receive loop
    let (response_tx, mut response_rx) = tokio::sync::mpsc::channel::<String>(32);

    // Subscribe to clock state change notifications
    let (notification_tx, mut notification_rx) =
        tokio::sync::mpsc::channel::<StateChangeNotification>(32);

    let handle = match state.manager.get_tournament(tournament_id).await {
        Some(h) => h,
        None => {
            error!("Tournament {} not found", tournament_id);
            return;
        }
    };

    if handle
        .send(ClockMessage::Subscribe {
            viewer_id,
            sender: notification_tx,
        })
        .await
        .is_err()
    {
        error!(
            "Failed to subscribe to tournament {} notifications",
            tournament_id
        );
        return;
    }

    // Send the full snapshot up front so viewers render immediately
    match state.manager.get_state(tournament_id).await {
        Ok(snapshot) => match serde_json::to_string(&snapshot) {
            Ok(json) => {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                error!("Failed to serialize snapshot: {}", e);
                return;
            }
        },
        Err(e) => {
            error!("Failed to load initial snapshot: {}", e);
            return;
        }
    }

    // Push snapshots and command responses (event-driven)
    let send_state = state.clone();
    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(notification) = notification_rx.recv() => {
                    let snapshot = match send_state.manager.get_state(tournament_id).await {
                        Ok(s) => s,
                        Err(e) => {
                            error!("Failed to load snapshot for tournament {}: {}", tournament_id, e);
                            break;
                        }
                    };

                    let json = match serde_json::to_string(&snapshot) {
                        Ok(j) => j,
                        Err(e) => {
                            error!("Failed to serialize snapshot: {}", e);
                            continue;
                        }
                    };

                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }

                    if notification == StateChangeNotification::Finished {
                        info!("Tournament {} finished", tournament_id);
                    }
                }
                Some(response_json) = response_rx.recv() => {
                    if sender.send(Message::Text(response_json.into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Receive commands from the client
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let response = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        handle_client_message(client_msg, tournament_id, &operator, &state).await
                    }
                    Err(e) => {
                        warn!("Failed to parse client message: {}", e);
                        ServerResponse::Error {
                            message: "Invalid message format".to_string(),
                        }
                    }
                };

                if let Ok(json) = serde_json::to_string(&response)
                    && response_tx.send(json).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!(
                    "WebSocket closed: tournament={}, viewer={}",
                    tournament_id, viewer_id
                );
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();

    // Unsubscribe from clock notifications
    if let Some(handle) = state.manager.get_tournament(tournament_id).await {
        let _ = handle.send(ClockMessage::Unsubscribe { viewer_id }).await;
    }

    info!(
        "WebSocket disconnected: tournament={}, viewer={}",
        tournament_id, viewer_id
    );
}

/// Process a client command message and return a response.
async fn handle_client_message(
    msg: ClientMessage,
    tournament_id: Uuid,
    operator: &str,
    state: &AppState,
) -> ServerResponse {
    match msg {
        ClientMessage::Action { action } => {
            crate::metrics::operator_actions_total(action.name());

            match state
                .manager
                .apply_action(tournament_id, action, operator)
                .await
            {
                Ok(ClockResponse::Success) => ServerResponse::Success {
                    message: "Action applied".to_string(),
                },
                Ok(ClockResponse::Ignored(reason)) => ServerResponse::Success { message: reason },
                Ok(ClockResponse::Error(e)) => {
                    error!("Action failed for tournament {}: {}", tournament_id, e);
                    ServerResponse::Error {
                        message: if state.debug_errors {
                            e
                        } else {
                            "Internal server error".to_string()
                        },
                    }
                }
                Err(e) => {
                    error!("Action failed for tournament {}: {}", tournament_id, e);
                    ServerResponse::Error {
                        message: if state.debug_errors {
                            e.to_string()
                        } else {
                            "Internal server error".to_string()
                        },
                    }
                }
            }
        }
    }
}
