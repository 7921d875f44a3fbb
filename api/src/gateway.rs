//! Realtime gateway: accepts websocket connections, wires them into the
//! connection registry and fans domain events out as pushes. Delivery is
//! best-effort, at-most-once; a reconnecting client re-joins to get a fresh
//! snapshot.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use app::events::DomainEvent;
use app::state::AppState;
use models::protocol::{ClientMessage, ServerMessage};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

/// Per-connection loop. A connection is anonymous until its join message
/// arrives; joining registers the outbound channel and immediately pushes
/// the current snapshot if the tournament exists (unknown codes no-op
/// silently rather than erroring the transport).
async fn handle_socket(state: AppState, mut socket: WebSocket) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut registered: Option<(String, i32)> = None;

    loop {
        tokio::select! {
            Some(message) = rx.recv() => {
                let Ok(text) = serde_json::to_string(&message) else {
                    continue;
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let parsed: ClientMessage = match serde_json::from_str(&text) {
                            Ok(parsed) => parsed,
                            Err(err) => {
                                debug!(%err, "ignoring malformed client message");
                                continue;
                            }
                        };
                        match parsed {
                            ClientMessage::JoinTournament { tournament_code, participant_id } => {
                                if let Some((code, pid)) = registered.take() {
                                    state.connections.remove(&code, pid);
                                }
                                state
                                    .connections
                                    .register(&tournament_code, participant_id, tx.clone());
                                info!(code = %tournament_code, participant_id, "connection joined");

                                if let Ok(tournament) = state.registry.get(&tournament_code) {
                                    let _ = tx.send(ServerMessage::TournamentUpdate { tournament });
                                }
                                registered = Some((tournament_code, participant_id));
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        debug!(%err, "websocket read failed");
                        break;
                    }
                }
            }
        }
    }

    // disconnect only drops the connection entry, never tournament state
    if let Some((code, participant_id)) = registered {
        info!(%code, participant_id, "connection closed");
        state.connections.remove(&code, participant_id);
    }
}

/// Bridge from the domain event bus to transport pushes. Spawned once at
/// router setup; lives for the whole process.
pub fn spawn_event_forwarder(state: &AppState) {
    let connections = state.connections.clone();
    let mut events = state.events.subscribe();

    tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "event forwarder lagged behind the bus");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let code = event.code().to_owned();
            let message = match event {
                DomainEvent::TournamentUpdated { tournament, .. } => {
                    ServerMessage::TournamentUpdate { tournament }
                }
                DomainEvent::MatchDecided {
                    match_id,
                    winner,
                    tournament,
                    ..
                } => ServerMessage::MatchWinner {
                    match_id,
                    winner,
                    tournament,
                },
                DomainEvent::MatchStatus {
                    match_id,
                    player_id,
                    status,
                    ..
                } => ServerMessage::MatchStatus {
                    match_id,
                    player_id,
                    status,
                },
            };

            connections.broadcast(&code, &message);
        }
    });
}
