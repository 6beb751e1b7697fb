//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding events for joined rooms.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use crate::domain::RoomSubscriber;
use crate::error::GatewayError;
use crate::service::RoomService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards the events of joined rooms from the [`RoomSubscriber`].
pub async fn run_connection(
    socket: WebSocket,
    mut subs: RoomSubscriber,
    rooms: Arc<RoomService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs, &rooms).await;
                        if let Some(json) = reply
                            && ws_tx.send(Message::text(json)).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if ws_tx.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(error = %err, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            event = subs.recv() => {
                match event {
                    Ok(room_event) => {
                        tracing::trace!(
                            room_id = %room_event.room_id(),
                            event = room_event.event_type_str(),
                            "forwarding room event"
                        );
                        let msg = WsMessage::new(
                            uuid::Uuid::new_v4().to_string(),
                            WsMessageType::Event,
                            serde_json::to_value(&room_event).unwrap_or_default(),
                        );
                        let json = serde_json::to_string(&msg).unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!(rooms = subs.joined_count(), "ws connection closed");
}

/// Handles a text frame from the client, returning an optional JSON reply.
async fn handle_text_message(
    text: &str,
    subs: &mut RoomSubscriber,
    rooms: &RoomService,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error("", 400, "malformed JSON")).ok();
    };
    let command = match serde_json::from_value::<WsCommand>(msg.payload) {
        Ok(command) => command,
        Err(err) => {
            return serde_json::to_string(&WsMessage::error(
                msg.id,
                404,
                format!("unknown command: {err}"),
            ))
            .ok();
        }
    };

    let reply = match dispatch(command, subs, rooms).await {
        Ok(payload) => WsMessage::new(msg.id, WsMessageType::Response, payload),
        Err(err) => WsMessage::error(msg.id, err.status_code().as_u16(), err.to_string()),
    };
    serde_json::to_string(&reply).ok()
}

async fn dispatch(
    command: WsCommand,
    subs: &mut RoomSubscriber,
    rooms: &RoomService,
) -> Result<serde_json::Value, GatewayError> {
    match command {
        WsCommand::JoinRoom { room_id } => {
            let room = rooms.get_room(room_id).await?;
            subs.join(room_id);
            tracing::debug!(%room_id, "ws joined room");
            Ok(serde_json::json!({ "joined": room_id, "status": room.status }))
        }
        WsCommand::LeaveRoom { room_id } => {
            let left = subs.leave(room_id);
            Ok(serde_json::json!({ "left": room_id, "was_joined": left }))
        }
        WsCommand::Move { room_id, payload } => {
            let delivered = rooms.relay_move(room_id, payload).await?;
            Ok(serde_json::json!({ "relayed": room_id, "delivered": delivered }))
        }
    }
}
