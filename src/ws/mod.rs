//! WebSocket layer: connection handling and message routing.
//!
//! The WebSocket endpoint at `/ws` relays room events (`room_started`,
//! `room_finished`, `move`) to every connection that joined the room, and
//! accepts `join_room`, `leave_room`, and `move` commands.

pub mod connection;
pub mod handler;
pub mod messages;
